use jiff::Timestamp;

use crate::error::StackError;
use crate::hooks::HookKind;
use crate::model::{Capability, ChangeSetDescription, ChangeSetType, CreateChangeSetRequest};
use crate::reconciler::Reconciler;
use crate::snapshot::StackSnapshot;
use crate::wait::{wait_for_change_set, wait_for_stack, StackWaitTarget};

/// How a successful deploy ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DeployOutcome {
    /// The template matches the deployed stack; nothing was executed.
    NoChanges,
    /// The change set was created, and handed to the dry-run hook when one
    /// is configured, but not executed.
    DryRun { change_set: ChangeSetDescription },
    Applied {
        change_set_type: ChangeSetType,
        change_set: ChangeSetDescription,
    },
}

impl DeployOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

impl Reconciler {
    /// Create or update `stack_name` so that it runs `template`.
    pub async fn deploy(
        &self,
        stack_name: &str,
        template: &str,
    ) -> Result<DeployOutcome, StackError> {
        if template.trim().is_empty() {
            return Err(StackError::EmptyTemplate);
        }

        let mut snapshot = self.snapshot(stack_name).await?;
        self.auto_recover(&mut snapshot).await?;

        let change_set_type = if snapshot.exists {
            ChangeSetType::Update
        } else {
            ChangeSetType::Create
        };

        let Some(change_set) = self
            .create_change_set(&snapshot, template, change_set_type)
            .await?
        else {
            tracing::info!(stack = %stack_name, "no changes to apply");
            return Ok(DeployOutcome::NoChanges);
        };

        for change in &change_set.changes {
            tracing::info!(
                stack = %stack_name,
                action = %change.action,
                resource = %change.logical_resource_id,
                "planned change"
            );
        }

        let kind = if self.dry_run {
            HookKind::DryRun
        } else {
            HookKind::PreChangeSetApply
        };
        if let Some(hooks) = &self.hooks {
            let current = self.control_plane.get_template(stack_name).await?;
            let inputs = hooks.write_inputs(&current, template, &change_set).await?;
            hooks
                .run(kind, &inputs, self.termination_log.as_ref())
                .await?;
        }

        if self.dry_run {
            tracing::info!(
                stack = %stack_name,
                change_set = %change_set.change_set_id,
                "dry run, change set left unexecuted"
            );
            return Ok(DeployOutcome::DryRun { change_set });
        }

        snapshot.refresh(self.control_plane()).await?;
        self.execute_change_set(&snapshot, &change_set, change_set_type)
            .await?;

        Ok(DeployOutcome::Applied {
            change_set_type,
            change_set,
        })
    }

    /// Returns `None` when the service reports that the template changes
    /// nothing.
    async fn create_change_set(
        &self,
        snapshot: &StackSnapshot,
        template: &str,
        change_set_type: ChangeSetType,
    ) -> Result<Option<ChangeSetDescription>, StackError> {
        let request = CreateChangeSetRequest {
            stack_name: snapshot.name.clone(),
            change_set_name: format!("{}-{}", snapshot.name, Timestamp::now().as_second()),
            template_body: template.to_string(),
            change_set_type,
            capabilities: vec![Capability::Iam, Capability::NamedIam],
            tags: self.tags.to_vec(),
        };

        tracing::info!(
            stack = %snapshot.name,
            change_set = %request.change_set_name,
            change_set_type = %change_set_type,
            "creating change set"
        );
        let change_set_id = self.control_plane.create_change_set(&request).await?;

        tracing::info!(
            stack = %snapshot.name,
            change_set = %change_set_id,
            "waiting for change set creation to complete"
        );
        match wait_for_change_set(
            self.control_plane(),
            &snapshot.name,
            &change_set_id,
            &self.timings,
        )
        .await
        {
            Ok(description) => Ok(Some(description)),
            Err(wait_err) => {
                let description = self
                    .control_plane
                    .describe_change_set(&snapshot.name, &change_set_id)
                    .await?;
                if description.is_no_op() {
                    Ok(None)
                } else {
                    Err(wait_err)
                }
            }
        }
    }

    async fn execute_change_set(
        &self,
        snapshot: &StackSnapshot,
        change_set: &ChangeSetDescription,
        change_set_type: ChangeSetType,
    ) -> Result<(), StackError> {
        tracing::info!(
            stack = %snapshot.name,
            change_set = %change_set.change_set_id,
            status = %snapshot.status_str(),
            "executing change set"
        );
        self.control_plane
            .execute_change_set(&snapshot.name, &change_set.change_set_id)
            .await?;

        let target = match change_set_type {
            ChangeSetType::Create => StackWaitTarget::CreateComplete,
            ChangeSetType::Update => StackWaitTarget::UpdateComplete,
        };
        wait_for_stack(self.control_plane(), &snapshot.name, target, &self.timings).await
    }
}
