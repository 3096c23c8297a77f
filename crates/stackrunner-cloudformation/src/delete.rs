use std::sync::Arc;

use tokio::sync::watch;

use crate::deploy::DeployOutcome;
use crate::error::StackError;
use crate::reconciler::Reconciler;
use crate::snapshot::StackSnapshot;
use crate::stack_events::stream_stack_events;
use crate::wait::{wait_for_stack, StackWaitTarget};

impl Reconciler {
    /// Delete `stack_name`. Deleting a stack that does not exist succeeds.
    ///
    /// A dry run checks protection and reports what would be deleted
    /// without changing the stack.
    pub async fn delete(&self, stack_name: &str) -> Result<(), StackError> {
        let mut snapshot = self.snapshot(stack_name).await?;
        if !snapshot.exists {
            tracing::info!(stack = %stack_name, "stack does not exist, nothing to delete");
            return Ok(());
        }

        if snapshot.deletion_protection && self.protection.blocks_deletion() {
            return Err(StackError::DeletionProtected {
                stack_name: stack_name.to_string(),
            });
        }

        if self.dry_run {
            tracing::info!(
                stack = %stack_name,
                status = %snapshot.status_str(),
                protected = snapshot.deletion_protection,
                "dry run, stack would be deleted"
            );
            return Ok(());
        }

        self.auto_recover(&mut snapshot).await?;
        if !snapshot.exists {
            return Ok(());
        }

        if snapshot.deletion_protection {
            self.lift_deletion_protection(&snapshot).await?;
        }

        self.delete_stack_and_wait(stack_name).await
    }

    /// Redeploy the current template so the stack's protection tag matches
    /// the configured setting. Only an executed or unchanged deploy counts
    /// as lifted.
    async fn lift_deletion_protection(&self, snapshot: &StackSnapshot) -> Result<(), StackError> {
        let source = self.template_source.as_ref().ok_or_else(|| {
            StackError::Template(format!(
                "stack {} is tagged as protected but no template source is configured to lift it",
                snapshot.name
            ))
        })?;

        tracing::info!(
            stack = %snapshot.name,
            "redeploying stack to update deletion protection before deleting"
        );
        let template = source.render().await?;
        match self.deploy(&snapshot.name, &template).await? {
            DeployOutcome::Applied { .. } | DeployOutcome::NoChanges => Ok(()),
            DeployOutcome::DryRun { .. } => Err(StackError::DeletionProtected {
                stack_name: snapshot.name.clone(),
            }),
        }
    }

    /// Issue the delete and wait for it, streaming stack events meanwhile.
    ///
    /// Used by both [`Reconciler::delete`] and recovery; never runs recovery
    /// itself.
    pub(crate) async fn delete_stack_and_wait(&self, stack_name: &str) -> Result<(), StackError> {
        tracing::info!(stack = %stack_name, "deleting stack");
        self.control_plane.delete_stack(stack_name).await?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let streamer = tokio::spawn(stream_stack_events(
            Arc::clone(&self.control_plane),
            stack_name.to_string(),
            self.termination_log.clone(),
            self.timings.event_poll_interval,
            stop_rx,
        ));

        let result = wait_for_stack(
            self.control_plane(),
            stack_name,
            StackWaitTarget::DeleteComplete,
            &self.timings,
        )
        .await;

        let _ = stop_tx.send(true);
        if let Err(e) = streamer.await {
            tracing::warn!(stack = %stack_name, error = %e, "stack event stream ended abnormally");
        }

        if result.is_ok() {
            tracing::info!(stack = %stack_name, "stack deleted");
        }
        result
    }
}
