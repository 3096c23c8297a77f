use crate::error::StackError;
use crate::model::StackStatus;
use crate::reconciler::Reconciler;
use crate::snapshot::StackSnapshot;
use crate::wait::{wait_for_stack, StackWaitTarget};

/// What to do with a stack left behind by an earlier failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    None,
    Delete,
    Rollback,
}

impl RecoveryAction {
    pub fn for_status(status: Option<&StackStatus>, has_deletion_time: bool) -> Self {
        match (status, has_deletion_time) {
            (Some(StackStatus::DeleteFailed), _) => Self::Delete,
            (Some(StackStatus::RollbackFailed | StackStatus::RollbackComplete), true) => {
                Self::Delete
            }
            (Some(StackStatus::RollbackFailed), false) => Self::Rollback,
            _ => Self::None,
        }
    }

    pub fn for_snapshot(snapshot: &StackSnapshot) -> Self {
        Self::for_status(snapshot.status.as_ref(), snapshot.deletion_time.is_some())
    }
}

impl Reconciler {
    /// Bring a stack out of a recoverable failure state, then refresh the
    /// snapshot. Takes at most one corrective action, and none in a dry run.
    pub async fn auto_recover(
        &self,
        snapshot: &mut StackSnapshot,
    ) -> Result<RecoveryAction, StackError> {
        let action = RecoveryAction::for_snapshot(snapshot);
        if self.dry_run && action != RecoveryAction::None {
            tracing::info!(
                stack = %snapshot.name,
                status = %snapshot.status_str(),
                action = ?action,
                "dry run, recovery skipped"
            );
            return Ok(action);
        }
        match action {
            RecoveryAction::None => return Ok(action),
            RecoveryAction::Delete => {
                tracing::info!(
                    stack = %snapshot.name,
                    status = %snapshot.status_str(),
                    "stack is in a failed state, deleting it before continuing"
                );
                self.delete_stack_and_wait(&snapshot.name).await?;
            }
            RecoveryAction::Rollback => {
                tracing::info!(
                    stack = %snapshot.name,
                    status = %snapshot.status_str(),
                    "stack is in a failed state, rolling back before continuing"
                );
                self.control_plane.rollback_stack(&snapshot.name).await?;
                wait_for_stack(
                    self.control_plane(),
                    &snapshot.name,
                    StackWaitTarget::RollbackComplete,
                    &self.timings,
                )
                .await?;
            }
        }

        snapshot.refresh(self.control_plane()).await?;
        Ok(action)
    }
}
