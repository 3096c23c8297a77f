use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::control_plane::ControlPlane;
use crate::error::StackError;
use crate::model::{ChangeSetDescription, ChangeSetStatus, StackStatus};
use crate::snapshot::operation_in_progress;

/// Poll intervals and upper bounds for every wait the reconciler performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timings {
    pub change_set_timeout: Duration,
    pub change_set_poll_interval: Duration,
    pub stack_operation_timeout: Duration,
    pub stack_poll_interval: Duration,
    pub settle_poll_interval: Duration,
    pub watcher_poll_interval: Duration,
    pub watcher_retry_interval: Duration,
    pub event_poll_interval: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            change_set_timeout: Duration::from_secs(60),
            change_set_poll_interval: Duration::from_secs(5),
            stack_operation_timeout: Duration::from_secs(60 * 60),
            stack_poll_interval: Duration::from_secs(15),
            settle_poll_interval: Duration::from_secs(30),
            watcher_poll_interval: Duration::from_secs(30),
            watcher_retry_interval: Duration::from_secs(10),
            event_poll_interval: Duration::from_secs(5),
        }
    }
}

/// The stack status a wait is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackWaitTarget {
    CreateComplete,
    UpdateComplete,
    DeleteComplete,
    RollbackComplete,
}

impl StackWaitTarget {
    pub fn operation(self) -> &'static str {
        match self {
            Self::CreateComplete => "stack create",
            Self::UpdateComplete => "stack update",
            Self::DeleteComplete => "stack delete",
            Self::RollbackComplete => "stack rollback",
        }
    }

    fn is_reached(self, status: &StackStatus) -> bool {
        match self {
            Self::CreateComplete => *status == StackStatus::CreateComplete,
            Self::UpdateComplete => *status == StackStatus::UpdateComplete,
            Self::DeleteComplete => *status == StackStatus::DeleteComplete,
            Self::RollbackComplete => matches!(
                status,
                StackStatus::RollbackComplete | StackStatus::UpdateRollbackComplete
            ),
        }
    }
}

/// Poll the stack until it reaches `target`.
///
/// Any settled status other than the target fails the wait. A stack that
/// has disappeared satisfies a delete wait.
pub async fn wait_for_stack(
    control_plane: &dyn ControlPlane,
    stack_name: &str,
    target: StackWaitTarget,
    timings: &Timings,
) -> Result<(), StackError> {
    let timeout = timings.stack_operation_timeout;
    let deadline = Instant::now() + timeout;

    loop {
        match control_plane.describe_stack(stack_name).await {
            Ok(description) => {
                if target.is_reached(&description.status) {
                    tracing::info!(
                        stack = %stack_name,
                        status = %description.status,
                        "{} finished",
                        target.operation()
                    );
                    return Ok(());
                }
                if !description.status.is_in_progress() {
                    return Err(StackError::RemoteOperationFailed {
                        stack_name: stack_name.to_string(),
                        operation: target.operation().to_string(),
                        status: description.status.to_string(),
                        reason: description.status_reason,
                    });
                }
                tracing::debug!(
                    stack = %stack_name,
                    status = %description.status,
                    "waiting for {}",
                    target.operation()
                );
            }
            Err(StackError::NotFound { .. }) if target == StackWaitTarget::DeleteComplete => {
                tracing::info!(stack = %stack_name, "stack is gone");
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        if Instant::now() >= deadline {
            return Err(StackError::Timeout {
                stack_name: stack_name.to_string(),
                operation: target.operation().to_string(),
                timeout,
            });
        }
        sleep(timings.stack_poll_interval).await;
    }
}

/// Poll a change set until the service has finished computing it.
///
/// Returns the completed description; a `FAILED` change set is an error
/// carrying the service's reason.
pub async fn wait_for_change_set(
    control_plane: &dyn ControlPlane,
    stack_name: &str,
    change_set_id: &str,
    timings: &Timings,
) -> Result<ChangeSetDescription, StackError> {
    let timeout = timings.change_set_timeout;
    let deadline = Instant::now() + timeout;

    loop {
        let description = control_plane
            .describe_change_set(stack_name, change_set_id)
            .await?;
        match description.status {
            ChangeSetStatus::CreateComplete => return Ok(description),
            ChangeSetStatus::Failed => {
                return Err(StackError::RemoteOperationFailed {
                    stack_name: stack_name.to_string(),
                    operation: "change set create".to_string(),
                    status: description.status.to_string(),
                    reason: description.status_reason,
                });
            }
            _ => {}
        }

        if Instant::now() >= deadline {
            return Err(StackError::Timeout {
                stack_name: stack_name.to_string(),
                operation: "change set create".to_string(),
                timeout,
            });
        }
        sleep(timings.change_set_poll_interval).await;
    }
}

/// Block until no operation is running on the stack.
///
/// A missing stack, or one holding only a pending change set, is settled.
pub async fn wait_until_settled(
    control_plane: &dyn ControlPlane,
    stack_name: &str,
    timings: &Timings,
) -> Result<(), StackError> {
    let timeout = timings.stack_operation_timeout;
    let deadline = Instant::now() + timeout;

    loop {
        let Some(status) = operation_in_progress(control_plane, stack_name).await? else {
            return Ok(());
        };
        tracing::info!(
            stack = %stack_name,
            status = %status,
            "waiting: stack is in transition"
        );

        if Instant::now() >= deadline {
            return Err(StackError::Timeout {
                stack_name: stack_name.to_string(),
                operation: "stack settle".to_string(),
                timeout,
            });
        }
        sleep(timings.settle_poll_interval).await;
    }
}
