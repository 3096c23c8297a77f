use jiff::Timestamp;

use crate::control_plane::ControlPlane;
use crate::error::StackError;
use crate::model::{StackDescription, StackOutput, StackStatus};
use crate::tags::protection_enabled;

/// The runner's last-known view of one stack.
///
/// A stack that only holds a pending change set (`REVIEW_IN_PROGRESS`)
/// counts as not existing: nothing has been deployed into it yet.
#[derive(Debug, Clone, PartialEq)]
pub struct StackSnapshot {
    pub name: String,
    pub exists: bool,
    pub status: Option<StackStatus>,
    pub status_reason: Option<String>,
    pub outputs: Vec<StackOutput>,
    pub deletion_protection: bool,
    pub deletion_time: Option<Timestamp>,
}

impl StackSnapshot {
    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exists: false,
            status: None,
            status_reason: None,
            outputs: Vec::new(),
            deletion_protection: false,
            deletion_time: None,
        }
    }

    pub fn from_description(description: StackDescription) -> Self {
        Self {
            exists: description.status != StackStatus::ReviewInProgress,
            deletion_protection: protection_enabled(&description.tags),
            name: description.stack_name,
            status: Some(description.status),
            status_reason: description.status_reason,
            outputs: description.outputs,
            deletion_time: description.deletion_time,
        }
    }

    /// Re-read the stack and replace every field.
    pub async fn refresh(&mut self, control_plane: &dyn ControlPlane) -> Result<(), StackError> {
        *self = get_snapshot(control_plane, &self.name).await?;
        Ok(())
    }

    pub fn status_str(&self) -> &str {
        self.status.as_ref().map_or("", StackStatus::as_str)
    }
}

/// Look up a stack. A missing stack is a normal answer, not an error.
pub async fn get_snapshot(
    control_plane: &dyn ControlPlane,
    stack_name: &str,
) -> Result<StackSnapshot, StackError> {
    match control_plane.describe_stack(stack_name).await {
        Ok(description) => {
            let mut snapshot = StackSnapshot::from_description(description);
            // Keep the caller's name; the service may echo a stack id.
            snapshot.name = stack_name.to_string();
            tracing::debug!(
                stack = %stack_name,
                status = %snapshot.status_str(),
                exists = snapshot.exists,
                "stack described"
            );
            Ok(snapshot)
        }
        Err(StackError::NotFound { .. }) => {
            tracing::info!(stack = %stack_name, "stack does not exist");
            Ok(StackSnapshot::missing(stack_name))
        }
        Err(e) => Err(e),
    }
}

/// The status of a stack with an operation still running, or `None` when
/// the stack is settled or missing.
pub async fn operation_in_progress(
    control_plane: &dyn ControlPlane,
    stack_name: &str,
) -> Result<Option<StackStatus>, StackError> {
    let snapshot = get_snapshot(control_plane, stack_name).await?;
    Ok(snapshot.status.filter(StackStatus::is_transitioning))
}
