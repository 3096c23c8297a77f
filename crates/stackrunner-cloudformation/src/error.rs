use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StackError {
    #[error("stack {stack_name} does not exist")]
    NotFound { stack_name: String },

    #[error("template is empty")]
    EmptyTemplate,

    #[error("stack {stack_name} has deletion protection enabled, please disable before deleting")]
    DeletionProtected { stack_name: String },

    #[error("{operation} failed for stack {stack_name} with status {status}{}", reason_suffix(.reason))]
    RemoteOperationFailed {
        stack_name: String,
        operation: String,
        status: String,
        reason: Option<String>,
    },

    #[error("timed out after {timeout:?} waiting for {operation} on stack {stack_name}")]
    Timeout {
        stack_name: String,
        operation: String,
        timeout: Duration,
    },

    #[error("{operation} failed for stack {stack_name}: {message}")]
    Aws {
        stack_name: String,
        operation: String,
        message: String,
    },

    #[error("{hook} hook failed: {message}")]
    Hook { hook: String, message: String },

    #[error("template error: {0}")]
    Template(String),

    #[error("storage error: {0}")]
    Storage(#[from] stackrunner_storage::StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StackError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn aws(stack_name: &str, operation: &str, message: impl Into<String>) -> Self {
        Self::Aws {
            stack_name: stack_name.to_string(),
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(r) if !r.is_empty() => format!(": {r}"),
        _ => String::new(),
    }
}
