use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Default location read by the container runtime when the process exits.
pub const DEFAULT_TERMINATION_LOG: &str = "/dev/termination-log";

/// Best-effort diagnostic channel for the operator.
///
/// Every write replaces the previous content. Write failures are logged and
/// otherwise ignored so they never replace the error being reported.
#[derive(Debug, Clone)]
pub struct TerminationLog {
    path: PathBuf,
}

impl Default for TerminationLog {
    fn default() -> Self {
        Self::new(DEFAULT_TERMINATION_LOG)
    }
}

impl TerminationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write(&self, message: &str) {
        if let Err(e) = tokio::fs::write(&self.path, message).await {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to write termination log"
            );
        }
    }

    /// Write the error's text and hand the error back untouched.
    pub async fn record<E: Display>(&self, err: E) -> E {
        self.write(&err.to_string()).await;
        err
    }
}
