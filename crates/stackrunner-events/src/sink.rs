use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::io::AsyncWriteExt;

use crate::error::EventError;
use crate::event::ProgressEvent;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Receiver of progress events.
///
/// The sink's own storage and query semantics are opaque to the runner.
/// Callers log sink failures and carry on.
pub trait EventSink: Send + Sync {
    fn create_event<'a>(&'a self, event: &'a ProgressEvent) -> BoxFuture<'a, Result<(), EventError>>;
}

/// Emits events as structured `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn create_event<'a>(&'a self, event: &'a ProgressEvent) -> BoxFuture<'a, Result<(), EventError>> {
        Box::pin(async move {
            tracing::info!(
                event.namespace = %event.namespace,
                event.app_name = %event.app_name,
                event.kind = %event.event_type,
                event.severity = %event.severity,
                event.resource_kind = %event.resource_kind,
                event.resource_name = %event.resource_name,
                "{}",
                event.description
            );
            Ok(())
        })
    }
}

/// Appends each event as one JSON line to a file.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for JsonLinesSink {
    fn create_event<'a>(&'a self, event: &'a ProgressEvent) -> BoxFuture<'a, Result<(), EventError>> {
        Box::pin(async move {
            let mut line = serde_json::to_vec(event)?;
            line.push(b'\n');

            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(&line).await?;
            file.flush().await?;

            tracing::debug!(path = %self.path.display(), "event appended");
            Ok(())
        })
    }
}
