use std::sync::Arc;
use std::time::Duration;

use stackrunner_events::{EventMeta, EventSink, OperationKind, ProgressEvent};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::control_plane::ControlPlane;
use crate::error::StackError;
use crate::model::StackResource;
use crate::wait::Timings;

/// Resource tallies from one listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounters {
    pub total: usize,
    pub ready: usize,
    pub failed: usize,
    pub deleted: usize,
}

impl ResourceCounters {
    pub fn tally(resources: &[StackResource]) -> Self {
        let mut counters = Self {
            total: resources.len(),
            ..Self::default()
        };
        for resource in resources {
            if resource.status.is_ready() {
                counters.ready += 1;
            } else if resource.status.is_failed() {
                counters.failed += 1;
            } else if resource.status.is_deleted() {
                counters.deleted += 1;
            }
        }
        counters
    }

    pub fn is_ready(&self) -> bool {
        self.ready == self.total
    }
}

/// What one watcher tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The stack does not exist yet.
    StackMissing,
    /// Listing resources failed; retried sooner.
    Unavailable,
    /// Fully ready with nothing in flight.
    Settled,
    /// Counters matched the previous tick.
    Suppressed,
    Emitted,
}

/// Reports resource progress for one stack while an operation runs.
///
/// Owns its counters; shares only the stack name with the main flow and is
/// stopped through a watch channel.
pub struct StackWatcher {
    control_plane: Arc<dyn ControlPlane>,
    sink: Arc<dyn EventSink>,
    stack_name: String,
    operation: OperationKind,
    meta: EventMeta,
    poll_interval: Duration,
    retry_interval: Duration,
    transitioning: bool,
    current: ResourceCounters,
    previous: ResourceCounters,
}

impl StackWatcher {
    pub fn new(
        control_plane: Arc<dyn ControlPlane>,
        sink: Arc<dyn EventSink>,
        stack_name: impl Into<String>,
        operation: OperationKind,
        meta: EventMeta,
    ) -> Self {
        let timings = Timings::default();
        Self {
            control_plane,
            sink,
            stack_name: stack_name.into(),
            operation,
            meta,
            poll_interval: timings.watcher_poll_interval,
            retry_interval: timings.watcher_retry_interval,
            transitioning: false,
            current: ResourceCounters::default(),
            previous: ResourceCounters::default(),
        }
    }

    pub fn with_timings(mut self, timings: &Timings) -> Self {
        self.poll_interval = timings.watcher_poll_interval;
        self.retry_interval = timings.watcher_retry_interval;
        self
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    pub fn counters(&self) -> ResourceCounters {
        self.current
    }

    pub fn message(&self) -> String {
        let c = self.current;
        let (action, value) = if self.operation.is_delete() {
            ("Deleting", c.deleted)
        } else {
            ("Provisioning", c.ready)
        };
        let mut message = format!("{action} resources ({value}/{} ready)", c.total);
        if c.failed > 0 {
            message.push_str(&format!(" ({} failed)", c.failed));
        }
        message
    }

    pub async fn tick(&mut self) -> Tick {
        let resources = match self
            .control_plane
            .describe_stack_resources(&self.stack_name)
            .await
        {
            Ok(resources) => resources,
            Err(StackError::NotFound { .. }) => {
                tracing::info!(stack = %self.stack_name, "waiting for stack to be created");
                return Tick::StackMissing;
            }
            Err(e) => {
                tracing::error!(
                    stack = %self.stack_name,
                    error = %e,
                    "failed to list stack resources"
                );
                return Tick::Unavailable;
            }
        };

        self.current = ResourceCounters::tally(&resources);
        if !self.current.is_ready() || self.current.failed > 0 {
            self.transitioning = true;
        }

        if self.current.is_ready() {
            if !self.transitioning {
                return Tick::Settled;
            }
            self.transitioning = false;
        }

        self.emit().await
    }

    async fn emit(&mut self) -> Tick {
        if self.current == self.previous {
            return Tick::Suppressed;
        }
        self.previous = self.current;

        let event = ProgressEvent::info(
            &self.meta,
            self.operation.event_type(self.transitioning),
            self.message(),
        );
        if let Err(e) = self.sink.create_event(&event).await {
            tracing::error!(stack = %self.stack_name, error = %e, "failed to record progress event");
        }
        println!("{}", event.description);
        Tick::Emitted
    }

    /// Tick until `stop` fires or its sender goes away.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        tracing::info!(stack = %self.stack_name, operation = %self.operation, "watcher started");
        loop {
            if *stop.borrow() {
                break;
            }
            let pause = match self.tick().await {
                Tick::StackMissing | Tick::Unavailable => self.retry_interval,
                _ => self.poll_interval,
            };
            tokio::select! {
                _ = stop.changed() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }
        tracing::info!(stack = %self.stack_name, "watcher stopped");
    }

    pub fn spawn(self) -> WatcherHandle {
        let (stop, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(stop_rx));
        WatcherHandle { stop, task }
    }
}

/// A running watcher task.
pub struct WatcherHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "watcher task ended abnormally");
        }
    }
}
