use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use stackrunner_events::TerminationLog;
use tokio::sync::watch;

use crate::control_plane::ControlPlane;
use crate::error::StackError;
use crate::model::StackEvent;

fn event_line(event: &StackEvent) -> String {
    format!(
        "{} {} {} {}",
        event.timestamp,
        event.logical_resource_id.as_deref().unwrap_or("-"),
        event
            .resource_status
            .as_ref()
            .map_or("-", |s| s.as_str()),
        event.reason.as_deref().unwrap_or(""),
    )
    .trim_end()
    .to_string()
}

/// Poll the stack's event history until `stop` fires, logging each new
/// event once in chronological order. Events are told apart by id, so two
/// events sharing a timestamp are both logged.
///
/// Failure events accumulate and the whole list is rewritten to the
/// termination log after every poll that saw one. Returns the accumulated
/// failure lines.
pub async fn stream_stack_events(
    control_plane: Arc<dyn ControlPlane>,
    stack_name: String,
    termination_log: Option<TerminationLog>,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) -> String {
    let mut seen: HashSet<String> = HashSet::new();
    let mut failures = String::new();

    loop {
        if *stop.borrow() {
            break;
        }

        match control_plane.describe_stack_events(&stack_name).await {
            Ok(mut events) => {
                events.sort_by_key(|e| e.timestamp);
                let mut new_failure = false;
                for event in &events {
                    if !seen.insert(event.event_id.clone()) {
                        continue;
                    }
                    let line = event_line(event);
                    tracing::info!(stack = %stack_name, "{line}");
                    if event.is_failure() {
                        failures.push_str(&line);
                        failures.push('\n');
                        new_failure = true;
                    }
                }
                if new_failure {
                    if let Some(log) = &termination_log {
                        log.write(&failures).await;
                    }
                }
            }
            Err(StackError::NotFound { .. }) => {
                tracing::debug!(stack = %stack_name, "no stack events yet");
            }
            Err(e) => {
                tracing::warn!(stack = %stack_name, error = %e, "failed to describe stack events");
            }
        }

        tokio::select! {
            _ = stop.changed() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    failures
}
