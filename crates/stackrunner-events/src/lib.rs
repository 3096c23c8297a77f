//! stackrunner-events
//!
//! Progress reporting for in-flight stack operations: the event model,
//! the sinks that receive events, and the termination log that carries
//! the final diagnostic for the operator.

pub mod error;
pub mod event;
pub mod sink;
pub mod termination;

pub use crate::error::EventError;
pub use crate::event::{EventMeta, OperationKind, ProgressEvent};
pub use crate::sink::{BoxFuture, EventSink, JsonLinesSink, TracingSink};
pub use crate::termination::TerminationLog;
