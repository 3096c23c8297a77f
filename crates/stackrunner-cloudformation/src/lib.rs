//! stackrunner-cloudformation
//!
//! Reconciles CloudFormation stacks: deploys templates through change
//! sets, deletes stacks behind a deletion-protection gate, recovers stacks
//! left in failed states by earlier runs, and reports resource progress
//! while an operation is in flight.

pub mod aws;
pub mod cleanup;
pub mod control_plane;
pub mod delete;
pub mod deploy;
pub mod error;
pub mod hooks;
pub mod model;
pub mod outputs;
pub mod reconciler;
pub mod recovery;
pub mod snapshot;
pub mod stack_events;
pub mod tags;
pub mod template;
pub mod wait;
pub mod watcher;

pub use crate::aws::AwsControlPlane;
pub use crate::cleanup::CleanupOutcome;
pub use crate::control_plane::{BoxFuture, ControlPlane};
pub use crate::deploy::DeployOutcome;
pub use crate::error::StackError;
pub use crate::hooks::{ChangeSetHooks, HookKind, HookRun};
pub use crate::model::{
    ChangeSetDescription, ChangeSetStatus, ChangeSetType, CreateChangeSetRequest, ResourceChange,
    ResourceStatus, StackDescription, StackEvent, StackOutput, StackResource, StackStatus, Tag,
};
pub use crate::outputs::write_outputs;
pub use crate::reconciler::Reconciler;
pub use crate::recovery::RecoveryAction;
pub use crate::snapshot::{get_snapshot, StackSnapshot};
pub use crate::stack_events::stream_stack_events;
pub use crate::tags::{DeletionProtection, TagSet};
pub use crate::template::{StaticTemplate, TemplateSource};
pub use crate::wait::{wait_until_settled, Timings};
pub use crate::watcher::{ResourceCounters, StackWatcher, Tick, WatcherHandle};
