use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EventError;

/// The lifecycle operation a run was started for.
///
/// Selects the phrase used in event types and whether the watcher reports
/// deleted or ready resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Event type for this operation. Transitioning stacks get the
    /// present-continuous form, settled stacks the past tense.
    pub fn event_type(self, transitioning: bool) -> &'static str {
        match (self, transitioning) {
            (Self::Create, true) => "ServiceCreating",
            (Self::Update, true) => "ServiceUpdating",
            (Self::Delete, true) => "ServiceDeleting",
            (Self::Create, false) => "ServiceCreated",
            (Self::Update, false) => "ServiceUpdated",
            (Self::Delete, false) => "ServiceDeleted",
        }
    }

    pub fn is_delete(self) -> bool {
        self == Self::Delete
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(EventError::UnknownOperation(other.to_string())),
        }
    }
}

/// Where events are filed: the owning namespace and the application name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMeta {
    pub namespace: String,
    pub app_name: String,
}

impl EventMeta {
    pub fn new(namespace: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            app_name: app_name.into(),
        }
    }
}

/// A structured progress event for the external event sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub namespace: String,
    pub app_name: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub severity: String,
    pub description: String,
    pub resource_kind: String,
    pub resource_name: String,
}

impl ProgressEvent {
    /// Build an `info` event about the application named in `meta`.
    pub fn info(
        meta: &EventMeta,
        event_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            namespace: meta.namespace.clone(),
            app_name: meta.app_name.clone(),
            event_type: event_type.into(),
            severity: "info".to_string(),
            description: description.into(),
            resource_kind: "app".to_string(),
            resource_name: meta.app_name.clone(),
        }
    }
}
