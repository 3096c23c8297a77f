use crate::model::Tag;

pub const MANAGED_TAG: &str = "stackrunner.io/managed";
pub const PROJECT_TAG: &str = "stackrunner.io/project-name";
pub const APP_TAG: &str = "stackrunner.io/app-name";
pub const ACCOUNT_TAG: &str = "stackrunner.io/account-id";
pub const DELETION_PROTECTION_TAG: &str = "stackrunner.io/deletion-protection";

/// The deletion-protection value configured for this run.
///
/// `None` means the setting is absent. Only the literal `"true"` keeps a
/// protected stack from being deleted; any other value lifts protection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionProtection(Option<String>);

impl DeletionProtection {
    pub fn new(value: Option<String>) -> Self {
        Self(value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
    }

    pub fn unset() -> Self {
        Self(None)
    }

    pub fn enabled() -> Self {
        Self(Some("true".to_string()))
    }

    pub fn value(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn blocks_deletion(&self) -> bool {
        self.0.as_deref() == Some("true")
    }

    pub fn tag(&self) -> Option<Tag> {
        self.0
            .as_ref()
            .map(|v| Tag::new(DELETION_PROTECTION_TAG, v.clone()))
    }
}

/// Whether a deployed stack carries the deletion-protection tag set to
/// `"true"`.
pub fn protection_enabled(tags: &[Tag]) -> bool {
    tags.iter()
        .any(|t| t.key == DELETION_PROTECTION_TAG && t.value == "true")
}

/// Tags applied to every change set this runner creates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<Tag>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard ownership tags plus the protection tag when the
    /// setting is present.
    pub fn managed(
        project: &str,
        app_name: &str,
        account_id: &str,
        protection: &DeletionProtection,
    ) -> Self {
        let mut tags = Self::new()
            .with(MANAGED_TAG, "true")
            .with(PROJECT_TAG, project)
            .with(APP_TAG, app_name)
            .with(ACCOUNT_TAG, account_id);
        if let Some(tag) = protection.tag() {
            tags = tags.with(tag.key, tag.value);
        }
        tags
    }

    /// Add a tag, replacing any existing tag with the same key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let tag = Tag::new(key, value);
        match self.tags.iter_mut().find(|t| t.key == tag.key) {
            Some(existing) => existing.value = tag.value,
            None => self.tags.push(tag),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    pub fn as_slice(&self) -> &[Tag] {
        &self.tags
    }

    pub fn to_vec(&self) -> Vec<Tag> {
        self.tags.clone()
    }
}
