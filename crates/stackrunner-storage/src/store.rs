use std::future::Future;
use std::pin::Pin;

use crate::error::StorageError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One object version or delete marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectVersion {
    pub key: String,
    /// `None` for objects written before versioning was enabled.
    pub version_id: Option<String>,
}

impl ObjectVersion {
    pub fn new(key: impl Into<String>, version_id: Option<&str>) -> Self {
        Self {
            key: key.into(),
            version_id: version_id.map(String::from),
        }
    }
}

/// One page of a version listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionPage {
    pub versions: Vec<ObjectVersion>,
    pub delete_markers: Vec<ObjectVersion>,
    pub is_truncated: bool,
    pub next_key_marker: Option<String>,
    pub next_version_id_marker: Option<String>,
}

/// The object-storage operations used by bucket emptying.
pub trait ObjectStore: Send + Sync {
    /// List one page of object versions and delete markers, resuming from
    /// the given markers.
    fn list_object_versions<'a>(
        &'a self,
        bucket: &'a str,
        key_marker: Option<&'a str>,
        version_id_marker: Option<&'a str>,
    ) -> BoxFuture<'a, Result<VersionPage, StorageError>>;

    /// Permanently delete one object version (or delete marker).
    fn delete_object_version<'a>(
        &'a self,
        bucket: &'a str,
        object: &'a ObjectVersion,
    ) -> BoxFuture<'a, Result<(), StorageError>>;
}
