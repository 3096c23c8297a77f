use crate::error::StorageError;
use crate::store::ObjectStore;

/// Tally of what [`empty_bucket`] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptiedBucket {
    pub pages: usize,
    pub versions_deleted: usize,
    pub delete_markers_deleted: usize,
}

/// Delete every object version and delete marker in `bucket`.
///
/// Pages through the version listing, following the key and version-id
/// markers until the listing is no longer truncated.
pub async fn empty_bucket(
    store: &dyn ObjectStore,
    bucket: &str,
) -> Result<EmptiedBucket, StorageError> {
    let mut tally = EmptiedBucket::default();
    let mut key_marker: Option<String> = None;
    let mut version_id_marker: Option<String> = None;

    loop {
        let page = store
            .list_object_versions(bucket, key_marker.as_deref(), version_id_marker.as_deref())
            .await?;
        tally.pages += 1;

        for version in &page.versions {
            store.delete_object_version(bucket, version).await?;
            tally.versions_deleted += 1;
        }

        for marker in &page.delete_markers {
            store.delete_object_version(bucket, marker).await?;
            tally.delete_markers_deleted += 1;
        }

        tracing::debug!(
            bucket = %bucket,
            versions = page.versions.len(),
            delete_markers = page.delete_markers.len(),
            "deleted page of object versions"
        );

        if page.is_truncated {
            key_marker = page.next_key_marker;
            version_id_marker = page.next_version_id_marker;
        } else {
            break;
        }
    }

    tracing::info!(
        bucket = %bucket,
        versions = tally.versions_deleted,
        delete_markers = tally.delete_markers_deleted,
        "bucket emptied"
    );

    Ok(tally)
}
