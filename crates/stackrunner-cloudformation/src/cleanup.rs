use stackrunner_storage::{empty_bucket, ObjectStore, StorageError};

use crate::error::StackError;
use crate::reconciler::Reconciler;

pub const BUCKET_RESOURCE_TYPE: &str = "AWS::S3::Bucket";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    StackMissing,
    /// Deletion protection is still in force; nothing was touched.
    Protected,
    /// Buckets that would have been emptied.
    DryRun { buckets: Vec<String> },
    Emptied { buckets: Vec<String> },
}

impl Reconciler {
    /// Empty every versioned bucket the stack owns so the delete can
    /// remove them.
    pub async fn empty_stack_buckets(
        &self,
        store: &dyn ObjectStore,
        stack_name: &str,
    ) -> Result<CleanupOutcome, StackError> {
        let snapshot = self.snapshot(stack_name).await?;
        if !snapshot.exists {
            tracing::info!(stack = %stack_name, "stack does not exist, no buckets to empty");
            return Ok(CleanupOutcome::StackMissing);
        }
        if snapshot.deletion_protection && self.protection.blocks_deletion() {
            tracing::warn!(
                stack = %stack_name,
                "deletion protection is enabled, leaving buckets untouched"
            );
            return Ok(CleanupOutcome::Protected);
        }

        let resources = self.control_plane.describe_stack_resources(stack_name).await?;
        let owned: Vec<&str> = resources
            .iter()
            .filter(|r| r.resource_type == BUCKET_RESOURCE_TYPE)
            .filter_map(|r| r.physical_resource_id.as_deref())
            .collect();

        if self.dry_run {
            tracing::info!(
                stack = %stack_name,
                buckets = ?owned,
                "dry run, buckets would be emptied"
            );
            return Ok(CleanupOutcome::DryRun {
                buckets: owned.into_iter().map(String::from).collect(),
            });
        }

        let mut buckets = Vec::new();
        for bucket in owned {
            tracing::info!(stack = %stack_name, bucket = %bucket, "emptying bucket");
            match empty_bucket(store, bucket).await {
                Ok(_) => buckets.push(bucket.to_string()),
                Err(StorageError::BucketNotFound { .. }) => {
                    tracing::info!(stack = %stack_name, bucket = %bucket, "bucket already gone");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(CleanupOutcome::Emptied { buckets })
    }
}
