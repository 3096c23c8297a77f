use aws_sdk_s3::Client;
use aws_sdk_s3::error::ProvideErrorMetadata;

use crate::error::{format_err_chain, StorageError};
use crate::store::{BoxFuture, ObjectStore, ObjectVersion, VersionPage};

/// [`ObjectStore`] backed by the AWS S3 SDK.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

impl ObjectStore for S3ObjectStore {
    fn list_object_versions<'a>(
        &'a self,
        bucket: &'a str,
        key_marker: Option<&'a str>,
        version_id_marker: Option<&'a str>,
    ) -> BoxFuture<'a, Result<VersionPage, StorageError>> {
        Box::pin(async move {
            let resp = self
                .client
                .list_object_versions()
                .bucket(bucket)
                .set_key_marker(key_marker.map(String::from))
                .set_version_id_marker(version_id_marker.map(String::from))
                .send()
                .await
                .map_err(|e| {
                    let err = e.into_service_error();
                    if err.code() == Some("NoSuchBucket") {
                        StorageError::BucketNotFound {
                            bucket: bucket.to_string(),
                        }
                    } else {
                        StorageError::ListObjectVersions {
                            bucket: bucket.to_string(),
                            message: format_err_chain(&err),
                        }
                    }
                })?;

            let versions = resp
                .versions()
                .iter()
                .filter_map(|v| v.key().map(|key| ObjectVersion::new(key, v.version_id())))
                .collect();
            let delete_markers = resp
                .delete_markers()
                .iter()
                .filter_map(|m| m.key().map(|key| ObjectVersion::new(key, m.version_id())))
                .collect();

            Ok(VersionPage {
                versions,
                delete_markers,
                is_truncated: resp.is_truncated() == Some(true),
                next_key_marker: resp.next_key_marker().map(String::from),
                next_version_id_marker: resp.next_version_id_marker().map(String::from),
            })
        })
    }

    fn delete_object_version<'a>(
        &'a self,
        bucket: &'a str,
        object: &'a ObjectVersion,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.client
                .delete_object()
                .bucket(bucket)
                .key(&object.key)
                .set_version_id(object.version_id.clone())
                .send()
                .await
                .map_err(|e| StorageError::DeleteObject {
                    bucket: bucket.to_string(),
                    key: object.key.clone(),
                    message: format_err_chain(&e.into_service_error()),
                })?;
            Ok(())
        })
    }
}
