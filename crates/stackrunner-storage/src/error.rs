use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("bucket not found: {bucket}")]
    BucketNotFound { bucket: String },

    #[error("S3 ListObjectVersions error on {bucket}: {message}")]
    ListObjectVersions { bucket: String, message: String },

    #[error("S3 DeleteObject error on {bucket}/{key}: {message}")]
    DeleteObject {
        bucket: String,
        key: String,
        message: String,
    },
}

/// Walk the full error chain and join all causes into one string.
///
/// AWS SDK errors often have terse `Display` impls (e.g. "service error")
/// but useful detail in the source chain.
pub fn format_err_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
