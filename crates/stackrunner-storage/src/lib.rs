//! stackrunner-storage
//!
//! Object-storage operations needed before a stack can be torn down.
//! Versioned buckets refuse deletion while any object version or delete
//! marker remains, so every version is removed explicitly.

pub mod empty;
pub mod error;
pub mod s3;
pub mod store;

pub use crate::empty::{empty_bucket, EmptiedBucket};
pub use crate::error::{format_err_chain, StorageError};
pub use crate::s3::S3ObjectStore;
pub use crate::store::{BoxFuture, ObjectStore, ObjectVersion, VersionPage};
