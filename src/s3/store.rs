//! The remote half of the multipart protocol.
//!
//! `aws_sdk_s3::Client` implements this in `client.rs`; tests swap in a
//! recording mock.

use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;

use crate::error::StoreError;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// A part the store has accepted, identified by the tag it handed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    pub part_number: i32,
    pub e_tag: String,
}

pub trait MultipartStore: Send + Sync {
    /// Opens a session and returns its upload id.
    fn create_multipart_upload<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
    ) -> StoreFuture<'a, String>;

    /// Sends one part and returns its ETag.
    fn upload_part<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        upload_id: &'a str,
        part_number: i32,
        body: Bytes,
    ) -> StoreFuture<'a, String>;

    fn complete_multipart_upload<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        upload_id: &'a str,
        parts: &'a [CompletedPart],
    ) -> StoreFuture<'a, ()>;

    fn abort_multipart_upload<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        upload_id: &'a str,
    ) -> StoreFuture<'a, ()>;
}
