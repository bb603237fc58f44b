use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3 as s3;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart as S3CompletedPart};
use aws_types::region::Region;
use bytes::Bytes;
use s3::primitives::ByteStream;
use tracing::debug;

use crate::config::{UploadConfig, DEFAULT_REGION};
use crate::error::StoreError;
use crate::s3::store::{CompletedPart, MultipartStore, StoreFuture};

/// Builds a client for the configured endpoint with static credentials.
pub async fn connect(config: &UploadConfig) -> s3::Client {
    s3::Client::from_conf(client_config(config).await)
}

/// Path-style addressing is forced so non-AWS stores (ceph, minio) resolve
/// the bucket from the path instead of the host name.
pub async fn client_config(config: &UploadConfig) -> s3::Config {
    let region_provider = RegionProviderChain::first_try(config.region.clone().map(Region::new))
        .or_default_provider()
        .or_else(Region::new(DEFAULT_REGION));
    let credentials = Credentials::new(
        config.access_key.as_str(),
        config.secret_key.as_str(),
        None,
        None,
        "upload-config",
    );
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .credentials_provider(credentials)
        .load()
        .await;

    debug!(endpoint = %config.endpoint, "s3 client configured");
    s3::config::Builder::from(&sdk_config)
        .endpoint_url(&config.endpoint)
        .force_path_style(true)
        .build()
}

fn store_error<E>(operation: &'static str, err: E) -> StoreError
where
    E: std::error::Error,
{
    StoreError::new(operation, DisplayErrorContext(err).to_string())
}

impl MultipartStore for s3::Client {
    fn create_multipart_upload<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
    ) -> StoreFuture<'a, String> {
        Box::pin(async move {
            let response = self
                .create_multipart_upload()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|err| store_error("CreateMultipartUpload", err))?;
            response
                .upload_id()
                .map(str::to_owned)
                .ok_or_else(|| {
                    StoreError::new("CreateMultipartUpload", "response has no upload id")
                })
        })
    }

    fn upload_part<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        upload_id: &'a str,
        part_number: i32,
        body: Bytes,
    ) -> StoreFuture<'a, String> {
        Box::pin(async move {
            let response = self
                .upload_part()
                .body(ByteStream::from(body))
                .bucket(bucket)
                .key(key)
                .part_number(part_number)
                .upload_id(upload_id)
                .send()
                .await
                .map_err(|err| store_error("UploadPart", err))?;
            response
                .e_tag()
                .map(str::to_owned)
                .ok_or_else(|| StoreError::new("UploadPart", "response has no etag"))
        })
    }

    fn complete_multipart_upload<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        upload_id: &'a str,
        parts: &'a [CompletedPart],
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let completed_parts = parts
                .iter()
                .map(|part| {
                    S3CompletedPart::builder()
                        .part_number(part.part_number)
                        .e_tag(&part.e_tag)
                        .build()
                })
                .collect();
            let completed_multipart_upload = CompletedMultipartUpload::builder()
                .set_parts(Some(completed_parts))
                .build();

            self.complete_multipart_upload()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .multipart_upload(completed_multipart_upload)
                .send()
                .await
                .map_err(|err| store_error("CompleteMultipartUpload", err))?;
            Ok(())
        })
    }

    fn abort_multipart_upload<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        upload_id: &'a str,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.abort_multipart_upload()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .send()
                .await
                .map_err(|err| store_error("AbortMultipartUpload", err))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::interceptors::BeforeTransmitInterceptorContextRef;
    use aws_sdk_s3::config::{ConfigBag, Intercept, RuntimeComponents};
    use aws_sdk_s3::error::BoxError;
    use std::sync::{Arc, Mutex};

    /// Records the outgoing request uri and stops the request before it
    /// reaches the network.
    #[derive(Debug, Clone, Default)]
    struct CaptureUri(Arc<Mutex<Vec<String>>>);

    impl Intercept for CaptureUri {
        fn name(&self) -> &'static str {
            "CaptureUri"
        }

        fn read_before_transmit(
            &self,
            context: &BeforeTransmitInterceptorContextRef<'_>,
            _runtime_components: &RuntimeComponents,
            _cfg: &mut ConfigBag,
        ) -> Result<(), BoxError> {
            self.0.lock().unwrap().push(context.request().uri().to_string());
            Err("request captured".into())
        }
    }

    fn config() -> UploadConfig {
        UploadConfig {
            file_path: "disk.img".into(),
            bucket_name: "backups".into(),
            object_name: "disk.img".into(),
            endpoint: "http://127.0.0.1:7480".into(),
            access_key: "ak".into(),
            secret_key: "sk".into(),
            region: Some("eu-west-1".into()),
        }
    }

    #[tokio::test]
    async fn configured_region_wins() {
        let client = connect(&config()).await;
        assert_eq!(client.config().region(), Some(&Region::new("eu-west-1")));
    }

    #[tokio::test]
    async fn bucket_goes_in_the_path() {
        let capture = CaptureUri::default();
        let conf = client_config(&config())
            .await
            .to_builder()
            .interceptor(capture.clone())
            .build();
        let client = s3::Client::from_conf(conf);

        let result = MultipartStore::create_multipart_upload(&client, "backups", "disk.img").await;
        assert!(result.is_err());

        let uris = capture.0.lock().unwrap().clone();
        assert!(!uris.is_empty());
        assert!(
            uris[0].starts_with("http://127.0.0.1:7480/backups/disk.img"),
            "unexpected uri {}",
            uris[0]
        );
    }
}
