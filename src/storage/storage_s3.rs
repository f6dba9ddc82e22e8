//! S3 object client
//!
//! Implements [`ObjectClient`] on top of `aws-sdk-s3`, for AWS and any
//! S3-compatible endpoint (MinIO, Azurite's S3 gateway, Ceph RGW). The
//! datastore account name and key are used as the access key id and secret.
//! SDK failures are reduced to a [`ServiceError`] by error code and HTTP
//! status, so the datastore can tell a missing object from everything else.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{
    config::http::HttpResponse,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    operation::head_object::HeadObjectOutput,
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration},
    Client as S3Client,
};

use crate::error::{ServiceError, ServiceErrorKind, ServiceResult};
use crate::storage::client::{ObjectBody, ObjectClient, ObjectMeta, UserMetadata};
use crate::storage::config::DatastoreConfig;
use bytes::Bytes;

/// Region S3 treats as the default location for new buckets
const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for the S3 driver
#[derive(Debug, Clone)]
pub struct S3Config {
    /// AWS region
    pub region: String,
    /// S3 endpoint URL (for S3-compatible services)
    pub endpoint_url: Option<String>,
    /// Enable path-style addressing
    pub path_style: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint_url: None,
            path_style: false,
        }
    }
}

/// Object client talking to an S3-compatible service
#[derive(Debug, Clone)]
pub struct S3ObjectClient {
    client: S3Client,
    region: String,
}

impl S3ObjectClient {
    /// Build a client using the datastore's account credentials
    pub async fn new(datastore_config: &DatastoreConfig, s3_config: &S3Config) -> Self {
        let mut builder = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(s3_config.region.clone()))
            .credentials_provider(aws_sdk_s3::config::Credentials::new(
                &datastore_config.account_name,
                &datastore_config.account_key,
                None,
                None,
                "blob-datastore",
            ));

        if let Some(endpoint) = &s3_config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        let sdk_config = builder.load().await;
        let s3_conf = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(s3_config.path_style)
            .build();

        Self {
            client: S3Client::from_conf(s3_conf),
            region: s3_config.region.clone(),
        }
    }

    /// Wrap an already configured SDK client
    pub fn from_client(client: S3Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    async fn create_bucket(&self, container: &str) -> ServiceResult<()> {
        let mut request = self.client.create_bucket().bucket(container);
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        match request.send().await.map_err(from_sdk_error) {
            Ok(_) => {
                tracing::info!(container, region = %self.region, "created bucket");
                Ok(())
            }
            // lost a creation race with another adapter
            Err(err) if err.kind == ServiceErrorKind::AlreadyExists => Ok(()),
            Err(err) => Err(err),
        }
    }
}

impl ObjectClient for S3ObjectClient {
    async fn upload(
        &self,
        container: &str,
        path: &str,
        data: Bytes,
        metadata: &UserMetadata,
    ) -> ServiceResult<()> {
        self.client
            .put_object()
            .bucket(container)
            .key(path)
            .set_metadata(Some(metadata.clone()))
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(from_sdk_error)?;
        Ok(())
    }

    async fn download(&self, container: &str, path: &str) -> ServiceResult<ObjectBody> {
        let output = self
            .client
            .get_object()
            .bucket(container)
            .key(path)
            .send()
            .await
            .map_err(from_sdk_error)?;

        let content_length = output.content_length.and_then(|len| u64::try_from(len).ok());
        let stream = futures::stream::try_unfold(output.body, |mut body| async move {
            match body.try_next().await {
                Ok(Some(chunk)) => Ok(Some((chunk, body))),
                Ok(None) => Ok(None),
                Err(e) => Err(ServiceError::new(
                    ServiceErrorKind::Transport,
                    format!("failed to read object body: {}", e),
                )),
            }
        });

        Ok(ObjectBody::new(Box::pin(stream), content_length))
    }

    /// HEAD the object.
    ///
    /// HEAD responses have no body, so a missing bucket comes back as the
    /// same bare 404 as a missing object and is reported as not-found.
    /// `connect` creates the bucket up front; a bucket removed afterwards
    /// makes `has` answer `false` until a write fails with `NoSuchBucket`.
    async fn stat(&self, container: &str, path: &str) -> ServiceResult<ObjectMeta> {
        let output = self
            .client
            .head_object()
            .bucket(container)
            .key(path)
            .send()
            .await
            .map_err(from_sdk_error)?;

        meta_from_head(output)
    }

    async fn delete(&self, container: &str, path: &str) -> ServiceResult<()> {
        // S3 acknowledges deletes of missing keys, so stat first to report
        // not-found like other blob services do.
        self.stat(container, path).await?;

        self.client
            .delete_object()
            .bucket(container)
            .key(path)
            .send()
            .await
            .map_err(from_sdk_error)?;
        Ok(())
    }

    async fn ensure_container(&self, container: &str) -> ServiceResult<()> {
        match self
            .client
            .head_bucket()
            .bucket(container)
            .send()
            .await
            .map_err(from_sdk_error)
        {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => self.create_bucket(container).await,
            Err(err) => Err(err),
        }
    }
}

/// Object metadata from a HEAD response. A size the service did not report
/// is a malformed response, never an empty object.
fn meta_from_head(output: HeadObjectOutput) -> ServiceResult<ObjectMeta> {
    let content_length = output.content_length.ok_or_else(|| {
        ServiceError::new(
            ServiceErrorKind::MalformedResponse,
            "HEAD response carries no Content-Length",
        )
    })?;
    let content_length = u64::try_from(content_length).map_err(|_| {
        ServiceError::new(
            ServiceErrorKind::MalformedResponse,
            format!("HEAD response carries a negative Content-Length: {}", content_length),
        )
    })?;

    Ok(ObjectMeta {
        content_length,
        last_modified: output
            .last_modified
            .and_then(|dt| chrono::DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())),
        etag: output.e_tag,
        metadata: output.metadata.unwrap_or_default(),
    })
}

/// Reduce an SDK failure to a [`ServiceError`]
fn from_sdk_error<E>(err: SdkError<E, HttpResponse>) -> ServiceError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let message = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            ServiceError::new(ServiceErrorKind::Transport, message)
        }
        SdkError::ResponseError(_) => ServiceError::new(ServiceErrorKind::MalformedResponse, message),
        SdkError::ServiceError(context) => {
            let code = context.err().code();
            let status = context.raw().status().as_u16();
            let service_error = ServiceError::new(kind_for(code, status), message);
            match code {
                Some(code) => service_error.with_code(code),
                None => service_error,
            }
        }
        _ => ServiceError::new(ServiceErrorKind::Other, message),
    }
}

/// Failure kind for an S3 error code, falling back to the HTTP status
fn kind_for(code: Option<&str>, status: u16) -> ServiceErrorKind {
    match code {
        Some("NoSuchKey") | Some("NotFound") => ServiceErrorKind::NotFound,
        Some("NoSuchBucket") => ServiceErrorKind::Other,
        Some("BucketAlreadyOwnedByYou") | Some("BucketAlreadyExists") => ServiceErrorKind::AlreadyExists,
        Some("AccessDenied")
        | Some("InvalidAccessKeyId")
        | Some("SignatureDoesNotMatch")
        | Some("ExpiredToken") => ServiceErrorKind::Unauthorized,
        Some("SlowDown")
        | Some("Throttling")
        | Some("ThrottlingException")
        | Some("RequestLimitExceeded")
        | Some("ServiceUnavailable") => ServiceErrorKind::Throttled,
        _ => match status {
            404 => ServiceErrorKind::NotFound,
            401 | 403 => ServiceErrorKind::Unauthorized,
            409 => ServiceErrorKind::AlreadyExists,
            429 | 503 => ServiceErrorKind::Throttled,
            _ => ServiceErrorKind::Other,
        },
    }
}
