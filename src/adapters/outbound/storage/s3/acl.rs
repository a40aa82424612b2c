//! Canned ACLs for S3 objects
//!
//! object_store has no per-object ACL, so the ACL is applied with a signed
//! PutObjectAcl request once the upload has completed.

use std::{
    future::Future,
    io,
    pin::Pin,
    task::{ready, Context, Poll},
};

use futures::{future::BoxFuture, TryStreamExt};
use object_store::{
    aws::{AwsAuthorizer, AwsCredentialProvider},
    client::{HttpClient, HttpRequestBody},
    CredentialProvider,
};
use tokio::io::AsyncWrite;

use crate::domain::{
    errors::{StorageError, StorageResult},
    value_objects::{CannedAcl, ObjectKey},
};

const ACL_HEADER: &str = "x-amz-acl";

/// Sends signed PutObjectAcl requests for one bucket
#[derive(Clone)]
pub struct AclClient {
    http: HttpClient,
    credentials: AwsCredentialProvider,
    region: String,
    bucket_endpoint: String,
}

impl AclClient {
    /// `bucket_endpoint` is the URL objects of the bucket live under,
    /// e.g. `https://s3.us-east-1.amazonaws.com/uploads`
    pub fn new(
        http: HttpClient,
        credentials: AwsCredentialProvider,
        region: impl Into<String>,
        bucket_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            http,
            credentials,
            region: region.into(),
            bucket_endpoint: bucket_endpoint.into(),
        }
    }

    /// URL of the ACL subresource of `key`
    pub fn acl_url(&self, key: &ObjectKey) -> String {
        let segments: Vec<_> = key.as_str().split('/').map(urlencoding::encode).collect();
        format!(
            "{}/{}?acl",
            self.bucket_endpoint.trim_end_matches('/'),
            segments.join("/")
        )
    }

    pub async fn put_object_acl(&self, key: &ObjectKey, acl: CannedAcl) -> StorageResult<()> {
        let credential = self
            .credentials
            .get_credential()
            .await
            .map_err(|e| acl_error(key, acl, e))?;

        let mut request = http::Request::builder()
            .method(http::Method::PUT)
            .uri(self.acl_url(key))
            .header(ACL_HEADER, acl.as_str())
            .body(HttpRequestBody::empty())
            .map_err(|e| acl_error(key, acl, e))?;
        AwsAuthorizer::new(&credential, "s3", &self.region).authorize(&mut request, None);

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| acl_error(key, acl, e))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(key = %key, acl = %acl, "Applied object ACL");
            return Ok(());
        }

        let body = response
            .into_body()
            .bytes_stream()
            .try_fold(Vec::new(), |mut body, chunk| async move {
                body.extend_from_slice(&chunk);
                Ok(body)
            })
            .await
            .unwrap_or_default();

        Err(acl_error(
            key,
            acl,
            format!("{}: {}", status, String::from_utf8_lossy(&body)),
        ))
    }
}

impl std::fmt::Debug for AclClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AclClient")
            .field("region", &self.region)
            .field("bucket_endpoint", &self.bucket_endpoint)
            .finish_non_exhaustive()
    }
}

fn acl_error(key: &ObjectKey, acl: CannedAcl, err: impl std::fmt::Display) -> StorageError {
    StorageError::Backend {
        message: format!("Failed to apply ACL '{}' to '{}'", acl, key),
        source: Some(err.to_string()),
    }
}

enum Finish {
    Upload,
    Acl(BoxFuture<'static, StorageResult<()>>),
    Done,
}

/// Writer that applies a canned ACL after its upload completes.
///
/// `shutdown` resolves only once both the upload and the ACL request have
/// succeeded.
pub struct AclWriter<W> {
    inner: W,
    client: AclClient,
    key: ObjectKey,
    acl: CannedAcl,
    finish: Finish,
}

impl<W> AclWriter<W> {
    pub fn new(inner: W, client: AclClient, key: ObjectKey, acl: CannedAcl) -> Self {
        Self {
            inner,
            client,
            key,
            acl,
            finish: Finish::Upload,
        }
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for AclWriter<W> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = &mut *self;
        loop {
            match &mut this.finish {
                Finish::Upload => {
                    ready!(Pin::new(&mut this.inner).poll_shutdown(cx))?;
                    let client = this.client.clone();
                    let key = this.key.clone();
                    let acl = this.acl;
                    this.finish = Finish::Acl(Box::pin(async move {
                        client.put_object_acl(&key, acl).await
                    }));
                }
                Finish::Acl(apply) => {
                    let result = ready!(apply.as_mut().poll(cx));
                    this.finish = Finish::Done;
                    result.map_err(io::Error::other)?;
                }
                Finish::Done => return Poll::Ready(Ok(())),
            }
        }
    }
}
