//! S3 client construction for the object_store backend
//!
//! Connection parameters are carried verbatim to `AmazonS3Builder`; nothing
//! here interprets them beyond deciding which source a value comes from.

use object_store::{
    aws::{AmazonS3Builder, AmazonS3ConfigKey},
    client::{HttpConnector, ReqwestConnector},
    BackoffConfig, ClientOptions, ObjectStore as ObjectStoreBackend, RetryConfig,
};
use std::{str::FromStr, sync::Arc, time::Duration};

use crate::domain::{errors::ConfigError, value_objects::BucketName};

pub mod acl;

pub use acl::{AclClient, AclWriter};

/// Connection parameters for an S3-compatible service.
///
/// Unset values fall back to the environment in [`S3Config::resolve`].
#[derive(Debug, Clone, Default, bon::Builder)]
pub struct S3Config {
    #[builder(into)]
    pub endpoint: Option<String>,
    #[builder(into)]
    pub region: Option<String>,
    #[builder(into)]
    pub access_key_id: Option<String>,
    #[builder(into)]
    pub secret_access_key: Option<String>,
    #[builder(into)]
    pub session_token: Option<String>,
    /// Permit plain HTTP endpoints (SSL disabled)
    #[builder(default)]
    pub allow_http: bool,
    /// Use `bucket.host` addressing instead of path-style requests
    pub virtual_hosted_style: Option<bool>,
    /// Client-level retries of a single request
    pub max_retries: Option<usize>,
    pub retry_timeout: Option<Duration>,
    pub backoff: Option<BackoffConfig>,
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    /// Additional `AmazonS3ConfigKey` options, e.g. `("aws_checksum_algorithm", "sha256")`
    #[builder(default)]
    pub extra: Vec<(String, String)>,
}

/// S3 connection parameters after applying environment fallbacks
#[derive(Debug, Clone)]
pub struct ResolvedS3Config {
    pub endpoint: Option<String>,
    pub region: String,
    pub credentials: Option<(String, String)>,
    pub session_token: Option<String>,
    pub allow_http: bool,
    pub virtual_hosted_style: Option<bool>,
    pub retry: Option<RetryConfig>,
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub extra: Vec<(AmazonS3ConfigKey, String)>,
}

impl S3Config {
    /// Resolve against the process environment
    pub fn resolve(self) -> Result<ResolvedS3Config, ConfigError> {
        self.resolve_with(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
    }

    /// Resolve with explicit values first, then `lookup`, then an error.
    ///
    /// The region is required. Credentials are optional as a whole; when
    /// neither half is found the client's own provider chain is used.
    pub fn resolve_with<F>(self, lookup: F) -> Result<ResolvedS3Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = self.endpoint.or_else(|| lookup("AWS_ENDPOINT_URL"));
        let region = self
            .region
            .or_else(|| lookup("AWS_REGION"))
            .or_else(|| lookup("AWS_DEFAULT_REGION"))
            .ok_or(ConfigError::MissingRegion)?;

        let access_key_id = self.access_key_id.or_else(|| lookup("AWS_ACCESS_KEY_ID"));
        let secret_access_key = self
            .secret_access_key
            .or_else(|| lookup("AWS_SECRET_ACCESS_KEY"));
        let credentials = match (access_key_id, secret_access_key) {
            (Some(key), Some(secret)) => Some((key, secret)),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::IncompleteCredentials {
                    present: "access key id",
                    missing: "secret access key",
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::IncompleteCredentials {
                    present: "secret access key",
                    missing: "access key id",
                })
            }
        };
        let session_token = self.session_token.or_else(|| lookup("AWS_SESSION_TOKEN"));

        let retry = if self.max_retries.is_some()
            || self.retry_timeout.is_some()
            || self.backoff.is_some()
        {
            let mut retry = RetryConfig::default();
            if let Some(backoff) = self.backoff {
                retry.backoff = backoff;
            }
            if let Some(max_retries) = self.max_retries {
                retry.max_retries = max_retries;
            }
            if let Some(retry_timeout) = self.retry_timeout {
                retry.retry_timeout = retry_timeout;
            }
            Some(retry)
        } else {
            None
        };

        let extra = self
            .extra
            .into_iter()
            .map(|(name, value)| {
                AmazonS3ConfigKey::from_str(&name)
                    .map(|key| (key, value))
                    .map_err(|_| ConfigError::UnknownClientOption(name))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResolvedS3Config {
            endpoint,
            region,
            credentials,
            session_token,
            allow_http: self.allow_http,
            virtual_hosted_style: self.virtual_hosted_style,
            retry,
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            extra,
        })
    }
}

/// Clients for one S3 bucket
#[derive(Debug)]
pub struct S3Clients {
    pub store: Arc<dyn ObjectStoreBackend>,
    pub acl: AclClient,
}

/// Create the object and ACL clients bound to `bucket`
pub fn create_s3_store(
    bucket: &BucketName,
    config: &ResolvedS3Config,
) -> Result<S3Clients, ConfigError> {
    let mut builder = AmazonS3Builder::new()
        .with_bucket_name(bucket.as_str())
        .with_region(&config.region);

    if let Some((access_key, secret_key)) = &config.credentials {
        builder = builder
            .with_access_key_id(access_key)
            .with_secret_access_key(secret_key);
    }

    if let Some(token) = &config.session_token {
        builder = builder.with_token(token);
    }

    if let Some(endpoint) = &config.endpoint {
        builder = builder.with_endpoint(endpoint);
    }

    if let Some(virtual_hosted) = config.virtual_hosted_style {
        builder = builder.with_virtual_hosted_style_request(virtual_hosted);
    }

    if let Some(retry) = &config.retry {
        builder = builder.with_retry(retry.clone());
    }

    let mut client_options = ClientOptions::new().with_allow_http(config.allow_http);
    if let Some(timeout) = config.request_timeout {
        client_options = client_options.with_timeout(timeout);
    }
    if let Some(timeout) = config.connect_timeout {
        client_options = client_options.with_connect_timeout(timeout);
    }
    builder = builder.with_client_options(client_options.clone());

    for (key, value) in &config.extra {
        builder = builder.with_config(key.clone(), value);
    }

    let endpoint = bucket_endpoint(&builder, bucket, &config.region);
    let store = builder.build()?;

    let http = ReqwestConnector::default().connect(&client_options)?;
    let acl = AclClient::new(
        http,
        Arc::clone(store.credentials()),
        config.region.as_str(),
        endpoint,
    );

    tracing::debug!(
        bucket = %bucket,
        region = %config.region,
        endpoint = config.endpoint.as_deref(),
        "Built S3 client"
    );

    Ok(S3Clients {
        store: Arc::new(store),
        acl,
    })
}

/// URL objects of `bucket` live under, addressed the way the object client does
fn bucket_endpoint(builder: &AmazonS3Builder, bucket: &BucketName, region: &str) -> String {
    let virtual_hosted = builder
        .get_config_value(&AmazonS3ConfigKey::VirtualHostedStyleRequest)
        .is_some_and(|v| v == "true");

    match (builder.get_config_value(&AmazonS3ConfigKey::Endpoint), virtual_hosted) {
        (Some(endpoint), true) => endpoint,
        (Some(endpoint), false) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
        (None, true) => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        (None, false) => format!("https://s3.{}.amazonaws.com/{}", region, bucket),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ObjectKey;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_explicit_values_win_over_environment() {
        let config = S3Config::builder()
            .region("eu-west-1")
            .access_key_id("explicit-key")
            .secret_access_key("explicit-secret")
            .build();

        let resolved = config
            .resolve_with(env(&[
                ("AWS_REGION", "us-east-1"),
                ("AWS_ACCESS_KEY_ID", "env-key"),
                ("AWS_SECRET_ACCESS_KEY", "env-secret"),
            ]))
            .unwrap();

        assert_eq!(resolved.region, "eu-west-1");
        assert_eq!(
            resolved.credentials,
            Some(("explicit-key".to_string(), "explicit-secret".to_string()))
        );
    }

    #[test]
    fn test_environment_fills_missing_values() {
        let resolved = S3Config::default()
            .resolve_with(env(&[
                ("AWS_DEFAULT_REGION", "ap-south-1"),
                ("AWS_ENDPOINT_URL", "http://localhost:9000"),
                ("AWS_ACCESS_KEY_ID", "env-key"),
                ("AWS_SECRET_ACCESS_KEY", "env-secret"),
            ]))
            .unwrap();

        assert_eq!(resolved.region, "ap-south-1");
        assert_eq!(resolved.endpoint.as_deref(), Some("http://localhost:9000"));
        assert!(resolved.credentials.is_some());
        assert!(resolved.retry.is_none());
    }

    #[test]
    fn test_missing_region_is_an_error() {
        let err = S3Config::default().resolve_with(env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRegion));
    }

    #[test]
    fn test_half_credentials_are_an_error() {
        let err = S3Config::builder()
            .region("us-east-1")
            .access_key_id("key-only")
            .build()
            .resolve_with(env(&[]))
            .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::IncompleteCredentials {
                missing: "secret access key",
                ..
            }
        ));
    }

    #[test]
    fn test_no_credentials_defers_to_provider_chain() {
        let resolved = S3Config::builder()
            .region("us-east-1")
            .build()
            .resolve_with(env(&[]))
            .unwrap();
        assert!(resolved.credentials.is_none());
    }

    #[test]
    fn test_retry_tuning_is_passed_through() {
        let resolved = S3Config::builder()
            .region("us-east-1")
            .max_retries(7)
            .build()
            .resolve_with(env(&[]))
            .unwrap();

        let retry = resolved.retry.unwrap();
        assert_eq!(retry.max_retries, 7);
        assert_eq!(retry.retry_timeout, RetryConfig::default().retry_timeout);
    }

    #[test]
    fn test_extra_options_are_parsed() {
        let resolved = S3Config::builder()
            .region("us-east-1")
            .extra(vec![(
                "aws_checksum_algorithm".to_string(),
                "sha256".to_string(),
            )])
            .build()
            .resolve_with(env(&[]))
            .unwrap();
        assert_eq!(resolved.extra.len(), 1);

        let err = S3Config::builder()
            .region("us-east-1")
            .extra(vec![("aws_max_redirects".to_string(), "3".to_string())])
            .build()
            .resolve_with(env(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownClientOption(name) if name == "aws_max_redirects"));
    }

    #[test]
    fn test_create_s3_store_with_static_credentials() {
        let resolved = S3Config::builder()
            .region("us-east-1")
            .endpoint("http://localhost:9000")
            .access_key_id("minioadmin")
            .secret_access_key("minioadmin")
            .allow_http(true)
            .build()
            .resolve_with(env(&[]))
            .unwrap();

        let bucket = BucketName::new("uploads".to_string()).unwrap();
        let clients = create_s3_store(&bucket, &resolved).unwrap();
        let key = ObjectKey::new("media/a #1.txt".to_string()).unwrap();
        assert_eq!(
            clients.acl.acl_url(&key),
            "http://localhost:9000/uploads/media/a%20%231.txt?acl"
        );
    }

    #[test]
    fn test_acl_client_follows_bucket_addressing() {
        let bucket = BucketName::new("uploads".to_string()).unwrap();
        let key = ObjectKey::new("a.txt".to_string()).unwrap();
        let url = |config: S3Config| {
            let resolved = config.resolve_with(env(&[])).unwrap();
            create_s3_store(&bucket, &resolved).unwrap().acl.acl_url(&key)
        };

        assert_eq!(
            url(S3Config::builder().region("eu-west-1").build()),
            "https://s3.eu-west-1.amazonaws.com/uploads/a.txt?acl"
        );
        assert_eq!(
            url(S3Config::builder()
                .region("eu-west-1")
                .virtual_hosted_style(true)
                .build()),
            "https://uploads.s3.eu-west-1.amazonaws.com/a.txt?acl"
        );
        assert_eq!(
            url(S3Config::builder()
                .region("eu-west-1")
                .endpoint("https://uploads.storage.example.com")
                .virtual_hosted_style(true)
                .build()),
            "https://uploads.storage.example.com/a.txt?acl"
        );
    }
}
