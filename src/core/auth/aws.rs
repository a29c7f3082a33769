//! AWS IAM login.
//!
//! Vault verifies the caller by replaying a signed STS `GetCallerIdentity`
//! request. This module signs that request (SigV4) and packs it into the
//! login body Vault expects.
//!
//! Credentials come from `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and
//! `AWS_SESSION_TOKEN`. With the `aws` feature (on by default) the default
//! provider chain covers everything else, including the instance profile of
//! an EC2 or ECS worker. The chain may call metadata endpoints, so it is
//! only queried at login.

use std::collections::BTreeMap;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::core::constants;
use crate::error::{AuthError, Result};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const STS_SERVICE: &str = "sts";
const STS_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// AWS access keys used to sign the login request.
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: Zeroizing<String>,
    pub session_token: Option<Zeroizing<String>>,
}

impl AwsCredentials {
    pub fn new(access_key_id: &str, secret_access_key: &str, session_token: Option<&str>) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            secret_access_key: Zeroizing::new(secret_access_key.to_string()),
            session_token: session_token.map(|t| Zeroizing::new(t.to_string())),
        }
    }

    /// Credentials from the standard environment variables, if set.
    pub fn from_env() -> Option<Self> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID").ok().filter(|s| !s.is_empty())?;
        let secret = std::env::var("AWS_SECRET_ACCESS_KEY").ok().filter(|s| !s.is_empty())?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok().filter(|s| !s.is_empty());
        Some(Self::new(&access_key_id, &secret, session_token.as_deref()))
    }

    /// Credentials from the default provider chain: profiles, then
    /// container and instance metadata.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingAwsCredentials` if no provider yields keys.
    #[cfg(feature = "aws")]
    pub fn from_provider_chain() -> Result<Self> {
        use aws_credential_types::provider::ProvideCredentials;

        debug!("resolving AWS credentials from the default provider chain");

        // Create a tokio runtime for the async AWS SDK
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                AuthError::MissingAwsCredentials(format!("failed to create runtime: {}", e))
            })?;

        let credentials = rt.block_on(async {
            let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            let provider = config.credentials_provider().ok_or_else(|| {
                AuthError::MissingAwsCredentials("no credential provider configured".into())
            })?;
            provider
                .provide_credentials()
                .await
                .map_err(|e| AuthError::MissingAwsCredentials(e.to_string()))
        })?;

        Ok(Self::new(
            credentials.access_key_id(),
            credentials.secret_access_key(),
            credentials.session_token(),
        ))
    }
}

/// Where the login signing keys come from.
#[derive(Debug)]
pub enum KeySource {
    /// Keys already in hand.
    Static(AwsCredentials),
    /// The default provider chain, queried at login time.
    #[cfg(feature = "aws")]
    ProviderChain,
}

impl KeySource {
    /// Environment keys when set, otherwise the provider chain.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingAwsCredentials` if the environment has no
    /// keys and the provider chain is not compiled in.
    pub fn detect() -> Result<Self> {
        if let Some(credentials) = AwsCredentials::from_env() {
            debug!("using AWS credentials from environment");
            return Ok(Self::Static(credentials));
        }

        #[cfg(feature = "aws")]
        {
            debug!("no AWS keys in environment, deferring to the default provider chain");
            Ok(Self::ProviderChain)
        }
        #[cfg(not(feature = "aws"))]
        {
            Err(AuthError::MissingAwsCredentials(
                "set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY, or build with the aws feature"
                    .into(),
            )
            .into())
        }
    }

    /// Resolve the keys.
    pub fn credentials(self) -> Result<AwsCredentials> {
        match self {
            Self::Static(credentials) => Ok(credentials),
            #[cfg(feature = "aws")]
            Self::ProviderChain => AwsCredentials::from_provider_chain(),
        }
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac(key: &[u8], msg: &str) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| AuthError::Signing)?;
    mac.update(msg.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// A request signed with SigV4 for a single region and service.
struct SignedRequest {
    /// Canonical (lowercase) header name to value
    headers: BTreeMap<String, String>,
    authorization: String,
}

/// Sign a request to the root path with an empty query string.
fn sign(
    method: &str,
    mut headers: BTreeMap<String, String>,
    body: &str,
    region: &str,
    service: &str,
    credentials: &AwsCredentials,
    now: DateTime<Utc>,
) -> Result<SignedRequest> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();

    headers.insert("x-amz-date".into(), amz_date.clone());
    if let Some(token) = &credentials.session_token {
        headers.insert("x-amz-security-token".into(), token.to_string());
    }

    let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");
    let canonical_headers: String = headers
        .iter()
        .map(|(k, v)| format!("{}:{}\n", k, v.trim()))
        .collect();
    let canonical_request = format!(
        "{}\n/\n\n{}\n{}\n{}",
        method,
        canonical_headers,
        signed_headers,
        sha256_hex(body.as_bytes())
    );
    trace!(canonical_request = %canonical_request, "sigv4 canonical request");

    let scope = format!("{}/{}/{}/aws4_request", date, region, service);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let secret = Zeroizing::new(format!("AWS4{}", credentials.secret_access_key.as_str()));
    let k_date = hmac(secret.as_bytes(), &date)?;
    let k_region = hmac(&k_date, region)?;
    let k_service = hmac(&k_region, service)?;
    let k_signing = hmac(&k_service, "aws4_request")?;
    let signature = hex::encode(hmac(&k_signing, &string_to_sign)?);

    Ok(SignedRequest {
        headers,
        authorization: format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, credentials.access_key_id, scope, signed_headers, signature
        ),
    })
}

/// Display casing for the headers Vault forwards to STS.
fn header_name(canonical: &str) -> String {
    canonical
        .split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Build the Vault AWS IAM login body.
///
/// Without a `role` Vault picks the role named after the caller's IAM
/// principal.
pub fn login_body(
    role: Option<&str>,
    credentials: &AwsCredentials,
    now: DateTime<Utc>,
) -> Result<Value> {
    let host = url::Url::parse(constants::STS_ENDPOINT)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .ok_or(AuthError::Signing)?;

    let headers = BTreeMap::from([
        ("content-type".to_string(), STS_CONTENT_TYPE.to_string()),
        ("host".to_string(), host),
    ]);
    let signed = sign(
        "POST",
        headers,
        constants::STS_REQUEST_BODY,
        constants::STS_REGION,
        STS_SERVICE,
        credentials,
        now,
    )?;

    let mut forwarded: Map<String, Value> = signed
        .headers
        .iter()
        .map(|(k, v)| (header_name(k), json!([v])))
        .collect();
    forwarded.insert("Authorization".into(), json!([signed.authorization]));
    let forwarded = serde_json::to_vec(&forwarded)?;

    let mut body = json!({
        "iam_http_request_method": "POST",
        "iam_request_url": STANDARD.encode(constants::STS_ENDPOINT),
        "iam_request_body": STANDARD.encode(constants::STS_REQUEST_BODY),
        "iam_request_headers": STANDARD.encode(forwarded),
    });
    if let Some(role) = role {
        body["role"] = json!(role);
    }
    Ok(body)
}
