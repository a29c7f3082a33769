//! Vault HTTP API backend.
//!
//! Blocking `reqwest` client; every call completes before the next starts.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use super::{AuthInfo, Backend, BackendResult, KvSecret, RawSecret, SealStatus};
use crate::core::config::Endpoint;
use crate::core::domain::SecretData;
use crate::error::{BackendError, Error, Result};

/// Error body returned by Vault on failure.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    auth: Option<AuthInfo>,
}

#[derive(Debug, Deserialize)]
struct KvVersionMetadata {
    version: u64,
}

#[derive(Debug, Deserialize)]
struct KvPayload {
    #[serde(default)]
    data: Option<SecretData>,
    #[serde(default)]
    metadata: Option<KvVersionMetadata>,
}

/// `GET <mount>/data/<path>` response.
#[derive(Debug, Deserialize)]
struct KvReadResponse {
    #[serde(default)]
    lease_id: String,
    #[serde(default)]
    lease_duration: u64,
    #[serde(default)]
    renewable: bool,
    #[serde(default)]
    data: Option<KvPayload>,
}

impl KvReadResponse {
    /// `None` when the body carries no version metadata at all.
    fn into_secret(self) -> Option<KvSecret> {
        let payload = self.data?;
        let version = payload.metadata?.version;
        Some(KvSecret {
            data: payload.data,
            version,
            raw: RawSecret {
                lease_id: self.lease_id,
                lease_duration: self.lease_duration,
                renewable: self.renewable,
                data: None,
            },
        })
    }
}

/// `POST|PATCH <mount>/data/<path>` response.
#[derive(Debug, Deserialize)]
struct KvWriteResponse {
    #[serde(default)]
    lease_id: String,
    #[serde(default)]
    lease_duration: u64,
    #[serde(default)]
    renewable: bool,
    data: KvVersionMetadata,
}

impl From<KvWriteResponse> for KvSecret {
    fn from(resp: KvWriteResponse) -> Self {
        KvSecret {
            data: None,
            version: resp.data.version,
            raw: RawSecret {
                lease_id: resp.lease_id,
                lease_duration: resp.lease_duration,
                renewable: resp.renewable,
                data: None,
            },
        }
    }
}

/// Vault REST API client.
pub struct HttpBackend {
    http: Client,
    base_url: String,
    token: Option<Zeroizing<String>>,
}

impl HttpBackend {
    fn user_agent() -> String {
        format!("vault-resource/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Create an unauthenticated client for `endpoint`.
    ///
    /// No request is sent until a primitive is called.
    pub fn connect(endpoint: &Endpoint) -> Result<Self> {
        debug!(
            address = %endpoint.address,
            insecure = endpoint.insecure,
            "initializing Vault client"
        );

        let http = Client::builder()
            .user_agent(Self::user_agent())
            .danger_accept_invalid_certs(endpoint.insecure)
            .build()
            .map_err(|e| {
                Error::backend("client initialization", endpoint.address.as_str(), e.into())
            })?;

        Ok(Self {
            http,
            base_url: endpoint.address.as_str().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        trace!(%method, path, "vault request");
        let req = self
            .http
            .request(method, self.url(path))
            .header("X-Vault-Request", "true");
        match &self.token {
            Some(token) => req.header("X-Vault-Token", token.as_str()),
            None => req,
        }
    }

    fn kv2_write(
        &self,
        method: Method,
        mount: &str,
        path: &str,
        data: &SecretData,
    ) -> BackendResult<KvSecret> {
        let mut req = self.request(method.clone(), &format!("{}/data/{}", mount, path));
        if method == Method::PATCH {
            req = req.header(CONTENT_TYPE, "application/merge-patch+json");
        }
        let resp = check(req.json(&json!({ "data": data })).send()?)?;
        decode::<KvWriteResponse>(resp).map(KvSecret::from)
    }
}

/// Pass successful responses through, turn the rest into status errors.
fn check(resp: Response) -> BackendResult<Response> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(status_error(resp))
    }
}

fn status_error(resp: Response) -> BackendError {
    let status = resp.status().as_u16();
    let body = resp.json::<ErrorBody>().unwrap_or_default();
    BackendError::Status {
        status,
        errors: body.errors,
    }
}

fn decode<T: DeserializeOwned>(resp: Response) -> BackendResult<T> {
    resp.json::<T>()
        .map_err(|e| BackendError::Decode(e.to_string()))
}

impl Backend for HttpBackend {
    fn set_token(&mut self, token: &str) {
        self.token = Some(Zeroizing::new(token.to_string()));
    }

    fn seal_status(&self) -> BackendResult<SealStatus> {
        let resp = check(self.request(Method::GET, "sys/seal-status").send()?)?;
        decode(resp)
    }

    fn login(&self, mount: &str, body: &Value) -> BackendResult<Option<AuthInfo>> {
        let resp = self
            .request(Method::POST, &format!("auth/{}/login", mount))
            .json(body)
            .send()?;
        let login: LoginResponse = decode(check(resp)?)?;
        Ok(login.auth)
    }

    fn read(&self, path: &str) -> BackendResult<Option<RawSecret>> {
        let resp = self.request(Method::GET, path).send()?;
        match resp.status() {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => Ok(None),
            _ => decode(check(resp)?).map(Some),
        }
    }

    fn write(&self, path: &str, data: &SecretData) -> BackendResult<Option<RawSecret>> {
        let resp = check(self.request(Method::POST, path).json(data).send()?)?;
        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        decode(resp).map(Some)
    }

    fn kv2_read(
        &self,
        mount: &str,
        path: &str,
        version: Option<u64>,
    ) -> BackendResult<Option<KvSecret>> {
        let mut req = self.request(Method::GET, &format!("{}/data/{}", mount, path));
        if let Some(version) = version {
            req = req.query(&[("version", version)]);
        }
        let resp = req.send()?;

        if resp.status() == StatusCode::NOT_FOUND {
            // deleted versions answer 404 but still carry their metadata
            let body = resp.json::<KvReadResponse>().ok();
            return Ok(body.and_then(KvReadResponse::into_secret));
        }

        let body: KvReadResponse = decode(check(resp)?)?;
        body.into_secret()
            .map(Some)
            .ok_or_else(|| BackendError::Decode("KV2 response without version metadata".into()))
    }

    fn kv2_put(&self, mount: &str, path: &str, data: &SecretData) -> BackendResult<KvSecret> {
        self.kv2_write(Method::POST, mount, path, data)
    }

    fn kv2_patch(&self, mount: &str, path: &str, data: &SecretData) -> BackendResult<KvSecret> {
        self.kv2_write(Method::PATCH, mount, path, data)
    }

    fn renew_lease(&self, lease_id: &str, increment: u64) -> BackendResult<RawSecret> {
        let resp = self
            .request(Method::PUT, "sys/leases/renew")
            .json(&json!({ "lease_id": lease_id, "increment": increment }))
            .send()?;
        decode(check(resp)?)
    }
}
