//! Mock Vault HTTP API.
//!
//! Each helper mounts the responses one endpoint gives for one secret.

use serde_json::{json, Value};
use wiremock::matchers::{
    body_partial_json, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A wiremock server answering like Vault.
pub struct Vault {
    pub server: MockServer,
}

impl Vault {
    /// Start an unsealed server.
    pub async fn start() -> Self {
        let vault = Self::bare().await;
        vault.seal_status(false).await;
        vault
    }

    /// Start a sealed server.
    pub async fn sealed() -> Self {
        let vault = Self::bare().await;
        vault.seal_status(true).await;
        vault
    }

    /// Start a server with no endpoints mounted.
    pub async fn bare() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn address(&self) -> String {
        self.server.uri()
    }

    async fn seal_status(&self, sealed: bool) {
        Mock::given(method("GET"))
            .and(path("/v1/sys/seal-status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "shamir",
                "initialized": true,
                "sealed": sealed,
            })))
            .mount(&self.server)
            .await;
    }

    /// Login at `auth/<mount>/login` issuing `client_token`.
    pub async fn login(&self, mount: &str, client_token: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/v1/auth/{}/login", mount)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "auth": {
                    "client_token": client_token,
                    "accessor": "accessor",
                    "policies": ["default"],
                    "lease_duration": 2764800,
                    "renewable": true,
                },
            })))
            .mount(&self.server)
            .await;
    }

    /// KV2 secret whose latest version is `version`.
    pub async fn kv2_latest(&self, mount: &str, secret: &str, version: u64, data: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/{}/data/{}", mount, secret)))
            .and(query_param_is_missing("version"))
            .and(header("X-Vault-Token", super::TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(kv2_body(version, Some(data))))
            .mount(&self.server)
            .await;
    }

    /// A specific KV2 version.
    pub async fn kv2_version(&self, mount: &str, secret: &str, version: u64, data: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/{}/data/{}", mount, secret)))
            .and(query_param("version", version.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(kv2_body(version, Some(data))))
            .mount(&self.server)
            .await;
    }

    /// A deleted KV2 version: 404 with metadata.
    pub async fn kv2_deleted(&self, mount: &str, secret: &str, version: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/{}/data/{}", mount, secret)))
            .and(query_param("version", version.to_string()))
            .respond_with(ResponseTemplate::new(404).set_body_json(kv2_body(version, None)))
            .mount(&self.server)
            .await;
    }

    /// KV2 writes (put and patch) answering with `version`.
    pub async fn kv2_write(&self, mount: &str, secret: &str, http_method: &str, version: u64) {
        Mock::given(method(http_method))
            .and(path(format!("/v1/{}/data/{}", mount, secret)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "created_time": "2024-01-01T00:00:00Z",
                    "deletion_time": "",
                    "destroyed": false,
                    "version": version,
                },
            })))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// A KV1 secret.
    pub async fn kv1(&self, mount: &str, secret: &str, data: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/{}/{}", mount, secret)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "lease_id": "",
                "lease_duration": 2764800,
                "renewable": false,
                "data": data,
            })))
            .mount(&self.server)
            .await;
    }

    /// KV1 writes answering 204.
    pub async fn kv1_write(&self, mount: &str, secret: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/v1/{}/{}", mount, secret)))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Dynamic credentials at `<mount>/creds/<role>`.
    pub async fn creds(&self, mount: &str, role: &str, lease_duration: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/{}/creds/{}", mount, role)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "lease_id": format!("{}/creds/{}/{}", mount, role, super::LEASE_ID),
                "lease_duration": lease_duration,
                "renewable": true,
                "data": { "username": "v-token-readonly", "password": "generated" },
            })))
            .mount(&self.server)
            .await;
    }

    /// Lease renewal for `lease_id`.
    pub async fn renew(&self, lease_id: &str, lease_duration: u64) {
        Mock::given(method("PUT"))
            .and(path("/v1/sys/leases/renew"))
            .and(body_partial_json(json!({ "lease_id": lease_id })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "lease_id": lease_id,
                "lease_duration": lease_duration,
                "renewable": true,
            })))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Any path answering `status` with a Vault error body.
    pub async fn fail(&self, http_method: &str, at: &str, status: u16, message: &str) {
        Mock::given(method(http_method))
            .and(path(at))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({ "errors": [message] })),
            )
            .mount(&self.server)
            .await;
    }

    /// Number of requests the server received.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or(0)
    }
}

fn kv2_body(version: u64, data: Option<Value>) -> Value {
    let deletion_time = if data.is_none() { "2024-01-02T00:00:00Z" } else { "" };
    json!({
        "lease_id": "",
        "lease_duration": 0,
        "renewable": false,
        "data": {
            "data": data,
            "metadata": {
                "created_time": "2024-01-01T00:00:00Z",
                "deletion_time": deletion_time,
                "destroyed": false,
                "version": version,
            },
        },
    })
}
