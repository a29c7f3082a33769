//! Secret backend client.
//!
//! The [`Backend`] trait is the set of primitives the resource needs from
//! Vault. [`HttpBackend`] talks to a real server; tests use an in-memory
//! double.
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `Backend` trait
//! 2. Add the implementation in a new file
//! 3. Re-export from this module

use serde::Deserialize;
use serde_json::Value;

use crate::core::domain::SecretData;
use crate::error::BackendError;

mod http;
#[cfg(test)]
pub(crate) mod memory;

pub use http::HttpBackend;

/// Result type for backend primitives.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Seal state reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SealStatus {
    pub sealed: bool,
}

/// Auth block returned by a successful login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthInfo {
    pub client_token: String,
    #[serde(default)]
    pub accessor: String,
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default)]
    pub renewable: bool,
}

/// A logical secret response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSecret {
    #[serde(default)]
    pub lease_id: String,
    /// Seconds
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default)]
    pub renewable: bool,
    #[serde(default)]
    pub data: Option<SecretData>,
}

/// A KV version 2 secret.
///
/// `data` is `None` when the version was deleted or destroyed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KvSecret {
    pub data: Option<SecretData>,
    pub version: u64,
    pub raw: RawSecret,
}

/// Primitives offered by the secret backend.
///
/// Paths are relative to the API root (no `/v1/` prefix).
pub trait Backend {
    /// Attach a client token to every following request.
    fn set_token(&mut self, token: &str);

    /// Report whether the server is sealed.
    fn seal_status(&self) -> BackendResult<SealStatus>;

    /// Log in through the auth method mounted at `mount`.
    ///
    /// Returns `None` when the server answered without an auth block.
    fn login(&self, mount: &str, body: &Value) -> BackendResult<Option<AuthInfo>>;

    /// Read a logical path. `None` means nothing exists there.
    fn read(&self, path: &str) -> BackendResult<Option<RawSecret>>;

    /// Write to a logical path. `None` means the server returned no body.
    fn write(&self, path: &str, data: &SecretData) -> BackendResult<Option<RawSecret>>;

    /// Read the latest or a specific version of a KV2 secret.
    fn kv2_read(&self, mount: &str, path: &str, version: Option<u64>)
        -> BackendResult<Option<KvSecret>>;

    /// Replace a KV2 secret, creating a new version.
    fn kv2_put(&self, mount: &str, path: &str, data: &SecretData) -> BackendResult<KvSecret>;

    /// Merge into a KV2 secret, creating a new version.
    fn kv2_patch(&self, mount: &str, path: &str, data: &SecretData) -> BackendResult<KvSecret>;

    /// Extend a lease. An increment of zero accepts the server default.
    fn renew_lease(&self, lease_id: &str, increment: u64) -> BackendResult<RawSecret>;
}
