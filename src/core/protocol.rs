//! Resource protocol models.
//!
//! Requests arrive as JSON on stdin; responses leave as JSON on stdout.
//! Decoding validates the envelope so a malformed request fails before
//! any authentication.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::config::AuthConfig;
use crate::core::domain::{SecretData, SecretDescriptor, SecretMetadata};
use crate::error::{RequestError, Result};

/// Pipeline `source` configuration shared by every step.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Source {
    pub address: Option<String>,
    pub insecure: bool,
    pub auth_engine: Option<String>,
    pub token: Option<String>,
    #[serde(alias = "aws_mount_path")]
    pub auth_mount: Option<String>,
    #[serde(alias = "aws_vault_role")]
    pub vault_role: Option<String>,
    pub kubernetes_token_path: Option<PathBuf>,
    pub secret: Option<SecretSource>,
}

impl Source {
    /// The configured secret, unless absent or entirely empty.
    pub fn secret(&self) -> Option<&SecretSource> {
        self.secret.as_ref().filter(|s| !s.is_empty())
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            address: self.address.clone(),
            insecure: self.insecure,
            method: self.auth_engine.clone(),
            token: self.token.clone(),
            mount: self.auth_mount.clone(),
            role: self.vault_role.clone(),
            jwt_path: self.kubernetes_token_path.clone(),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("address", &self.address)
            .field("insecure", &self.insecure)
            .field("auth_engine", &self.auth_engine)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("auth_mount", &self.auth_mount)
            .field("vault_role", &self.vault_role)
            .field("secret", &self.secret)
            .finish_non_exhaustive()
    }
}

/// A single secret named in `source`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SecretSource {
    pub engine: String,
    pub mount: String,
    pub path: String,
    pub lease_id: String,
}

impl SecretSource {
    pub fn is_empty(&self) -> bool {
        self.engine.is_empty()
            && self.mount.is_empty()
            && self.path.is_empty()
            && self.lease_id.is_empty()
    }

    pub fn descriptor(&self) -> Result<SecretDescriptor> {
        SecretDescriptor::new(&self.engine, &self.mount, &self.path)
    }

    pub fn lease_id(&self) -> Option<&str> {
        Some(self.lease_id.as_str()).filter(|id| !id.is_empty())
    }
}

/// `{"version": "..."}` as exchanged with the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceVersion {
    #[serde(default)]
    pub version: String,
}

impl ResourceVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

fn requested(version: &Option<ResourceVersion>) -> Option<&str> {
    version
        .as_ref()
        .map(|v| v.version.as_str())
        .filter(|v| !v.is_empty())
}

fn decode<T: DeserializeOwned>(reader: impl Read) -> Result<T> {
    serde_json::from_reader(reader).map_err(|e| RequestError::Decode(e).into())
}

/// Request of the `check` step.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub version: Option<ResourceVersion>,
}

impl CheckRequest {
    /// # Errors
    ///
    /// Returns `RequestError::Decode` if the input is not a check request.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        decode(reader)
    }

    /// Last version the pipeline saw, if any.
    pub fn version(&self) -> Option<&str> {
        requested(&self.version)
    }
}

/// Secrets to read under one mount in a `get` step.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReadParams {
    pub engine: String,
    pub paths: Vec<String>,
}

/// Request of the `in` step.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InRequest {
    #[serde(default)]
    pub source: Source,
    /// Keyed by mount
    #[serde(default)]
    pub params: Option<BTreeMap<String, ReadParams>>,
    #[serde(default)]
    pub version: Option<ResourceVersion>,
}

impl InRequest {
    /// Decode and validate an `in` request.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::DualSecrets` if both `source.secret` and
    /// `params` name secrets, `RequestError::NoSecrets` if neither does, or
    /// `RequestError::Decode` for malformed input.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let request: Self = decode(reader)?;

        let has_source = request.source.secret().is_some();
        let has_params = request.params.is_some();

        if request.version().is_some() && has_params {
            info!(
                "version is ignored in the get step with params as it must be tied to a specific \
                 secret path"
            );
        }

        match (has_source, has_params) {
            (true, true) => Err(RequestError::DualSecrets.into()),
            (false, false) => Err(RequestError::NoSecrets.into()),
            _ => Ok(request),
        }
    }

    pub fn version(&self) -> Option<&str> {
        requested(&self.version)
    }
}

/// Secrets to write under one mount in a `put` step.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WriteParams {
    pub engine: String,
    pub patch: bool,
    /// Keyed by path
    pub secrets: BTreeMap<String, SecretData>,
}

/// Request of the `out` step.
#[derive(Debug, Clone, Default)]
pub struct OutRequest {
    pub source: Source,
    /// Keyed by mount
    pub params: BTreeMap<String, WriteParams>,
}

#[derive(Deserialize)]
struct RawOutRequest {
    #[serde(default)]
    source: Source,
    #[serde(default)]
    params: Option<BTreeMap<String, WriteParams>>,
}

impl OutRequest {
    /// Decode and validate an `out` request.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::EmptyParams` if no `params` were given, or
    /// `RequestError::Decode` for malformed input.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let raw: RawOutRequest = decode(reader)?;

        if raw.source.secret().is_some() {
            info!("specifying a secret in source for a put step has no effect; it will be ignored");
        }
        let params = raw.params.ok_or(RequestError::EmptyParams)?;

        Ok(Self {
            source: raw.source,
            params,
        })
    }
}

/// One `{name, value}` entry of response metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub name: String,
    pub value: String,
}

impl MetadataEntry {
    fn new(name: String, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Lease metadata entries for the secret `identifier`.
pub fn metadata_entries(identifier: &str, metadata: &SecretMetadata) -> Vec<MetadataEntry> {
    vec![
        MetadataEntry::new(format!("{}-LeaseID", identifier), metadata.lease_id.clone()),
        MetadataEntry::new(
            format!("{}-LeaseDuration", identifier),
            format!("{}s", metadata.lease_duration.as_secs()),
        ),
        MetadataEntry::new(format!("{}-Renewable", identifier), metadata.renewable.to_string()),
    ]
}

/// Response of the `in` and `out` steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Secret identifier to version
    pub version: BTreeMap<String, String>,
    pub metadata: Vec<MetadataEntry>,
}

impl Response {
    /// Record the outcome of one secret operation.
    pub fn record(&mut self, identifier: &str, metadata: &SecretMetadata) {
        self.version
            .insert(identifier.to_string(), metadata.version_string());
        self.metadata
            .extend(metadata_entries(identifier, metadata));
    }
}

/// Payloads written to the destination secrets file, keyed by identifier.
pub type SecretValues = BTreeMap<String, SecretData>;
