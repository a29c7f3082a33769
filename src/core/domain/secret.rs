//! Secret descriptor and metadata types.
//!
//! A [`SecretDescriptor`] is the validated identity of one secret. It is
//! built fresh for every operation and never mutated afterwards.

use std::time::Duration;

use serde_json::{Map, Value};
use tracing::debug;

use super::catalog::SecretEngine;
use super::version::Version;
use crate::error::{Result, SecretError};

/// Key-value payload of a secret.
pub type SecretData = Map<String, Value>;

/// Validated identity of a secret: engine, mount and path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretDescriptor {
    engine: SecretEngine,
    mount: String,
    path: String,
}

impl SecretDescriptor {
    /// Build a descriptor from pipeline strings.
    ///
    /// An empty `mount` selects the engine's default mount.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::MissingRequiredParam` if the engine or path is
    /// empty, or `SecretError::InvalidSecretEngine` if the engine is unknown.
    pub fn new(engine: &str, mount: &str, path: &str) -> Result<Self> {
        if engine.is_empty() {
            return Err(SecretError::MissingRequiredParam("engine").into());
        }
        if path.is_empty() {
            return Err(SecretError::MissingRequiredParam("path").into());
        }
        let engine: SecretEngine = engine.parse()?;

        let mount = if mount.is_empty() {
            debug!(engine = %engine, mount = engine.default_mount(), "using default mount");
            engine.default_mount().to_string()
        } else {
            mount.to_string()
        };

        Ok(Self {
            engine,
            mount,
            path: path.to_string(),
        })
    }

    pub fn engine(&self) -> SecretEngine {
        self.engine
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether this secret is a generated, lease-bound credential.
    pub fn is_dynamic(&self) -> bool {
        self.engine.is_dynamic()
    }

    /// `<mount>/creds/<path>`, where dynamic engines issue credentials.
    pub fn creds_path(&self) -> String {
        format!("{}/creds/{}", self.mount, self.path)
    }

    /// `<mount>-<path>`, the key used in responses and the secrets file.
    pub fn identifier(&self) -> String {
        format!("{}-{}", self.mount, self.path)
    }
}

impl std::fmt::Display for SecretDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} secret {}/{}", self.engine, self.mount, self.path)
    }
}

/// Lease and version information returned alongside a secret.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretMetadata {
    pub lease_id: String,
    pub lease_duration: Duration,
    pub renewable: bool,
    /// `None` when the operation does not produce a version
    pub version: Option<Version>,
}

impl SecretMetadata {
    /// Metadata with every field empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Version as reported on the wire; empty when there is none.
    pub fn version_string(&self) -> String {
        self.version
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

/// A secret payload together with its metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecretValue {
    pub data: SecretData,
    pub metadata: SecretMetadata,
}

impl SecretValue {
    /// True when the backend returned no data, e.g. a deleted KV2 version.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
