//! Secret operations (read, write, renew).
//!
//! Dispatches on the descriptor's engine family. Every branch fails closed:
//! a backend error never comes back as an empty success.

use std::time::Duration;

use chrono::{Local, TimeDelta};
use tracing::{debug, info, warn};

use crate::core::auth::Session;
use crate::core::backend::{Backend, RawSecret};
use crate::core::domain::{
    DynamicEngine, KvVersion, SecretData, SecretDescriptor, SecretEngine, SecretMetadata,
    SecretValue, Version,
};
use crate::error::{Error, Result, SecretError};

/// How a KV2 write treats existing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Replace the secret
    #[default]
    Put,
    /// Merge into the latest version
    Patch,
}

impl WriteMode {
    pub fn from_patch(patch: bool) -> Self {
        if patch {
            Self::Patch
        } else {
            Self::Put
        }
    }
}

fn metadata(raw: &RawSecret, version: Version) -> SecretMetadata {
    SecretMetadata {
        lease_id: raw.lease_id.clone(),
        lease_duration: Duration::from_secs(raw.lease_duration),
        renewable: raw.renewable,
        version: Some(version),
    }
}

/// Version of a credential whose lease runs `lease_seconds` from now.
fn expiry_version(lease_seconds: u64) -> Version {
    let now = Local::now();
    let expiry = i64::try_from(lease_seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|lease| now.checked_add_signed(lease))
        .unwrap_or(now);
    Version::expiry(expiry)
}

/// Read a secret value and its metadata.
///
/// # Arguments
///
/// * `session` - Authenticated session
/// * `secret` - Secret to read
/// * `version` - KV2 version to fetch; latest when `None` or empty.
///   Ignored for KV1 and dynamic engines.
///
/// # Returns
///
/// The payload and metadata. A deleted or missing KV2 version yields an
/// empty payload whose metadata carries the requested version; check
/// [`SecretValue::is_empty`] to tell it apart from a populated secret.
///
/// # Errors
///
/// Returns `SecretError::InvalidVersionFormat` if a KV2 version is not a
/// nonnegative integer (before any backend call), or a backend error.
pub fn read<B: Backend>(
    session: &Session<B>,
    secret: &SecretDescriptor,
    version: Option<&str>,
) -> Result<SecretValue> {
    let version = version.filter(|v| !v.is_empty());
    match secret.engine() {
        SecretEngine::Dynamic(engine) => generate_credentials(session.backend(), secret, engine),
        SecretEngine::Static(KvVersion::V1) => read_kv1(session.backend(), secret, version),
        SecretEngine::Static(KvVersion::V2) => read_kv2(session.backend(), secret, version),
    }
}

fn generate_credentials<B: Backend>(
    backend: &B,
    secret: &SecretDescriptor,
    engine: DynamicEngine,
) -> Result<SecretValue> {
    let path = secret.creds_path();
    debug!(path = %path, engine = engine.as_str(), "generating credentials");

    let raw = match engine {
        DynamicEngine::Ssh => backend.write(&path, &SecretData::new()),
        _ => backend.read(&path),
    }
    .map_err(|e| {
        warn!(path = %path, "failed to generate credentials");
        Error::backend("credential generation", &path, e)
    })?
    .ok_or_else(|| SecretError::EmptyResponse(path.clone()))?;

    let version = expiry_version(raw.lease_duration);
    Ok(SecretValue {
        data: raw.data.clone().unwrap_or_default(),
        metadata: metadata(&raw, version),
    })
}

fn read_kv1<B: Backend>(
    backend: &B,
    secret: &SecretDescriptor,
    version: Option<&str>,
) -> Result<SecretValue> {
    if let Some(version) = version {
        info!(
            version,
            "versions cannot be used with the KV1 secrets engine; the input version will be ignored"
        );
    }

    let path = format!("{}/{}", secret.mount(), secret.path());
    let raw = backend
        .read(&path)
        .map_err(|e| Error::backend("KV1 read", &path, e))?
        .ok_or_else(|| SecretError::EmptyResponse(path.clone()))?;

    Ok(SecretValue {
        data: raw.data.clone().unwrap_or_default(),
        metadata: metadata(&raw, Version::Unversioned),
    })
}

fn read_kv2<B: Backend>(
    backend: &B,
    secret: &SecretDescriptor,
    version: Option<&str>,
) -> Result<SecretValue> {
    let requested = version
        .map(|v| {
            v.parse::<u64>()
                .map_err(|_| SecretError::InvalidVersionFormat(v.to_string()))
        })
        .transpose()?;

    let target = format!("{}/{}", secret.mount(), secret.path());
    let kv = backend
        .kv2_read(secret.mount(), secret.path(), requested)
        .map_err(|e| Error::backend("KV2 read", &target, e))?;

    match (kv, requested) {
        (Some(kv), _) => match kv.data {
            Some(data) => Ok(SecretValue {
                data,
                metadata: metadata(&kv.raw, Version::Ordinal(kv.version)),
            }),
            None => {
                warn!(
                    path = %target,
                    version = kv.version,
                    "the KV2 secret version was deleted or destroyed"
                );
                Ok(SecretValue {
                    data: SecretData::new(),
                    metadata: metadata(&kv.raw, Version::Ordinal(requested.unwrap_or(kv.version))),
                })
            }
        },
        (None, Some(n)) => {
            warn!(path = %target, version = n, "the requested KV2 version does not exist");
            Ok(SecretValue {
                data: SecretData::new(),
                metadata: SecretMetadata {
                    version: Some(Version::Ordinal(n)),
                    ..SecretMetadata::empty()
                },
            })
        }
        (None, None) => Err(SecretError::EmptyResponse(target).into()),
    }
}

/// Write a key-value secret.
///
/// # Arguments
///
/// * `session` - Authenticated session
/// * `secret` - Secret to write; must use a static engine
/// * `data` - Key-value pairs to store
/// * `mode` - Replace or merge (KV2 only; KV1 always replaces)
///
/// # Returns
///
/// Metadata with the new version: `"0"` for KV1, the new ordinal for KV2.
///
/// # Errors
///
/// Returns `SecretError::InvalidSecretEngine` for dynamic engines, or a
/// backend error.
pub fn write<B: Backend>(
    session: &Session<B>,
    secret: &SecretDescriptor,
    data: &SecretData,
    mode: WriteMode,
) -> Result<SecretMetadata> {
    let backend = session.backend();
    let target = format!("{}/{}", secret.mount(), secret.path());

    match secret.engine() {
        SecretEngine::Dynamic(engine) => {
            warn!(
                engine = engine.as_str(),
                "secrets cannot be written to a dynamic secrets engine"
            );
            Err(SecretError::InvalidSecretEngine(engine.as_str().to_string()).into())
        }
        SecretEngine::Static(KvVersion::V1) => {
            if mode == WriteMode::Patch {
                info!(
                    "the KV1 secrets engine does not support patch; the secret will be overwritten"
                );
            }
            backend
                .write(&target, data)
                .map_err(|e| Error::backend("KV1 write", &target, e))?;
            Ok(SecretMetadata {
                version: Some(Version::Unversioned),
                ..SecretMetadata::empty()
            })
        }
        SecretEngine::Static(KvVersion::V2) => {
            let kv = match mode {
                WriteMode::Put => backend.kv2_put(secret.mount(), secret.path(), data),
                WriteMode::Patch => backend.kv2_patch(secret.mount(), secret.path(), data),
            }
            .map_err(|e| Error::backend("KV2 write", &target, e))?;
            debug!(path = %target, version = kv.version, "KV2 secret written");
            Ok(metadata(&kv.raw, Version::Ordinal(kv.version)))
        }
    }
}

/// Renew the lease of a dynamic secret.
///
/// Static secrets have no lease; renewing one returns empty metadata and
/// no error.
///
/// # Arguments
///
/// * `session` - Authenticated session
/// * `secret` - Secret whose lease to renew
/// * `lease_id_suffix` - Trailing lease id component under `<mount>/creds/<path>/`
///
/// # Errors
///
/// Returns a backend error annotated with the full lease id.
pub fn renew<B: Backend>(
    session: &Session<B>,
    secret: &SecretDescriptor,
    lease_id_suffix: &str,
) -> Result<SecretMetadata> {
    if !secret.is_dynamic() {
        info!(secret = %secret, "the secret is not renewable");
        return Ok(SecretMetadata::empty());
    }

    let lease_id = format!("{}/{}", secret.creds_path(), lease_id_suffix);
    let raw = session.backend().renew_lease(&lease_id, 0).map_err(|e| {
        warn!(lease_id = %lease_id, "the secret lease could not be renewed");
        Error::backend("lease renewal", &lease_id, e)
    })?;

    Ok(metadata(&raw, expiry_version(raw.lease_duration)))
}
