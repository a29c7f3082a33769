//! In-memory backend for unit tests.
//!
//! Stores KV1 and KV2 secrets in maps, issues fake dynamic credentials, and
//! records every primitive call so tests can assert on network usage.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use serde_json::{json, Value};

use super::{AuthInfo, Backend, BackendResult, KvSecret, RawSecret, SealStatus};
use crate::core::domain::SecretData;
use crate::error::BackendError;

#[derive(Default)]
pub(crate) struct MemoryBackend {
    pub sealed: bool,
    /// Auth block returned by `login`; `None` simulates an empty login reply
    pub auth: Option<AuthInfo>,
    /// Logical paths (KV1 and anything else read through `read`)
    pub logical: BTreeMap<String, SecretData>,
    /// `<mount>/<path>` to versions, index 0 is version 1
    pub kv2: RefCell<BTreeMap<String, Vec<Option<SecretData>>>>,
    /// Lease duration handed out by credential reads and renewals
    pub lease_seconds: u64,
    /// Lease ids the backend will renew
    pub leases: HashSet<String>,
    pub token: Option<String>,
    pub calls: RefCell<Vec<String>>,
    pub logins: RefCell<Vec<(String, Value)>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            auth: Some(AuthInfo {
                client_token: "s.memory".into(),
                ..Default::default()
            }),
            lease_seconds: 3600,
            ..Default::default()
        }
    }

    pub fn with_kv2(self, mount: &str, path: &str, versions: Vec<Option<SecretData>>) -> Self {
        self.kv2
            .borrow_mut()
            .insert(format!("{}/{}", mount, path), versions);
        self
    }

    pub fn with_logical(mut self, path: &str, data: SecretData) -> Self {
        self.logical.insert(path.to_string(), data);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn called(&self, name: &str) -> bool {
        self.calls.borrow().iter().any(|c| c == name)
    }

    fn record(&self, name: &str) {
        self.calls.borrow_mut().push(name.to_string());
    }

    fn not_found() -> BackendError {
        BackendError::Status {
            status: 404,
            errors: vec![],
        }
    }

    fn kv2_write(&self, mount: &str, path: &str, data: SecretData) -> KvSecret {
        let mut store = self.kv2.borrow_mut();
        let versions = store.entry(format!("{}/{}", mount, path)).or_default();
        versions.push(Some(data));
        KvSecret {
            data: None,
            version: versions.len() as u64,
            raw: RawSecret::default(),
        }
    }
}

pub(crate) fn data(pairs: &[(&str, &str)]) -> SecretData {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), json!(v)))
        .collect()
}

impl Backend for MemoryBackend {
    fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    fn seal_status(&self) -> BackendResult<SealStatus> {
        self.record("seal_status");
        Ok(SealStatus {
            sealed: self.sealed,
        })
    }

    fn login(&self, mount: &str, body: &Value) -> BackendResult<Option<AuthInfo>> {
        self.record("login");
        self.logins
            .borrow_mut()
            .push((mount.to_string(), body.clone()));
        Ok(self.auth.clone())
    }

    fn read(&self, path: &str) -> BackendResult<Option<RawSecret>> {
        self.record("read");
        if path.contains("/creds/") {
            return Ok(Some(RawSecret {
                lease_id: format!("{}/lease-1", path),
                lease_duration: self.lease_seconds,
                renewable: true,
                data: Some(data(&[("username", "generated"), ("password", "pw")])),
            }));
        }
        Ok(self.logical.get(path).map(|d| RawSecret {
            data: Some(d.clone()),
            ..Default::default()
        }))
    }

    fn write(&self, path: &str, _data: &SecretData) -> BackendResult<Option<RawSecret>> {
        self.record("write");
        if path.contains("/creds/") {
            return Ok(Some(RawSecret {
                lease_id: format!("{}/lease-ssh", path),
                lease_duration: self.lease_seconds,
                renewable: false,
                data: Some(data(&[("key", "otp")])),
            }));
        }
        Ok(None)
    }

    fn kv2_read(
        &self,
        mount: &str,
        path: &str,
        version: Option<u64>,
    ) -> BackendResult<Option<KvSecret>> {
        self.record("kv2_read");
        let store = self.kv2.borrow();
        let Some(versions) = store.get(&format!("{}/{}", mount, path)) else {
            return Ok(None);
        };
        let n = version.unwrap_or(versions.len() as u64);
        if n == 0 || n > versions.len() as u64 {
            return Ok(None);
        }
        Ok(Some(KvSecret {
            data: versions[(n - 1) as usize].clone(),
            version: n,
            raw: RawSecret::default(),
        }))
    }

    fn kv2_put(&self, mount: &str, path: &str, data: &SecretData) -> BackendResult<KvSecret> {
        self.record("kv2_put");
        Ok(self.kv2_write(mount, path, data.clone()))
    }

    fn kv2_patch(&self, mount: &str, path: &str, data: &SecretData) -> BackendResult<KvSecret> {
        self.record("kv2_patch");
        let current = {
            let store = self.kv2.borrow();
            store
                .get(&format!("{}/{}", mount, path))
                .and_then(|v| v.last().cloned().flatten())
        };
        let mut merged = current.ok_or_else(Self::not_found)?;
        merged.extend(data.clone());
        Ok(self.kv2_write(mount, path, merged))
    }

    fn renew_lease(&self, lease_id: &str, _increment: u64) -> BackendResult<RawSecret> {
        self.record("renew_lease");
        if !self.leases.contains(lease_id) {
            return Err(BackendError::Status {
                status: 400,
                errors: vec!["lease not found or lease is not renewable".into()],
            });
        }
        Ok(RawSecret {
            lease_id: lease_id.to_string(),
            lease_duration: self.lease_seconds,
            renewable: true,
            data: None,
        })
    }
}
