//! Test fixtures and request builders.

use serde_json::{json, Value};

/// A well-formed Vault token.
pub const TOKEN: &str = "s.testtoken123";

/// A UUID-shaped lease id suffix.
pub const LEASE_ID: &str = "0b5b6e7e-2c47-4d4a-9d4c-5d2b8a8f6c1e";

/// Standard secret payload.
pub fn payload() -> Value {
    json!({ "password": "supersecret", "username": "admin" })
}

/// Token-authenticated source for the server at `address`.
pub fn source(address: &str) -> Value {
    json!({ "address": address, "token": TOKEN })
}

/// Source with a single secret.
pub fn source_with_secret(address: &str, secret: Value) -> Value {
    let mut source = source(address);
    source["secret"] = secret;
    source
}

pub fn check_request(source: Value, version: Option<&str>) -> Value {
    match version {
        Some(v) => json!({ "source": source, "version": { "version": v } }),
        None => json!({ "source": source }),
    }
}
