//! vault-resource - HashiCorp Vault secrets for CI pipelines.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Resource steps
//! │   ├── check         # Report new secret versions
//! │   ├── get           # `in`: read secrets into vault.json
//! │   ├── put           # `out`: write secrets
//! │   └── output        # JSON on stdout, errors on stderr
//! └── core/             # Core library components
//!     ├── auth/         # Session resolution (token, AWS IAM, Kubernetes)
//!     ├── backend/      # Backend trait and Vault HTTP client
//!     ├── config        # Authentication configuration
//!     ├── domain/       # Engine catalog, secret descriptor, versions
//!     ├── protocol      # Request and response models
//!     ├── reconcile     # Check-step version delta
//!     └── secrets       # Read, write and renew
//! ```
//!
//! # Features
//!
//! - KV1, KV2 and dynamic credential engines behind one descriptor type
//! - Token, AWS IAM and Kubernetes authentication
//! - Lease renewal during check for dynamic secrets
//! - Partial failures aggregated across multi-secret steps

pub mod cli;
pub mod core;
pub mod error;

pub use error::{Error, Result};
