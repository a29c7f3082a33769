//! Domain types.

pub mod catalog;
mod secret;
mod version;

pub use catalog::{AuthMethod, CatalogKind, DynamicEngine, KvVersion, SecretEngine, Validated};
pub use secret::{SecretData, SecretDescriptor, SecretMetadata, SecretValue};
pub use version::Version;
