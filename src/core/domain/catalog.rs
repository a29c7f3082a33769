//! Engine catalog.
//!
//! The closed sets of authentication methods and secrets engines the
//! resource understands. Every string coming from a pipeline passes through
//! one of these parsers before it reaches dispatch logic.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::core::constants;
use crate::error::{AuthError, Error, Result, SecretError};

/// How the resource authenticates to Vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMethod {
    /// A literal Vault token
    Token,
    /// AWS IAM signed identity
    AwsIam,
    /// Kubernetes service account JWT
    Kubernetes,
}

impl AuthMethod {
    pub const ALL: [AuthMethod; 3] = [Self::Token, Self::AwsIam, Self::Kubernetes];

    /// Name as written in pipeline configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::AwsIam => "aws",
            Self::Kubernetes => "kubernetes",
        }
    }
}

impl FromStr for AuthMethod {
    type Err = AuthError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                debug!(input = %s, "string could not be converted to an auth method");
                AuthError::InvalidAuthMethod(s.to_string())
            })
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-value store generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KvVersion {
    /// Unversioned
    V1,
    /// Versioned
    V2,
}

/// Credential generators: every read issues a new lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynamicEngine {
    Database,
    Aws,
    Azure,
    Consul,
    Kubernetes,
    Nomad,
    RabbitMq,
    Ssh,
    Terraform,
}

impl DynamicEngine {
    pub const ALL: [DynamicEngine; 9] = [
        Self::Database,
        Self::Aws,
        Self::Azure,
        Self::Consul,
        Self::Kubernetes,
        Self::Nomad,
        Self::RabbitMq,
        Self::Ssh,
        Self::Terraform,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Aws => "aws",
            Self::Azure => "azure",
            Self::Consul => "consul",
            Self::Kubernetes => "kubernetes",
            Self::Nomad => "nomad",
            Self::RabbitMq => "rabbitmq",
            Self::Ssh => "ssh",
            Self::Terraform => "terraform",
        }
    }
}

/// A secrets engine kind, split into its two families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretEngine {
    /// Stored key-value secrets
    Static(KvVersion),
    /// Generated, lease-bound credentials
    Dynamic(DynamicEngine),
}

impl SecretEngine {
    /// Every recognized engine, static first.
    pub fn all() -> impl Iterator<Item = SecretEngine> {
        [
            Self::Static(KvVersion::V1),
            Self::Static(KvVersion::V2),
        ]
        .into_iter()
        .chain(DynamicEngine::ALL.into_iter().map(Self::Dynamic))
    }

    /// Name as written in pipeline configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static(KvVersion::V1) => "kv1",
            Self::Static(KvVersion::V2) => "kv2",
            Self::Dynamic(engine) => engine.as_str(),
        }
    }

    /// Whether reads generate credentials rather than return stored data.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }

    /// Mount used when the pipeline does not name one.
    pub fn default_mount(&self) -> &'static str {
        match self {
            Self::Static(KvVersion::V1) => constants::DEFAULT_KV1_MOUNT,
            Self::Static(KvVersion::V2) => constants::DEFAULT_KV2_MOUNT,
            Self::Dynamic(engine) => engine.as_str(),
        }
    }
}

impl FromStr for SecretEngine {
    type Err = SecretError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::all().find(|e| e.as_str() == s).ok_or_else(|| {
            debug!(input = %s, "string could not be converted to a secret engine");
            SecretError::InvalidSecretEngine(s.to_string())
        })
    }
}

impl fmt::Display for SecretEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which closed set a candidate string is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Auth,
    Secret,
}

/// A candidate string that passed catalog validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validated {
    Auth(AuthMethod),
    Secret(SecretEngine),
}

/// Check `candidate` against the catalog of the given kind.
pub fn validate(candidate: &str, kind: CatalogKind) -> Result<Validated> {
    match kind {
        CatalogKind::Auth => candidate
            .parse()
            .map(Validated::Auth)
            .map_err(Error::from),
        CatalogKind::Secret => candidate
            .parse()
            .map(Validated::Secret)
            .map_err(Error::from),
    }
}
