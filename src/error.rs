//! Error types for vault-resource.
//!
//! Validation failures are detected before any network call. Backend
//! failures carry the operation and the path or lease id they targeted.

use thiserror::Error;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Request(#[from] RequestError),

    /// A backend call failed; `target` is the path, mount or lease id.
    #[error("{operation} failed for {target}: {source}")]
    Backend {
        operation: &'static str,
        target: String,
        #[source]
        source: BackendError,
    },

    /// One or more operations of a multi-secret step failed.
    #[error("{} secret operation(s) failed:\n{}", .0.len(), join_errors(.0))]
    Batch(Vec<Error>),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Annotate a backend failure with the operation and its target.
    pub fn backend(
        operation: &'static str,
        target: impl Into<String>,
        source: BackendError,
    ) -> Self {
        Self::Backend {
            operation,
            target: target.into(),
            source,
        }
    }
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Authentication and session errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid Vault server address: {0}")]
    InvalidAddress(String),

    #[error("the Vault server is sealed and no operations can be executed")]
    BackendSealed,

    #[error("invalid authentication method: {0}")]
    InvalidAuthMethod(String),

    #[error("a token and an AWS mount or role were both specified; set auth_engine explicitly")]
    AmbiguousAuthMethod,

    #[error("the specified Vault token is invalid")]
    InvalidToken,

    #[error("a Vault role must be specified for the Kubernetes authentication method")]
    NoRoleSpecified,

    #[error("no auth info was returned after login")]
    NoAuthInfo,

    #[error("no AWS credentials available: {0}")]
    MissingAwsCredentials(String),

    #[error("unable to read service account token at {path}: {source}")]
    ServiceAccountToken {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to sign AWS login request")]
    Signing,
}

/// Secret descriptor and operation errors.
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("missing required parameter: {0}")]
    MissingRequiredParam(&'static str),

    #[error("invalid secret engine: {0}")]
    InvalidSecretEngine(String),

    #[error("KV2 version must be a nonnegative integer, got '{0}'")]
    InvalidVersionFormat(String),

    #[error("no secret was returned from {0}")]
    EmptyResponse(String),
}

/// Resource protocol request errors.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("unable to decode request: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("secrets cannot be specified in both source and params")]
    DualSecrets,

    #[error("one secret must be specified in source, or one or more secrets in params")]
    NoSecrets,

    #[error("no secret parameters were specified for this put step")]
    EmptyParams,
}

/// Errors returned by a [`Backend`](crate::core::backend::Backend).
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("status {status}: {}", .errors.join("; "))]
    Status { status: u16, errors: Vec<String> },

    #[error("unexpected response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, Error>;
