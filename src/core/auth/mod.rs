//! Authentication.
//!
//! Turns an [`AuthConfig`] into an authenticated [`Session`]. Everything
//! that can be checked locally is checked before the first request; the
//! seal-status probe is the first network call and a login handshake (AWS,
//! Kubernetes) the second. Nothing is retried.

pub mod aws;

use std::fmt;
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::core::backend::{AuthInfo, Backend, HttpBackend};
use crate::core::config::{AuthConfig, Endpoint};
use crate::core::constants;
use crate::core::domain::AuthMethod;
use crate::error::{AuthError, Error, Result};

pub use aws::{AwsCredentials, KeySource};

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9.]+$").expect("token pattern is valid"));

/// An authenticated connection to the secret backend.
///
/// Bound to one auth method for the life of the process and read-only once
/// created.
pub struct Session<B> {
    backend: B,
    method: AuthMethod,
}

impl<B: Backend> Session<B> {
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn method(&self) -> AuthMethod {
        self.method
    }
}

/// Locally validated login material for one auth method.
pub enum Credentials {
    Token(Zeroizing<String>),
    AwsIam {
        mount: String,
        role: Option<String>,
        keys: KeySource,
    },
    Kubernetes {
        mount: String,
        role: String,
        jwt: Zeroizing<String>,
    },
}

impl Credentials {
    /// Validate the configuration for the selected auth method.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for a malformed token,
    /// `AuthError::NoRoleSpecified` for Kubernetes without a role, or an
    /// error if the service account JWT cannot be read. Without the `aws`
    /// feature, missing AWS environment keys are also an error.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        match config.auth_method()? {
            AuthMethod::Token => {
                let token = config.token().unwrap_or_default();
                if !TOKEN_PATTERN.is_match(token) {
                    return Err(AuthError::InvalidToken.into());
                }
                Ok(Self::Token(Zeroizing::new(token.to_string())))
            }
            AuthMethod::AwsIam => {
                let mount = config.mount().unwrap_or_else(|| {
                    info!("using default AWS authentication mount path at 'aws'");
                    constants::DEFAULT_AWS_AUTH_MOUNT
                });
                match config.role() {
                    Some(role) => info!(role, "using Vault AWS role for authentication"),
                    None => info!("using the Vault role named after the current AWS IAM principal"),
                }
                Ok(Self::AwsIam {
                    mount: mount.to_string(),
                    role: config.role().map(str::to_string),
                    keys: KeySource::detect()?,
                })
            }
            AuthMethod::Kubernetes => {
                let mount = config.mount().unwrap_or_else(|| {
                    info!("using default Kubernetes authentication mount path at 'kubernetes'");
                    constants::DEFAULT_KUBERNETES_AUTH_MOUNT
                });
                let role = config.role().ok_or(AuthError::NoRoleSpecified)?;

                let path = config.jwt_path();
                let jwt = std::fs::read_to_string(&path).map_err(|source| {
                    AuthError::ServiceAccountToken {
                        path: path.display().to_string(),
                        source,
                    }
                })?;

                Ok(Self::Kubernetes {
                    mount: mount.to_string(),
                    role: role.to_string(),
                    jwt: Zeroizing::new(jwt.trim().to_string()),
                })
            }
        }
    }

    pub fn method(&self) -> AuthMethod {
        match self {
            Self::Token(_) => AuthMethod::Token,
            Self::AwsIam { .. } => AuthMethod::AwsIam,
            Self::Kubernetes { .. } => AuthMethod::Kubernetes,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(<redacted>)"),
            Self::AwsIam { mount, role, keys } => f
                .debug_struct("AwsIam")
                .field("mount", mount)
                .field("role", role)
                .field("keys", keys)
                .finish(),
            Self::Kubernetes { mount, role, .. } => f
                .debug_struct("Kubernetes")
                .field("mount", mount)
                .field("role", role)
                .finish_non_exhaustive(),
        }
    }
}

/// Authenticate against the Vault HTTP API.
pub fn resolve(config: &AuthConfig) -> Result<Session<HttpBackend>> {
    resolve_with(config, HttpBackend::connect)
}

/// Authenticate with a caller-supplied backend constructor.
///
/// `connect` is only invoked once the configuration is fully validated.
pub fn resolve_with<B, F>(config: &AuthConfig, connect: F) -> Result<Session<B>>
where
    B: Backend,
    F: FnOnce(&Endpoint) -> Result<B>,
{
    let endpoint = config.endpoint()?;
    let credentials = Credentials::from_config(config)?;
    debug!(?credentials, "authentication configuration validated");

    let backend = connect(&endpoint)?;
    authenticate(backend, credentials)
}

/// Verify the backend is unsealed, then log in.
///
/// # Errors
///
/// Returns `AuthError::BackendSealed` if the server is sealed,
/// `AuthError::NoAuthInfo` if a login succeeds without an auth block, or a
/// backend error if a call fails.
pub fn authenticate<B: Backend>(mut backend: B, credentials: Credentials) -> Result<Session<B>> {
    let status = backend
        .seal_status()
        .map_err(|e| Error::backend("seal status check", "sys/seal-status", e))?;
    if status.sealed {
        return Err(AuthError::BackendSealed.into());
    }

    let method = credentials.method();
    match credentials {
        Credentials::Token(token) => backend.set_token(&token),
        Credentials::AwsIam { mount, role, keys } => {
            let keys = keys.credentials()?;
            let body = aws::login_body(role.as_deref(), &keys, Utc::now())?;
            let auth = login(&backend, &mount, &body)?;
            backend.set_token(&auth.client_token);
        }
        Credentials::Kubernetes { mount, role, jwt } => {
            let body = json!({ "role": role, "jwt": jwt.as_str() });
            let auth = login(&backend, &mount, &body)?;
            backend.set_token(&auth.client_token);
        }
    }

    info!(method = %method, "authenticated to Vault");
    Ok(Session { backend, method })
}

fn login<B: Backend>(backend: &B, mount: &str, body: &Value) -> Result<AuthInfo> {
    let auth = backend
        .login(mount, body)
        .map_err(|e| Error::backend("login", format!("auth/{}", mount), e))?;
    auth.ok_or_else(|| AuthError::NoAuthInfo.into())
}
