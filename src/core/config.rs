//! Authentication configuration.
//!
//! [`AuthConfig`] is the semantic view of a pipeline `source`: where Vault
//! lives and how to log in. Validation here never touches the network.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info};
use url::Url;

use crate::core::constants;
use crate::core::domain::AuthMethod;
use crate::error::{AuthError, Result};

/// A validated Vault server location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub address: Url,
    /// Skip TLS certificate verification
    pub insecure: bool,
}

/// Partial authentication configuration as supplied by the pipeline.
///
/// Empty strings are treated the same as absent values.
#[derive(Clone, Default)]
pub struct AuthConfig {
    pub address: Option<String>,
    pub insecure: bool,
    /// Explicit auth method name; deduced when absent
    pub method: Option<String>,
    pub token: Option<String>,
    /// Auth method mount (AWS or Kubernetes)
    pub mount: Option<String>,
    /// Vault role (AWS or Kubernetes)
    pub role: Option<String>,
    /// Override of the Kubernetes service account JWT location
    pub jwt_path: Option<PathBuf>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl AuthConfig {
    pub fn token(&self) -> Option<&str> {
        non_empty(&self.token)
    }

    pub fn mount(&self) -> Option<&str> {
        non_empty(&self.mount)
    }

    pub fn role(&self) -> Option<&str> {
        non_empty(&self.role)
    }

    /// Service account JWT location for Kubernetes login.
    pub fn jwt_path(&self) -> PathBuf {
        self.jwt_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::SERVICE_ACCOUNT_TOKEN_PATH))
    }

    /// Resolve the server address and TLS mode.
    ///
    /// A missing address defaults to the local dev server. Plain `http`
    /// addresses force `insecure` on.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidAddress` if the address does not parse or
    /// lacks a scheme or host.
    pub fn endpoint(&self) -> Result<Endpoint> {
        let raw = non_empty(&self.address).unwrap_or(constants::DEFAULT_ADDRESS);

        let address = Url::parse(raw).map_err(|e| {
            debug!(address = %raw, error = %e, "address does not parse");
            AuthError::InvalidAddress(raw.to_string())
        })?;
        if address.scheme().is_empty() || address.host_str().map_or(true, str::is_empty) {
            return Err(AuthError::InvalidAddress(raw.to_string()).into());
        }

        let mut insecure = self.insecure;
        if !insecure && address.scheme() == "http" {
            info!(
                "address protocol is http and insecure was not set; insecure will be reset to true"
            );
            insecure = true;
        }

        Ok(Endpoint { address, insecure })
    }

    /// Determine the authentication method.
    ///
    /// An explicit method must be in the catalog. Otherwise a token selects
    /// token auth and anything else selects AWS IAM.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidAuthMethod` for an unknown explicit method,
    /// or `AuthError::AmbiguousAuthMethod` if a token is combined with an AWS
    /// mount or role and no method was named.
    pub fn auth_method(&self) -> Result<AuthMethod> {
        if let Some(method) = non_empty(&self.method) {
            return Ok(method.parse()?);
        }

        match (self.token(), self.mount().is_some() || self.role().is_some()) {
            (Some(_), true) => Err(AuthError::AmbiguousAuthMethod.into()),
            (Some(_), false) => {
                debug!("token present, using token authentication");
                Ok(AuthMethod::Token)
            }
            (None, _) => {
                debug!("no token present, using AWS IAM authentication");
                Ok(AuthMethod::AwsIam)
            }
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("address", &self.address)
            .field("insecure", &self.insecure)
            .field("method", &self.method)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("mount", &self.mount)
            .field("role", &self.role)
            .field("jwt_path", &self.jwt_path)
            .finish()
    }
}
