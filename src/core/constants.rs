//! Constants used throughout vault-resource.
//!
//! Centralizes defaults and well-known paths.

/// Vault address used when the source omits one.
pub const DEFAULT_ADDRESS: &str = "http://127.0.0.1:8200";

/// Default mount of the AWS auth method.
pub const DEFAULT_AWS_AUTH_MOUNT: &str = "aws";

/// Default mount of the Kubernetes auth method.
pub const DEFAULT_KUBERNETES_AUTH_MOUNT: &str = "kubernetes";

/// Default mount of a KV version 1 secrets engine.
pub const DEFAULT_KV1_MOUNT: &str = "kv";

/// Default mount of a KV version 2 secrets engine.
pub const DEFAULT_KV2_MOUNT: &str = "secret";

/// Service account JWT mounted into every Kubernetes pod.
pub const SERVICE_ACCOUNT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Sortable timestamp format used as the version of dynamic secrets.
pub const EXPIRY_VERSION_FORMAT: &str = "%Y-%m-%d-%H%M%S";

/// Version reported for secrets that carry no version (KV1, no secret).
pub const UNVERSIONED: &str = "0";

/// File written into the `in` destination directory.
pub const SECRETS_FILE: &str = "vault.json";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "VAULT_RESOURCE_LOG";

/// STS endpoint signed for AWS IAM login.
pub const STS_ENDPOINT: &str = "https://sts.amazonaws.com/";

/// Region used to sign the global STS endpoint.
pub const STS_REGION: &str = "us-east-1";

/// Body of the signed `GetCallerIdentity` request.
pub const STS_REQUEST_BODY: &str = "Action=GetCallerIdentity&Version=2011-06-15";
