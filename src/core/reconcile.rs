//! Check-step version reconciliation.
//!
//! The pipeline remembers the last version it saw and must be handed every
//! version produced since, in ascending order. KV2 versions form a numeric
//! range; every other version stands alone.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::core::auth::Session;
use crate::core::backend::Backend;
use crate::core::domain::{SecretDescriptor, Version};
use crate::core::secrets;
use crate::error::Result;

static LEASE_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w{8}-\w{4}-\w{4}-\w{4}-\w{12}$").expect("lease id pattern is valid")
});

/// Whether `lease_id` is a UUID-shaped lease identifier.
pub fn is_lease_id(lease_id: &str) -> bool {
    LEASE_ID_PATTERN.is_match(lease_id)
}

/// Versions to report given the last seen and the current version.
///
/// For an ordinal `current`, an absent or non-numeric `last_seen` counts as
/// `0` and every version from `last_seen` through `current` is returned. A
/// `last_seen` past `current` yields only `current`. Any other `current`
/// is returned on its own.
///
/// The range is collected in full and is not capped: its length is bounded
/// only by the version number the backend reports, which for KV2 is the
/// number of writes the secret has seen.
pub fn delta(last_seen: Option<&str>, current: &Version) -> Vec<Version> {
    let Version::Ordinal(current) = current else {
        return vec![current.clone()];
    };
    let current = *current;

    let last = last_seen.and_then(|v| v.parse::<u64>().ok()).unwrap_or(0);
    if last > current {
        info!(
            last_seen = last,
            current,
            "the input version is later than the retrieved version; only the retrieved version \
             will be returned"
        );
        return vec![Version::Ordinal(current)];
    }

    (last..=current).map(Version::Ordinal).collect()
}

/// Reconcile the current version of `secret` against `last_seen`.
///
/// When `secret` is dynamic and `lease_hint` is a valid lease id, the lease
/// is renewed first and the renewed expiry replaces `current`. An absent or
/// malformed hint is logged and renewal is skipped.
///
/// # Arguments
///
/// * `session` - Authenticated session, used only for renewal
/// * `secret` - The checked secret
/// * `last_seen` - Version the pipeline reported, if any
/// * `current` - Version just read from the backend
/// * `lease_hint` - Lease id suffix from the pipeline source
///
/// # Errors
///
/// Returns a backend error if a valid lease fails to renew.
pub fn reconcile<B: Backend>(
    session: &Session<B>,
    secret: &SecretDescriptor,
    last_seen: Option<&str>,
    current: Version,
    lease_hint: Option<&str>,
) -> Result<Vec<Version>> {
    let current = if secret.is_dynamic() {
        match lease_hint.filter(|id| !id.is_empty()) {
            Some(lease_id) if is_lease_id(lease_id) => {
                debug!(lease_id, "renewing lease before reporting version");
                secrets::renew(session, secret, lease_id)?
                    .version
                    .unwrap_or(current)
            }
            Some(lease_id) => {
                warn!(lease_id, "the specified lease id is invalid; renewal will be skipped");
                current
            }
            None => {
                debug!("no lease id specified; renewal will be skipped");
                current
            }
        }
    } else {
        current
    };

    Ok(delta(last_seen, &current))
}
