//! `check` step.

use std::io::{self, Read, Write};

use tracing::{debug, info};

use crate::cli::output;
use crate::core::auth::{self, Session};
use crate::core::backend::Backend;
use crate::core::config::AuthConfig;
use crate::core::domain::Version;
use crate::core::protocol::{CheckRequest, ResourceVersion};
use crate::core::{reconcile, secrets};
use crate::error::Result;

/// Run the check step against stdin and stdout.
pub fn execute() -> Result<()> {
    run(io::stdin().lock(), io::stdout().lock(), auth::resolve)
}

/// Run the check step.
///
/// Without a secret in `source` the step reports the single version `"0"`
/// and never authenticates.
///
/// # Errors
///
/// Returns an error if the request is malformed, authentication fails, the
/// secret cannot be read, or a valid lease fails to renew.
pub fn run<R, W, B, F>(input: R, writer: W, resolve: F) -> Result<()>
where
    R: Read,
    W: Write,
    B: Backend,
    F: FnOnce(&AuthConfig) -> Result<Session<B>>,
{
    let request = CheckRequest::from_reader(input)?;

    let Some(source) = request.source.secret() else {
        debug!("no secret in source; reporting placeholder version");
        return output::emit(writer, &[ResourceVersion::new(Version::Unversioned.to_string())]);
    };

    let secret = source.descriptor()?;
    let session = resolve(&request.source.auth_config())?;

    let current = secrets::read(&session, &secret, None)?
        .metadata
        .version
        .unwrap_or(Version::Unversioned);
    info!(secret = %secret, version = %current, "retrieved current version");

    let versions: Vec<ResourceVersion> =
        reconcile::reconcile(&session, &secret, request.version(), current, source.lease_id())?
            .iter()
            .map(|v| ResourceVersion::new(v.to_string()))
            .collect();

    output::emit(writer, &versions)
}
