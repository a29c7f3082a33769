//! `out` step: write secrets from step parameters.

use std::io::{self, Read, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::cli::output;
use crate::core::auth::{self, Session};
use crate::core::backend::Backend;
use crate::core::config::AuthConfig;
use crate::core::domain::{SecretData, SecretDescriptor, SecretMetadata};
use crate::core::protocol::{OutRequest, Response};
use crate::core::secrets::{self, WriteMode};
use crate::error::{Error, Result};

fn write_one<B: Backend>(
    session: &Session<B>,
    engine: &str,
    mount: &str,
    path: &str,
    data: &SecretData,
    mode: WriteMode,
) -> Result<(SecretDescriptor, SecretMetadata)> {
    let secret = SecretDescriptor::new(engine, mount, path)?;
    let metadata = secrets::write(session, &secret, data, mode)?;
    Ok((secret, metadata))
}

/// Run the out step against stdin and stdout.
pub fn execute(source: &Path) -> Result<()> {
    debug!(source = %source.display(), "build source directory");
    run(io::stdin().lock(), io::stdout().lock(), auth::resolve)
}

/// Run the out step.
///
/// Every secret in `params` is written; failures are collected and
/// reported together once all writes finish.
///
/// # Errors
///
/// Returns an error if the request is invalid or authentication fails, or
/// `Error::Batch` with every failed write.
pub fn run<R, W, B, F>(input: R, writer: W, resolve: F) -> Result<()>
where
    R: Read,
    W: Write,
    B: Backend,
    F: FnOnce(&AuthConfig) -> Result<Session<B>>,
{
    let request = OutRequest::from_reader(input)?;
    let session = resolve(&request.source.auth_config())?;

    let mut response = Response::default();
    let mut failures = Vec::new();

    for (mount, params) in &request.params {
        let mode = WriteMode::from_patch(params.patch);
        for (path, data) in &params.secrets {
            match write_one(&session, &params.engine, mount, path, data, mode) {
                Ok((secret, metadata)) => {
                    let identifier = secret.identifier();
                    debug!(
                        identifier = %identifier,
                        version = %metadata.version_string(),
                        "secret written"
                    );
                    response.record(&identifier, &metadata);
                }
                Err(e) => {
                    warn!(
                        engine = %params.engine,
                        mount = %mount,
                        path = %path,
                        error = %e,
                        "the secret could not be created or updated"
                    );
                    failures.push(e);
                }
            }
        }
    }

    if !failures.is_empty() {
        return Err(Error::Batch(failures));
    }

    output::emit(writer, &response)
}
