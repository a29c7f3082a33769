//! `in` step: read secrets into the destination directory.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::cli::output;
use crate::core::auth::{self, Session};
use crate::core::backend::Backend;
use crate::core::config::AuthConfig;
use crate::core::constants;
use crate::core::domain::{SecretDescriptor, SecretValue};
use crate::core::protocol::{InRequest, Response, SecretValues};
use crate::core::secrets;
use crate::error::{Error, Result};

/// One secret named by the request.
struct SecretRead<'a> {
    engine: &'a str,
    mount: &'a str,
    path: &'a str,
    version: Option<&'a str>,
}

impl SecretRead<'_> {
    fn execute<B: Backend>(&self, session: &Session<B>) -> Result<(SecretDescriptor, SecretValue)> {
        let secret = SecretDescriptor::new(self.engine, self.mount, self.path)?;
        let value = secrets::read(session, &secret, self.version)?;
        Ok((secret, value))
    }
}

fn planned_reads(request: &InRequest) -> Vec<SecretRead<'_>> {
    match (&request.params, request.source.secret()) {
        (Some(params), _) => params
            .iter()
            .flat_map(|(mount, p)| {
                p.paths.iter().map(move |path| SecretRead {
                    engine: &p.engine,
                    mount,
                    path,
                    version: None,
                })
            })
            .collect(),
        (None, Some(source)) => vec![SecretRead {
            engine: &source.engine,
            mount: &source.mount,
            path: &source.path,
            version: request.version(),
        }],
        (None, None) => Vec::new(),
    }
}

/// Run the in step against stdin and stdout.
pub fn execute(destination: &Path) -> Result<()> {
    run(io::stdin().lock(), io::stdout().lock(), destination, auth::resolve)
}

/// Run the in step.
///
/// Every named secret is attempted. Failures are collected and reported
/// together once all reads finish; nothing is written to `destination`
/// unless every read succeeds.
///
/// # Errors
///
/// Returns an error if the request is invalid or authentication fails, or
/// `Error::Batch` with every failed read.
pub fn run<R, W, B, F>(input: R, writer: W, destination: &Path, resolve: F) -> Result<()>
where
    R: Read,
    W: Write,
    B: Backend,
    F: FnOnce(&AuthConfig) -> Result<Session<B>>,
{
    let request = InRequest::from_reader(input)?;
    let session = resolve(&request.source.auth_config())?;

    let mut response = Response::default();
    let mut values = SecretValues::new();
    let mut failures = Vec::new();

    for read in planned_reads(&request) {
        match read.execute(&session) {
            Ok((secret, value)) => {
                let identifier = secret.identifier();
                debug!(identifier = %identifier, "secret read");
                response.record(&identifier, &value.metadata);
                values.insert(identifier, value.data);
            }
            Err(e) => {
                warn!(
                    engine = read.engine,
                    mount = read.mount,
                    path = read.path,
                    error = %e,
                    "the secret could not be read"
                );
                failures.push(e);
            }
        }
    }

    if !failures.is_empty() {
        return Err(Error::Batch(failures));
    }

    write_secrets(destination, &values)?;
    output::emit(writer, &response)
}

/// Write secret values as JSON to `<dir>/vault.json`, readable by the
/// owner only.
pub fn write_secrets(dir: &Path, values: &SecretValues) -> Result<PathBuf> {
    let path = dir.join(constants::SECRETS_FILE);
    let contents = serde_json::to_vec(values)?;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(&path)?;
    file.write_all(&contents)?;

    // An existing file keeps its old mode through open()
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
    }

    debug!(path = %path.display(), count = values.len(), "secrets written");
    Ok(path)
}
