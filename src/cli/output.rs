//! Protocol output helpers.
//!
//! stdout carries exactly one JSON document per step. Human-readable
//! messages go to stderr.

use std::io::Write;

use serde::Serialize;

use crate::error::Result;

/// Write `value` as one line of JSON.
pub fn emit<W: Write, T: Serialize + ?Sized>(mut writer: W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Print an error message to stderr.
///
/// Example: `✗ the Vault server is sealed`
pub fn error(msg: &str) {
    eprintln!("✗ {}", msg);
}
