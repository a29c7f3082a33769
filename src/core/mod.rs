//! Core library components.
//!
//! Authentication, secret operations and version reconciliation. Nothing
//! in here writes to stdout.

pub mod auth;
pub mod backend;
pub mod config;
pub mod constants;
pub mod domain;
pub mod protocol;
pub mod reconcile;
pub mod secrets;
