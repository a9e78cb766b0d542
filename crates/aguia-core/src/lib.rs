//! aguia-core - Core library for Aguia
//!
//! Per-user accessibility preferences: the data model, translation between
//! the legacy and current storage schemas, the libSQL store, the service used
//! by the HTTP server and CLI, and the client-side preference controller.

pub mod controller;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod service;
pub mod translate;
pub mod util;

pub use error::{Error, Result};
pub use models::{Caller, Capability, ClientPrefs, PreferenceRecord, SaveOutcome, UserId};
pub use service::{AccessDenied, PreferenceService};
