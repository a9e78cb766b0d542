//! Database layer for Aguia

mod connection;
mod migrations;
mod preferences_repository;

pub use connection::Database;
pub use preferences_repository::{LibSqlPreferenceRepository, PreferenceRepository};
