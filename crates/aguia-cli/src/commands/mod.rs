pub mod common;
pub mod completions;
pub mod delete;
pub mod export;
pub mod remote;
pub mod set;
pub mod show;
pub mod users;
