//! Initialization logic for logging that is shared between the binaries of
//! this workspace, as well as small logging helpers.
pub mod config;
pub mod tracing;

pub use config::Config;
