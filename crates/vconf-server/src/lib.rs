//! vconf server library
//!
//! HTTP gateway over the versioned config storage engine, together with the
//! configuration loading and logging setup used by the `vconf-server` binary.

pub mod api;
pub mod error;
pub mod model;
pub mod startup;

pub use model::common::AppState;
pub use model::config::{Cli, ListenConfig, LoggingParams, ServerConfig};
