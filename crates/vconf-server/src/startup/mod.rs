//! Process startup: logging initialization and HTTP server construction

pub mod http;
pub mod logging;

pub use http::{config_server, config_server_on};
pub use logging::{LoggingGuard, init_logging};
