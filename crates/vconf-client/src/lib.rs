//! vconf Client - Rust SDK for the vconf configuration server
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use vconf_client::ConfigClient;
//!
//! let client = ConfigClient::connect("http://localhost:8080/config", "example", None)?;
//! client.create_config(&serde_json::json!({"key1": "Value1"})).await?;
//!
//! let cfg: serde_json::Value = client.read_and_decode_config().await?;
//!
//! client.assign_refresh_callback(Duration::from_secs(2), |payload| {
//!     println!("config changed: {}", String::from_utf8_lossy(&payload));
//! })?;
//! ```

pub mod client;
pub mod error;
pub mod refresh;

pub use client::{ConfigClient, REQUEST_TIMEOUT};
pub use error::{ClientError, Result};
pub use refresh::{PayloadCache, RefreshCallback};
