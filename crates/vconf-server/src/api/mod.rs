//! HTTP API gateway
//!
//! Four CRUD-shaped operations on `/config`, each translated into one
//! storage call with a fixed error-to-status mapping.

pub mod config;
pub mod model;
pub mod route;

pub use route::routes;
