pub mod common;
pub mod config;
