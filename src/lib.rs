#![forbid(unsafe_code)]

//! Terms of service gate.
//!
//! Watches `termsOfService/terms-of-service-config.xml` under a product
//! config directory, keeps the parsed agreements in a hot-reloaded
//! snapshot, and serves an HTTP endpoint where users read and accept them.

pub mod config;
pub mod errors;
pub mod models;
pub mod persistence;
pub mod policy;
pub mod store;
pub mod web;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
