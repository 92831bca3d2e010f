//! Typed configuration for Grove services.
//!
//! [`GroveConfig`] groups the serving loop, router, logging and metrics
//! sections. [`ConfigLoader`] layers defaults, a TOML or JSON document and
//! `GROVE__SECTION__KEY` environment overrides, then validates the result.
//!
//! # Example
//!
//! ```
//! use grove_config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .with_string(r#"{"server":{"http_addr":"127.0.0.1:9000"}}"#, "json")
//!     .unwrap()
//!     .load()
//!     .unwrap();
//!
//! assert_eq!(config.server.http_addr, "127.0.0.1:9000");
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::GroveConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LogFormat, LoggingConfig, MetricsConfig, RouterConfig, ServerConfig};
