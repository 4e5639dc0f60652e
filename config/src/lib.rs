//! # Confluent
//!
//! Layered configuration for typed records.
//!
//! This crate provides:
//! - Sources for the process environment, dotenv files and JSON/TOML/YAML
//!   documents, each decoded into a generic key/value [`Tree`]
//! - Key normalization into one canonical snake_case form
//! - Priority-ordered deep merging (higher priority overrides lower)
//! - Binding of the merged tree onto records that `#[derive(Bind)]`,
//!   with key overrides, default literals and type coercion
//! - A [`Builder`] that ties it together and accumulates non-fatal errors
//!
//! ## Usage
//! ```rust,no_run
//! use confluent::{Bind, Builder};
//!
//! #[derive(Debug, Default, Bind)]
//! struct Server {
//!     #[bind(default = "localhost")]
//!     host: String,
//!     #[bind(default = "8080")]
//!     http_port: u16,
//! }
//!
//! #[derive(Debug, Default, Bind)]
//! struct AppConfig {
//!     server: Server,
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = AppConfig::default();
//!     let mut builder = Builder::new();
//!     builder
//!         .set_source("config.toml", 100)
//!         .set_source("env", 1000)
//!         .load(&mut config);
//!     builder.ensure_ok()?;
//!     println!("listening on {}:{}", config.server.host, config.server.http_port);
//!     Ok(())
//! }
//! ```

extern crate self as confluent;

pub mod bind;
pub mod builder;
pub mod coerce;
pub mod file_loader;
pub mod loader;
pub mod normalize;
pub mod precedence;
pub mod source;

pub use bind::{Bind, BindField, Field, Slot, bind};
pub use builder::Builder;
pub use coerce::{Coerce, coerce};
pub use confluent_derive::Bind;
pub use errors::{BindError, CoerceError, ConfigError, LoadErrors, SourceError};
pub use file_loader::{FileFormat, FileSource};
pub use loader::{DEFAULT_ENV_PREFIX, DEFAULT_ENV_SEPARATOR, EnvSource};
pub use normalize::{canonical_key, normalize_keys, normalize_tree};
pub use precedence::merge;
pub use serde_json::Value;
pub use source::{Source, SourceDescriptor, SourceKind};

/// Decoded key/value tree produced by every source.
pub type Tree = serde_json::Map<String, Value>;
