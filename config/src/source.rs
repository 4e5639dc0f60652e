//! # Sources
//!
//! A source is a named, prioritized provider of a decoded [`Tree`]. The
//! builder sorts sources by priority (ascending, stable) and merges them in
//! that order, so higher priorities override lower ones.

use std::fmt;
use std::path::Path;

use crate::{ConfigError, SourceError, Tree};

/// Kind of provider behind a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Env,
    Dotenv,
    Json,
    Toml,
    Yaml
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::Dotenv => "dotenv",
            Self::Json => "json",
            Self::Toml => "toml",
            Self::Yaml => "yaml"
        }
    }

    /// Pick a kind from a source identifier.
    ///
    /// Matching is case-insensitive:
    /// 1. `env` is the process environment
    /// 2. a base name starting with `.env` is a dotenv file
    /// 3. a base name ending in `.json`, `.toml` or `.yaml` is a document
    ///
    /// ```
    /// use confluent::SourceKind;
    ///
    /// assert_eq!(SourceKind::sniff("ENV").unwrap(), SourceKind::Env);
    /// assert_eq!(SourceKind::sniff("deploy/.env.production").unwrap(), SourceKind::Dotenv);
    /// assert_eq!(SourceKind::sniff("Config.TOML").unwrap(), SourceKind::Toml);
    /// assert!(SourceKind::sniff("settings").is_err());
    /// ```
    pub fn sniff(identifier: &str) -> Result<Self, ConfigError> {
        let lowered = identifier.to_lowercase();
        if lowered == "env" {
            return Ok(Self::Env);
        }

        let base = Path::new(&lowered)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(lowered.as_str());

        if base.starts_with(".env") {
            Ok(Self::Dotenv)
        } else if base.ends_with(".json") {
            Ok(Self::Json)
        } else if base.ends_with(".toml") {
            Ok(Self::Toml)
        } else if base.ends_with(".yaml") {
            Ok(Self::Yaml)
        } else if !lowered.contains('.') {
            Err(ConfigError::NoSourceType {
                name: identifier.to_string()
            })
        } else {
            Err(ConfigError::UnsupportedSourceType {
                name: identifier.to_string()
            })
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a registered source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub name: String,
    pub priority: i32,
    pub kind: SourceKind
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, priority {})", self.name, self.kind, self.priority)
    }
}

/// A provider of configuration data.
///
/// Implement this to feed the builder from somewhere other than the built-in
/// environment and file sources. `load` is called at most once per builder
/// while it keeps succeeding; the builder caches the normalized result under
/// [`Source::name`].
pub trait Source {
    /// Produce the decoded tree. Keys need not be canonical.
    fn load(&self) -> Result<Tree, SourceError>;

    fn name(&self) -> &str;

    fn set_name(&mut self, name: String);

    /// Lower priorities are merged first.
    fn priority(&self) -> i32;

    fn set_priority(&mut self, priority: i32);

    fn kind(&self) -> SourceKind;

    fn descriptor(&self) -> SourceDescriptor {
        SourceDescriptor {
            name: self.name().to_string(),
            priority: self.priority(),
            kind: self.kind()
        }
    }
}
