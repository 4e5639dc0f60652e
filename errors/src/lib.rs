//! # Confluent Errors
//!
//! Error taxonomy shared by the configuration engine and its binary.
//!
//! - [`ConfigError`]: everything a `Builder` accumulates (registration,
//!   source loading, missing sections, structural binding failures)
//! - [`SourceError`]: one source failed to produce a tree
//! - [`BindError`]: structural failure while walking a target record
//! - [`CoerceError`]: one leaf value did not fit its field type; the binder
//!   swallows these, callers of `coerce` see them directly
//! - [`LoadErrors`]: every accumulated error folded into one value

use thiserror::Error;

/// Errors recorded by a `Builder` while registering sources, loading them and
/// binding targets.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no source type provided for {name}")]
    NoSourceType { name: String },

    #[error("unsupported source type for {name}")]
    UnsupportedSourceType { name: String },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("section '{section}' not found")]
    SectionNotFound { section: String },

    #[error(transparent)]
    Bind(#[from] BindError)
}

/// A single source failed to load.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read config source {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error
    },

    #[error("failed to parse {format} config source {name}: {reason}")]
    Parse {
        name: String,
        format: &'static str,
        reason: String
    },

    #[error("failed to read dotenv source {name}: {reason}")]
    Dotenv { name: String, reason: String }
}

impl SourceError {
    /// Logical name of the source that failed.
    pub fn source_name(&self) -> &str {
        match self {
            Self::Read { name, .. } | Self::Parse { name, .. } | Self::Dotenv { name, .. } => name
        }
    }
}

/// Structural binding failure.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("error in section {key}: {source}")]
    Section {
        key: String,
        #[source]
        source: Box<BindError>
    },

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String }
}

impl BindError {
    /// Dotted path of binding keys leading to the innermost failure.
    pub fn key_path(&self) -> String {
        match self {
            Self::Section { key, source } => format!("{key}.{}", source.key_path()),
            Self::Invalid { key, .. } => key.clone()
        }
    }
}

/// A value (or default literal) could not be converted to a field type.
#[derive(Debug, Error)]
pub enum CoerceError {
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str
    },

    #[error("cannot parse {literal:?} as {expected}: {reason}")]
    Parse {
        expected: &'static str,
        literal: String,
        reason: String
    },

    #[error("{value} is out of range for {expected}")]
    OutOfRange {
        expected: &'static str,
        value: String
    },

    #[error("default literals are not supported for {target}")]
    UnsupportedDefault { target: &'static str },

    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error)
}

/// Every error a builder accumulated, folded into one value.
#[derive(Debug, Error)]
#[error("{} configuration error(s): {}", .messages.len(), .messages.join("; "))]
pub struct LoadErrors {
    pub messages: Vec<String>
}

impl LoadErrors {
    pub fn from_errors<'a>(errors: impl IntoIterator<Item = &'a ConfigError>) -> Self {
        Self {
            messages: errors.into_iter().map(ToString::to_string).collect()
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
