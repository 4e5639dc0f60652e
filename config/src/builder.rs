//! # Builder
//!
//! Orchestrates source registration, priority ordering, per-source caching,
//! merging and binding.
//!
//! Every failure is appended to the builder's error list and the pipeline
//! carries on with everything else: a broken source contributes nothing, a
//! missing section leaves the target untouched. Callers inspect
//! [`Builder::errors`] (or call [`Builder::ensure_ok`]) after loading.

use std::collections::HashMap;
use std::fmt;

use crate::bind::{Bind, bind};
use crate::file_loader::FileSource;
use crate::loader::{DEFAULT_ENV_PREFIX, DEFAULT_ENV_SEPARATOR, EnvSource};
use crate::normalize::{canonical_key, normalize_tree};
use crate::precedence::merge_with_logging;
use crate::source::{Source, SourceDescriptor, SourceKind};
use crate::{ConfigError, LoadErrors, Tree, Value};

/// Layered configuration loader.
///
/// Sources are merged in ascending priority order; equal priorities keep
/// registration order. The normalized tree of each source is cached by
/// source name after its first successful load, so sources sharing a name
/// share one tree.
pub struct Builder {
    sources: Vec<Box<dyn Source>>,
    cache: HashMap<String, Tree>,
    errors: Vec<ConfigError>,
    env_prefix: String,
    env_separator: String
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("sources", &self.sources().collect::<Vec<_>>())
            .field("cached", &self.cache.keys().collect::<Vec<_>>())
            .field("errors", &self.errors)
            .field("env_prefix", &self.env_prefix)
            .field("env_separator", &self.env_separator)
            .finish()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            cache: HashMap::new(),
            errors: Vec::new(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            env_separator: DEFAULT_ENV_SEPARATOR.to_string()
        }
    }

    /// Prefix for env and dotenv sources registered afterwards.
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Separator for env and dotenv sources registered afterwards.
    pub fn env_separator(mut self, separator: impl Into<String>) -> Self {
        self.env_separator = separator.into();
        self
    }

    /// Register a source whose kind is sniffed from `identifier`.
    ///
    /// `env` is the process environment, a base name starting with `.env` is a
    /// dotenv file and `.json`, `.toml` and `.yaml` files are documents. Any
    /// other identifier records an error instead of registering a source.
    pub fn set_source(&mut self, identifier: &str, priority: i32) -> &mut Self {
        let kind = match SourceKind::sniff(identifier) {
            Ok(kind) => kind,
            Err(err) => {
                tracing::warn!(source = identifier, error = %err, "Rejected configuration source");
                self.errors.push(err);
                return self;
            }
        };

        match kind {
            SourceKind::Env => self.add_source(
                EnvSource::process(priority)
                    .with_prefix(self.env_prefix.clone())
                    .with_separator(self.env_separator.clone())
            ),
            SourceKind::Dotenv => self.add_source(
                EnvSource::dotenv(identifier, priority)
                    .with_prefix(self.env_prefix.clone())
                    .with_separator(self.env_separator.clone())
            ),
            SourceKind::Json => self.add_source(FileSource::json(identifier, priority)),
            SourceKind::Toml => self.add_source(FileSource::toml(identifier, priority)),
            SourceKind::Yaml => self.add_source(FileSource::yaml(identifier, priority))
        }
    }

    /// Register an explicitly constructed source.
    pub fn add_source(&mut self, source: impl Source + 'static) -> &mut Self {
        tracing::debug!(
            source = source.name(),
            kind = %source.kind(),
            priority = source.priority(),
            "Registered configuration source"
        );
        self.sources.push(Box::new(source));
        self
    }

    /// Registered sources, in merge order once a load has run.
    pub fn sources(&self) -> impl Iterator<Item = SourceDescriptor> + '_ {
        self.sources.iter().map(|source| source.descriptor())
    }

    /// Load every source (or reuse its cached tree) and merge them all.
    pub fn merged(&mut self) -> Tree {
        self.sources.sort_by_key(|source| source.priority());

        let mut merged = Tree::new();
        for source in &self.sources {
            let name = source.name();

            if self.cache.contains_key(name) {
                tracing::trace!(source = name, "Using cached configuration tree");
            } else {
                match source.load() {
                    Ok(tree) => {
                        let normalized = normalize_tree(&tree);
                        tracing::debug!(
                            source = name,
                            keys = normalized.len(),
                            "Normalized configuration source"
                        );
                        self.cache.insert(name.to_string(), normalized);
                    }
                    Err(err) => {
                        tracing::warn!(source = name, error = %err, "Failed to load configuration source");
                        self.errors.push(err.into());
                        continue;
                    }
                }
            }

            if let Some(tree) = self.cache.get(name) {
                merged = merge_with_logging(merged, tree, name);
            }
        }

        merged
    }

    /// Bind `target` against the whole merged tree.
    pub fn load<T: Bind>(&mut self, target: &mut T) -> &mut Self {
        let merged = self.merged();

        if let Err(err) = bind(target, &merged) {
            tracing::warn!(record = T::type_name(), error = %err, "Failed to bind configuration");
            self.errors.push(err.into());
        }
        self
    }

    /// Bind `target` against one top-level section of the merged tree.
    ///
    /// The section name is canonicalized, so `"MONGO"`, `"Mongo"` and
    /// `"mongo"` all address the `mongo` key.
    pub fn load_section<T: Bind>(&mut self, target: &mut T, section: &str) -> &mut Self {
        let merged = self.merged();
        let key = canonical_key(section);

        match merged.get(key.as_str()) {
            Some(Value::Object(tree)) => {
                if let Err(err) = bind(target, tree) {
                    tracing::warn!(
                        record = T::type_name(),
                        section = %key,
                        error = %err,
                        "Failed to bind configuration section"
                    );
                    self.errors.push(err.into());
                }
            }
            _ => {
                tracing::warn!(section = %key, "Configuration section not found");
                self.errors.push(ConfigError::SectionNotFound { section: key });
            }
        }
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Every error recorded so far, oldest first.
    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    /// Fold every recorded error into one.
    ///
    /// ```rust,no_run
    /// use confluent::{Bind, Builder};
    ///
    /// #[derive(Default, Bind)]
    /// struct Mongo {
    ///     #[bind(default = "localhost")]
    ///     host: String,
    /// }
    ///
    /// fn main() -> Result<(), confluent::LoadErrors> {
    ///     let mut mongo = Mongo::default();
    ///     Builder::new()
    ///         .set_source("config.yaml", 100)
    ///         .load_section(&mut mongo, "mongo")
    ///         .ensure_ok()
    /// }
    /// ```
    pub fn ensure_ok(&self) -> Result<(), LoadErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(LoadErrors::from_errors(&self.errors))
        }
    }
}
