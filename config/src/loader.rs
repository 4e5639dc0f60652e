//! # Environment Variable Loader
//!
//! Loads configuration from the process environment or from a dotenv file.
//!
//! # Naming Convention
//! Only variables starting with `{prefix}{separator}` are considered (by
//! default `APP__`). The rest of the name is split on the separator into a key
//! path and every segment is lowercased:
//!
//! - `APP__LOG_LEVEL=debug` becomes `{ log_level: "debug" }`
//! - `APP__SERVER__HTTP_PORT=9000` becomes `{ server: { http_port: 9000 } }`
//! - `APP__LOG__OUTPUTS=["stdout"]` becomes `{ log: { outputs: ["stdout"] } }`
//!
//! Values are parsed as JSON literals when they are valid JSON and are kept as
//! raw strings otherwise.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::source::{Source, SourceKind};
use crate::{SourceError, Tree, Value};

/// Prefix used when none is configured.
pub const DEFAULT_ENV_PREFIX: &str = "APP";

/// Separator used when none is configured.
pub const DEFAULT_ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone)]
enum Origin {
    Process,
    Dotenv(PathBuf)
}

/// Environment-backed source.
#[derive(Debug, Clone)]
pub struct EnvSource {
    name: String,
    priority: i32,
    prefix: String,
    separator: String,
    origin: Origin
}

impl EnvSource {
    /// The process environment, named `env`.
    pub fn process(priority: i32) -> Self {
        Self {
            name: "env".to_string(),
            priority,
            prefix: DEFAULT_ENV_PREFIX.to_string(),
            separator: DEFAULT_ENV_SEPARATOR.to_string(),
            origin: Origin::Process
        }
    }

    /// A dotenv file, named after its path.
    pub fn dotenv(path: impl Into<PathBuf>, priority: i32) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            priority,
            prefix: DEFAULT_ENV_PREFIX.to_string(),
            separator: DEFAULT_ENV_SEPARATOR.to_string(),
            origin: Origin::Dotenv(path)
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    fn read_process(&self) -> BTreeMap<String, String> {
        env::vars_os()
            .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                (Err(key), _) | (_, Err(key)) => {
                    tracing::trace!(variable = ?key, "Skipping non UTF-8 environment variable");
                    None
                }
            })
            .collect()
    }

    fn read_dotenv(&self, path: &Path) -> Result<BTreeMap<String, String>, SourceError> {
        let entries = dotenvy::from_path_iter(path).map_err(|err| self.dotenv_error(err))?;

        let mut vars = BTreeMap::new();
        for entry in entries {
            let (key, value) = entry.map_err(|err| self.dotenv_error(err))?;
            vars.insert(key, value);
        }
        Ok(vars)
    }

    fn dotenv_error(&self, err: dotenvy::Error) -> SourceError {
        match err {
            dotenvy::Error::Io(source) => SourceError::Read {
                name: self.name.clone(),
                source
            },
            other => SourceError::Dotenv {
                name: self.name.clone(),
                reason: other.to_string()
            }
        }
    }
}

impl Source for EnvSource {
    fn load(&self) -> Result<Tree, SourceError> {
        let vars = match &self.origin {
            Origin::Process => self.read_process(),
            Origin::Dotenv(path) => self.read_dotenv(path)?
        };

        let tree = expand(&vars, &self.prefix, &self.separator);
        tracing::debug!(
            source = %self.name,
            prefix = %self.prefix,
            keys = tree.len(),
            "Loaded environment source"
        );
        Ok(tree)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    fn kind(&self) -> SourceKind {
        match self.origin {
            Origin::Process => SourceKind::Env,
            Origin::Dotenv(_) => SourceKind::Dotenv
        }
    }
}

/// Turn flat variables into a nested tree.
///
/// Variables are visited in sorted order. When a longer path runs through a
/// key already holding a scalar, the scalar is replaced by a mapping; a scalar
/// never replaces an existing mapping.
fn expand(vars: &BTreeMap<String, String>, prefix: &str, separator: &str) -> Tree {
    let marker = format!("{prefix}{separator}");
    let mut root = Tree::new();

    for (key, raw) in vars {
        let Some(suffix) = key.strip_prefix(&marker) else {
            continue;
        };
        if suffix.is_empty() {
            continue;
        }

        let segments: Vec<String> = if separator.is_empty() {
            vec![suffix.to_lowercase()]
        } else {
            suffix.split(separator).map(str::to_lowercase).collect()
        };
        insert_path(&mut root, &segments, parse_literal(raw));
    }

    root
}

fn parse_literal(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn insert_path(root: &mut Tree, segments: &[String], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = root;
    for part in parents {
        let entry = current
            .entry(part.clone())
            .or_insert_with(|| Value::Object(Tree::new()));
        if !entry.is_object() {
            *entry = Value::Object(Tree::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        current = next;
    }

    if matches!(current.get(last), Some(Value::Object(_))) && !value.is_object() {
        tracing::trace!(key = %last, "Scalar would replace a mapping, keeping the mapping");
        return;
    }
    current.insert(last.clone(), value);
}
