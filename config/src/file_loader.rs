//! # Configuration File Loading
//!
//! Loads configuration documents from JSON, TOML or YAML files and converts
//! them into the shared [`Tree`] model.
//!
//! The document root must be a mapping. An empty YAML document and a JSON
//! `null` load as an empty tree.

use std::path::{Path, PathBuf};

use crate::source::{Source, SourceKind};
use crate::{SourceError, Tree, Value};

/// Document format of a [`FileSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
    Yaml
}

impl FileFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Toml => "toml",
            Self::Yaml => "yaml"
        }
    }

    fn kind(self) -> SourceKind {
        match self {
            Self::Json => SourceKind::Json,
            Self::Toml => SourceKind::Toml,
            Self::Yaml => SourceKind::Yaml
        }
    }
}

/// A configuration document on disk.
///
/// ```rust,no_run
/// use confluent::{FileSource, Source};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let source = FileSource::toml("config/base.toml", 100).with_name("base");
///     let tree = source.load()?;
///     println!("{} top-level keys", tree.len());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileSource {
    name: String,
    path: PathBuf,
    priority: i32,
    format: FileFormat
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, format: FileFormat, priority: i32) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            path,
            priority,
            format
        }
    }

    pub fn json(path: impl Into<PathBuf>, priority: i32) -> Self {
        Self::new(path, FileFormat::Json, priority)
    }

    pub fn toml(path: impl Into<PathBuf>, priority: i32) -> Self {
        Self::new(path, FileFormat::Toml, priority)
    }

    pub fn yaml(path: impl Into<PathBuf>, priority: i32) -> Self {
        Self::new(path, FileFormat::Yaml, priority)
    }

    /// Override the logical name (defaults to the path).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    fn parse_error(&self, reason: impl ToString) -> SourceError {
        SourceError::Parse {
            name: self.name.clone(),
            format: self.format.as_str(),
            reason: reason.to_string()
        }
    }

    fn decode(&self, contents: &str) -> Result<Tree, SourceError> {
        let document = match self.format {
            FileFormat::Json => {
                serde_json::from_str::<Value>(contents).map_err(|e| self.parse_error(e))?
            }
            FileFormat::Toml => {
                let table =
                    toml::from_str::<toml::Table>(contents).map_err(|e| self.parse_error(e))?;
                Value::Object(from_toml_table(table))
            }
            FileFormat::Yaml => {
                let value = serde_yaml::from_str::<serde_yaml::Value>(contents)
                    .map_err(|e| self.parse_error(e))?;
                from_yaml(value).map_err(|reason| self.parse_error(reason))?
            }
        };

        match document {
            Value::Object(tree) => Ok(tree),
            Value::Null => Ok(Tree::new()),
            _ => Err(self.parse_error("document root is not a mapping"))
        }
    }
}

impl Source for FileSource {
    fn load(&self) -> Result<Tree, SourceError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|source| SourceError::Read {
            name: self.name.clone(),
            source
        })?;

        let tree = self.decode(&contents)?;
        tracing::debug!(
            source = %self.name,
            format = self.format.as_str(),
            keys = tree.len(),
            "Loaded configuration file"
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
        self.format.kind()
    }
}

fn from_toml_table(table: toml::Table) -> Tree {
    table
        .into_iter()
        .map(|(key, value)| (key, from_toml(value)))
        .collect()
}

fn from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => float(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => Value::Object(from_toml_table(table))
    }
}

fn from_yaml(value: serde_yaml::Value) -> Result<Value, String> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64().map_or(Value::Null, float)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(from_yaml)
                .collect::<Result<Vec<_>, _>>()?
        ),
        serde_yaml::Value::Mapping(mapping) => {
            let mut tree = Tree::new();
            for (key, value) in mapping {
                tree.insert(yaml_key(key)?, from_yaml(value)?);
            }
            Value::Object(tree)
        }
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value)?
    })
}

fn yaml_key(key: serde_yaml::Value) -> Result<String, String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => {
            Err("mapping keys must be scalars".to_string())
        }
    }
}

// Non-finite floats have no JSON representation.
fn float(f: f64) -> Value {
    serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)
}
