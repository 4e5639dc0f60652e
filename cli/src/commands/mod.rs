pub mod check;
pub mod inspect;

use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use confluent::Builder;

#[derive(Parser)]
#[command(
    name = "confluent",
    author,
    version,
    about = "Confluent - layered configuration inspector",
    long_about = "Merge environment, dotenv, JSON, TOML and YAML sources the way an application \
                  would and show the result.\n\nSources are given as <id>[@<priority>]; `env` is \
                  the process environment, `.env*` files are dotenv files and .json/.toml/.yaml \
                  files are documents. Higher priorities override lower ones."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Print the merged configuration tree")]
    Inspect(inspect::InspectArgs),

    #[command(about = "Load every source and report failures")]
    Check(check::CheckArgs)
}

/// A `--source` value: identifier plus optional priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub identifier: String,
    pub priority: Option<i32>
}

impl FromStr for SourceSpec {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.is_empty() {
            return Err("source identifier cannot be empty".to_string());
        }

        match raw.rsplit_once('@') {
            Some((identifier, priority)) => {
                if identifier.is_empty() {
                    return Err(format!("missing source identifier in '{raw}'"));
                }
                let priority = priority
                    .parse::<i32>()
                    .map_err(|e| format!("invalid priority '{priority}': {e}"))?;
                Ok(Self {
                    identifier: identifier.to_string(),
                    priority: Some(priority)
                })
            }
            None => Ok(Self {
                identifier: raw.to_string(),
                priority: None
            })
        }
    }
}

/// Source options shared by every subcommand.
#[derive(Args)]
pub struct SourceArgs {
    /// Source as <id>[@<priority>], repeatable; priority defaults to 100 x position
    #[arg(short, long = "source", value_name = "SOURCE", required = true)]
    pub sources: Vec<SourceSpec>,

    /// Prefix of environment variables to read
    #[arg(long, env = "CONFLUENT_ENV_PREFIX", default_value = confluent::DEFAULT_ENV_PREFIX)]
    pub env_prefix: String,

    /// Separator between nesting levels in variable names
    #[arg(long, env = "CONFLUENT_ENV_SEPARATOR", default_value = confluent::DEFAULT_ENV_SEPARATOR)]
    pub env_separator: String
}

impl SourceArgs {
    /// Builder with every source registered.
    pub fn builder(&self) -> Builder {
        let mut builder = Builder::new()
            .env_prefix(self.env_prefix.clone())
            .env_separator(self.env_separator.clone());

        for (position, spec) in self.sources.iter().enumerate() {
            let priority = spec.priority.unwrap_or_else(|| default_priority(position));
            tracing::debug!(source = %spec.identifier, priority, "Registering source");
            builder.set_source(&spec.identifier, priority);
        }

        builder
    }
}

fn default_priority(position: usize) -> i32 {
    i32::try_from(position + 1)
        .unwrap_or(i32::MAX)
        .saturating_mul(100)
}
