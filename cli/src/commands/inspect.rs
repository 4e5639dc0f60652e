//! Inspect command - print the merged tree
//!
//! Loads every source, merges them by priority and prints the normalized
//! result, optionally narrowed to one top-level section.

use anyhow::Result;
use clap::{Args, ValueEnum};
use confluent::{Tree, Value, canonical_key};

use super::SourceArgs;
use crate::output;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Yaml
}

#[derive(Args)]
pub struct InspectArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Only print this top-level section (case-insensitive)
    #[arg(long)]
    pub section: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub format: Format,

    /// Exit with code 1 when any source or registration error was recorded
    #[arg(long)]
    pub strict: bool
}

pub fn run(args: InspectArgs) -> Result<()> {
    let mut builder = args.sources.builder();
    let merged = builder.merged();

    for err in builder.errors() {
        output::warn(&err.to_string());
    }

    let tree = match &args.section {
        Some(section) => match select_section(merged, section) {
            Some(tree) => tree,
            None => {
                output::error(&format!("section '{}' not found", canonical_key(section)));
                std::process::exit(1);
            }
        },
        None => merged
    };

    println!("{}", render(&tree, args.format)?);

    if args.strict && builder.has_errors() {
        output::error(&format!(
            "{} error(s) recorded (strict mode)",
            builder.errors().len()
        ));
        std::process::exit(1);
    }

    Ok(())
}

fn select_section(mut merged: Tree, section: &str) -> Option<Tree> {
    match merged.remove(&canonical_key(section)) {
        Some(Value::Object(tree)) => Some(tree),
        _ => None
    }
}

fn render(tree: &Tree, format: Format) -> Result<String> {
    Ok(match format {
        Format::Json => serde_json::to_string_pretty(tree)?,
        Format::Yaml => serde_yaml::to_string(tree)?.trim_end().to_string()
    })
}
