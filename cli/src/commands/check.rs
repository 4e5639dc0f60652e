//! Check command - source health
//!
//! Loads every registered source once and reports, per source, whether it
//! produced a tree. Registration errors (unknown identifiers) are listed
//! separately. Exits with code 1 when anything failed.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use confluent::{ConfigError, SourceDescriptor};

use super::SourceArgs;
use crate::output;

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub sources: SourceArgs
}

pub fn run(args: CheckArgs) -> Result<()> {
    let mut builder = args.sources.builder();
    let merged = builder.merged();

    output::header("Configuration Sources");
    println!();

    let descriptors: Vec<SourceDescriptor> = builder.sources().collect();
    for descriptor in &descriptors {
        match source_error(builder.errors(), &descriptor.name) {
            Some(err) => println!("  {} {}: {}", "✗".red().bold(), descriptor, err),
            None => println!("  {} {}", "✓".green().bold(), descriptor)
        }
    }

    let unregistered: Vec<_> = builder
        .errors()
        .iter()
        .filter(|err| !matches!(err, ConfigError::Source(_)))
        .collect();
    if !unregistered.is_empty() {
        println!();
        output::subheader("Rejected");
        for err in unregistered {
            println!("  {} {}", "✗".red().bold(), err);
        }
    }

    println!();
    println!(
        "  {} {} source(s), {} top-level key(s)",
        "Loaded:".dimmed(),
        descriptors.len(),
        merged.len()
    );

    if builder.has_errors() {
        output::error(&format!("{} error(s) recorded", builder.errors().len()));
        std::process::exit(1);
    }

    output::success("All sources loaded");
    Ok(())
}

fn source_error<'a>(errors: &'a [ConfigError], name: &str) -> Option<&'a ConfigError> {
    errors.iter().find(|err| match err {
        ConfigError::Source(source) => source.source_name() == name,
        _ => false
    })
}
