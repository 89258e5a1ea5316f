use anyhow::Context;
use colored::Colorize;
use serde_json::json;

use mediastore_sdk::{ErrorCategory, Mediastore, MediastoreConfig, SdkError};

use crate::cli::*;

pub const EXIT_NOT_FOUND: u8 = 1;
pub const EXIT_REJECTED: u8 = 2;
pub const EXIT_FAILURE: u8 = 3;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let mut config = MediastoreConfig::discover(cli.config.as_deref(), &cwd)?;
    if let Some(root) = cli.root {
        config = config.with_datasets_root(root);
    }
    let store = Mediastore::open(&config)?;
    execute(&store, cli.command, cli.format)
}

pub fn execute(store: &Mediastore, command: Command, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        Command::CreateDataset(args) => cmd_create_dataset(store, args, format),
        Command::CreateVersion(args) => cmd_create_version(store, args, format),
        Command::AddImages(args) => cmd_add_images(store, args, format),
        Command::RetrieveVersion(args) => cmd_retrieve_version(store, args, format),
        Command::ListVersions(args) => cmd_list_versions(store, args, format),
        Command::ListDatasets => cmd_list_datasets(store, format),
    }
}

/// Exit status for a failed command.
pub fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<SdkError>().map(SdkError::category) {
        Some(ErrorCategory::NotFound) => EXIT_NOT_FOUND,
        Some(ErrorCategory::Rejected) => EXIT_REJECTED,
        Some(ErrorCategory::Failure) | None => EXIT_FAILURE,
    }
}

fn print_json(value: serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn cmd_create_dataset(store: &Mediastore, args: DatasetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let path = store.create_dataset(&args.dataset)?;
    match format {
        OutputFormat::Json => print_json(json!({ "dataset": args.dataset, "path": path.display().to_string() })),
        OutputFormat::Text => {
            println!("{} Dataset {} created.", "✓".green().bold(), args.dataset.bold());
            println!("  Path: {}", path.display());
            Ok(())
        }
    }
}

fn cmd_create_version(store: &Mediastore, args: VersionArgs, format: OutputFormat) -> anyhow::Result<()> {
    let path = store.create_version(&args.dataset, &args.version)?;
    match format {
        OutputFormat::Json => print_json(json!({
            "dataset": args.dataset,
            "version": args.version,
            "path": path.display().to_string(),
        })),
        OutputFormat::Text => {
            println!(
                "{} Version {} for dataset {} created.",
                "✓".green().bold(),
                args.version.yellow(),
                args.dataset.bold()
            );
            println!("  Path: {}", path.display());
            Ok(())
        }
    }
}

fn cmd_add_images(store: &Mediastore, args: AddImagesArgs, format: OutputFormat) -> anyhow::Result<()> {
    let record = store.add_images(&args.dataset, &args.version, args.files.as_slice())?;
    match format {
        OutputFormat::Json => print_json(serde_json::to_value(&record)?),
        OutputFormat::Text => {
            println!(
                "{} Published {}/{} ({} files)",
                "✓".green().bold(),
                record.dataset.as_str().bold(),
                record.version.as_str().yellow(),
                args.files.len()
            );
            println!("  Fingerprint: {}", record.fingerprint.as_str().cyan());
            println!("  Created: {}", record.created_at.to_rfc3339());
            Ok(())
        }
    }
}

fn cmd_retrieve_version(store: &Mediastore, args: RetrieveArgs, format: OutputFormat) -> anyhow::Result<()> {
    let retrieved = store.retrieve_version(&args.dataset, &args.version, args.dest.as_deref())?;
    match format {
        OutputFormat::Json => print_json(serde_json::to_value(&retrieved)?),
        OutputFormat::Text => {
            println!(
                "{} Version {} of dataset {} retrieved.",
                "✓".green().bold(),
                args.version.yellow(),
                args.dataset.bold()
            );
            println!("  Fingerprint: {}", retrieved.record.fingerprint.as_str().cyan());
            println!(
                "  Restored {} files ({} bytes) into {}",
                retrieved.files,
                retrieved.bytes,
                retrieved.path.display()
            );
            Ok(())
        }
    }
}

fn cmd_list_versions(store: &Mediastore, args: DatasetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let records = store.list_versions(&args.dataset)?;
    match format {
        OutputFormat::Json => print_json(serde_json::to_value(&records)?),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No published versions of {}.", args.dataset.bold());
            }
            for record in &records {
                println!(
                    "{}  {}  {}",
                    record.version.as_str().yellow().bold(),
                    record.fingerprint.short().dimmed(),
                    record.created_at.to_rfc3339()
                );
            }
            Ok(())
        }
    }
}

fn cmd_list_datasets(store: &Mediastore, format: OutputFormat) -> anyhow::Result<()> {
    let datasets = store.list_datasets()?;
    match format {
        OutputFormat::Json => print_json(serde_json::to_value(&datasets)?),
        OutputFormat::Text => {
            if datasets.is_empty() {
                println!("No published datasets under {}.", store.datasets_root().display());
            }
            for dataset in &datasets {
                println!("{}", dataset.as_str().bold());
            }
            Ok(())
        }
    }
}
