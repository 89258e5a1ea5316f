use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mediastore",
    about = "Mediastore: versioned image datasets",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (default: ./mediastore.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding dataset working areas
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a dataset working area
    CreateDataset(DatasetArgs),
    /// Create the working directory of a new version
    CreateVersion(VersionArgs),
    /// Copy images into a version, snapshot it, and publish it
    AddImages(AddImagesArgs),
    /// Restore the files of a published version
    RetrieveVersion(RetrieveArgs),
    /// List the published versions of a dataset
    ListVersions(DatasetArgs),
    /// List datasets with published versions
    ListDatasets,
}

#[derive(Args)]
pub struct DatasetArgs {
    pub dataset: String,
}

#[derive(Args)]
pub struct VersionArgs {
    pub dataset: String,
    pub version: String,
}

#[derive(Args)]
pub struct AddImagesArgs {
    pub dataset: String,
    pub version: String,
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args)]
pub struct RetrieveArgs {
    pub dataset: String,
    pub version: String,
    /// Restore here instead of the version's working directory
    #[arg(long)]
    pub dest: Option<PathBuf>,
}
