//! Command line interface definition

use bpi_types::{ColorChoice, InstallOptions};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// bpi - install buildpack artifacts into the buildpack registry
#[derive(Parser)]
#[command(name = "bpi")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Plan and install buildpack artifacts")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Use alternate buildpack database
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Install buildpack artifacts as one batch
    #[command(alias = "i")]
    Install {
        /// Buildpack name
        #[arg(long)]
        name: String,

        #[command(flatten)]
        options: OptionArgs,

        /// Buildpack zip files, planned in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List stored buildpacks
    #[command(alias = "ls")]
    List {
        /// Only show buildpacks with this name
        #[arg(long)]
        name: Option<String>,
    },

    /// Print the stack declared by a buildpack zip
    Stack {
        /// Buildpack zip file
        file: PathBuf,
    },
}

/// Attribute flags applied after upload
#[derive(Args, Debug, Default)]
pub struct OptionArgs {
    /// Enable the buildpack
    #[arg(long, conflicts_with = "disabled")]
    pub enabled: bool,

    /// Disable the buildpack
    #[arg(long)]
    pub disabled: bool,

    /// Lock the buildpack against further installs
    #[arg(long, conflicts_with = "unlocked")]
    pub locked: bool,

    /// Unlock the buildpack
    #[arg(long)]
    pub unlocked: bool,

    /// Position among buildpacks (1-based)
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
    pub position: Option<i64>,
}

impl OptionArgs {
    /// Flags that were not given leave the stored value alone
    pub fn to_options(&self) -> InstallOptions {
        let mut options = InstallOptions::default();
        if self.enabled || self.disabled {
            options = options.with_enabled(self.enabled);
        }
        if self.locked || self.unlocked {
            options = options.with_locked(self.locked);
        }
        if let Some(position) = self.position {
            options = options.with_position(position);
        }
        options
    }
}
