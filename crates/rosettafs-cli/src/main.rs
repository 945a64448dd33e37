//! # mount-rosetta
//!
//! Mounts a single-file FUSE filesystem over the Rosetta binary so that its
//! virtualization check passes outside Apple's hypervisor.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rosettafs_config::{init_logging, Config, LogLevel};

mod binfmt;
mod mount;

#[derive(Parser, Debug)]
#[command(name = "mount-rosetta")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    mount: mount::MountArgs,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Configuration file (default: ~/.rosettafs/config.toml)
    #[arg(long, value_name = "PATH", env = "ROSETTAFS_CONFIG")]
    config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn log_level(&self, config: &Config) -> Result<LogLevel> {
        let level = config.logging.level()?;
        Ok(if self.debug {
            level.max(LogLevel::Debug)
        } else {
            level
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    init_logging(cli.log_level(&config)?);

    let binary = cli
        .mount
        .rosetta_binary
        .as_deref()
        .context("ROSETTA_BINARY is required")?;
    mount::run(binary, &config)
}
