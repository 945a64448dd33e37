use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use rosettafs_config::{log_cli_debug, log_cli_info, Config};
use rosettafs_fuse::{is_regular_file, CallTracer, LoadError, RosettaFs};

use crate::binfmt;

#[derive(Args, Debug)]
pub struct MountArgs {
    /// Path to the rosetta binary to mount
    #[arg(value_name = "ROSETTA_BINARY", required_unless_present = "print_config")]
    pub rosetta_binary: Option<PathBuf>,
}

/// Load the binary and mount the filesystem over it.
///
/// Blocks until the filesystem is unmounted.
pub fn run(binary: &Path, config: &Config) -> Result<()> {
    if !is_regular_file(binary) {
        return Err(LoadError::SourceFileMissing {
            path: binary.to_path_buf(),
        }
        .into());
    }

    let span = tracing::info_span!("rosettafs", binary = %binary.display());
    let fs = RosettaFs::load(binary, CallTracer::new(span))?;

    log_cli_info!(
        "Created mount, to test you can run the binary. To register the binfmt handler run the command below",
        path = tracing::field::display(binary.display()),
    );
    log_cli_info!(
        "binfmt registration",
        command = tracing::field::display(binfmt::install_command(&config.binfmt.name, binary)),
    );
    log_cli_debug!(
        "Mount options",
        fsname = config.mount.fsname.as_str(),
    );

    fs.mount(&config.mount.fsname)
        .with_context(|| format!("Failed to mount over {}", binary.display()))
}
