use std::io;
use std::path::PathBuf;

use libc::c_int;
use thiserror::Error;

/// Per-call failures returned to the transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("no such entry")]
    NotFound,

    #[error("not a directory")]
    NotADirectory,

    #[error("I/O error")]
    Io,

    #[error("inappropriate ioctl for device: {cmd:#x}")]
    UnsupportedControl { cmd: u32 },

    #[error("ioctl buffer too small: need {needed} bytes, got {available}")]
    BufferTooSmall { needed: usize, available: usize },
}

impl FsError {
    /// Errno the kernel transport reports to the caller
    pub fn errno(&self) -> c_int {
        match self {
            FsError::NotFound => libc::ENOENT,
            FsError::NotADirectory => libc::ENOTDIR,
            FsError::Io => libc::EIO,
            FsError::UnsupportedControl { .. } => libc::ENOTTY,
            FsError::BufferTooSmall { .. } => libc::EINVAL,
        }
    }
}

pub type Result<T> = std::result::Result<T, FsError>;

/// Startup failures; any of these prevents the mount
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Rosetta binary not found: {}", path.display())]
    SourceFileMissing { path: PathBuf },

    #[error("Not a regular file: {}", path.display())]
    NotRegularFile { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}
