//! In-memory copy of the real binary served by the virtual file.

use std::fs::{self, File, Metadata};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::error::LoadError;

/// Immutable snapshot of the source binary taken at mount time
#[derive(Debug)]
pub struct BackingFile {
    path: PathBuf,
    content: Box<[u8]>,
    metadata: Metadata,
}

impl BackingFile {
    /// Read the whole file at `path` into memory.
    ///
    /// Content and metadata come from the same open handle so the advertised
    /// size cannot drift from the bytes actually served.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref().to_path_buf();

        let mut file = File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LoadError::SourceFileMissing { path: path.clone() },
            _ => LoadError::Io {
                path: path.clone(),
                source: e,
            },
        })?;

        let metadata = file.metadata().map_err(|e| LoadError::Io {
            path: path.clone(),
            source: e,
        })?;
        if !metadata.is_file() {
            return Err(LoadError::NotRegularFile { path });
        }

        let mut content = Vec::with_capacity(metadata.len() as usize);
        file.read_to_end(&mut content).map_err(|e| LoadError::Io {
            path: path.clone(),
            source: e,
        })?;

        Ok(Self {
            path,
            content: content.into_boxed_slice(),
            metadata,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// OS metadata captured alongside the content
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Whether `needle` occurs anywhere in the loaded bytes
    pub fn contains(&self, needle: &[u8]) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.content.windows(needle.len()).any(|w| w == needle)
    }

    /// Bytes in `[offset, offset + size)`, clipped to the content bounds
    pub fn slice(&self, offset: u64, size: u32) -> &[u8] {
        let len = self.content.len();
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(len);
        let end = start.saturating_add(size as usize).min(len);
        &self.content[start..end]
    }
}

/// Whether `path` names an existing regular file (symlinks followed)
pub fn is_regular_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}
