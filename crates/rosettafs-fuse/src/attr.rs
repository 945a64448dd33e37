//! Attributes advertised for the virtual file.
//!
//! Everything is mirrored from the source binary except the fields listed in
//! [`AttrOverrides`], which are forced regardless of what the source reports.

use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Raw fields read from the source file's metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceStat {
    pub size: u64,
    pub uid: u32,
    pub gid: u32,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
}

impl SourceStat {
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self {
            size: meta.size(),
            uid: meta.uid(),
            gid: meta.gid(),
            atime: unix_time(meta.atime(), meta.atime_nsec()),
            mtime: unix_time(meta.mtime(), meta.mtime_nsec()),
            ctime: unix_time(meta.ctime(), meta.ctime_nsec()),
        }
    }
}

fn unix_time(secs: i64, nsecs: i64) -> SystemTime {
    let nanos = Duration::from_nanos(nsecs.clamp(0, 999_999_999) as u64);
    if secs >= 0 {
        UNIX_EPOCH + Duration::from_secs(secs as u64) + nanos
    } else {
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs()) + nanos
    }
}

/// Fields forced onto the mirrored attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrOverrides {
    pub mode: u32,
    pub nlink: u32,
}

impl AttrOverrides {
    /// Regular file, rwxr-xr-x, single link
    pub const EXECUTABLE: AttrOverrides = AttrOverrides {
        mode: libc::S_IFREG as u32 | 0o755,
        nlink: 1,
    };
}

/// Metadata of the single virtual file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAttributes {
    pub size: u64,
    /// File type bits plus permission bits
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
    pub nlink: u32,
}

impl FileAttributes {
    /// Mirror `source`, apply `overrides`, and advertise `size` bytes
    pub fn derive(source: &SourceStat, overrides: AttrOverrides, size: u64) -> Self {
        Self {
            size,
            mode: overrides.mode,
            uid: source.uid,
            gid: source.gid,
            atime: source.atime,
            mtime: source.mtime,
            ctime: source.ctime,
            nlink: overrides.nlink,
        }
    }

    /// Permission bits only
    pub fn perm(&self) -> u16 {
        (self.mode & 0o7777) as u16
    }

    pub fn is_regular_file(&self) -> bool {
        self.mode & libc::S_IFMT as u32 == libc::S_IFREG as u32
    }
}
