//! Operation dispatch for the single-file filesystem.
//!
//! The namespace holds exactly one entry, the regular file at `/`. Every
//! request names its target path; anything but `/` fails before any other
//! logic runs.

use std::fmt;
use std::path::Path;

use rosettafs_config::{log_fs_info, log_fs_warn};

use crate::attr::{AttrOverrides, FileAttributes, SourceStat};
use crate::backing::BackingFile;
use crate::error::{FsError, LoadError, Result};
use crate::handshake::HandshakeInterceptor;
use crate::trace::{ByteLen, CallTracer};

/// The only path in the namespace
pub const VIRTUAL_PATH: &str = "/";

/// Handle returned by every successful open; handles carry no state
pub const FILE_HANDLE: u64 = 1;

/// Output buffer of an ioctl request
pub struct IoctlBuf<'a>(pub &'a mut [u8]);

impl fmt::Debug for IoctlBuf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} byte buffer>", self.0.len())
    }
}

/// One filesystem request as delivered by the transport
#[derive(Debug)]
pub enum Op<'a> {
    Getattr {
        path: &'a Path,
    },
    Open {
        path: &'a Path,
        flags: i32,
    },
    Read {
        path: &'a Path,
        size: u32,
        offset: u64,
        fh: u64,
    },
    Readdir {
        path: &'a Path,
        fh: u64,
    },
    Ioctl {
        path: &'a Path,
        cmd: u32,
        /// Length of the input payload; fuser does not expose the raw argument
        in_len: usize,
        out: IoctlBuf<'a>,
        flags: u32,
    },
}

impl Op<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Op::Getattr { .. } => "getattr",
            Op::Open { .. } => "open",
            Op::Read { .. } => "read",
            Op::Readdir { .. } => "readdir",
            Op::Ioctl { .. } => "ioctl",
        }
    }
}

/// Successful outcome of an [`Op`]
#[derive(PartialEq, Eq)]
pub enum Reply<'a> {
    Attr(FileAttributes),
    Opened { fh: u64 },
    Data(&'a [u8]),
    Ioctl { result: i32, written: usize },
}

impl fmt::Debug for Reply<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Attr(attr) => f.debug_tuple("Attr").field(attr).finish(),
            Reply::Opened { fh } => f.debug_struct("Opened").field("fh", fh).finish(),
            Reply::Data(data) => f.debug_tuple("Data").field(&ByteLen(data)).finish(),
            Reply::Ioctl { result, written } => f
                .debug_struct("Ioctl")
                .field("result", result)
                .field("written", written)
                .finish(),
        }
    }
}

/// The mounted filesystem: source bytes, advertised attributes, and the
/// handshake responder, all fixed at load time.
pub struct RosettaFs {
    backing: BackingFile,
    attr: FileAttributes,
    interceptor: HandshakeInterceptor,
    tracer: CallTracer,
}

impl RosettaFs {
    /// Load the binary at `path` and derive everything the driver serves
    pub fn load(
        path: impl AsRef<Path>,
        tracer: CallTracer,
    ) -> std::result::Result<Self, LoadError> {
        let backing = BackingFile::load(path)?;
        let interceptor = HandshakeInterceptor::new();

        if !backing.contains(interceptor.token()) {
            log_fs_warn!(
                "Could not find handshake in binary. Either you are mounting the wrong binary or the virtualization check changed",
                path = tracing::field::display(backing.path().display()),
            );
        }

        let stat = SourceStat::from_metadata(backing.metadata());
        if stat.size != backing.len() {
            log_fs_warn!(
                "Source changed size while loading, serving bytes actually read",
                stat_size = stat.size,
                read_size = backing.len(),
            );
        }
        let attr = FileAttributes::derive(&stat, AttrOverrides::EXECUTABLE, backing.len());

        log_fs_info!(
            "Loaded source binary",
            path = tracing::field::display(backing.path().display()),
            size = backing.len(),
        );

        Ok(Self {
            backing,
            attr,
            interceptor,
            tracer,
        })
    }

    /// Path of the binary backing the virtual file
    pub fn source_path(&self) -> &Path {
        self.backing.path()
    }

    pub fn attributes(&self) -> &FileAttributes {
        &self.attr
    }

    /// Run one request, traced on entry and exit
    pub fn dispatch(&self, op: Op<'_>) -> Result<Reply<'_>> {
        self.tracer.call(op.name(), op, |op| self.handle(op))
    }

    fn handle(&self, op: Op<'_>) -> Result<Reply<'_>> {
        match op {
            Op::Getattr { path } => {
                resolve(path, FsError::NotFound)?;
                Ok(Reply::Attr(self.attr))
            }
            Op::Open { path, flags: _ } => {
                resolve(path, FsError::NotFound)?;
                Ok(Reply::Opened { fh: FILE_HANDLE })
            }
            Op::Read {
                path,
                size,
                offset,
                fh: _,
            } => {
                resolve(path, FsError::Io)?;
                Ok(Reply::Data(self.backing.slice(offset, size)))
            }
            Op::Readdir { .. } => Err(FsError::NotADirectory),
            Op::Ioctl { path, cmd, out, .. } => {
                resolve(path, FsError::UnsupportedControl { cmd })?;
                let written = self.interceptor.respond(cmd, out.0)?;
                Ok(Reply::Ioctl { result: 0, written })
            }
        }
    }
}

fn resolve(path: &Path, miss: FsError) -> Result<()> {
    if path == Path::new(VIRTUAL_PATH) {
        Ok(())
    } else {
        Err(miss)
    }
}
