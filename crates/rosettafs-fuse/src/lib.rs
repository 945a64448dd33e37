//! # rosettafs-fuse
//!
//! FUSE filesystem exposing a single file: an in-memory copy of the Rosetta
//! binary, mounted over the binary's own path.
//!
//! - Reads are served from the copy loaded at mount time.
//! - Metadata mirrors the real file, forced to a single-link `0755` regular file.
//! - The one ioctl Rosetta uses to detect virtualization is answered with
//!   the handshake the hardware-backed driver would give.
//! - Everything else is rejected with the errno a kernel filesystem would use.

pub mod attr;
pub mod backing;
pub mod driver;
pub mod error;
pub mod handshake;
pub mod mount;
pub mod trace;

pub use attr::{AttrOverrides, FileAttributes, SourceStat};
pub use backing::{is_regular_file, BackingFile};
pub use driver::{IoctlBuf, Op, Reply, RosettaFs, FILE_HANDLE, VIRTUAL_PATH};
pub use error::{FsError, LoadError};
pub use handshake::{HandshakeInterceptor, CONTROL_CODE, HANDSHAKE_TOKEN};
pub use trace::CallTracer;
