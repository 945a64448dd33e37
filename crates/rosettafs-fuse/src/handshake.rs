//! Answer to Rosetta's virtualization check.
//!
//! Rosetta issues `_IOR('a', 0x22, [u8; 69])` against its own binary and
//! refuses to run unless the reply matches the string the hardware-backed
//! driver returns.
//!
//! Ref: <https://threedots.ovh/blog/2022/06/quick-look-at-rosetta-on-linux/>

use rosettafs_config::{log_fs_debug, log_fs_error};

use crate::error::{FsError, Result};

/// ioctl request code of the virtualization check
pub const CONTROL_CODE: u32 = 0x8045_6122;

/// Payload written back for [`CONTROL_CODE`]
pub const HANDSHAKE_TOKEN: &[u8; 69] =
    b"Our hard work\nby these words guarded\nplease don't steal\n\xc2\xa9 Apple Inc\0";

#[derive(Debug, Clone, Copy)]
pub struct HandshakeInterceptor {
    code: u32,
    token: &'static [u8],
}

impl Default for HandshakeInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl HandshakeInterceptor {
    pub const fn new() -> Self {
        Self {
            code: CONTROL_CODE,
            token: HANDSHAKE_TOKEN,
        }
    }

    pub fn token(&self) -> &'static [u8] {
        self.token
    }

    /// Write the token into `out` when `cmd` is the handshake code.
    ///
    /// Returns the number of bytes written. `out` must hold the whole token;
    /// nothing is written otherwise.
    pub fn respond(&self, cmd: u32, out: &mut [u8]) -> Result<usize> {
        if cmd != self.code {
            log_fs_error!(
                "Unsupported ioctl, the virtualization check probably changed",
                cmd = tracing::field::display(format!("{cmd:#x}")),
            );
            return Err(FsError::UnsupportedControl { cmd });
        }

        let needed = self.token.len();
        let available = out.len();
        let Some(dst) = out.get_mut(..needed) else {
            return Err(FsError::BufferTooSmall { needed, available });
        };

        log_fs_debug!("Handling rosetta handshake");
        dst.copy_from_slice(self.token);
        Ok(needed)
    }
}
