//! Kernel transport: serves [`RosettaFs`](crate::RosettaFs) through FUSE.
//!
//! The mount root (inode 1) is the virtual file itself, so it is mounted
//! directly over the source binary's path. No other inode is ever handed out.

#[cfg(all(feature = "fuse", target_os = "linux"))]
mod imp {
    use std::borrow::Cow;
    use std::ffi::OsStr;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use fuser::{
        FileAttr, FileType, Filesystem, MountOption, ReplyAttr, ReplyData, ReplyDirectory,
        ReplyEntry, ReplyIoctl, ReplyOpen, Request, FUSE_ROOT_ID,
    };
    use libc::{c_int, EINVAL, EIO, ENOENT};

    use crate::attr::FileAttributes;
    use crate::driver::{IoctlBuf, Op, Reply, RosettaFs, VIRTUAL_PATH};

    const TTL: Duration = Duration::from_secs(60);
    const BLOCK_SIZE: u32 = 4096;

    /// Inode to driver path. Only the root has a name; other inodes get a
    /// relative placeholder that can never resolve.
    fn path_of(ino: u64) -> Cow<'static, Path> {
        if ino == FUSE_ROOT_ID {
            Cow::Borrowed(Path::new(VIRTUAL_PATH))
        } else {
            Cow::Owned(PathBuf::from(format!("#{ino}")))
        }
    }

    pub(crate) fn to_file_attr(attr: &FileAttributes) -> FileAttr {
        FileAttr {
            ino: FUSE_ROOT_ID,
            size: attr.size,
            blocks: attr.size.div_ceil(512),
            atime: attr.atime,
            mtime: attr.mtime,
            ctime: attr.ctime,
            crtime: attr.mtime,
            kind: FileType::RegularFile,
            perm: attr.perm(),
            nlink: attr.nlink,
            uid: attr.uid,
            gid: attr.gid,
            rdev: 0,
            flags: 0,
            blksize: BLOCK_SIZE,
        }
    }

    /// Options for the one mount this process makes.
    ///
    /// fuse3 accepts non-empty mountpoints without the legacy `nonempty`
    /// flag, and `fusermount3` rejects it, so it is not passed.
    pub fn mount_options(fsname: &str) -> Vec<MountOption> {
        vec![
            MountOption::RO,
            MountOption::Exec,
            MountOption::AllowOther,
            MountOption::FSName(fsname.to_string()),
        ]
    }

    impl RosettaFs {
        /// Mount over the source binary and serve requests until unmounted
        /// (Ref: <https://docs.rs/fuser>)
        ///
        /// `fuser::mount2` runs a single-threaded session in the calling
        /// thread, so requests are handled one at a time.
        pub fn mount(self, fsname: &str) -> anyhow::Result<()> {
            let mountpoint = self.source_path().to_path_buf();
            fuser::mount2(self, &mountpoint, &mount_options(fsname))?;
            Ok(())
        }
    }

    fn attr_reply(fs: &RosettaFs, ino: u64) -> Result<FileAttr, c_int> {
        match fs.dispatch(Op::Getattr {
            path: &path_of(ino),
        }) {
            Ok(Reply::Attr(attr)) => Ok(to_file_attr(&attr)),
            Ok(_) => Err(EIO),
            Err(e) => Err(e.errno()),
        }
    }

    fn open_reply(fs: &RosettaFs, ino: u64, flags: i32) -> Result<u64, c_int> {
        match fs.dispatch(Op::Open {
            path: &path_of(ino),
            flags,
        }) {
            Ok(Reply::Opened { fh }) => Ok(fh),
            Ok(_) => Err(EIO),
            Err(e) => Err(e.errno()),
        }
    }

    fn read_reply(
        fs: &RosettaFs,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
    ) -> Result<&[u8], c_int> {
        let offset = u64::try_from(offset).map_err(|_| EINVAL)?;
        match fs.dispatch(Op::Read {
            path: &path_of(ino),
            size,
            offset,
            fh,
        }) {
            Ok(Reply::Data(data)) => Ok(data),
            Ok(_) => Err(EIO),
            Err(e) => Err(e.errno()),
        }
    }

    /// Listing never succeeds; the errno to report
    fn readdir_reply(fs: &RosettaFs, ino: u64, fh: u64) -> c_int {
        match fs.dispatch(Op::Readdir {
            path: &path_of(ino),
            fh,
        }) {
            Ok(_) => EIO,
            Err(e) => e.errno(),
        }
    }

    /// Result code and the bytes to copy back, at most `out_size` of them
    fn ioctl_reply(
        fs: &RosettaFs,
        ino: u64,
        flags: u32,
        cmd: u32,
        in_data: &[u8],
        out_size: u32,
    ) -> Result<(i32, Vec<u8>), c_int> {
        let mut out = vec![0u8; out_size as usize];
        match fs.dispatch(Op::Ioctl {
            path: &path_of(ino),
            cmd,
            in_len: in_data.len(),
            out: IoctlBuf(&mut out),
            flags,
        }) {
            Ok(Reply::Ioctl { result, written }) => {
                out.truncate(written);
                Ok((result, out))
            }
            Ok(_) => Err(EIO),
            Err(e) => Err(e.errno()),
        }
    }

    impl Filesystem for RosettaFs {
        fn lookup(&mut self, _req: &Request, _parent: u64, _name: &OsStr, reply: ReplyEntry) {
            reply.error(ENOENT);
        }

        fn getattr(&mut self, _req: &Request, ino: u64, reply: ReplyAttr) {
            match attr_reply(self, ino) {
                Ok(attr) => reply.attr(&TTL, &attr),
                Err(errno) => reply.error(errno),
            }
        }

        fn open(&mut self, _req: &Request, ino: u64, flags: i32, reply: ReplyOpen) {
            match open_reply(self, ino, flags) {
                Ok(fh) => reply.opened(fh, 0),
                Err(errno) => reply.error(errno),
            }
        }

        fn read(
            &mut self,
            _req: &Request,
            ino: u64,
            fh: u64,
            offset: i64,
            size: u32,
            _flags: c_int,
            _lock_owner: Option<u64>,
            reply: ReplyData,
        ) {
            match read_reply(self, ino, fh, offset, size) {
                Ok(data) => reply.data(data),
                Err(errno) => reply.error(errno),
            }
        }

        fn readdir(
            &mut self,
            _req: &Request,
            ino: u64,
            fh: u64,
            _offset: i64,
            reply: ReplyDirectory,
        ) {
            reply.error(readdir_reply(self, ino, fh));
        }

        fn ioctl(
            &mut self,
            _req: &Request,
            ino: u64,
            _fh: u64,
            flags: u32,
            cmd: u32,
            in_data: &[u8],
            out_size: u32,
            reply: ReplyIoctl,
        ) {
            match ioctl_reply(self, ino, flags, cmd, in_data, out_size) {
                Ok((result, data)) => reply.ioctl(result, &data),
                Err(errno) => reply.error(errno),
            }
        }
    }

}

#[cfg(all(feature = "fuse", target_os = "linux"))]
pub use imp::mount_options;

#[cfg(not(all(feature = "fuse", target_os = "linux")))]
mod imp {
    use crate::driver::RosettaFs;

    impl RosettaFs {
        pub fn mount(self, _fsname: &str) -> anyhow::Result<()> {
            #[cfg(not(target_os = "linux"))]
            anyhow::bail!(
                "FUSE support is only available on Linux (current: {})",
                std::env::consts::OS
            );
            #[cfg(all(target_os = "linux", not(feature = "fuse")))]
            anyhow::bail!("rosettafs-fuse was built without the `fuse` feature");
        }
    }
}
