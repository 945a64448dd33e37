//! End-to-end tests for the driver, loading real files from disk.

use std::io::Write;
use std::path::Path;

use rosettafs_fuse::{
    CallTracer, FsError, IoctlBuf, LoadError, Op, Reply, RosettaFs, CONTROL_CODE, FILE_HANDLE,
    HANDSHAKE_TOKEN, VIRTUAL_PATH,
};
use tempfile::NamedTempFile;

fn source(bytes: &[u8]) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(bytes).unwrap();
    f.flush().unwrap();
    f
}

fn root() -> &'static Path {
    Path::new(VIRTUAL_PATH)
}

fn read(fs: &RosettaFs, size: u32, offset: u64, fh: u64) -> Vec<u8> {
    match fs.dispatch(Op::Read {
        path: root(),
        size,
        offset,
        fh,
    }) {
        Ok(Reply::Data(data)) => data.to_vec(),
        other => panic!("unexpected read result: {other:?}"),
    }
}

fn getattr_size(fs: &RosettaFs) -> u64 {
    match fs.dispatch(Op::Getattr { path: root() }) {
        Ok(Reply::Attr(attr)) => attr.size,
        other => panic!("unexpected getattr result: {other:?}"),
    }
}

fn handshake(fs: &RosettaFs) -> Vec<u8> {
    let mut buf = vec![0u8; HANDSHAKE_TOKEN.len()];
    let reply = fs
        .dispatch(Op::Ioctl {
            path: root(),
            cmd: CONTROL_CODE,
            in_len: 0,
            out: IoctlBuf(&mut buf),
            flags: 0,
        })
        .unwrap();
    assert_eq!(
        reply,
        Reply::Ioctl {
            result: 0,
            written: HANDSHAKE_TOKEN.len()
        }
    );
    buf
}

/// 1000-byte source: reads clip at the end, attributes report the length
#[test]
fn test_thousand_byte_source() {
    let content: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
    let f = source(&content);
    let fs = RosettaFs::load(f.path(), CallTracer::disabled()).unwrap();

    let tail = read(&fs, 2000, 500, FILE_HANDLE);
    assert_eq!(tail.len(), 500);
    assert_eq!(tail, &content[500..1000]);

    assert!(read(&fs, 10, 1000, FILE_HANDLE).is_empty());
    assert_eq!(getattr_size(&fs), 1000);
}

/// A binary without the handshake text still mounts and still answers
#[test]
fn test_source_without_handshake() {
    let f = source(b"\x7fELF not really rosetta");
    let fs = RosettaFs::load(f.path(), CallTracer::disabled()).unwrap();

    assert_eq!(handshake(&fs), HANDSHAKE_TOKEN);
    assert_eq!(getattr_size(&fs), 23);
}

#[test]
fn test_handles_carry_no_state() {
    let f = source(b"0123456789abcdef");
    let fs = RosettaFs::load(f.path(), CallTracer::disabled()).unwrap();

    let fh = match fs.dispatch(Op::Open {
        path: root(),
        flags: libc::O_RDONLY,
    }) {
        Ok(Reply::Opened { fh }) => fh,
        other => panic!("unexpected open result: {other:?}"),
    };

    let first = read(&fs, 8, 4, fh);
    let second = read(&fs, 8, 4, fh.wrapping_add(41));
    assert_eq!(first, b"456789ab");
    assert_eq!(first, second);
}

/// Calls in any order leave attributes unchanged
#[test]
fn test_no_state_leakage() {
    let mut content = vec![0u8; 300];
    content[100..100 + HANDSHAKE_TOKEN.len()].copy_from_slice(HANDSHAKE_TOKEN);
    let f = source(&content);
    let fs = RosettaFs::load(f.path(), CallTracer::disabled()).unwrap();

    let before = *fs.attributes();
    handshake(&fs);
    read(&fs, 64, 0, 7);
    let _ = fs.dispatch(Op::Readdir {
        path: root(),
        fh: 0,
    });
    handshake(&fs);

    match fs.dispatch(Op::Getattr { path: root() }) {
        Ok(Reply::Attr(attr)) => {
            assert_eq!(attr, before);
            assert_eq!(attr.size, 300);
            assert_eq!(attr.perm(), 0o755);
            assert!(attr.is_regular_file());
            assert_eq!(attr.nlink, 1);
        }
        other => panic!("unexpected getattr result: {other:?}"),
    }
    assert_eq!(read(&fs, 300, 0, 0), content);
}

#[test]
fn test_attributes_mirror_source() {
    use std::os::unix::fs::MetadataExt;

    let f = source(&[1u8; 64]);
    let meta = std::fs::metadata(f.path()).unwrap();
    let fs = RosettaFs::load(f.path(), CallTracer::disabled()).unwrap();
    let attr = fs.attributes();

    assert_eq!(attr.uid, meta.uid());
    assert_eq!(attr.gid, meta.gid());
    assert_eq!(attr.mtime, meta.modified().unwrap());
}

/// Source links are never advertised
#[test]
fn test_link_count_forced() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("rosetta");
    std::fs::write(&target, b"bin").unwrap();
    std::fs::hard_link(&target, dir.path().join("rosetta-link")).unwrap();

    let fs = RosettaFs::load(&target, CallTracer::disabled()).unwrap();
    assert_eq!(fs.attributes().nlink, 1);
}

#[test]
fn test_missing_source_prevents_mount() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("rosetta");

    let err = RosettaFs::load(&missing, CallTracer::disabled())
        .err()
        .expect("load must fail");
    assert!(matches!(err, LoadError::SourceFileMissing { .. }));
    assert!(err.to_string().contains("Rosetta binary not found"));
}

#[test]
fn test_errors_map_to_errno() {
    let f = source(b"x");
    let fs = RosettaFs::load(f.path(), CallTracer::disabled()).unwrap();
    let other = Path::new("/other");

    let errno = |op| fs.dispatch(op).unwrap_err().errno();
    assert_eq!(errno(Op::Getattr { path: other }), libc::ENOENT);
    assert_eq!(errno(Op::Open { path: other, flags: 0 }), libc::ENOENT);
    assert_eq!(
        errno(Op::Read {
            path: other,
            size: 1,
            offset: 0,
            fh: 0
        }),
        libc::EIO
    );
    assert_eq!(errno(Op::Readdir { path: root(), fh: 0 }), libc::ENOTDIR);

    let mut buf = [0u8; 128];
    assert_eq!(
        fs.dispatch(Op::Ioctl {
            path: root(),
            cmd: 0x4004_6601,
            in_len: 0,
            out: IoctlBuf(&mut buf),
            flags: 0,
        }),
        Err(FsError::UnsupportedControl { cmd: 0x4004_6601 })
    );
}
