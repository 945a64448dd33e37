//! binfmt_misc registration hint printed at startup.
//!
//! Nothing here touches binfmt_misc; the administrator runs the command.

use std::fmt::Write;
use std::path::Path;

/// ELF64, little-endian, version 1, ET_EXEC/ET_DYN, EM_X86_64
pub const ELF_X86_64_MAGIC: [u8; 20] = [
    0x7f, b'E', b'L', b'F', 0x02, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x3e, 0x00,
];

/// Skips EI_OSABI and the low bit of EI_DATA, EI_VERSION and `e_type`
pub const ELF_X86_64_MASK: [u8; 20] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xfe, 0xfe, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xfe, 0xff, 0xff, 0xff,
];

/// `\xNN`-escape everything except ASCII alphanumerics
pub fn escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 4);
    for &b in bytes {
        if b.is_ascii_alphanumeric() {
            out.push(b as char);
        } else {
            let _ = write!(out, "\\x{b:02x}");
        }
    }
    out
}

/// `update-binfmts` invocation registering `interpreter` for x86-64 ELF
pub fn install_command(name: &str, interpreter: &Path) -> String {
    format!(
        "sudo update-binfmts --install {name} {} --magic \"{}\" --mask \"{}\" --credentials yes --preserve no --fix-binary no",
        interpreter.display(),
        escape(&ELF_X86_64_MAGIC),
        escape(&ELF_X86_64_MASK),
    )
}
