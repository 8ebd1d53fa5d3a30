//! # Layout
//!
//! Structs the shim writes into (or reads from) guest linear memory. Sizes,
//! alignments and field offsets follow the wasm32 C layout of the preview1
//! headers. Padding bytes are always written as zero.

use crate::enums::Filetype;
use crate::enums::Preopentype;
use crate::flags::Fdflags;
use crate::flags::Rights;
use crate::Dircookie;
use crate::Filesize;
use crate::Size;
use crate::Timestamp;

/// File descriptor attributes, as returned by `fd_fdstat_get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fdstat {
    pub fs_filetype: Filetype,
    pub fs_flags: Fdflags,
    pub fs_rights_base: Rights,
    pub fs_rights_inheriting: Rights,
}

impl Fdstat {
    pub const SIZE: usize = 24;
    pub const ALIGN: usize = 8;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0] = self.fs_filetype.raw();
        out[2..4].copy_from_slice(&self.fs_flags.bits().to_le_bytes());
        out[8..16].copy_from_slice(&self.fs_rights_base.bits().to_le_bytes());
        out[16..24].copy_from_slice(&self.fs_rights_inheriting.bits().to_le_bytes());
        out
    }
}

/// A directory entry header, followed in memory by `d_namlen` name bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dirent {
    pub d_next: Dircookie,
    pub d_ino: u64,
    pub d_namlen: u32,
    pub d_type: Filetype,
}

impl Dirent {
    pub const SIZE: usize = 24;
    pub const ALIGN: usize = 8;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..8].copy_from_slice(&self.d_next.to_le_bytes());
        out[8..16].copy_from_slice(&self.d_ino.to_le_bytes());
        out[16..20].copy_from_slice(&self.d_namlen.to_le_bytes());
        out[20] = self.d_type.raw();
        out
    }
}

/// File attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filestat {
    pub dev: u64,
    pub ino: u64,
    pub filetype: Filetype,
    pub nlink: u64,
    pub size: Filesize,
    pub atim: Timestamp,
    pub mtim: Timestamp,
    pub ctim: Timestamp,
}

impl Filestat {
    pub const SIZE: usize = 64;
    pub const ALIGN: usize = 8;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..8].copy_from_slice(&self.dev.to_le_bytes());
        out[8..16].copy_from_slice(&self.ino.to_le_bytes());
        out[16] = self.filetype.raw();
        out[24..32].copy_from_slice(&self.nlink.to_le_bytes());
        out[32..40].copy_from_slice(&self.size.to_le_bytes());
        out[40..48].copy_from_slice(&self.atim.to_le_bytes());
        out[48..56].copy_from_slice(&self.mtim.to_le_bytes());
        out[56..64].copy_from_slice(&self.ctim.to_le_bytes());
        out
    }
}

/// Information about a pre-opened capability. Only directories exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prestat {
    pub tag: Preopentype,
    pub pr_name_len: Size,
}

impl Prestat {
    pub const SIZE: usize = 8;
    pub const ALIGN: usize = 4;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0] = self.tag.raw();
        out[4..8].copy_from_slice(&self.pr_name_len.to_le_bytes());
        out
    }
}

/// A region of guest memory for scatter reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iovec {
    pub buf: u32,
    pub buf_len: Size,
}

/// A region of guest memory for gather writes. Same layout as [`Iovec`].
pub type Ciovec = Iovec;

impl Iovec {
    pub const SIZE: usize = 8;
    pub const ALIGN: usize = 4;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.buf.to_le_bytes());
        out[4..8].copy_from_slice(&self.buf_len.to_le_bytes());
        out
    }

    pub fn decode(bytes: [u8; Self::SIZE]) -> Self {
        let [a, b, c, d, e, f, g, h] = bytes;
        Iovec {
            buf: u32::from_le_bytes([a, b, c, d]),
            buf_len: u32::from_le_bytes([e, f, g, h]),
        }
    }
}
