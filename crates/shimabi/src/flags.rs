//! # Flags
//!
//! Bit sets of the preview1 ABI. `Rights` is the capability model: every
//! descriptor carries a base set (what it may do) and an inheriting set (what
//! descriptors derived from it may do). A derived set is always the
//! intersection of what was requested and what the parent allows.

use crate::errno::Errno;

bitflags::bitflags! {
    /// File descriptor rights.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Rights: u64 {
        const FD_DATASYNC = 1 << 0;
        const FD_READ = 1 << 1;
        const FD_SEEK = 1 << 2;
        const FD_FDSTAT_SET_FLAGS = 1 << 3;
        const FD_SYNC = 1 << 4;
        const FD_TELL = 1 << 5;
        const FD_WRITE = 1 << 6;
        const FD_ADVISE = 1 << 7;
        const FD_ALLOCATE = 1 << 8;
        const PATH_CREATE_DIRECTORY = 1 << 9;
        const PATH_CREATE_FILE = 1 << 10;
        const PATH_LINK_SOURCE = 1 << 11;
        const PATH_LINK_TARGET = 1 << 12;
        const PATH_OPEN = 1 << 13;
        const FD_READDIR = 1 << 14;
        const PATH_READLINK = 1 << 15;
        const PATH_RENAME_SOURCE = 1 << 16;
        const PATH_RENAME_TARGET = 1 << 17;
        const PATH_FILESTAT_GET = 1 << 18;
        const PATH_FILESTAT_SET_SIZE = 1 << 19;
        const PATH_FILESTAT_SET_TIMES = 1 << 20;
        const FD_FILESTAT_GET = 1 << 21;
        const FD_FILESTAT_SET_SIZE = 1 << 22;
        const FD_FILESTAT_SET_TIMES = 1 << 23;
        const PATH_SYMLINK = 1 << 24;
        const PATH_REMOVE_DIRECTORY = 1 << 25;
        const PATH_UNLINK_FILE = 1 << 26;
        const POLL_FD_READWRITE = 1 << 27;
        const SOCK_SHUTDOWN = 1 << 28;
        const SOCK_ACCEPT = 1 << 29;
    }
}

impl Rights {
    /// Operations that apply to TTYs.
    pub const TTY_BASE: Rights = Rights::FD_READ
        .union(Rights::FD_FDSTAT_SET_FLAGS)
        .union(Rights::FD_WRITE)
        .union(Rights::FD_FILESTAT_GET)
        .union(Rights::POLL_FD_READWRITE);

    /// TTYs hand nothing down.
    pub const TTY_INHERITING: Rights = Rights::empty();

    /// Rights for a descriptor derived from a parent whose inheriting set is
    /// `parent_inheriting`. Never wider than either input.
    pub fn derive(parent_inheriting: Rights, requested: Rights) -> Rights {
        parent_inheriting & requested
    }

    /// Fails with `e_notcapable` if any bit of `needed` is absent from `have`.
    pub fn require(have: Rights, needed: Rights) -> Result<(), Errno> {
        if have.contains(needed) {
            Ok(())
        } else {
            Err(Errno::Notcapable)
        }
    }
}

bitflags::bitflags! {
    /// File descriptor flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Fdflags: u16 {
        const APPEND = 1 << 0;
        const DSYNC = 1 << 1;
        const NONBLOCK = 1 << 2;
        const RSYNC = 1 << 3;
        const SYNC = 1 << 4;
    }
}

bitflags::bitflags! {
    /// Open flags used by `path_open`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Oflags: u16 {
        const CREAT = 1 << 0;
        const DIRECTORY = 1 << 1;
        const EXCL = 1 << 2;
        const TRUNC = 1 << 3;
    }
}

bitflags::bitflags! {
    /// Flags determining the method of how paths are resolved.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Lookupflags: u32 {
        const SYMLINK_FOLLOW = 1 << 0;
    }
}

bitflags::bitflags! {
    /// Which file time attributes to adjust.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Fstflags: u16 {
        const ATIM = 1 << 0;
        const ATIM_NOW = 1 << 1;
        const MTIM = 1 << 2;
        const MTIM_NOW = 1 << 3;
    }
}

bitflags::bitflags! {
    /// Flags provided to `sock_recv`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Riflags: u16 {
        const RECV_PEEK = 1 << 0;
        const RECV_WAITALL = 1 << 1;
    }
}

bitflags::bitflags! {
    /// Flags returned by `sock_recv`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Roflags: u16 {
        const RECV_DATA_TRUNCATED = 1 << 0;
    }
}

bitflags::bitflags! {
    /// Flags provided to `sock_send`. None are defined yet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Siflags: u16 {
    }
}

bitflags::bitflags! {
    /// Which channels of a socket to shut down.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Sdflags: u8 {
        const RD = 1 << 0;
        const WR = 1 << 1;
    }
}

bitflags::bitflags! {
    /// Flags determining how to interpret the timestamp of a clock subscription.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Subclockflags: u16 {
        const SUBSCRIPTION_CLOCK_ABSTIME = 1 << 0;
    }
}
