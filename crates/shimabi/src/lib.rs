//! # Shimabi
//!
//! The `wasi_snapshot_preview1` ABI as plain data.
//!
//! ## Philosophy
//!
//! - **Wire contract first**: every numeric value here is fixed by the WASI ABI.
//!   Guests are compiled against these numbers; nothing is ever renumbered.
//! - **No engine**: this crate knows nothing about Wasm engines or host OSes.
//! - **Explicit layouts**: structs written into guest memory are encoded field
//!   by field into little-endian byte arrays, never transmuted.

#[macro_use]
mod macros;

pub mod enums;
pub mod errno;
pub mod flags;
pub mod layout;

pub use enums::Advice;
pub use enums::Clockid;
pub use enums::Eventtype;
pub use enums::Filetype;
pub use enums::Preopentype;
pub use enums::Whence;
pub use errno::Errno;
pub use flags::Fdflags;
pub use flags::Fstflags;
pub use flags::Lookupflags;
pub use flags::Oflags;
pub use flags::Riflags;
pub use flags::Rights;
pub use flags::Roflags;
pub use flags::Sdflags;
pub use flags::Siflags;
pub use flags::Subclockflags;
pub use layout::Ciovec;
pub use layout::Dirent;
pub use layout::Fdstat;
pub use layout::Filestat;
pub use layout::Iovec;
pub use layout::Prestat;

/// Guest-side `size` (`__wasi_size_t`).
pub type Size = u32;
/// Guest-side file descriptor.
pub type Fd = u32;
/// Nanosecond timestamp.
pub type Timestamp = u64;
/// File size or offset.
pub type Filesize = u64;
/// Signed file offset delta.
pub type Filedelta = i64;
/// Directory cookie; `DIRCOOKIE_START` begins a listing.
pub type Dircookie = u64;
/// Process exit status passed to `proc_exit`.
pub type Exitcode = u32;

pub const DIRCOOKIE_START: Dircookie = 0;

/// The import module name every preview1 function lives under.
pub const MODULE: &str = "wasi_snapshot_preview1";
