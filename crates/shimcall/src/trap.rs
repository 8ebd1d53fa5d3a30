//! # Traps and call outcomes
//!
//! A host call ends in exactly one of two ways the guest can observe: an
//! errno written to its result slot, or a trap that unwinds the guest. The two
//! never mix. [`CallError`] keeps them apart inside handlers; only the
//! dispatcher turns a `Trap` into a `wasmtime::Error`.

use shimabi::Errno;

/// Conditions that abort the guest instead of returning an errno.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShimTrap {
    /// A call that the active policy refuses to answer.
    NotImplemented(&'static str),
    /// `proc_exit` was called with this status.
    ProcExit(i32),
    /// An import slot left unbound was invoked.
    UnresolvedImport(String),
    /// The engine handed a handler arguments that contradict its signature.
    Invariant(String),
}

impl std::fmt::Display for ShimTrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotImplemented(name) => write!(f, "{} is not implemented", name),
            Self::ProcExit(code) => write!(f, "proc_exit({})", code),
            Self::UnresolvedImport(import) => write!(f, "called unresolved import {}", import),
            Self::Invariant(details) => write!(f, "host call invariant violated: {}", details),
        }
    }
}

impl std::error::Error for ShimTrap {}

impl ShimTrap {
    /// Exit status if this trap is a `proc_exit`.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ProcExit(code) => Some(*code),
            _ => None,
        }
    }
}

/// Why a handler did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    Errno(Errno),
    Trap(ShimTrap),
}

impl From<Errno> for CallError {
    fn from(e: Errno) -> Self {
        Self::Errno(e)
    }
}

impl From<ShimTrap> for CallError {
    fn from(t: ShimTrap) -> Self {
        Self::Trap(t)
    }
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Errno(e) => write!(f, "{}", e.name()),
            Self::Trap(t) => write!(f, "trap: {}", t),
        }
    }
}

pub type CallResult = std::result::Result<(), CallError>;
