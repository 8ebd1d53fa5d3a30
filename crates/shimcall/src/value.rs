//! # Tagged values
//!
//! The engine passes arguments and result slots as `wasmtime::Val`, a tagged
//! union. The kinds the preview1 ABI can carry are a closed subset of it.
//!
//! ## Philosophy
//!
//! - **Arguments are trusted to match**: the engine type-checks the call
//!   against the import's declared type, so a mismatched argument is a host
//!   bug and traps.
//! - **Result slots are not**: the slot handed to a host function is
//!   pre-filled with an arbitrary kind. It is corrected to the declared kind
//!   before anything is written into it.

use tracing::debug;
use tracing::warn;
use wasmtime::Val;
use wasmtime::ValType;

use crate::diagnostics::Diagnostics;
use crate::trap::ShimTrap;

/// Kinds of value that may cross the preview1 boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValKind {
    I32,
    I64,
    F32,
    F64,
    FuncRef,
    ExternRef,
}

impl ValKind {
    /// Kind of a runtime value, `None` for v128 and GC references.
    pub fn of(val: &Val) -> Option<Self> {
        match val {
            Val::I32(_) => Some(Self::I32),
            Val::I64(_) => Some(Self::I64),
            Val::F32(_) => Some(Self::F32),
            Val::F64(_) => Some(Self::F64),
            Val::FuncRef(_) => Some(Self::FuncRef),
            Val::ExternRef(_) => Some(Self::ExternRef),
            _ => None,
        }
    }

    pub fn from_val_type(ty: &ValType) -> Option<Self> {
        match ty {
            ValType::I32 => Some(Self::I32),
            ValType::I64 => Some(Self::I64),
            ValType::F32 => Some(Self::F32),
            ValType::F64 => Some(Self::F64),
            ty if ty.is_funcref() => Some(Self::FuncRef),
            ty if ty.is_externref() => Some(Self::ExternRef),
            _ => None,
        }
    }

    pub fn val_type(self) -> ValType {
        match self {
            Self::I32 => ValType::I32,
            Self::I64 => ValType::I64,
            Self::F32 => ValType::F32,
            Self::F64 => ValType::F64,
            Self::FuncRef => ValType::FUNCREF,
            Self::ExternRef => ValType::EXTERNREF,
        }
    }

    /// The neutral value of this kind: zero, or a null reference.
    pub fn zero(self) -> Val {
        match self {
            Self::I32 => Val::I32(0),
            Self::I64 => Val::I64(0),
            Self::F32 => Val::F32(0),
            Self::F64 => Val::F64(0),
            Self::FuncRef => Val::FuncRef(None),
            Self::ExternRef => Val::ExternRef(None),
        }
    }
}

impl std::fmt::Display for ValKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::FuncRef => "funcref",
            Self::ExternRef => "externref",
        };
        f.write_str(s)
    }
}

/// Makes `slot` hold a value of kind `expected`.
///
/// Returns `true` when the slot had to be overwritten. The first coercion for
/// each `func` is logged; every coercion is counted.
pub fn fix_result_discriminant(
    slot: &mut Val,
    expected: ValKind,
    func: &str,
    diagnostics: &mut Diagnostics,
) -> bool {
    let actual = ValKind::of(slot);
    if actual == Some(expected) {
        return false;
    }

    let prefilled = is_engine_prefill(slot);
    *slot = expected.zero();
    if diagnostics.record_coercion(func) {
        let found = actual.map_or_else(|| "unrepresentable".to_string(), |k| k.to_string());
        if prefilled {
            debug!(func, %expected, found, "replacing engine placeholder in result slot");
        } else {
            warn!(func, %expected, found, "result slot had the wrong kind, fixing");
        }
    }
    true
}

/// wasmtime hands host functions result slots holding a null funcref.
pub fn is_engine_prefill(slot: &Val) -> bool {
    matches!(slot, Val::FuncRef(None))
}

/// Positional access to a host call's arguments.
#[derive(Clone, Copy)]
pub struct Args<'a> {
    func: &'static str,
    vals: &'a [Val],
}

impl<'a> Args<'a> {
    pub fn new(func: &'static str, vals: &'a [Val]) -> Self {
        Self { func, vals }
    }

    pub fn len(&self) -> usize {
        self.vals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vals.is_empty()
    }

    pub fn as_slice(&self) -> &'a [Val] {
        self.vals
    }

    pub fn i32(&self, index: usize) -> Result<i32, ShimTrap> {
        match self.vals.get(index) {
            Some(Val::I32(v)) => Ok(*v),
            other => Err(self.mismatch(index, ValKind::I32, other)),
        }
    }

    /// An `i32` argument reinterpreted as unsigned, as pointers and sizes are.
    pub fn u32(&self, index: usize) -> Result<u32, ShimTrap> {
        self.i32(index).map(|v| v as u32)
    }

    pub fn i64(&self, index: usize) -> Result<i64, ShimTrap> {
        match self.vals.get(index) {
            Some(Val::I64(v)) => Ok(*v),
            other => Err(self.mismatch(index, ValKind::I64, other)),
        }
    }

    pub fn u64(&self, index: usize) -> Result<u64, ShimTrap> {
        self.i64(index).map(|v| v as u64)
    }

    fn mismatch(&self, index: usize, wanted: ValKind, found: Option<&Val>) -> ShimTrap {
        let found = match found {
            None => "nothing".to_string(),
            Some(val) => ValKind::of(val).map_or_else(|| "unrepresentable".to_string(), |k| k.to_string()),
        };
        ShimTrap::Invariant(format!(
            "{}: argument {} should be {}, found {}",
            self.func, index, wanted, found
        ))
    }
}
