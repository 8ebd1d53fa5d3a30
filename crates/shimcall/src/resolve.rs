//! # Import resolution
//!
//! Turns a module's declared imports into the positional vector wasmtime's
//! `Instance::new` expects. Slot `i` of every intermediate product corresponds
//! to declared import `i`; nothing is reordered, dropped or zero-filled.
//!
//! ## Philosophy
//!
//! - **Exact identity**: an import binds only if module, name, parameter kinds
//!   and result kinds all equal a registry entry. A near miss is unresolved.
//! - **Report, then decide**: resolution never fails on its own. It lists what
//!   is missing, and the caller picks a [`Fallback`].

use tracing::warn;
use wasmtime::Extern;
use wasmtime::ExternType;
use wasmtime::Func;
use wasmtime::Module;
use wasmtime::Store;

use crate::context::ShimCtx;
use crate::display::format_import;
use crate::registry::ImportKey;
use crate::registry::Registry;
use crate::registry::Syscall;
use crate::trap::ShimTrap;
use crate::value::ValKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Imports left without a binding, rendered one per entry.
    Unresolved(Vec<String>),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unresolved(imports) => {
                write!(f, "{} unresolved import(s): {}", imports.len(), imports.join("; "))
            }
        }
    }
}

impl std::error::Error for Error {}

pub type ResolveError = Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Func,
    Global,
    Table,
    Memory,
    Other,
}

impl std::fmt::Display for ImportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Func => "func",
            Self::Global => "global",
            Self::Table => "table",
            Self::Memory => "memory",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<ValKind>,
    pub results: Vec<ValKind>,
}

/// One declared import of a guest module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDescriptor {
    pub module: String,
    pub name: String,
    pub kind: ImportKind,
    /// Present for functions whose every parameter and result is representable.
    pub signature: Option<Signature>,
}

impl ImportDescriptor {
    /// Registry key for a function import, `None` for anything else.
    pub fn key(&self) -> Option<ImportKey> {
        let sig = self.signature.as_ref()?;
        Some(ImportKey {
            module: self.module.clone(),
            name: self.name.clone(),
            params: sig.params.clone(),
            results: sig.results.clone(),
        })
    }
}

fn signature_of(ty: &wasmtime::FuncType) -> Option<Signature> {
    let params = ty.params().map(|t| ValKind::from_val_type(&t)).collect::<Option<Vec<_>>>()?;
    let results = ty.results().map(|t| ValKind::from_val_type(&t)).collect::<Option<Vec<_>>>()?;
    Some(Signature { params, results })
}

/// Describes every import of `module`, in declared order.
pub fn describe_imports(module: &Module) -> Vec<ImportDescriptor> {
    module
        .imports()
        .map(|import| {
            let (kind, signature) = match import.ty() {
                ExternType::Func(ty) => (ImportKind::Func, signature_of(&ty)),
                ExternType::Global(_) => (ImportKind::Global, None),
                ExternType::Table(_) => (ImportKind::Table, None),
                ExternType::Memory(_) => (ImportKind::Memory, None),
                _ => (ImportKind::Other, None),
            };
            ImportDescriptor {
                module: import.module().to_string(),
                name: import.name().to_string(),
                kind,
                signature,
            }
        })
        .collect()
}

/// A declared import and what, if anything, it bound to.
#[derive(Debug, Clone)]
pub struct ResolvedImport {
    pub descriptor: ImportDescriptor,
    pub binding: Option<&'static Syscall>,
}

/// Result of resolving a module against a registry; one entry per declared import.
#[derive(Debug, Clone)]
pub struct Resolution {
    imports: Vec<ResolvedImport>,
}

impl Resolution {
    pub fn imports(&self) -> &[ResolvedImport] {
        &self.imports
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.imports.iter().all(|i| i.binding.is_some())
    }

    /// Imports left without a binding, in declared order.
    pub fn unresolved(&self) -> Vec<&ImportDescriptor> {
        self.imports
            .iter()
            .filter(|i| i.binding.is_none())
            .map(|i| &i.descriptor)
            .collect()
    }
}

/// Resolves every import of `module`. Unresolved imports are logged, never dropped.
pub fn resolve_imports(module: &Module, registry: &Registry) -> Resolution {
    let imports = describe_imports(module)
        .into_iter()
        .map(|descriptor| {
            let binding = descriptor.key().and_then(|key| registry.lookup(&key));
            if binding.is_none() {
                warn!("unresolved import: {}", format_import(&descriptor));
            }
            ResolvedImport { descriptor, binding }
        })
        .collect();
    Resolution { imports }
}

/// What to put in slots the registry could not fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fallback {
    /// Refuse to instantiate.
    #[default]
    Reject,
    /// Bind unresolved functions to a stub that traps when called.
    TrapOnCall,
}

/// Order-preserving import slots, ready to become `Instance::new` input.
pub struct ImportVector {
    slots: Vec<Option<Extern>>,
    descriptors: Vec<ImportDescriptor>,
    types: Vec<ExternType>,
}

impl ImportVector {
    pub fn slots(&self) -> &[Option<Extern>] {
        &self.slots
    }

    pub fn descriptors(&self) -> &[ImportDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Fills or rejects empty slots per `fallback` and returns the externs in order.
    pub fn into_externs(self, store: &mut Store<ShimCtx>, fallback: Fallback) -> Result<Vec<Extern>> {
        let mut externs = Vec::with_capacity(self.slots.len());
        let mut missing = Vec::new();

        for ((slot, descriptor), ty) in self.slots.into_iter().zip(self.descriptors).zip(self.types) {
            match (slot, fallback, ty) {
                (Some(ext), _, _) => externs.push(ext),
                (None, Fallback::TrapOnCall, ExternType::Func(func_ty)) => {
                    let label = format!("{}::{}", descriptor.module, descriptor.name);
                    let stub = Func::new(&mut *store, func_ty, move |_, _, _| {
                        Err(wasmtime::Error::new(ShimTrap::UnresolvedImport(label.clone())))
                    });
                    externs.push(stub.into());
                }
                (None, _, _) => missing.push(format_import(&descriptor)),
            }
        }

        if missing.is_empty() {
            Ok(externs)
        } else {
            Err(Error::Unresolved(missing))
        }
    }
}

/// Resolves `module` and wraps every bound syscall as a host function in `store`.
pub fn build_import_vector(store: &mut Store<ShimCtx>, module: &Module, registry: &Registry) -> ImportVector {
    let resolution = resolve_imports(module, registry);
    let types: Vec<ExternType> = module.imports().map(|i| i.ty()).collect();

    let mut slots = Vec::with_capacity(resolution.len());
    let mut descriptors = Vec::with_capacity(resolution.len());
    for resolved in resolution.imports {
        let slot = resolved.binding.map(|syscall| {
            let ty = syscall.func_type(store.engine());
            let func = Func::new(&mut *store, ty, move |caller, params, results| {
                syscall.call(caller, params, results)
            });
            Extern::from(func)
        });
        slots.push(slot);
        descriptors.push(resolved.descriptor);
    }

    ImportVector { slots, descriptors, types }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wasmtime::Engine;

    const MIXED: &str = r#"(module
        (import "wasi_snapshot_preview1" "fd_write" (func (param i32 i32 i32 i32) (result i32)))
        (import "env" "table" (table 1 funcref))
        (import "wasi_snapshot_preview1" "clock_time_get" (func (param i32 i32 i32) (result i32)))
        (import "wasi_snapshot_preview1" "proc_exit" (func (param i32)))
        (import "env" "helper" (func))
        (memory (export "memory") 1))"#;

    #[test]
    fn test_describe_preserves_order() -> anyhow::Result<()> {
        let engine = Engine::default();
        let module = Module::new(&engine, MIXED)?;
        let imports = describe_imports(&module);
        let names: Vec<_> = imports.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["fd_write", "table", "clock_time_get", "proc_exit", "helper"]);
        assert_eq!(imports[1].kind, ImportKind::Table);
        assert_eq!(imports[1].signature, None);
        assert_eq!(
            imports[3].signature,
            Some(Signature { params: vec![ValKind::I32], results: vec![] })
        );
        Ok(())
    }

    #[test]
    fn test_resolution_is_positional() -> anyhow::Result<()> {
        let engine = Engine::default();
        let module = Module::new(&engine, MIXED)?;
        let resolution = resolve_imports(&module, &Registry::preview1());

        assert_eq!(resolution.len(), 5);
        let bound: Vec<_> = resolution
            .imports()
            .iter()
            .map(|i| i.binding.map(|s| s.name))
            .collect();
        // clock_time_get declares an i32 timestamp precision, so it is a near miss.
        assert_eq!(bound, [Some("fd_write"), None, None, Some("proc_exit"), None]);

        let unresolved: Vec<_> = resolution.unresolved().iter().map(|d| d.name.clone()).collect();
        assert_eq!(unresolved, ["table", "clock_time_get", "helper"]);
        assert!(!resolution.is_complete());
        Ok(())
    }

    #[test]
    fn test_reject_lists_every_missing_slot() -> anyhow::Result<()> {
        let engine = Engine::default();
        let module = Module::new(&engine, MIXED)?;
        let mut store = Store::new(&engine, ShimCtx::builder().build());

        let vector = build_import_vector(&mut store, &module, &Registry::preview1());
        assert_eq!(vector.len(), 5);
        assert_eq!(vector.slots().iter().filter(|s| s.is_some()).count(), 2);

        let Err(Error::Unresolved(missing)) = vector.into_externs(&mut store, Fallback::Reject) else {
            panic!("expected unresolved imports");
        };
        assert_eq!(missing.len(), 3);
        assert_eq!(missing[0], "table env::table");
        assert_eq!(
            missing[1],
            "func wasi_snapshot_preview1::clock_time_get(i32, i32, i32) -> (i32)"
        );
        Ok(())
    }

    #[test]
    fn test_trap_on_call_still_rejects_non_functions() -> anyhow::Result<()> {
        let engine = Engine::default();
        let module = Module::new(&engine, MIXED)?;
        let mut store = Store::new(&engine, ShimCtx::builder().build());

        let vector = build_import_vector(&mut store, &module, &Registry::preview1());
        let err = vector.into_externs(&mut store, Fallback::TrapOnCall).unwrap_err();
        assert_eq!(err, Error::Unresolved(vec!["table env::table".to_string()]));
        Ok(())
    }
}
