//! # Syscall registry
//!
//! The table of every `wasi_snapshot_preview1` function the shim knows, keyed
//! by its full import identity: module, name and signature. A guest import
//! binds to an entry only when all four match exactly.
//!
//! ## Philosophy
//!
//! - **One contract for every entry**: implemented or not, a call goes through
//!   [`Syscall::call`], which corrects the result slot, runs the handler and
//!   writes back an errno or raises a trap.
//! - **No hidden state**: a handler sees its arguments, the guest memory and the
//!   instance context through [`HostCall`], and nothing else.

use std::collections::HashMap;

use shimabi::Errno;
use tracing::debug;
use wasmtime::Caller;
use wasmtime::Engine;
use wasmtime::Extern;
use wasmtime::FuncType;
use wasmtime::Val;

use crate::context::ShimCtx;
use crate::display::format_call;
use crate::memory::GuestMemory;
use crate::trap::CallError;
use crate::trap::CallResult;
use crate::value::fix_result_discriminant;
use crate::value::Args;
use crate::value::ValKind;

/// Everything a handler may touch during one call.
pub struct HostCall<'a> {
    pub name: &'static str,
    pub args: Args<'a>,
    pub memory: GuestMemory<'a>,
    pub ctx: &'a mut ShimCtx,
}

pub type Handler = fn(&mut HostCall<'_>) -> CallResult;

/// Whether an entry has a real host implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    Implemented,
    /// Answered according to the instance's `UnsupportedPolicy`.
    Unsupported,
}

/// One preview1 function.
pub struct Syscall {
    pub name: &'static str,
    pub params: &'static [ValKind],
    pub results: &'static [ValKind],
    pub handler: Handler,
    pub support: Support,
}

impl std::fmt::Debug for Syscall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Syscall")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("results", &self.results)
            .field("support", &self.support)
            .finish()
    }
}

impl Syscall {
    pub fn key(&self) -> ImportKey {
        ImportKey {
            module: shimabi::MODULE.to_string(),
            name: self.name.to_string(),
            params: self.params.to_vec(),
            results: self.results.to_vec(),
        }
    }

    pub fn func_type(&self, engine: &Engine) -> FuncType {
        FuncType::new(
            engine,
            self.params.iter().map(|k| k.val_type()),
            self.results.iter().map(|k| k.val_type()),
        )
    }

    /// Entry point the engine calls for a bound import.
    pub fn call(
        &'static self,
        mut caller: Caller<'_, ShimCtx>,
        params: &[Val],
        results: &mut [Val],
    ) -> wasmtime::Result<()> {
        let memory = caller.get_export("memory").and_then(Extern::into_memory);
        let (bytes, ctx): (&mut [u8], &mut ShimCtx) = match memory {
            Some(memory) => memory.data_and_store_mut(&mut caller),
            None => (Default::default(), caller.data_mut()),
        };

        for (slot, kind) in results.iter_mut().zip(self.results) {
            fix_result_discriminant(slot, *kind, self.name, &mut ctx.diagnostics);
        }
        ctx.diagnostics.record_call();

        let mut call = HostCall {
            name: self.name,
            args: Args::new(self.name, params),
            memory: GuestMemory::new(bytes),
            ctx,
        };
        let outcome = (self.handler)(&mut call);

        let errno = match outcome {
            Ok(()) => Errno::Success,
            Err(CallError::Errno(errno)) => errno,
            Err(CallError::Trap(trap)) => {
                debug!("{} trapped: {}", format_call(self.name, params, &[]), trap);
                return Err(wasmtime::Error::new(trap));
            }
        };
        if let Some(slot) = results.first_mut() {
            *slot = Val::I32(errno.as_i32());
        }
        debug!("{} = {}", format_call(self.name, params, results), errno.name());
        Ok(())
    }
}

/// Structured identity of a function import.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportKey {
    pub module: String,
    pub name: String,
    pub params: Vec<ValKind>,
    pub results: Vec<ValKind>,
}

/// Index over a syscall table, built once.
pub struct Registry {
    entries: &'static [Syscall],
    by_key: HashMap<ImportKey, &'static Syscall>,
}

impl Registry {
    pub fn new(entries: &'static [Syscall]) -> Self {
        let by_key = entries.iter().map(|s| (s.key(), s)).collect();
        Self { entries, by_key }
    }

    /// The full preview1 table.
    pub fn preview1() -> Self {
        Self::new(crate::syscalls::SYSCALLS)
    }

    /// Exact match on module, name, params and results.
    pub fn lookup(&self, key: &ImportKey) -> Option<&'static Syscall> {
        self.by_key.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static Syscall> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::preview1()
    }
}
