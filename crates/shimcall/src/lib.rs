//! # Shimcall
//!
//! Host side of `wasi_snapshot_preview1` for wasmtime core modules.
//!
//! A guest module's imports are resolved against a static [`Registry`] of
//! preview1 functions, bound as host functions in a `Store<ShimCtx>`, and
//! handed to `Instance::new` in declared order. Each call mediates guest
//! memory through a bounds-checked [`GuestMemory`] and reports failure either
//! as an errno in the result slot or as a [`ShimTrap`].

#[cfg(not(unix))]
compile_error!("shimcall reads host clocks through libc and only supports unix targets");

pub mod clock;
pub mod context;
pub mod diagnostics;
pub mod display;
pub mod errno;
pub mod memory;
pub mod registry;
pub mod resolve;
pub mod syscalls;
pub mod trap;
pub mod value;

pub use context::ContextBuilder;
pub use context::SharedBuffer;
pub use context::ShimCtx;
pub use context::UnsupportedPolicy;
pub use diagnostics::Diagnostics;
pub use memory::check_pointer;
pub use memory::GuestMemory;
pub use registry::HostCall;
pub use registry::ImportKey;
pub use registry::Registry;
pub use registry::Support;
pub use registry::Syscall;
pub use resolve::build_import_vector;
pub use resolve::describe_imports;
pub use resolve::resolve_imports;
pub use resolve::Fallback;
pub use resolve::ImportDescriptor;
pub use resolve::ImportVector;
pub use resolve::ResolveError;
pub use resolve::Resolution;
pub use trap::CallError;
pub use trap::CallResult;
pub use trap::ShimTrap;
pub use value::fix_result_discriminant;
pub use value::ValKind;

pub use shimabi::Errno;
