//! # Preview1 syscalls
//!
//! The static table behind [`Registry::preview1`](crate::registry::Registry::preview1)
//! and the handlers it points at. Signatures are the wasm-level lowering of
//! the preview1 witx: pointers, sizes, descriptors and small enums are `i32`;
//! 64-bit quantities are `i64`; every function but `proc_exit` returns an
//! `i32` errno.

mod args;
mod fd;
mod proc;
mod time;

use shimabi::Errno;
use tracing::warn;

use crate::context::UnsupportedPolicy;
use crate::registry::HostCall;
use crate::registry::Support;
use crate::registry::Syscall;
use crate::trap::CallResult;
use crate::trap::ShimTrap;
use crate::value::ValKind;

macro_rules! syscall {
    ($name:ident ( $($p:ident),* ) -> ( $($r:ident),* ) => $handler:path) => {
        Syscall {
            name: stringify!($name),
            params: &[$(ValKind::$p),*],
            results: &[$(ValKind::$r),*],
            handler: $handler,
            support: Support::Implemented,
        }
    };
    ($name:ident ( $($p:ident),* ) -> ( $($r:ident),* )) => {
        Syscall {
            name: stringify!($name),
            params: &[$(ValKind::$p),*],
            results: &[$(ValKind::$r),*],
            handler: unsupported,
            support: Support::Unsupported,
        }
    };
}

pub static SYSCALLS: &[Syscall] = &[
    syscall!(args_get(I32, I32) -> (I32) => args::args_get),
    syscall!(args_sizes_get(I32, I32) -> (I32) => args::args_sizes_get),
    syscall!(environ_get(I32, I32) -> (I32) => args::environ_get),
    syscall!(environ_sizes_get(I32, I32) -> (I32) => args::environ_sizes_get),
    syscall!(clock_res_get(I32, I32) -> (I32) => time::clock_res_get),
    syscall!(clock_time_get(I32, I64, I32) -> (I32) => time::clock_time_get),
    syscall!(fd_advise(I32, I64, I64, I32) -> (I32)),
    syscall!(fd_allocate(I32, I64, I64) -> (I32)),
    syscall!(fd_close(I32) -> (I32) => fd::fd_close),
    syscall!(fd_datasync(I32) -> (I32)),
    syscall!(fd_fdstat_get(I32, I32) -> (I32) => fd::fd_fdstat_get),
    syscall!(fd_fdstat_set_flags(I32, I32) -> (I32)),
    syscall!(fd_fdstat_set_rights(I32, I64, I64) -> (I32) => fd::fd_fdstat_set_rights),
    syscall!(fd_filestat_get(I32, I32) -> (I32) => fd::fd_filestat_get),
    syscall!(fd_filestat_set_size(I32, I64) -> (I32)),
    syscall!(fd_filestat_set_times(I32, I64, I64, I32) -> (I32)),
    syscall!(fd_pread(I32, I32, I32, I64, I32) -> (I32)),
    syscall!(fd_prestat_get(I32, I32) -> (I32) => fd::fd_prestat_get),
    syscall!(fd_prestat_dir_name(I32, I32, I32) -> (I32) => fd::fd_prestat_dir_name),
    syscall!(fd_pwrite(I32, I32, I32, I64, I32) -> (I32)),
    syscall!(fd_read(I32, I32, I32, I32) -> (I32) => fd::fd_read),
    syscall!(fd_readdir(I32, I32, I32, I64, I32) -> (I32)),
    syscall!(fd_renumber(I32, I32) -> (I32)),
    syscall!(fd_seek(I32, I64, I32, I32) -> (I32) => fd::fd_seek),
    syscall!(fd_sync(I32) -> (I32)),
    syscall!(fd_tell(I32, I32) -> (I32) => fd::fd_tell),
    syscall!(fd_write(I32, I32, I32, I32) -> (I32) => fd::fd_write),
    syscall!(path_create_directory(I32, I32, I32) -> (I32)),
    syscall!(path_filestat_get(I32, I32, I32, I32, I32) -> (I32)),
    syscall!(path_filestat_set_times(I32, I32, I32, I32, I64, I64, I32) -> (I32)),
    syscall!(path_link(I32, I32, I32, I32, I32, I32, I32) -> (I32)),
    syscall!(path_open(I32, I32, I32, I32, I32, I64, I64, I32, I32) -> (I32)),
    syscall!(path_readlink(I32, I32, I32, I32, I32, I32) -> (I32)),
    syscall!(path_remove_directory(I32, I32, I32) -> (I32)),
    syscall!(path_rename(I32, I32, I32, I32, I32, I32) -> (I32)),
    syscall!(path_symlink(I32, I32, I32, I32, I32) -> (I32)),
    syscall!(path_unlink_file(I32, I32, I32) -> (I32)),
    syscall!(poll_oneoff(I32, I32, I32, I32) -> (I32)),
    syscall!(proc_exit(I32) -> () => proc::proc_exit),
    syscall!(proc_raise(I32) -> (I32)),
    syscall!(random_get(I32, I32) -> (I32) => proc::random_get),
    syscall!(sched_yield() -> (I32) => proc::sched_yield),
    syscall!(sock_accept(I32, I32, I32) -> (I32)),
    syscall!(sock_recv(I32, I32, I32, I32, I32, I32) -> (I32)),
    syscall!(sock_send(I32, I32, I32, I32, I32) -> (I32)),
    syscall!(sock_shutdown(I32, I32) -> (I32)),
];

/// Shared handler for every function without a host implementation.
///
/// Touches no guest memory under any policy.
fn unsupported(call: &mut HostCall<'_>) -> CallResult {
    let policy = call.ctx.policy;
    if call.ctx.diagnostics.record_unsupported(call.name) {
        warn!(func = call.name, %policy, "guest called an unsupported function");
    }
    match policy {
        UnsupportedPolicy::Nosys => Err(Errno::Nosys.into()),
        UnsupportedPolicy::PretendSuccess => Ok(()),
        UnsupportedPolicy::Trap => Err(ShimTrap::NotImplemented(call.name).into()),
    }
}
