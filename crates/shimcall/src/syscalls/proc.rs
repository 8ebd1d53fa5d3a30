//! Process-level calls: exit, yield and randomness.

use rand::rngs::OsRng;
use rand::RngCore;
use shimabi::Errno;

use crate::registry::HostCall;
use crate::trap::CallResult;
use crate::trap::ShimTrap;

/// Never returns an errno; the guest is always unwound.
pub(super) fn proc_exit(call: &mut HostCall<'_>) -> CallResult {
    let code = call.args.i32(0)?;
    Err(ShimTrap::ProcExit(code).into())
}

pub(super) fn sched_yield(_call: &mut HostCall<'_>) -> CallResult {
    std::thread::yield_now();
    Ok(())
}

pub(super) fn random_get(call: &mut HostCall<'_>) -> CallResult {
    let buf = call.args.u32(0)?;
    let len = call.args.u32(1)?;

    let out = call.memory.slice_mut(buf, len as usize)?;
    OsRng.try_fill_bytes(out).map_err(|_| Errno::Io)?;
    Ok(())
}
