//! `clock_res_get` and `clock_time_get`.

use shimabi::Clockid;
use shimabi::Errno;

use crate::clock::clock_resolution;
use crate::clock::clock_time;
use crate::registry::HostCall;
use crate::trap::CallResult;

// Order matters: the output pointer is validated before the clock id, and
// nothing is written unless the host clock read succeeds.

pub(super) fn clock_res_get(call: &mut HostCall<'_>) -> CallResult {
    let id = call.args.u32(0)?;
    let resolution_ptr = call.args.u32(1)?;

    call.memory.check(resolution_ptr, 8)?;
    let id = Clockid::from_raw(id).ok_or(Errno::Inval)?;
    let resolution = clock_resolution(id)?;
    call.memory.write_u64(resolution_ptr, resolution)?;
    Ok(())
}

pub(super) fn clock_time_get(call: &mut HostCall<'_>) -> CallResult {
    let id = call.args.u32(0)?;
    let _precision = call.args.u64(1)?;
    let time_ptr = call.args.u32(2)?;

    call.memory.check(time_ptr, 8)?;
    let id = Clockid::from_raw(id).ok_or(Errno::Inval)?;
    let now = clock_time(id)?;
    call.memory.write_u64(time_ptr, now)?;
    Ok(())
}
