//! `args_*` and `environ_*`: NUL-terminated string vectors copied out of the context.

use shimabi::Errno;

use crate::memory::GuestMemory;
use crate::registry::HostCall;
use crate::trap::CallResult;

/// Number of strings and total buffer size including terminators.
fn measure(strings: &[String]) -> Result<(u32, u32), Errno> {
    let count = u32::try_from(strings.len()).map_err(|_| Errno::Overflow)?;
    let size = strings
        .iter()
        .try_fold(0u32, |acc, s| {
            let len = u32::try_from(s.len()).ok()?;
            acc.checked_add(len)?.checked_add(1)
        })
        .ok_or(Errno::Overflow)?;
    Ok((count, size))
}

fn write_sizes(memory: &mut GuestMemory<'_>, strings: &[String], count_ptr: u32, size_ptr: u32) -> CallResult {
    let (count, size) = measure(strings)?;
    memory.check(count_ptr, 4)?;
    memory.check(size_ptr, 4)?;
    memory.write_u32(count_ptr, count)?;
    memory.write_u32(size_ptr, size)?;
    Ok(())
}

/// Writes the pointer array at `ptrs` and the packed strings at `buf`.
///
/// Both regions are validated before the first byte is written.
fn write_strings(memory: &mut GuestMemory<'_>, strings: &[String], ptrs: u32, buf: u32) -> CallResult {
    let (count, size) = measure(strings)?;
    memory.check(ptrs, count as usize * 4)?;
    memory.check(buf, size as usize)?;

    let mut offset = 0u32;
    for (i, s) in strings.iter().enumerate() {
        let at = buf + offset;
        memory.write_u32(ptrs + 4 * i as u32, at)?;
        memory.write_bytes(at, s.as_bytes())?;
        memory.write_bytes(at + s.len() as u32, &[0])?;
        offset += s.len() as u32 + 1;
    }
    Ok(())
}

pub(super) fn args_sizes_get(call: &mut HostCall<'_>) -> CallResult {
    let argc_ptr = call.args.u32(0)?;
    let buf_size_ptr = call.args.u32(1)?;
    write_sizes(&mut call.memory, &call.ctx.args, argc_ptr, buf_size_ptr)
}

pub(super) fn args_get(call: &mut HostCall<'_>) -> CallResult {
    let argv = call.args.u32(0)?;
    let argv_buf = call.args.u32(1)?;
    write_strings(&mut call.memory, &call.ctx.args, argv, argv_buf)
}

pub(super) fn environ_sizes_get(call: &mut HostCall<'_>) -> CallResult {
    let count_ptr = call.args.u32(0)?;
    let buf_size_ptr = call.args.u32(1)?;
    write_sizes(&mut call.memory, &call.ctx.env, count_ptr, buf_size_ptr)
}

pub(super) fn environ_get(call: &mut HostCall<'_>) -> CallResult {
    let environ = call.args.u32(0)?;
    let environ_buf = call.args.u32(1)?;
    write_strings(&mut call.memory, &call.ctx.env, environ, environ_buf)
}
