//! Descriptor calls over the context's [`FdTable`](crate::context::FdTable).
//!
//! Only the stdio streams exist, so there are no preopens and nothing is
//! seekable. Every operation checks the descriptor's rights before acting.

use std::io::Read;
use std::io::Write;

use shimabi::Errno;
use shimabi::Filestat;
use shimabi::Rights;
use shimabi::Whence;

use crate::context::Stream;
use crate::errno::errno_from_io;
use crate::registry::HostCall;
use crate::trap::CallResult;

pub(super) fn fd_close(call: &mut HostCall<'_>) -> CallResult {
    let fd = call.args.u32(0)?;
    call.ctx.fds.remove(fd)?;
    Ok(())
}

pub(super) fn fd_fdstat_get(call: &mut HostCall<'_>) -> CallResult {
    let fd = call.args.u32(0)?;
    let stat_ptr = call.args.u32(1)?;

    let stat = call.ctx.fds.get(fd)?.fdstat();
    call.memory.write_bytes(stat_ptr, &stat.encode())?;
    Ok(())
}

pub(super) fn fd_fdstat_set_rights(call: &mut HostCall<'_>) -> CallResult {
    let fd = call.args.u32(0)?;
    let base = Rights::from_bits_retain(call.args.u64(1)?);
    let inheriting = Rights::from_bits_retain(call.args.u64(2)?);

    call.ctx.fds.get_mut(fd)?.narrow_rights(base, inheriting)?;
    Ok(())
}

pub(super) fn fd_filestat_get(call: &mut HostCall<'_>) -> CallResult {
    let fd = call.args.u32(0)?;
    let stat_ptr = call.args.u32(1)?;

    let entry = call.ctx.fds.get(fd)?;
    Rights::require(entry.rights_base, Rights::FD_FILESTAT_GET)?;
    let stat = Filestat {
        dev: 0,
        ino: 0,
        filetype: entry.filetype,
        nlink: 1,
        size: 0,
        atim: 0,
        mtim: 0,
        ctim: 0,
    };
    call.memory.write_bytes(stat_ptr, &stat.encode())?;
    Ok(())
}

pub(super) fn fd_prestat_get(call: &mut HostCall<'_>) -> CallResult {
    let _fd = call.args.u32(0)?;
    let _prestat_ptr = call.args.u32(1)?;
    Err(Errno::Badf.into())
}

pub(super) fn fd_prestat_dir_name(call: &mut HostCall<'_>) -> CallResult {
    let _fd = call.args.u32(0)?;
    let _path = call.args.u32(1)?;
    let _path_len = call.args.u32(2)?;
    Err(Errno::Badf.into())
}

pub(super) fn fd_read(call: &mut HostCall<'_>) -> CallResult {
    let fd = call.args.u32(0)?;
    let iovs_ptr = call.args.u32(1)?;
    let iovs_len = call.args.u32(2)?;
    let nread_ptr = call.args.u32(3)?;

    let entry = call.ctx.fds.get_mut(fd)?;
    Rights::require(entry.rights_base, Rights::FD_READ)?;
    let Stream::Reader(reader) = &mut entry.stream else {
        return Err(Errno::Badf.into());
    };

    call.memory.check(nread_ptr, 4)?;
    let iovs = call.memory.read_iovecs(iovs_ptr, iovs_len)?;
    for iov in &iovs {
        call.memory.check(iov.buf, iov.buf_len as usize)?;
    }

    // Once bytes have moved, a later failure ends the call with the partial count.
    let mut nread: u32 = 0;
    for iov in &iovs {
        let buf = call.memory.slice_mut(iov.buf, iov.buf_len as usize)?;
        let n = match reader.read(buf) {
            Ok(n) => n,
            Err(_) if nread > 0 => break,
            Err(e) => return Err(errno_from_io(&e).into()),
        };
        nread = nread.saturating_add(n as u32);
        if n < buf.len() {
            break;
        }
    }

    call.memory.write_u32(nread_ptr, nread)?;
    Ok(())
}

pub(super) fn fd_write(call: &mut HostCall<'_>) -> CallResult {
    let fd = call.args.u32(0)?;
    let iovs_ptr = call.args.u32(1)?;
    let iovs_len = call.args.u32(2)?;
    let nwritten_ptr = call.args.u32(3)?;

    let entry = call.ctx.fds.get_mut(fd)?;
    Rights::require(entry.rights_base, Rights::FD_WRITE)?;
    let Stream::Writer(writer) = &mut entry.stream else {
        return Err(Errno::Badf.into());
    };

    call.memory.check(nwritten_ptr, 4)?;
    let iovs = call.memory.read_iovecs(iovs_ptr, iovs_len)?;
    for iov in &iovs {
        call.memory.check(iov.buf, iov.buf_len as usize)?;
    }

    let mut nwritten: u32 = 0;
    let mut failure = None;
    'iovs: for iov in &iovs {
        let mut data = call.memory.slice(iov.buf, iov.buf_len as usize)?;
        while !data.is_empty() {
            match writer.write(data) {
                Ok(0) => break 'iovs,
                Ok(n) => {
                    nwritten = nwritten.saturating_add(n as u32);
                    data = &data[n..];
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    failure = Some(errno_from_io(&e));
                    break 'iovs;
                }
            }
        }
    }
    if let Err(e) = writer.flush() {
        failure = failure.or(Some(errno_from_io(&e)));
    }
    // Bytes already handed to the host are reported, not retried by the guest.
    if let Some(errno) = failure
        && nwritten == 0
    {
        return Err(errno.into());
    }

    call.memory.write_u32(nwritten_ptr, nwritten)?;
    Ok(())
}

pub(super) fn fd_seek(call: &mut HostCall<'_>) -> CallResult {
    let fd = call.args.u32(0)?;
    let _offset = call.args.i64(1)?;
    let whence = call.args.u32(2)?;
    let _newoffset_ptr = call.args.u32(3)?;

    let entry = call.ctx.fds.get(fd)?;
    Rights::require(entry.rights_base, Rights::FD_SEEK)?;
    u8::try_from(whence)
        .ok()
        .and_then(Whence::from_raw)
        .ok_or(Errno::Inval)?;
    Err(Errno::Spipe.into())
}

pub(super) fn fd_tell(call: &mut HostCall<'_>) -> CallResult {
    let fd = call.args.u32(0)?;
    let _offset_ptr = call.args.u32(1)?;

    let entry = call.ctx.fds.get(fd)?;
    Rights::require(entry.rights_base, Rights::FD_TELL)?;
    Err(Errno::Spipe.into())
}
