//! Host clocks, read through `clock_gettime(2)` and `clock_getres(2)`.

use shimabi::Clockid;
use shimabi::Errno;
use shimabi::Timestamp;

use crate::errno::last_os_errno;

/// Converts a `timespec` to nanoseconds, saturating instead of wrapping.
///
/// Negative seconds clamp to zero; anything at or past `u64::MAX / 1e9`
/// seconds clamps to `u64::MAX`.
pub fn timespec_to_nanos(tv_sec: i64, tv_nsec: i64) -> Timestamp {
    const NANOS_PER_SEC: u64 = 1_000_000_000;
    if tv_sec < 0 {
        return 0;
    }
    let secs = tv_sec as u64;
    if secs >= u64::MAX / NANOS_PER_SEC {
        return u64::MAX;
    }
    (secs * NANOS_PER_SEC).saturating_add(tv_nsec.max(0) as u64)
}

fn host_clock(id: Clockid) -> libc::clockid_t {
    match id {
        Clockid::Realtime => libc::CLOCK_REALTIME,
        Clockid::Monotonic => libc::CLOCK_MONOTONIC,
        Clockid::ProcessCputimeId => libc::CLOCK_PROCESS_CPUTIME_ID,
        Clockid::ThreadCputimeId => libc::CLOCK_THREAD_CPUTIME_ID,
    }
}

/// Current time of `id` in nanoseconds.
pub fn clock_time(id: Clockid) -> Result<Timestamp, Errno> {
    let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
    // SAFETY: `ts` is a valid, writable timespec.
    let rc = unsafe { libc::clock_gettime(host_clock(id), &mut ts) };
    if rc != 0 {
        return Err(last_os_errno());
    }
    Ok(timespec_to_nanos(ts.tv_sec as i64, ts.tv_nsec as i64))
}

/// Resolution of `id` in nanoseconds.
pub fn clock_resolution(id: Clockid) -> Result<Timestamp, Errno> {
    let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
    // SAFETY: `ts` is a valid, writable timespec.
    let rc = unsafe { libc::clock_getres(host_clock(id), &mut ts) };
    if rc != 0 {
        return Err(last_os_errno());
    }
    Ok(timespec_to_nanos(ts.tv_sec as i64, ts.tv_nsec as i64))
}
