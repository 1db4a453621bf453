//! Unix native-log delivery and resource sampling.

use std::ffi::CString;
use std::io;

use miniapi_core::{MiniapiError, MiniapiResult};

/// Deliver one log line to syslog.
///
/// Interior NULs are stripped; syslog cannot carry them.
pub fn emit_native(line: &str) {
    let sanitized: String = line.chars().filter(|c| *c != '\0').collect();
    let Ok(message) = CString::new(sanitized) else {
        return;
    };
    static FORMAT: &[u8] = b"%s\0";
    // SAFETY: both strings are NUL-terminated and outlive the call.
    unsafe {
        libc::syslog(libc::LOG_INFO, FORMAT.as_ptr().cast(), message.as_ptr());
    }
}

/// Total CPU time (user + system) consumed by this process, in microseconds.
pub fn cpu_time_micros() -> MiniapiResult<u64> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    // SAFETY: getrusage fills the buffer on success.
    let result = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if result != 0 {
        let os_error = io::Error::last_os_error();
        return Err(MiniapiError::platform(
            os_error.to_string(),
            os_error.raw_os_error().unwrap_or(0),
        ));
    }
    let usage = unsafe { usage.assume_init() };
    let to_micros = |tv: libc::timeval| tv.tv_sec as u64 * 1_000_000 + tv.tv_usec as u64;
    Ok(to_micros(usage.ru_utime) + to_micros(usage.ru_stime))
}

/// Current resident set size in bytes.
#[cfg(target_os = "linux")]
pub fn resident_bytes() -> MiniapiResult<u64> {
    let statm = std::fs::read_to_string("/proc/self/statm")
        .map_err(|e| MiniapiError::from_io(e, "telemetry.sample(memory)", "/proc/self/statm"))?;
    let resident_pages: u64 = statm
        .split_whitespace()
        .nth(1)
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| MiniapiError::platform("malformed /proc/self/statm", 0))?;
    // SAFETY: sysconf with a valid name has no failure mode we care about
    // beyond -1, handled below.
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size <= 0 {
        return Err(MiniapiError::platform("sysconf(_SC_PAGESIZE) failed", 0));
    }
    Ok(resident_pages * page_size as u64)
}

/// Peak resident set size in bytes.
///
/// macOS reports `ru_maxrss` in bytes directly; only the high-water mark
/// is available without mach APIs.
#[cfg(target_os = "macos")]
pub fn resident_bytes() -> MiniapiResult<u64> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    let result = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if result != 0 {
        let os_error = io::Error::last_os_error();
        return Err(MiniapiError::platform(
            os_error.to_string(),
            os_error.raw_os_error().unwrap_or(0),
        ));
    }
    let usage = unsafe { usage.assume_init() };
    Ok(usage.ru_maxrss as u64)
}

/// Cumulative bytes read and written by this process.
#[cfg(target_os = "linux")]
pub fn io_bytes() -> MiniapiResult<(u64, u64)> {
    let io_stats = std::fs::read_to_string("/proc/self/io")
        .map_err(|e| MiniapiError::from_io(e, "telemetry.sample(io)", "/proc/self/io"))?;
    let mut read_bytes = None;
    let mut write_bytes = None;
    for line in io_stats.lines() {
        if let Some(value) = line.strip_prefix("read_bytes: ") {
            read_bytes = value.trim().parse().ok();
        } else if let Some(value) = line.strip_prefix("write_bytes: ") {
            write_bytes = value.trim().parse().ok();
        }
    }
    match (read_bytes, write_bytes) {
        (Some(r), Some(w)) => Ok((r, w)),
        _ => Err(MiniapiError::platform("malformed /proc/self/io", 0)),
    }
}

/// No per-process I/O counters without mach APIs; the capability table
/// routes this away before dispatch on macOS.
#[cfg(target_os = "macos")]
pub fn io_bytes() -> MiniapiResult<(u64, u64)> {
    Err(MiniapiError::unsupported("telemetry.sample_io", "macos"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_time_is_monotonic() {
        let first = cpu_time_micros().unwrap();
        // Burn a little CPU so the counter visibly advances.
        let mut acc = 0u64;
        for i in 0..2_000_000u64 {
            acc = acc.wrapping_add(i);
        }
        std::hint::black_box(acc);
        let second = cpu_time_micros().unwrap();
        assert!(second >= first);
    }

    #[test]
    fn resident_bytes_is_nonzero() {
        assert!(resident_bytes().unwrap() > 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn io_counters_parse() {
        let (read, write) = io_bytes().unwrap();
        // Both counters are cumulative; zero is legal right after start.
        let _ = (read, write);
    }
}
