//! Windows native-log delivery and resource sampling.

use std::io;
use std::os::windows::ffi::OsStrExt;

use windows_sys::Win32::Foundation::FILETIME;
use windows_sys::Win32::System::Diagnostics::Debug::OutputDebugStringW;
use windows_sys::Win32::System::ProcessStatus::{
    GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS,
};
use windows_sys::Win32::System::Threading::{
    GetCurrentProcess, GetProcessIoCounters, GetProcessTimes, IO_COUNTERS,
};

use miniapi_core::{MiniapiError, MiniapiResult};

/// Deliver one log line to the debugger output stream.
pub fn emit_native(line: &str) {
    let wide: Vec<u16> = std::ffi::OsStr::new(line)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();
    // SAFETY: wide is NUL-terminated and outlives the call.
    unsafe { OutputDebugStringW(wide.as_ptr()) };
}

fn filetime_to_micros(ft: FILETIME) -> u64 {
    // FILETIME counts 100-nanosecond intervals.
    let ticks = (ft.dwHighDateTime as u64) << 32 | ft.dwLowDateTime as u64;
    ticks / 10
}

/// Total CPU time (user + kernel) consumed by this process, in microseconds.
pub fn cpu_time_micros() -> MiniapiResult<u64> {
    let zero = FILETIME {
        dwLowDateTime: 0,
        dwHighDateTime: 0,
    };
    let (mut creation, mut exit, mut kernel, mut user) = (zero, zero, zero, zero);
    // SAFETY: the pseudo-handle from GetCurrentProcess is always valid.
    let ok = unsafe {
        GetProcessTimes(
            GetCurrentProcess(),
            &mut creation,
            &mut exit,
            &mut kernel,
            &mut user,
        )
    };
    if ok == 0 {
        let os_error = io::Error::last_os_error();
        return Err(MiniapiError::platform(
            os_error.to_string(),
            os_error.raw_os_error().unwrap_or(0),
        ));
    }
    Ok(filetime_to_micros(kernel) + filetime_to_micros(user))
}

/// Current working set size in bytes.
pub fn resident_bytes() -> MiniapiResult<u64> {
    let mut counters = std::mem::MaybeUninit::<PROCESS_MEMORY_COUNTERS>::zeroed();
    // SAFETY: cb tells the API how much buffer it may fill.
    let ok = unsafe {
        let ptr = counters.as_mut_ptr();
        (*ptr).cb = std::mem::size_of::<PROCESS_MEMORY_COUNTERS>() as u32;
        GetProcessMemoryInfo(
            GetCurrentProcess(),
            ptr,
            std::mem::size_of::<PROCESS_MEMORY_COUNTERS>() as u32,
        )
    };
    if ok == 0 {
        let os_error = io::Error::last_os_error();
        return Err(MiniapiError::platform(
            os_error.to_string(),
            os_error.raw_os_error().unwrap_or(0),
        ));
    }
    let counters = unsafe { counters.assume_init() };
    Ok(counters.WorkingSetSize as u64)
}

/// Cumulative bytes read and written by this process.
pub fn io_bytes() -> MiniapiResult<(u64, u64)> {
    let mut counters = std::mem::MaybeUninit::<IO_COUNTERS>::zeroed();
    // SAFETY: GetProcessIoCounters fills the buffer on success.
    let ok = unsafe { GetProcessIoCounters(GetCurrentProcess(), counters.as_mut_ptr()) };
    if ok == 0 {
        let os_error = io::Error::last_os_error();
        return Err(MiniapiError::platform(
            os_error.to_string(),
            os_error.raw_os_error().unwrap_or(0),
        ));
    }
    let counters = unsafe { counters.assume_init() };
    Ok((counters.ReadTransferCount, counters.WriteTransferCount))
}
