//! Windows process termination and executable probing.
//!
//! Windows has no POSIX signal delivery. The portable `Terminate` and
//! `Kill` requests both map to `TerminateProcess`; `Interrupt` and
//! `Custom` have no equivalent for an arbitrary process and surface as
//! `Unsupported`.

use std::io;
use std::path::Path;

use windows_sys::Win32::Foundation::{CloseHandle, ERROR_ACCESS_DENIED, ERROR_INVALID_PARAMETER};
use windows_sys::Win32::System::Threading::{OpenProcess, TerminateProcess, PROCESS_TERMINATE};

use miniapi_core::{MiniapiError, MiniapiResult};

use crate::SignalKind;

const EXECUTABLE_EXTENSIONS: &[&str] = &["exe", "bat", "cmd", "com"];

/// Deliver the portable signal request.
pub fn send_signal(pid: u32, kind: SignalKind) -> MiniapiResult<()> {
    match kind {
        SignalKind::Terminate | SignalKind::Kill => terminate(pid),
        SignalKind::Interrupt => Err(MiniapiError::unsupported(
            "process.signal(interrupt)",
            "windows",
        )),
        SignalKind::Custom(_) => Err(MiniapiError::unsupported(
            "process.signal(custom)",
            "windows",
        )),
    }
}

fn terminate(pid: u32) -> MiniapiResult<()> {
    // SAFETY: OpenProcess returns 0 on failure; handle is closed on all paths.
    unsafe {
        let handle = OpenProcess(PROCESS_TERMINATE, 0, pid);
        if handle == 0 {
            let os_error = io::Error::last_os_error();
            return Err(match os_error.raw_os_error().map(|c| c as u32) {
                Some(ERROR_ACCESS_DENIED) => {
                    MiniapiError::permission_denied(format!("terminate pid {pid}"))
                }
                Some(ERROR_INVALID_PARAMETER) => {
                    MiniapiError::not_found(format!("process {pid}"))
                }
                code => MiniapiError::platform(
                    os_error.to_string(),
                    code.map(|c| c as i32).unwrap_or(0),
                ),
            });
        }
        let ok = TerminateProcess(handle, 1);
        let result = if ok == 0 {
            let os_error = io::Error::last_os_error();
            Err(MiniapiError::platform(
                os_error.to_string(),
                os_error.raw_os_error().unwrap_or(0),
            ))
        } else {
            Ok(())
        };
        CloseHandle(handle);
        result
    }
}

/// True when `path` names something the shell would execute.
///
/// Windows derives executability from the extension.
pub fn is_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EXECUTABLE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_is_unsupported() {
        assert!(matches!(
            send_signal(std::process::id(), SignalKind::Interrupt),
            Err(MiniapiError::Unsupported { .. })
        ));
    }

    #[test]
    fn executability_follows_extension() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("tool.exe");
        let txt = dir.path().join("notes.txt");
        std::fs::write(&exe, b"x").unwrap();
        std::fs::write(&txt, b"x").unwrap();
        assert!(is_executable(&exe));
        assert!(!is_executable(&txt));
    }
}
