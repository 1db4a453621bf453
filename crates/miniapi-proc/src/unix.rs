//! Unix signal delivery and executable probing.

use std::ffi::CString;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use libc::{EINVAL, EPERM, ESRCH};

use miniapi_core::{MiniapiError, MiniapiResult};

use crate::SignalKind;

/// Map the portable signal request to a native signal number.
///
/// Every portable variant has a POSIX representation.
pub fn signal_number(kind: SignalKind) -> MiniapiResult<i32> {
    Ok(match kind {
        SignalKind::Terminate => libc::SIGTERM,
        SignalKind::Interrupt => libc::SIGINT,
        SignalKind::Kill => libc::SIGKILL,
        SignalKind::Custom(n) => n,
    })
}

/// Deliver a signal to `pid`.
pub fn send_signal(pid: u32, kind: SignalKind) -> MiniapiResult<()> {
    let signal = signal_number(kind)?;
    // pid is never 0 here; handles only wrap spawned children.
    let result = unsafe { libc::kill(pid as i32, signal) };
    if result == 0 {
        return Ok(());
    }

    let os_error = io::Error::last_os_error();
    let errno = os_error.raw_os_error().unwrap_or(0);
    match errno {
        EPERM => Err(MiniapiError::permission_denied(format!(
            "signal pid {pid}"
        ))),
        ESRCH => Err(MiniapiError::not_found(format!("process {pid}"))),
        EINVAL => Err(MiniapiError::invalid_argument(format!(
            "invalid signal: {signal}"
        ))),
        _ => Err(MiniapiError::platform(os_error.to_string(), errno)),
    }
}

/// True when `path` is a file the current user may execute.
pub fn is_executable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    let Ok(c_path) = CString::new(path.as_os_str().as_encoded_bytes()) else {
        return false;
    };
    // access(2) honours effective uid/gid, unlike a raw mode check.
    (unsafe { libc::access(c_path.as_ptr(), libc::X_OK) == 0 })
        || meta.permissions().mode() & 0o111 != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portable_signals_map_to_posix_numbers() {
        assert_eq!(signal_number(SignalKind::Terminate).unwrap(), libc::SIGTERM);
        assert_eq!(signal_number(SignalKind::Interrupt).unwrap(), libc::SIGINT);
        assert_eq!(signal_number(SignalKind::Kill).unwrap(), libc::SIGKILL);
        assert_eq!(signal_number(SignalKind::Custom(10)).unwrap(), 10);
    }

    #[test]
    fn signal_nonexistent_pid_is_not_found_or_permission_denied() {
        // High PID that is extremely unlikely to exist. Never u32::MAX:
        // that wraps to -1, and kill(-1, sig) targets every process the
        // caller may signal.
        let result = send_signal(99999, SignalKind::Terminate);
        assert!(matches!(
            result,
            Err(MiniapiError::NotFound { .. } | MiniapiError::PermissionDenied { .. })
        ));
    }

    #[test]
    fn invalid_signal_is_rejected() {
        // Signal our own process to avoid touching anything system-owned.
        let result = send_signal(std::process::id(), SignalKind::Custom(-1));
        assert!(matches!(
            result,
            Err(MiniapiError::InvalidArgument { .. } | MiniapiError::Platform { .. })
        ));
    }

    #[test]
    fn shell_is_executable() {
        assert!(is_executable(Path::new("/bin/sh")));
        assert!(!is_executable(Path::new("/etc/hostname")));
    }
}
