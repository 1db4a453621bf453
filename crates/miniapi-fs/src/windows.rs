//! Windows permission and error mapping.
//!
//! NTFS has no Unix-style permission bits. The reduced cross-platform set
//! maps onto what the platform does have:
//! - `writable` <-> absence of `FILE_ATTRIBUTE_READONLY`
//! - `readable` is always true for paths the caller can stat
//! - `executable` follows the executable-extension convention on read and
//!   has no native representation on write (documented no-op for that bit)

use std::fs;
use std::io;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;

use windows_sys::Win32::Foundation::{ERROR_LOCK_VIOLATION, ERROR_SHARING_VIOLATION};
use windows_sys::Win32::Storage::FileSystem::{
    GetFileAttributesW, SetFileAttributesW, FILE_ATTRIBUTE_NORMAL, FILE_ATTRIBUTE_READONLY,
    INVALID_FILE_ATTRIBUTES,
};

use crate::Permissions;

const EXECUTABLE_EXTENSIONS: &[&str] = &["exe", "bat", "cmd", "com"];

/// Native codes that indicate contention rather than failure.
pub fn is_busy_code(code: i32) -> bool {
    code == ERROR_SHARING_VIOLATION as i32 || code == ERROR_LOCK_VIOLATION as i32
}

/// Reduce native metadata to the cross-platform permission set.
pub fn permissions_from(path: &Path, meta: &fs::Metadata) -> Permissions {
    let executable = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| EXECUTABLE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    Permissions {
        readable: true,
        writable: !meta.permissions().readonly(),
        executable,
    }
}

/// Apply the reduced permission set via file attributes.
///
/// Only `writable` has a native representation; the executable bit is
/// carried by the file extension and is not modified here.
pub fn apply_permissions(path: &Path, perm: Permissions) -> io::Result<()> {
    let wide = wide_path(path);
    // SAFETY: wide is NUL-terminated and outlives the calls.
    unsafe {
        let attrs = GetFileAttributesW(wide.as_ptr());
        if attrs == INVALID_FILE_ATTRIBUTES {
            return Err(io::Error::last_os_error());
        }
        // Only the read-only bit changes; hidden/system/archive stay.
        let mut updated = if perm.writable {
            attrs & !FILE_ATTRIBUTE_READONLY
        } else {
            attrs | FILE_ATTRIBUTE_READONLY
        };
        // An all-zero attribute word is not valid; NORMAL stands in for it.
        if updated == 0 {
            updated = FILE_ATTRIBUTE_NORMAL;
        }
        if updated != attrs && SetFileAttributesW(wide.as_ptr(), updated) == 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Pre-delete hook: clear the read-only attribute so deletion can proceed.
///
/// Best-effort; the delete itself reports any real failure.
pub fn prepare_remove(path: &Path) {
    let wide = wide_path(path);
    // SAFETY: wide is NUL-terminated and outlives the calls.
    unsafe {
        let attrs = GetFileAttributesW(wide.as_ptr());
        if attrs != INVALID_FILE_ATTRIBUTES && attrs & FILE_ATTRIBUTE_READONLY != 0 {
            SetFileAttributesW(wide.as_ptr(), attrs & !FILE_ATTRIBUTE_READONLY);
        }
    }
}

fn wide_path(path: &Path) -> Vec<u16> {
    path.as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}
