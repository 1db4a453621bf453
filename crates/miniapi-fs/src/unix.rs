//! Unix permission and error mapping.
//!
//! Reduces full Unix mode bits to the cross-platform
//! {readable, writable, executable} set and back. The reverse mapping
//! writes conventional modes: read applies to owner/group/other, write to
//! the owner only, execute to owner/group/other.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::Permissions;

/// Native codes that indicate contention rather than failure.
pub fn is_busy_code(code: i32) -> bool {
    code == libc::EBUSY || code == libc::ETXTBSY
}

/// Reduce native metadata to the cross-platform permission set.
///
/// Bits are taken from the owner triad.
pub fn permissions_from(_path: &Path, meta: &fs::Metadata) -> Permissions {
    let mode = meta.permissions().mode();
    Permissions {
        readable: mode & 0o400 != 0,
        writable: mode & 0o200 != 0,
        executable: mode & 0o100 != 0,
    }
}

/// Apply the reduced permission set as native mode bits.
pub fn apply_permissions(path: &Path, perm: Permissions) -> io::Result<()> {
    let mut mode = 0o000;
    if perm.readable {
        mode |= 0o444;
    }
    if perm.writable {
        mode |= 0o200;
    }
    if perm.executable {
        mode |= 0o111;
    }
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

/// Pre-delete hook. Nothing to do on Unix.
pub fn prepare_remove(_path: &Path) {}
