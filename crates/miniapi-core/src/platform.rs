//! Platform detection.
//!
//! Identifies the host OS family, version, and architecture once per
//! process and exposes the result as immutable process-wide state.
//! Detection never fails: an unrecognized platform yields
//! [`Family::Unknown`] with every capability flag cleared, so downstream
//! fallback logic (not a crash) handles unsupported environments.

use std::env::consts::{ARCH, OS};
use std::path::PathBuf;
use std::sync::OnceLock;

use serde::Serialize;

/// Host operating-system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Linux,
    Macos,
    Windows,
    /// Platform not recognized by this build. All capability flags are
    /// cleared; the registry resolves everything as unsupported unless an
    /// explicit emulation rule is configured.
    Unknown,
}

impl Family {
    /// Lowercase name, matching the registry's platform strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Linux => "linux",
            Family::Macos => "macos",
            Family::Windows => "windows",
            Family::Unknown => "unknown",
        }
    }

    /// True for Unix-like families.
    pub fn is_unix(&self) -> bool {
        matches!(self, Family::Linux | Family::Macos)
    }
}

/// Feature flags describing what the detected platform can do natively.
///
/// Cleared entirely for [`Family::Unknown`].
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CapabilityFlags {
    /// Full Unix permission bits (owner/group/other rwx).
    pub unix_permissions: bool,
    /// POSIX signal delivery (kill with arbitrary signal numbers).
    pub posix_signals: bool,
    /// A readable /proc filesystem for self-inspection.
    pub proc_filesystem: bool,
    /// A platform-native event/system log sink.
    pub native_event_log: bool,
    /// Per-process IO byte counters.
    pub io_counters: bool,
    /// Default-case-sensitive filesystem paths.
    pub case_sensitive_paths: bool,
}

/// Immutable description of the host platform.
///
/// Created once by [`detect`], read-only for the rest of the process
/// lifetime, safe for unsynchronized concurrent reads.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformProfile {
    /// OS family.
    pub family: Family,
    /// Kernel/OS version string, best-effort (may be empty).
    pub version: String,
    /// CPU architecture (e.g., "x86_64", "aarch64").
    pub architecture: String,
    /// What this platform supports natively.
    pub capabilities: CapabilityFlags,
}

static PROFILE: OnceLock<PlatformProfile> = OnceLock::new();

/// Detect the host platform.
///
/// Computed lazily on first call and cached for the process lifetime.
/// Never fails; see [`Family::Unknown`].
pub fn detect() -> &'static PlatformProfile {
    PROFILE.get_or_init(detect_uncached)
}

fn detect_uncached() -> PlatformProfile {
    let family = match OS {
        "linux" => Family::Linux,
        "macos" => Family::Macos,
        "windows" => Family::Windows,
        _ => Family::Unknown,
    };

    PlatformProfile {
        family,
        version: os_version(family),
        architecture: ARCH.to_string(),
        capabilities: flags_for(family),
    }
}

fn flags_for(family: Family) -> CapabilityFlags {
    match family {
        Family::Linux => CapabilityFlags {
            unix_permissions: true,
            posix_signals: true,
            proc_filesystem: true,
            native_event_log: true,
            io_counters: true,
            case_sensitive_paths: true,
        },
        Family::Macos => CapabilityFlags {
            unix_permissions: true,
            posix_signals: true,
            proc_filesystem: false,
            native_event_log: true,
            io_counters: false,
            case_sensitive_paths: false,
        },
        Family::Windows => CapabilityFlags {
            unix_permissions: false,
            posix_signals: false,
            proc_filesystem: false,
            native_event_log: true,
            io_counters: true,
            case_sensitive_paths: false,
        },
        Family::Unknown => CapabilityFlags::default(),
    }
}

/// Best-effort OS version string.
///
/// Empty string when the platform provides no cheap way to read it.
fn os_version(family: Family) -> String {
    match family {
        Family::Linux => std::fs::read_to_string("/proc/sys/kernel/osrelease")
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        #[cfg(unix)]
        Family::Macos => uname_release().unwrap_or_default(),
        _ => String::new(),
    }
}

#[cfg(unix)]
fn uname_release() -> Option<String> {
    use std::ffi::CStr;

    let mut info: libc::utsname = unsafe { std::mem::zeroed() };
    // SAFETY: uname fills the caller-provided struct; zeroed is a valid
    // initial state for it.
    if unsafe { libc::uname(&mut info) } != 0 {
        return None;
    }
    let release = unsafe { CStr::from_ptr(info.release.as_ptr()) };
    Some(release.to_string_lossy().into_owned())
}

// ============================================================================
// Standard Directories
// ============================================================================

/// The user's home directory, when one can be determined.
pub fn home_dir() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("HOME") {
        if !home.is_empty() {
            return Some(PathBuf::from(home));
        }
    }
    // Windows fallback
    if let Some(profile) = std::env::var_os("USERPROFILE") {
        if !profile.is_empty() {
            return Some(PathBuf::from(profile));
        }
    }
    None
}

/// Per-user configuration directory for `app`, following the platform
/// convention (XDG on Linux, Library on macOS, AppData on Windows).
pub fn config_dir(app: &str) -> Option<PathBuf> {
    let base = match detect().family {
        Family::Windows => std::env::var_os("LOCALAPPDATA")
            .map(PathBuf::from)
            .or_else(|| home_dir().map(|h| h.join("AppData").join("Local")))?,
        Family::Macos => home_dir()?.join("Library").join("Application Support"),
        _ => std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| home_dir().map(|h| h.join(".config")))?,
    };
    Some(base.join(app))
}

/// Per-user cache directory for `app`.
pub fn cache_dir(app: &str) -> Option<PathBuf> {
    let base = match detect().family {
        Family::Windows => std::env::var_os("LOCALAPPDATA")
            .map(|p| PathBuf::from(p).join("Temp"))
            .or_else(|| home_dir().map(|h| h.join("AppData").join("Local").join("Temp")))?,
        Family::Macos => home_dir()?.join("Library").join("Caches"),
        _ => std::env::var_os("XDG_CACHE_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| home_dir().map(|h| h.join(".cache")))?,
    };
    Some(base.join(app))
}

/// Per-user data directory for `app`.
pub fn data_dir(app: &str) -> Option<PathBuf> {
    let base = match detect().family {
        Family::Windows => std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .or_else(|| home_dir().map(|h| h.join("AppData").join("Roaming")))?,
        Family::Macos => home_dir()?.join("Library").join("Application Support"),
        _ => std::env::var_os("XDG_DATA_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| home_dir().map(|h| h.join(".local").join("share")))?,
    };
    Some(base.join(app))
}

/// Line separator convention for the detected family.
pub fn line_separator() -> &'static str {
    match detect().family {
        Family::Windows => "\r\n",
        _ => "\n",
    }
}

/// Separator used in PATH-style environment variables.
pub fn env_path_separator() -> char {
    match detect().family {
        Family::Windows => ';',
        _ => ':',
    }
}
