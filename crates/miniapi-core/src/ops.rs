//! Abstract operation name constants.
//!
//! Every dispatchable operation in the layer has a stable dotted name.
//! These names are the keys of the capability registry and of the
//! `fallback_overrides` configuration map.
//!
//! ## Naming Structure
//!
//! ```text
//! <adapter>.<operation>[.<detail>]
//! ```
//!
//! Where:
//! - `adapter` = feature area (`fs`, `proc`, `net`, `telemetry`, `log`)
//! - `operation` = the abstract call
//! - `detail` = sub-operation where one call fans out per option
//!   (e.g., `net.set_option.keep_alive`)
//!
//! Adapters must resolve through these constants rather than inventing
//! ad-hoc strings, so that configuration overrides and registry rules stay
//! in one namespace.

// ---------------------------------------------------------------------------
// File operations
// ---------------------------------------------------------------------------

/// Open a file handle.
pub const FS_OPEN: &str = "fs.open";
/// Create an empty file.
pub const FS_CREATE: &str = "fs.create";
/// Delete a single file.
pub const FS_DELETE: &str = "fs.delete";
/// Create a directory (with parents).
pub const FS_CREATE_DIR: &str = "fs.create_dir";
/// Remove an empty directory.
pub const FS_REMOVE_DIR: &str = "fs.remove_dir";
/// Recursively delete a directory tree.
///
/// Has an `Emulate` fallback built from [`FS_LIST_DIR`] + [`FS_DELETE`] +
/// [`FS_REMOVE_DIR`].
pub const FS_REMOVE_RECURSIVE: &str = "fs.remove_recursive";
/// List directory entries.
pub const FS_LIST_DIR: &str = "fs.list_dir";
/// Stat a path (size, mtime, reduced permissions).
pub const FS_STAT: &str = "fs.stat";
/// Apply the reduced cross-platform permission set.
pub const FS_SET_PERMISSIONS: &str = "fs.set_permissions";
/// Rename/move within a filesystem.
pub const FS_RENAME: &str = "fs.rename";
/// Copy a single file.
pub const FS_COPY: &str = "fs.copy";
/// Glob-style file search.
pub const FS_FIND: &str = "fs.find";
/// Line-oriented content search across glob-matched files.
pub const FS_SEARCH: &str = "fs.search";
/// Content digest of a single file.
pub const FS_HASH: &str = "fs.hash";

// ---------------------------------------------------------------------------
// Process management
// ---------------------------------------------------------------------------

/// Spawn a subprocess.
pub const PROC_SPAWN: &str = "proc.spawn";
/// Deliver an abstract signal to a child.
pub const PROC_SIGNAL: &str = "proc.signal";
/// Wait for child exit with timeout.
pub const PROC_WAIT: &str = "proc.wait";
/// Liveness poll.
pub const PROC_IS_ALIVE: &str = "proc.is_alive";
/// Locate an executable on the search path.
pub const PROC_FIND_EXECUTABLE: &str = "proc.find_executable";

// ---------------------------------------------------------------------------
// Network access
// ---------------------------------------------------------------------------

/// Establish a connection.
pub const NET_CONNECT: &str = "net.connect";
/// Send bytes on a connected handle.
pub const NET_SEND: &str = "net.send";
/// Receive bytes on a connected handle.
pub const NET_RECEIVE: &str = "net.receive";
/// Read/write timeout socket options.
pub const NET_SET_OPTION_TIMEOUT: &str = "net.set_option.timeout";
/// SO_KEEPALIVE socket option.
pub const NET_SET_OPTION_KEEP_ALIVE: &str = "net.set_option.keep_alive";
/// SO_RCVBUF/SO_SNDBUF socket options.
pub const NET_SET_OPTION_BUFFER_SIZE: &str = "net.set_option.buffer_size";

// ---------------------------------------------------------------------------
// Logging & telemetry
// ---------------------------------------------------------------------------

/// Console log sink.
pub const LOG_SINK_CONSOLE: &str = "log.sink.console";
/// File log sink.
pub const LOG_SINK_FILE: &str = "log.sink.file";
/// Platform-native event log sink (syslog / debugger output).
pub const LOG_SINK_NATIVE: &str = "log.sink.native";
/// CPU usage sample.
pub const TELEMETRY_SAMPLE_CPU: &str = "telemetry.sample.cpu";
/// Memory usage sample.
pub const TELEMETRY_SAMPLE_MEMORY: &str = "telemetry.sample.memory";
/// IO byte-counter sample.
pub const TELEMETRY_SAMPLE_IO: &str = "telemetry.sample.io";

/// All operation names known to the static registry table.
///
/// Used for override validation and exercised by registry tests.
pub const ALL_OPERATIONS: &[&str] = &[
    FS_OPEN,
    FS_CREATE,
    FS_DELETE,
    FS_CREATE_DIR,
    FS_REMOVE_DIR,
    FS_REMOVE_RECURSIVE,
    FS_LIST_DIR,
    FS_STAT,
    FS_SET_PERMISSIONS,
    FS_RENAME,
    FS_COPY,
    FS_FIND,
    FS_SEARCH,
    FS_HASH,
    PROC_SPAWN,
    PROC_SIGNAL,
    PROC_WAIT,
    PROC_IS_ALIVE,
    PROC_FIND_EXECUTABLE,
    NET_CONNECT,
    NET_SEND,
    NET_RECEIVE,
    NET_SET_OPTION_TIMEOUT,
    NET_SET_OPTION_KEEP_ALIVE,
    NET_SET_OPTION_BUFFER_SIZE,
    LOG_SINK_CONSOLE,
    LOG_SINK_FILE,
    LOG_SINK_NATIVE,
    TELEMETRY_SAMPLE_CPU,
    TELEMETRY_SAMPLE_MEMORY,
    TELEMETRY_SAMPLE_IO,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for op in ALL_OPERATIONS {
            assert!(seen.insert(*op), "duplicate operation name: {op}");
        }
    }

    #[test]
    fn operation_names_are_namespaced() {
        for op in ALL_OPERATIONS {
            assert!(
                op.contains('.'),
                "operation {op} should be <adapter>.<operation>"
            );
        }
    }
}
