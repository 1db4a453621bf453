//! miniapi-fs: Cross-platform file operations adapter
//!
//! This crate provides a uniform filesystem surface over divergent path,
//! permission, and locking semantics:
//!
//! - **Logical paths**: callers use `/`-separated [`LogicalPath`] values;
//!   the adapter normalizes to native form and back (see [`path`])
//! - **Reduced permissions**: the cross-platform
//!   {readable, writable, executable} set instead of native bit layouts
//! - **Handles**: [`FileHandle`] owns one open file for its lifetime,
//!   bound to the backend it was resolved against, released exactly once
//!
//! All operations are synchronous and blocking. The adapter adds no
//! locking of its own; when the underlying filesystem reports contention
//! it surfaces as `MiniapiError::ResourceBusy`.
//!
//! ## Platform Support
//!
//! | Concern | Unix | Windows |
//! |---------|------|---------|
//! | Permissions | mode bits (owner triad) | read-only attribute + extension |
//! | Busy detection | EBUSY / ETXTBSY | sharing / lock violation |
//! | Read-only delete | n/a | attribute cleared first |

use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use tracing::debug;

use miniapi_core::{ops, Execution, Family, MiniapiError, MiniapiResult, PlatformContext};

mod path;
#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
use unix as platform;
#[cfg(windows)]
use windows as platform;

pub use path::LogicalPath;

/// Chunk size for streaming file digests.
const HASH_CHUNK_SIZE: usize = 64 * 1024;

// ============================================================================
// Core Types
// ============================================================================

/// Reduced cross-platform permission set.
///
/// Platform-specific bit layouts are never exposed; see the platform
/// modules for the exact reduction on each family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Permissions {
    pub readable: bool,
    pub writable: bool,
    pub executable: bool,
}

/// Normalized file metadata.
#[derive(Debug, Clone, Serialize)]
pub struct FileStat {
    /// Size in bytes.
    pub size: u64,
    /// Modification time as Unix epoch milliseconds, when the platform
    /// provides one.
    pub modified_unix_ms: Option<u64>,
    /// Reduced permission set.
    pub permissions: Permissions,
    /// True for directories.
    pub is_dir: bool,
}

/// A line matched by [`FileOps::find_in_files`].
#[derive(Debug, Clone, Serialize)]
pub struct ContentMatch {
    /// File containing the match.
    pub path: LogicalPath,
    /// 1-based line number.
    pub line: u64,
    /// The matching line, without its terminator.
    pub text: String,
}

/// How to open a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only; the file must exist.
    Read,
    /// Write-only; created if missing, truncated if present.
    Write,
    /// Write-only; created if missing, appended if present.
    Append,
    /// Read and write; created if missing, not truncated.
    ReadWrite,
}

/// Exclusively-owned open file.
///
/// Bound to the backend family it was resolved against for its entire
/// lifetime; handles are never migrated across backends. Release happens
/// exactly once: explicitly via [`FileHandle::close`], or on drop as the
/// error-path backstop. Not safe for concurrent use from multiple threads
/// without caller-side synchronization.
#[derive(Debug)]
pub struct FileHandle {
    file: fs::File,
    path: LogicalPath,
    family: Family,
}

impl FileHandle {
    /// Read into `buf`, returning the number of bytes read.
    pub fn read(&mut self, buf: &mut [u8]) -> MiniapiResult<usize> {
        self.file
            .read(buf)
            .map_err(|e| map_fs_error(e, "fs.read", &self.path))
    }

    /// Write `buf`, returning the number of bytes written.
    pub fn write(&mut self, buf: &[u8]) -> MiniapiResult<usize> {
        self.file
            .write(buf)
            .map_err(|e| map_fs_error(e, "fs.write", &self.path))
    }

    /// Reposition the file cursor.
    pub fn seek(&mut self, pos: SeekFrom) -> MiniapiResult<u64> {
        self.file
            .seek(pos)
            .map_err(|e| map_fs_error(e, "fs.seek", &self.path))
    }

    /// Flush and release the handle.
    pub fn close(mut self) -> MiniapiResult<()> {
        self.file
            .flush()
            .map_err(|e| map_fs_error(e, "fs.close", &self.path))
        // File descriptor released when `self` drops here.
    }

    /// The backend family this handle is bound to.
    pub fn family(&self) -> Family {
        self.family
    }

    /// The logical path this handle was opened from.
    pub fn path(&self) -> &LogicalPath {
        &self.path
    }
}

// ============================================================================
// Adapter
// ============================================================================

/// The file operations adapter.
///
/// Construct one per [`PlatformContext`]; cheap to clone the `Arc` behind
/// it. Every operation dispatches through the capability registry first.
pub struct FileOps {
    ctx: Arc<PlatformContext>,
}

impl FileOps {
    pub fn new(ctx: Arc<PlatformContext>) -> Self {
        FileOps { ctx }
    }

    fn family(&self) -> Family {
        self.ctx.profile().family
    }

    fn native(&self, path: &LogicalPath) -> PathBuf {
        path.to_native(self.family())
    }

    /// Dispatch for operations with no distinct emulation that must
    /// produce data. A configured no-op cannot fabricate a result, and a
    /// configured emulation has nothing to run; both degrade to
    /// `Unsupported` instead of silently taking the native path.
    fn dispatch_query(&self, operation: &str) -> MiniapiResult<()> {
        match self.ctx.dispatch(operation)? {
            Execution::Native => Ok(()),
            Execution::Emulated | Execution::Skipped => Err(MiniapiError::unsupported(
                operation,
                self.family().as_str(),
            )),
        }
    }

    /// Dispatch for mutations with no distinct emulation. A configured
    /// no-op succeeds without effect (`false`); a configured emulation
    /// has nothing to run and degrades to `Unsupported`.
    fn dispatch_mutation(&self, operation: &str) -> MiniapiResult<bool> {
        match self.ctx.dispatch(operation)? {
            Execution::Native => Ok(true),
            Execution::Skipped => Ok(false),
            Execution::Emulated => Err(MiniapiError::unsupported(
                operation,
                self.family().as_str(),
            )),
        }
    }

    /// Open a file.
    pub fn open(&self, path: &LogicalPath, mode: OpenMode) -> MiniapiResult<FileHandle> {
        self.dispatch_query(ops::FS_OPEN)?;
        let mut options = fs::OpenOptions::new();
        match mode {
            OpenMode::Read => options.read(true),
            OpenMode::Write => options.write(true).create(true).truncate(true),
            OpenMode::Append => options.append(true).create(true),
            OpenMode::ReadWrite => options.read(true).write(true).create(true),
        };
        let file = options
            .open(self.native(path))
            .map_err(|e| map_fs_error(e, ops::FS_OPEN, path))?;
        Ok(FileHandle {
            file,
            path: path.clone(),
            family: self.family(),
        })
    }

    /// Create an empty file (truncating any existing content).
    pub fn create_file(&self, path: &LogicalPath) -> MiniapiResult<()> {
        if !self.dispatch_mutation(ops::FS_CREATE)? {
            return Ok(());
        }
        fs::File::create(self.native(path))
            .map(|_| ())
            .map_err(|e| map_fs_error(e, ops::FS_CREATE, path))
    }

    /// Delete a single file.
    ///
    /// Deleting a path that does not exist succeeds (idempotent delete).
    pub fn delete_file(&self, path: &LogicalPath) -> MiniapiResult<()> {
        if !self.dispatch_mutation(ops::FS_DELETE)? {
            return Ok(());
        }
        let native = self.native(path);
        platform::prepare_remove(&native);
        match fs::remove_file(&native) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_fs_error(e, ops::FS_DELETE, path)),
        }
    }

    /// Create a directory, including missing parents.
    pub fn create_dir(&self, path: &LogicalPath) -> MiniapiResult<()> {
        if !self.dispatch_mutation(ops::FS_CREATE_DIR)? {
            return Ok(());
        }
        fs::create_dir_all(self.native(path))
            .map_err(|e| map_fs_error(e, ops::FS_CREATE_DIR, path))
    }

    /// Remove an empty directory.
    pub fn remove_dir(&self, path: &LogicalPath) -> MiniapiResult<()> {
        if !self.dispatch_mutation(ops::FS_REMOVE_DIR)? {
            return Ok(());
        }
        match fs::remove_dir(self.native(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_fs_error(e, ops::FS_REMOVE_DIR, path)),
        }
    }

    /// Recursively delete a directory tree (or a single file).
    ///
    /// Deleting a missing path succeeds. With the `Emulate` fallback
    /// configured, the tree is walked deterministically using only the
    /// supported list/delete/remove-dir primitives; the observable result
    /// is identical to the native implementation.
    pub fn remove_recursive(&self, path: &LogicalPath) -> MiniapiResult<()> {
        match self.ctx.dispatch(ops::FS_REMOVE_RECURSIVE)? {
            Execution::Skipped => Ok(()),
            Execution::Emulated => {
                debug!(path = %path, "removing tree via emulated walk");
                self.remove_recursive_emulated(path)
            }
            Execution::Native => {
                let native = self.native(path);
                let meta = match fs::symlink_metadata(&native) {
                    Ok(meta) => meta,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
                    Err(e) => return Err(map_fs_error(e, ops::FS_REMOVE_RECURSIVE, path)),
                };
                let result = if meta.is_dir() {
                    fs::remove_dir_all(&native)
                } else {
                    platform::prepare_remove(&native);
                    fs::remove_file(&native)
                };
                match result {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(map_fs_error(e, ops::FS_REMOVE_RECURSIVE, path)),
                }
            }
        }
    }

    /// Emulated recursive delete: list + delete, depth-first, sorted for
    /// determinism. Uses only primitives the registry already proved
    /// supported.
    fn remove_recursive_emulated(&self, path: &LogicalPath) -> MiniapiResult<()> {
        let stat = match self.stat(path) {
            Ok(stat) => stat,
            Err(MiniapiError::NotFound { .. }) => return Ok(()),
            Err(e) => return Err(e),
        };
        if !stat.is_dir {
            return self.delete_file(path);
        }
        let mut entries = self.list_dir(path)?;
        entries.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        for entry in entries {
            self.remove_recursive_emulated(&entry)?;
        }
        self.remove_dir(path)
    }

    /// List directory entries as logical paths.
    pub fn list_dir(&self, path: &LogicalPath) -> MiniapiResult<Vec<LogicalPath>> {
        self.dispatch_query(ops::FS_LIST_DIR)?;
        let read_dir = fs::read_dir(self.native(path))
            .map_err(|e| map_fs_error(e, ops::FS_LIST_DIR, path))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| map_fs_error(e, ops::FS_LIST_DIR, path))?;
            let name = entry.file_name();
            let name = name.to_str().ok_or_else(|| {
                MiniapiError::invalid_argument("directory entry is not valid UTF-8")
            })?;
            entries.push(path.join(name)?);
        }
        Ok(entries)
    }

    /// Stat a path.
    pub fn stat(&self, path: &LogicalPath) -> MiniapiResult<FileStat> {
        self.dispatch_query(ops::FS_STAT)?;
        let native = self.native(path);
        let meta = fs::metadata(&native).map_err(|e| map_fs_error(e, ops::FS_STAT, path))?;

        let modified_unix_ms = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64);

        Ok(FileStat {
            size: meta.len(),
            modified_unix_ms,
            permissions: platform::permissions_from(&native, &meta),
            is_dir: meta.is_dir(),
        })
    }

    /// Apply the reduced permission set.
    ///
    /// On Windows only the `writable` bit has a native representation;
    /// the executable bit is a documented no-op there.
    pub fn set_permissions(&self, path: &LogicalPath, perm: Permissions) -> MiniapiResult<()> {
        if !self.dispatch_mutation(ops::FS_SET_PERMISSIONS)? {
            return Ok(());
        }
        platform::apply_permissions(&self.native(path), perm)
            .map_err(|e| map_fs_error(e, ops::FS_SET_PERMISSIONS, path))
    }

    /// Rename or move within a filesystem.
    pub fn rename(&self, from: &LogicalPath, to: &LogicalPath) -> MiniapiResult<()> {
        if !self.dispatch_mutation(ops::FS_RENAME)? {
            return Ok(());
        }
        fs::rename(self.native(from), self.native(to))
            .map_err(|e| map_fs_error(e, ops::FS_RENAME, from))
    }

    /// Copy a single file, overwriting the destination.
    pub fn copy_file(&self, from: &LogicalPath, to: &LogicalPath) -> MiniapiResult<u64> {
        self.dispatch_query(ops::FS_COPY)?;
        fs::copy(self.native(from), self.native(to))
            .map_err(|e| map_fs_error(e, ops::FS_COPY, from))
    }

    /// Find files under `root` whose names match a glob pattern
    /// (`*` and `?` wildcards). Matching respects the platform's default
    /// path case sensitivity. Results are sorted logical paths; only
    /// regular files are returned.
    pub fn find_files(
        &self,
        root: &LogicalPath,
        pattern: &str,
    ) -> MiniapiResult<Vec<LogicalPath>> {
        self.dispatch_query(ops::FS_FIND)?;
        let case_sensitive = self.ctx.profile().capabilities.case_sensitive_paths;
        let mut results = Vec::new();
        self.find_files_walk(root, pattern, case_sensitive, &mut results)?;
        results.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(results)
    }

    fn find_files_walk(
        &self,
        dir: &LogicalPath,
        pattern: &str,
        case_sensitive: bool,
        results: &mut Vec<LogicalPath>,
    ) -> MiniapiResult<()> {
        for entry in self.list_dir(dir)? {
            let stat = match self.stat(&entry) {
                Ok(stat) => stat,
                // Entries can vanish between list and stat.
                Err(MiniapiError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            };
            if stat.is_dir {
                self.find_files_walk(&entry, pattern, case_sensitive, results)?;
            } else if let Some(name) = entry.file_name() {
                if glob_match(pattern, name, case_sensitive) {
                    results.push(entry.clone());
                }
            }
        }
        Ok(())
    }

    /// Search file contents under `root`.
    ///
    /// Candidate files are selected by the same glob rules as
    /// [`find_files`](FileOps::find_files); each is scanned line by line
    /// for the literal `needle`. Files that are not valid UTF-8 are
    /// skipped. Matches come back ordered by path, then line number.
    pub fn find_in_files(
        &self,
        root: &LogicalPath,
        pattern: &str,
        needle: &str,
    ) -> MiniapiResult<Vec<ContentMatch>> {
        self.dispatch_query(ops::FS_SEARCH)?;
        if needle.is_empty() {
            return Err(MiniapiError::invalid_argument("search text is empty"));
        }

        let mut matches = Vec::new();
        for file in self.find_files(root, pattern)? {
            let raw = match fs::read(self.native(&file)) {
                Ok(raw) => raw,
                // Candidates can vanish between the walk and the read.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(map_fs_error(e, ops::FS_SEARCH, &file)),
            };
            let Ok(content) = String::from_utf8(raw) else {
                continue;
            };
            for (index, line) in content.lines().enumerate() {
                if line.contains(needle) {
                    matches.push(ContentMatch {
                        path: file.clone(),
                        line: index as u64 + 1,
                        text: line.to_string(),
                    });
                }
            }
        }
        Ok(matches)
    }

    /// BLAKE3 digest of a file's contents as lowercase hex.
    ///
    /// The file is read in fixed-size chunks, so memory use stays flat
    /// regardless of file size.
    pub fn hash_file(&self, path: &LogicalPath) -> MiniapiResult<String> {
        self.dispatch_query(ops::FS_HASH)?;
        let mut file = fs::File::open(self.native(path))
            .map_err(|e| map_fs_error(e, ops::FS_HASH, path))?;

        let mut hasher = blake3::Hasher::new();
        let mut chunk = vec![0u8; HASH_CHUNK_SIZE];
        loop {
            let n = file
                .read(&mut chunk)
                .map_err(|e| map_fs_error(e, ops::FS_HASH, path))?;
            if n == 0 {
                break;
            }
            hasher.update(&chunk[..n]);
        }
        Ok(hasher.finalize().to_hex().to_string())
    }
}

/// Normalize a native filesystem error, catching contention codes first.
fn map_fs_error(err: std::io::Error, operation: &str, path: &LogicalPath) -> MiniapiError {
    if let Some(code) = err.raw_os_error() {
        if platform::is_busy_code(code) {
            return MiniapiError::resource_busy(path.as_str().to_string());
        }
    }
    MiniapiError::from_io(err, operation, path.as_str())
}

/// Minimal glob matcher supporting `*` (any run) and `?` (any one char).
fn glob_match(pattern: &str, name: &str, case_sensitive: bool) -> bool {
    let (pattern, name) = if case_sensitive {
        (pattern.to_string(), name.to_string())
    } else {
        (pattern.to_lowercase(), name.to_lowercase())
    };
    glob_match_inner(
        &pattern.chars().collect::<Vec<_>>(),
        &name.chars().collect::<Vec<_>>(),
    )
}

fn glob_match_inner(pattern: &[char], name: &[char]) -> bool {
    match (pattern.first(), name.first()) {
        (None, None) => true,
        (Some('*'), _) => {
            // `*` matches zero characters, or consumes one and stays.
            glob_match_inner(&pattern[1..], name)
                || (!name.is_empty() && glob_match_inner(pattern, &name[1..]))
        }
        (Some('?'), Some(_)) => glob_match_inner(&pattern[1..], &name[1..]),
        (Some(p), Some(n)) if p == n => glob_match_inner(&pattern[1..], &name[1..]),
        _ => false,
    }
}
