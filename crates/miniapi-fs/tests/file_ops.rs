//! End-to-end file adapter tests against real temporary directories.

use std::sync::Arc;

use miniapi_core::{ops, Config, FallbackPolicy, MiniapiError, PlatformContext};
use miniapi_fs::{FileOps, LogicalPath, OpenMode, Permissions};

fn default_ops() -> FileOps {
    FileOps::new(Arc::new(PlatformContext::with_defaults()))
}

fn logical(path: &std::path::Path) -> LogicalPath {
    let family = miniapi_core::detect().family;
    LogicalPath::from_native(path, family).unwrap()
}

#[test]
fn write_read_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let ops = default_ops();
    let path = logical(&dir.path().join("data.bin"));

    let mut handle = ops.open(&path, OpenMode::Write).unwrap();
    assert_eq!(handle.write(b"hello miniapi").unwrap(), 13);
    handle.close().unwrap();

    let mut handle = ops.open(&path, OpenMode::Read).unwrap();
    let mut buf = [0u8; 32];
    let n = handle.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"hello miniapi");
    handle.close().unwrap();
}

#[test]
fn append_mode_extends_file() {
    let dir = tempfile::tempdir().unwrap();
    let ops = default_ops();
    let path = logical(&dir.path().join("log.txt"));

    let mut h = ops.open(&path, OpenMode::Write).unwrap();
    h.write(b"one").unwrap();
    h.close().unwrap();

    let mut h = ops.open(&path, OpenMode::Append).unwrap();
    h.write(b"two").unwrap();
    h.close().unwrap();

    assert_eq!(ops.stat(&path).unwrap().size, 6);
}

#[test]
fn stat_reports_directory_and_size() {
    let dir = tempfile::tempdir().unwrap();
    let ops = default_ops();

    let sub = logical(&dir.path().join("sub"));
    ops.create_dir(&sub).unwrap();
    assert!(ops.stat(&sub).unwrap().is_dir);

    let file = logical(&dir.path().join("f.txt"));
    std::fs::write(dir.path().join("f.txt"), b"12345").unwrap();
    let stat = ops.stat(&file).unwrap();
    assert!(!stat.is_dir);
    assert_eq!(stat.size, 5);
    assert!(stat.modified_unix_ms.is_some());
}

#[test]
fn stat_missing_path_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let ops = default_ops();
    let path = logical(&dir.path().join("ghost"));
    assert!(matches!(
        ops.stat(&path).unwrap_err(),
        MiniapiError::NotFound { .. }
    ));
}

#[test]
fn list_dir_returns_logical_entries() {
    let dir = tempfile::tempdir().unwrap();
    let ops = default_ops();
    std::fs::write(dir.path().join("a.txt"), b"").unwrap();
    std::fs::write(dir.path().join("b.txt"), b"").unwrap();

    let root = logical(dir.path());
    let mut names: Vec<String> = ops
        .list_dir(&root)
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(names, ["a.txt", "b.txt"]);
    // Entries come back in logical form regardless of native separators.
    for entry in ops.list_dir(&root).unwrap() {
        assert!(!entry.as_str().contains('\\'));
    }
}

#[test]
fn rename_and_copy() {
    let dir = tempfile::tempdir().unwrap();
    let ops = default_ops();
    let a = logical(&dir.path().join("a.txt"));
    let b = logical(&dir.path().join("b.txt"));
    let c = logical(&dir.path().join("c.txt"));

    std::fs::write(dir.path().join("a.txt"), b"payload").unwrap();
    ops.rename(&a, &b).unwrap();
    assert!(matches!(
        ops.stat(&a).unwrap_err(),
        MiniapiError::NotFound { .. }
    ));

    let copied = ops.copy_file(&b, &c).unwrap();
    assert_eq!(copied, 7);
    assert_eq!(ops.stat(&b).unwrap().size, ops.stat(&c).unwrap().size);
}

#[test]
fn permissions_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let ops = default_ops();
    let path = logical(&dir.path().join("locked.txt"));
    std::fs::write(dir.path().join("locked.txt"), b"x").unwrap();

    ops.set_permissions(
        &path,
        Permissions {
            readable: true,
            writable: false,
            executable: false,
        },
    )
    .unwrap();
    assert!(!ops.stat(&path).unwrap().permissions.writable);

    ops.set_permissions(
        &path,
        Permissions {
            readable: true,
            writable: true,
            executable: false,
        },
    )
    .unwrap();
    assert!(ops.stat(&path).unwrap().permissions.writable);
}

#[test]
fn find_files_matches_recursively() {
    let dir = tempfile::tempdir().unwrap();
    let ops = default_ops();
    std::fs::create_dir_all(dir.path().join("nested/deep")).unwrap();
    std::fs::write(dir.path().join("top.log"), b"").unwrap();
    std::fs::write(dir.path().join("nested/mid.log"), b"").unwrap();
    std::fs::write(dir.path().join("nested/deep/low.log"), b"").unwrap();
    std::fs::write(dir.path().join("nested/other.txt"), b"").unwrap();

    let root = logical(dir.path());
    let hits = ops.find_files(&root, "*.log").unwrap();
    assert_eq!(hits.len(), 3);
    // Sorted output is part of the contract.
    let mut sorted = hits.clone();
    sorted.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    assert_eq!(hits, sorted);
}

#[test]
fn remove_recursive_native_and_emulated_agree() {
    fn build_tree(root: &std::path::Path) {
        std::fs::create_dir_all(root.join("a/b/c")).unwrap();
        std::fs::write(root.join("a/top.txt"), b"1").unwrap();
        std::fs::write(root.join("a/b/mid.txt"), b"2").unwrap();
        std::fs::write(root.join("a/b/c/leaf.txt"), b"3").unwrap();
    }

    let native_dir = tempfile::tempdir().unwrap();
    let emulated_dir = tempfile::tempdir().unwrap();
    build_tree(native_dir.path());
    build_tree(emulated_dir.path());

    let native_ops = default_ops();
    native_ops
        .remove_recursive(&logical(&native_dir.path().join("a")))
        .unwrap();

    let mut config = Config::default();
    config
        .fallback_overrides
        .insert(ops::FS_REMOVE_RECURSIVE.to_string(), FallbackPolicy::Emulate);
    let emulated_ops = FileOps::new(Arc::new(PlatformContext::new(&config)));
    emulated_ops
        .remove_recursive(&logical(&emulated_dir.path().join("a")))
        .unwrap();

    // Both trees are fully gone; both calls are idempotent afterwards.
    assert!(!native_dir.path().join("a").exists());
    assert!(!emulated_dir.path().join("a").exists());
    native_ops
        .remove_recursive(&logical(&native_dir.path().join("a")))
        .unwrap();
    emulated_ops
        .remove_recursive(&logical(&emulated_dir.path().join("a")))
        .unwrap();
}

#[test]
fn remove_recursive_on_single_file() {
    let dir = tempfile::tempdir().unwrap();
    let ops = default_ops();
    std::fs::write(dir.path().join("single.txt"), b"x").unwrap();
    let path = logical(&dir.path().join("single.txt"));
    ops.remove_recursive(&path).unwrap();
    assert!(!dir.path().join("single.txt").exists());
}

#[test]
fn noop_override_skips_mutation() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("keep.txt"), b"x").unwrap();

    let mut config = Config::default();
    config
        .fallback_overrides
        .insert(ops::FS_DELETE.to_string(), FallbackPolicy::NoOp);
    let fops = FileOps::new(Arc::new(PlatformContext::new(&config)));

    let path = logical(&dir.path().join("keep.txt"));
    fops.delete_file(&path).unwrap();
    // NoOp succeeds without deleting anything.
    assert!(dir.path().join("keep.txt").exists());
}

#[test]
fn noop_override_on_query_is_unsupported() {
    let mut config = Config::default();
    config
        .fallback_overrides
        .insert(ops::FS_STAT.to_string(), FallbackPolicy::NoOp);
    let fops = FileOps::new(Arc::new(PlatformContext::new(&config)));

    let path = LogicalPath::new("/tmp/anything").unwrap();
    assert!(matches!(
        fops.stat(&path).unwrap_err(),
        MiniapiError::Unsupported { .. }
    ));
}

#[test]
fn emulate_override_without_emulation_is_unsupported() {
    // Only recursive delete ships an emulation; routing any other
    // operation to Emulate must refuse instead of silently running the
    // native implementation.
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("keep.txt"), b"x").unwrap();

    let mut config = Config::default();
    config
        .fallback_overrides
        .insert(ops::FS_OPEN.to_string(), FallbackPolicy::Emulate);
    config
        .fallback_overrides
        .insert(ops::FS_DELETE.to_string(), FallbackPolicy::Emulate);
    let fops = FileOps::new(Arc::new(PlatformContext::new(&config)));

    let path = logical(&dir.path().join("keep.txt"));
    assert!(matches!(
        fops.open(&path, OpenMode::Read).unwrap_err(),
        MiniapiError::Unsupported { .. }
    ));
    assert!(matches!(
        fops.delete_file(&path).unwrap_err(),
        MiniapiError::Unsupported { .. }
    ));
    assert!(dir.path().join("keep.txt").exists());
}

#[test]
fn find_in_files_reports_path_and_line() {
    let dir = tempfile::tempdir().unwrap();
    let ops = default_ops();
    std::fs::create_dir_all(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("a.log"), b"plain\nneedle here\n").unwrap();
    std::fs::write(dir.path().join("sub/b.log"), b"needle first\nlast\n").unwrap();
    std::fs::write(dir.path().join("c.txt"), b"needle in wrong extension\n").unwrap();

    let hits = ops
        .find_in_files(&logical(dir.path()), "*.log", "needle")
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits[0].path.as_str().ends_with("a.log"));
    assert_eq!(hits[0].line, 2);
    assert_eq!(hits[0].text, "needle here");
    assert!(hits[1].path.as_str().ends_with("b.log"));
    assert_eq!(hits[1].line, 1);
}

#[test]
fn find_in_files_skips_non_utf8_content() {
    let dir = tempfile::tempdir().unwrap();
    let ops = default_ops();
    std::fs::write(dir.path().join("bin.log"), [0xffu8, 0xfe, 0x6e]).unwrap();
    std::fs::write(dir.path().join("text.log"), b"marker\n").unwrap();

    let hits = ops
        .find_in_files(&logical(dir.path()), "*.log", "marker")
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].path.as_str().ends_with("text.log"));
}

#[test]
fn find_in_files_rejects_empty_needle() {
    let ops = default_ops();
    let err = ops
        .find_in_files(&LogicalPath::new("/tmp").unwrap(), "*", "")
        .unwrap_err();
    assert!(matches!(err, MiniapiError::InvalidArgument { .. }));
}

#[test]
fn hash_file_tracks_content() {
    let dir = tempfile::tempdir().unwrap();
    let ops = default_ops();
    std::fs::write(dir.path().join("one.bin"), b"payload").unwrap();
    std::fs::write(dir.path().join("two.bin"), b"payload").unwrap();
    std::fs::write(dir.path().join("three.bin"), b"different").unwrap();

    let one = ops.hash_file(&logical(&dir.path().join("one.bin"))).unwrap();
    let two = ops.hash_file(&logical(&dir.path().join("two.bin"))).unwrap();
    let three = ops
        .hash_file(&logical(&dir.path().join("three.bin")))
        .unwrap();

    assert_eq!(one, two);
    assert_ne!(one, three);
    assert_eq!(one.len(), 64);
    assert!(one.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn hash_missing_file_is_not_found() {
    let ops = default_ops();
    let err = ops
        .hash_file(&LogicalPath::new("/definitely/not/here.bin").unwrap())
        .unwrap_err();
    assert!(matches!(err, MiniapiError::NotFound { .. }));
}

#[test]
fn handle_family_matches_detected_platform() {
    let dir = tempfile::tempdir().unwrap();
    let fops = default_ops();
    let path = logical(&dir.path().join("h.txt"));
    let handle = fops.open(&path, OpenMode::Write).unwrap();
    assert_eq!(handle.family(), miniapi_core::detect().family);
    handle.close().unwrap();
}
