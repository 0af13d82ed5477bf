use std::fs;
use std::path::Path;

use fmbridge_ops::{
    FacadeConfig, FacadeEvent, FileManager, FsError, TaskKind, TaskStatus, DIRECTORY_MIME,
    OCTET_STREAM,
};
use tempfile::TempDir;

fn manager() -> FileManager {
    FileManager::new(FacadeConfig::default()).unwrap()
}

fn sample_tree(root: &Path) {
    fs::create_dir_all(root.join("b")).unwrap();
    fs::write(root.join("a.txt"), b"alpha").unwrap();
    fs::write(root.join("b").join("c.txt"), b"charlie").unwrap();
    fs::write(root.join(".hidden"), b"secret").unwrap();
}

#[test]
fn test_exists_tracks_create_and_remove() {
    let dir = TempDir::new().unwrap();
    let fm = manager();

    let file = dir.path().join("a.txt");
    fs::write(&file, b"x").unwrap();
    assert!(fm.exists_path(&file));
    assert!(fm.is_file(&file));
    fm.remove(&file).unwrap();
    assert!(!fm.exists_path(&file));

    let tree = dir.path().join("tree");
    sample_tree(&tree);
    assert!(fm.exists_path(&tree));
    assert!(!fm.is_file(&tree));
    fm.remove_dir(&tree).unwrap();
    assert!(!fm.exists_path(&tree));
}

#[test]
fn test_sync_copy_tree_with_hidden_entries() {
    let dir = TempDir::new().unwrap();
    let fm = manager();
    let source = dir.path().join("src");
    let target = dir.path().join("dst");
    sample_tree(&source);

    let stats = fm.cp_file(&source, &target).unwrap();

    assert_eq!(fs::read(target.join("a.txt")).unwrap(), b"alpha");
    assert_eq!(fs::read(target.join("b").join("c.txt")).unwrap(), b"charlie");
    assert_eq!(fs::read(target.join(".hidden")).unwrap(), b"secret");
    assert_eq!(stats.files, 3);
    assert_eq!(stats.directories, 2);
    assert_eq!(stats.bytes, 18);
}

#[test]
fn test_sync_copy_refuses_existing_directory() {
    let dir = TempDir::new().unwrap();
    let fm = manager();
    let source = dir.path().join("src");
    let target = dir.path().join("dst");
    sample_tree(&source);
    fs::create_dir(&target).unwrap();

    let err = fm.cp_file(&source, &target).unwrap_err();
    assert!(matches!(err, FsError::AlreadyExists { .. }));
}

#[test]
fn test_sync_copy_merges_when_overwriting() {
    let dir = TempDir::new().unwrap();
    let config = FacadeConfig::builder().overwrite(true).build().unwrap();
    let fm = FileManager::new(config).unwrap();
    let source = dir.path().join("src");
    let target = dir.path().join("dst");
    sample_tree(&source);
    fs::create_dir(&target).unwrap();
    fs::write(target.join("a.txt"), b"stale").unwrap();
    fs::write(target.join("keep.txt"), b"keep").unwrap();

    fm.cp_file(&source, &target).unwrap();
    assert_eq!(fs::read(target.join("a.txt")).unwrap(), b"alpha");
    assert!(target.join("keep.txt").exists());
}

#[tokio::test]
async fn test_async_copy_preserves_size() {
    let dir = TempDir::new().unwrap();
    let fm = manager();
    let source = dir.path().join("blob.bin");
    let target = dir.path().join("blob-copy.bin");
    fs::write(&source, vec![42u8; 64 * 1024]).unwrap();

    let handle = fm.copy_file(&source, &target);
    assert_eq!(handle.kind(), TaskKind::Copy);
    let stats = handle.wait().await.unwrap();

    assert_eq!(stats.bytes, 64 * 1024);
    assert_eq!(fm.size(&target).unwrap(), fm.size(&source).unwrap());
    assert!(fm.cp_result());
}

#[tokio::test]
async fn test_async_copy_failure_publishes_false() {
    let dir = TempDir::new().unwrap();
    let fm = manager();
    let mut cp_rx = fm.subscribe_cp_result();

    let handle = fm.copy_file(dir.path().join("missing"), dir.path().join("out"));
    let id = handle.id();
    let err = handle.wait().await.unwrap_err();

    assert!(matches!(err, FsError::NotFound { .. }));
    assert!(cp_rx.has_changed().unwrap());
    assert!(!*cp_rx.borrow_and_update());
    assert!(matches!(
        fm.registry().status(id),
        Some(TaskStatus::Failed(_))
    ));
}

#[tokio::test]
async fn test_cp_result_reflects_last_completed() {
    let dir = TempDir::new().unwrap();
    let fm = manager();
    let source = dir.path().join("a.txt");
    fs::write(&source, b"a").unwrap();

    fm.copy_file(&source, dir.path().join("b.txt"))
        .wait()
        .await
        .unwrap();
    assert!(fm.cp_result());

    fm.copy_file(dir.path().join("nope"), dir.path().join("c.txt"))
        .wait()
        .await
        .unwrap_err();
    assert!(!fm.cp_result());
}

#[tokio::test]
async fn test_concurrent_copies_keep_their_own_results() {
    let dir = TempDir::new().unwrap();
    let fm = manager();
    let small = dir.path().join("small.txt");
    let large = dir.path().join("large.bin");
    fs::write(&small, b"tiny").unwrap();
    fs::write(&large, vec![1u8; 256 * 1024]).unwrap();

    let first = fm.copy_file(&large, dir.path().join("large-copy.bin"));
    let second = fm.copy_file(&small, dir.path().join("small-copy.txt"));
    let failing = fm.copy_file(dir.path().join("absent"), dir.path().join("x"));
    assert_ne!(first.id(), second.id());

    let (a, b, c) = tokio::join!(first.wait(), second.wait(), failing.wait());
    assert_eq!(a.unwrap().bytes, 256 * 1024);
    assert_eq!(b.unwrap().bytes, 4);
    assert!(c.is_err());
    assert!(fm.registry().running().is_empty());
}

#[tokio::test]
async fn test_move_file_waits_for_copy() {
    let dir = TempDir::new().unwrap();
    let fm = manager();
    let source = dir.path().join("src");
    let target = dir.path().join("moved");
    sample_tree(&source);

    let handle = fm.move_file(&source, &target);
    assert_eq!(handle.kind(), TaskKind::Move);
    handle.wait().await.unwrap();

    assert!(!fm.exists_path(&source));
    assert!(target.join("b").join("c.txt").exists());
    assert!(target.join(".hidden").exists());
    assert!(fm.cp_result());
}

#[tokio::test]
async fn test_failed_move_keeps_source() {
    let dir = TempDir::new().unwrap();
    let fm = manager();
    let source = dir.path().join("a.txt");
    let target = dir.path().join("b.txt");
    fs::write(&source, b"mine").unwrap();
    fs::write(&target, b"theirs").unwrap();

    let err = fm.move_file(&source, &target).wait().await.unwrap_err();
    assert!(matches!(err, FsError::AlreadyExists { .. }));
    assert!(source.exists());
    assert!(!fm.cp_result());
}

fn wide_tree(root: &Path, files: usize) {
    fs::create_dir_all(root).unwrap();
    for i in 0..files {
        fs::write(root.join(format!("file-{i:04}.txt")), b"payload").unwrap();
    }
}

#[tokio::test]
async fn test_cancel_copy_publishes_cancelled() {
    let dir = TempDir::new().unwrap();
    let fm = manager();
    let seed = dir.path().join("seed.txt");
    fs::write(&seed, b"x").unwrap();
    fm.copy_file(&seed, dir.path().join("seed-copy.txt"))
        .wait()
        .await
        .unwrap();
    assert!(fm.cp_result());

    let source = dir.path().join("wide");
    let target = dir.path().join("wide-copy");
    wide_tree(&source, 500);

    // On the current-thread runtime the transfer cannot start before we await.
    let handle = fm.copy_file(&source, &target);
    let id = handle.id();
    assert!(fm.cancel(id));

    let err = handle.wait().await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(fm.registry().status(id), Some(TaskStatus::Cancelled));
    assert!(!fm.cp_result());
    assert!(!target.exists());
    assert!(!fm.cancel(id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_running_copy() {
    let dir = TempDir::new().unwrap();
    let fm = manager();
    let source = dir.path().join("wide");
    let target = dir.path().join("wide-copy");
    wide_tree(&source, 2000);

    let handle = fm.copy_file(&source, &target);
    let id = handle.id();
    tokio::task::yield_now().await;
    handle.cancel();

    // The copy may finish before it sees the token.
    match handle.wait().await {
        Err(err) => {
            assert!(err.is_cancelled());
            assert_eq!(fm.registry().status(id), Some(TaskStatus::Cancelled));
            assert!(!fm.cp_result());
        }
        Ok(stats) => {
            assert_eq!(stats.files, 2000);
            assert!(fm.registry().status(id).unwrap().is_success());
            assert!(fm.cp_result());
        }
    }
    assert!(source.join("file-1999.txt").exists());
}

#[tokio::test]
async fn test_move_onto_containing_dir_keeps_source() {
    let dir = TempDir::new().unwrap();
    let config = FacadeConfig::builder().overwrite(true).build().unwrap();
    let fm = FileManager::new(config).unwrap();
    let parent = dir.path().join("parent");
    let child = parent.join("child");
    sample_tree(&child);

    let err = fm.move_file(&child, &parent).wait().await.unwrap_err();
    assert!(matches!(err, FsError::SourceIsAncestor { .. }));
    assert_eq!(fs::read(child.join("a.txt")).unwrap(), b"alpha");
    assert!(!fm.cp_result());
}

#[tokio::test]
async fn test_finished_records_are_capped() {
    let dir = TempDir::new().unwrap();
    let config = FacadeConfig::builder().retain_finished(2usize).build().unwrap();
    let fm = FileManager::new(config).unwrap();
    let source = dir.path().join("a.txt");
    fs::write(&source, b"a").unwrap();

    let mut ids = Vec::new();
    for i in 0..4 {
        let handle = fm.copy_file(&source, dir.path().join(format!("copy-{i}.txt")));
        ids.push(handle.id());
        handle.wait().await.unwrap();
    }

    assert_eq!(fm.registry().len(), 2);
    assert!(fm.registry().status(ids[0]).is_none());
    assert!(fm.registry().status(ids[1]).is_none());
    assert!(fm.registry().status(ids[3]).unwrap().is_success());
}

#[tokio::test]
async fn test_paste_follows_move_mode() {
    let dir = TempDir::new().unwrap();
    let fm = manager();
    let source = dir.path().join("a.txt");
    fs::write(&source, b"data").unwrap();

    fm.set_source_url(format!("file://{}", source.display()));
    fm.paste(dir.path().join("copy.txt"))
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert!(source.exists());

    fm.set_move_mode(true);
    let handle = fm.paste(dir.path().join("moved.txt")).unwrap();
    assert_eq!(handle.kind(), TaskKind::Move);
    handle.wait().await.unwrap();
    assert!(!source.exists());
    assert_eq!(fs::read(dir.path().join("moved.txt")).unwrap(), b"data");
}

#[tokio::test]
async fn test_events_report_task_lifecycle() {
    let dir = TempDir::new().unwrap();
    let fm = manager();
    let mut events = fm.events();
    let source = dir.path().join("a.txt");
    fs::write(&source, b"a").unwrap();

    let handle = fm.copy_file(&source, dir.path().join("b.txt"));
    let id = handle.id();
    handle.wait().await.unwrap();

    assert_eq!(
        events.recv().await.unwrap(),
        FacadeEvent::TaskStarted {
            id,
            kind: TaskKind::Copy
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        FacadeEvent::TaskFinished {
            id,
            kind: TaskKind::Copy,
            success: true
        }
    );
}

#[test]
fn test_mime_lookup() {
    let fm = manager();
    assert!(fm.mime("photo.jpg").starts_with("image/"));
    assert_eq!(fm.mime("https://example.com/download"), OCTET_STREAM);

    let dir = TempDir::new().unwrap();
    let music = dir.path().join("music");
    fs::create_dir(&music).unwrap();
    assert_eq!(fm.mime(music.to_str().unwrap()), DIRECTORY_MIME);
}

#[test]
fn test_stat_and_locations() {
    let dir = TempDir::new().unwrap();
    let config = FacadeConfig::builder()
        .data_dir(dir.path().join("appdata"))
        .build()
        .unwrap();
    let fm = FileManager::new(config).unwrap();

    let created = fm.ensure_data_dir().unwrap();
    assert_eq!(created, dir.path().join("appdata"));
    assert!(fm.stat(&created).unwrap().is_dir());
    assert!(fm.root().is_absolute() || cfg!(windows));
}
