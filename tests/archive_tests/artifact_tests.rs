//! Tests for ArtifactStore and Artifact

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use tempfile::TempDir;
use w24fs::archive::ArtifactStore;

#[test]
fn test_open_creates_directory() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("w24project");

    let store = ArtifactStore::open(&dir, false).unwrap();
    assert!(dir.is_dir());
    assert_eq!(store.dir(), dir.as_path());
}

#[test]
fn test_allocate_paths_are_private() {
    let temp = TempDir::new().unwrap();
    let store = ArtifactStore::open(temp.path(), false).unwrap();

    let a = store.allocate(1);
    let b = store.allocate(1);
    let c = store.allocate(2);

    assert_ne!(a.path(), b.path());
    assert_ne!(a.path(), c.path());
    assert!(a.path().starts_with(temp.path()));
    assert!(a.path().to_string_lossy().ends_with(".tar.gz"));
    assert!(a.is_empty());
}

#[test]
fn test_concurrent_allocation_unique() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(ArtifactStore::open(temp.path(), true).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|session| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                (0..50)
                    .map(|_| store.allocate(session).path().to_path_buf())
                    .collect::<Vec<PathBuf>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for path in handle.join().unwrap() {
            assert!(seen.insert(path));
        }
    }
    assert_eq!(seen.len(), 400);
}

#[test]
fn test_drop_deletes_file() {
    let temp = TempDir::new().unwrap();
    let store = ArtifactStore::open(temp.path(), false).unwrap();

    let path = {
        let mut artifact = store.allocate(7);
        fs::write(artifact.path(), b"payload").unwrap();
        artifact.set_len(7);
        assert_eq!(artifact.len(), 7);
        artifact.path().to_path_buf()
    };

    assert!(!path.exists());
}

#[test]
fn test_drop_without_file_is_quiet() {
    let temp = TempDir::new().unwrap();
    let store = ArtifactStore::open(temp.path(), false).unwrap();
    drop(store.allocate(1));
}

#[test]
fn test_keep_artifacts() {
    let temp = TempDir::new().unwrap();
    let store = ArtifactStore::open(temp.path(), true).unwrap();

    let path = {
        let artifact = store.allocate(3);
        fs::write(artifact.path(), b"payload").unwrap();
        artifact.path().to_path_buf()
    };

    assert!(path.exists());
}
