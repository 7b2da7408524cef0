//! Durable State Tests
//!
//! The state map over the append-only file store:
//! - values and their writer txids survive reopen
//! - a replay after reopen is still recognized as already applied
//! - corruption is reported, never skipped
//! - an append torn by a crash is cut off on reopen and replayed
//! - a value written under another type tag is rejected

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use txstate::state::{CombinerUpdater, DurableMap, SnapshottableMap, Sum};
use txstate::store::{FileStore, STORE_DIR, STORE_FILE};
use txstate::{Key, State, StateConfig, StateError, StoreError, TxId};

// =============================================================================
// Test Utilities
// =============================================================================

fn config(dir: &Path) -> StateConfig {
    StateConfig {
        log_target: "none".to_string(),
        ..StateConfig::default()
    }
    .with_data_dir(dir.display().to_string())
    .with_partition("test-partition")
}

fn open_counts(dir: &Path) -> DurableMap<u64> {
    DurableMap::open_durable(&config(dir)).unwrap()
}

fn store_path(dir: &Path) -> std::path::PathBuf {
    dir.join(STORE_DIR).join(STORE_FILE)
}

fn add(n: u64) -> CombinerUpdater<Sum, u64> {
    CombinerUpdater::new(Sum, n)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Window {
    count: u64,
    last: String,
}

// =============================================================================
// Reopen
// =============================================================================

#[test]
fn test_values_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut map = open_counts(temp_dir.path());
        map.begin_commit(TxId::new(1)).unwrap();
        map.multi_update(&[Key::from("a"), Key::from("b")], &[add(2), add(3)])
            .unwrap();
        map.commit(TxId::new(1));
    }

    let mut map = open_counts(temp_dir.path());
    map.begin_commit(TxId::new(2)).unwrap();
    assert_eq!(
        map.multi_get(&[Key::from("b"), Key::from("a"), Key::from("c")])
            .unwrap(),
        vec![Some(3), Some(2), None]
    );
}

#[test]
fn test_replay_after_crash_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    {
        // Write lands, process dies before commit.
        let mut map = open_counts(temp_dir.path());
        map.begin_commit(TxId::new(7)).unwrap();
        map.multi_update(&[Key::from("k")], &[add(10)]).unwrap();
    }

    let records_before = FileStore::verify(temp_dir.path()).unwrap().records;

    let mut map = open_counts(temp_dir.path());
    map.begin_commit(TxId::new(7)).unwrap();
    assert_eq!(map.multi_update(&[Key::from("k")], &[add(10)]).unwrap(), vec![10]);
    map.commit(TxId::new(7));

    assert_eq!(
        FileStore::verify(temp_dir.path()).unwrap().records,
        records_before
    );
}

#[test]
fn test_latest_write_wins_on_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut map = open_counts(temp_dir.path());
        for tx in 1..=3 {
            map.begin_commit(TxId::new(tx)).unwrap();
            map.multi_put(&[Key::from("k")], vec![tx * 100]).unwrap();
            map.commit(TxId::new(tx));
        }
    }

    let report = FileStore::verify(temp_dir.path()).unwrap();
    assert_eq!(report.records, 3);
    assert_eq!(report.keys, 1);

    let mut map = open_counts(temp_dir.path());
    map.begin_commit(TxId::new(4)).unwrap();
    assert_eq!(map.multi_get(&[Key::from("k")]).unwrap(), vec![Some(300)]);
}

#[test]
fn test_structured_values() {
    let temp_dir = TempDir::new().unwrap();
    let cfg = StateConfig {
        value_tag: "window".to_string(),
        ..config(temp_dir.path())
    };
    let window = Window {
        count: 4,
        last: "2026-10-18".to_string(),
    };
    {
        let mut map: DurableMap<Window> = DurableMap::open_durable(&cfg).unwrap();
        map.begin_commit(TxId::new(1)).unwrap();
        map.multi_put(&[Key::from_iter(["user", "42"])], vec![window.clone()])
            .unwrap();
        map.commit(TxId::new(1));
    }

    let mut map: DurableMap<Window> = DurableMap::open_durable(&cfg).unwrap();
    map.begin_commit(TxId::new(2)).unwrap();
    assert_eq!(
        map.multi_get(&[Key::from_iter(["user", "42"])]).unwrap(),
        vec![Some(window)]
    );
}

#[test]
fn test_global_counter_over_file_store() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut total: SnapshottableMap<u64, _> = SnapshottableMap::new(open_counts(temp_dir.path()));
        total.begin_commit(TxId::new(1)).unwrap();
        assert_eq!(total.update(add(5)).unwrap(), 5);
        total.commit(TxId::new(1));
    }

    let mut total: SnapshottableMap<u64, _> = SnapshottableMap::new(open_counts(temp_dir.path()));
    total.begin_commit(TxId::new(2)).unwrap();
    assert_eq!(total.get().unwrap(), Some(5u64));
}

#[test]
fn test_torn_append_replays_after_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut map = open_counts(temp_dir.path());
        map.begin_commit(TxId::new(1)).unwrap();
        map.multi_update(&[Key::from("a"), Key::from("b")], &[add(1), add(1)])
            .unwrap();
        map.commit(TxId::new(1));

        // Crash mid-append: the batch for tx 2 never fully lands.
        map.begin_commit(TxId::new(2)).unwrap();
        map.multi_update(&[Key::from("a")], &[add(5)]).unwrap();
    }

    let path = store_path(temp_dir.path());
    let contents = fs::read(&path).unwrap();
    fs::write(&path, &contents[..contents.len() - 3]).unwrap();

    let mut map = open_counts(temp_dir.path());
    map.begin_commit(TxId::new(2)).unwrap();
    assert_eq!(map.multi_update(&[Key::from("a")], &[add(5)]).unwrap(), vec![6]);
    map.commit(TxId::new(2));

    // A second replay of the same transaction is now recognized.
    map.begin_commit(TxId::new(2)).unwrap();
    assert_eq!(map.multi_update(&[Key::from("a")], &[add(5)]).unwrap(), vec![6]);
    map.commit(TxId::new(2));

    let report = FileStore::verify(temp_dir.path()).unwrap();
    assert_eq!(report.records, 3);
    assert_eq!(report.keys, 2);
}

// =============================================================================
// Integrity
// =============================================================================

#[test]
fn test_corruption_fails_open() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut map = open_counts(temp_dir.path());
        map.begin_commit(TxId::new(1)).unwrap();
        map.multi_put(&[Key::from("k")], vec![1]).unwrap();
        map.commit(TxId::new(1));
    }

    let path = store_path(temp_dir.path());
    let mut contents = fs::read(&path).unwrap();
    let mid = contents.len() / 2;
    contents[mid] ^= 0xFF;
    fs::write(&path, contents).unwrap();

    let err = DurableMap::<u64>::open_durable(&config(temp_dir.path()))
        .err()
        .unwrap();
    assert_eq!(err.code(), "TXSTATE_DATA_CORRUPTION");
    assert!(matches!(err, StateError::Store(StoreError::Corruption { .. })));
}

#[test]
fn test_other_tag_is_type_mismatch() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut map = open_counts(temp_dir.path());
        map.begin_commit(TxId::new(1)).unwrap();
        map.multi_put(&[Key::from("k")], vec![1]).unwrap();
        map.commit(TxId::new(1));
    }

    let cfg = StateConfig {
        value_tag: "window".to_string(),
        ..config(temp_dir.path())
    };
    let mut map: DurableMap<Window> = DurableMap::open_durable(&cfg).unwrap();
    map.begin_commit(TxId::new(2)).unwrap();
    let err = map.multi_get(&[Key::from("k")]).unwrap_err();
    assert!(matches!(
        err,
        StateError::Store(StoreError::TypeMismatch { .. })
    ));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_open_requires_data_dir() {
    let err = DurableMap::<u64>::open_durable(&StateConfig::default())
        .err()
        .unwrap();
    assert_eq!(err.code(), "TXSTATE_CONFIG_INVALID");
    assert!(!err.is_misuse());
}

#[test]
fn test_partition_label_from_config() {
    let temp_dir = TempDir::new().unwrap();
    let map = open_counts(temp_dir.path());
    assert_eq!(map.partition(), "test-partition");
    assert!(!map.is_active());
}
