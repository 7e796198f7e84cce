use std::fs;

use monitor_engine::{AtomicFileWriter, DedupStore, PersistError};
use tempfile::TempDir;

#[test]
fn missing_file_starts_empty() {
    let temp = TempDir::new().unwrap();
    let store = DedupStore::load(temp.path().join("known.json")).unwrap();
    assert!(store.known().is_empty());
}

#[test]
fn saved_ids_come_back_sorted() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state").join("known.json");

    let mut store = DedupStore::load(&path).unwrap();
    assert!(store.add("900"));
    assert!(store.add("12"));
    assert!(!store.add("900"));
    store.save().unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "[\n  \"12\",\n  \"900\"\n]\n"
    );
    let reloaded = DedupStore::load(&path).unwrap();
    assert!(reloaded.contains("12"));
    assert!(reloaded.contains("900"));
    assert_eq!(reloaded.known().len(), 2);
}

#[test]
fn empty_set_round_trips() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("known.json");
    DedupStore::load(&path).unwrap().save().unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "[]\n");
    assert!(DedupStore::load(&path).unwrap().known().is_empty());
}

#[test]
fn corrupt_file_is_an_error_not_an_empty_set() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("known.json");
    fs::write(&path, "[\"1\", ").unwrap();

    let err = DedupStore::load(&path).unwrap_err();
    assert!(matches!(err, PersistError::Corrupt { .. }), "{err:?}");
    assert_eq!(fs::read_to_string(&path).unwrap(), "[\"1\", ");
}

#[test]
fn ids_are_never_dropped_across_saves() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("known.json");

    let mut store = DedupStore::load(&path).unwrap();
    store.add("1");
    store.save().unwrap();

    let mut store = DedupStore::load(&path).unwrap();
    store.add("2");
    store.save().unwrap();

    let store = DedupStore::load(&path).unwrap();
    assert_eq!(store.known().iter().collect::<Vec<_>>(), vec!["1", "2"]);
}

#[test]
fn atomic_write_fails_when_parent_is_a_file() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not_a_dir");
    fs::write(&blocker, "x").unwrap();

    let writer = AtomicFileWriter::new(blocker.join("known.json"));
    let result = writer.write("[]");
    assert!(matches!(result, Err(PersistError::StateDir(_))));
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "x");
}
