//! Store directories survive a save and reopen.

use phashdb::db::store::{Store, INDEX_FILE, LOCATIONS_FILE, META_FILE};
use phashdb::{Db, Error, Fingerprint, IndexKind};
use std::fs;
use tempfile::TempDir;

fn sample_db(kind: IndexKind) -> Db {
    let mut db = Db::with_kind(kind);
    db.add("cat.pgm", Fingerprint(0x8f8f_0f0f_1f1f_3f3f)).unwrap();
    db.add("cat-copy.pgm", Fingerprint(0x8f8f_0f0f_1f1f_3f3f)).unwrap();
    db.add("dog.pgm", Fingerprint(0x1234_5678_9abc_def0)).unwrap();
    db
}

#[test]
fn test_round_trip_both_kinds() {
    for kind in [IndexKind::Radix, IndexKind::Linear] {
        let dir = TempDir::new().unwrap();
        let mut store = Store::open(dir.path(), kind).unwrap();
        store.save(&sample_db(kind)).unwrap();

        assert!(dir.path().join(LOCATIONS_FILE).exists());
        assert!(dir.path().join(META_FILE).exists());
        assert_eq!(dir.path().join(INDEX_FILE).exists(), kind == IndexKind::Radix);

        let reopened = Store::open(dir.path(), IndexKind::default()).unwrap();
        assert_eq!(reopened.meta().index_kind, kind);
        assert_eq!(reopened.meta().fingerprint_count, 2);
        assert_eq!(reopened.meta().location_count, 3);

        let db = reopened.load().unwrap();
        assert_eq!(db.len(), 2);
        assert_eq!(db.index().len(), 2);
        assert_eq!(
            db.find(Fingerprint(0x8f8f_0f0f_1f1f_3f3f)).unwrap(),
            ["cat.pgm", "cat-copy.pgm"]
        );
        assert_eq!(db.search(Fingerprint(0x1234_5678_9abc_def1), 1).unwrap(), ["dog.pgm"]);
    }
}

#[test]
fn test_new_directory_loads_empty() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(&dir.path().join("missing"), IndexKind::Radix).unwrap();
    let db = store.load().unwrap();
    assert!(db.is_empty());
}

#[test]
fn test_missing_index_file_is_rebuilt() {
    let dir = TempDir::new().unwrap();
    let mut store = Store::open(dir.path(), IndexKind::Radix).unwrap();
    store.save(&sample_db(IndexKind::Radix)).unwrap();
    fs::remove_file(dir.path().join(INDEX_FILE)).unwrap();

    let db = Store::open(dir.path(), IndexKind::Radix).unwrap().load().unwrap();
    assert_eq!(db.index().len(), 2);
    assert_eq!(db.search(Fingerprint(0x8f8f_0f0f_1f1f_3f3f), 0).unwrap().len(), 2);
}

#[test]
fn test_truncated_index_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let mut store = Store::open(dir.path(), IndexKind::Radix).unwrap();
    store.save(&sample_db(IndexKind::Radix)).unwrap();

    let index_path = dir.path().join(INDEX_FILE);
    let bytes = fs::read(&index_path).unwrap();
    fs::write(&index_path, &bytes[..bytes.len() - 3]).unwrap();

    let result = Store::open(dir.path(), IndexKind::Radix).unwrap().load();
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_no_temporary_files_left_behind() {
    let dir = TempDir::new().unwrap();
    let mut store = Store::open(dir.path(), IndexKind::Radix).unwrap();
    store.save(&sample_db(IndexKind::Radix)).unwrap();
    store.save(&sample_db(IndexKind::Radix)).unwrap();

    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
