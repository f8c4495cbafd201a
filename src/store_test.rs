use super::*;

fn shared_memory() -> (Arc<MemoryStorage>, TokenStore) {
    let storage = Arc::new(MemoryStorage::new());
    let store = TokenStore::new(storage.clone());
    (storage, store)
}

// =============================================================================
// TokenStore
// =============================================================================

#[test]
fn empty_store_has_no_token() {
    let store = TokenStore::in_memory();
    assert_eq!(store.get(), None);
}

#[test]
fn set_then_get_returns_token() {
    let store = TokenStore::in_memory();
    store.set("abc.def.ghi").unwrap();
    assert_eq!(store.get().as_deref(), Some("abc.def.ghi"));
}

#[test]
fn clear_removes_token() {
    let store = TokenStore::in_memory();
    store.set("abc").unwrap();
    store.clear();
    assert_eq!(store.get(), None);
}

#[test]
fn clear_on_empty_store_is_harmless() {
    let store = TokenStore::in_memory();
    store.clear();
    store.clear_user_data();
    assert_eq!(store.get(), None);
}

#[test]
fn empty_string_token_reads_as_absent() {
    let (storage, store) = shared_memory();
    storage.set_item(ACCESS_TOKEN_KEY, "").unwrap();
    assert_eq!(store.get(), None);
}

#[test]
fn clones_observe_each_others_writes() {
    let store = TokenStore::in_memory();
    let other = store.clone();
    store.set("t1").unwrap();
    assert_eq!(other.get().as_deref(), Some("t1"));
    other.clear();
    assert_eq!(store.get(), None);
}

#[test]
fn clear_user_data_leaves_token_alone() {
    let (storage, store) = shared_memory();
    store.set("t1").unwrap();
    storage.set_item(USER_DATA_KEY, "{\"id\":1}").unwrap();

    store.clear_user_data();

    assert_eq!(storage.get_item(USER_DATA_KEY).unwrap(), None);
    assert_eq!(store.get().as_deref(), Some("t1"));
}

// =============================================================================
// FileStorage
// =============================================================================

#[test]
fn file_storage_missing_file_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("state.json"));
    assert_eq!(storage.get_item(ACCESS_TOKEN_KEY).unwrap(), None);
}

#[test]
fn file_storage_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("state.json");

    let writer = FileStorage::new(&path);
    writer.set_item(ACCESS_TOKEN_KEY, "tok").unwrap();

    let reader = FileStorage::new(&path);
    assert_eq!(reader.get_item(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("tok"));

    reader.remove_item(ACCESS_TOKEN_KEY).unwrap();
    assert_eq!(writer.get_item(ACCESS_TOKEN_KEY).unwrap(), None);
}

#[test]
fn file_storage_keeps_unrelated_keys() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("state.json"));
    storage.set_item(ACCESS_TOKEN_KEY, "tok").unwrap();
    storage.set_item("theme", "dark").unwrap();

    storage.remove_item(ACCESS_TOKEN_KEY).unwrap();

    assert_eq!(storage.get_item("theme").unwrap().as_deref(), Some("dark"));
}

#[test]
fn file_storage_corrupt_file_is_an_error_and_store_degrades() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "not json").unwrap();

    let storage = Arc::new(FileStorage::new(&path));
    assert!(storage.get_item(ACCESS_TOKEN_KEY).is_err());

    let store = TokenStore::new(storage);
    assert_eq!(store.get(), None);
}
