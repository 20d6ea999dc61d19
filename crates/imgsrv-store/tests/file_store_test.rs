// Integration tests for file-backed stores

use imgsrv_core::model::{Filesystem, FilesystemTier};
use imgsrv_store::adaptor::FilesystemAdaptor;
use imgsrv_store::{EntityAdaptor, PersistentStore, StoreConfig};

#[test]
fn test_committed_data_survives_reopen() {
    // Given: A file-backed store with one committed row
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::file(dir.path().join("imgsrv.db"));
    let key = {
        let store = PersistentStore::open(&config).unwrap();
        let adaptor: FilesystemAdaptor = EntityAdaptor::new(store);
        adaptor
            .add(&Filesystem::columns("/mnt/tier1", FilesystemTier::Tier1))
            .unwrap()
            .key
    };

    // When: The store is reopened (migrations run again)
    let store = PersistentStore::open(&config).unwrap();
    let adaptor: FilesystemAdaptor = EntityAdaptor::new(store);

    // Then: The row is still there
    let loaded = adaptor.get(&key).unwrap().expect("row should persist");
    assert_eq!(loaded.filesystem_path, "/mnt/tier1");
    assert!(loaded.is_writable());
}

#[test]
fn test_config_file_drives_store_location() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("from-config.db");
    let config_path = dir.path().join("store.toml");
    std::fs::write(
        &config_path,
        format!("path = {:?}\njournal_mode = \"delete\"\n", db_path.display().to_string()),
    )
    .unwrap();

    let config = StoreConfig::load(&config_path).unwrap();
    PersistentStore::open(&config).unwrap();

    assert!(db_path.exists());
}
