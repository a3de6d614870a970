//! Snapshot persistence for countries, guests and auth tables.

use crate::error::ApiError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Persisted tables. Each one is written to its own JSON file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Countries,
    Guests,
    Auth,
}

impl Table {
    pub fn file_name(self) -> &'static str {
        match self {
            Table::Countries => "countries.json",
            Table::Guests => "guests.json",
            Table::Auth => "auth.json",
        }
    }
}

/// JSON files under a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, table: Table) -> PathBuf {
        self.dir.join(table.file_name())
    }

    /// Write a table snapshot.
    pub async fn save<T: Serialize>(&self, table: Table, value: &T) -> Result<(), ApiError> {
        let data = serde_json::to_vec_pretty(value)?;
        fs::create_dir_all(&self.dir).await?;

        // Write atomically using temp file + rename
        let path = self.path(table);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &path).await?;

        debug!("Saved {:?} ({} bytes) to {:?}", table, data.len(), path);
        Ok(())
    }

    /// Read a table snapshot. A missing file yields `None`.
    pub async fn load<T: DeserializeOwned>(&self, table: Table) -> Result<Option<T>, ApiError> {
        let path = self.path(table);
        if !fs::try_exists(&path).await? {
            info!("{:?} not found at {:?}, starting empty", table, path);
            return Ok(None);
        }

        let data = fs::read(&path).await?;
        let value = serde_json::from_slice(&data)?;
        info!("Loaded {:?} from {:?}", table, path);
        Ok(Some(value))
    }
}

/// No persistence.
pub struct MemoryStore;

impl MemoryStore {
    pub async fn save<T: Serialize>(&self, table: Table, _value: &T) -> Result<(), ApiError> {
        debug!("Memory store: save of {:?} is a no-op", table);
        Ok(())
    }

    pub async fn load<T: DeserializeOwned>(&self, table: Table) -> Result<Option<T>, ApiError> {
        debug!("Memory store: nothing stored for {:?}", table);
        Ok(None)
    }
}

/// Storage backend selected at startup.
pub enum Store {
    File(FileStore),
    Memory(MemoryStore),
}

impl Store {
    pub fn file(dir: impl Into<PathBuf>) -> Self {
        Store::File(FileStore::new(dir))
    }

    pub fn memory() -> Self {
        warn!("Using in-memory storage (data will be lost on restart)");
        Store::Memory(MemoryStore)
    }

    pub async fn save<T: Serialize>(&self, table: Table, value: &T) -> Result<(), ApiError> {
        match self {
            Store::File(s) => s.save(table, value).await,
            Store::Memory(s) => s.save(table, value).await,
        }
    }

    pub async fn load<T: DeserializeOwned>(&self, table: Table) -> Result<Option<T>, ApiError> {
        match self {
            Store::File(s) => s.load(table).await,
            Store::Memory(s) => s.load(table).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guest_core::{CountryDirectory, CountrySeed, GuestInput, GuestRepository, GuestTable};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::file(dir.path().join("data"));

        let directory = Arc::new(CountryDirectory::seed(CountrySeed::bundled().unwrap()));
        let mut repo = GuestRepository::new(directory.clone());
        let guest = repo
            .create(GuestInput {
                firstname: Some("Ada".into()),
                lastname: Some("Lovelace".into()),
                phone: Some("+14155552671".into()),
                email: None,
                country_id: None,
            })
            .unwrap();

        store.save(Table::Guests, repo.table()).await.unwrap();
        assert!(dir.path().join("data/guests.json").exists());
        assert!(!dir.path().join("data/guests.tmp").exists());

        let table: GuestTable = store.load(Table::Guests).await.unwrap().unwrap();
        let restored = GuestRepository::from_table(table, directory, Default::default()).unwrap();
        assert_eq!(restored.get(guest.id).unwrap(), guest);
    }

    #[tokio::test]
    async fn test_file_store_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let loaded: Option<GuestTable> = store.load(Table::Guests).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_file_store_corrupt_table() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("auth.json"), b"{not json").unwrap();
        let store = FileStore::new(dir.path());

        let result: Result<Option<GuestTable>, _> = store.load(Table::Auth).await;
        assert!(matches!(result, Err(ApiError::Storage(_))));
    }

    #[test]
    fn test_memory_store_keeps_nothing() {
        tokio_test::block_on(async {
            let store = Store::memory();
            store
                .save(Table::Guests, &GuestTable::new())
                .await
                .unwrap();

            let loaded: Option<GuestTable> = store.load(Table::Guests).await.unwrap();
            assert!(loaded.is_none());
        });
    }

    #[test]
    fn test_table_file_names() {
        assert_eq!(Table::Countries.file_name(), "countries.json");
        assert_eq!(Table::Guests.file_name(), "guests.json");
        assert_eq!(Table::Auth.file_name(), "auth.json");
    }
}
