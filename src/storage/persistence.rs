//! Ledger persistence layer
//!
//! Provides save/load functionality for deployed tokens.

use crate::token::{ManagerSnapshot, TokenError, TokenManager};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Token state error: {0}")]
    Token(#[from] TokenError),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub ledger_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".usdc_data"),
            ledger_file: "ledger.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Ledger storage manager
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Result<Self, StorageError> {
        Self::new(StorageConfig::default())
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Get the ledger file path
    fn ledger_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.ledger_file)
    }

    /// Get a backup file path
    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.ledger_file, index))
    }

    /// Save all tokens to disk
    pub fn save(&self, manager: &TokenManager) -> Result<(), StorageError> {
        let path = self.ledger_path();

        // Create backup if enabled
        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to temporary file first
        let temp_path = self
            .config
            .data_dir
            .join(format!("{}.tmp", self.config.ledger_file));
        let file = fs::File::create(&temp_path)?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, &manager.snapshot())?;

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        Ok(())
    }

    /// Load all tokens from disk
    pub fn load(&self) -> Result<TokenManager, StorageError> {
        let path = self.ledger_path();

        if !path.exists() {
            return Err(StorageError::InvalidData(
                "Ledger file not found".to_string(),
            ));
        }

        load_from_file(&path)
    }

    /// Load from disk, or start empty if nothing was saved yet
    pub fn load_or_default(&self) -> Result<TokenManager, StorageError> {
        if self.exists() {
            self.load()
        } else {
            Ok(TokenManager::new())
        }
    }

    /// Check if a saved ledger exists
    pub fn exists(&self) -> bool {
        self.ledger_path().exists()
    }

    /// Rotate backup files
    fn rotate_backups(&self) -> Result<(), StorageError> {
        // Delete oldest backup
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        // Shift existing backups
        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                let next = self.backup_path(i + 1);
                fs::rename(&current, &next)?;
            }
        }

        Ok(())
    }

    /// Restore from a backup
    pub fn restore_backup(&self, backup_index: usize) -> Result<TokenManager, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }

        load_from_file(&backup_path)
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }
}

/// Save tokens to a specific file path
pub fn save_to_file(manager: &TokenManager, path: &Path) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &manager.snapshot())?;
    Ok(())
}

/// Load tokens from a specific file path
pub fn load_from_file(path: &Path) -> Result<TokenManager, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let snapshot: ManagerSnapshot = serde_json::from_reader(reader)?;
    Ok(TokenManager::restore(snapshot)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Address;
    use crate::token::Amount;

    fn temp_storage(max_backups: usize) -> (tempfile::TempDir, Storage) {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            max_backups,
            ..Default::default()
        };
        let storage = Storage::new(config).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_save_load() {
        let (_dir, storage) = temp_storage(5);
        let owner = Address::from_bytes([1; 20]);
        let holder = Address::from_bytes([2; 20]);

        let mut manager = TokenManager::new();
        let token = manager.deploy(&owner).unwrap();
        token.mint(&owner, &holder, Amount::from_raw(1234)).unwrap();

        assert!(!storage.exists());
        storage.save(&manager).unwrap();
        assert!(storage.exists());

        let loaded = storage.load().unwrap();
        let loaded_token = loaded.get(&token.address()).unwrap();
        assert_eq!(loaded_token.balance_of(&holder), Amount::from_raw(1234));
        assert_eq!(loaded_token.owner(), owner);
        assert_eq!(loaded_token.events().len(), 1);
    }

    #[test]
    fn test_load_missing() {
        let (_dir, storage) = temp_storage(5);
        assert!(matches!(storage.load(), Err(StorageError::InvalidData(_))));
        assert_eq!(storage.load_or_default().unwrap().count(), 0);
    }

    #[test]
    fn test_load_rejects_tampered_balances() {
        let (_dir, storage) = temp_storage(5);
        let owner = Address::from_bytes([1; 20]);

        let mut manager = TokenManager::new();
        let token = manager.deploy(&owner).unwrap();
        token.mint(&owner, &owner, Amount::from_raw(10)).unwrap();
        storage.save(&manager).unwrap();

        let path = storage.config().data_dir.join("ledger.json");
        let mut json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        json["tokens"][0]["ledger"]["total_supply"] = serde_json::json!(11);
        fs::write(&path, json.to_string()).unwrap();

        assert!(matches!(
            storage.load(),
            Err(StorageError::Token(TokenError::InconsistentState(_)))
        ));
    }

    #[test]
    fn test_backup_rotation() {
        let (_dir, storage) = temp_storage(3);
        let owner = Address::from_bytes([1; 20]);
        let mut manager = TokenManager::new();

        // Save multiple times
        for _ in 0..5 {
            storage.save(&manager).unwrap();
            manager.deploy(&owner).unwrap();
        }

        assert_eq!(storage.list_backups(), vec![0, 1, 2]);

        // Backup 0 is the save before last: three tokens deployed at that point
        let restored = storage.restore_backup(0).unwrap();
        assert_eq!(restored.count(), 3);
    }

    #[test]
    fn test_export_import() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("export.json");
        let mut manager = TokenManager::new();
        manager.deploy(&Address::from_bytes([1; 20])).unwrap();

        save_to_file(&manager, &path).unwrap();
        let loaded = load_from_file(&path).unwrap();
        assert_eq!(loaded.snapshot(), manager.snapshot());
    }
}
