//! Shared library code for BeastVault: content hashing, the catalog-eligible
//! extension list, the content-addressed file store and settings.

pub mod formats;
pub mod hasher;
pub mod settings;
pub mod store;
pub mod util;

pub use formats::{entry_extension, is_entry_extension, is_entry_file, ENTRY_EXTENSIONS};
pub use hasher::{hash_file, sha256_hex, short_hash};
pub use store::{
    BackupOutcome, ContentStore, StoreError, StoreLock, TreeListing, BACKUP_DIR_NAME,
    LOCK_FILE_NAME,
};
