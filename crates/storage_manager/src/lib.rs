//! storage_manager - flat key-value persistence
//!
//! The store mirrors a browser extension's local storage area: a single
//! namespace of JSON values, asynchronous access, last write wins.

pub mod conversation_store;
pub mod error;
pub mod file_storage;
pub mod storage;
pub mod token_store;

pub use conversation_store::ConversationStore;
pub use error::{Result, StorageError};
pub use file_storage::FileKeyValueStore;
pub use storage::{KeyValueStore, MemoryKeyValueStore};
pub use token_store::{
    PendingVerification, TokenStore, DEVICE_EXPIRES_AT_KEY, DEVICE_FLOW_KEYS, GITHUB_TOKEN_KEY,
    USER_CODE_KEY, VERIFICATION_URI_KEY,
};
