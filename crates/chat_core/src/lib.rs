//! chat_core - Core types for the chat archiver
//!
//! - `config` - Config loading (config.json / config.toml / env)
//! - `conversation` - Conversation, ConversationMessage, Role
//! - `paths` - ~/.chat_archiver layout

pub mod config;
pub mod conversation;
pub mod paths;

pub use config::{Config, ConfigError, ProxyAuth};
pub use conversation::{Conversation, ConversationMessage, Role, CONVERSATION_KEY_PREFIX};
