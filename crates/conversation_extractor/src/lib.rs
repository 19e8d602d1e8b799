//! Pulls chat transcripts out of saved conversation pages.

pub mod error;
pub mod extractor;
pub mod page;
pub mod strategy;

pub use error::{ExtractError, Result};
pub use extractor::ConversationExtractor;
pub use page::{is_supported_page, SUPPORTED_HOSTS};
pub use strategy::{ExtractionStrategy, CONTENT_SELECTORS, MESSAGE_SELECTORS};
