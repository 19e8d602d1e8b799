use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid page URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ExtractError>;
