use storage_manager::StorageError;
use thiserror::Error;

pub type Result<T, E = GitHubError> = std::result::Result<T, E>;

/// Every failure surfaced by the device flow and the repository publisher.
/// All variants are terminal for the operation that produced them.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Authorization denied by user")]
    AuthorizationDenied,

    #[error("Device code expired. Please try again.")]
    AuthorizationExpired,

    #[error("Timed out waiting for authorization after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("Authorization cancelled")]
    Cancelled,

    /// Non-OAuth REST failure, carrying GitHub's message verbatim
    #[error("{0}")]
    RemoteApi(String),

    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<reqwest_middleware::Error> for GitHubError {
    fn from(e: reqwest_middleware::Error) -> Self {
        GitHubError::Network(e.to_string())
    }
}

impl From<reqwest::Error> for GitHubError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GitHubError::Protocol(e.to_string())
        } else {
            GitHubError::Network(e.to_string())
        }
    }
}
