pub mod api;
pub mod auth;
pub mod error;
pub mod token;
pub mod utils;

pub use api::RepoPublisher;
pub use auth::{DeviceFlow, GitHubOAuthClient, OAuthEndpoint, VerificationPresenter};
pub use error::{GitHubError, Result};
pub use token::AccessToken;
pub use utils::build_http_client;
