//! GitHub Device Authorization
//!
//! Device Code Flow:
//! 1. Get device code from github.com/login/device/code
//! 2. User authorizes at github.com/login/device
//! 3. Poll login/oauth/access_token until authorized, denied or expired
//! 4. Store the access token as `github_token`

pub mod endpoint;
pub mod flow;
pub mod presenter;
pub mod session;

pub use endpoint::{AccessTokenResponse, DeviceCodeResponse, GitHubOAuthClient, OAuthEndpoint};
pub use flow::{DeviceFlow, DEFAULT_MAX_ATTEMPTS};
pub use presenter::{LogPresenter, VerificationPresenter};
pub use session::{DeviceAuthorizationSession, FlowState, PollOutcome};
