use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, error, info, warn};
use storage_manager::TokenStore;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use super::endpoint::OAuthEndpoint;
use super::presenter::VerificationPresenter;
use super::session::{DeviceAuthorizationSession, FlowState, PollOutcome};
use crate::error::{GitHubError, Result};
use crate::token::AccessToken;

/// ~10 minutes at the default 5 second interval
pub const DEFAULT_MAX_ATTEMPTS: u32 = 120;

/// OAuth Device Authorization Grant against a remote endpoint.
///
/// `run` requests a device code, presents it, then polls strictly
/// sequentially: wait the session interval after `Pending`, grow the
/// interval by 5 seconds after `SlowDown`, stop on anything else or after
/// `max_attempts` waiting outcomes. On success the token is written to the
/// token store; the device-flow bookkeeping keys are removed on every exit.
///
/// Only one flow should run at a time. Callers check
/// [`TokenStore::pending_verification`] before starting another.
pub struct DeviceFlow {
    endpoint: Arc<dyn OAuthEndpoint>,
    tokens: TokenStore,
    presenter: Arc<dyn VerificationPresenter>,
    max_attempts: u32,
}

impl DeviceFlow {
    pub fn new(
        endpoint: Arc<dyn OAuthEndpoint>,
        tokens: TokenStore,
        presenter: Arc<dyn VerificationPresenter>,
    ) -> Self {
        Self {
            endpoint,
            tokens,
            presenter,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub async fn request_device_code(
        &self,
        client_id: &str,
        scopes: &str,
    ) -> Result<DeviceAuthorizationSession> {
        let response = self.endpoint.request_device_code(client_id, scopes).await?;
        let session = response.into_session(client_id, Utc::now())?;
        info!(
            "Device code obtained: {} (interval {}s)",
            session.user_code, session.poll_interval_seconds
        );
        Ok(session)
    }

    /// Shows the code to the user and mirrors it into the bookkeeping keys
    /// so other front ends can display it.
    pub async fn present_verification(&self, session: &DeviceAuthorizationSession) -> Result<()> {
        self.presenter.present(session);
        self.tokens
            .save_pending_verification(&session.pending_verification())
            .await?;
        Ok(())
    }

    /// Issues exactly one token-exchange request
    pub async fn poll(&self, session: &mut DeviceAuthorizationSession) -> Result<PollOutcome> {
        session.attempts += 1;
        let response = self
            .endpoint
            .exchange_device_code(&session.client_id, &session.device_code)
            .await?;
        let outcome = response.into_poll_outcome()?;
        if outcome.is_waiting() {
            debug!(
                "Poll {} for {}: still waiting ({:?})",
                session.attempts, session.user_code, outcome
            );
        }
        Ok(outcome)
    }

    pub async fn run(&self, client_id: &str, scopes: &str) -> Result<AccessToken> {
        self.run_with_cancel(client_id, scopes, &CancellationToken::new())
            .await
    }

    /// [`run`](Self::run), aborting the current wait when `cancel` fires
    pub async fn run_with_cancel(
        &self,
        client_id: &str,
        scopes: &str,
        cancel: &CancellationToken,
    ) -> Result<AccessToken> {
        self.notify(FlowState::Idle);
        self.notify(FlowState::CodeRequested);
        let mut session = match self.request_device_code(client_id, scopes).await {
            Ok(session) => session,
            Err(e) => {
                self.notify(FlowState::Failed(e.to_string()));
                return Err(e);
            }
        };

        let result = match self.present_verification(&session).await {
            Ok(()) => {
                self.notify(FlowState::AwaitingUserAction);
                self.poll_until_done(&mut session, cancel).await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = self.tokens.clear_pending_verification().await {
            warn!("Failed to clear device flow bookkeeping: {}", e);
        }

        match &result {
            Ok(token) => {
                info!(
                    "GitHub authorization succeeded after {} polls ({})",
                    session.attempts,
                    token.masked()
                );
                self.notify(FlowState::Succeeded);
            }
            Err(GitHubError::AuthorizationDenied) => self.notify(FlowState::Denied),
            Err(GitHubError::AuthorizationExpired) => self.notify(FlowState::Expired),
            Err(e) => {
                error!("GitHub authorization failed: {}", e);
                self.notify(FlowState::Failed(e.to_string()));
            }
        }

        result
    }

    async fn poll_until_done(
        &self,
        session: &mut DeviceAuthorizationSession,
        cancel: &CancellationToken,
    ) -> Result<AccessToken> {
        // Expiry is measured on the runtime clock from here on
        let remaining = (session.expires_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let deadline = Instant::now().checked_add(remaining);

        loop {
            if cancel.is_cancelled() {
                return Err(GitHubError::Cancelled);
            }
            if session.attempts >= self.max_attempts {
                return Err(GitHubError::Timeout {
                    attempts: session.attempts,
                });
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(GitHubError::AuthorizationExpired);
            }

            self.notify(FlowState::Polling {
                attempt: session.attempts + 1,
            });
            let outcome = self.poll(session).await?;
            self.presenter.on_poll(&outcome, session);

            match outcome {
                PollOutcome::Pending => {}
                PollOutcome::SlowDown => {
                    session.slow_down();
                    warn!(
                        "Server requested slower polling, interval now {}s",
                        session.poll_interval_seconds
                    );
                }
                PollOutcome::Authorized(token) => {
                    self.tokens.save_token(token.as_str()).await?;
                    return Ok(token);
                }
                PollOutcome::Denied => return Err(GitHubError::AuthorizationDenied),
                PollOutcome::Expired => return Err(GitHubError::AuthorizationExpired),
                PollOutcome::OtherError(message) => return Err(GitHubError::Protocol(message)),
            }

            if session.attempts >= self.max_attempts {
                return Err(GitHubError::Timeout {
                    attempts: session.attempts,
                });
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(GitHubError::Cancelled),
                _ = sleep(session.poll_interval()) => {}
            }
        }
    }

    fn notify(&self, state: FlowState) {
        self.presenter.on_state(&state);
    }
}
