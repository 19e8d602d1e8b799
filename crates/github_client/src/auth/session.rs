use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use storage_manager::PendingVerification;

use crate::token::AccessToken;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 900;
pub const SLOW_DOWN_INCREMENT_SECS: u64 = 5;

/// One device authorization in flight. Owned by the polling loop; the only
/// mutations are the interval bump on `slow_down` and the attempt counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAuthorizationSession {
    pub client_id: String,
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub poll_interval_seconds: u64,
    pub expires_at: DateTime<Utc>,
    pub attempts: u32,
}

impl DeviceAuthorizationSession {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// Applies a `slow_down` response: the interval grows by 5 seconds and
    /// stays grown for the rest of the session.
    pub fn slow_down(&mut self) {
        self.poll_interval_seconds = self
            .poll_interval_seconds
            .saturating_add(SLOW_DOWN_INCREMENT_SECS);
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn pending_verification(&self) -> PendingVerification {
        PendingVerification {
            user_code: self.user_code.clone(),
            verification_uri: self.verification_uri.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// Result of a single token-exchange request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Pending,
    SlowDown,
    Authorized(AccessToken),
    Denied,
    Expired,
    OtherError(String),
}

impl PollOutcome {
    pub fn is_waiting(&self) -> bool {
        matches!(self, PollOutcome::Pending | PollOutcome::SlowDown)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    CodeRequested,
    AwaitingUserAction,
    Polling { attempt: u32 },
    Succeeded,
    Denied,
    Expired,
    Failed(String),
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowState::Idle => write!(f, "idle"),
            FlowState::CodeRequested => write!(f, "requesting device code"),
            FlowState::AwaitingUserAction => write!(f, "waiting for user authorization"),
            FlowState::Polling { attempt } => write!(f, "polling (attempt {attempt})"),
            FlowState::Succeeded => write!(f, "authorized"),
            FlowState::Denied => write!(f, "denied"),
            FlowState::Expired => write!(f, "expired"),
            FlowState::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}
