use super::session::{DeviceAuthorizationSession, FlowState, PollOutcome};

/// Front-end hooks for the device flow. `present` shows the verification
/// URI and user code to the human; the other hooks report progress.
pub trait VerificationPresenter: Send + Sync {
    fn present(&self, session: &DeviceAuthorizationSession);

    fn on_state(&self, _state: &FlowState) {}

    fn on_poll(&self, _outcome: &PollOutcome, _session: &DeviceAuthorizationSession) {}
}

/// Presenter that only logs; for headless callers that read the pending
/// verification from the token store instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPresenter;

impl VerificationPresenter for LogPresenter {
    fn present(&self, session: &DeviceAuthorizationSession) {
        log::info!(
            "Enter code {} at {} (expires {})",
            session.user_code,
            session.verification_uri,
            session.expires_at.to_rfc3339()
        );
    }

    fn on_state(&self, state: &FlowState) {
        log::debug!("Device flow state: {}", state);
    }
}
