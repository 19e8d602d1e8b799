use colored::Colorize;
use github_client::auth::{DeviceAuthorizationSession, FlowState, PollOutcome};
use github_client::VerificationPresenter;

/// Prints the device code box and optionally opens the verification page
pub struct TerminalPresenter {
    open_browser: bool,
}

impl TerminalPresenter {
    pub fn new(open_browser: bool) -> Self {
        Self { open_browser }
    }
}

impl VerificationPresenter for TerminalPresenter {
    fn present(&self, session: &DeviceAuthorizationSession) {
        println!("\n╔════════════════════════════════════════════════════════════╗");
        println!("║     🔐 GitHub Authorization Required                       ║");
        println!("╚════════════════════════════════════════════════════════════╝");
        println!();
        println!("  1. Open your browser and navigate to:");
        println!("     {}", session.verification_uri);
        println!();
        println!("  2. Enter the following code:");
        println!();
        println!("     ┌─────────────────────────┐");
        println!("     │  {:^23} │", session.user_code);
        println!("     └─────────────────────────┘");
        println!();
        println!("  3. Click 'Authorize' and wait...");
        println!();
        println!(
            "  The code expires at {}",
            session.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!();

        if self.open_browser {
            if let Err(e) = webbrowser::open(&session.verification_uri) {
                tracing::warn!("Could not open browser: {}", e);
            }
        }
    }

    fn on_state(&self, state: &FlowState) {
        tracing::debug!("Device flow: {}", state);
    }

    fn on_poll(&self, outcome: &PollOutcome, session: &DeviceAuthorizationSession) {
        match outcome {
            PollOutcome::Pending => eprintln!(
                "{}",
                format!("  Waiting for authorization (attempt {})", session.attempts).dimmed()
            ),
            PollOutcome::SlowDown => eprintln!(
                "{}",
                format!(
                    "  Asked to slow down, polling every {}s",
                    session.poll_interval_seconds
                )
                .dimmed()
            ),
            _ => {}
        }
    }
}
