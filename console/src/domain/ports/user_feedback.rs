//! Driving-side sink for operator-facing messages and confirmations.

use tracing::info;

/// Alerts and yes/no prompts shown to the operator.
#[cfg_attr(test, mockall::automock)]
pub trait UserFeedback: Send + Sync {
    /// Show a blocking message.
    fn alert(&self, message: &str);

    /// Ask a yes/no question; `true` means proceed.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Non-interactive feedback: alerts go to the log and every prompt is
/// accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureFeedback;

impl UserFeedback for FixtureFeedback {
    fn alert(&self, message: &str) {
        info!(%message, "alert");
    }

    fn confirm(&self, prompt: &str) -> bool {
        info!(%prompt, "auto-confirmed");
        true
    }
}
