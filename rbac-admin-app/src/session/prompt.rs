//! Confirmation hook for forced logins

use async_trait::async_trait;

/// Asked when the server reports that the account already has an active
/// session. Returning `true` re-sends the login with the force flag, which
/// ends the other sessions.
#[async_trait]
pub trait ForceLoginPrompt: Send + Sync {
    async fn confirm_force_login(&self, server_message: &str) -> bool;
}

/// Prompt with a predetermined answer (`--force`, tests)
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl ForceLoginPrompt for FixedAnswer {
    async fn confirm_force_login(&self, _server_message: &str) -> bool {
        self.0
    }
}
