//! Session Manager - authentication lifecycle
//!
//! Owns login, logout, restore and profile changes. It is the only component
//! that writes the session store or the credential store.

use super::{CredentialStore, ForceLoginPrompt, SessionStore, StoredCredentials};
use rbac_admin_api::AuthApi;
use rbac_admin_core::{
    authentication_error, validation_error, ChangePasswordRequest, ConsoleError, ConsoleResult,
    ErrorContext, LoginRequest, Session, UpdateProfileRequest, UserProfile,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    credentials: Arc<dyn CredentialStore>,
    sessions: SessionStore,
}

impl SessionManager {
    pub fn new(
        api: Arc<dyn AuthApi>,
        credentials: Arc<dyn CredentialStore>,
        sessions: SessionStore,
    ) -> Self {
        Self {
            api,
            credentials,
            sessions,
        }
    }

    /// The shared session store this manager writes to
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn current(&self) -> Option<Session> {
        self.sessions.get().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.sessions.is_authenticated().await
    }

    /// Authenticate and persist the new session
    ///
    /// When the account already has an active session, `prompt` decides
    /// whether to retry with the force flag. Nothing is stored unless the
    /// login finally succeeds.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        prompt: &dyn ForceLoginPrompt,
    ) -> ConsoleResult<Session> {
        let email = email.trim();
        if email.is_empty() {
            return Err(validation_error!("Email is required", "strEmailId", "session"));
        }
        if password.is_empty() {
            return Err(validation_error!("Password is required", "strPassword", "session"));
        }

        info!(email, "Logging in");
        let request = LoginRequest::new(email, password);

        let payload = match self.api.login(&request).await {
            Ok(payload) => payload,
            Err(ConsoleError::SessionConflict { message, .. }) => {
                if !prompt.confirm_force_login(&message).await {
                    info!(email, "Forced login declined");
                    return Err(ConsoleError::SessionConflict {
                        message,
                        context: ErrorContext::new("session")
                            .with_operation("login")
                            .with_suggestion("Log in with --force to end the other session"),
                    });
                }
                info!(email, "Retrying login with force flag");
                self.api.login(&request.forced()).await?
            }
            Err(e) => return Err(e),
        };

        let session = payload.into_session();
        self.persist(&session).await?;
        self.sessions.set(session.clone()).await;

        info!(user_id = session.user_id(), "Login successful");
        Ok(session)
    }

    /// End the session; never fails
    ///
    /// The server is told to invalidate the refresh token when one is known.
    /// Local state is cleared whatever the server answers.
    pub async fn logout(&self) {
        let refresh_token = match self.sessions.get().await {
            Some(session) => Some(session.refresh_token),
            None => self
                .credentials
                .load()
                .await
                .ok()
                .flatten()
                .and_then(|stored| stored.refresh_token),
        };

        if let Some(token) = refresh_token {
            if let Err(e) = self.api.logout(&token).await {
                warn!(error = %e, "Server-side logout failed; clearing local session anyway");
            }
        }

        self.sessions.clear().await;
        if let Err(e) = self.credentials.clear().await {
            warn!(error = %e, "Failed to clear stored credentials");
        }
        debug!("Session cleared");
    }

    /// Bring back a persisted session and re-validate it with the server
    pub async fn restore_session(&self) -> Option<Session> {
        let stored = match self.credentials.load().await {
            Ok(Some(stored)) => stored,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable stored credentials");
                self.discard_credentials().await;
                return None;
            }
        };

        let Some(cached) = stored.to_session() else {
            info!("Discarding incomplete stored credentials");
            self.discard_credentials().await;
            return None;
        };

        // The profile request authenticates with the cached token
        self.sessions.set(cached.clone()).await;

        match self.api.get_profile().await {
            Ok(user) => match self.merge_user(user).await {
                Ok(session) => {
                    debug!(user_id = session.user_id(), "Session restored");
                    Some(session)
                }
                Err(e) => {
                    // Memory must keep matching what is stored
                    warn!(error = %e, "Could not persist refreshed profile; keeping stored user");
                    self.sessions.set(cached.clone()).await;
                    Some(cached)
                }
            },
            Err(e) => {
                info!(error = %e, "Stored session is no longer valid");
                self.logout().await;
                None
            }
        }
    }

    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> ConsoleResult<Session> {
        self.require_session().await?;
        if request.is_empty() {
            return Err(validation_error!("Nothing to update", "profile", "session"));
        }
        if let Some(name) = &request.name {
            if name.trim().is_empty() {
                return Err(validation_error!("Name cannot be empty", "strName", "session"));
            }
        }

        let user = self.api.update_profile(request).await?;
        self.merge_user(user).await
    }

    /// Re-fetch the profile and merge it into the session
    pub async fn refresh_profile(&self) -> ConsoleResult<Session> {
        self.require_session().await?;
        let user = self.api.get_profile().await?;
        self.merge_user(user).await
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> ConsoleResult<String> {
        self.require_session().await?;
        if new_password.is_empty() {
            return Err(validation_error!(
                "New password is required",
                "newPassword",
                "session"
            ));
        }
        if new_password == current_password {
            return Err(validation_error!(
                "New password must differ from the current one",
                "newPassword",
                "session"
            ));
        }

        self.api
            .change_password(&ChangePasswordRequest {
                current_password: current_password.to_string(),
                new_password: new_password.to_string(),
            })
            .await
    }

    pub async fn forgot_password(&self, email: &str) -> ConsoleResult<String> {
        let email = email.trim();
        if email.is_empty() {
            return Err(validation_error!("Email is required", "strEmailId", "session"));
        }
        self.api.forgot_password(email).await
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> ConsoleResult<String> {
        if token.trim().is_empty() {
            return Err(validation_error!("Reset token is required", "strToken", "session"));
        }
        if new_password.is_empty() {
            return Err(validation_error!(
                "New password is required",
                "strNewPassword",
                "session"
            ));
        }
        self.api.reset_password(token.trim(), new_password).await
    }

    async fn require_session(&self) -> ConsoleResult<()> {
        if self.sessions.is_authenticated().await {
            Ok(())
        } else {
            Err(authentication_error!("Not signed in", "session"))
        }
    }

    /// Replace the user record in memory and in the credential store
    async fn merge_user(&self, user: UserProfile) -> ConsoleResult<Session> {
        let session = self
            .sessions
            .replace_user(user)
            .await
            .ok_or_else(|| authentication_error!("Not signed in", "session"))?;
        self.persist(&session).await?;
        Ok(session)
    }

    async fn persist(&self, session: &Session) -> ConsoleResult<()> {
        let credentials = StoredCredentials::from_session(session)?;
        self.credentials.store(&credentials).await
    }

    async fn discard_credentials(&self) {
        self.sessions.clear().await;
        if let Err(e) = self.credentials.clear().await {
            warn!(error = %e, "Failed to clear stored credentials");
        }
    }
}
