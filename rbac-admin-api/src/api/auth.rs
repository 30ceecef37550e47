//! `/auth` endpoints

use async_trait::async_trait;
use rbac_admin_core::{
    AuthPayload, ChangePasswordRequest, ConsoleResult, LoginRequest, UpdateProfileRequest,
    UserProfile,
};
use serde_json::json;
use tracing::debug;

use super::{AuthApi, HttpConsoleApi};

#[async_trait]
impl AuthApi for HttpConsoleApi {
    async fn login(&self, request: &LoginRequest) -> ConsoleResult<AuthPayload> {
        debug!(email = %request.email, force = request.is_forced(), "Logging in");
        self.execute_data(self.post("auth/login").json(request), "login")
            .await
    }

    async fn logout(&self, refresh_token: &str) -> ConsoleResult<()> {
        self.execute::<serde_json::Value>(
            self.post("auth/logout")
                .json(&json!({ "refreshToken": refresh_token })),
            "logout",
        )
        .await?;
        Ok(())
    }

    async fn get_profile(&self) -> ConsoleResult<UserProfile> {
        self.execute_data(self.get("auth/profile"), "get_profile")
            .await
    }

    async fn update_profile(&self, request: &UpdateProfileRequest) -> ConsoleResult<UserProfile> {
        self.execute_data(self.put("auth/profile").json(request), "update_profile")
            .await
    }

    async fn change_password(&self, request: &ChangePasswordRequest) -> ConsoleResult<String> {
        self.execute_message(
            self.post("auth/change-password").json(request),
            "change_password",
            "Password changed",
        )
        .await
    }

    async fn forgot_password(&self, email: &str) -> ConsoleResult<String> {
        self.execute_message(
            self.post("auth/forgot-password")
                .json(&json!({ "strEmailId": email })),
            "forgot_password",
            "If the account exists, a reset link has been sent",
        )
        .await
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> ConsoleResult<String> {
        self.execute_message(
            self.post("auth/reset-password")
                .json(&json!({ "strToken": token, "strNewPassword": new_password })),
            "reset_password",
            "Password has been reset",
        )
        .await
    }
}
