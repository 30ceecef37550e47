//! `/user-rights` endpoints

use async_trait::async_trait;
use rbac_admin_core::{
    BulkRightsRequest, ConsoleResult, OneOrMany, PermissionCheckRequest, UserRight,
};
use tracing::debug;

use super::{segment, HttpConsoleApi, UserRightsApi};

#[async_trait]
impl UserRightsApi for HttpConsoleApi {
    async fn rights_by_role(&self, role_id: &str) -> ConsoleResult<Vec<UserRight>> {
        let envelope = self
            .execute::<OneOrMany<UserRight>>(
                self.get(&format!("user-rights/role/{}", segment(role_id))),
                "rights_by_role",
            )
            .await?;
        Ok(envelope.data.map(OneOrMany::into_vec).unwrap_or_default())
    }

    async fn upsert_right(&self, right: &UserRight) -> ConsoleResult<UserRight> {
        self.execute_data(self.post("user-rights").json(right), "upsert_right")
            .await
    }

    async fn bulk_update_rights(&self, request: &BulkRightsRequest) -> ConsoleResult<String> {
        debug!(
            role_id = %request.role_id,
            rows = request.rights.len(),
            "Sending bulk rights update"
        );
        self.execute_message(
            self.post("user-rights/bulk").json(request),
            "bulk_update_rights",
            "Permissions updated successfully",
        )
        .await
    }

    async fn check_permission(&self, request: &PermissionCheckRequest) -> ConsoleResult<bool> {
        let envelope = self
            .execute::<bool>(self.post("user-rights/check").json(request), "check_permission")
            .await?;
        Ok(envelope.data.unwrap_or(false))
    }
}
