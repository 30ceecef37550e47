//! `/roles` endpoints

use async_trait::async_trait;
use rbac_admin_core::{
    ConsoleResult, CreateRoleRequest, OneOrMany, Role, RoleFilter, UpdateRoleRequest,
};

use super::{segment, HttpConsoleApi, RoleApi};

#[async_trait]
impl RoleApi for HttpConsoleApi {
    async fn list_roles(&self, filter: &RoleFilter) -> ConsoleResult<Vec<Role>> {
        let envelope = self
            .execute::<OneOrMany<Role>>(self.get("roles").query(filter), "list_roles")
            .await?;
        Ok(envelope.data.map(OneOrMany::into_vec).unwrap_or_default())
    }

    async fn get_role(&self, id: &str) -> ConsoleResult<Role> {
        self.execute_data(self.get(&format!("roles/{}", segment(id))), "get_role")
            .await
    }

    async fn create_role(&self, request: &CreateRoleRequest) -> ConsoleResult<Role> {
        self.execute_data(self.post("roles").json(request), "create_role")
            .await
    }

    async fn update_role(&self, id: &str, request: &UpdateRoleRequest) -> ConsoleResult<Role> {
        self.execute_data(
            self.put(&format!("roles/{}", segment(id))).json(request),
            "update_role",
        )
        .await
    }

    async fn delete_role(&self, id: &str) -> ConsoleResult<String> {
        self.execute_message(
            self.delete(&format!("roles/{}", segment(id))),
            "delete_role",
            "Role deleted",
        )
        .await
    }

    async fn restore_role(&self, id: &str) -> ConsoleResult<Role> {
        self.execute_data(
            self.patch(&format!("roles/{}/restore", segment(id))),
            "restore_role",
        )
        .await
    }
}
