//! `/menus` endpoints

use async_trait::async_trait;
use rbac_admin_core::{
    ConsoleResult, CreateMenuRequest, Menu, MenuOrder, OneOrMany, UpdateMenuRequest,
};
use serde_json::json;

use super::{segment, HttpConsoleApi, MenuApi};

#[async_trait]
impl MenuApi for HttpConsoleApi {
    async fn list_menus(&self) -> ConsoleResult<Vec<Menu>> {
        let envelope = self
            .execute::<OneOrMany<Menu>>(self.get("menus"), "list_menus")
            .await?;
        Ok(envelope.data.map(OneOrMany::into_vec).unwrap_or_default())
    }

    async fn list_menus_by_type(&self, menu_type: &str) -> ConsoleResult<Vec<Menu>> {
        let envelope = self
            .execute::<OneOrMany<Menu>>(
                self.get(&format!("menus/type/{}", segment(menu_type))),
                "list_menus_by_type",
            )
            .await?;
        Ok(envelope.data.map(OneOrMany::into_vec).unwrap_or_default())
    }

    async fn get_menu(&self, id: &str) -> ConsoleResult<Menu> {
        self.execute_data(self.get(&format!("menus/{}", segment(id))), "get_menu")
            .await
    }

    async fn create_menu(&self, request: &CreateMenuRequest) -> ConsoleResult<Menu> {
        self.execute_data(self.post("menus").json(request), "create_menu")
            .await
    }

    async fn update_menu(&self, id: &str, request: &UpdateMenuRequest) -> ConsoleResult<Menu> {
        self.execute_data(
            self.put(&format!("menus/{}", segment(id))).json(request),
            "update_menu",
        )
        .await
    }

    async fn delete_menu(&self, id: &str) -> ConsoleResult<String> {
        self.execute_message(
            self.delete(&format!("menus/{}", segment(id))),
            "delete_menu",
            "Menu deleted",
        )
        .await
    }

    async fn reorder_menus(&self, orders: &[MenuOrder]) -> ConsoleResult<String> {
        self.execute_message(
            self.post("menus/reorder")
                .json(&json!({ "menuOrders": orders })),
            "reorder_menus",
            "Menus reordered",
        )
        .await
    }
}
