use rbac_admin_api::{MenuApi, RoleApi};
use rbac_admin_core::{
    validation_error, ConsoleResult, CreateMenuRequest, CreateRoleRequest, Menu, MenuOrder, Role,
    RoleFilter, UpdateMenuRequest, UpdateRoleRequest,
};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Menu list together with the catalog version it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct MenuCatalog {
    pub menus: Vec<Menu>,
    pub version: u64,
}

#[derive(Default)]
struct MenuState {
    menus: Option<Vec<Menu>>,
    /// Bumped whenever a refresh changes the set of menu ids
    version: u64,
}

/// Cached role and menu directories
pub struct DirectoryCache {
    roles_api: Arc<dyn RoleApi>,
    menus_api: Arc<dyn MenuApi>,
    roles: RwLock<HashMap<RoleFilter, Vec<Role>>>,
    menus: RwLock<MenuState>,
}

impl DirectoryCache {
    pub fn new(roles_api: Arc<dyn RoleApi>, menus_api: Arc<dyn MenuApi>) -> Self {
        Self {
            roles_api,
            menus_api,
            roles: RwLock::new(HashMap::new()),
            menus: RwLock::new(MenuState::default()),
        }
    }

    /// Roles in server order, cached per filter
    pub async fn list_roles(&self, filter: &RoleFilter) -> ConsoleResult<Vec<Role>> {
        if let Some(roles) = self.roles.read().await.get(filter) {
            return Ok(roles.clone());
        }
        self.refresh_roles(filter).await
    }

    pub async fn refresh_roles(&self, filter: &RoleFilter) -> ConsoleResult<Vec<Role>> {
        let roles = self.roles_api.list_roles(filter).await?;
        debug!(count = roles.len(), ?filter, "Fetched roles");
        self.roles.write().await.insert(filter.clone(), roles.clone());
        Ok(roles)
    }

    /// Menus ordered by sequence number
    pub async fn list_menus(&self) -> ConsoleResult<Vec<Menu>> {
        Ok(self.menu_catalog().await?.menus)
    }

    /// Menus plus the catalog version they belong to, read atomically
    pub async fn menu_catalog(&self) -> ConsoleResult<MenuCatalog> {
        {
            let state = self.menus.read().await;
            if let Some(menus) = &state.menus {
                return Ok(MenuCatalog {
                    menus: menus.clone(),
                    version: state.version,
                });
            }
        }
        self.refresh_menus().await
    }

    pub async fn refresh_menus(&self) -> ConsoleResult<MenuCatalog> {
        let mut menus = self.menus_api.list_menus().await?;
        sort_menus(&mut menus);

        let mut state = self.menus.write().await;
        let changed = match &state.menus {
            Some(previous) => id_set(previous) != id_set(&menus),
            None => true,
        };
        if changed {
            state.version += 1;
            debug!(version = state.version, count = menus.len(), "Menu catalog changed");
        }
        state.menus = Some(menus.clone());

        Ok(MenuCatalog {
            menus,
            version: state.version,
        })
    }

    pub async fn menu_catalog_version(&self) -> u64 {
        self.menus.read().await.version
    }

    /// Drop both directories; the catalog version is kept
    pub async fn invalidate(&self) {
        self.roles.write().await.clear();
        self.menus.write().await.menus = None;
        debug!("Directory cache invalidated");
    }

    pub async fn get_role(&self, id: &str) -> ConsoleResult<Role> {
        self.roles_api.get_role(id).await
    }

    pub async fn create_role(&self, request: &CreateRoleRequest) -> ConsoleResult<Role> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(validation_error!("Role name is required", "strRoleName", "directory"));
        }
        let request = CreateRoleRequest {
            name: name.to_string(),
            ..request.clone()
        };

        let role = self.roles_api.create_role(&request).await?;
        info!(role_id = %role.id, name = %role.name, "Created role");
        self.reload_roles().await;
        Ok(role)
    }

    pub async fn update_role(&self, id: &str, request: &UpdateRoleRequest) -> ConsoleResult<Role> {
        let request = UpdateRoleRequest {
            name: checked_name(request.name.as_deref(), "Role name", "strRoleName")?,
            ..request.clone()
        };

        let role = self.roles_api.update_role(id, &request).await?;
        info!(role_id = %role.id, "Updated role");
        self.reload_roles().await;
        Ok(role)
    }

    pub async fn delete_role(&self, id: &str) -> ConsoleResult<String> {
        let message = self.roles_api.delete_role(id).await?;
        info!(role_id = id, "Deleted role");
        self.reload_roles().await;
        Ok(message)
    }

    pub async fn restore_role(&self, id: &str) -> ConsoleResult<Role> {
        let role = self.roles_api.restore_role(id).await?;
        info!(role_id = id, "Restored role");
        self.reload_roles().await;
        Ok(role)
    }

    pub async fn get_menu(&self, id: &str) -> ConsoleResult<Menu> {
        self.menus_api.get_menu(id).await
    }

    /// Menus of one type, sorted like the catalog; not cached
    pub async fn list_menus_by_type(&self, menu_type: &str) -> ConsoleResult<Vec<Menu>> {
        let mut menus = self.menus_api.list_menus_by_type(menu_type).await?;
        sort_menus(&mut menus);
        Ok(menus)
    }

    pub async fn create_menu(&self, request: &CreateMenuRequest) -> ConsoleResult<Menu> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(validation_error!("Menu name is required", "strMenuName", "directory"));
        }
        let request = CreateMenuRequest {
            name: name.to_string(),
            ..request.clone()
        };

        let menu = self.menus_api.create_menu(&request).await?;
        info!(menu_id = %menu.id, name = %menu.name, "Created menu");
        self.reload_menus().await;
        Ok(menu)
    }

    pub async fn update_menu(&self, id: &str, request: &UpdateMenuRequest) -> ConsoleResult<Menu> {
        let request = UpdateMenuRequest {
            name: checked_name(request.name.as_deref(), "Menu name", "strMenuName")?,
            ..request.clone()
        };

        let menu = self.menus_api.update_menu(id, &request).await?;
        info!(menu_id = %menu.id, "Updated menu");
        self.reload_menus().await;
        Ok(menu)
    }

    pub async fn delete_menu(&self, id: &str) -> ConsoleResult<String> {
        let message = self.menus_api.delete_menu(id).await?;
        info!(menu_id = id, "Deleted menu");
        self.reload_menus().await;
        Ok(message)
    }

    pub async fn reorder_menus(&self, orders: &[MenuOrder]) -> ConsoleResult<String> {
        if orders.is_empty() {
            return Err(validation_error!("No menu order given", "menuOrders", "directory"));
        }
        let message = self.menus_api.reorder_menus(orders).await?;
        info!(count = orders.len(), "Reordered menus");
        self.reload_menus().await;
        Ok(message)
    }

    // A failed re-fetch leaves the list uncached so the next read retries.
    async fn reload_roles(&self) {
        self.roles.write().await.clear();
        if let Err(e) = self.refresh_roles(&RoleFilter::default()).await {
            warn!(error = %e, "Failed to reload roles after change");
        }
    }

    async fn reload_menus(&self) {
        self.menus.write().await.menus = None;
        if let Err(e) = self.refresh_menus().await {
            warn!(error = %e, "Failed to reload menus after change");
        }
    }
}

/// Stable sort by sequence number; menus without one go last
pub fn sort_menus(menus: &mut [Menu]) {
    menus.sort_by(|a, b| match (a.sequence_number, b.sequence_number) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

fn id_set(menus: &[Menu]) -> HashSet<&str> {
    menus.iter().map(|m| m.id.as_str()).collect()
}

fn checked_name(name: Option<&str>, label: &str, field: &str) -> ConsoleResult<Option<String>> {
    match name.map(str::trim) {
        Some("") => Err(validation_error!(
            format!("{} cannot be empty", label),
            field,
            "directory"
        )),
        other => Ok(other.map(str::to_string)),
    }
}
