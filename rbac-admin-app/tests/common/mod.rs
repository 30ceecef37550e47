//! In-memory fakes of the admin backend

#![allow(dead_code)]

use async_trait::async_trait;
use rbac_admin_api::{AuthApi, MenuApi, RoleApi, UserRightsApi};
use rbac_admin_app::{CredentialStore, MemoryCredentialStore, StoredCredentials};
use rbac_admin_core::{
    authentication_error, not_found_error, AuthPayload, BulkRightsRequest, ChangePasswordRequest,
    ConsoleError, ConsoleResult, CreateMenuRequest, CreateRoleRequest, ErrorContext,
    LoginRequest, Menu, MenuOrder, PermissionCheckRequest, Role, RoleFilter, UpdateMenuRequest,
    UpdateProfileRequest, UpdateRoleRequest, UserProfile, UserRight,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};

pub const PASSWORD: &str = "s3cret";
pub const BUSY_EMAIL: &str = "busy@x.com";

pub fn user(name: &str) -> UserProfile {
    UserProfile {
        user_id: "u-1".to_string(),
        name: name.to_string(),
        email: "a@x.com".to_string(),
        mobile_no: None,
        role_id: Some("r-admin".to_string()),
        preferred_language: None,
        time_zone: None,
        is_super_admin: true,
        is_active: true,
    }
}

pub fn menu(id: &str, seq: Option<f64>) -> Menu {
    Menu {
        id: id.to_string(),
        name: format!("Menu {}", id),
        menu_type: Some("main".to_string()),
        sequence_number: seq,
        path: Some(format!("/{}", id)),
        map_key: None,
        created_at: None,
        updated_at: None,
    }
}

pub fn role(id: &str, name: &str) -> Role {
    Role {
        id: id.to_string(),
        name: name.to_string(),
        is_active: true,
        created_at: None,
        updated_at: None,
    }
}

pub fn right(role_id: &str, menu_id: &str, view: bool) -> UserRight {
    UserRight {
        id: Some(format!("ur-{}-{}", role_id, menu_id)),
        role_id: role_id.to_string(),
        menu_id: menu_id.to_string(),
        can_view: view,
        can_edit: false,
        can_save: false,
        can_delete: false,
        can_print: false,
        can_export: false,
        can_import: false,
        menu: None,
    }
}

fn server_error(message: &str) -> ConsoleError {
    ConsoleError::Server {
        message: message.to_string(),
        status: Some(500),
        context: ErrorContext::new("fake_backend"),
    }
}

/// Holds back `rights_by_role` for one role until released
pub struct Gate {
    pub entered: Arc<Notify>,
    release: oneshot::Sender<()>,
}

impl Gate {
    pub fn release(self) {
        let _ = self.release.send(());
    }
}

#[derive(Default)]
pub struct FakeBackend {
    pub logins: Mutex<Vec<LoginRequest>>,
    pub logout_tokens: Mutex<Vec<String>>,
    pub logout_fails: AtomicBool,
    pub profile_fails: AtomicBool,
    pub profile_name: Mutex<Option<String>>,
    pub token_counter: AtomicUsize,

    pub roles: Mutex<Vec<Role>>,
    pub role_list_calls: AtomicUsize,

    pub menus: Mutex<Vec<Menu>>,
    pub menu_list_calls: AtomicUsize,
    pub menus_fail: AtomicBool,

    pub rights: Mutex<HashMap<String, Vec<UserRight>>>,
    pub bulk_requests: Mutex<Vec<BulkRightsRequest>>,
    pub bulk_fails: AtomicBool,
    pub rights_fail: AtomicBool,
    pub checks: Mutex<Vec<PermissionCheckRequest>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    gate_signals: Mutex<HashMap<String, Arc<Notify>>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_menus(menus: Vec<Menu>) -> Arc<Self> {
        let backend = Self::default();
        *backend.menus.lock().unwrap() = menus;
        Arc::new(backend)
    }

    pub fn set_rights(&self, role_id: &str, rights: Vec<UserRight>) {
        self.rights
            .lock()
            .unwrap()
            .insert(role_id.to_string(), rights);
    }

    /// Make the next `rights_by_role(role_id)` wait for [`Gate::release`]
    pub fn gate(&self, role_id: &str) -> Gate {
        let (release, wait) = oneshot::channel();
        let entered = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(role_id.to_string(), wait);
        self.gate_signals
            .lock()
            .unwrap()
            .insert(role_id.to_string(), entered.clone());
        Gate { entered, release }
    }
}

#[async_trait]
impl AuthApi for FakeBackend {
    async fn login(&self, request: &LoginRequest) -> ConsoleResult<AuthPayload> {
        self.logins.lock().unwrap().push(request.clone());

        if request.password != PASSWORD {
            return Err(authentication_error!("Invalid email or password", "fake_backend"));
        }
        if request.email == BUSY_EMAIL && !request.is_forced() {
            return Err(ConsoleError::SessionConflict {
                message: "User already has an active session".to_string(),
                context: ErrorContext::new("fake_backend"),
            });
        }

        let n = self.token_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let mut profile = user("Ada");
        profile.email = request.email.clone();
        Ok(AuthPayload {
            token: format!("access-{}", n),
            refresh_token: format!("refresh-{}", n),
            user: profile,
        })
    }

    async fn logout(&self, refresh_token: &str) -> ConsoleResult<()> {
        self.logout_tokens
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        if self.logout_fails.load(Ordering::SeqCst) {
            return Err(server_error("Logout failed"));
        }
        Ok(())
    }

    async fn get_profile(&self) -> ConsoleResult<UserProfile> {
        if self.profile_fails.load(Ordering::SeqCst) {
            return Err(authentication_error!("Token expired", "fake_backend"));
        }
        let name = self
            .profile_name
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| "Ada".to_string());
        Ok(user(&name))
    }

    async fn update_profile(&self, request: &UpdateProfileRequest) -> ConsoleResult<UserProfile> {
        let mut profile = user(request.name.as_deref().unwrap_or("Ada"));
        profile.mobile_no = request.mobile_no.clone();
        profile.time_zone = request.time_zone.clone();
        Ok(profile)
    }

    async fn change_password(&self, request: &ChangePasswordRequest) -> ConsoleResult<String> {
        if request.current_password != PASSWORD {
            return Err(ConsoleError::Validation {
                message: "Current password is incorrect".to_string(),
                field: None,
                context: ErrorContext::new("fake_backend"),
            });
        }
        Ok("Password changed successfully".to_string())
    }

    async fn forgot_password(&self, _email: &str) -> ConsoleResult<String> {
        Ok("Reset link sent".to_string())
    }

    async fn reset_password(&self, _token: &str, _new_password: &str) -> ConsoleResult<String> {
        Ok("Password reset".to_string())
    }
}

#[async_trait]
impl RoleApi for FakeBackend {
    async fn list_roles(&self, filter: &RoleFilter) -> ConsoleResult<Vec<Role>> {
        self.role_list_calls.fetch_add(1, Ordering::SeqCst);
        let roles = self.roles.lock().unwrap();
        Ok(roles
            .iter()
            .filter(|r| filter.is_active.map_or(true, |active| r.is_active == active))
            .filter(|r| {
                filter
                    .search
                    .as_deref()
                    .map_or(true, |s| r.name.to_lowercase().contains(&s.to_lowercase()))
            })
            .cloned()
            .collect())
    }

    async fn get_role(&self, id: &str) -> ConsoleResult<Role> {
        self.roles
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| not_found_error!(format!("Role {}", id), "fake_backend"))
    }

    async fn create_role(&self, request: &CreateRoleRequest) -> ConsoleResult<Role> {
        let mut roles = self.roles.lock().unwrap();
        let mut created = role(&format!("r-{}", roles.len() + 1), &request.name);
        created.is_active = request.is_active.unwrap_or(true);
        roles.push(created.clone());
        Ok(created)
    }

    async fn update_role(&self, id: &str, request: &UpdateRoleRequest) -> ConsoleResult<Role> {
        let mut roles = self.roles.lock().unwrap();
        let existing = roles
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found_error!(format!("Role {}", id), "fake_backend"))?;
        if let Some(name) = &request.name {
            existing.name = name.clone();
        }
        if let Some(active) = request.is_active {
            existing.is_active = active;
        }
        Ok(existing.clone())
    }

    async fn delete_role(&self, id: &str) -> ConsoleResult<String> {
        let mut roles = self.roles.lock().unwrap();
        let before = roles.len();
        roles.retain(|r| r.id != id);
        if roles.len() == before {
            return Err(not_found_error!(format!("Role {}", id), "fake_backend"));
        }
        Ok("Role deleted successfully".to_string())
    }

    async fn restore_role(&self, id: &str) -> ConsoleResult<Role> {
        let restored = role(id, "Restored");
        self.roles.lock().unwrap().push(restored.clone());
        Ok(restored)
    }
}

#[async_trait]
impl MenuApi for FakeBackend {
    async fn list_menus(&self) -> ConsoleResult<Vec<Menu>> {
        self.menu_list_calls.fetch_add(1, Ordering::SeqCst);
        if self.menus_fail.load(Ordering::SeqCst) {
            return Err(server_error("Menu service unavailable"));
        }
        Ok(self.menus.lock().unwrap().clone())
    }

    async fn list_menus_by_type(&self, menu_type: &str) -> ConsoleResult<Vec<Menu>> {
        Ok(self
            .menus
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.menu_type.as_deref() == Some(menu_type))
            .cloned()
            .collect())
    }

    async fn get_menu(&self, id: &str) -> ConsoleResult<Menu> {
        self.menus
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| not_found_error!(format!("Menu {}", id), "fake_backend"))
    }

    async fn create_menu(&self, request: &CreateMenuRequest) -> ConsoleResult<Menu> {
        let mut menus = self.menus.lock().unwrap();
        let mut created = menu(&format!("m-new-{}", menus.len() + 1), request.sequence_number);
        created.name = request.name.clone();
        created.menu_type = request.menu_type.clone();
        created.path = request.path.clone();
        menus.push(created.clone());
        Ok(created)
    }

    async fn update_menu(&self, id: &str, request: &UpdateMenuRequest) -> ConsoleResult<Menu> {
        let mut menus = self.menus.lock().unwrap();
        let existing = menus
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| not_found_error!(format!("Menu {}", id), "fake_backend"))?;
        if let Some(name) = &request.name {
            existing.name = name.clone();
        }
        if let Some(seq) = request.sequence_number {
            existing.sequence_number = Some(seq);
        }
        Ok(existing.clone())
    }

    async fn delete_menu(&self, id: &str) -> ConsoleResult<String> {
        self.menus.lock().unwrap().retain(|m| m.id != id);
        Ok("Menu deleted successfully".to_string())
    }

    async fn reorder_menus(&self, orders: &[MenuOrder]) -> ConsoleResult<String> {
        let mut menus = self.menus.lock().unwrap();
        for order in orders {
            if let Some(menu) = menus.iter_mut().find(|m| m.id == order.menu_id) {
                menu.sequence_number = Some(order.sequence_number);
            }
        }
        Ok("Menus reordered successfully".to_string())
    }
}

#[async_trait]
impl UserRightsApi for FakeBackend {
    async fn rights_by_role(&self, role_id: &str) -> ConsoleResult<Vec<UserRight>> {
        let gate = self.gates.lock().unwrap().remove(role_id);
        if let Some(wait) = gate {
            let entered = self.gate_signals.lock().unwrap().remove(role_id);
            if let Some(entered) = entered {
                entered.notify_one();
            }
            let _ = wait.await;
        }
        if self.rights_fail.load(Ordering::SeqCst) {
            return Err(server_error("Rights service unavailable"));
        }
        Ok(self
            .rights
            .lock()
            .unwrap()
            .get(role_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert_right(&self, right: &UserRight) -> ConsoleResult<UserRight> {
        let mut saved = right.clone();
        saved.id.get_or_insert_with(|| "ur-upserted".to_string());
        saved.menu = None;
        Ok(saved)
    }

    async fn bulk_update_rights(&self, request: &BulkRightsRequest) -> ConsoleResult<String> {
        self.bulk_requests.lock().unwrap().push(request.clone());
        if self.bulk_fails.load(Ordering::SeqCst) {
            return Err(server_error("Database unavailable"));
        }
        self.set_rights(&request.role_id, request.rights.clone());
        Ok("Permissions updated successfully".to_string())
    }

    async fn check_permission(&self, request: &PermissionCheckRequest) -> ConsoleResult<bool> {
        self.checks.lock().unwrap().push(request.clone());
        Ok(request.permission_type == "bolCanView" && request.menu_id == "m2")
    }
}

/// Credential store counting writes
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryCredentialStore,
    pub writes: AtomicUsize,
    pub clears: AtomicUsize,
    pub fail_writes: AtomicBool,
}

impl CountingStore {
    pub fn seeded(credentials: StoredCredentials) -> Self {
        Self {
            inner: MemoryCredentialStore::with_credentials(credentials),
            ..Default::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for CountingStore {
    async fn load(&self) -> ConsoleResult<Option<StoredCredentials>> {
        self.inner.load().await
    }

    async fn store(&self, credentials: &StoredCredentials) -> ConsoleResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ConsoleError::Storage {
                message: "Disk full".to_string(),
                source: None,
                context: ErrorContext::new("counting_store"),
            });
        }
        self.inner.store(credentials).await
    }

    async fn clear(&self) -> ConsoleResult<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear().await
    }
}
