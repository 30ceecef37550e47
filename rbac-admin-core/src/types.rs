//! Core data type definitions
//!
//! Field names on the wire follow the backend's JSON (`strRoleGUID`,
//! `bolCanView`, ...); the Rust side uses snake_case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical user record as returned by the auth endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "strUserGUID")]
    pub user_id: String,
    #[serde(rename = "strName")]
    pub name: String,
    #[serde(rename = "strEmailId")]
    pub email: String,
    #[serde(rename = "strMobileNo", default, skip_serializing_if = "Option::is_none")]
    pub mobile_no: Option<String>,
    #[serde(rename = "strRoleGUID", default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
    #[serde(
        rename = "strPreferredLanguage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub preferred_language: Option<String>,
    #[serde(rename = "strTimeZone", default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(rename = "bolIsSuperAdmin", default)]
    pub is_super_admin: bool,
    #[serde(rename = "bolIsActive", default)]
    pub is_active: bool,
}

/// An authenticated session: the user snapshot plus its token pair
#[derive(Clone, PartialEq)]
pub struct Session {
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user.user_id
    }

    pub fn display_name(&self) -> &str {
        &self.user.name
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }

    pub fn is_super_admin(&self) -> bool {
        self.user.is_super_admin
    }

    pub fn is_active(&self) -> bool {
        self.user.is_active
    }
}

// Tokens never reach logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "strRoleGUID")]
    pub id: String,
    #[serde(rename = "strRoleName")]
    pub name: String,
    #[serde(rename = "bolIsActive", default)]
    pub is_active: bool,
    #[serde(rename = "dtCreatedOn", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "dtUpdatedOn", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    #[serde(rename = "strMenuGUID")]
    pub id: String,
    #[serde(rename = "strMenuName")]
    pub name: String,
    #[serde(rename = "strMenuType", default, skip_serializing_if = "Option::is_none")]
    pub menu_type: Option<String>,
    /// Ordering key; menus without one sort last
    #[serde(rename = "dblSeqNo", default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<f64>,
    #[serde(rename = "strPath", default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(rename = "strMapKey", default, skip_serializing_if = "Option::is_none")]
    pub map_key: Option<String>,
    #[serde(rename = "dtCreatedOn", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "dtUpdatedOn", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Menu {
    /// Summary embedded in rights rows
    pub fn summary(&self) -> MenuSummary {
        MenuSummary {
            name: self.name.clone(),
            path: self.path.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuSummary {
    #[serde(rename = "strMenuName")]
    pub name: String,
    #[serde(rename = "strPath", default)]
    pub path: String,
}

/// The seven capabilities of a rights row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionField {
    View,
    Edit,
    Save,
    Delete,
    Print,
    Export,
    Import,
}

impl PermissionField {
    pub const ALL: [PermissionField; 7] = [
        PermissionField::View,
        PermissionField::Edit,
        PermissionField::Save,
        PermissionField::Delete,
        PermissionField::Print,
        PermissionField::Export,
        PermissionField::Import,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionField::View => "view",
            PermissionField::Edit => "edit",
            PermissionField::Save => "save",
            PermissionField::Delete => "delete",
            PermissionField::Print => "print",
            PermissionField::Export => "export",
            PermissionField::Import => "import",
        }
    }

    /// Column name used by the backend
    pub fn wire_name(&self) -> &'static str {
        match self {
            PermissionField::View => "bolCanView",
            PermissionField::Edit => "bolCanEdit",
            PermissionField::Save => "bolCanSave",
            PermissionField::Delete => "bolCanDelete",
            PermissionField::Print => "bolCanPrint",
            PermissionField::Export => "bolCanExport",
            PermissionField::Import => "bolCanImport",
        }
    }
}

impl fmt::Display for PermissionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        PermissionField::ALL
            .into_iter()
            .find(|field| field.as_str() == lowered || field.wire_name().to_lowercase() == lowered)
            .ok_or_else(|| {
                format!(
                    "Unknown permission: {} (expected one of view, edit, save, delete, print, export, import)",
                    s
                )
            })
    }
}

/// One row of the rights matrix; logical key is `(role_id, menu_id)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRight {
    #[serde(rename = "strUserRightsGUID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "strRoleGUID")]
    pub role_id: String,
    #[serde(rename = "strMenuGUID")]
    pub menu_id: String,
    #[serde(rename = "bolCanView", default)]
    pub can_view: bool,
    #[serde(rename = "bolCanEdit", default)]
    pub can_edit: bool,
    #[serde(rename = "bolCanSave", default)]
    pub can_save: bool,
    #[serde(rename = "bolCanDelete", default)]
    pub can_delete: bool,
    #[serde(rename = "bolCanPrint", default)]
    pub can_print: bool,
    #[serde(rename = "bolCanExport", default)]
    pub can_export: bool,
    #[serde(rename = "bolCanImport", default)]
    pub can_import: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<MenuSummary>,
}

impl UserRight {
    /// Zero-permission row standing in for a menu the server has no record for
    pub fn placeholder(role_id: &str, menu: &Menu) -> Self {
        Self {
            id: None,
            role_id: role_id.to_string(),
            menu_id: menu.id.clone(),
            can_view: false,
            can_edit: false,
            can_save: false,
            can_delete: false,
            can_print: false,
            can_export: false,
            can_import: false,
            menu: Some(menu.summary()),
        }
    }

    pub fn get(&self, field: PermissionField) -> bool {
        match field {
            PermissionField::View => self.can_view,
            PermissionField::Edit => self.can_edit,
            PermissionField::Save => self.can_save,
            PermissionField::Delete => self.can_delete,
            PermissionField::Print => self.can_print,
            PermissionField::Export => self.can_export,
            PermissionField::Import => self.can_import,
        }
    }

    pub fn set(&mut self, field: PermissionField, value: bool) {
        let slot = match field {
            PermissionField::View => &mut self.can_view,
            PermissionField::Edit => &mut self.can_edit,
            PermissionField::Save => &mut self.can_save,
            PermissionField::Delete => &mut self.can_delete,
            PermissionField::Print => &mut self.can_print,
            PermissionField::Export => &mut self.can_export,
            PermissionField::Import => &mut self.can_import,
        };
        *slot = value;
    }

    pub fn flip(&mut self, field: PermissionField) {
        self.set(field, !self.get(field));
    }

    /// Whether two rows grant the same capabilities
    pub fn same_flags(&self, other: &UserRight) -> bool {
        PermissionField::ALL
            .into_iter()
            .all(|field| self.get(field) == other.get(field))
    }
}

/// Credentials for `POST /auth/login`
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    #[serde(rename = "strEmailId")]
    pub email: String,
    #[serde(rename = "strPassword")]
    pub password: String,
    /// Asks the server to invalidate other active sessions
    #[serde(rename = "bolIsForce", skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            force: None,
        }
    }

    /// Same credentials with the force flag set
    pub fn forced(&self) -> Self {
        Self {
            force: Some(true),
            ..self.clone()
        }
    }

    pub fn is_forced(&self) -> bool {
        self.force.unwrap_or(false)
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("force", &self.force)
            .finish()
    }
}

/// Successful login payload
#[derive(Clone, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    pub user: UserProfile,
}

impl AuthPayload {
    pub fn into_session(self) -> Session {
        Session {
            user: self.user,
            access_token: self.token,
            refresh_token: self.refresh_token,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(rename = "strName", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "strMobileNo", skip_serializing_if = "Option::is_none")]
    pub mobile_no: Option<String>,
    #[serde(rename = "strPreferredLanguage", skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
    #[serde(rename = "strTimeZone", skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl UpdateProfileRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.mobile_no.is_none()
            && self.preferred_language.is_none()
            && self.time_zone.is_none()
    }
}

#[derive(Clone, Serialize)]
pub struct ChangePasswordRequest {
    #[serde(rename = "currentPassword")]
    pub current_password: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// Server-side filter for `GET /roles`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct RoleFilter {
    #[serde(rename = "bolIsActive", skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl RoleFilter {
    pub fn active() -> Self {
        Self {
            is_active: Some(true),
            search: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateRoleRequest {
    #[serde(rename = "strRoleName")]
    pub name: String,
    #[serde(rename = "bolIsActive", skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateRoleRequest {
    #[serde(rename = "strRoleName", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "bolIsActive", skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateMenuRequest {
    #[serde(rename = "strMenuName")]
    pub name: String,
    #[serde(rename = "strMenuType", skip_serializing_if = "Option::is_none")]
    pub menu_type: Option<String>,
    #[serde(rename = "dblSeqNo", skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<f64>,
    #[serde(rename = "strPath", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(rename = "strMapKey", skip_serializing_if = "Option::is_none")]
    pub map_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateMenuRequest {
    #[serde(rename = "strMenuName", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "strMenuType", skip_serializing_if = "Option::is_none")]
    pub menu_type: Option<String>,
    #[serde(rename = "dblSeqNo", skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<f64>,
    #[serde(rename = "strPath", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(rename = "strMapKey", skip_serializing_if = "Option::is_none")]
    pub map_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuOrder {
    #[serde(rename = "strMenuGUID")]
    pub menu_id: String,
    #[serde(rename = "dblSeqNo")]
    pub sequence_number: f64,
}

/// Body of `POST /user-rights/bulk`; the server replaces the role's rights
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkRightsRequest {
    #[serde(rename = "strRoleGUID")]
    pub role_id: String,
    pub rights: Vec<UserRight>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionCheckRequest {
    #[serde(rename = "strRoleGUID")]
    pub role_id: String,
    #[serde(rename = "strMenuGUID")]
    pub menu_id: String,
    #[serde(rename = "permissionType")]
    pub permission_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

/// Standard `{success, data, message}` response wrapper
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// List endpoints sometimes answer with a single object instead of an array
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}
