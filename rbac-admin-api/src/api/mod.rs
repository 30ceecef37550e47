//! API clients for the admin backend
//!
//! This module defines the resource traits consumed by the application layer
//! and the shared HTTP plumbing used by [`HttpConsoleApi`].

use async_trait::async_trait;
use rbac_admin_core::{
    ApiConfig, AuthPayload, BulkRightsRequest, ChangePasswordRequest, ConsoleError,
    ConsoleResult, CreateMenuRequest, CreateRoleRequest, Envelope, ErrorContext, LoginRequest,
    Menu, MenuOrder, PermissionCheckRequest, Role, RoleFilter, UpdateMenuRequest,
    UpdateProfileRequest, UpdateRoleRequest, UserProfile, UserRight,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub mod auth;
pub mod menus;
pub mod roles;
pub mod user_rights;


/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Additional headers
    pub headers: HashMap<String, String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_seconds: config.timeout_seconds,
            user_agent: config.user_agent.clone(),
            headers: HashMap::new(),
        }
    }
}

impl ApiClientConfig {
    /// Configuration pointing at `base_url` with default settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set additional header
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }
}

/// Source of the bearer token attached to every request
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Option<String>;
}

/// `/auth/*` endpoints
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, request: &LoginRequest) -> ConsoleResult<AuthPayload>;

    /// `POST /auth/logout`, invalidating the refresh token server-side
    async fn logout(&self, refresh_token: &str) -> ConsoleResult<()>;

    async fn get_profile(&self) -> ConsoleResult<UserProfile>;

    async fn update_profile(&self, request: &UpdateProfileRequest) -> ConsoleResult<UserProfile>;

    async fn change_password(&self, request: &ChangePasswordRequest) -> ConsoleResult<String>;

    async fn forgot_password(&self, email: &str) -> ConsoleResult<String>;

    async fn reset_password(&self, token: &str, new_password: &str) -> ConsoleResult<String>;
}

/// `/roles` endpoints
#[async_trait]
pub trait RoleApi: Send + Sync {
    async fn list_roles(&self, filter: &RoleFilter) -> ConsoleResult<Vec<Role>>;

    async fn get_role(&self, id: &str) -> ConsoleResult<Role>;

    async fn create_role(&self, request: &CreateRoleRequest) -> ConsoleResult<Role>;

    async fn update_role(&self, id: &str, request: &UpdateRoleRequest) -> ConsoleResult<Role>;

    async fn delete_role(&self, id: &str) -> ConsoleResult<String>;

    /// Undo a soft delete
    async fn restore_role(&self, id: &str) -> ConsoleResult<Role>;
}

/// `/menus` endpoints
#[async_trait]
pub trait MenuApi: Send + Sync {
    async fn list_menus(&self) -> ConsoleResult<Vec<Menu>>;

    async fn list_menus_by_type(&self, menu_type: &str) -> ConsoleResult<Vec<Menu>>;

    async fn get_menu(&self, id: &str) -> ConsoleResult<Menu>;

    async fn create_menu(&self, request: &CreateMenuRequest) -> ConsoleResult<Menu>;

    async fn update_menu(&self, id: &str, request: &UpdateMenuRequest) -> ConsoleResult<Menu>;

    async fn delete_menu(&self, id: &str) -> ConsoleResult<String>;

    async fn reorder_menus(&self, orders: &[MenuOrder]) -> ConsoleResult<String>;
}

/// `/user-rights` endpoints
#[async_trait]
pub trait UserRightsApi: Send + Sync {
    /// Persisted rights of a role; may cover only part of the menu catalog
    async fn rights_by_role(&self, role_id: &str) -> ConsoleResult<Vec<UserRight>>;

    async fn upsert_right(&self, right: &UserRight) -> ConsoleResult<UserRight>;

    /// Full replace of a role's rights
    async fn bulk_update_rights(&self, request: &BulkRightsRequest) -> ConsoleResult<String>;

    async fn check_permission(&self, request: &PermissionCheckRequest) -> ConsoleResult<bool>;
}

/// Everything the console talks to
pub trait ConsoleApi: AuthApi + RoleApi + MenuApi + UserRightsApi {}

impl<T: AuthApi + RoleApi + MenuApi + UserRightsApi> ConsoleApi for T {}

/// HTTP implementation of every resource trait
pub struct HttpConsoleApi {
    client: reqwest::Client,
    config: ApiClientConfig,
    tokens: Option<Arc<dyn TokenProvider>>,
}

impl HttpConsoleApi {
    /// Create a new client
    pub fn new(config: ApiClientConfig) -> ConsoleResult<Self> {
        let client = create_http_client(&config)?;

        debug!(base_url = %config.base_url, "Created admin API client");

        Ok(Self {
            client,
            config,
            tokens: None,
        })
    }

    /// Attach the bearer token source
    pub fn with_token_provider(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    pub(crate) fn get(&self, endpoint: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(endpoint))
    }

    pub(crate) fn post(&self, endpoint: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(endpoint))
    }

    pub(crate) fn put(&self, endpoint: &str) -> reqwest::RequestBuilder {
        self.client.put(self.url(endpoint))
    }

    pub(crate) fn patch(&self, endpoint: &str) -> reqwest::RequestBuilder {
        self.client.patch(self.url(endpoint))
    }

    pub(crate) fn delete(&self, endpoint: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(endpoint))
    }

    /// Send a request and unwrap the response envelope
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> ConsoleResult<Envelope<T>> {
        let request = match &self.tokens {
            Some(tokens) => match tokens.access_token().await {
                Some(token) => request.bearer_auth(token),
                None => request,
            },
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, operation))?;

        let status = response.status();
        debug!(operation, status = status.as_u16(), "Admin API responded");

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, operation))?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &body, operation));
        }

        if body.trim().is_empty() {
            return Ok(Envelope {
                success: true,
                data: None,
                message: None,
                pagination: None,
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        if !envelope.success {
            return Err(ConsoleError::Server {
                message: envelope
                    .message
                    .unwrap_or_else(|| "The server rejected the request".to_string()),
                status: Some(status.as_u16()),
                context: ErrorContext::new("api_client").with_operation(operation),
            });
        }

        Ok(envelope)
    }

    /// Like [`execute`](Self::execute) but requires a `data` payload
    pub(crate) async fn execute_data<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> ConsoleResult<T> {
        self.execute(request, operation)
            .await?
            .data
            .ok_or_else(|| ConsoleError::Server {
                message: "Response did not contain any data".to_string(),
                status: None,
                context: ErrorContext::new("api_client").with_operation(operation),
            })
    }

    /// Like [`execute`](Self::execute) but only keeps the server message
    pub(crate) async fn execute_message(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
        fallback: &str,
    ) -> ConsoleResult<String> {
        let envelope = self
            .execute::<serde_json::Value>(request, operation)
            .await?;
        Ok(envelope.message.unwrap_or_else(|| fallback.to_string()))
    }
}

/// Percent-encode a path segment
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Helper function to create HTTP client with common configuration
pub(crate) fn create_http_client(config: &ApiClientConfig) -> ConsoleResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    for (key, value) in &config.headers {
        let header_name = reqwest::header::HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            ConsoleError::Config {
                message: format!("Invalid header name '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?;

        let header_value =
            reqwest::header::HeaderValue::from_str(value).map_err(|e| ConsoleError::Config {
                message: format!("Invalid header value for '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            })?;

        headers.insert(header_name, header_value);
    }

    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .build()
        .map_err(|e| ConsoleError::Config {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })
}

fn transport_error(error: reqwest::Error, operation: &str) -> ConsoleError {
    let message = if error.is_timeout() {
        "The server did not respond in time".to_string()
    } else if error.is_connect() {
        "Could not connect to the server".to_string()
    } else {
        format!("Request failed: {}", error)
    };

    ConsoleError::Network {
        message,
        source: Some(Box::new(error)),
        context: ErrorContext::new("api_client")
            .with_operation(operation)
            .with_suggestion("Check network connectivity and the api.base_url setting"),
    }
}

/// Error body shape shared by every endpoint
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<ErrorData>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorData {
    #[serde(rename = "hasActiveSession", default)]
    has_active_session: bool,
}

/// Map a non-2xx response onto the console's error taxonomy
pub(crate) fn classify_failure(status: u16, body: &str, operation: &str) -> ConsoleError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let has_active_session = parsed
        .data
        .as_ref()
        .map(|data| data.has_active_session)
        .unwrap_or(false);
    let message = parsed
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| default_message(status).to_string());
    let context = ErrorContext::new("api_client")
        .with_operation(operation)
        .with_metadata("status", &status.to_string());

    match status {
        401 | 403 => ConsoleError::Authentication {
            message,
            context: context.with_suggestion("Check your credentials or log in again"),
        },
        409 if has_active_session => ConsoleError::SessionConflict {
            message,
            context: context.with_suggestion("Confirm a forced login to end the other sessions"),
        },
        400 | 409 | 422 => ConsoleError::Validation {
            message,
            field: None,
            context,
        },
        404 => ConsoleError::NotFound {
            resource: message,
            context,
        },
        _ => ConsoleError::Server {
            message,
            status: Some(status),
            context: context.with_suggestion("Retry the operation in a moment"),
        },
    }
}

fn default_message(status: u16) -> &'static str {
    match status {
        401 => "Invalid credentials",
        403 => "You do not have permission to perform this action",
        404 => "Requested resource not found",
        409 => "The request conflicts with the current state",
        400 | 422 => "The request was invalid",
        _ => "Unexpected server error",
    }
}
