//! Credential Storage - Persistence of the login triple
//!
//! The access token, refresh token and serialized user record are always
//! written and cleared together.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rbac_admin_core::{ConsoleError, ConsoleResult, ErrorContext, Session, UserProfile};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Persisted login triple
///
/// Every entry is optional on disk so that a partially written or hand-edited
/// file is detected instead of failing to parse.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredCredentials {
    #[serde(rename = "token", default)]
    pub access_token: Option<String>,
    #[serde(rename = "refreshToken", default)]
    pub refresh_token: Option<String>,
    /// User record serialized as JSON text
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl StoredCredentials {
    pub fn from_session(session: &Session) -> ConsoleResult<Self> {
        Ok(Self {
            access_token: Some(session.access_token.clone()),
            refresh_token: Some(session.refresh_token.clone()),
            user: Some(serde_json::to_string(&session.user)?),
            saved_at: Some(Utc::now()),
        })
    }

    /// The session these credentials describe; `None` when any entry is
    /// missing, empty, or the user record does not parse
    pub fn to_session(&self) -> Option<Session> {
        let access_token = self.access_token.as_ref().filter(|t| !t.is_empty())?;
        let refresh_token = self.refresh_token.as_ref().filter(|t| !t.is_empty())?;
        let user: UserProfile = serde_json::from_str(self.user.as_ref()?).ok()?;

        Some(Session {
            user,
            access_token: access_token.clone(),
            refresh_token: refresh_token.clone(),
        })
    }
}

impl fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user.is_some())
            .field("saved_at", &self.saved_at)
            .finish()
    }
}

/// Durable storage for the credential triple
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> ConsoleResult<Option<StoredCredentials>>;

    async fn store(&self, credentials: &StoredCredentials) -> ConsoleResult<()>;

    async fn clear(&self) -> ConsoleResult<()>;
}

/// In-memory credential store
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    slot: Arc<RwLock<Option<StoredCredentials>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `credentials`
    pub fn with_credentials(credentials: StoredCredentials) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(credentials))),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> ConsoleResult<Option<StoredCredentials>> {
        Ok(self.slot.read().await.clone())
    }

    async fn store(&self, credentials: &StoredCredentials) -> ConsoleResult<()> {
        *self.slot.write().await = Some(credentials.clone());
        Ok(())
    }

    async fn clear(&self) -> ConsoleResult<()> {
        *self.slot.write().await = None;
        Ok(())
    }
}

/// JSON file credential store
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Store backed by `path`; parent directories are created on first write
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        debug!(path = %path.display(), "Using file credential store");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, operation: &str, error: std::io::Error) -> ConsoleError {
        ConsoleError::Storage {
            message: format!(
                "Failed to {} credentials at {}: {}",
                operation,
                self.path.display(),
                error
            ),
            source: Some(Box::new(error)),
            context: ErrorContext::new("credential_store")
                .with_operation(operation)
                .with_metadata("path", &self.path.display().to_string())
                .with_suggestion("Check permissions of the storage.data_dir directory"),
        }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> ConsoleResult<Option<StoredCredentials>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.storage_error("read", e)),
        };

        let credentials = serde_json::from_str(&content).map_err(|e| ConsoleError::Storage {
            message: format!("Stored credentials are corrupted: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("credential_store").with_operation("parse"),
        })?;

        Ok(Some(credentials))
    }

    async fn store(&self, credentials: &StoredCredentials) -> ConsoleResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.storage_error("create directory for", e))?;
        }

        let content = serde_json::to_string_pretty(credentials)?;

        // Write then rename so the three entries land together
        let staging = self.path.with_extension("tmp");
        tokio::fs::write(&staging, content)
            .await
            .map_err(|e| self.storage_error("write", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&staging, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| self.storage_error("protect", e))?;
        }

        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|e| self.storage_error("write", e))?;

        info!(path = %self.path.display(), "Saved credentials");
        Ok(())
    }

    async fn clear(&self) -> ConsoleResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "Removed stored credentials");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.storage_error("remove", e)),
        }
    }
}
