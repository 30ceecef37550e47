//! Stateful rights editor for one selected role

use super::reconcile::{carry_edits, reconcile, toggle};
use crate::directory::DirectoryCache;
use rbac_admin_api::UserRightsApi;
use rbac_admin_core::{
    matrix_not_ready_error, validation_error, BulkRightsRequest, ConsoleResult,
    PermissionCheckRequest, PermissionField, UserRight,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Result of [`RightsReconciler::load_matrix`]
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The matrix was installed for the role
    Loaded(Vec<UserRight>),
    /// Another role was selected before this load resolved; nothing changed
    Superseded,
}

/// Result of [`RightsReconciler::save`]
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The server accepted the bulk update
    Saved(String),
    /// The menu catalog changed since the matrix was loaded. The matrix was
    /// rebuilt with the pending edits carried over and nothing was sent.
    CatalogChanged,
}

#[derive(Debug, Clone)]
struct LoadedMatrix {
    rows: Vec<UserRight>,
    catalog_version: u64,
}

/// Local edits being carried onto a rebuilt matrix
struct CarriedEdits {
    previous: LoadedMatrix,
    pending: bool,
}

#[derive(Debug, Default)]
struct EditorState {
    selected_role: Option<String>,
    /// Ticket of the most recent load; older loads are discarded
    ticket: u64,
    loading: bool,
    matrix: Option<LoadedMatrix>,
    pending: bool,
}

/// Per-role rights matrix with toggle and bulk save
pub struct RightsReconciler {
    directory: Arc<DirectoryCache>,
    api: Arc<dyn UserRightsApi>,
    verify_catalog_on_save: bool,
    state: RwLock<EditorState>,
}

impl RightsReconciler {
    pub fn new(
        directory: Arc<DirectoryCache>,
        api: Arc<dyn UserRightsApi>,
        verify_catalog_on_save: bool,
    ) -> Self {
        Self {
            directory,
            api,
            verify_catalog_on_save,
            state: RwLock::new(EditorState::default()),
        }
    }

    /// Select `role_id` and build its matrix
    pub async fn load_matrix(&self, role_id: &str) -> ConsoleResult<LoadOutcome> {
        self.load_with(role_id, None).await
    }

    async fn load_with(
        &self,
        role_id: &str,
        edits: Option<CarriedEdits>,
    ) -> ConsoleResult<LoadOutcome> {
        if role_id.trim().is_empty() {
            return Err(validation_error!("Role is required", "strRoleGUID", "rights"));
        }

        let ticket = {
            let mut state = self.state.write().await;
            state.ticket += 1;
            state.selected_role = Some(role_id.to_string());
            state.loading = true;
            state.matrix = None;
            state.pending = false;
            state.ticket
        };
        debug!(role_id, ticket, "Loading rights matrix");

        let fetched = futures::try_join!(
            self.directory.menu_catalog(),
            self.api.rights_by_role(role_id)
        );

        let mut state = self.state.write().await;
        if state.ticket != ticket {
            debug!(role_id, ticket, latest = state.ticket, "Discarding superseded load");
            return Ok(LoadOutcome::Superseded);
        }
        state.loading = false;

        let ((catalog, rights), edits) = match (fetched, edits) {
            (Ok(fetched), edits) => (fetched, edits),
            (Err(e), Some(edits)) => {
                // Keep the stale catalog version so the next save rebuilds again
                warn!(role_id, error = %e, "Rebuild failed; keeping local edits");
                state.matrix = Some(edits.previous);
                state.pending = edits.pending;
                return Err(e);
            }
            (Err(e), None) => return Err(e),
        };
        let fresh = reconcile(role_id, &catalog.menus, rights);
        let rows = match edits {
            Some(edits) => {
                let carried = carry_edits(&edits.previous.rows, fresh.clone());
                state.pending = carried
                    .iter()
                    .zip(&fresh)
                    .any(|(a, b)| !a.same_flags(b));
                carried
            }
            None => fresh,
        };

        info!(role_id, rows = rows.len(), "Rights matrix ready");
        state.matrix = Some(LoadedMatrix {
            rows: rows.clone(),
            catalog_version: catalog.version,
        });
        Ok(LoadOutcome::Loaded(rows))
    }

    /// Flip one permission of one menu
    ///
    /// Returns whether a row for `menu_id` exists. Rejected until the
    /// current load has resolved.
    pub async fn toggle(&self, menu_id: &str, field: PermissionField) -> ConsoleResult<bool> {
        let mut state = self.state.write().await;
        let matrix = ready(&mut state)?;

        if !matrix.rows.iter().any(|row| row.menu_id == menu_id) {
            return Ok(false);
        }
        matrix.rows = toggle(&matrix.rows, menu_id, field);
        state.pending = true;
        Ok(true)
    }

    /// Send the whole matrix as a bulk update
    pub async fn save(&self) -> ConsoleResult<SaveOutcome> {
        let (role_id, ticket, snapshot, pending) = {
            let mut state = self.state.write().await;
            let matrix = ready(&mut state)?.clone();
            let role_id = state.selected_role.clone().unwrap_or_default();
            (role_id, state.ticket, matrix, state.pending)
        };

        if self.verify_catalog_on_save {
            self.directory.refresh_menus().await?;
        }
        let current_version = self.directory.menu_catalog_version().await;
        if current_version != snapshot.catalog_version {
            warn!(
                role_id = %role_id,
                loaded = snapshot.catalog_version,
                current = current_version,
                "Menu catalog changed since load; rebuilding matrix"
            );
            let edits = CarriedEdits {
                previous: snapshot,
                pending,
            };
            self.load_with(&role_id, Some(edits)).await?;
            return Ok(SaveOutcome::CatalogChanged);
        }

        let request = BulkRightsRequest {
            role_id: role_id.clone(),
            rights: snapshot.rows.clone(),
        };
        let message = self.api.bulk_update_rights(&request).await?;

        let mut state = self.state.write().await;
        let unchanged = state.ticket == ticket
            && state
                .matrix
                .as_ref()
                .is_some_and(|matrix| matrix.rows == snapshot.rows);
        if unchanged {
            state.pending = false;
        }

        info!(role_id = %role_id, rows = request.rights.len(), "Saved rights matrix");
        Ok(SaveOutcome::Saved(message))
    }

    /// Create or update a single rights row on the server
    pub async fn upsert_right(&self, right: &UserRight) -> ConsoleResult<UserRight> {
        let saved = self.api.upsert_right(right).await?;

        let mut state = self.state.write().await;
        let selected = state.selected_role.as_deref() == Some(saved.role_id.as_str());
        if let (true, Some(matrix)) = (selected, state.matrix.as_mut()) {
            if let Some(row) = matrix.rows.iter_mut().find(|r| r.menu_id == saved.menu_id) {
                let summary = row.menu.take();
                *row = saved.clone();
                if row.menu.is_none() {
                    row.menu = summary;
                }
            }
        }
        Ok(saved)
    }

    /// Ask the server whether `role_id` holds `field` on `menu_id`
    pub async fn check_permission(
        &self,
        role_id: &str,
        menu_id: &str,
        field: PermissionField,
    ) -> ConsoleResult<bool> {
        self.api
            .check_permission(&PermissionCheckRequest {
                role_id: role_id.to_string(),
                menu_id: menu_id.to_string(),
                permission_type: field.wire_name().to_string(),
            })
            .await
    }

    /// Current matrix, or `None` while loading or before the first load
    pub async fn matrix(&self) -> Option<Vec<UserRight>> {
        let state = self.state.read().await;
        if state.loading {
            return None;
        }
        state.matrix.as_ref().map(|matrix| matrix.rows.clone())
    }

    pub async fn selected_role(&self) -> Option<String> {
        self.state.read().await.selected_role.clone()
    }

    pub async fn has_pending_changes(&self) -> bool {
        self.state.read().await.pending
    }

    pub async fn is_ready(&self) -> bool {
        let state = self.state.read().await;
        !state.loading && state.matrix.is_some()
    }
}

fn ready(state: &mut EditorState) -> ConsoleResult<&mut LoadedMatrix> {
    if state.loading {
        return Err(matrix_not_ready_error!(
            "The rights matrix is still loading",
            "rights"
        ));
    }
    state
        .matrix
        .as_mut()
        .ok_or_else(|| matrix_not_ready_error!("No role selected", "rights"))
}
