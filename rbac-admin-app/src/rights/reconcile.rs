use rbac_admin_core::{Menu, PermissionField, UserRight};
use std::collections::HashMap;

/// Merge the rights stored for `role_id` with the full menu catalog
///
/// The result has exactly one row per menu, in catalog order. A stored row is
/// used when one exists for the menu (the first one if the server returned
/// duplicates); otherwise the menu gets a zero-permission placeholder. Rows
/// for menus outside the catalog are dropped.
pub fn reconcile(role_id: &str, menus: &[Menu], fetched: Vec<UserRight>) -> Vec<UserRight> {
    let mut by_menu: HashMap<String, UserRight> = HashMap::with_capacity(fetched.len());
    for right in fetched {
        by_menu.entry(right.menu_id.clone()).or_insert(right);
    }

    menus
        .iter()
        .map(|menu| match by_menu.remove(&menu.id) {
            Some(mut right) => {
                if right.menu.is_none() {
                    right.menu = Some(menu.summary());
                }
                right
            }
            None => UserRight::placeholder(role_id, menu),
        })
        .collect()
}

/// Flip one flag on the row for `menu_id`
///
/// Every other row and field is left as is; an unknown menu leaves the
/// matrix unchanged.
pub fn toggle(matrix: &[UserRight], menu_id: &str, field: PermissionField) -> Vec<UserRight> {
    matrix
        .iter()
        .map(|row| {
            let mut row = row.clone();
            if row.menu_id == menu_id {
                row.flip(field);
            }
            row
        })
        .collect()
}

/// Copy the flags of `edited` onto the matching rows of `fresh`
///
/// Used after the catalog changed under an edit session: rows whose menu
/// survived keep the local edits, new menus keep their fetched values.
pub fn carry_edits(edited: &[UserRight], fresh: Vec<UserRight>) -> Vec<UserRight> {
    let by_menu: HashMap<&str, &UserRight> = edited
        .iter()
        .map(|row| (row.menu_id.as_str(), row))
        .collect();

    fresh
        .into_iter()
        .map(|mut row| {
            if let Some(previous) = by_menu.get(row.menu_id.as_str()) {
                for field in PermissionField::ALL {
                    row.set(field, previous.get(field));
                }
            }
            row
        })
        .collect()
}
