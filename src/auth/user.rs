//! Cached principal snapshot used for role-based UI rendering.
//!
//! This is a denormalized copy of what the server told us at login/refresh
//! time. It is never authoritative - the server re-validates every request.

use serde::{Deserialize, Serialize};

/// Permissions implied by the `finance_admin` role.
///
/// This list is hardcoded separately from the general permission-array check
/// used for every other role; carried over unchanged pending product
/// clarification on whether it is policy or a migration leftover.
const FINANCE_ADMIN_PERMISSIONS: &[&str] = &[
    "fees.view",
    "fees.manage",
    "payments.view",
    "payments.record",
    "invoices.issue",
    "reports.finance",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedUser {
    pub id: i64,
    pub username: String,
    pub role: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl CachedUser {
    /// UI-level permission gate. `finance_admin` checks against its own
    /// hardcoded list; all other roles check the server-provided array.
    pub fn has_permission(&self, permission: &str) -> bool {
        if self.role == "finance_admin" {
            FINANCE_ADMIN_PERMISSIONS.contains(&permission)
        } else {
            self.permissions.iter().any(|p| p == permission)
        }
    }

    pub fn is_role(&self, role: &str) -> bool {
        self.role == role
    }
}
