//! Well-known worker role name constants.
//!
//! These must match the `CHECK` constraint on `workers.role` in
//! `20260301000002_create_workers.sql` and the `role` claim issued by the
//! identity provider.

pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_SUPERVISOR: &str = "supervisor";
pub const ROLE_WORKER: &str = "worker";

/// All recognised role names.
pub const ALL_ROLES: &[&str] = &[ROLE_MANAGER, ROLE_SUPERVISOR, ROLE_WORKER];

/// Check whether a role string is recognised.
pub fn is_valid_role(role: &str) -> bool {
    ALL_ROLES.contains(&role)
}
