//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`]: the caller identified by a JWT Bearer token.
//! - [`rbac::RequireManager`]: requires the `manager` role.
//! - [`rbac::RequireSupervisor`]: requires `supervisor` or `manager`.

pub mod auth;
pub mod rbac;
