//! The user performing an operation.

use serde::{Deserialize, Serialize};

use saleflow_core::UserId;

use crate::Permission;

/// Logged in user, passed explicitly to every operation that needs an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginUser {
    id: UserId,
    username: String,
    permissions: Vec<Permission>,
}

impl LoginUser {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            permissions: Vec::new(),
        }
    }

    /// Builder-style permission grant.
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.grant(permission);
        self
    }

    /// Shorthand for a user holding [`Permission::ADMIN`].
    pub fn admin(id: UserId, username: impl Into<String>) -> Self {
        Self::new(id, username).with_permission(Permission::ADMIN)
    }

    pub fn grant(&mut self, permission: Permission) {
        if !self.permissions.contains(&permission) {
            self.permissions.push(permission);
        }
    }

    pub fn revoke(&mut self, permission: &Permission) {
        self.permissions.retain(|p| p != permission);
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn has_permission(&self, required: &Permission) -> bool {
        self.permissions.iter().any(|p| p.grants(required))
    }

    /// Administrators may override guards such as cancelling confirmed sales.
    pub fn is_admin(&self) -> bool {
        self.has_permission(&Permission::ADMIN)
    }
}
