//! Core records read by the resolver

use crate::error::{AuthzError, Result};
use crate::scope::PermissionScope;
use serde::{Deserialize, Serialize};

/// Unique user identifier
pub type UserId = i64;

/// Unique circle identifier
pub type CircleId = i64;

/// Unique permission identifier
pub type PermissionId = i64;

/// Row-level constraint attached to a permission (e.g. `{"field": "body_id", "value": 5}`).
///
/// Opaque to the resolver; interpreted by whoever applies the grant.
pub type PermissionFilter = serde_json::Value;

/// Principal whose permissions are being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    /// User identifier
    pub id: UserId,

    /// Superadmins hold every permission regardless of circle membership
    #[serde(default)]
    pub superadmin: bool,
}

impl Principal {
    /// Regular user, scoped by circle membership
    pub fn user(id: UserId) -> Self {
        Self { id, superadmin: false }
    }

    /// Unrestricted user
    pub fn superadmin(id: UserId) -> Self {
        Self { id, superadmin: true }
    }
}

/// Organizational group node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    /// Circle identifier
    pub id: CircleId,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Circle this one is nested in, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_circle_id: Option<CircleId>,
}

impl Circle {
    /// Create a top-level circle
    pub fn new(id: CircleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_circle_id: None,
        }
    }

    /// Nest this circle under `parent`
    pub fn with_parent(mut self, parent: CircleId) -> Self {
        self.parent_circle_id = Some(parent);
        self
    }
}

/// Direct assignment of a user to a circle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CircleMembership {
    pub user_id: UserId,
    pub circle_id: CircleId,
}

impl CircleMembership {
    pub fn new(user_id: UserId, circle_id: CircleId) -> Self {
        Self { user_id, circle_id }
    }
}

/// Grant of a permission to a circle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CirclePermission {
    pub circle_id: CircleId,
    pub permission_id: PermissionId,
}

impl CirclePermission {
    pub fn new(circle_id: CircleId, permission_id: PermissionId) -> Self {
        Self {
            circle_id,
            permission_id,
        }
    }
}

/// Permission record
///
/// `combined` is `scope:action:object` and is the only key the resolver
/// addresses permissions by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    /// Permission identifier
    #[serde(default)]
    pub id: PermissionId,

    /// Scope tier
    pub scope: PermissionScope,

    /// Action (e.g. "edit")
    pub action: String,

    /// Object (e.g. "user")
    pub object: String,

    /// `scope:action:object`
    pub combined: String,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Row-level filters; empty means the grant is unconditional
    #[serde(default)]
    pub filters: Vec<PermissionFilter>,
}

impl Permission {
    /// Create a permission, deriving its combined key
    pub fn new(scope: PermissionScope, action: impl Into<String>, object: impl Into<String>) -> Self {
        let action = action.into();
        let object = object.into();
        let combined = Self::combine(scope, &action, &object);

        Self {
            id: 0,
            scope,
            action,
            object,
            combined,
            description: None,
            filters: Vec::new(),
        }
    }

    /// Set the identifier
    pub fn with_id(mut self, id: PermissionId) -> Self {
        self.id = id;
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach row-level filters
    pub fn with_filters(mut self, filters: Vec<PermissionFilter>) -> Self {
        self.filters = filters;
        self
    }

    /// Build the combined key for the given parts
    pub fn combine(scope: PermissionScope, action: &str, object: &str) -> String {
        format!("{}:{}:{}", scope.as_str(), action, object)
    }

    /// Check that action, object and combined key agree
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("action", &self.action), ("object", &self.object)] {
            if value.is_empty() {
                return Err(AuthzError::InvalidPermission(format!(
                    "Permission {} has an empty {}",
                    self.id, field
                )));
            }
            if value.contains(':') {
                return Err(AuthzError::InvalidPermission(format!(
                    "Permission {} {} '{}' contains ':'",
                    self.id, field, value
                )));
            }
        }

        let expected = Self::combine(self.scope, &self.action, &self.object);
        if self.combined != expected {
            return Err(AuthzError::InvalidPermission(format!(
                "Permission {} has combined key '{}', expected '{}'",
                self.id, self.combined, expected
            )));
        }

        Ok(())
    }
}
