//! Read access to circles, memberships and permissions

use crate::error::{AuthzError, Result};
use crate::scope::PermissionScope;
use crate::types::{Circle, CircleId, CircleMembership, CirclePermission, Permission, PermissionId, UserId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::PostgresPermissionStore;

/// Which permission rows to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionQuery {
    /// Every permission (superadmin)
    All,
    /// Permissions in one of `scopes` granted to any circle in `circles`
    GrantedTo {
        circles: HashSet<CircleId>,
        scopes: Vec<PermissionScope>,
    },
}

impl PermissionQuery {
    /// Global-scope permissions granted to any of the given circles
    pub fn global_granted_to(circles: HashSet<CircleId>) -> Self {
        Self::GrantedTo {
            circles,
            scopes: vec![PermissionScope::Global],
        }
    }
}

/// Permission store trait
///
/// Implementations only need to read; the resolver never writes.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Circles the user is directly assigned to
    async fn find_direct_memberships(&self, user_id: UserId) -> Result<Vec<CircleMembership>>;

    /// Every circle, with its parent link
    async fn find_all_circles(&self) -> Result<Vec<Circle>>;

    /// Circles with the given identifiers; unknown identifiers are skipped
    async fn find_circles_by_id(&self, ids: &[CircleId]) -> Result<Vec<Circle>>;

    /// Permissions matching the query, ordered by identifier
    async fn find_permissions(&self, query: &PermissionQuery) -> Result<Vec<Permission>>;
}

/// In-memory permission store implementation
#[derive(Clone, Default)]
pub struct InMemoryPermissionStore {
    circles: Arc<RwLock<HashMap<CircleId, Circle>>>,
    memberships: Arc<RwLock<HashSet<CircleMembership>>>,
    permissions: Arc<RwLock<HashMap<PermissionId, Permission>>>,
    grants: Arc<RwLock<HashSet<CirclePermission>>>,
}

impl InMemoryPermissionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a circle, replacing any circle with the same identifier
    pub async fn put_circle(&self, circle: Circle) {
        let mut circles = self.circles.write().await;
        circles.insert(circle.id, circle);
    }

    /// Assign a user directly to a circle
    pub async fn put_membership(&self, membership: CircleMembership) {
        let mut memberships = self.memberships.write().await;
        memberships.insert(membership);
    }

    /// Store a permission
    ///
    /// Rejects records that fail validation and records whose combined key is
    /// already used by a different permission.
    pub async fn put_permission(&self, permission: Permission) -> Result<()> {
        permission.validate()?;

        let mut permissions = self.permissions.write().await;
        if let Some(existing) = permissions
            .values()
            .find(|p| p.combined == permission.combined && p.id != permission.id)
        {
            return Err(AuthzError::InvalidPermission(format!(
                "Combined key '{}' already used by permission {}",
                permission.combined, existing.id
            )));
        }

        permissions.insert(permission.id, permission);
        Ok(())
    }

    /// Grant a stored permission to a circle
    pub async fn grant(&self, circle_id: CircleId, permission_id: PermissionId) -> Result<()> {
        if !self.permissions.read().await.contains_key(&permission_id) {
            return Err(AuthzError::InvalidInput(format!(
                "Cannot grant unknown permission {}",
                permission_id
            )));
        }

        let mut grants = self.grants.write().await;
        grants.insert(CirclePermission::new(circle_id, permission_id));
        Ok(())
    }
}

#[async_trait]
impl PermissionStore for InMemoryPermissionStore {
    async fn find_direct_memberships(&self, user_id: UserId) -> Result<Vec<CircleMembership>> {
        let memberships = self.memberships.read().await;
        let mut found: Vec<CircleMembership> = memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .copied()
            .collect();
        found.sort_by_key(|m| m.circle_id);
        Ok(found)
    }

    async fn find_all_circles(&self) -> Result<Vec<Circle>> {
        let circles = self.circles.read().await;
        let mut all: Vec<Circle> = circles.values().cloned().collect();
        all.sort_by_key(|c| c.id);
        Ok(all)
    }

    async fn find_circles_by_id(&self, ids: &[CircleId]) -> Result<Vec<Circle>> {
        let circles = self.circles.read().await;
        let wanted: HashSet<CircleId> = ids.iter().copied().collect();
        let mut found: Vec<Circle> = wanted
            .into_iter()
            .filter_map(|id| circles.get(&id).cloned())
            .collect();
        found.sort_by_key(|c| c.id);
        Ok(found)
    }

    async fn find_permissions(&self, query: &PermissionQuery) -> Result<Vec<Permission>> {
        let permissions = self.permissions.read().await;

        let mut found: Vec<Permission> = match query {
            PermissionQuery::All => permissions.values().cloned().collect(),
            PermissionQuery::GrantedTo { circles, scopes } => {
                let grants = self.grants.read().await;
                let granted: HashSet<PermissionId> = grants
                    .iter()
                    .filter(|g| circles.contains(&g.circle_id))
                    .map(|g| g.permission_id)
                    .collect();

                permissions
                    .values()
                    .filter(|p| granted.contains(&p.id) && scopes.contains(&p.scope))
                    .cloned()
                    .collect()
            }
        };

        found.sort_by_key(|p| p.id);
        Ok(found)
    }
}
