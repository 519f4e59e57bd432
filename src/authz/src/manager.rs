//! Per-principal permission resolution
//!
//! A [`PermissionsManager`] is built for one principal, loads the permissions
//! that principal holds once, then answers any number of queries from memory.
//!
//! # Pipeline
//!
//! ```text
//! Principal ──┬── superadmin ──────────────────────────────► all permissions
//!             │                                                   │
//!             └── memberships ┐                                   │
//!                             ├─► expand ─► granted permissions ──┤
//!                 circles ────┘                                   ▼
//!                                                        combined key → Permission
//! ```

use crate::circles::CircleHierarchy;
use crate::config::{DanglingCirclePolicy, ResolverConfig};
use crate::error::{AuthzError, Result};
use crate::scope::PermissionKey;
use crate::store::{PermissionQuery, PermissionStore};
use crate::types::{CircleId, Permission, PermissionFilter, Principal};

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Resolves and answers permission queries for a single principal
///
/// # Example
///
/// ```rust
/// use membership_authz::{InMemoryPermissionStore, PermissionsManager, PermissionScope};
/// use membership_authz::types::{Circle, CircleMembership, Permission, Principal};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryPermissionStore::new();
/// store.put_circle(Circle::new(1, "Network")).await;
/// store.put_circle(Circle::new(2, "Board").with_parent(1)).await;
/// store.put_membership(CircleMembership::new(42, 2)).await;
/// store.put_permission(Permission::new(PermissionScope::Global, "edit", "event").with_id(1)).await?;
/// store.grant(1, 1).await?;
///
/// let mut manager = PermissionsManager::new(Principal::user(42), Arc::new(store));
/// manager.load_permissions().await?;
///
/// assert!(manager.has_permission("edit:event"));
/// assert!(!manager.has_permission("delete:event"));
/// # Ok(())
/// # }
/// ```
pub struct PermissionsManager {
    principal: Principal,
    store: Arc<dyn PermissionStore>,
    config: ResolverConfig,

    /// Resolved circles
    circles: HashSet<CircleId>,

    /// Permissions in insertion order
    permissions: Vec<Permission>,

    /// Combined key → index into `permissions`
    permissions_map: HashMap<String, usize>,

    loaded: bool,
}

impl PermissionsManager {
    /// Create a manager with default configuration
    pub fn new(principal: Principal, store: Arc<dyn PermissionStore>) -> Self {
        Self::with_config(principal, store, ResolverConfig::default())
    }

    /// Create a manager with the given configuration
    pub fn with_config(principal: Principal, store: Arc<dyn PermissionStore>, config: ResolverConfig) -> Self {
        Self {
            principal,
            store,
            config,
            circles: HashSet::new(),
            permissions: Vec::new(),
            permissions_map: HashMap::new(),
            loaded: false,
        }
    }

    /// Create a manager and load its permissions
    pub async fn load(principal: Principal, store: Arc<dyn PermissionStore>, config: ResolverConfig) -> Result<Self> {
        let mut manager = Self::with_config(principal, store, config);
        manager.load_permissions().await?;
        Ok(manager)
    }

    /// Fetch the principal's permissions from the store
    ///
    /// Superadmins receive every permission. Everyone else receives the
    /// permissions granted to the circles they belong to, directly or through
    /// parent circles, restricted to [`ResolverConfig::loaded_scopes`].
    ///
    /// Store failures are returned as errors and leave the manager unloaded
    /// with no circles or permissions, including those of an earlier
    /// successful load. Loading again after success accumulates idempotently.
    pub async fn load_permissions(&mut self) -> Result<()> {
        let start = Instant::now();
        self.loaded = false;

        debug!(
            user_id = self.principal.id,
            superadmin = self.principal.superadmin,
            "Loading permissions"
        );

        let (circles, permissions) = match self.fetch_grants().await {
            Ok(grants) => grants,
            Err(e) => {
                warn!(user_id = self.principal.id, error = %e, "Permission load failed, clearing grants");
                self.clear();
                return Err(e);
            }
        };

        self.add_circles(circles);
        self.add_permissions(permissions);
        self.loaded = true;

        info!(
            user_id = self.principal.id,
            circles = self.circles.len(),
            permissions = self.permissions.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Permissions loaded"
        );

        Ok(())
    }

    /// Resolved circles and granted permissions, read from the store
    async fn fetch_grants(&self) -> Result<(HashSet<CircleId>, Vec<Permission>)> {
        let timeout = self.config.fetch_timeout;

        if self.principal.superadmin {
            let permissions = fetch(timeout, "permissions", self.store.find_permissions(&PermissionQuery::All)).await?;
            return Ok((HashSet::new(), permissions));
        }

        let (memberships, circles) = tokio::try_join!(
            fetch(timeout, "circle memberships", self.store.find_direct_memberships(self.principal.id)),
            fetch(timeout, "circles", self.store.find_all_circles()),
        )?;

        let hierarchy = CircleHierarchy::from_circles(circles);
        let direct: HashSet<CircleId> = memberships.iter().map(|m| m.circle_id).collect();

        let resolved = match self.config.dangling_circles {
            DanglingCirclePolicy::Retain => hierarchy.expand(&direct),
            DanglingCirclePolicy::Reject => hierarchy.expand_strict(&direct)?,
        };

        debug!(
            user_id = self.principal.id,
            direct = direct.len(),
            resolved = resolved.len(),
            "Expanded circle memberships"
        );

        let query = PermissionQuery::GrantedTo {
            circles: resolved.clone(),
            scopes: self.config.loaded_scopes.clone(),
        };
        let permissions = fetch(timeout, "permissions", self.store.find_permissions(&query)).await?;

        Ok((resolved, permissions))
    }

    fn clear(&mut self) {
        self.circles.clear();
        self.permissions.clear();
        self.permissions_map.clear();
    }

    /// Add circles to the resolved set, returning how many were new
    pub fn add_circles(&mut self, circles: impl IntoIterator<Item = CircleId>) -> usize {
        circles.into_iter().filter(|&id| self.circles.insert(id)).count()
    }

    /// Add permissions keyed by combined key, returning how many were new
    ///
    /// A permission whose combined key is already present is ignored.
    pub fn add_permissions(&mut self, permissions: impl IntoIterator<Item = Permission>) -> usize {
        let mut added = 0;

        for permission in permissions {
            if self.permissions_map.contains_key(&permission.combined) {
                continue;
            }

            self.permissions_map
                .insert(permission.combined.clone(), self.permissions.len());
            self.permissions.push(permission);
            added += 1;
        }

        added
    }

    /// The permission a query for `key` resolves to
    ///
    /// Unscoped keys (`edit:user`) try `global`, `local` and `join_request`
    /// in that order and return the first one held.
    pub fn find_permission(&self, key: &str) -> Option<&Permission> {
        if !self.loaded {
            trace!(user_id = self.principal.id, key, "Permission query before load");
        }

        let key = match PermissionKey::parse_with(key, self.config.key_parsing) {
            Ok(key) => key,
            Err(e) => {
                warn!(user_id = self.principal.id, error = %e, "Rejecting permission query");
                return None;
            }
        };

        key.candidates()
            .iter()
            .find_map(|candidate| self.permissions_map.get(candidate))
            .map(|&index| &self.permissions[index])
    }

    /// Whether the principal holds the permission
    pub fn has_permission(&self, key: &str) -> bool {
        self.find_permission(key).is_some()
    }

    /// Row-level filters constraining the permission
    ///
    /// Returns `None` both when the matching permission carries no filters
    /// (an unconditional grant) and when no permission matches; check
    /// [`has_permission`](Self::has_permission) first.
    pub fn permission_filters(&self, key: &str) -> Option<&[PermissionFilter]> {
        self.find_permission(key)
            .map(|permission| permission.filters.as_slice())
            .filter(|filters| !filters.is_empty())
    }

    /// Principal this manager resolves for
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Active configuration
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Whether the last load completed successfully
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Resolved circles, sorted
    pub fn circles(&self) -> Vec<CircleId> {
        let mut circles: Vec<CircleId> = self.circles.iter().copied().collect();
        circles.sort_unstable();
        circles
    }

    /// Accumulated permissions in insertion order
    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }
}

/// Await a store fetch, bounded by `timeout` when set
async fn fetch<T, F>(timeout: Option<Duration>, what: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| AuthzError::Timeout(what))?,
        None => fut.await,
    }
}
