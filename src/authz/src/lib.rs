//! # Membership Authorization Core
//!
//! Resolves what a member of the organization is allowed to do.
//!
//! ## Features
//!
//! - **Circle closure**: members of a circle inherit the grants of every parent circle
//! - **Scope priority**: `global` grants win over `local` and `join_request` grants
//! - **Row-level filters**: each permission may carry constraints applied by the caller
//! - **Superadmin bypass**: unrestricted principals hold every permission
//! - **Async-first design** using Tokio; store reads run concurrently where independent
//! - **Pluggable storage** through the [`PermissionStore`] trait, with in-memory and
//!   PostgreSQL (`postgres` feature) implementations
//!
//! ## Example
//!
//! ```rust
//! use membership_authz::{InMemoryPermissionStore, PermissionsManager, PermissionScope, ResolverConfig};
//! use membership_authz::types::{Circle, CircleMembership, Permission, Principal};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryPermissionStore::new();
//!     store.put_circle(Circle::new(1, "Network")).await;
//!     store.put_circle(Circle::new(2, "Board").with_parent(1)).await;
//!     store.put_membership(CircleMembership::new(7, 2)).await;
//!     store
//!         .put_permission(
//!             Permission::new(PermissionScope::Global, "view", "report")
//!                 .with_id(1)
//!                 .with_filters(vec![json!({ "body_id": 5 })]),
//!         )
//!         .await?;
//!     store.grant(1, 1).await?;
//!
//!     let manager = PermissionsManager::load(Principal::user(7), Arc::new(store), ResolverConfig::default()).await?;
//!
//!     if manager.has_permission("view:report") {
//!         println!("Filters: {:?}", manager.permission_filters("view:report"));
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod circles;
pub mod config;
pub mod error;
pub mod manager;
pub mod scope;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use circles::{expand, CircleHierarchy};
pub use config::{DanglingCirclePolicy, ResolverConfig, StoreConfig};
pub use error::{AuthzError, Result};
pub use manager::PermissionsManager;
pub use scope::{KeyParsing, PermissionKey, PermissionScope};
pub use store::{InMemoryPermissionStore, PermissionQuery, PermissionStore};
pub use types::{
    Circle, CircleId, CircleMembership, CirclePermission, Permission, PermissionFilter, PermissionId,
    Principal, UserId,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
