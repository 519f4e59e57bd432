//! Permission scopes and scope-priority key derivation
//!
//! A permission is addressed by its combined key `scope:action:object`.
//! Callers may ask for a key without a scope (`action:object`), in which case
//! every scope is tried in priority order: `global`, then `local`, then
//! `join_request`.
//!
//! # Examples
//!
//! ```
//! use membership_authz::scope::{PermissionKey, PermissionScope};
//!
//! let key = PermissionKey::parse("edit:user");
//! assert_eq!(
//!     key.candidates(),
//!     vec!["global:edit:user", "local:edit:user", "join_request:edit:user"]
//! );
//!
//! let key = PermissionKey::parse("local:edit:user");
//! assert_eq!(key.scope(), Some(PermissionScope::Local));
//! assert_eq!(key.candidates(), vec!["local:edit:user"]);
//! ```

mod key;
mod types;


pub use key::{KeyParsing, PermissionKey};
pub use types::PermissionScope;
