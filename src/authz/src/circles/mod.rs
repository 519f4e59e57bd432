//! Circle membership closure
//!
//! Membership in a circle implies membership in every circle it is nested
//! in, because permissions granted to a parent circle apply to the members
//! of all its descendants. This module expands a user's direct memberships
//! into the full set of circles they belong to.
//!
//! # Features
//!
//! - **Set semantics**: the result does not depend on traversal order
//! - **Visited tracking**: every circle is expanded at most once, so shared
//!   ancestors and malformed cycles cannot cause repeated work or non-termination
//! - **Dangling references**: kept as unexpandable leaves by default, or
//!   rejected via [`CircleHierarchy::expand_strict`]
//! - **Diagnostics**: [`CircleHierarchy::detect_cycles`] reports malformed parent loops
//!
//! # Example
//!
//! ```rust
//! use membership_authz::circles::CircleHierarchy;
//! use membership_authz::types::Circle;
//! use std::collections::HashSet;
//!
//! let hierarchy = CircleHierarchy::from_circles(vec![
//!     Circle::new(1, "Network"),
//!     Circle::new(2, "Board").with_parent(1),
//!     Circle::new(3, "Treasury").with_parent(2),
//! ]);
//!
//! let direct: HashSet<_> = [3].into_iter().collect();
//! let resolved = hierarchy.expand(&direct);
//!
//! assert_eq!(resolved, [1, 2, 3].into_iter().collect::<HashSet<_>>());
//! ```

pub mod graph;

#[cfg(test)]
mod tests;

pub use graph::{expand, CircleHierarchy};
