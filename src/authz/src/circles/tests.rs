//! Tests for circle membership closure
//!
//! Covers shared ancestors, idempotence, dangling references, malformed
//! cycles and the hierarchy accessors.

use super::graph::{expand, CircleHierarchy};
use crate::error::AuthzError;
use crate::types::{Circle, CircleId};
use std::collections::{HashMap, HashSet};

fn ids(values: &[CircleId]) -> HashSet<CircleId> {
    values.iter().copied().collect()
}

/// Network (1)
/// ├── Board (2)
/// │   ├── Treasury (4)
/// │   └── Secretariat (5)
/// └── Committees (3)
///     └── Audit (6)
/// Standalone (7)
fn organization() -> CircleHierarchy {
    CircleHierarchy::from_circles(vec![
        Circle::new(1, "Network"),
        Circle::new(2, "Board").with_parent(1),
        Circle::new(3, "Committees").with_parent(1),
        Circle::new(4, "Treasury").with_parent(2),
        Circle::new(5, "Secretariat").with_parent(2),
        Circle::new(6, "Audit").with_parent(3),
        Circle::new(7, "Standalone"),
    ])
}

// ============================================================================
// Expansion
// ============================================================================

#[test]
fn test_expand_reaches_root() {
    let hierarchy = organization();
    assert_eq!(hierarchy.expand(&ids(&[4])), ids(&[1, 2, 4]));
    assert_eq!(hierarchy.expand(&ids(&[6])), ids(&[1, 3, 6]));
}

#[test]
fn test_expand_does_not_include_descendants() {
    let hierarchy = organization();
    assert_eq!(hierarchy.expand(&ids(&[2])), ids(&[1, 2]));
}

#[test]
fn test_expand_shared_ancestors() {
    let hierarchy = organization();
    assert_eq!(hierarchy.expand(&ids(&[4, 5, 6])), ids(&[1, 2, 3, 4, 5, 6]));
}

#[test]
fn test_expand_separate_trees() {
    let hierarchy = organization();
    assert_eq!(hierarchy.expand(&ids(&[5, 7])), ids(&[1, 2, 5, 7]));
}

#[test]
fn test_expand_with_ancestor_is_idempotent() {
    let hierarchy = organization();
    let descendant_only = hierarchy.expand(&ids(&[4]));
    let with_ancestor = hierarchy.expand(&ids(&[4, 2]));
    let with_root = hierarchy.expand(&ids(&[4, 1]));

    assert_eq!(descendant_only, with_ancestor);
    assert_eq!(descendant_only, with_root);
}

#[test]
fn test_expand_is_stable_under_reexpansion() {
    let hierarchy = organization();
    let once = hierarchy.expand(&ids(&[4, 6]));
    let twice = hierarchy.expand(&once);
    assert_eq!(once, twice);
}

#[test]
fn test_free_function_matches_hierarchy() {
    let hierarchy = organization();
    let direct = ids(&[5, 6]);
    assert_eq!(expand(&direct, hierarchy.as_map()), hierarchy.expand(&direct));
}

#[test]
fn test_expand_against_empty_index() {
    let all: HashMap<CircleId, Circle> = HashMap::new();
    assert_eq!(expand(&ids(&[1, 2]), &all), ids(&[1, 2]));
}

// ============================================================================
// Dangling references
// ============================================================================

#[test]
fn test_dangling_direct_circle_kept_as_leaf() {
    let hierarchy = organization();
    assert_eq!(hierarchy.expand(&ids(&[42, 4])), ids(&[1, 2, 4, 42]));
}

#[test]
fn test_strict_rejects_dangling_direct_circle() {
    let hierarchy = organization();
    let result = hierarchy.expand_strict(&ids(&[42]));
    assert!(matches!(result, Err(AuthzError::DanglingCircle(42))));
}

#[test]
fn test_strict_matches_lenient_on_clean_data() {
    let hierarchy = organization();
    let direct = ids(&[4, 6, 7]);
    assert_eq!(hierarchy.expand_strict(&direct).unwrap(), hierarchy.expand(&direct));
}

// ============================================================================
// Malformed cycles
// ============================================================================

#[test]
fn test_three_circle_cycle_terminates() {
    let hierarchy = CircleHierarchy::from_circles(vec![
        Circle::new(1, "a").with_parent(3),
        Circle::new(2, "b").with_parent(1),
        Circle::new(3, "c").with_parent(2),
        Circle::new(4, "d").with_parent(1),
    ]);

    assert_eq!(hierarchy.expand(&ids(&[4])), ids(&[1, 2, 3, 4]));
    assert_eq!(hierarchy.expand_strict(&ids(&[4])).unwrap(), ids(&[1, 2, 3, 4]));
}

#[test]
fn test_self_parent_terminates() {
    let hierarchy = CircleHierarchy::from_circles(vec![Circle::new(1, "loop").with_parent(1)]);
    assert_eq!(hierarchy.expand(&ids(&[1])), ids(&[1]));
    assert!(hierarchy.ancestors(1).is_empty());
    assert_eq!(hierarchy.detect_cycles(), vec![vec![1, 1]]);
}

#[test]
fn test_detect_cycles_clean_forest() {
    assert!(organization().detect_cycles().is_empty());
}

#[test]
fn test_detect_cycles_reports_each_cycle_once() {
    // 1 -> 2 -> 1, 3 -> 1 (tail into the cycle), 4 -> 5 -> 6 -> 4
    let hierarchy = CircleHierarchy::from_circles(vec![
        Circle::new(1, "a").with_parent(2),
        Circle::new(2, "b").with_parent(1),
        Circle::new(3, "c").with_parent(1),
        Circle::new(4, "d").with_parent(5),
        Circle::new(5, "e").with_parent(6),
        Circle::new(6, "f").with_parent(4),
    ]);

    let cycles = hierarchy.detect_cycles();
    assert_eq!(cycles, vec![vec![1, 2, 1], vec![4, 5, 6, 4]]);
}

#[test]
fn test_detect_cycles_tail_first() {
    // Walk starts at 1, enters the 2 <-> 3 loop
    let hierarchy = CircleHierarchy::from_circles(vec![
        Circle::new(1, "tail").with_parent(2),
        Circle::new(2, "b").with_parent(3),
        Circle::new(3, "c").with_parent(2),
    ]);

    assert_eq!(hierarchy.detect_cycles(), vec![vec![2, 3, 2]]);
}

// ============================================================================
// Accessors
// ============================================================================

#[test]
fn test_children_and_roots() {
    let hierarchy = organization();
    assert_eq!(hierarchy.children(1), vec![2, 3]);
    assert_eq!(hierarchy.children(2), vec![4, 5]);
    assert!(hierarchy.children(4).is_empty());
    assert_eq!(hierarchy.roots(), vec![1, 7]);
}

#[test]
fn test_ancestors_stop_at_missing_parent() {
    let hierarchy = CircleHierarchy::from_circles(vec![Circle::new(2, "b").with_parent(1)]);
    assert_eq!(hierarchy.ancestors(2), vec![1]);
    assert!(hierarchy.ancestors(99).is_empty());
}

#[test]
fn test_insert_replaces() {
    let mut hierarchy = CircleHierarchy::new();
    assert!(hierarchy.is_empty());

    hierarchy.insert(Circle::new(1, "old"));
    hierarchy.insert(Circle::new(1, "new").with_parent(5));

    assert_eq!(hierarchy.len(), 1);
    assert!(hierarchy.contains(1));
    assert_eq!(hierarchy.get(1).map(|c| c.name.as_str()), Some("new"));
    assert_eq!(hierarchy.ancestors(1), vec![5]);
}
