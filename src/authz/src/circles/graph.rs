//! Circle hierarchy and transitive membership expansion
//!
//! Parent links form a forest. Expansion walks from each directly-joined
//! circle up through its parents; cycle detection walks the same links with
//! three-colour marking to report malformed data.

use crate::error::{AuthzError, Result};
use crate::types::{Circle, CircleId};
use std::collections::{HashMap, HashSet, VecDeque};

/// Expand direct memberships to every ancestor circle
///
/// Circles absent from `all` (a direct id or a parent id) are kept in the
/// result as leaves that cannot be expanded further.
///
/// Each identifier is enqueued at most once, so the walk is bounded by the
/// number of distinct circles even when the parent links contain a cycle.
pub fn expand(direct: &HashSet<CircleId>, all: &HashMap<CircleId, Circle>) -> HashSet<CircleId> {
    let mut resolved: HashSet<CircleId> = HashSet::with_capacity(direct.len());
    let mut queue: VecDeque<CircleId> = VecDeque::with_capacity(direct.len());

    for &id in direct {
        if resolved.insert(id) {
            queue.push_back(id);
        }
    }

    while let Some(current) = queue.pop_front() {
        let Some(parent) = all.get(&current).and_then(|circle| circle.parent_circle_id) else {
            continue;
        };

        if resolved.insert(parent) {
            queue.push_back(parent);
        }
    }

    resolved
}

/// Owned index of circles by identifier
#[derive(Debug, Clone, Default)]
pub struct CircleHierarchy {
    circles: HashMap<CircleId, Circle>,
}

impl CircleHierarchy {
    /// Create an empty hierarchy
    pub fn new() -> Self {
        Self::default()
    }

    /// Index fetched circles by identifier
    ///
    /// If the same identifier appears twice, the later record wins.
    pub fn from_circles(circles: impl IntoIterator<Item = Circle>) -> Self {
        Self {
            circles: circles.into_iter().map(|circle| (circle.id, circle)).collect(),
        }
    }

    /// Add or replace a circle
    pub fn insert(&mut self, circle: Circle) {
        self.circles.insert(circle.id, circle);
    }

    /// Look up a circle
    pub fn get(&self, id: CircleId) -> Option<&Circle> {
        self.circles.get(&id)
    }

    /// Whether the hierarchy knows this circle
    pub fn contains(&self, id: CircleId) -> bool {
        self.circles.contains_key(&id)
    }

    /// Number of known circles
    pub fn len(&self) -> usize {
        self.circles.len()
    }

    /// Whether no circles are known
    pub fn is_empty(&self) -> bool {
        self.circles.is_empty()
    }

    /// Underlying index
    pub fn as_map(&self) -> &HashMap<CircleId, Circle> {
        &self.circles
    }

    /// Expand direct memberships, keeping dangling references as leaves
    pub fn expand(&self, direct: &HashSet<CircleId>) -> HashSet<CircleId> {
        expand(direct, &self.circles)
    }

    /// Expand direct memberships, failing on the first circle or parent
    /// reference missing from the hierarchy
    pub fn expand_strict(&self, direct: &HashSet<CircleId>) -> Result<HashSet<CircleId>> {
        let mut resolved: HashSet<CircleId> = HashSet::with_capacity(direct.len());
        let mut queue: VecDeque<CircleId> = VecDeque::with_capacity(direct.len());

        for &id in direct {
            if resolved.insert(id) {
                queue.push_back(id);
            }
        }

        while let Some(current) = queue.pop_front() {
            let circle = self
                .circles
                .get(&current)
                .ok_or(AuthzError::DanglingCircle(current))?;

            if let Some(parent) = circle.parent_circle_id {
                if resolved.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }

        Ok(resolved)
    }

    /// Parent chain of a circle, nearest first, excluding the circle itself
    ///
    /// Stops at the first missing circle or at the first repeated identifier.
    pub fn ancestors(&self, id: CircleId) -> Vec<CircleId> {
        let mut chain = Vec::new();
        let mut seen: HashSet<CircleId> = HashSet::from([id]);
        let mut current = self.circles.get(&id).and_then(|c| c.parent_circle_id);

        while let Some(parent) = current {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            current = self.circles.get(&parent).and_then(|c| c.parent_circle_id);
        }

        chain
    }

    /// Circles whose parent is `id`, sorted
    pub fn children(&self, id: CircleId) -> Vec<CircleId> {
        let mut children: Vec<CircleId> = self
            .circles
            .values()
            .filter(|circle| circle.parent_circle_id == Some(id))
            .map(|circle| circle.id)
            .collect();
        children.sort_unstable();
        children
    }

    /// Circles without a parent, sorted
    pub fn roots(&self) -> Vec<CircleId> {
        let mut roots: Vec<CircleId> = self
            .circles
            .values()
            .filter(|circle| circle.parent_circle_id.is_none())
            .map(|circle| circle.id)
            .collect();
        roots.sort_unstable();
        roots
    }

    /// Find every parent-link cycle
    ///
    /// Each cycle is reported once as a path that repeats its first circle at
    /// the end (e.g. `[1, 2, 1]`). Circles are visited in ascending id order
    /// so the output is deterministic.
    ///
    /// # Algorithm
    ///
    /// Three states per circle:
    /// - Unvisited
    /// - Visiting: on the parent chain currently being walked
    /// - Visited: fully processed
    ///
    /// Reaching a visiting circle closes a cycle. Every circle has at most one
    /// parent, so each walk is a single chain.
    pub fn detect_cycles(&self) -> Vec<Vec<CircleId>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum State {
            Visiting,
            Visited,
        }

        let mut state: HashMap<CircleId, State> = HashMap::with_capacity(self.circles.len());
        let mut cycles: Vec<Vec<CircleId>> = Vec::new();

        let mut ids: Vec<CircleId> = self.circles.keys().copied().collect();
        ids.sort_unstable();

        for start in ids {
            if state.contains_key(&start) {
                continue;
            }

            let mut path: Vec<CircleId> = Vec::new();
            let mut current = Some(start);

            while let Some(id) = current {
                match state.get(&id) {
                    Some(State::Visiting) => {
                        if let Some(cycle_start) = path.iter().position(|&n| n == id) {
                            let mut cycle = path[cycle_start..].to_vec();
                            cycle.push(id);
                            cycles.push(cycle);
                        }
                        break;
                    }
                    Some(State::Visited) => break,
                    None => {}
                }

                if !self.circles.contains_key(&id) {
                    break;
                }

                state.insert(id, State::Visiting);
                path.push(id);
                current = self.circles.get(&id).and_then(|c| c.parent_circle_id);
            }

            for id in path {
                state.insert(id, State::Visited);
            }
        }

        cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[CircleId]) -> HashSet<CircleId> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_empty_direct_set() {
        let hierarchy = CircleHierarchy::from_circles(vec![Circle::new(1, "Network")]);
        assert!(hierarchy.expand(&HashSet::new()).is_empty());
    }

    #[test]
    fn test_linear_chain() {
        let hierarchy = CircleHierarchy::from_circles(vec![
            Circle::new(1, "a"),
            Circle::new(2, "b").with_parent(1),
            Circle::new(3, "c").with_parent(2),
        ]);

        assert_eq!(hierarchy.expand(&ids(&[3])), ids(&[1, 2, 3]));
        assert_eq!(hierarchy.expand(&ids(&[2])), ids(&[1, 2]));
        assert_eq!(hierarchy.ancestors(3), vec![2, 1]);
    }

    #[test]
    fn test_two_circle_cycle_terminates() {
        let hierarchy = CircleHierarchy::from_circles(vec![
            Circle::new(1, "a").with_parent(2),
            Circle::new(2, "b").with_parent(1),
        ]);

        assert_eq!(hierarchy.expand(&ids(&[1])), ids(&[1, 2]));
        assert_eq!(hierarchy.ancestors(1), vec![2]);
        assert_eq!(hierarchy.detect_cycles(), vec![vec![1, 2, 1]]);
    }

    #[test]
    fn test_strict_expansion_rejects_dangling_parent() {
        let hierarchy = CircleHierarchy::from_circles(vec![Circle::new(2, "b").with_parent(1)]);

        let result = hierarchy.expand_strict(&ids(&[2]));
        assert!(matches!(result, Err(AuthzError::DanglingCircle(1))));

        // Lenient expansion keeps the missing parent as a leaf
        assert_eq!(hierarchy.expand(&ids(&[2])), ids(&[1, 2]));
    }
}
