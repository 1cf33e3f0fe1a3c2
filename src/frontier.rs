//! Minimum-priority frontier for the route search.
//!
//! A thin wrapper over [`BinaryHeap`] with reversed ordering. There is no
//! decrease-key: re-relaxing a node pushes a second entry and the search
//! discards the stale one on extraction via its visited set (lazy deletion).
//! Tie order between equal priorities is unspecified.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy)]
struct FrontierEntry {
    node: i64,
    priority: f64,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority.total_cmp(&other.priority) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the smallest priority first.
        other.priority.total_cmp(&self.priority)
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-queue of `(node id, priority)` pairs.
#[derive(Debug, Default)]
pub struct PriorityFrontier {
    heap: BinaryHeap<FrontierEntry>,
}

impl PriorityFrontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes an entry. Duplicate node ids are allowed; the lowest-priority
    /// copy surfaces first and later copies come out stale.
    pub fn insert(&mut self, node: i64, priority: f64) {
        self.heap.push(FrontierEntry { node, priority });
    }

    /// Removes and returns the node with the smallest priority.
    pub fn extract_min(&mut self) -> Option<i64> {
        self.heap.pop().map(|entry| entry.node)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_in_ascending_priority_order() {
        let mut frontier = PriorityFrontier::new();
        frontier.insert(10, 3.5);
        frontier.insert(20, 1.0);
        frontier.insert(30, 2.25);
        frontier.insert(40, 0.5);

        assert_eq!(frontier.extract_min(), Some(40));
        assert_eq!(frontier.extract_min(), Some(20));
        assert_eq!(frontier.extract_min(), Some(30));
        assert_eq!(frontier.extract_min(), Some(10));
        assert_eq!(frontier.extract_min(), None);
    }

    #[test]
    fn interleaved_inserts_keep_order() {
        let mut frontier = PriorityFrontier::new();
        frontier.insert(1, 5.0);
        frontier.insert(2, 1.0);
        assert_eq!(frontier.extract_min(), Some(2));
        frontier.insert(3, 0.25);
        frontier.insert(4, 9.0);
        assert_eq!(frontier.extract_min(), Some(3));
        assert_eq!(frontier.extract_min(), Some(1));
        assert_eq!(frontier.extract_min(), Some(4));
    }

    #[test]
    fn duplicate_nodes_surface_cheapest_copy_first() {
        let mut frontier = PriorityFrontier::new();
        frontier.insert(7, 10.0);
        frontier.insert(7, 2.0);
        frontier.insert(7, 6.0);

        assert_eq!(frontier.extract_min(), Some(7));
        // Stale copies remain; resolving them is the caller's job.
        assert_eq!(frontier.len(), 2);
        assert_eq!(frontier.extract_min(), Some(7));
        assert_eq!(frontier.extract_min(), Some(7));
        assert!(frontier.is_empty());
    }

    #[test]
    fn handles_infinite_priorities() {
        let mut frontier = PriorityFrontier::new();
        frontier.insert(1, f64::INFINITY);
        frontier.insert(2, 3.0);

        assert_eq!(frontier.extract_min(), Some(2));
        assert_eq!(frontier.extract_min(), Some(1));
    }
}
