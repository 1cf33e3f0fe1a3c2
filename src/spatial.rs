//! Spatial index for snapping coordinates to graph nodes.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::geo::{self, Coord};
use crate::graph::GraphStore;

/// Half-width of the square search window, in degrees. Clicks and GPS
/// fixes farther than this from any road do not snap at all.
const MAX_SNAP_RADIUS_DEG: f64 = 0.02;

/// Node point stored in the R-tree.
#[derive(Clone, Copy, Debug, PartialEq)]
struct IndexedNode {
    coords: [f64; 2], // [lon, lat]
    id: i64,
}

impl RTreeObject for IndexedNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.coords)
    }
}

impl PointDistance for IndexedNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.coords[0] - point[0];
        let dy = self.coords[1] - point[1];
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.coords == *point
    }
}

/// R-tree over all registered graph nodes.
pub struct NodeIndex {
    tree: RTree<IndexedNode>,
}

impl NodeIndex {
    /// Builds the index from a graph's registered nodes.
    pub fn build(graph: &GraphStore) -> Self {
        let points = graph
            .nodes()
            .map(|(id, coords)| IndexedNode { coords, id })
            .collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// Up to `limit` node ids within the search window around `target`,
    /// ordered by ascending great-circle distance.
    pub fn nearest(&self, target: Coord, limit: usize) -> Vec<i64> {
        // The window is a square, so candidates must be drained out to the
        // corner distance before the box filter applies.
        let corner_d2 = 2.0 * MAX_SNAP_RADIUS_DEG * MAX_SNAP_RADIUS_DEG;

        let mut candidates: Vec<(i64, f64)> = self
            .tree
            .nearest_neighbor_iter_with_distance_2(&target)
            .take_while(|(_, d2)| *d2 <= corner_d2)
            .filter(|(point, _)| {
                (point.coords[0] - target[0]).abs() <= MAX_SNAP_RADIUS_DEG
                    && (point.coords[1] - target[1]).abs() <= MAX_SNAP_RADIUS_DEG
            })
            .map(|(point, _)| (point.id, geo::haversine_distance(point.coords, target)))
            .collect();

        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
        candidates
            .into_iter()
            .take(limit)
            .map(|(id, _)| id)
            .collect()
    }

    /// The single nearest node within the search window.
    pub fn snap(&self, target: Coord) -> Option<i64> {
        self.nearest(target, 1).into_iter().next()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
