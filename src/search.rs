//! Goal-directed route search over a [`GraphStore`].
//!
//! This is an A*-shaped best-first search with a deliberately inflated
//! straight-line heuristic: estimates are degree-space distances scaled by
//! [`HEURISTIC_SCALE`], which overestimates heavily and makes the search
//! greedy. Routes are therefore not guaranteed cheapest, they are found
//! fast inside a narrow corridor toward the destination, which is the
//! trade this engine wants on continent-sized road graphs.
//!
//! Every query carries an iteration budget derived from the beeline
//! distance to the destination. A query that exhausts its budget or its
//! frontier yields `None`; neither case is an error.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::cost::{edge_cost, EdgeStep, StartKind, TurnCostConfig};
use crate::frontier::PriorityFrontier;
use crate::geo::{self, Coord};
use crate::graph::GraphStore;

/// Weight of the straight-line estimate relative to accrued cost. Values
/// above 1 are inadmissible on purpose.
const HEURISTIC_SCALE: f64 = 5.0;
/// Iterations every query may spend regardless of distance.
const BASE_ITERATION_BUDGET: u64 = 5_000;
/// Extra iterations granted per beeline kilometer to the destination.
const BUDGET_PER_KM: f64 = 300.0;
/// Budget used when the start node has no coordinate to measure from.
const FALLBACK_ITERATION_BUDGET: u64 = 10_000;

/// One route query.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// Canonical node the route starts from.
    pub start: i64,
    /// Acceptable destination nodes; the first one settled wins. With no
    /// explicit `target`, the first entry's coordinate steers the search.
    pub ends: Vec<i64>,
    /// Truck compass heading at the start, if known.
    pub start_heading: Option<f64>,
    pub start_kind: StartKind,
    /// Coordinate the heuristic and budget aim at. Defaults to the first
    /// end node's coordinate.
    pub target: Option<Coord>,
    /// Overrides the distance-derived iteration budget when set.
    pub max_iterations: Option<u64>,
}

/// A settled route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Node coordinates from start to end. Nodes without a coordinate are
    /// skipped, so the path can be shorter than the node chain.
    pub path: Vec<Coord>,
    /// The destination node that was reached.
    pub end_id: i64,
}

/// Searches with the default cost model.
pub fn find_path(graph: &GraphStore, request: &SearchRequest) -> Option<RouteMatch> {
    find_path_with(graph, request, &TurnCostConfig::default())
}

/// Searches with an explicit cost model.
///
/// Returns `None` when the destination set is empty or uncoordinated,
/// when the reachable frontier drains, or when the iteration budget runs
/// out before an end node is settled.
pub fn find_path_with(
    graph: &GraphStore,
    request: &SearchRequest,
    config: &TurnCostConfig,
) -> Option<RouteMatch> {
    let destination = request
        .target
        .or_else(|| request.ends.first().and_then(|&id| graph.coordinate_of(id)))?;

    let max_iterations = request.max_iterations.unwrap_or_else(|| {
        match graph.coordinate_of(request.start) {
            Some(start) => {
                let beeline_km = geo::haversine_distance(start, destination) / 1000.0;
                BASE_ITERATION_BUDGET + (beeline_km * BUDGET_PER_KM) as u64
            }
            None => FALLBACK_ITERATION_BUDGET,
        }
    });

    let ends: FxHashSet<i64> = request.ends.iter().copied().collect();

    let heuristic = |node: i64| -> f64 {
        match graph.coordinate_of(node) {
            Some(coord) => {
                let dx = coord[0] - destination[0];
                let dy = coord[1] - destination[1];
                (dx * dx + dy * dy).sqrt() * HEURISTIC_SCALE
            }
            None => 0.0,
        }
    };

    let mut costs: FxHashMap<i64, f64> = FxHashMap::default();
    let mut previous: FxHashMap<i64, i64> = FxHashMap::default();
    let mut visited: FxHashSet<i64> = FxHashSet::default();
    let mut frontier = PriorityFrontier::new();

    costs.insert(request.start, 0.0);
    frontier.insert(request.start, 0.0);

    let mut found_end = None;
    let mut iterations: u64 = 0;

    while !frontier.is_empty() {
        iterations += 1;
        if iterations > max_iterations {
            debug!(iterations, max_iterations, "iteration budget exhausted");
            return None;
        }

        let Some(current) = frontier.extract_min() else {
            break;
        };
        // Stale frontier copies of already-settled nodes drop out here.
        if !visited.insert(current) {
            continue;
        }
        if ends.contains(&current) {
            found_end = Some(current);
            break;
        }

        let current_coord = graph.coordinate_of(current);
        let prev_id = previous.get(&current).copied();
        let previous_coord = prev_id.and_then(|id| graph.coordinate_of(id));
        let grand_previous_coord = prev_id
            .and_then(|id| previous.get(&id).copied())
            .and_then(|id| graph.coordinate_of(id));
        let current_cost = costs.get(&current).copied().unwrap_or(f64::INFINITY);
        let is_start_edge = current == request.start;

        for edge in graph.neighbors_of(current) {
            if visited.contains(&edge.to) {
                continue;
            }

            let step = EdgeStep {
                weight: edge.weight,
                class: edge.class,
                current: current_coord,
                previous: previous_coord,
                grand_previous: grand_previous_coord,
                neighbor: graph.coordinate_of(edge.to),
                is_start_edge,
                start_heading: request.start_heading,
                start_kind: request.start_kind,
            };
            let tentative = current_cost + edge_cost(config, &step);

            if tentative < costs.get(&edge.to).copied().unwrap_or(f64::INFINITY) {
                previous.insert(edge.to, current);
                costs.insert(edge.to, tentative);
                frontier.insert(edge.to, tentative + heuristic(edge.to));
            }
        }
    }

    let end_id = found_end?;
    debug!(iterations, settled = visited.len(), "route search reached an end node");

    let mut path = Vec::new();
    let mut cursor = Some(end_id);
    while let Some(node) = cursor {
        if let Some(coord) = graph.coordinate_of(node) {
            path.push(coord);
        }
        cursor = previous.get(&node).copied();
    }
    path.reverse();

    Some(RouteMatch { path, end_id })
}
