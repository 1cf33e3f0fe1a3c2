//! In-memory road-network graph.
//!
//! [`GraphStore`] owns the directed adjacency structure the router searches.
//! It is built from plain node/edge records (see [`RawNode`] and [`RawEdge`],
//! the shapes stored in `nodes.json` / `edges.json`) and deduplicates nodes
//! that sit on the same physical spot: coordinates are rounded to five
//! decimal places (about 1.1 m) and every node landing on an occupied cell is
//! redirected to the first node registered there. Edges are rewritten through
//! that redirect table, so parallel carriageway endpoints exported under
//! different identifiers collapse into one routable junction.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::geo::Coord;

/// Node record as stored in `nodes.json`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawNode {
    /// Stable numeric identifier, unique within one export.
    pub id: i64,
    /// Longitude in decimal degrees.
    pub lng: f64,
    /// Latitude in decimal degrees.
    pub lat: f64,
}

/// Edge record as stored in `edges.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEdge {
    pub from: i64,
    pub to: i64,
    /// Traversal cost, the segment length in kilometers.
    #[serde(rename = "w")]
    pub weight: f64,
    /// Road-class tag, see [`RoadClass::from_tag`].
    #[serde(rename = "r", default)]
    pub class: u8,
    /// Full segment geometry for rendering; not used for routing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<Coord>>,
}

/// Coarse road classification carried on every edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadClass {
    /// Ordinary surface street.
    Local,
    /// Trunk or primary road.
    Arterial,
    /// Restricted-access road: motorways, freeways and their ramps. Turns
    /// here are shaped much harder because leaving the carriageway against
    /// the flow is never drivable for a truck.
    Restricted,
}

impl RoadClass {
    /// Maps the numeric tag stored in `edges.json`; unknown tags fall back
    /// to [`RoadClass::Local`].
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            1 => RoadClass::Arterial,
            2 => RoadClass::Restricted,
            _ => RoadClass::Local,
        }
    }

    /// Numeric tag used in the on-disk edge records.
    pub fn tag(self) -> u8 {
        match self {
            RoadClass::Local => 0,
            RoadClass::Arterial => 1,
            RoadClass::Restricted => 2,
        }
    }
}

/// One outgoing edge in the adjacency structure.
#[derive(Debug, Clone, Copy)]
pub struct GraphEdge {
    /// Canonical identifier of the target node.
    pub to: i64,
    /// Traversal cost in kilometers.
    pub weight: f64,
    pub class: RoadClass,
}

/// Deduplicated, immutable road-network graph.
#[derive(Debug)]
pub struct GraphStore {
    coords: FxHashMap<i64, Coord>,
    adjacency: FxHashMap<i64, Vec<GraphEdge>>,
    canonical: FxHashMap<i64, i64>,
    edge_count: usize,
}

/// 5-decimal grid cell used for node deduplication.
fn coord_key(lng: f64, lat: f64) -> (i64, i64) {
    ((lat * 1e5).round() as i64, (lng * 1e5).round() as i64)
}

impl GraphStore {
    /// Builds the graph from raw records.
    ///
    /// Fails fast on non-finite node coordinates. Degenerate edges are
    /// dropped silently: self-loops (including edges whose endpoints collapse
    /// onto the same junction during deduplication), edges referencing
    /// unknown node identifiers, and edges with a NaN, infinite or negative
    /// weight. Either the whole graph builds or none of it does.
    pub fn build(nodes: &[RawNode], edges: &[RawEdge]) -> Result<Self> {
        let mut cells: FxHashMap<(i64, i64), i64> = FxHashMap::default();
        let mut canonical: FxHashMap<i64, i64> = FxHashMap::default();
        let mut coords: FxHashMap<i64, Coord> = FxHashMap::default();
        let mut adjacency: FxHashMap<i64, Vec<GraphEdge>> = FxHashMap::default();

        for node in nodes {
            if !node.lng.is_finite() || !node.lat.is_finite() {
                return Err(Error::NonFiniteCoordinate { node: node.id });
            }
            match cells.entry(coord_key(node.lng, node.lat)) {
                Entry::Occupied(cell) => {
                    canonical.insert(node.id, *cell.get());
                }
                Entry::Vacant(cell) => {
                    cell.insert(node.id);
                    canonical.insert(node.id, node.id);
                    coords.insert(node.id, [node.lng, node.lat]);
                    adjacency.insert(node.id, Vec::new());
                }
            }
        }

        let mut edge_count = 0usize;
        let mut dropped = 0usize;
        for edge in edges {
            let (Some(&from), Some(&to)) = (canonical.get(&edge.from), canonical.get(&edge.to))
            else {
                dropped += 1;
                continue;
            };
            if from == to || !edge.weight.is_finite() || edge.weight < 0.0 {
                dropped += 1;
                continue;
            }
            if !coords.contains_key(&from) || !coords.contains_key(&to) {
                dropped += 1;
                continue;
            }
            if let Some(neighbors) = adjacency.get_mut(&from) {
                neighbors.push(GraphEdge {
                    to,
                    weight: edge.weight,
                    class: RoadClass::from_tag(edge.class),
                });
                edge_count += 1;
            }
        }

        let merged = nodes.len() - coords.len();
        info!(
            nodes = coords.len(),
            edges = edge_count,
            merged,
            dropped,
            "road graph built"
        );
        if dropped > 0 {
            debug!(dropped, "degenerate edges dropped during graph build");
        }

        Ok(Self {
            coords,
            adjacency,
            canonical,
            edge_count,
        })
    }

    /// Loads a graph from the `nodes.json` / `edges.json` pair in `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let nodes: Vec<RawNode> =
            serde_json::from_reader(BufReader::new(File::open(dir.join("nodes.json"))?))?;
        let edges: Vec<RawEdge> =
            serde_json::from_reader(BufReader::new(File::open(dir.join("edges.json"))?))?;
        Self::build(&nodes, &edges)
    }

    /// Coordinate of a registered node, or `None` for unknown and merged-away
    /// identifiers. Lookups are not redirected; callers hold canonical ids.
    pub fn coordinate_of(&self, id: i64) -> Option<Coord> {
        self.coords.get(&id).copied()
    }

    /// Outgoing edges of a node; unknown identifiers have none.
    pub fn neighbors_of(&self, id: i64) -> &[GraphEdge] {
        self.adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolves any input identifier to the canonical node it was merged
    /// into. Identity for nodes that survived deduplication.
    pub fn canonical_id(&self, id: i64) -> Option<i64> {
        self.canonical.get(&id).copied()
    }

    /// Iterates all registered nodes with their coordinates.
    pub fn nodes(&self) -> impl Iterator<Item = (i64, Coord)> + '_ {
        self.coords.iter().map(|(&id, &coord)| (id, coord))
    }

    pub fn node_count(&self) -> usize {
        self.coords.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}
