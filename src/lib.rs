//! Heading-aware truck routing over road-network graphs.
//!
//! The crate ingests GeoJSON road exports into plain node/edge documents,
//! builds a deduplicated in-memory graph, and answers route queries with a
//! turn-shaped, heading-aware best-first search plus display smoothing and
//! drive-time statistics. It ships as a library with a `convoy-route` CLI
//! and an HTTP serving mode on top.

pub mod cost;
pub mod error;
pub mod frontier;
pub mod geo;
pub mod graph;
pub mod ingest;
pub mod postprocess;
pub mod search;
pub mod server;
pub mod spatial;
pub mod worker;

pub use cost::{edge_cost, EdgeStep, StartKind, TurnCostConfig};
pub use error::{Error, Result};
pub use geo::Coord;
pub use graph::{GraphStore, RawEdge, RawNode, RoadClass};
pub use postprocess::{
    assemble_reply, merge_close_points, route_stats, smooth_path, Poi, RouteReply, RouteStats,
};
pub use search::{find_path, find_path_with, RouteMatch, SearchRequest};
pub use spatial::NodeIndex;
pub use worker::{RouteJob, WorkerEvent, WorkerRequest};
