//! GeoJSON ingest: converts a road-network export into graph documents.
//!
//! The input is a `FeatureCollection` of `LineString` features, each one a
//! road segment with stable junction identifiers (`startNodeUid`,
//! `endNodeUid`), a road-type string, and per-direction lane counts.
//! [`build_network`] turns that into the `nodes.json` / `edges.json` pair
//! [`GraphStore`](crate::graph::GraphStore) loads: junctions get dense
//! numeric ids, each drivable direction becomes one directed edge weighted
//! by its polyline length in kilometers, and the full segment geometry is
//! kept on the edge for rendering (reversed for the backward direction).
//!
//! Features without junction identifiers or with fewer than two coordinates
//! are skipped; they carry no routable information.

use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{info, warn};

use crate::error::Result;
use crate::geo::{self, Coord};
use crate::graph::{RawEdge, RawNode, RoadClass};
use crate::postprocess::Poi;

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: RoadProperties,
    geometry: LineGeometry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoadProperties {
    #[serde(default)]
    start_node_uid: Option<String>,
    #[serde(default)]
    end_node_uid: Option<String>,
    #[serde(default)]
    road_type: Option<String>,
    #[serde(default)]
    left_lanes: Option<u32>,
    #[serde(default)]
    right_lanes: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct LineGeometry {
    coordinates: Vec<Coord>,
}

/// Counters reported after a network build.
#[derive(Debug, Clone, Copy)]
pub struct IngestSummary {
    /// Features present in the input collection.
    pub features: usize,
    /// Junction nodes registered.
    pub nodes: usize,
    /// Directed edges emitted.
    pub edges: usize,
    /// Segments with intermediate geometry points.
    pub curved: usize,
    /// Straight two-point segments.
    pub straight: usize,
}

/// Converts a GeoJSON road export at `input` into `nodes.json` and
/// `edges.json` under `out_dir`, creating the directory if needed.
pub fn build_network(input: impl AsRef<Path>, out_dir: impl AsRef<Path>) -> Result<IngestSummary> {
    let collection: FeatureCollection =
        serde_json::from_reader(BufReader::new(File::open(input.as_ref())?))?;
    let (nodes, edges, summary) = convert(&collection);

    if summary.curved == 0 {
        warn!("input has no curve geometry; rendered roads will look angular");
    }

    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)?;
    serde_json::to_writer(
        BufWriter::new(File::create(out_dir.join("nodes.json"))?),
        &nodes,
    )?;
    serde_json::to_writer(
        BufWriter::new(File::create(out_dir.join("edges.json"))?),
        &edges,
    )?;

    info!(
        features = summary.features,
        nodes = summary.nodes,
        edges = summary.edges,
        curved = summary.curved,
        straight = summary.straight,
        "network documents written"
    );
    Ok(summary)
}

/// Loads a point-of-interest document: a JSON array of `{lng, lat, radius}`.
pub fn load_pois(path: impl AsRef<Path>) -> Result<Vec<Poi>> {
    Ok(serde_json::from_reader(BufReader::new(File::open(
        path.as_ref(),
    )?))?)
}

fn convert(collection: &FeatureCollection) -> (Vec<RawNode>, Vec<RawEdge>, IngestSummary) {
    let mut ids: FxHashMap<String, i64> = FxHashMap::default();
    let mut nodes: Vec<RawNode> = Vec::new();
    let mut edges: Vec<RawEdge> = Vec::new();
    let mut curved = 0usize;
    let mut straight = 0usize;

    for feature in &collection.features {
        let props = &feature.properties;
        let coords = &feature.geometry.coordinates;

        let (Some(start_uid), Some(end_uid)) = (
            props.start_node_uid.as_deref(),
            props.end_node_uid.as_deref(),
        ) else {
            continue;
        };
        if start_uid.is_empty() || end_uid.is_empty() || coords.len() < 2 {
            continue;
        }

        // Junction coordinates come from the segment endpoints; the first
        // feature touching a junction fixes its position.
        let start_id = register_node(&mut ids, &mut nodes, start_uid, coords[0]);
        let end_id = register_node(&mut ids, &mut nodes, end_uid, coords[coords.len() - 1]);

        if coords.len() > 2 {
            curved += 1;
        } else {
            straight += 1;
        }

        let weight = polyline_km(coords);
        let class = road_class_for(props.road_type.as_deref()).tag();

        if props.right_lanes.unwrap_or(0) > 0 {
            edges.push(RawEdge {
                from: start_id,
                to: end_id,
                weight,
                class,
                geometry: Some(coords.clone()),
            });
        }
        if props.left_lanes.unwrap_or(0) > 0 {
            let mut reversed = coords.clone();
            reversed.reverse();
            edges.push(RawEdge {
                from: end_id,
                to: start_id,
                weight,
                class,
                geometry: Some(reversed),
            });
        }
    }

    let summary = IngestSummary {
        features: collection.features.len(),
        nodes: nodes.len(),
        edges: edges.len(),
        curved,
        straight,
    };
    (nodes, edges, summary)
}

fn register_node(
    ids: &mut FxHashMap<String, i64>,
    nodes: &mut Vec<RawNode>,
    uid: &str,
    coord: Coord,
) -> i64 {
    if let Some(&id) = ids.get(uid) {
        return id;
    }
    let id = nodes.len() as i64;
    nodes.push(RawNode {
        id,
        lng: coord[0],
        lat: coord[1],
    });
    ids.insert(uid.to_string(), id);
    id
}

/// Length of a polyline in kilometers.
fn polyline_km(coords: &[Coord]) -> f64 {
    coords
        .windows(2)
        .map(|pair| geo::haversine_distance(pair[0], pair[1]))
        .sum::<f64>()
        / 1000.0
}

/// Maps the exporter's road-type strings onto the coarse [`RoadClass`].
fn road_class_for(road_type: Option<&str>) -> RoadClass {
    let Some(kind) = road_type else {
        return RoadClass::Local;
    };
    let kind = kind.to_ascii_lowercase();
    if ["motorway", "freeway", "ramp"].iter().any(|k| kind.contains(k)) {
        RoadClass::Restricted
    } else if ["trunk", "primary", "national", "divided"]
        .iter()
        .any(|k| kind.contains(k))
    {
        RoadClass::Arterial
    } else {
        RoadClass::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(
        start: &str,
        end: &str,
        coords: Vec<Coord>,
        left_lanes: u32,
        right_lanes: u32,
    ) -> Feature {
        Feature {
            properties: RoadProperties {
                start_node_uid: Some(start.to_string()),
                end_node_uid: Some(end.to_string()),
                road_type: Some("local".to_string()),
                left_lanes: Some(left_lanes),
                right_lanes: Some(right_lanes),
            },
            geometry: LineGeometry {
                coordinates: coords,
            },
        }
    }

    #[test]
    fn junctions_get_dense_ids_and_are_shared() {
        let collection = FeatureCollection {
            features: vec![
                feature("a", "b", vec![[0.0, 0.0], [0.01, 0.0]], 0, 1),
                feature("b", "c", vec![[0.01, 0.0], [0.02, 0.0]], 1, 1),
            ],
        };
        let (nodes, edges, summary) = convert(&collection);

        assert_eq!(summary.nodes, 3);
        assert_eq!(nodes[0].id, 0);
        assert_eq!(nodes[1].id, 1);
        assert_eq!(nodes[2].id, 2);

        // a->b forward, b->c forward, c->b backward.
        assert_eq!(summary.edges, 3);
        assert_eq!((edges[0].from, edges[0].to), (0, 1));
        assert_eq!((edges[1].from, edges[1].to), (1, 2));
        assert_eq!((edges[2].from, edges[2].to), (2, 1));
    }

    #[test]
    fn lane_counts_decide_directions() {
        let one_way = FeatureCollection {
            features: vec![feature("a", "b", vec![[0.0, 0.0], [0.01, 0.0]], 0, 2)],
        };
        let (_, edges, _) = convert(&one_way);
        assert_eq!(edges.len(), 1);
        assert_eq!((edges[0].from, edges[0].to), (0, 1));

        let contraflow = FeatureCollection {
            features: vec![feature("a", "b", vec![[0.0, 0.0], [0.01, 0.0]], 1, 0)],
        };
        let (_, edges, _) = convert(&contraflow);
        assert_eq!(edges.len(), 1);
        assert_eq!((edges[0].from, edges[0].to), (1, 0));
    }

    #[test]
    fn backward_edges_carry_reversed_geometry() {
        let curve = vec![[0.0, 0.0], [0.005, 0.002], [0.01, 0.0]];
        let collection = FeatureCollection {
            features: vec![feature("a", "b", curve.clone(), 1, 1)],
        };
        let (_, edges, _) = convert(&collection);

        let forward = edges[0].geometry.as_ref().unwrap();
        let backward = edges[1].geometry.as_ref().unwrap();
        assert_eq!(forward[0], curve[0]);
        assert_eq!(backward[0], curve[2]);
        assert_eq!(backward[2], curve[0]);
    }

    #[test]
    fn edge_weight_is_the_polyline_length() {
        let bent = vec![[0.0, 0.0], [0.0, 0.1], [0.1, 0.1]];
        let collection = FeatureCollection {
            features: vec![feature("a", "b", bent.clone(), 0, 1)],
        };
        let (_, edges, _) = convert(&collection);

        let beeline_km = geo::haversine_distance(bent[0], bent[2]) / 1000.0;
        assert!(edges[0].weight > beeline_km, "curve must outrun the beeline");
        let expected = (geo::haversine_distance(bent[0], bent[1])
            + geo::haversine_distance(bent[1], bent[2]))
            / 1000.0;
        assert!((edges[0].weight - expected).abs() < 1e-9);
    }

    #[test]
    fn unroutable_features_are_skipped() {
        let mut missing_uid = feature("", "b", vec![[0.0, 0.0], [0.01, 0.0]], 0, 1);
        missing_uid.properties.start_node_uid = None;

        let collection = FeatureCollection {
            features: vec![
                missing_uid,
                feature("", "b", vec![[0.0, 0.0], [0.01, 0.0]], 0, 1),
                feature("a", "b", vec![[0.0, 0.0]], 0, 1),
                feature("a", "b", vec![[0.0, 0.0], [0.01, 0.0]], 0, 1),
            ],
        };
        let (nodes, edges, summary) = convert(&collection);

        assert_eq!(summary.features, 4);
        assert_eq!(nodes.len(), 2);
        assert_eq!(edges.len(), 1);
        assert_eq!(summary.straight, 1);
    }

    #[test]
    fn curve_counters_split_by_geometry() {
        let collection = FeatureCollection {
            features: vec![
                feature("a", "b", vec![[0.0, 0.0], [0.01, 0.0]], 0, 1),
                feature("b", "c", vec![[0.01, 0.0], [0.015, 0.002], [0.02, 0.0]], 0, 1),
            ],
        };
        let (_, _, summary) = convert(&collection);
        assert_eq!(summary.straight, 1);
        assert_eq!(summary.curved, 1);
    }

    #[test]
    fn road_types_map_onto_classes() {
        assert_eq!(road_class_for(Some("motorway")), RoadClass::Restricted);
        assert_eq!(road_class_for(Some("Freeway")), RoadClass::Restricted);
        assert_eq!(road_class_for(Some("hw_ramp")), RoadClass::Restricted);
        assert_eq!(road_class_for(Some("trunk")), RoadClass::Arterial);
        assert_eq!(road_class_for(Some("primary_city")), RoadClass::Arterial);
        assert_eq!(road_class_for(Some("national_road")), RoadClass::Arterial);
        assert_eq!(road_class_for(Some("divided highway")), RoadClass::Arterial);
        assert_eq!(road_class_for(Some("local dirt")), RoadClass::Local);
        assert_eq!(road_class_for(None), RoadClass::Local);
    }
}
