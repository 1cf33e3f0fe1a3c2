//! Path post-processing: display smoothing and route statistics.
//!
//! Raw search output follows every tessellation point of the network. For
//! rendering, [`assemble_reply`] collapses points closer than
//! [`DISPLAY_MERGE_DISTANCE_M`] and runs two smoothing passes; the raw
//! path is kept alongside, since statistics must follow the road, not the
//! smoothed curve.

use serde::{Deserialize, Serialize};

use crate::geo::{self, Coord};
use crate::search::RouteMatch;

/// Merge radius used for display paths.
pub const DISPLAY_MERGE_DISTANCE_M: f64 = 600.0;

/// Truck speed on segments inside a point-of-interest radius.
const URBAN_SPEED_KMH: f64 = 35.0;
/// Truck speed on the open road.
const OPEN_ROAD_SPEED_KMH: f64 = 70.0;

/// A point of interest (city, depot) that slows traffic around it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Poi {
    /// Longitude in decimal degrees.
    pub lng: f64,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Influence radius in meters.
    pub radius: f64,
}

/// Distance and drive-time summary of a raw path.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStats {
    /// Kilometers traveled from the start to each path point; same length
    /// as the path it was built from.
    pub cumulative_km: Vec<f64>,
    /// Total route length in kilometers.
    pub total_km: f64,
    /// Estimated drive time in hours, urban segments at 35 km/h and open
    /// road at 70 km/h.
    pub drive_time_hours: f64,
}

impl RouteStats {
    /// Formats the drive time as `"3h 25min"`.
    pub fn format_drive_time(&self) -> String {
        let mut hours = self.drive_time_hours.floor() as u64;
        let mut minutes = ((self.drive_time_hours - hours as f64) * 60.0).round() as u64;
        if minutes == 60 {
            hours += 1;
            minutes = 0;
        }
        format!("{hours}h {minutes}min")
    }
}

/// Complete answer to one route request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteReply {
    /// Exact node chain the truck drives, start projection included.
    pub raw_path: Vec<Coord>,
    /// Merged and twice-smoothed polyline for rendering.
    pub display_path: Vec<Coord>,
    /// Destination node that was reached.
    pub end_id: i64,
    pub stats: RouteStats,
}

/// Collapses runs of nearby points into their midpoints.
///
/// Scans left to right: a point closer than `min_distance_m` to its
/// successor is replaced by their midpoint and the successor is consumed.
/// The final point always survives, and the result never shrinks below
/// two points for a real path.
pub fn merge_close_points(path: &[Coord], min_distance_m: f64) -> Vec<Coord> {
    if path.len() < 2 {
        return path.to_vec();
    }

    let mut result = Vec::with_capacity(path.len());
    let mut i = 0;
    while i < path.len() {
        let current = path[i];
        if i == path.len() - 1 {
            result.push(current);
            break;
        }
        let next = path[i + 1];
        if geo::haversine_distance(current, next) < min_distance_m {
            result.push([(current[0] + next[0]) / 2.0, (current[1] + next[1]) / 2.0]);
            i += 2;
        } else {
            result.push(current);
            i += 1;
        }
    }

    if result.len() < 2 {
        if let Some(&last) = path.last() {
            result.push(last);
        }
    }
    result
}

/// One smoothing pass: every interior point moves halfway toward the
/// midpoint of its neighbors. Endpoints stay fixed and the point count is
/// preserved, so the pass can be applied repeatedly.
pub fn smooth_path(path: &[Coord]) -> Vec<Coord> {
    if path.len() < 3 {
        return path.to_vec();
    }

    let mut result = Vec::with_capacity(path.len());
    result.push(path[0]);
    for window in path.windows(3) {
        let (prev, current, next) = (window[0], window[1], window[2]);
        result.push([
            (prev[0] + 2.0 * current[0] + next[0]) / 4.0,
            (prev[1] + 2.0 * current[1] + next[1]) / 4.0,
        ]);
    }
    result.push(path[path.len() - 1]);
    result
}

/// Computes distance and drive-time statistics along a raw path.
///
/// Each segment's speed band is decided by its midpoint: inside any POI
/// radius the truck averages 35 km/h, otherwise 70 km/h.
pub fn route_stats(path: &[Coord], pois: &[Poi]) -> RouteStats {
    let mut cumulative_km = Vec::with_capacity(path.len());
    let mut total_km = 0.0;
    let mut drive_time_hours = 0.0;

    if !path.is_empty() {
        cumulative_km.push(0.0);
    }
    for window in path.windows(2) {
        let (from, to) = (window[0], window[1]);
        let segment_km = geo::haversine_distance(from, to) / 1000.0;
        let midpoint = [(from[0] + to[0]) / 2.0, (from[1] + to[1]) / 2.0];
        let speed = if within_poi(midpoint, pois) {
            URBAN_SPEED_KMH
        } else {
            OPEN_ROAD_SPEED_KMH
        };
        total_km += segment_km;
        drive_time_hours += segment_km / speed;
        cumulative_km.push(total_km);
    }

    RouteStats {
        cumulative_km,
        total_km,
        drive_time_hours,
    }
}

fn within_poi(point: Coord, pois: &[Poi]) -> bool {
    pois.iter()
        .any(|poi| geo::haversine_distance(point, [poi.lng, poi.lat]) < poi.radius)
}

/// Builds the full reply for a settled route: optional start projection,
/// display polyline, and statistics over the raw path.
pub fn assemble_reply(found: RouteMatch, prepend_start: Option<Coord>, pois: &[Poi]) -> RouteReply {
    let mut raw_path = found.path;
    if let Some(origin) = prepend_start {
        raw_path.insert(0, origin);
    }

    let merged = merge_close_points(&raw_path, DISPLAY_MERGE_DISTANCE_M);
    let display_path = smooth_path(&smooth_path(&merged));
    let stats = route_stats(&raw_path, pois);

    RouteReply {
        raw_path,
        display_path,
        end_id: found.end_id,
        stats,
    }
}
