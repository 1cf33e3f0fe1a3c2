//! Geographic primitives shared by the routing pipeline.
//!
//! Coordinates are `[longitude, latitude]` pairs in decimal degrees, the
//! same axis order the GeoJSON inputs use. Distances are meters, bearings
//! and turn angles are degrees.

use geo::{Distance, Haversine, Point};

/// A `[longitude, latitude]` pair in decimal degrees.
pub type Coord = [f64; 2];

/// Great-circle distance between two coordinates in meters.
pub fn haversine_distance(a: Coord, b: Coord) -> f64 {
    let p1 = Point::new(a[0], a[1]);
    let p2 = Point::new(b[0], b[1]);
    Haversine::distance(p1, p2)
}

/// Forward azimuth from `from` to `to` in degrees, normalized to `[0, 360)`.
///
/// 0 is north, 90 east, matching compass headings reported by vehicles.
pub fn bearing(from: Coord, to: Coord) -> f64 {
    let lat1 = from[1].to_radians();
    let lat2 = to[1].to_radians();
    let d_lon = (to[0] - from[0]).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Signed change of direction at `p2` when traveling `p1 -> p2 -> p3`.
///
/// Positive values are clockwise (right) turns, negative counter-clockwise
/// (left), wrapped into `[-180, 180]`. Going straight yields 0.
pub fn signed_turn_angle(p1: Coord, p2: Coord, p3: Coord) -> f64 {
    let mut angle = bearing(p2, p3) - bearing(p1, p2);
    if angle > 180.0 {
        angle -= 360.0;
    } else if angle < -180.0 {
        angle += 360.0;
    }
    angle
}

/// Smallest absolute difference between two compass headings, in `[0, 180]`.
pub fn heading_difference(a: f64, b: f64) -> f64 {
    let mut diff = (a - b).abs() % 360.0;
    if diff > 180.0 {
        diff = 360.0 - diff;
    }
    diff
}
