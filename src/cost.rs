//! Turn-shaped edge costs for truck routing.
//!
//! The base cost of an edge is its stored weight (kilometers). On top of
//! that, [`edge_cost`] adds surcharges that make geometrically awkward
//! moves unattractive for a 40-ton vehicle: pulling away against the
//! truck's current heading, u-turn-like flips between short segments,
//! sharp turns (left harder than right, right-hand traffic), and any turn
//! on restricted roads. Turns beyond [`FORBID_TURN_DEG`] cost infinity,
//! which relaxation then never accepts.
//!
//! Surcharge magnitudes live in [`TurnCostConfig`]; the angle and distance
//! thresholds that define the geometry bands are fixed constants.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::geo::{self, Coord};
use crate::graph::RoadClass;

/// Start-edge gate: headings further off than this count as a reversal.
pub const HEADING_REVERSAL_DEG: f64 = 90.0;
/// Start-edge gate: headings further off than this count as a detour.
pub const HEADING_DETOUR_DEG: f64 = 45.0;
/// Approach segments shorter than this re-anchor the turn angle on the
/// grand-predecessor, so dense tessellation points cannot hide a turn.
pub const SHORT_SEGMENT_M: f64 = 5.0;
/// Maximum approach length for the u-turn guard to apply.
pub const ZIGZAG_SEGMENT_M: f64 = 200.0;
/// Minimum absolute turn angle for the u-turn guard to apply.
pub const ZIGZAG_ANGLE_DEG: f64 = 89.0;
/// Turns sharper than this are not drivable at all.
pub const FORBID_TURN_DEG: f64 = 98.0;
/// Absolute angle beyond which a turn counts as sharp.
pub const SHARP_TURN_DEG: f64 = 45.0;
/// Absolute angle beyond which a turn counts as drift off the straight.
pub const DRIFT_TURN_DEG: f64 = 10.0;
/// Signed angle below which a restricted-road turn goes against the flow.
pub const RESTRICTED_REVERSE_DEG: f64 = -100.0;
/// Every step costs at least this much, keeping the search monotone even
/// for zero-length segments.
pub const MIN_STEP_COST: f64 = 1.0;

/// Surcharge magnitudes for [`edge_cost`].
#[derive(Debug, Clone)]
pub struct TurnCostConfig {
    /// Flat surcharge on every edge leaving a yard start.
    pub yard_exit_penalty: f64,
    /// Start edge pointing more than [`HEADING_REVERSAL_DEG`] off the
    /// truck's heading. Near-prohibitive but finite, so a dead-end start
    /// can still be escaped.
    pub heading_reversal_penalty: f64,
    /// Start edge pointing more than [`HEADING_DETOUR_DEG`] off the
    /// truck's heading.
    pub heading_detour_penalty: f64,
    /// Near-reversal between two close junctions, the zig-zag shortcut
    /// through a parallel carriageway.
    pub zigzag_penalty: f64,
    /// Multiplier applied to every turn taken on a restricted road.
    pub restricted_factor: f64,
    /// Hard left against the flow on a restricted road.
    pub restricted_reverse_penalty: f64,
    /// Turn sharper than [`SHARP_TURN_DEG`] to the left.
    pub sharp_left_penalty: f64,
    /// Turn sharper than [`SHARP_TURN_DEG`] to the right.
    pub sharp_right_penalty: f64,
    /// Mild course change beyond [`DRIFT_TURN_DEG`].
    pub drift_penalty: f64,
}

impl Default for TurnCostConfig {
    fn default() -> Self {
        Self {
            yard_exit_penalty: 10.0,
            heading_reversal_penalty: 10_000_000.0,
            heading_detour_penalty: 1_000.0,
            zigzag_penalty: 1_000_000_000.0,
            restricted_factor: 1.1,
            restricted_reverse_penalty: 100_000.0,
            sharp_left_penalty: 2_000.0,
            sharp_right_penalty: 500.0,
            drift_penalty: 50.0,
        }
    }
}

/// Context a route starts from; selects the start-edge gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartKind {
    /// Truck is rolling on a road; first edges against its bearing are
    /// gated hard.
    #[default]
    Road,
    /// Truck pulls out of a depot or parking yard; every first edge takes
    /// a small flat surcharge instead of a bearing gate.
    Yard,
}

impl FromStr for StartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "road" => Ok(StartKind::Road),
            "yard" => Ok(StartKind::Yard),
            other => Err(format!("unknown start type '{other}', expected 'road' or 'yard'")),
        }
    }
}

impl fmt::Display for StartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartKind::Road => write!(f, "road"),
            StartKind::Yard => write!(f, "yard"),
        }
    }
}

/// One candidate transition considered during relaxation.
///
/// Coordinates are optional: when any coordinate needed by a shaping rule
/// is missing, that rule is skipped and the bare edge weight remains.
#[derive(Debug, Clone, Copy)]
pub struct EdgeStep {
    /// Stored edge weight in kilometers.
    pub weight: f64,
    pub class: RoadClass,
    /// Node the edge leaves from.
    pub current: Option<Coord>,
    /// Node the search came from to reach `current`.
    pub previous: Option<Coord>,
    /// Predecessor of `previous`, the fallback turn anchor.
    pub grand_previous: Option<Coord>,
    /// Node the edge leads to.
    pub neighbor: Option<Coord>,
    /// Whether `current` is the route's start node.
    pub is_start_edge: bool,
    /// Truck compass heading at the start, if known.
    pub start_heading: Option<f64>,
    pub start_kind: StartKind,
}

/// Cost of taking one edge, shaped by start heading and turn geometry.
///
/// Always at least [`MIN_STEP_COST`]; infinite for turns the vehicle
/// cannot make.
pub fn edge_cost(config: &TurnCostConfig, step: &EdgeStep) -> f64 {
    // Zero weights get a nominal length so progress always costs something.
    let mut cost = if step.weight == 0.0 { 1.0 } else { step.weight };

    if let (Some(current), Some(neighbor)) = (step.current, step.neighbor) {
        if let (true, Some(heading)) = (step.is_start_edge, step.start_heading) {
            match step.start_kind {
                StartKind::Yard => cost += config.yard_exit_penalty,
                StartKind::Road => {
                    let diff = geo::heading_difference(heading, geo::bearing(current, neighbor));
                    if diff > HEADING_REVERSAL_DEG {
                        cost += config.heading_reversal_penalty;
                    } else if diff > HEADING_DETOUR_DEG {
                        cost += config.heading_detour_penalty;
                    }
                }
            }
        } else if let Some(previous) = step.previous {
            let approach_m = geo::haversine_distance(previous, current);

            // Tiny approach segments carry no usable direction; anchor the
            // turn on the grand-predecessor instead when one exists.
            let mut reference = previous;
            if approach_m < SHORT_SEGMENT_M {
                if let Some(grand) = step.grand_previous {
                    reference = grand;
                }
            }

            let angle = geo::signed_turn_angle(reference, current, neighbor);
            let abs_angle = angle.abs();

            // Near-reversals between close junctions are u-turns through a
            // parallel carriageway. The surcharge joins the base before the
            // restricted factor scales it.
            if approach_m < ZIGZAG_SEGMENT_M && abs_angle > ZIGZAG_ANGLE_DEG {
                cost += config.zigzag_penalty;
            }

            if step.class == RoadClass::Restricted {
                cost *= config.restricted_factor;
                if angle < RESTRICTED_REVERSE_DEG {
                    cost += config.restricted_reverse_penalty;
                }
            }

            if abs_angle > FORBID_TURN_DEG {
                cost = f64::INFINITY;
            } else if angle < -SHARP_TURN_DEG {
                cost += config.sharp_left_penalty;
            } else if angle > SHARP_TURN_DEG {
                cost += config.sharp_right_penalty;
            } else if abs_angle > DRIFT_TURN_DEG {
                cost += config.drift_penalty;
            }
        }
    }

    if cost < MIN_STEP_COST {
        cost = MIN_STEP_COST;
    }
    cost
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(weight: f64) -> EdgeStep {
        EdgeStep {
            weight,
            class: RoadClass::Local,
            current: None,
            previous: None,
            grand_previous: None,
            neighbor: None,
            is_start_edge: false,
            start_heading: None,
            start_kind: StartKind::Road,
        }
    }

    fn config() -> TurnCostConfig {
        TurnCostConfig::default()
    }

    #[test]
    fn zero_and_subunit_weights_clamp_to_one() {
        assert_eq!(edge_cost(&config(), &step(0.0)), 1.0);
        assert_eq!(edge_cost(&config(), &step(0.2)), 1.0);
        assert_eq!(edge_cost(&config(), &step(2.5)), 2.5);
    }

    #[test]
    fn missing_coordinates_leave_the_bare_weight() {
        let mut s = step(3.0);
        s.is_start_edge = true;
        s.start_heading = Some(0.0);
        // No coordinates, so no gate can fire.
        assert_eq!(edge_cost(&config(), &s), 3.0);
    }

    #[test]
    fn yard_start_takes_flat_surcharge() {
        let mut s = step(2.0);
        s.is_start_edge = true;
        s.start_heading = Some(0.0);
        s.start_kind = StartKind::Yard;
        s.current = Some([0.0, 0.0]);
        s.neighbor = Some([0.0, -0.01]); // due south, bearing irrelevant
        assert_eq!(edge_cost(&config(), &s), 12.0);
    }

    #[test]
    fn yard_start_without_heading_is_ungated() {
        let mut s = step(2.0);
        s.is_start_edge = true;
        s.start_kind = StartKind::Yard;
        s.current = Some([0.0, 0.0]);
        s.neighbor = Some([0.0, -0.01]);
        assert_eq!(edge_cost(&config(), &s), 2.0);
    }

    #[test]
    fn road_start_gates_by_heading_difference() {
        let mut s = step(2.0);
        s.is_start_edge = true;
        s.start_heading = Some(0.0); // heading north
        s.current = Some([0.0, 0.0]);

        // Aligned: due north.
        s.neighbor = Some([0.0, 0.01]);
        assert_eq!(edge_cost(&config(), &s), 2.0);

        // Detour: roughly 50 degrees off.
        s.neighbor = Some([0.0119, 0.01]);
        let detour = edge_cost(&config(), &s);
        assert!((detour - 1_002.0).abs() < 1e-6, "got {detour}");

        // Reversal: due south.
        s.neighbor = Some([0.0, -0.01]);
        let reversal = edge_cost(&config(), &s);
        assert!((reversal - 10_000_002.0).abs() < 1e-6, "got {reversal}");
    }

    /// Interior step with an 11 km straight approach from the south.
    fn interior_step(weight: f64) -> EdgeStep {
        let mut s = step(weight);
        s.previous = Some([0.0, 0.0]);
        s.current = Some([0.0, 0.1]);
        s
    }

    #[test]
    fn straight_through_costs_the_weight() {
        let mut s = interior_step(2.0);
        s.neighbor = Some([0.0, 0.2]);
        assert_eq!(edge_cost(&config(), &s), 2.0);
    }

    #[test]
    fn drift_band_adds_small_surcharge() {
        let mut s = interior_step(2.0);
        // Bearing roughly 30 degrees: inside (10, 45].
        s.neighbor = Some([0.05, 0.1866]);
        let cost = edge_cost(&config(), &s);
        assert!((cost - 52.0).abs() < 1e-6, "got {cost}");
    }

    #[test]
    fn sharp_right_costs_less_than_sharp_left() {
        let mut right = interior_step(2.0);
        right.neighbor = Some([0.0866, 0.15]); // ~60 degrees right
        let right_cost = edge_cost(&config(), &right);
        assert!((right_cost - 502.0).abs() < 1e-6, "got {right_cost}");

        let mut left = interior_step(2.0);
        left.neighbor = Some([-0.0866, 0.15]); // ~60 degrees left
        let left_cost = edge_cost(&config(), &left);
        assert!((left_cost - 2_002.0).abs() < 1e-6, "got {left_cost}");
    }

    #[test]
    fn turns_beyond_the_forbid_band_cost_infinity() {
        let mut s = interior_step(2.0);
        // ~120 degrees right, back toward the south-east.
        s.neighbor = Some([0.0866, 0.05]);
        assert!(edge_cost(&config(), &s).is_infinite());

        // ~97 degrees stays finite and lands in the sharp band.
        let mut edge97 = interior_step(2.0);
        edge97.neighbor = Some([0.0992, 0.08774]);
        let cost = edge_cost(&config(), &edge97);
        assert!(cost.is_finite());
        assert!((cost - 502.0).abs() < 1e-6, "got {cost}");
    }

    #[test]
    fn near_reversal_on_short_approach_is_a_zigzag() {
        let mut s = step(1.0);
        // 100 m approach from the north, then a ~95 degree flip.
        s.previous = Some([0.0, 0.0009]);
        s.current = Some([0.0, 0.0]);
        s.neighbor = Some([-0.000996, 0.0000872]);
        let cost = edge_cost(&config(), &s);
        assert!(
            (cost - 1_000_000_501.0).abs() < 1.0,
            "zigzag plus sharp-right expected, got {cost}"
        );
    }

    #[test]
    fn same_turn_on_long_approach_is_not_a_zigzag() {
        let mut s = step(1.0);
        // 11 km approach from the north, same ~95 degree flip.
        s.previous = Some([0.0, 0.1]);
        s.current = Some([0.0, 0.0]);
        s.neighbor = Some([-0.000996, 0.0000872]);
        let cost = edge_cost(&config(), &s);
        assert!((cost - 501.0).abs() < 1.0, "got {cost}");
    }

    #[test]
    fn short_approach_re_anchors_on_the_grand_predecessor() {
        let mut s = step(1.0);
        // The immediate predecessor is 4 m away and off-axis; the grand
        // predecessor shows the true straight-south travel direction.
        s.previous = Some([0.00003, 0.00002]);
        s.grand_previous = Some([0.0, 0.001]);
        s.current = Some([0.0, 0.0]);
        s.neighbor = Some([0.0, -0.001]);
        let anchored = edge_cost(&config(), &s);
        assert_eq!(anchored, 1.0, "straight travel, no surcharge");

        // Without a grand predecessor the jittered segment stands and the
        // same move reads as a sharp left.
        s.grand_previous = None;
        let jittered = edge_cost(&config(), &s);
        assert!((jittered - 2_001.0).abs() < 1.0, "got {jittered}");
    }

    #[test]
    fn restricted_roads_scale_every_turn() {
        let mut s = interior_step(10.0);
        s.class = RoadClass::Restricted;
        s.neighbor = Some([0.0, 0.2]); // straight
        let cost = edge_cost(&config(), &s);
        assert!((cost - 11.0).abs() < 1e-9, "got {cost}");
    }

    #[test]
    fn restricted_hard_left_is_impossible() {
        let mut s = interior_step(10.0);
        s.class = RoadClass::Restricted;
        // ~135 degrees left: reverse-flow surcharge and the forbid band.
        s.neighbor = Some([-0.0707, 0.0293]);
        assert!(edge_cost(&config(), &s).is_infinite());
    }

    #[test]
    fn start_kind_parses_case_insensitively() {
        assert_eq!("road".parse::<StartKind>().unwrap(), StartKind::Road);
        assert_eq!("YARD".parse::<StartKind>().unwrap(), StartKind::Yard);
        assert!("depot".parse::<StartKind>().is_err());
    }
}
