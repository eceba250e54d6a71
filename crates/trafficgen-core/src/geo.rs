//! Geodesy, unit conversions and track propagation.
//!
//! All encounter geometry is solved in a flat-earth NED frame anchored at a
//! per-situation geographic origin; positions only leave that frame through
//! the WGS-84 flat-earth mapping (`flat_to_geo`/`geo_to_flat`). The
//! spherical helpers use a single earth radius so bearing, distance and
//! destination stay mutually consistent.

use std::f64::consts::{PI, TAU};

use thiserror::Error;

use crate::models::{GeoPosition, Pose, Position, Waypoint};

/// Mean earth radius for the spherical helpers [m].
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// WGS-84 semi-major axis [m].
const WGS84_A: f64 = 6_378_137.0;
/// WGS-84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;

const KNOT_MPS: f64 = 0.5144;
const NM_M: f64 = 1852.0;

// ==== Unit conversions ====

pub fn knots_to_mps(knots: f64) -> f64 {
    knots * KNOT_MPS
}

pub fn mps_to_knots(mps: f64) -> f64 {
    mps / KNOT_MPS
}

pub fn nm_to_m(nm: f64) -> f64 {
    nm * NM_M
}

pub fn m_to_nm(m: f64) -> f64 {
    m / NM_M
}

// ==== Angle normalization ====

/// Map an angle to [0, 2π).
pub fn normalize_0_2pi(angle: f64) -> f64 {
    angle.rem_euclid(TAU)
}

/// Map an angle to [-π, π), the smallest signed angle.
pub fn smallest_signed_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

// ==== Planar NED geometry ====

/// Bearing from one NED position to another [rad, 0..2π), 0 = north.
pub fn planar_bearing(from: Position, to: Position) -> f64 {
    normalize_0_2pi((to.east - from.east).atan2(to.north - from.north))
}

/// Straight-line distance between two NED positions [m].
pub fn planar_distance(a: Position, b: Position) -> f64 {
    (b.north - a.north).hypot(b.east - a.east)
}

/// NED position at a given bearing and distance from an origin.
pub fn planar_offset(origin: Position, bearing: f64, distance: f64) -> Position {
    Position::new(
        origin.north + distance * bearing.cos(),
        origin.east + distance * bearing.sin(),
    )
}

/// Position after traveling at constant course and speed for `elapsed_s`
/// seconds. Negative elapsed time back-projects along the same course.
pub fn position_at(start: Position, course: f64, speed: f64, elapsed_s: f64) -> Position {
    planar_offset(start, course, speed * elapsed_s)
}

// ==== Spherical geometry ====

/// Great-circle distance between two geographic positions [m], haversine
/// formula.
pub fn haversine_distance_m(a: GeoPosition, b: GeoPosition) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let dphi = (b.latitude - a.latitude).to_radians();
    let dlambda = (b.longitude - a.longitude).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Initial great-circle bearing from `a` to `b` [rad, 0..2π), 0 = north.
pub fn initial_bearing(a: GeoPosition, b: GeoPosition) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();
    normalize_0_2pi(x.atan2(y))
}

/// Destination point at a given bearing and great-circle distance from an
/// origin.
pub fn destination(origin: GeoPosition, bearing_rad: f64, distance_m: f64) -> GeoPosition {
    if distance_m.abs() <= f64::EPSILON {
        return origin;
    }

    let lat1 = origin.latitude.to_radians();
    let lon1 = origin.longitude.to_radians();
    let angular = distance_m / EARTH_RADIUS_M;

    let sin_lat2 = lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * angular.sin() * lat1.cos();
    let x = angular.cos() - lat1.sin() * sin_lat2;
    let lon2 = smallest_signed_angle(lon1 + y.atan2(x));

    GeoPosition::new(lat2.to_degrees(), lon2.to_degrees())
}

// ==== WGS-84 flat-earth mapping ====

fn wgs84_radii(lat_0_rad: f64) -> (f64, f64) {
    let e2 = 2.0 * WGS84_F - WGS84_F * WGS84_F;
    let denom = 1.0 - e2 * lat_0_rad.sin().powi(2);
    let r_n = WGS84_A / denom.sqrt();
    let r_m = r_n * (1.0 - e2) / denom;
    (r_n, r_m)
}

/// Map an NED position into geographic coordinates, flat-earth approximation
/// on the WGS-84 ellipsoid around `origin`.
pub fn flat_to_geo(position: Position, origin: GeoPosition) -> GeoPosition {
    let lat_0 = origin.latitude.to_radians();
    let lon_0 = origin.longitude.to_radians();
    let (r_n, r_m) = wgs84_radii(lat_0);

    let lat = smallest_signed_angle(lat_0 + position.north / r_m);
    let lon = smallest_signed_angle(lon_0 + position.east / (r_n * lat_0.cos()));
    GeoPosition::new(lat.to_degrees(), lon.to_degrees())
}

/// Map geographic coordinates into the NED frame around `origin`.
pub fn geo_to_flat(geo: GeoPosition, origin: GeoPosition) -> Position {
    let lat_0 = origin.latitude.to_radians();
    let lon_0 = origin.longitude.to_radians();
    let (r_n, r_m) = wgs84_radii(lat_0);

    let north = (geo.latitude.to_radians() - lat_0) * r_m;
    let east = (geo.longitude.to_radians() - lon_0) * r_n * lat_0.cos();
    Position::new(north, east)
}

// ==== Track propagation ====

/// Tolerance for the first waypoint matching the initial position [m].
const WAYPOINT_MATCH_TOLERANCE_M: f64 = 1.0;

#[derive(Debug, Error, PartialEq)]
pub enum TrackError {
    #[error("first waypoint must equal the initial position")]
    FirstWaypointMismatch,
    #[error("waypoint {index} has non-positive speed")]
    NonPositiveSpeed { index: usize },
}

#[derive(Debug, Clone)]
struct Leg {
    start: Position,
    course: f64,
    speed: f64,
    /// Elapsed seconds at which this leg begins. The final leg is
    /// open-ended.
    start_time: f64,
}

/// A vessel's planned track as an ordered sequence of constant-course legs
/// with an explicit cumulative-time table.
#[derive(Debug, Clone)]
pub struct TrackPlan {
    legs: Vec<Leg>,
}

impl TrackPlan {
    /// Build a plan from an initial pose and an optional waypoint sequence.
    /// An empty sequence yields a single open-ended constant-course leg.
    pub fn build(initial: &Pose, waypoints: &[Waypoint]) -> Result<Self, TrackError> {
        if waypoints.is_empty() {
            return Ok(Self::constant(initial));
        }

        if planar_distance(waypoints[0].position, initial.position) > WAYPOINT_MATCH_TOLERANCE_M {
            return Err(TrackError::FirstWaypointMismatch);
        }
        for (index, wp) in waypoints.iter().enumerate() {
            if !(wp.speed > 0.0) {
                return Err(TrackError::NonPositiveSpeed { index });
            }
        }

        let mut legs = Vec::with_capacity(waypoints.len());
        let mut elapsed = 0.0;
        for pair in waypoints.windows(2) {
            let distance = planar_distance(pair[0].position, pair[1].position);
            let duration = distance / pair[0].speed;
            legs.push(Leg {
                start: pair[0].position,
                course: planar_bearing(pair[0].position, pair[1].position),
                speed: pair[0].speed,
                start_time: elapsed,
            });
            elapsed += duration;
        }

        // Continue past the last waypoint on the final course.
        let last = waypoints[waypoints.len() - 1];
        let final_course = legs.last().map_or(initial.course, |leg| leg.course);
        legs.push(Leg {
            start: last.position,
            course: final_course,
            speed: last.speed,
            start_time: elapsed,
        });

        Ok(Self { legs })
    }

    /// A single open-ended constant-course leg from the given pose.
    pub fn constant(pose: &Pose) -> Self {
        Self {
            legs: vec![Leg {
                start: pose.position,
                course: pose.course,
                speed: pose.speed,
                start_time: 0.0,
            }],
        }
    }

    /// Kinematic state after `elapsed_s` seconds. Times before zero
    /// back-project along the first leg.
    pub fn pose_at(&self, elapsed_s: f64) -> Pose {
        let leg = self
            .legs
            .iter()
            .rev()
            .find(|leg| elapsed_s >= leg.start_time)
            .unwrap_or(&self.legs[0]);
        let position = position_at(leg.start, leg.course, leg.speed, elapsed_s - leg.start_time);
        Pose::new(position, leg.speed, leg.course)
    }

    /// Elapsed times at which the plan's legs begin.
    pub fn leg_starts(&self) -> impl Iterator<Item = f64> + '_ {
        self.legs.iter().map(|leg| leg.start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    #[test]
    fn haversine_one_degree_of_latitude() {
        let dist = haversine_distance_m(GeoPosition::new(0.0, 0.0), GeoPosition::new(1.0, 0.0));
        assert!((dist - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn destination_and_bearing_are_consistent() {
        let origin = GeoPosition::new(58.76, 10.49);
        let dest = destination(origin, 0.7, 25_000.0);
        assert!((haversine_distance_m(origin, dest) - 25_000.0).abs() < 1.0);
        assert!((initial_bearing(origin, dest) - 0.7).abs() < 1e-3);
    }

    #[test]
    fn flat_geo_round_trip() {
        let origin = GeoPosition::new(58.763_449, 10.490_654);
        let p = Position::new(12_345.0, -6_789.0);
        let back = geo_to_flat(flat_to_geo(p, origin), origin);
        assert!((back.north - p.north).abs() < 1e-6);
        assert!((back.east - p.east).abs() < 1e-6);
    }

    #[test]
    fn angle_normalization() {
        assert!((normalize_0_2pi(-PI / 2.0) - 1.5 * PI).abs() < TOL);
        assert!((smallest_signed_angle(1.5 * PI) + PI / 2.0).abs() < TOL);
        assert!((smallest_signed_angle(PI) + PI).abs() < TOL);
    }

    #[test]
    fn planar_bearing_quadrants() {
        let origin = Position::default();
        assert!((planar_bearing(origin, Position::new(1.0, 0.0)) - 0.0).abs() < TOL);
        assert!((planar_bearing(origin, Position::new(0.0, 1.0)) - PI / 2.0).abs() < TOL);
        assert!((planar_bearing(origin, Position::new(-1.0, 0.0)) - PI).abs() < TOL);
        assert!((planar_bearing(origin, Position::new(0.0, -1.0)) - 1.5 * PI).abs() < TOL);
    }

    #[test]
    fn propagation_round_trip() {
        let start = Position::new(100.0, -250.0);
        let there = position_at(start, 0.8, 6.0, 600.0);
        let back = position_at(there, 0.8, 6.0, -600.0);
        assert!(planar_distance(start, back) < 1e-9);
    }

    #[test]
    fn unit_conversions_round_trip() {
        assert!((mps_to_knots(knots_to_mps(12.5)) - 12.5).abs() < TOL);
        assert!((m_to_nm(nm_to_m(3.2)) - 3.2).abs() < TOL);
        assert!((knots_to_mps(1.0) - 0.5144).abs() < TOL);
    }

    #[test]
    fn track_plan_constant_course_without_waypoints() {
        let pose = Pose::new(Position::default(), 5.0, 0.0);
        let plan = TrackPlan::build(&pose, &[]).unwrap();
        let at = plan.pose_at(120.0);
        assert!((at.position.north - 600.0).abs() < TOL);
        assert!((at.position.east - 0.0).abs() < TOL);
        assert_eq!(at.speed, 5.0);
    }

    #[test]
    fn track_plan_changes_course_and_speed_at_waypoints() {
        let pose = Pose::new(Position::default(), 5.0, 0.0);
        let waypoints = [
            Waypoint {
                position: Position::default(),
                speed: 5.0,
            },
            Waypoint {
                position: Position::new(1000.0, 0.0),
                speed: 10.0,
            },
            Waypoint {
                position: Position::new(1000.0, 2000.0),
                speed: 10.0,
            },
        ];
        let plan = TrackPlan::build(&pose, &waypoints).unwrap();

        // First leg: due north at 5 m/s for 200 s.
        let first = plan.pose_at(100.0);
        assert!((first.position.north - 500.0).abs() < 1e-9);
        assert!((first.course - 0.0).abs() < TOL);

        // Second leg: due east at 10 m/s, entered at t = 200 s.
        let second = plan.pose_at(300.0);
        assert!((second.position.north - 1000.0).abs() < 1e-9);
        assert!((second.position.east - 1000.0).abs() < 1e-9);
        assert!((second.course - PI / 2.0).abs() < TOL);
        assert_eq!(second.speed, 10.0);

        // Past the last waypoint the final course continues.
        let past = plan.pose_at(500.0);
        assert!(past.position.east > 2000.0);
        assert_eq!(plan.leg_starts().collect::<Vec<_>>(), vec![0.0, 200.0, 400.0]);
    }

    #[test]
    fn track_plan_rejects_detached_first_waypoint() {
        let pose = Pose::new(Position::default(), 5.0, 0.0);
        let waypoints = [
            Waypoint {
                position: Position::new(500.0, 0.0),
                speed: 5.0,
            },
            Waypoint {
                position: Position::new(1000.0, 0.0),
                speed: 5.0,
            },
        ];
        assert_eq!(
            TrackPlan::build(&pose, &waypoints).unwrap_err(),
            TrackError::FirstWaypointMismatch
        );
    }

    #[test]
    fn track_plan_rejects_zero_speed_leg() {
        let pose = Pose::new(Position::default(), 5.0, 0.0);
        let waypoints = [
            Waypoint {
                position: Position::default(),
                speed: 0.0,
            },
            Waypoint {
                position: Position::new(1000.0, 0.0),
                speed: 5.0,
            },
        ];
        assert_eq!(
            TrackPlan::build(&pose, &waypoints).unwrap_err(),
            TrackError::NonPositiveSpeed { index: 0 }
        );
    }
}
