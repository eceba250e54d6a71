//! Core data models for traffic situation generation.
//!
//! Internal units are SI throughout: meters, meters per second, seconds and
//! radians. Latitude/longitude appear only at the geodesy boundary (land-mask
//! lookups and geographic waypoint output) and are decimal degrees.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A position in the flat-earth NED frame, relative to a per-situation
/// geographic origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// North of the origin [m]
    pub north: f64,
    /// East of the origin [m]
    pub east: f64,
}

impl Position {
    pub fn new(north: f64, east: f64) -> Self {
        Self { north, east }
    }
}

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Whether the coordinates lie within the valid geographic domain.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }
}

/// AIS-style navigational status, carried through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavStatus {
    UnderWayUsingEngine,
    AtAnchor,
    NotUnderCommand,
    RestrictedManoeuvrability,
    Moored,
    EngagedInFishing,
    UnderWaySailing,
}

/// Kinematic state of a vessel at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Position,
    /// Speed over ground [m/s]
    pub speed: f64,
    /// Course over ground [rad], 0 = north, clockwise
    pub course: f64,
    /// Heading [rad], if it differs from course
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_status: Option<NavStatus>,
}

impl Pose {
    pub fn new(position: Position, speed: f64, course: f64) -> Self {
        Self {
            position,
            speed,
            course,
            heading: None,
            nav_status: None,
        }
    }
}

/// One point of a planned track. An ordered waypoint sequence defines a
/// vessel's route; the first waypoint must equal the vessel's initial
/// position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub position: Position,
    /// Speed over the leg starting at this waypoint [m/s]
    pub speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipType {
    PassengerRoro,
    GeneralCargo,
    Fishing,
    Military,
}

/// Static vessel data. Not computed by the engine; carried through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipStatic {
    pub mmsi: u32,
    pub name: String,
    pub ship_type: ShipType,
    /// Length overall [m]
    pub length: f64,
    pub width: f64,
    pub height: f64,
    /// Maximum speed [m/s]
    pub speed_max: f64,
}

/// The five encounter categories the generator can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncounterType {
    HeadOn,
    OvertakingGiveWay,
    OvertakingStandOn,
    CrossingGiveWay,
    CrossingStandOn,
}

/// A scalar parameter that is either fixed or drawn uniformly from a closed
/// range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Constraint {
    Fixed(f64),
    Range([f64; 2]),
}

impl Constraint {
    pub fn is_valid(&self) -> bool {
        match *self {
            Constraint::Fixed(v) => v.is_finite(),
            Constraint::Range([lo, hi]) => lo.is_finite() && hi.is_finite() && lo <= hi,
        }
    }

    /// Draw a value. A fixed constraint always returns its value.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        match *self {
            Constraint::Fixed(v) => v,
            Constraint::Range([lo, hi]) => rng.random_range(lo..=hi),
        }
    }
}

/// One requested encounter within a situation definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterSpec {
    pub desired: EncounterType,
    /// Relative bearing of the target from the own ship at vector time,
    /// signed [rad]. Defaults to the desired type's classifier sector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<Constraint>,
    /// Target speed divided by own-ship speed. Defaults to the per-type
    /// range from the settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_speed: Option<Constraint>,
    /// Elapsed time from situation start to the encounter instant [s].
    /// Defaults to the settings range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_time: Option<Constraint>,
}

impl EncounterSpec {
    pub fn new(desired: EncounterType) -> Self {
        Self {
            desired,
            beta: None,
            relative_speed: None,
            vector_time: None,
        }
    }
}

/// Own-ship input for a situation definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnShip {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_data: Option<ShipStatic>,
    pub initial: Pose,
    /// Planned track. Empty means constant course and speed.
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

/// A requested traffic situation: one own ship plus a list of encounters to
/// arrange around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SituationDefinition {
    pub title: String,
    /// Independent instances to generate from this definition.
    #[serde(default = "default_num_situations")]
    pub num_situations: u32,
    /// Geographic origin of the NED frame.
    pub origin: GeoPosition,
    pub own_ship: OwnShip,
    pub encounters: Vec<EncounterSpec>,
}

fn default_num_situations() -> u32 {
    1
}

/// Resolved metadata for one generated encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterMetadata {
    pub encounter_type: EncounterType,
    /// Achieved relative bearing at vector time [rad, 0..2π)
    pub beta: f64,
    /// Achieved target/own speed ratio
    pub relative_speed: f64,
    /// Elapsed time at which the encounter condition holds [s]
    pub vector_time: f64,
}

/// A vessel as it appears in a generated situation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_data: Option<ShipStatic>,
    pub initial: Pose,
    pub waypoints: Vec<Waypoint>,
    /// Waypoints mapped into geographic coordinates for downstream
    /// consumers (plotting, file writers).
    pub geo_waypoints: Vec<GeoPosition>,
}

/// A generated target ship plus its resolved encounter metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetShip {
    pub id: u32,
    pub static_data: ShipStatic,
    pub initial: Pose,
    pub waypoints: Vec<Waypoint>,
    pub geo_waypoints: Vec<GeoPosition>,
    pub encounter: EncounterMetadata,
}

/// A complete generated traffic situation. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficSituation {
    pub title: String,
    pub origin: GeoPosition,
    pub own_ship: ShipRecord,
    pub targets: Vec<TargetShip>,
}
