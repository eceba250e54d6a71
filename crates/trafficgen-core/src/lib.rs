//! Maritime traffic situation generation.
//!
//! Synthesizes multi-vessel encounter scenarios around a configurable own
//! ship: each requested encounter (head-on, crossing, overtaking, per the
//! COLREG sector definitions) is solved so the classification holds exactly
//! at its vector time, then the target is back-projected to the situation
//! start. All geometry runs in a flat-earth NED frame; positions cross into
//! geographic coordinates only at the land mask and the waypoint output.

pub mod colreg;
pub mod generator;
pub mod geo;
pub mod land;
pub mod models;
pub mod settings;
pub mod solver;

pub use colreg::{classify, Classification, Observation};
pub use generator::{GenerateError, SituationGenerator};
pub use geo::{
    flat_to_geo, geo_to_flat, haversine_distance_m, knots_to_mps, m_to_nm, mps_to_knots, nm_to_m,
    TrackError, TrackPlan,
};
pub use land::{track_crosses_land, LandMask, LandMaskError};
pub use models::{
    Constraint, EncounterMetadata, EncounterSpec, EncounterType, GeoPosition, NavStatus, OwnShip,
    Pose, Position, ShipRecord, ShipStatic, ShipType, SituationDefinition, TargetShip,
    TrafficSituation, Waypoint,
};
pub use settings::{ClassificationSectors, EncounterSettings, RelativeSpeedRanges};
pub use solver::{solve, SolveReject, TargetCandidate};
