//! Encounter classification thresholds and generation settings.

use serde::{Deserialize, Serialize};

use crate::models::EncounterType;

/// Angular criteria for the COLREG classifier, all in radians.
///
/// The defaults follow the conventional reading of rules 13–15: an
/// overtaking vessel is "coming up with" another when it sees her more than
/// 22.5° abaft the beam, head-on means reciprocal or nearly reciprocal
/// courses, and everything between is a crossing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSectors {
    /// Aspect tolerance for the overtaken vessel's view of the overtaking
    /// one (rule 13) [rad]
    pub overtaking_aspect_limit: f64,
    /// Tolerance for reciprocal or nearly reciprocal courses (rule 14) [rad]
    pub head_on_limit: f64,
    /// Crossing aspect limit (rule 15) [rad]
    pub crossing_aspect_limit: f64,
    /// The sector more than 22.5° abaft the beam, [start, end] in 0..2π [rad]
    pub abaft_beam_sector: [f64; 2],
}

impl Default for ClassificationSectors {
    fn default() -> Self {
        Self {
            overtaking_aspect_limit: 67.5_f64.to_radians(),
            head_on_limit: 10.0_f64.to_radians(),
            crossing_aspect_limit: 10.0_f64.to_radians(),
            abaft_beam_sector: [112.5_f64.to_radians(), 247.5_f64.to_radians()],
        }
    }
}

/// Default target/own speed-ratio sampling ranges per encounter type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativeSpeedRanges {
    pub head_on: [f64; 2],
    pub overtaking_give_way: [f64; 2],
    pub overtaking_stand_on: [f64; 2],
    pub crossing_give_way: [f64; 2],
    pub crossing_stand_on: [f64; 2],
}

impl RelativeSpeedRanges {
    pub fn for_encounter(&self, kind: EncounterType) -> [f64; 2] {
        match kind {
            EncounterType::HeadOn => self.head_on,
            EncounterType::OvertakingGiveWay => self.overtaking_give_way,
            EncounterType::OvertakingStandOn => self.overtaking_stand_on,
            EncounterType::CrossingGiveWay => self.crossing_give_way,
            EncounterType::CrossingStandOn => self.crossing_stand_on,
        }
    }
}

impl Default for RelativeSpeedRanges {
    fn default() -> Self {
        Self {
            head_on: [0.5, 1.5],
            // The overtaking vessel must be the faster one.
            overtaking_give_way: [0.25, 0.75],
            overtaking_stand_on: [1.5, 2.0],
            crossing_give_way: [0.5, 1.5],
            crossing_stand_on: [0.5, 1.5],
        }
    }
}

/// Immutable configuration for the whole generation engine. Passed by
/// reference to every component; there is no process-wide settings state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterSettings {
    pub classification: ClassificationSectors,
    pub relative_speed: RelativeSpeedRanges,
    /// Default vector-time sampling range [s]
    pub vector_time_range: [f64; 2],
    /// Length of a generated situation [s]
    pub situation_length: f64,
    /// Maximum own/target separation at vector time [m]. Zero forces exact
    /// collision geometry.
    pub max_meeting_distance: f64,
    /// Look-back interval over which the classification must already hold
    /// [s]. Zero disables the persistence check.
    pub develop_time: f64,
    /// Check generated tracks against the land mask.
    pub land_check: bool,
    /// Attempt bound for the sampling loop, per encounter.
    pub max_attempts: u32,
}

impl Default for EncounterSettings {
    fn default() -> Self {
        Self {
            classification: ClassificationSectors::default(),
            relative_speed: RelativeSpeedRanges::default(),
            vector_time_range: [600.0, 900.0],
            situation_length: 3600.0,
            max_meeting_distance: 0.0,
            develop_time: 300.0,
            land_check: true,
            max_attempts: 25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sectors_are_in_radians() {
        let sectors = ClassificationSectors::default();
        assert!((sectors.abaft_beam_sector[0] - 1.9635).abs() < 1e-3);
        assert!((sectors.abaft_beam_sector[1] - 4.3197).abs() < 1e-3);
        assert!(sectors.head_on_limit < sectors.overtaking_aspect_limit);
    }

    #[test]
    fn speed_ranges_resolve_per_type() {
        let ranges = RelativeSpeedRanges::default();
        assert_eq!(
            ranges.for_encounter(EncounterType::OvertakingStandOn),
            [1.5, 2.0]
        );
        assert_eq!(ranges.for_encounter(EncounterType::HeadOn), [0.5, 1.5]);
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = EncounterSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: EncounterSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
