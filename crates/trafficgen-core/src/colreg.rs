//! COLREG encounter classification.
//!
//! Pure decision procedure over two kinematic states. The sector
//! comparisons are boundary-inclusive for the earlier rule in a fixed
//! evaluation order (overtaking, head-on, crossing), so a boundary angle
//! always resolves to the more specific, obligation-creating category, and
//! the same policy applies in both bearing directions.

use std::f64::consts::PI;

use crate::geo::{normalize_0_2pi, planar_distance, smallest_signed_angle};
use crate::models::{EncounterType, Pose};
use crate::settings::ClassificationSectors;

/// Below this separation the two positions are treated as coincident and
/// bearings are taken in the limit of the approach [m].
const COINCIDENT_EPS_M: f64 = 1e-6;
/// Relative velocities below this cannot define an approach direction [m/s].
const RELATIVE_SPEED_EPS: f64 = 1e-9;

/// The angles and speed ratio the classifier actually observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Relative bearing of the target from the own ship [rad, 0..2π)
    pub beta: f64,
    /// Relative bearing of the own ship from the target [rad, -π..π)
    pub alpha: f64,
    /// Target speed divided by own-ship speed
    pub speed_ratio: f64,
}

/// Tagged classification outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification {
    /// The pair forms a rule-governed encounter.
    Encounter(EncounterType, Observation),
    /// Geometry observed, but no collision-risk category applies.
    NoRisk(Observation),
    /// The input does not admit a classification (zero or non-finite
    /// own-ship speed, or fully degenerate geometry).
    Undefined,
}

impl Classification {
    pub fn label(&self) -> Option<EncounterType> {
        match self {
            Classification::Encounter(kind, _) => Some(*kind),
            _ => None,
        }
    }

    pub fn is(&self, kind: EncounterType) -> bool {
        self.label() == Some(kind)
    }

    pub fn observation(&self) -> Option<Observation> {
        match self {
            Classification::Encounter(_, obs) | Classification::NoRisk(obs) => Some(*obs),
            Classification::Undefined => None,
        }
    }
}

/// Classify the encounter between the own ship and a target at one instant.
pub fn classify(own: &Pose, target: &Pose, sectors: &ClassificationSectors) -> Classification {
    if !own.speed.is_finite() || own.speed <= 0.0 || !target.speed.is_finite() || target.speed < 0.0
    {
        return Classification::Undefined;
    }
    let Some(bearing_to_target) = bearing_own_to_target(own, target) else {
        return Classification::Undefined;
    };

    let beta = normalize_0_2pi(bearing_to_target - own.course);
    let alpha = smallest_signed_angle(bearing_to_target + PI - target.course);
    let speed_ratio = target.speed / own.speed;
    let obs = Observation {
        beta,
        alpha,
        speed_ratio,
    };

    let beta_signed = smallest_signed_angle(beta);
    let alpha_0_2pi = normalize_0_2pi(alpha);
    let [abaft_start, abaft_end] = sectors.abaft_beam_sector;

    // Rule 13: the target is coming up with the own ship from abaft the beam.
    if beta >= abaft_start
        && beta <= abaft_end
        && alpha.abs() <= sectors.overtaking_aspect_limit
        && speed_ratio > 1.0
    {
        return Classification::Encounter(EncounterType::OvertakingStandOn, obs);
    }
    // Rule 13, mirrored: the own ship is coming up with the target.
    if alpha_0_2pi >= abaft_start
        && alpha_0_2pi <= abaft_end
        && beta_signed.abs() <= sectors.overtaking_aspect_limit
        && speed_ratio < 1.0
    {
        return Classification::Encounter(EncounterType::OvertakingGiveWay, obs);
    }
    // Rule 14: reciprocal or nearly reciprocal courses.
    if beta_signed.abs() <= sectors.head_on_limit && alpha.abs() <= sectors.head_on_limit {
        return Classification::Encounter(EncounterType::HeadOn, obs);
    }
    // Rule 15: target to starboard, own ship gives way.
    if beta > 0.0
        && beta <= abaft_start
        && alpha >= -abaft_start
        && alpha <= sectors.crossing_aspect_limit
    {
        return Classification::Encounter(EncounterType::CrossingGiveWay, obs);
    }
    // Rule 15, mirrored: own ship to the target's starboard, own ship stands on.
    if alpha_0_2pi > 0.0
        && alpha_0_2pi <= abaft_start
        && beta_signed >= -abaft_start
        && beta_signed <= sectors.crossing_aspect_limit
    {
        return Classification::Encounter(EncounterType::CrossingStandOn, obs);
    }

    Classification::NoRisk(obs)
}

/// Absolute bearing of the target as seen from the own ship. For coincident
/// positions the bearing is the limit of the approach direction, i.e. the
/// direction of the relative velocity `v_own·û_own − v_tgt·û_tgt`.
fn bearing_own_to_target(own: &Pose, target: &Pose) -> Option<f64> {
    if planar_distance(own.position, target.position) > COINCIDENT_EPS_M {
        return Some(crate::geo::planar_bearing(own.position, target.position));
    }

    let north = own.speed * own.course.cos() - target.speed * target.course.cos();
    let east = own.speed * own.course.sin() - target.speed * target.course.sin();
    if north.hypot(east) <= RELATIVE_SPEED_EPS {
        return None;
    }
    Some(normalize_0_2pi(east.atan2(north)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;

    fn pose(north: f64, east: f64, speed: f64, course_deg: f64) -> Pose {
        Pose::new(Position::new(north, east), speed, course_deg.to_radians())
    }

    fn sectors() -> ClassificationSectors {
        ClassificationSectors::default()
    }

    #[test]
    fn reciprocal_courses_classify_head_on() {
        let own = pose(0.0, 0.0, 5.0, 0.0);
        let target = pose(5000.0, 0.0, 5.0, 180.0);
        let got = classify(&own, &target, &sectors());
        assert!(got.is(EncounterType::HeadOn), "got {got:?}");
        let obs = got.observation().unwrap();
        assert!(obs.beta.abs() < 1e-9);
        assert!((obs.speed_ratio - 1.0).abs() < 1e-9);
    }

    #[test]
    fn target_to_starboard_is_crossing_give_way() {
        // Target east of the own ship, steering west across its bow.
        let own = pose(0.0, 0.0, 5.0, 0.0);
        let target = pose(0.0, 5000.0, 5.0, 270.0);
        let got = classify(&own, &target, &sectors());
        assert!(got.is(EncounterType::CrossingGiveWay), "got {got:?}");
    }

    #[test]
    fn target_to_port_is_crossing_stand_on() {
        // Target to port, converging course that keeps the own ship on the
        // target's starboard bow.
        let own = pose(0.0, 0.0, 5.0, 0.0);
        let target = pose(0.0, -5000.0, 5.0, 60.0);
        let got = classify(&own, &target, &sectors());
        assert!(got.is(EncounterType::CrossingStandOn), "got {got:?}");
    }

    #[test]
    fn faster_target_astern_is_overtaking_stand_on() {
        let own = pose(0.0, 0.0, 5.0, 0.0);
        let target = pose(-5000.0, 0.0, 9.0, 0.0);
        let got = classify(&own, &target, &sectors());
        assert!(got.is(EncounterType::OvertakingStandOn), "got {got:?}");
    }

    #[test]
    fn slower_target_ahead_is_overtaking_give_way() {
        let own = pose(0.0, 0.0, 8.0, 0.0);
        let target = pose(5000.0, 0.0, 3.0, 0.0);
        let got = classify(&own, &target, &sectors());
        assert!(got.is(EncounterType::OvertakingGiveWay), "got {got:?}");
    }

    #[test]
    fn slow_target_astern_is_not_overtaking() {
        // Same geometry as an overtaking approach, but the target is slower
        // and will never come up with the own ship.
        let own = pose(0.0, 0.0, 5.0, 0.0);
        let target = pose(-5000.0, 0.0, 3.0, 0.0);
        let got = classify(&own, &target, &sectors());
        assert!(!got.is(EncounterType::OvertakingStandOn), "got {got:?}");
    }

    #[test]
    fn abeam_target_is_no_risk() {
        // Target abeam, heading away from the own ship's track.
        let own = pose(0.0, 0.0, 5.0, 0.0);
        let target = pose(0.0, 5000.0, 5.0, 90.0);
        let got = classify(&own, &target, &sectors());
        assert!(matches!(got, Classification::NoRisk(_)), "got {got:?}");
    }

    #[test]
    fn zero_own_speed_is_undefined() {
        let own = pose(0.0, 0.0, 0.0, 0.0);
        let target = pose(5000.0, 0.0, 5.0, 180.0);
        assert_eq!(classify(&own, &target, &sectors()), Classification::Undefined);
    }

    #[test]
    fn coincident_positions_use_approach_direction() {
        // Both ships at the exact meeting point, reciprocal courses: the
        // limit of the approach is still a head-on geometry.
        let own = pose(0.0, 0.0, 5.0, 0.0);
        let target = pose(0.0, 0.0, 5.0, 180.0);
        let got = classify(&own, &target, &sectors());
        assert!(got.is(EncounterType::HeadOn), "got {got:?}");
    }

    #[test]
    fn coincident_positions_with_identical_velocity_are_undefined() {
        let own = pose(0.0, 0.0, 5.0, 45.0);
        let target = pose(0.0, 0.0, 5.0, 45.0);
        assert_eq!(classify(&own, &target, &sectors()), Classification::Undefined);
    }

    #[test]
    fn sector_boundary_resolves_to_overtaking() {
        // Relative bearing exactly at the abaft-beam sector start with a
        // faster target: the boundary belongs to the overtaking rule. The
        // sector edge is pinned to the exact bearing of the chosen position
        // so the comparison really exercises equality.
        let own = pose(0.0, 0.0, 5.0, 0.0);
        let target_pos = Position::new(-2000.0, 4000.0);
        let bearing = crate::geo::planar_bearing(own.position, target_pos);
        let mut s = sectors();
        s.abaft_beam_sector[0] = bearing;

        // Course pointed straight back at the own ship keeps alpha at zero.
        let course = normalize_0_2pi(bearing + PI);
        let target = Pose::new(target_pos, 9.0, course);
        let got = classify(&own, &target, &s);
        assert!(got.is(EncounterType::OvertakingStandOn), "got {got:?}");

        // The identical geometry with a slower target falls through to the
        // crossing rule instead, same boundary side.
        let slow = Pose::new(target_pos, 3.0, course);
        let got = classify(&own, &slow, &s);
        assert!(got.is(EncounterType::CrossingGiveWay), "got {got:?}");
    }
}
