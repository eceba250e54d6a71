//! Meeting-point solver for target-ship placement.
//!
//! Given the own ship's state at vector time and a desired encounter type,
//! the solver samples a relative bearing, speed ratio and meeting offset,
//! solves the target course that lands the pair in the desired classifier
//! sector, verifies the result through the classifier, and back-projects
//! the target's initial state. A sample that cannot be made to classify is
//! rejected, never returned.

use std::f64::consts::PI;

use rand::Rng;
use thiserror::Error;
use tracing::trace;

use crate::colreg::{classify, Classification};
use crate::geo::{normalize_0_2pi, planar_offset, position_at};
use crate::models::{Constraint, EncounterType, Pose};
use crate::settings::{ClassificationSectors, EncounterSettings};

/// Lower clamp on the target speed, keeping bearing rates well-defined [m/s].
pub const MIN_TARGET_SPEED_MPS: f64 = 0.1;

/// One rejected solver sample. The caller resamples.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SolveReject {
    #[error("sampled geometry produced an undefined classification")]
    Undefined,
    #[error("sampled geometry classified as {got:?}, wanted {want:?}")]
    WrongClass {
        want: EncounterType,
        got: Option<EncounterType>,
    },
    #[error("fixed speed ratio {ratio} falls outside the target's achievable speed range")]
    RatioOutOfRange { ratio: f64 },
}

/// A solved target-ship candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetCandidate {
    /// State at situation start (back-projected).
    pub start: Pose,
    /// State at vector time.
    pub at_meeting: Pose,
    /// Placement bearing of the target relative to the own-ship course
    /// [rad, 0..2π). Equals the position-derived relative bearing whenever
    /// the meeting distance is positive.
    pub beta: f64,
    /// Achieved target/own speed ratio, after clamping.
    pub speed_ratio: f64,
    /// Sampled own/target separation at vector time [m].
    pub meeting_distance: f64,
}

/// Solve one target-ship placement for the desired encounter type.
#[allow(clippy::too_many_arguments)]
pub fn solve<R: Rng>(
    own_at_meeting: &Pose,
    desired: EncounterType,
    beta_constraint: Option<&Constraint>,
    relative_speed_constraint: Option<&Constraint>,
    vector_time: f64,
    speed_max: f64,
    settings: &EncounterSettings,
    rng: &mut R,
) -> Result<TargetCandidate, SolveReject> {
    let sectors = &settings.classification;

    let beta = match beta_constraint {
        Some(constraint) => normalize_0_2pi(constraint.sample(rng)),
        None => sample_beta(desired, sectors, rng),
    };
    let ratio = match relative_speed_constraint {
        Some(constraint) => constraint.sample(rng),
        None => {
            let [lo, hi] = settings.relative_speed.for_encounter(desired);
            rng.random_range(lo..=hi)
        }
    };
    let requested_speed = ratio * own_at_meeting.speed;
    let speed = requested_speed.clamp(MIN_TARGET_SPEED_MPS, speed_max);
    // A sampled ratio may be clamped; a fixed one is a contract and must be
    // honored exactly or rejected.
    if speed != requested_speed && matches!(relative_speed_constraint, Some(Constraint::Fixed(_)))
    {
        trace!(?desired, ratio, "sample rejected: fixed ratio not achievable");
        return Err(SolveReject::RatioOutOfRange { ratio });
    }

    let meeting_distance = if settings.max_meeting_distance > 0.0 {
        rng.random_range(0.0..=settings.max_meeting_distance)
    } else {
        0.0
    };
    let meeting_position = planar_offset(
        own_at_meeting.position,
        own_at_meeting.course + beta,
        meeting_distance,
    );

    // Course solve: place the own ship at the desired aspect in the
    // target's frame. The bearing from target back to own ship is the
    // reciprocal of the placement bearing.
    let alpha = aspect_for(desired, sectors);
    let course = normalize_0_2pi(own_at_meeting.course + beta + PI - alpha);
    let at_meeting = Pose::new(meeting_position, speed, course);

    match classify(own_at_meeting, &at_meeting, sectors) {
        Classification::Encounter(kind, _) if kind == desired => {}
        Classification::Undefined => {
            trace!(?desired, beta, "sample rejected: undefined classification");
            return Err(SolveReject::Undefined);
        }
        other => {
            trace!(?desired, got = ?other.label(), beta, "sample rejected: wrong class");
            return Err(SolveReject::WrongClass {
                want: desired,
                got: other.label(),
            });
        }
    }

    let start_position = position_at(meeting_position, course, speed, -vector_time);
    Ok(TargetCandidate {
        start: Pose::new(start_position, speed, course),
        at_meeting,
        beta,
        speed_ratio: speed / own_at_meeting.speed,
        meeting_distance,
    })
}

/// Default relative-bearing sampling range: the desired type's valid
/// classifier sector.
fn sample_beta<R: Rng>(desired: EncounterType, s: &ClassificationSectors, rng: &mut R) -> f64 {
    let [abaft_start, abaft_end] = s.abaft_beam_sector;
    let raw = match desired {
        EncounterType::HeadOn => rng.random_range(-s.head_on_limit..=s.head_on_limit),
        EncounterType::OvertakingGiveWay => {
            rng.random_range(-s.overtaking_aspect_limit..=s.overtaking_aspect_limit)
        }
        EncounterType::OvertakingStandOn => rng.random_range(abaft_start..=abaft_end),
        EncounterType::CrossingGiveWay => rng.random_range(0.0..abaft_start),
        EncounterType::CrossingStandOn => {
            rng.random_range(-abaft_start..=s.crossing_aspect_limit)
        }
    };
    normalize_0_2pi(raw)
}

/// Aspect (relative bearing of the own ship seen from the target) to aim
/// for, per desired label: zero where the rules ask for a vessel pointed
/// straight at the other, otherwise the midpoint of the valid sector to
/// stay clear of boundary fragility.
fn aspect_for(desired: EncounterType, s: &ClassificationSectors) -> f64 {
    let [abaft_start, abaft_end] = s.abaft_beam_sector;
    match desired {
        EncounterType::HeadOn | EncounterType::OvertakingStandOn => 0.0,
        EncounterType::OvertakingGiveWay => (abaft_start + abaft_end) / 2.0,
        EncounterType::CrossingGiveWay => (-abaft_start + s.crossing_aspect_limit) / 2.0,
        EncounterType::CrossingStandOn => abaft_start / 2.0,
    }
}
