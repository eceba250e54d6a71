//! Situation assembly: bounded-retry generation of complete traffic
//! situations.
//!
//! The generator is the single entry point consumed by external callers. It
//! validates each definition up front, propagates the own ship to the
//! sampled vector time, and drives the solver inside a bounded attempt loop
//! with persistence and land checks. Exhaustion is surfaced explicitly; a
//! situation is never silently degraded to a wrong classification.

use rand::Rng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::colreg::classify;
use crate::geo::{flat_to_geo, position_at, TrackPlan};
use crate::land::{track_crosses_land, LandMask};
use crate::models::{
    EncounterMetadata, EncounterSpec, EncounterType, GeoPosition, Pose, ShipRecord, ShipStatic,
    ShipType, SituationDefinition, TargetShip, TrafficSituation, Waypoint,
};
use crate::settings::EncounterSettings;
use crate::solver::solve;

/// Generation failure for one situation instance. Sibling instances and
/// definitions are unaffected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    #[error("situation `{title}`: invalid specification: {reason}")]
    InvalidSpec { title: String, reason: String },
    #[error(
        "situation `{title}`: no valid candidate for encounter {index} ({desired:?}) \
         within {attempts} attempts"
    )]
    Exhausted {
        title: String,
        index: usize,
        desired: EncounterType,
        attempts: u32,
    },
}

/// Generates traffic situations from situation definitions.
pub struct SituationGenerator<'a> {
    settings: &'a EncounterSettings,
    land_mask: Option<&'a dyn LandMask>,
    target_pool: &'a [ShipStatic],
}

impl<'a> SituationGenerator<'a> {
    pub fn new(settings: &'a EncounterSettings) -> Self {
        Self {
            settings,
            land_mask: None,
            target_pool: &[],
        }
    }

    /// Inject the land mask consulted when land checking is enabled.
    pub fn with_land_mask(mut self, mask: &'a dyn LandMask) -> Self {
        self.land_mask = Some(mask);
        self
    }

    /// Static descriptors to draw target ships from. A built-in general
    /// cargo vessel is used when the pool is empty.
    pub fn with_target_pool(mut self, pool: &'a [ShipStatic]) -> Self {
        self.target_pool = pool;
        self
    }

    /// Generate every instance of every definition. One result per
    /// (definition × num_situations); a failing definition never aborts its
    /// siblings.
    pub fn generate_all<R: Rng>(
        &self,
        definitions: &[SituationDefinition],
        rng: &mut R,
    ) -> Vec<Result<TrafficSituation, GenerateError>> {
        definitions
            .iter()
            .flat_map(|definition| self.generate(definition, rng))
            .collect()
    }

    /// Generate all instances of one definition, with independent sampling
    /// per instance.
    pub fn generate<R: Rng>(
        &self,
        definition: &SituationDefinition,
        rng: &mut R,
    ) -> Vec<Result<TrafficSituation, GenerateError>> {
        let invalid = |reason: String| {
            vec![Err(GenerateError::InvalidSpec {
                title: definition.title.clone(),
                reason,
            })]
        };

        if let Err(reason) = validate_definition(definition) {
            return invalid(reason);
        }
        if self.settings.land_check && self.land_mask.is_none() {
            return invalid("land checking is enabled but no land mask was provided".into());
        }
        let plan = match TrackPlan::build(&definition.own_ship.initial, &definition.own_ship.waypoints)
        {
            Ok(plan) => plan,
            Err(err) => return invalid(err.to_string()),
        };

        (0..definition.num_situations.max(1))
            .map(|_| self.generate_one(definition, &plan, rng))
            .collect()
    }

    fn generate_one<R: Rng>(
        &self,
        definition: &SituationDefinition,
        plan: &TrackPlan,
        rng: &mut R,
    ) -> Result<TrafficSituation, GenerateError> {
        let mut targets = Vec::with_capacity(definition.encounters.len());
        for (index, spec) in definition.encounters.iter().enumerate() {
            let target = self.generate_encounter(definition, plan, spec, index, rng)?;
            targets.push(target);
        }

        Ok(TrafficSituation {
            title: definition.title.clone(),
            origin: definition.origin,
            own_ship: self.own_ship_record(definition),
            targets,
        })
    }

    fn generate_encounter<R: Rng>(
        &self,
        definition: &SituationDefinition,
        plan: &TrackPlan,
        spec: &EncounterSpec,
        index: usize,
        rng: &mut R,
    ) -> Result<TargetShip, GenerateError> {
        let settings = self.settings;
        let statics = self.pick_target_static(rng);

        for attempt in 1..=settings.max_attempts {
            let vector_time = match &spec.vector_time {
                Some(constraint) => constraint.sample(rng),
                None => {
                    let [lo, hi] = settings.vector_time_range;
                    rng.random_range(lo..=hi)
                }
            };
            let own_at_meeting = plan.pose_at(vector_time);

            let candidate = match solve(
                &own_at_meeting,
                spec.desired,
                spec.beta.as_ref(),
                spec.relative_speed.as_ref(),
                vector_time,
                statics.speed_max,
                settings,
                rng,
            ) {
                Ok(candidate) => candidate,
                Err(reject) => {
                    trace!(attempt, %reject, "solver sample rejected");
                    continue;
                }
            };

            if !self.encounter_develops(&own_at_meeting, &candidate.at_meeting, spec.desired) {
                debug!(attempt, ?spec.desired, "candidate rejected: classification drifts before vector time");
                continue;
            }
            match self.tracks_clear(definition, plan, &candidate.start, vector_time) {
                Ok(true) => {}
                Ok(false) => {
                    debug!(attempt, ?spec.desired, "candidate rejected: track crosses land");
                    continue;
                }
                Err(err) => {
                    debug!(attempt, %err, "candidate rejected: land mask failure");
                    continue;
                }
            }

            debug!(attempt, ?spec.desired, beta = candidate.beta, "encounter accepted");
            return Ok(self.target_record(
                definition,
                index,
                statics,
                &candidate,
                vector_time,
                spec.desired,
            ));
        }

        Err(GenerateError::Exhausted {
            title: definition.title.clone(),
            index,
            desired: spec.desired,
            attempts: settings.max_attempts,
        })
    }

    /// The requested classification must already hold one develop interval
    /// before the encounter instant.
    fn encounter_develops(&self, own: &Pose, target: &Pose, desired: EncounterType) -> bool {
        let look_back = self.settings.develop_time;
        if look_back <= 0.0 {
            return true;
        }
        let own_pre = Pose::new(
            position_at(own.position, own.course, own.speed, -look_back),
            own.speed,
            own.course,
        );
        let target_pre = Pose::new(
            position_at(target.position, target.course, target.speed, -look_back),
            target.speed,
            target.course,
        );
        classify(&own_pre, &target_pre, &self.settings.classification).is(desired)
    }

    /// Both vessels' tracks up to vector time must stay clear of land.
    fn tracks_clear(
        &self,
        definition: &SituationDefinition,
        own_plan: &TrackPlan,
        target_start: &Pose,
        vector_time: f64,
    ) -> Result<bool, crate::land::LandMaskError> {
        if !self.settings.land_check {
            return Ok(true);
        }
        let Some(mask) = self.land_mask else {
            return Err(crate::land::LandMaskError(
                "land checking is enabled but no land mask was provided".into(),
            ));
        };
        if track_crosses_land(own_plan, vector_time, definition.origin, mask)? {
            return Ok(false);
        }
        let target_plan = TrackPlan::constant(target_start);
        Ok(!track_crosses_land(
            &target_plan,
            vector_time,
            definition.origin,
            mask,
        )?)
    }

    fn pick_target_static<R: Rng>(&self, rng: &mut R) -> ShipStatic {
        if self.target_pool.is_empty() {
            return default_target_static();
        }
        self.target_pool[rng.random_range(0..self.target_pool.len())].clone()
    }

    fn own_ship_record(&self, definition: &SituationDefinition) -> ShipRecord {
        let own = &definition.own_ship;
        let waypoints = if own.waypoints.is_empty() {
            two_point_track(&own.initial, self.settings.situation_length)
        } else {
            own.waypoints.clone()
        };
        let geo_waypoints = geo_track(&waypoints, definition.origin);
        ShipRecord {
            static_data: own.static_data.clone(),
            initial: own.initial.clone(),
            waypoints,
            geo_waypoints,
        }
    }

    fn target_record(
        &self,
        definition: &SituationDefinition,
        index: usize,
        statics: ShipStatic,
        candidate: &crate::solver::TargetCandidate,
        vector_time: f64,
        desired: EncounterType,
    ) -> TargetShip {
        let waypoints = two_point_track(&candidate.start, self.settings.situation_length);
        let geo_waypoints = geo_track(&waypoints, definition.origin);
        TargetShip {
            id: index as u32 + 1,
            static_data: statics,
            initial: candidate.start.clone(),
            waypoints,
            geo_waypoints,
            encounter: EncounterMetadata {
                encounter_type: desired,
                beta: candidate.beta,
                relative_speed: candidate.speed_ratio,
                vector_time,
            },
        }
    }
}

fn validate_definition(definition: &SituationDefinition) -> Result<(), String> {
    if definition.encounters.is_empty() {
        return Err("encounter list is empty".into());
    }
    if !definition.origin.is_valid() {
        return Err("origin is outside the valid geographic domain".into());
    }
    if !(definition.own_ship.initial.speed > 0.0) {
        return Err("own ship speed must be positive".into());
    }
    for (index, spec) in definition.encounters.iter().enumerate() {
        for (name, constraint) in [
            ("beta", &spec.beta),
            ("relative_speed", &spec.relative_speed),
            ("vector_time", &spec.vector_time),
        ] {
            if let Some(constraint) = constraint {
                if !constraint.is_valid() {
                    return Err(format!("encounter {index}: malformed {name} constraint"));
                }
            }
        }
        if let Some(vt) = &spec.vector_time {
            let lo = match *vt {
                crate::models::Constraint::Fixed(v) => v,
                crate::models::Constraint::Range([lo, _]) => lo,
            };
            if lo <= 0.0 {
                return Err(format!("encounter {index}: vector time must be positive"));
            }
        }
        if let Some(rs) = &spec.relative_speed {
            let lo = match *rs {
                crate::models::Constraint::Fixed(v) => v,
                crate::models::Constraint::Range([lo, _]) => lo,
            };
            if lo <= 0.0 {
                return Err(format!("encounter {index}: relative speed must be positive"));
            }
        }
    }
    Ok(())
}

/// A straight two-point track covering the situation length.
fn two_point_track(start: &Pose, situation_length: f64) -> Vec<Waypoint> {
    vec![
        Waypoint {
            position: start.position,
            speed: start.speed,
        },
        Waypoint {
            position: position_at(start.position, start.course, start.speed, situation_length),
            speed: start.speed,
        },
    ]
}

fn geo_track(waypoints: &[Waypoint], origin: GeoPosition) -> Vec<GeoPosition> {
    waypoints
        .iter()
        .map(|wp| flat_to_geo(wp.position, origin))
        .collect()
}

fn default_target_static() -> ShipStatic {
    ShipStatic {
        mmsi: 219_999_001,
        name: "Target".into(),
        ship_type: ShipType::GeneralCargo,
        length: 80.0,
        width: 14.0,
        height: 15.0,
        speed_max: 12.86,
    }
}
