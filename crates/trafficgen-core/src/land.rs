//! Land-crossing validation against an injected land mask.
//!
//! The engine never reads map data itself; callers inject a point-in-land
//! predicate (an in-memory lookup, not I/O). The validator is a filter: it
//! reports a hit and leaves retrying to the assembler.

use thiserror::Error;

use crate::geo::{flat_to_geo, TrackPlan};
use crate::models::GeoPosition;

/// Temporal sampling resolution along a track [s].
const SAMPLE_INTERVAL_S: f64 = 60.0;

/// A point-in-landmass predicate, injected by the caller.
pub trait LandMask {
    /// Whether the given geographic position lies over land.
    fn is_land(&self, position: GeoPosition) -> Result<bool, LandMaskError>;
}

/// A land-mask lookup failed. Fatal for the attempt that issued it, not for
/// the generation run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("land mask lookup failed: {0}")]
pub struct LandMaskError(pub String);

/// Whether any sampled point of the track between situation start and
/// `horizon_s` lies over land. Samples every leg start plus a fixed
/// interval, short-circuiting on the first hit.
pub fn track_crosses_land(
    plan: &TrackPlan,
    horizon_s: f64,
    origin: GeoPosition,
    mask: &dyn LandMask,
) -> Result<bool, LandMaskError> {
    let mut sample_times: Vec<f64> = plan
        .leg_starts()
        .take_while(|&t| t <= horizon_s)
        .collect();
    let mut t = 0.0;
    while t <= horizon_s {
        sample_times.push(t);
        t += SAMPLE_INTERVAL_S;
    }
    sample_times.push(horizon_s);
    sample_times.sort_by(f64::total_cmp);
    sample_times.dedup();

    for t in sample_times {
        let pose = plan.pose_at(t);
        if mask.is_land(flat_to_geo(pose.position, origin))? {
            return Ok(true);
        }
    }
    Ok(false)
}
