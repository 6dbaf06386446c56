//! Simulated activity
//!
//! Fixed set of behavior kinds, each performing one capability through the
//! driver. Kinds are drawn by weight; parameters are drawn per performance.

use std::time::Duration;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::driver::SessionDriver;
use crate::constants::MAX_BASE_DELAY_SECS;
use crate::logic::error::DriverError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Behavior {
    /// Small pointer movement followed by a short settle
    PointerDrift,
    /// Scroll down a little
    Scroll,
    /// Stay idle
    Dwell,
    /// Read something from the page
    DomTouch,
}

const WEIGHTED: [(Behavior, u32); 4] = [
    (Behavior::PointerDrift, 3),
    (Behavior::Scroll, 3),
    (Behavior::Dwell, 2),
    (Behavior::DomTouch, 1),
];

const MAX_SCROLL_PX: i32 = 200;
const MAX_DRIFT_PX: i32 = 120;

/// Pause ranges, as multiples of the pacing base delay
const DRIFT_SETTLE: (f64, f64) = (0.25, 0.75);
const DWELL: (f64, f64) = (1.0, 2.5);

impl Behavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Behavior::PointerDrift => "pointer_drift",
            Behavior::Scroll => "scroll",
            Behavior::Dwell => "dwell",
            Behavior::DomTouch => "dom_touch",
        }
    }

    /// Weighted random pick
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Behavior {
        match WeightedIndex::new(WEIGHTED.iter().map(|(_, w)| *w)) {
            Ok(dist) => WEIGHTED[dist.sample(rng)].0,
            Err(_) => Behavior::Dwell,
        }
    }

    /// Drive the page, returning how long the session should then stay idle
    pub fn perform<D, R>(&self, driver: &mut D, rng: &mut R, base_delay_secs: f64) -> Result<Duration, DriverError>
    where
        D: SessionDriver + ?Sized,
        R: Rng + ?Sized,
    {
        match self {
            Behavior::PointerDrift => {
                let dx = rng.gen_range(-MAX_DRIFT_PX..=MAX_DRIFT_PX);
                let dy = rng.gen_range(-MAX_DRIFT_PX..=MAX_DRIFT_PX);
                driver.move_pointer(dx, dy)?;
                Ok(scaled_pause(rng, base_delay_secs, DRIFT_SETTLE))
            }
            Behavior::Scroll => {
                driver.scroll_by(rng.gen_range(0..MAX_SCROLL_PX))?;
                Ok(Duration::ZERO)
            }
            Behavior::Dwell => Ok(scaled_pause(rng, base_delay_secs, DWELL)),
            Behavior::DomTouch => {
                driver.touch_dom()?;
                Ok(Duration::ZERO)
            }
        }
    }
}

fn scaled_pause<R: Rng + ?Sized>(rng: &mut R, base_delay_secs: f64, (lo, hi): (f64, f64)) -> Duration {
    let base = base_delay_secs.max(0.0).min(MAX_BASE_DELAY_SECS);
    if base == 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(base * rng.gen_range(lo..hi)).unwrap_or(Duration::ZERO)
}
