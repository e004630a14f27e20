//! Stat clamping and termination rules of the 7-day game.

use serde::{Deserialize, Serialize};

pub const MAX_DAYS: u32 = 7;
pub const STAT_MIN: i32 = 0;
pub const STAT_MAX: i32 = 100;
pub const START_REPUTATION: i32 = 50;
pub const START_STRESS: i32 = 20;
pub const MAX_OPTIONS: usize = 3;

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ending {
    Burnout,
    Fired,
    Victory,
}

impl Ending {
    pub fn message(self) -> &'static str {
        match self {
            Ending::Burnout => "You collapsed from stress! Game Over.",
            Ending::Fired => "You were fired for incompetence! Game Over.",
            Ending::Victory => "Congratulations! You survived 7 days.",
        }
    }
}

/// Applies a model-supplied delta to a stat and clamps into [0, 100].
/// Saturates first, so deltas of any size are safe.
pub fn apply_delta(current: i32, delta: i64) -> i32 {
    let next = i64::from(current).saturating_add(delta);
    next.clamp(i64::from(STAT_MIN), i64::from(STAT_MAX)) as i32
}

/// Checks the end conditions in priority order: burnout, firing, then
/// surviving past the last day. At most one ending applies.
pub fn evaluate_ending(day: u32, reputation: i32, stress: i32) -> Option<Ending> {
    if stress >= STAT_MAX {
        Some(Ending::Burnout)
    } else if reputation <= STAT_MIN {
        Some(Ending::Fired)
    } else if day > MAX_DAYS {
        Some(Ending::Victory)
    } else {
        None
    }
}
