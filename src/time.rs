//! Simulated time: resolution units, the timeline cursor, and the two ways of
//! naming a point on it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Resolution of one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Fs,
    Ps,
    #[default]
    Ns,
    Us,
    Ms,
    S,
}

impl TimeUnit {
    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Fs => "fs",
            TimeUnit::Ps => "ps",
            TimeUnit::Ns => "ns",
            TimeUnit::Us => "us",
            TimeUnit::Ms => "ms",
            TimeUnit::S => "s",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Absolute position of the simulation cursor, in ticks of the run's unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimTime(u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    pub const fn from_ticks(ticks: u64) -> Self {
        SimTime(ticks)
    }

    pub const fn ticks(self) -> u64 {
        self.0
    }

    pub fn checked_add(self, ticks: u64) -> Option<SimTime> {
        self.0.checked_add(ticks).map(SimTime)
    }

    pub fn saturating_since(self, earlier: SimTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point on the timeline relative to the current cursor.
///
/// Scenario files spell these `{ cycles = n }` and `{ time = t }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimePoint {
    /// `n` further rising edges of the running clock.
    #[serde(rename = "cycles")]
    EdgeCount(u64),
    /// `t` ticks of simulated time.
    #[serde(rename = "time")]
    Duration(u64),
}

impl TimePoint {
    pub fn is_zero(self) -> bool {
        matches!(self, TimePoint::EdgeCount(0) | TimePoint::Duration(0))
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimePoint::EdgeCount(1) => write!(f, "1 cycle"),
            TimePoint::EdgeCount(n) => write!(f, "{n} cycles"),
            TimePoint::Duration(t) => write!(f, "{t} ticks"),
        }
    }
}

/// Where an observation was made, in the unit the step was timed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservationPoint {
    /// Rising edges seen since the clock started.
    Cycle(u64),
    /// Elapsed simulated time since the run started.
    Elapsed(SimTime, TimeUnit),
}

impl fmt::Display for ObservationPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservationPoint::Cycle(n) => write!(f, "cycle {n}"),
            ObservationPoint::Elapsed(at, unit) => write!(f, "{at}{unit}"),
        }
    }
}
