//! Clock, reset and timed stimulus/check harness for synchronous devices.
//!
//! Waits are expressed either in clock edges or in simulated time
//! ([`TimePoint`]); both land on the same single timeline, driven by a
//! cooperative executor ([`Executor`]) that runs the clock before the test
//! code at every instant.

pub mod check;
pub mod clock;
pub mod device;
pub mod error;
pub mod models;
pub mod reset;
pub mod run;
pub mod scenario;
pub mod sched;
pub mod signal;
pub mod stimulus;
pub mod time;
mod timebase;
pub mod trace;
#[cfg(feature = "verilator")]
pub mod verilated;

pub use check::{AssertionChecker, Failure, Verdict};
pub use clock::{Clock, ClockConfig};
pub use device::{Device, Dut};
pub use error::HarnessError;
pub use reset::{ResetConfig, ResetSequencer};
pub use run::{run, Harness, Outcome, RunState, Step, Summary, TestRun};
pub use scenario::ScenarioError;
pub use sched::{Executor, Region, Sim, TaskId};
pub use signal::{Direction, Literal, Port};
pub use stimulus::{StimulusDriver, Vector};
pub use time::{ObservationPoint, SimTime, TimePoint, TimeUnit};
pub use trace::{Trace, TraceEvent, TraceKind};
