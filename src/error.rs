use thiserror::Error;

use crate::signal::Direction;
use crate::time::TimeUnit;

/// Fatal harness errors.
///
/// Assertion mismatches are not errors: they end a run as
/// [`Outcome::Failed`](crate::run::Outcome::Failed). Everything here is either
/// a configuration mistake or a scheduler defect, and is never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    #[error("a clock is already driving `{port}`; only one clock may run per test")]
    DuplicateClock { port: String },

    #[error("cannot wait for {cycles} clock edge(s): no clock has been started")]
    NoClock { cycles: u64 },

    #[error("clock half-period must be non-zero")]
    ZeroHalfPeriod,

    #[error("clock unit `{clock}` does not match the simulation resolution `{sim}`")]
    UnitMismatch { clock: TimeUnit, sim: TimeUnit },

    #[error("device has no port named `{0}`")]
    UnknownPort(String),

    #[error("port `{port}` is an {direction} and cannot be {action}")]
    WrongDirection {
        port: String,
        direction: Direction,
        action: &'static str,
    },

    #[error("value {value:#X} does not fit in the {width}-bit port `{port}`")]
    ValueOutOfRange { port: String, width: u32, value: u64 },

    #[error("port `{port}` is {width} bits wide; ports must be 1 to 64 bits")]
    PortWidth { port: String, width: u32 },

    #[error("clock port `{port}` must be 1 bit wide, found {width}")]
    ClockWidth { port: String, width: u32 },

    #[error("port `{port}` is driven by the {owner} and cannot take stimulus")]
    PortOwned { port: String, owner: &'static str },

    #[error("reset must be held for at least one clock cycle")]
    ResetTooShort,

    #[error("timeline violation: cursor at {now} cannot move to {requested}")]
    TimelineViolation { now: u64, requested: u64 },

    #[error("simulation stalled at t={at}: the test is suspended with nothing left to wake it")]
    Stalled { at: u64 },

    #[error("a task suspended outside the time base")]
    ForeignSuspension,
}

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;
