use log::debug;
use serde::{Deserialize, Serialize};

use crate::device::{Device, Dut};
use crate::error::{HarnessError, Result};
use crate::sched::{Region, Sim};
use crate::time::{TimePoint, TimeUnit};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockConfig {
    pub port: String,
    /// Ticks between toggles.
    pub half_period: u64,
    #[serde(default)]
    pub unit: TimeUnit,
    /// Drive the clock high first, as cocotb's `Clock.start()` does.
    #[serde(default = "default_start_high")]
    pub start_high: bool,
}

fn default_start_high() -> bool {
    true
}

impl ClockConfig {
    pub fn new(port: impl Into<String>, half_period: u64, unit: TimeUnit) -> Self {
        Self {
            port: port.into(),
            half_period,
            unit,
            start_high: true,
        }
    }

    pub(crate) fn validate<D: Device>(&self, dut: &Dut<'_, D>) -> Result<()> {
        if self.half_period == 0 {
            return Err(HarnessError::ZeroHalfPeriod);
        }
        let port = dut.input(&self.port)?;
        if port.width != 1 {
            return Err(HarnessError::ClockWidth {
                port: self.port.clone(),
                width: port.width,
            });
        }
        Ok(())
    }
}

/// The free-running clock of a simulation.
pub struct Clock;

impl Clock {
    /// Start toggling `config.port` forever.
    ///
    /// The port is first set to its idle level (the opposite of the start
    /// level) at the current instant.
    ///
    /// The clock runs as a drive-region task: each toggle is applied and the
    /// device evaluated before any test code observes that instant. Every high
    /// phase is one rising edge for [`TimePoint::EdgeCount`] waits, including
    /// the first when `start_high` is set. The task is cancelled when the
    /// simulation's main task finishes.
    pub fn start<'a, D: Device + 'a>(sim: &Sim<'a>, dut: &Dut<'a, D>, config: &ClockConfig) -> Result<()> {
        config.validate(dut)?;
        if config.unit != sim.unit() {
            return Err(HarnessError::UnitMismatch {
                clock: config.unit,
                sim: sim.unit(),
            });
        }
        sim.claim_clock(&config.port)?;
        // Park the port at its idle level so the first toggle is a real edge
        // even if a previous run left it at the start level.
        dut.write(&config.port, u64::from(!config.start_high))?;
        debug!(
            "starting clock on `{}`: half-period {}{} at t={}",
            config.port,
            config.half_period,
            config.unit,
            sim.now()
        );

        let task_sim = sim.clone();
        let dut = dut.clone();
        let port = config.port.clone();
        let half_period = config.half_period;
        let mut high = config.start_high;
        sim.spawn(Region::Drive, async move {
            loop {
                if let Err(err) = dut.write(&port, u64::from(high)) {
                    task_sim.fault(err);
                    return;
                }
                if high {
                    task_sim.rising_edge();
                }
                if let Err(err) = task_sim.advance(TimePoint::Duration(half_period)).await {
                    task_sim.fault(err);
                    return;
                }
                high = !high;
            }
        });
        Ok(())
    }
}
