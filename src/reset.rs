use std::cell::Cell;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::device::{Device, Dut};
use crate::error::{HarnessError, Result};
use crate::sched::Sim;
use crate::time::TimePoint;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetConfig {
    pub port: String,
    /// Asserted means driven to 0 (`rst_n` style).
    #[serde(default = "default_active_low")]
    pub active_low: bool,
    /// How long reset stays asserted once the clock is running.
    pub hold: TimePoint,
    /// Ticks reset is asserted before the clock is started.
    #[serde(default)]
    pub pre_clock: Option<u64>,
}

fn default_active_low() -> bool {
    true
}

impl ResetConfig {
    pub fn new(port: impl Into<String>, hold: TimePoint) -> Self {
        Self {
            port: port.into(),
            active_low: true,
            hold,
            pre_clock: None,
        }
    }

    pub fn active_high(mut self) -> Self {
        self.active_low = false;
        self
    }

    pub fn pre_clock(mut self, ticks: u64) -> Self {
        self.pre_clock = Some(ticks);
        self
    }

    pub(crate) fn validate<D: Device>(&self, dut: &Dut<'_, D>) -> Result<()> {
        let port = dut.input(&self.port)?;
        // Both levels must be writable.
        port.literal(1)?;

        // An edge-counted hold has to span at least one full cycle so the
        // device sees an edge while in reset.
        let too_short = match self.hold {
            TimePoint::EdgeCount(0) => true,
            TimePoint::EdgeCount(_) => false,
            TimePoint::Duration(t) => t == 0 && self.pre_clock.unwrap_or(0) == 0,
        };
        if too_short {
            return Err(HarnessError::ResetTooShort);
        }
        Ok(())
    }
}

/// Drives the reset port of one device.
pub struct ResetSequencer<'a, D> {
    sim: Sim<'a>,
    dut: Dut<'a, D>,
    port: String,
    active_low: bool,
    asserted: Cell<bool>,
}

impl<'a, D: Device> ResetSequencer<'a, D> {
    pub fn new(sim: &Sim<'a>, dut: &Dut<'a, D>, config: &ResetConfig) -> Result<Self> {
        config.validate(dut)?;
        Ok(Self {
            sim: sim.clone(),
            dut: dut.clone(),
            port: config.port.clone(),
            active_low: config.active_low,
            asserted: Cell::new(false),
        })
    }

    fn level(&self, asserted: bool) -> u64 {
        u64::from(asserted != self.active_low)
    }

    /// Assert reset now. Allowed before any clock is running.
    pub fn assert(&self) -> Result<()> {
        if !self.asserted.get() {
            debug!("asserting `{}` at t={}", self.port, self.sim.now());
            self.dut.write(&self.port, self.level(true))?;
            self.asserted.set(true);
        }
        Ok(())
    }

    pub fn release(&self) -> Result<()> {
        debug!("releasing `{}` at t={}", self.port, self.sim.now());
        self.dut.write(&self.port, self.level(false))?;
        self.asserted.set(false);
        Ok(())
    }

    /// Hold reset asserted for `hold`, then release it.
    pub async fn apply(&self, hold: TimePoint) -> Result<()> {
        self.assert()?;
        self.sim.advance(hold).await?;
        self.release()
    }
}
