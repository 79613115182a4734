//! A complete test: reset, then alternating stimulus holds and checks.

use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::check::{AssertionChecker, Failure, Verdict};
use crate::clock::{Clock, ClockConfig};
use crate::device::{Device, Dut};
use crate::error::Result;
use crate::reset::{ResetConfig, ResetSequencer};
use crate::sched::{Executor, Sim};
use crate::stimulus::{StimulusDriver, Vector};
use crate::time::{ObservationPoint, SimTime, TimePoint, TimeUnit};
use crate::trace::Trace;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRun {
    #[serde(default)]
    pub name: String,
    pub clock: ClockConfig,
    pub reset: ResetConfig,
    /// Inputs written before reset is asserted.
    #[serde(default)]
    pub init: Vector,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl TestRun {
    pub fn new(name: impl Into<String>, clock: ClockConfig, reset: ResetConfig) -> Self {
        Self {
            name: name.into(),
            clock,
            reset,
            init: Vector::new(),
            steps: Vec::new(),
        }
    }

    pub fn init(mut self, port: impl Into<String>, value: u64) -> Self {
        self.init.insert(port.into(), value);
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }
}

/// Apply `drive`, wait `hold`, then check `expect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub drive: Vector,
    pub hold: TimePoint,
    #[serde(default)]
    pub expect: Vector,
}

impl Step {
    pub fn hold(hold: TimePoint) -> Self {
        Self {
            drive: Vector::new(),
            hold,
            expect: Vector::new(),
        }
    }

    pub fn drive(mut self, port: impl Into<String>, value: u64) -> Self {
        self.drive.insert(port.into(), value);
        self
    }

    pub fn expect(mut self, port: impl Into<String>, value: u64) -> Self {
        self.expect.insert(port.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub steps: usize,
    pub checks: usize,
    pub finished_at: SimTime,
    pub cycles: u64,
    pub unit: TimeUnit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed(Summary),
    Failed(Failure),
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed(_))
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Passed(_) => None,
            Outcome::Failed(failure) => Some(failure),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Passed(s) => write!(
                f,
                "passed: {} step(s), {} check(s), finished at {}{} (cycle {})",
                s.steps, s.checks, s.finished_at, s.unit, s.cycles
            ),
            Outcome::Failed(failure) => write!(f, "failed: {failure}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Resetting,
    Driving,
    Checking,
    Passed,
    Failed,
}

impl RunState {
    /// `Idle → Resetting → (Driving ⇄ Checking)* → Passed | Failed`. A run
    /// without steps passes straight from `Driving`.
    pub fn can_become(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Idle, Resetting)
                | (Resetting, Driving)
                | (Driving, Checking)
                | (Driving, Passed)
                | (Checking, Driving)
                | (Checking, Passed)
                | (Checking, Failed)
        )
    }

    fn enter(&mut self, next: RunState) {
        debug_assert!(self.can_become(next), "illegal transition {self:?} -> {next:?}");
        debug!("{:?} -> {:?}", self, next);
        *self = next;
    }
}

/// Runs tests against one device, keeping it (and the last trace) between
/// runs.
pub struct Harness<D> {
    device: D,
    trace: Option<Trace>,
}

impl<D: Device> Harness<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            trace: None,
        }
    }

    pub fn run(&mut self, test: &TestRun) -> Result<Outcome> {
        let mut exec = Executor::new(test.clock.unit);
        let sim = exec.handle();
        let result = Dut::new(&sim, &mut self.device)
            .and_then(|dut| exec.block_on(sequence(sim.clone(), dut, test)));
        self.trace = Some(sim.trace());
        result?
    }

    /// Signals driven and sampled by the most recent run.
    pub fn trace(&self) -> Option<&Trace> {
        self.trace.as_ref()
    }

    /// The device as the last run left it.
    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }
}

/// Run one test against `device`.
pub fn run<D: Device>(device: D, test: &TestRun) -> Result<Outcome> {
    Harness::new(device).run(test)
}

fn observation_point(sim: &Sim<'_>, hold: TimePoint) -> ObservationPoint {
    match hold {
        TimePoint::EdgeCount(_) => ObservationPoint::Cycle(sim.edges()),
        TimePoint::Duration(_) => ObservationPoint::Elapsed(sim.now(), sim.unit()),
    }
}

async fn sequence<'a, D: Device + 'a>(
    sim: Sim<'a>,
    dut: Dut<'a, D>,
    test: &'a TestRun,
) -> Result<Outcome> {
    // Everything is checked before simulated time starts.
    test.clock.validate(&dut)?;
    let reset = ResetSequencer::new(&sim, &dut, &test.reset)?;
    let driver = StimulusDriver::new(&dut)
        .reserve(test.clock.port.as_str(), "clock")
        .reserve(test.reset.port.as_str(), "reset sequencer");
    let checker = AssertionChecker::new(&dut);
    driver.validate(&test.init)?;
    for step in &test.steps {
        driver.validate(&step.drive)?;
        for (port, &value) in &step.expect {
            dut.output(port)?.literal(value)?;
        }
    }

    let mut state = RunState::Idle;
    info!("{}: Start", test.name);

    state.enter(RunState::Resetting);
    info!("{}: Reset", test.name);
    driver.apply(&test.init)?;
    reset.assert()?;
    if let Some(ticks) = test.reset.pre_clock {
        sim.advance(TimePoint::Duration(ticks)).await?;
    }
    Clock::start(&sim, &dut, &test.clock)?;
    reset.apply(test.reset.hold).await?;

    state.enter(RunState::Driving);
    info!("{}: Test project behavior", test.name);
    let mut checks = 0;
    for (index, step) in test.steps.iter().enumerate() {
        if state == RunState::Checking {
            state.enter(RunState::Driving);
        }
        driver.apply(&step.drive)?;
        sim.advance(step.hold).await?;

        state.enter(RunState::Checking);
        let at = observation_point(&sim, step.hold);
        for (port, &expected) in &step.expect {
            checks += 1;
            if let Verdict::Mismatch(failure) = checker.expect(port, expected, at, index + 1)? {
                state.enter(RunState::Failed);
                warn!("{}: {}", test.name, failure);
                return Ok(Outcome::Failed(failure));
            }
        }
    }

    state.enter(RunState::Passed);
    let summary = Summary {
        steps: test.steps.len(),
        checks,
        finished_at: sim.now(),
        cycles: sim.edges(),
        unit: sim.unit(),
    };
    info!(
        "{}: passed at {}{} after {} check(s)",
        test.name, summary.finished_at, summary.unit, checks
    );
    Ok(Outcome::Passed(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine_transitions() {
        use RunState::*;
        assert!(Idle.can_become(Resetting));
        assert!(Resetting.can_become(Driving));
        assert!(Driving.can_become(Checking));
        assert!(Checking.can_become(Driving));
        assert!(Checking.can_become(Failed));
        assert!(Driving.can_become(Passed));

        assert!(!Idle.can_become(Driving));
        assert!(!Resetting.can_become(Checking));
        assert!(!Driving.can_become(Failed));
        assert!(!Failed.can_become(Driving));
        assert!(!Passed.can_become(Resetting));
    }

    #[test]
    fn test_step_builder_keeps_order() {
        let step = Step::hold(TimePoint::EdgeCount(12))
            .drive("uio_in", 0x42)
            .drive("ui_in", 0x3E)
            .expect("uo_out", 0xDA);
        let ports: Vec<&str> = step.drive.keys().map(String::as_str).collect();
        assert_eq!(ports, vec!["uio_in", "ui_in"]);
        assert_eq!(step.expect["uo_out"], 0xDA);
    }
}
