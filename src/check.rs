use std::fmt;

use log::debug;

use crate::device::{Device, Dut};
use crate::error::Result;
use crate::signal::Literal;
use crate::time::ObservationPoint;

/// Everything needed to reproduce a failed expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// 1-based position of the step whose expectation failed.
    pub step: usize,
    pub port: String,
    pub expected: Literal,
    pub actual: Literal,
    pub at: ObservationPoint,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {}: `{}` expected {}, got {} at {}",
            self.step, self.port, self.expected, self.actual, self.at
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Match,
    Mismatch(Failure),
}

/// Samples outputs and compares them against literals.
pub struct AssertionChecker<'a, D> {
    dut: Dut<'a, D>,
}

impl<'a, D: Device> AssertionChecker<'a, D> {
    pub fn new(dut: &Dut<'a, D>) -> Self {
        Self { dut: dut.clone() }
    }

    /// Compare the current value of `port` with `expected`.
    ///
    /// Errors are configuration problems (unknown port, value wider than the
    /// port); a wrong value is a [`Verdict::Mismatch`].
    pub fn expect(
        &self,
        port: &str,
        expected: u64,
        at: ObservationPoint,
        step: usize,
    ) -> Result<Verdict> {
        let expected = self.dut.output(port)?.literal(expected)?;
        let actual = self.dut.read(port)?;
        if actual == expected {
            debug!("check {port} == {expected} at {at}: ok");
            return Ok(Verdict::Match);
        }
        debug!("check {port} == {expected} at {at}: got {actual}");
        Ok(Verdict::Mismatch(Failure {
            step,
            port: port.to_string(),
            expected,
            actual,
            at,
        }))
    }
}
