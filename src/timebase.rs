//! The one suspension primitive: wait for a [`TimePoint`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::{HarnessError, Result};
use crate::sched::Sim;
use crate::time::{SimTime, TimePoint};

impl<'a> Sim<'a> {
    /// Suspend the calling task until `point` is reached.
    ///
    /// The origin is always the current cursor. `EdgeCount(n)` completes on
    /// the n-th rising edge after the current instant, so a wait issued as
    /// the clock starts ends one full period later, like the matching
    /// `Duration`; `Duration(t)` completes `t` ticks from
    /// now whether or not the clock is running. A zero point returns at once
    /// without yielding to other tasks.
    pub async fn advance(&self, point: TimePoint) -> Result<()> {
        match point {
            TimePoint::EdgeCount(0) | TimePoint::Duration(0) => Ok(()),
            TimePoint::EdgeCount(cycles) => {
                if !self.clock_running() {
                    return Err(HarnessError::NoClock { cycles });
                }
                Suspend::new(self, Until::Edges(cycles)).await
            }
            TimePoint::Duration(ticks) => {
                let now = self.now();
                let deadline = now
                    .checked_add(ticks)
                    .ok_or(HarnessError::TimelineViolation {
                        now: now.ticks(),
                        requested: u64::MAX,
                    })?;
                Suspend::new(self, Until::Time(deadline)).await
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Until {
    Time(SimTime),
    Edges(u64),
}

struct Suspend<'s, 'a> {
    sim: &'s Sim<'a>,
    until: Until,
    parked: bool,
}

impl<'s, 'a> Suspend<'s, 'a> {
    fn new(sim: &'s Sim<'a>, until: Until) -> Self {
        Self {
            sim,
            until,
            parked: false,
        }
    }

    fn reached(&self) -> bool {
        match self.until {
            Until::Time(deadline) => self.sim.now() >= deadline,
            // Edge waiters are only queued once their count has run out.
            Until::Edges(_) => true,
        }
    }
}

impl Future for Suspend<'_, '_> {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.parked && self.reached() {
            return Poll::Ready(Ok(()));
        }
        let parked = match self.until {
            Until::Time(deadline) => self.sim.park_until(deadline),
            Until::Edges(cycles) => self.sim.park_until_edge(cycles),
        };
        match parked {
            Ok(()) => {
                self.parked = true;
                Poll::Pending
            }
            Err(err) => Poll::Ready(Err(err)),
        }
    }
}
