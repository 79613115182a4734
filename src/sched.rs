//! Single-threaded simulated-time executor.
//!
//! Tasks are plain Rust futures. They only ever suspend inside the time base
//! ([`Sim::advance`](crate::Sim::advance)), which registers a wake-up on the
//! queue below and parks the task. The executor pops wake-ups in
//! `(time, region, seq)` order, moves the cursor forward, and polls the task
//! again. No wakers, threads, or locks are involved: a task is runnable
//! exactly when its queue entry is popped.
//!
//! Within one instant every [`Region::Drive`] wake-up (the clock, and the
//! device evaluation it triggers) runs before any [`Region::Observe`] wake-up
//! (the test sequence). Inside a region, tasks resume in the order their
//! waits were registered.

use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};

use log::{debug, trace};

use crate::error::{HarnessError, Result};
use crate::signal::{Literal, Port};
use crate::time::{SimTime, TimeUnit};
use crate::trace::{Trace, TraceEvent, TraceKind};

type LocalTask<'a> = Pin<Box<dyn Future<Output = ()> + 'a>>;

/// Ordering class of a wake-up within one simulated instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    Drive,
    Observe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Wakeup {
    at: SimTime,
    region: Region,
    seq: u64,
    task: TaskId,
}

#[derive(Debug)]
struct EdgeWaiter {
    remaining: u64,
    /// Edges at this instant happened before the wait and do not count.
    since: SimTime,
    region: Region,
    seq: u64,
    task: TaskId,
}

pub(crate) struct Kernel<'a> {
    now: SimTime,
    unit: TimeUnit,
    edges: u64,
    clock: Option<String>,
    seq: u64,
    next_task: usize,
    queue: BinaryHeap<Reverse<Wakeup>>,
    edge_waiters: Vec<EdgeWaiter>,
    current: Option<(TaskId, Region)>,
    parked: bool,
    spawned: Vec<(TaskId, LocalTask<'a>)>,
    fault: Option<HarnessError>,
    trace: Trace,
}

impl<'a> Kernel<'a> {
    fn new(unit: TimeUnit) -> Self {
        Self {
            now: SimTime::ZERO,
            unit,
            edges: 0,
            clock: None,
            seq: 0,
            next_task: 0,
            queue: BinaryHeap::new(),
            edge_waiters: Vec::new(),
            current: None,
            parked: false,
            spawned: Vec::new(),
            fault: None,
            trace: Trace::new(unit),
        }
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    fn current(&self) -> Result<(TaskId, Region)> {
        self.current.ok_or(HarnessError::ForeignSuspension)
    }
}

/// Cheap, cloneable handle onto the running simulation.
#[derive(Clone)]
pub struct Sim<'a> {
    kernel: Rc<RefCell<Kernel<'a>>>,
}

impl<'a> Sim<'a> {
    pub fn now(&self) -> SimTime {
        self.kernel.borrow().now
    }

    /// Rising edges produced by the clock so far.
    pub fn edges(&self) -> u64 {
        self.kernel.borrow().edges
    }

    pub fn unit(&self) -> TimeUnit {
        self.kernel.borrow().unit
    }

    pub fn clock_running(&self) -> bool {
        self.kernel.borrow().clock.is_some()
    }

    /// Start a task. Its first poll happens at the current instant, in
    /// `region`, after everything already queued for this instant and region.
    pub fn spawn<F>(&self, region: Region, future: F) -> TaskId
    where
        F: Future<Output = ()> + 'a,
    {
        let mut kernel = self.kernel.borrow_mut();
        let task = TaskId(kernel.next_task);
        kernel.next_task += 1;
        let wakeup = Wakeup {
            at: kernel.now,
            region,
            seq: kernel.next_seq(),
            task,
        };
        kernel.queue.push(Reverse(wakeup));
        kernel.spawned.push((task, Box::pin(future)));
        trace!("spawned task {:?} in {:?} at t={}", task, region, kernel.now);
        task
    }

    /// Park the current task until the cursor reaches `at`.
    pub(crate) fn park_until(&self, at: SimTime) -> Result<()> {
        let mut kernel = self.kernel.borrow_mut();
        let (task, region) = kernel.current()?;
        let seq = kernel.next_seq();
        kernel.queue.push(Reverse(Wakeup {
            at,
            region,
            seq,
            task,
        }));
        kernel.parked = true;
        Ok(())
    }

    /// Park the current task until `cycles` rising edges have happened after
    /// the current instant.
    pub(crate) fn park_until_edge(&self, cycles: u64) -> Result<()> {
        let mut kernel = self.kernel.borrow_mut();
        let (task, region) = kernel.current()?;
        let seq = kernel.next_seq();
        let since = kernel.now;
        kernel.edge_waiters.push(EdgeWaiter {
            remaining: cycles,
            since,
            region,
            seq,
            task,
        });
        kernel.parked = true;
        Ok(())
    }

    /// Register the run's single clock.
    pub(crate) fn claim_clock(&self, port: &str) -> Result<()> {
        let mut kernel = self.kernel.borrow_mut();
        if let Some(existing) = &kernel.clock {
            return Err(HarnessError::DuplicateClock {
                port: existing.clone(),
            });
        }
        kernel.clock = Some(port.to_string());
        Ok(())
    }

    /// Count a rising edge and release the edge waiters it satisfies. They
    /// resume at this instant, in their own region, in registration order.
    ///
    /// A waiter registered at this same instant (the clock's first high phase
    /// lands on the instant it is started) does not see this edge.
    pub(crate) fn rising_edge(&self) {
        let mut kernel = self.kernel.borrow_mut();
        kernel.edges += 1;
        let now = kernel.now;

        let mut ready = Vec::new();
        kernel.edge_waiters.retain_mut(|waiter| {
            if waiter.since < now {
                waiter.remaining -= 1;
            }
            if waiter.remaining > 0 {
                return true;
            }
            ready.push(Wakeup {
                at: now,
                region: waiter.region,
                seq: waiter.seq,
                task: waiter.task,
            });
            false
        });
        for wakeup in ready {
            kernel.queue.push(Reverse(wakeup));
        }
    }

    /// Report a fatal error from a task that cannot return one.
    pub(crate) fn fault(&self, error: HarnessError) {
        let mut kernel = self.kernel.borrow_mut();
        if kernel.fault.is_none() {
            kernel.fault = Some(error);
        }
    }

    pub(crate) fn record(&self, port: &str, value: Literal, kind: TraceKind) {
        let mut kernel = self.kernel.borrow_mut();
        let port = kernel.trace.intern(port);
        let event = TraceEvent {
            time: kernel.now,
            cycle: kernel.edges,
            port,
            value,
            kind,
        };
        kernel.trace.push(event);
    }

    pub(crate) fn declare_ports(&self, ports: &[Port]) {
        self.kernel.borrow_mut().trace.declare(ports);
    }

    /// Snapshot of everything recorded so far.
    pub fn trace(&self) -> Trace {
        self.kernel.borrow().trace.clone()
    }
}

struct NoopWake;

impl Wake for NoopWake {
    fn wake(self: Arc<Self>) {}
}

/// Owns the tasks and runs the event loop.
pub struct Executor<'a> {
    sim: Sim<'a>,
    tasks: Vec<Option<LocalTask<'a>>>,
    waker: Waker,
}

impl<'a> Executor<'a> {
    pub fn new(unit: TimeUnit) -> Self {
        Self {
            sim: Sim {
                kernel: Rc::new(RefCell::new(Kernel::new(unit))),
            },
            tasks: Vec::new(),
            waker: Waker::from(Arc::new(NoopWake)),
        }
    }

    pub fn handle(&self) -> Sim<'a> {
        self.sim.clone()
    }

    /// Run `main` to completion, then cancel every task still pending (the
    /// clock, typically).
    pub fn block_on<T, F>(&mut self, main: F) -> Result<T>
    where
        T: 'a,
        F: Future<Output = T> + 'a,
    {
        let slot = Rc::new(RefCell::new(None));
        let out = Rc::clone(&slot);
        self.sim.spawn(Region::Observe, async move {
            let value = main.await;
            *out.borrow_mut() = Some(value);
        });

        let result = self.run_until(&slot);
        self.cancel_all();
        result
    }

    fn run_until<T>(&mut self, slot: &RefCell<Option<T>>) -> Result<T> {
        let waker = self.waker.clone();
        let mut cx = Context::from_waker(&waker);
        loop {
            self.adopt_spawned();
            if let Some(value) = slot.borrow_mut().take() {
                return Ok(value);
            }

            let wakeup = {
                let mut kernel = self.sim.kernel.borrow_mut();
                if let Some(fault) = kernel.fault.take() {
                    return Err(fault);
                }
                let Some(Reverse(wakeup)) = kernel.queue.pop() else {
                    return Err(HarnessError::Stalled {
                        at: kernel.now.ticks(),
                    });
                };
                if wakeup.at < kernel.now {
                    return Err(HarnessError::TimelineViolation {
                        now: kernel.now.ticks(),
                        requested: wakeup.at.ticks(),
                    });
                }
                kernel.now = wakeup.at;
                kernel.current = Some((wakeup.task, wakeup.region));
                kernel.parked = false;
                wakeup
            };

            let Some(mut task) = self.tasks.get_mut(wakeup.task.0).and_then(Option::take) else {
                continue;
            };
            trace!(
                "t={} {:?}: polling task {:?}",
                wakeup.at,
                wakeup.region,
                wakeup.task
            );
            let poll = task.as_mut().poll(&mut cx);

            let parked = {
                let mut kernel = self.sim.kernel.borrow_mut();
                kernel.current = None;
                kernel.parked
            };
            match poll {
                Poll::Ready(()) => trace!("task {:?} finished", wakeup.task),
                Poll::Pending if parked => self.tasks[wakeup.task.0] = Some(task),
                Poll::Pending => return Err(HarnessError::ForeignSuspension),
            }
        }
    }

    fn adopt_spawned(&mut self) {
        let spawned = std::mem::take(&mut self.sim.kernel.borrow_mut().spawned);
        for (TaskId(index), task) in spawned {
            if self.tasks.len() <= index {
                self.tasks.resize_with(index + 1, || None);
            }
            self.tasks[index] = Some(task);
        }
    }

    fn cancel_all(&mut self) {
        // Tasks hold `Sim` handles, so they must go before the kernel's own
        // references to them for the `Rc` cycle to break.
        let pending = self.tasks.iter().filter(|t| t.is_some()).count();
        if pending > 0 {
            debug!("cancelling {pending} outstanding task(s)");
        }
        self.tasks.clear();
        let mut kernel = self.sim.kernel.borrow_mut();
        kernel.spawned.clear();
        kernel.queue.clear();
        kernel.edge_waiters.clear();
    }
}
