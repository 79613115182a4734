//! The device under test, and the checked handle the harness drives it
//! through.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{HarnessError, Result};
use crate::sched::Sim;
use crate::signal::{Direction, Literal, Port};
use crate::trace::TraceKind;

/// A synchronous circuit the harness can poke and peek.
///
/// Implementations only need to handle the names they list in
/// [`ports`](Device::ports); [`Dut`] rejects anything else before it gets
/// here. `eval` settles the device after inputs change, and is where a
/// clocked device notices its clock edges.
pub trait Device {
    fn ports(&self) -> Vec<Port>;

    fn poke(&mut self, port: &str, value: u64);

    fn peek(&self, port: &str) -> u64;

    fn eval(&mut self);
}

impl<D: Device + ?Sized> Device for &mut D {
    fn ports(&self) -> Vec<Port> {
        (**self).ports()
    }

    fn poke(&mut self, port: &str, value: u64) {
        (**self).poke(port, value)
    }

    fn peek(&self, port: &str) -> u64 {
        (**self).peek(port)
    }

    fn eval(&mut self) {
        (**self).eval()
    }
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn ports(&self) -> Vec<Port> {
        (**self).ports()
    }

    fn poke(&mut self, port: &str, value: u64) {
        (**self).poke(port, value)
    }

    fn peek(&self, port: &str) -> u64 {
        (**self).peek(port)
    }

    fn eval(&mut self) {
        (**self).eval()
    }
}

/// Shared, validated access to the device for every task of a simulation.
///
/// Every write is checked against the port list, applied, evaluated and
/// recorded in the trace at the current simulated time.
pub struct Dut<'a, D> {
    device: Rc<RefCell<D>>,
    ports: Rc<HashMap<String, Port>>,
    sim: Sim<'a>,
}

impl<D> Clone for Dut<'_, D> {
    fn clone(&self) -> Self {
        Self {
            device: Rc::clone(&self.device),
            ports: Rc::clone(&self.ports),
            sim: self.sim.clone(),
        }
    }
}

impl<'a, D: Device> Dut<'a, D> {
    /// Wrap `device`, checking the ports it reports.
    pub fn new(sim: &Sim<'a>, device: D) -> Result<Self> {
        let ports = device.ports();
        for port in &ports {
            port.validate()?;
        }
        sim.declare_ports(&ports);
        Ok(Self {
            ports: Rc::new(ports.into_iter().map(|p| (p.name.clone(), p)).collect()),
            device: Rc::new(RefCell::new(device)),
            sim: sim.clone(),
        })
    }

    pub fn port(&self, name: &str) -> Result<&Port> {
        self.ports
            .get(name)
            .ok_or_else(|| HarnessError::UnknownPort(name.to_string()))
    }

    /// Look up a port the harness is going to write.
    pub fn input(&self, name: &str) -> Result<&Port> {
        self.port_with(name, Direction::Input, "driven")
    }

    /// Look up a port the harness is going to sample.
    pub fn output(&self, name: &str) -> Result<&Port> {
        self.port_with(name, Direction::Output, "sampled")
    }

    fn port_with(&self, name: &str, direction: Direction, action: &'static str) -> Result<&Port> {
        let port = self.port(name)?;
        if port.direction != direction {
            return Err(HarnessError::WrongDirection {
                port: name.to_string(),
                direction: port.direction,
                action,
            });
        }
        Ok(port)
    }

    /// Write an input and let the device settle.
    pub fn write(&self, name: &str, value: u64) -> Result<()> {
        let literal = self.input(name)?.literal(value)?;
        {
            let mut device = self.device.borrow_mut();
            device.poke(name, value);
            device.eval();
        }
        self.sim.record(name, literal, TraceKind::Drive);
        Ok(())
    }

    /// Sample an output as it stands at the current instant.
    pub fn read(&self, name: &str) -> Result<Literal> {
        let width = self.output(name)?.width;
        let literal = Literal::truncated(self.device.borrow().peek(name), width);
        self.sim.record(name, literal, TraceKind::Sample);
        Ok(literal)
    }
}
