//! Record of everything the harness drove into or read out of the device.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;

use crate::signal::{Literal, Port};
use crate::time::{SimTime, TimeUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceKind {
    /// The harness wrote the port.
    Drive,
    /// The assertion checker read the port.
    Sample,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    pub time: SimTime,
    /// Rising edges seen when the event happened.
    pub cycle: u64,
    /// Shared with every other event on the same port.
    pub port: Arc<str>,
    pub value: Literal,
    pub kind: TraceKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    unit: TimeUnit,
    ports: Vec<Port>,
    names: HashMap<String, Arc<str>>,
    events: Vec<TraceEvent>,
}

impl Trace {
    pub fn new(unit: TimeUnit) -> Self {
        Self {
            unit,
            ports: Vec::new(),
            names: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub(crate) fn declare(&mut self, ports: &[Port]) {
        for port in ports {
            if !self.ports.iter().any(|p| p.name == port.name) {
                self.ports.push(port.clone());
            }
            self.intern(&port.name);
        }
    }

    /// The shared name for `port`, allocated on first use only.
    pub(crate) fn intern(&mut self, port: &str) -> Arc<str> {
        if let Some(name) = self.names.get(port) {
            return Arc::clone(name);
        }
        let name: Arc<str> = Arc::from(port);
        self.names.insert(port.to_string(), Arc::clone(&name));
        name
    }

    pub(crate) fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Events touching one port, in the order they happened.
    pub fn port<'t>(&'t self, name: &'t str) -> impl Iterator<Item = &'t TraceEvent> + 't {
        self.events.iter().filter(move |e| &*e.port == name)
    }

    pub fn drives<'t>(&'t self, name: &'t str) -> impl Iterator<Item = &'t TraceEvent> + 't {
        self.port(name).filter(|e| e.kind == TraceKind::Drive)
    }

    /// Dump the trace as a Value Change Dump.
    pub fn write_vcd<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let ids: HashMap<&str, String> = self
            .ports
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.as_str(), vcd_id(i)))
            .collect();

        writeln!(out, "$timescale 1{} $end", self.unit)?;
        writeln!(out, "$scope module dut $end")?;
        for port in &self.ports {
            writeln!(
                out,
                "$var wire {} {} {} $end",
                port.width, ids[port.name.as_str()], port.name
            )?;
        }
        writeln!(out, "$upscope $end")?;
        writeln!(out, "$enddefinitions $end")?;

        let mut last: HashMap<&str, Literal> = HashMap::new();
        let mut stamp = None;
        for event in &self.events {
            let port = &*event.port;
            let Some(id) = ids.get(port) else {
                continue;
            };
            if last.get(port) == Some(&event.value) {
                continue;
            }
            last.insert(port, event.value);

            if stamp != Some(event.time) {
                writeln!(out, "#{}", event.time)?;
                stamp = Some(event.time);
            }
            if event.value.width() == 1 {
                writeln!(out, "{}{}", event.value.value(), id)?;
            } else {
                writeln!(
                    out,
                    "b{:0width$b} {}",
                    event.value.value(),
                    id,
                    width = event.value.width() as usize
                )?;
            }
        }
        Ok(())
    }
}

// Identifier codes are drawn from the printable range `!`..=`~`.
fn vcd_id(mut index: usize) -> String {
    const BASE: usize = 94;
    let mut id = String::new();
    loop {
        id.push((b'!' + (index % BASE) as u8) as char);
        index /= BASE;
        if index == 0 {
            break id;
        }
        index -= 1;
    }
}
