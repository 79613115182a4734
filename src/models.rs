//! Stand-in devices with the Tiny Tapeout pinout.
//!
//! These are deliberately trivial test doubles for exercising the harness
//! and for the CLI when no Verilator build is available.

use std::collections::BTreeMap;

use crate::device::Device;
use crate::signal::Port;

/// `clk`, `rst_n`, `ena`, `ui_in`, `uio_in` in; `uo_out`, `uio_out`,
/// `uio_oe` out.
pub fn tiny_tapeout_ports() -> Vec<Port> {
    vec![
        Port::input("clk", 1),
        Port::input("rst_n", 1),
        Port::input("ena", 1),
        Port::input("ui_in", 8),
        Port::input("uio_in", 8),
        Port::output("uo_out", 8),
        Port::output("uio_out", 8),
        Port::output("uio_oe", 8),
    ]
}

/// Input latches shared by the stand-ins.
#[derive(Debug, Clone, Default)]
struct Pins {
    clk: bool,
    rst_n: bool,
    ena: bool,
    ui_in: u8,
    uio_in: u8,
    last_clk: bool,
}

impl Pins {
    fn poke(&mut self, port: &str, value: u64) {
        match port {
            "clk" => self.clk = value != 0,
            "rst_n" => self.rst_n = value != 0,
            "ena" => self.ena = value != 0,
            "ui_in" => self.ui_in = value as u8,
            "uio_in" => self.uio_in = value as u8,
            _ => {}
        }
    }

    /// True once per 0→1 transition of `clk`.
    fn rising_edge(&mut self) -> bool {
        let rose = self.clk && !self.last_clk;
        self.last_clk = self.clk;
        rose
    }
}

/// The Tiny Tapeout template project: `uo_out = ui_in + uio_in`.
#[derive(Debug, Clone, Default)]
pub struct TinyTapeoutAdder {
    pins: Pins,
    uo_out: u8,
}

impl TinyTapeoutAdder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Device for TinyTapeoutAdder {
    fn ports(&self) -> Vec<Port> {
        tiny_tapeout_ports()
    }

    fn poke(&mut self, port: &str, value: u64) {
        self.pins.poke(port, value);
    }

    fn peek(&self, port: &str) -> u64 {
        match port {
            "uo_out" => u64::from(self.uo_out),
            _ => 0,
        }
    }

    fn eval(&mut self) {
        self.pins.rising_edge();
        self.uo_out = self.pins.ui_in.wrapping_add(self.pins.uio_in);
    }
}

/// Registered `acc += ui_in ^ uio_in` on every rising edge out of reset.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    pins: Pins,
    acc: u8,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Device for Accumulator {
    fn ports(&self) -> Vec<Port> {
        tiny_tapeout_ports()
    }

    fn poke(&mut self, port: &str, value: u64) {
        self.pins.poke(port, value);
    }

    fn peek(&self, port: &str) -> u64 {
        match port {
            "uo_out" => u64::from(self.acc),
            _ => 0,
        }
    }

    fn eval(&mut self) {
        if !self.pins.rising_edge() {
            return;
        }
        if !self.pins.rst_n {
            self.acc = 0;
        } else if self.pins.ena {
            self.acc = self.acc.wrapping_add(self.pins.ui_in ^ self.pins.uio_in);
        }
    }
}

/// Latches scripted `uo_out` values on given cycles.
///
/// The cycle counter restarts while reset is low and advances on every
/// rising edge with reset high. When it reaches a scripted cycle, `uo_out`
/// takes that value and keeps it until the next scripted change.
#[derive(Debug, Clone, Default)]
pub struct Scripted {
    pins: Pins,
    script: BTreeMap<u64, u8>,
    cycle: u64,
    uo_out: u8,
}

impl Scripted {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, cycle: u64, uo_out: u8) -> Self {
        self.script.insert(cycle, uo_out);
        self
    }

    /// Rising edges counted since reset was released.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }
}

impl Device for Scripted {
    fn ports(&self) -> Vec<Port> {
        tiny_tapeout_ports()
    }

    fn poke(&mut self, port: &str, value: u64) {
        self.pins.poke(port, value);
    }

    fn peek(&self, port: &str) -> u64 {
        match port {
            "uo_out" => u64::from(self.uo_out),
            _ => 0,
        }
    }

    fn eval(&mut self) {
        if !self.pins.rising_edge() {
            return;
        }
        if !self.pins.rst_n {
            self.cycle = 0;
            self.uo_out = 0;
            return;
        }
        self.cycle += 1;
        if let Some(&value) = self.script.get(&self.cycle) {
            self.uo_out = value;
        }
    }
}
