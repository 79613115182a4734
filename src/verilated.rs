use camino::Utf8Path;
use eyre::Result;
use marlin::{
    verilator::{VerilatorRuntime, VerilatorRuntimeOptions},
    verilog::prelude::*,
};

use crate::device::Device;
use crate::models::tiny_tapeout_ports;
use crate::signal::Port;

// The Tiny Tapeout template project, verilated.
#[verilog(src = "rtl/tt_um_example.v", name = "tt_um_example")]
pub struct TinyTapeoutTop;

pub fn create_verilator_runtime() -> Result<VerilatorRuntime> {
    let include_paths = [Utf8Path::new("rtl")];
    let src_files = [Utf8Path::new("rtl/tt_um_example.v")];

    VerilatorRuntime::new(
        Utf8Path::new("artifacts"),
        &src_files,
        &include_paths,
        [],
        VerilatorRuntimeOptions::default_logging(),
    )
    .map_err(|e| eyre::eyre!("Failed to create runtime: {}", e))
}

impl<'ctx> Device for TinyTapeoutTop<'ctx> {
    fn ports(&self) -> Vec<Port> {
        tiny_tapeout_ports()
    }

    fn poke(&mut self, port: &str, value: u64) {
        let value = value as u8;
        match port {
            "clk" => self.clk = value,
            "rst_n" => self.rst_n = value,
            "ena" => self.ena = value,
            "ui_in" => self.ui_in = value,
            "uio_in" => self.uio_in = value,
            _ => {}
        }
    }

    fn peek(&self, port: &str) -> u64 {
        let value = match port {
            "uo_out" => self.uo_out,
            "uio_out" => self.uio_out,
            "uio_oe" => self.uio_oe,
            _ => 0,
        };
        u64::from(value)
    }

    fn eval(&mut self) {
        TinyTapeoutTop::eval(self);
    }
}
