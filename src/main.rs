use std::fs::File;
use std::io::{BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use eyre::{Result, WrapErr};
use tt_harness::models::{Accumulator, TinyTapeoutAdder};
use tt_harness::{Device, Harness, Outcome, TestRun};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DeviceKind {
    /// Rust model of the Tiny Tapeout template (`uo_out = ui_in + uio_in`)
    Adder,
    /// Registered accumulator stand-in
    Accumulator,
    /// The template project built with Verilator (needs the `verilator` feature)
    Verilator,
}

/// Run Tiny Tapeout style test scenarios against a device.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Scenario files (TOML)
    #[arg(required = true)]
    scenarios: Vec<Utf8PathBuf>,

    #[arg(long, value_enum, default_value = "adder")]
    device: DeviceKind,

    /// Write a VCD trace per scenario into this directory
    #[arg(long)]
    vcd: Option<Utf8PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    println!("🚀 tt-harness starting ({:?} device)", cli.device);

    let tests = cli
        .scenarios
        .iter()
        .map(|path| TestRun::load(path).wrap_err("Failed to load scenario"))
        .collect::<Result<Vec<_>>>()?;

    let failed = match cli.device {
        DeviceKind::Adder => run_all(TinyTapeoutAdder::new(), &tests, cli.vcd.as_deref())?,
        DeviceKind::Accumulator => run_all(Accumulator::new(), &tests, cli.vcd.as_deref())?,
        #[cfg(feature = "verilator")]
        DeviceKind::Verilator => {
            let runtime = tt_harness::verilated::create_verilator_runtime()?;
            let top = runtime
                .create_model_simple::<tt_harness::verilated::TinyTapeoutTop>()
                .map_err(|e| eyre::eyre!("Failed to create model: {:?}", e))?;
            run_all(top, &tests, cli.vcd.as_deref())?
        }
        #[cfg(not(feature = "verilator"))]
        DeviceKind::Verilator => {
            eyre::bail!("tt-harness was built without the `verilator` feature")
        }
    };

    if failed > 0 {
        eyre::bail!("{failed} of {} scenario(s) failed", tests.len());
    }
    println!("🎉 All scenarios passed!");
    Ok(())
}

fn run_all<D: Device>(device: D, tests: &[TestRun], vcd: Option<&Utf8Path>) -> Result<usize> {
    let mut harness = Harness::new(device);
    let mut failed = 0;
    for test in tests {
        let outcome = harness
            .run(test)
            .wrap_err_with(|| format!("Scenario `{}` aborted", test.name))?;
        match &outcome {
            Outcome::Passed(_) => println!("✅ {}: {}", test.name, outcome),
            Outcome::Failed(_) => {
                println!("❌ {}: {}", test.name, outcome);
                failed += 1;
            }
        }
        if let (Some(dir), Some(trace)) = (vcd, harness.trace()) {
            let path = dir.join(format!("{}.vcd", test.name));
            let file = File::create(&path).wrap_err_with(|| format!("Failed to create {path}"))?;
            let mut out = BufWriter::new(file);
            trace.write_vcd(&mut out)?;
            out.flush()?;
            println!("📈 Waveform written to {path}");
        }
    }
    Ok(failed)
}
