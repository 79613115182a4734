use indexmap::IndexMap;
use log::debug;

use crate::device::{Device, Dut};
use crate::error::{HarnessError, Result};

/// Port values in the order they are to be applied or checked.
pub type Vector = IndexMap<String, u64>;

/// Writes input vectors to the device. Never suspends.
pub struct StimulusDriver<'a, D> {
    dut: Dut<'a, D>,
    reserved: Vec<(String, &'static str)>,
}

impl<'a, D: Device> StimulusDriver<'a, D> {
    pub fn new(dut: &Dut<'a, D>) -> Self {
        Self {
            dut: dut.clone(),
            reserved: Vec::new(),
        }
    }

    /// Keep the driver off a port another component owns.
    pub fn reserve(mut self, port: impl Into<String>, owner: &'static str) -> Self {
        self.reserved.push((port.into(), owner));
        self
    }

    /// Check a vector without applying it.
    pub fn validate(&self, vector: &Vector) -> Result<()> {
        for (port, &value) in vector {
            if let Some((_, owner)) = self.reserved.iter().find(|(name, _)| name == port) {
                return Err(HarnessError::PortOwned {
                    port: port.clone(),
                    owner: *owner,
                });
            }
            self.dut.input(port)?.literal(value)?;
        }
        Ok(())
    }

    /// Write every port of `vector`, in order, at the current instant.
    pub fn apply(&self, vector: &Vector) -> Result<()> {
        self.validate(vector)?;
        for (port, &value) in vector {
            debug!("drive {port} = {value:#X}");
            self.dut.write(port, value)?;
        }
        Ok(())
    }
}
