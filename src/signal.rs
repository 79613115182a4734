use std::fmt;

use crate::error::{HarnessError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// A named, fixed-width port on the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Port {
    pub name: String,
    pub width: u32,
    pub direction: Direction,
}

impl Port {
    pub fn input(name: impl Into<String>, width: u32) -> Self {
        Self::new(name, width, Direction::Input)
    }

    pub fn output(name: impl Into<String>, width: u32) -> Self {
        Self::new(name, width, Direction::Output)
    }

    fn new(name: impl Into<String>, width: u32, direction: Direction) -> Self {
        Self {
            name: name.into(),
            width,
            direction,
        }
    }

    /// Ports are 1 to 64 bits wide.
    pub fn validate(&self) -> Result<()> {
        if !(1..=64).contains(&self.width) {
            return Err(HarnessError::PortWidth {
                port: self.name.clone(),
                width: self.width,
            });
        }
        Ok(())
    }

    /// Bit mask covering the port's width.
    pub fn mask(&self) -> u64 {
        mask(self.width)
    }

    /// Build a literal for this port, rejecting values wider than the port.
    pub fn literal(&self, value: u64) -> Result<Literal> {
        if value & !self.mask() != 0 {
            return Err(HarnessError::ValueOutOfRange {
                port: self.name.clone(),
                width: self.width,
                value,
            });
        }
        Ok(Literal {
            value,
            width: self.width,
        })
    }
}

fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// A bit-vector value of known width.
///
/// Rendered as zero-padded upper-case hex (`0xDA` for an 8-bit value, `0x1`
/// for a single bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Literal {
    value: u64,
    width: u32,
}

impl Literal {
    /// Build a literal, truncating `value` to `width` bits.
    pub fn truncated(value: u64, width: u32) -> Self {
        Self {
            value: value & mask(width),
            width,
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn width(&self) -> u32 {
        self.width
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.width.div_ceil(4) as usize;
        write!(f, "0x{:0digits$X}", self.value)
    }
}
