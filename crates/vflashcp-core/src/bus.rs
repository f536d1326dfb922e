//! Flash bus ownership
//!
//! The flash chip sits on a bus shared by the processor and the FPGA. Two GPIO
//! lines (reset and bus-condition) decide who drives it: both low routes the
//! bus to the processor, both high to the FPGA.

use core::fmt;

/// Who drives the shared flash bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOwner {
    /// The processor running this program
    Processor,
    /// The attached FPGA
    Fpga,
}

impl BusOwner {
    /// Level written to both arbitration lines, `true` meaning high
    pub fn level(self) -> bool {
        match self {
            Self::Processor => false,
            Self::Fpga => true,
        }
    }
}

impl fmt::Display for BusOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processor => write!(f, "processor"),
            Self::Fpga => write!(f, "FPGA"),
        }
    }
}

/// Routes the flash bus
///
/// Arbitration is best effort: the hardware may already be in the requested
/// state, and bring-up retries at a higher level. Implementations log line
/// failures instead of returning them.
pub trait BusArbiter {
    /// Set the reset line, then the bus-condition line, for `owner`
    fn grant_access(&mut self, owner: BusOwner);
}

impl<T: BusArbiter + ?Sized> BusArbiter for &mut T {
    fn grant_access(&mut self, owner: BusOwner) {
        (**self).grant_access(owner)
    }
}
