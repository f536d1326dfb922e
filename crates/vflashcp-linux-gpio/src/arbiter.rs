//! Flash bus arbitration over two GPIO lines
//!
//! The SPI flash sits behind a mux shared by the processor and the FPGA.
//! Both the FPGA reset line and the bus condition line select the owner:
//! driving both low hands the flash to the processor, driving both high
//! hands it back to the FPGA. The reset line is always driven first.

use crate::sysfs::{Level, SysfsGpio};
use vflashcp_core::{BusArbiter, BusOwner};

/// FPGA reset line
pub const DEFAULT_RESET_PIN: u32 = 509;

/// Bus condition (CONDONE) line
pub const DEFAULT_CONDITION_PIN: u32 = 510;

/// [`BusArbiter`] driving the mux through sysfs GPIO
#[derive(Debug, Clone)]
pub struct SysfsBusArbiter {
    gpio: SysfsGpio,
    reset_pin: u32,
    condition_pin: u32,
}

impl Default for SysfsBusArbiter {
    fn default() -> Self {
        Self::new(SysfsGpio::default(), DEFAULT_RESET_PIN, DEFAULT_CONDITION_PIN)
    }
}

impl SysfsBusArbiter {
    /// Create an arbiter on the given lines
    pub fn new(gpio: SysfsGpio, reset_pin: u32, condition_pin: u32) -> Self {
        Self {
            gpio,
            reset_pin,
            condition_pin,
        }
    }

    /// The reset and condition pins, in the order they are driven
    pub fn pins(&self) -> [u32; 2] {
        [self.reset_pin, self.condition_pin]
    }

    /// Unexport both lines
    ///
    /// The lines keep their last level. Failures are logged.
    pub fn release(&self) {
        for pin in self.pins() {
            if let Err(e) = self.gpio.unexport(pin) {
                log::warn!("{}", e);
            }
        }
    }
}

impl BusArbiter for SysfsBusArbiter {
    fn grant_access(&mut self, owner: BusOwner) {
        let level = Level::from(owner.level());
        log::debug!("Granting flash bus to {} (GPIO {:?} -> {:?})", owner, self.pins(), level);

        for pin in self.pins() {
            if let Err(e) = self.gpio.set_line(pin, level) {
                log::warn!("{}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sysfs::tests::{fake_tree, read_attr};
    use std::fs;

    fn arbiter(root: &std::path::Path) -> SysfsBusArbiter {
        SysfsBusArbiter::new(SysfsGpio::new(root), DEFAULT_RESET_PIN, DEFAULT_CONDITION_PIN)
    }

    #[test]
    fn test_grant_fpga_drives_both_high() {
        let dir = fake_tree(&[509, 510]);
        let mut arbiter = arbiter(dir.path());

        arbiter.grant_access(BusOwner::Fpga);
        assert_eq!(read_attr(dir.path(), 509, "value"), "1");
        assert_eq!(read_attr(dir.path(), 510, "value"), "1");
        assert_eq!(read_attr(dir.path(), 509, "direction"), "out");
        assert_eq!(read_attr(dir.path(), 510, "direction"), "out");
    }

    #[test]
    fn test_grant_processor_drives_both_low() {
        let dir = fake_tree(&[509, 510]);
        let mut arbiter = arbiter(dir.path());

        arbiter.grant_access(BusOwner::Fpga);
        arbiter.grant_access(BusOwner::Processor);
        assert_eq!(read_attr(dir.path(), 509, "value"), "0");
        assert_eq!(read_attr(dir.path(), 510, "value"), "0");
    }

    #[test]
    fn test_reset_line_driven_first() {
        let dir = fake_tree(&[509, 510]);
        let mut arbiter = arbiter(dir.path());

        arbiter.grant_access(BusOwner::Fpga);
        // The export file keeps only the last write
        assert_eq!(fs::read_to_string(dir.path().join("export")).unwrap(), "510");
        assert_eq!(arbiter.pins(), [509, 510]);
    }

    #[test]
    fn test_missing_line_is_not_fatal() {
        let dir = fake_tree(&[509]);
        let mut arbiter = arbiter(dir.path());

        arbiter.grant_access(BusOwner::Fpga);
        assert_eq!(read_attr(dir.path(), 509, "value"), "1");
        assert!(!dir.path().join("gpio510").exists());
    }

    #[test]
    fn test_release_unexports() {
        let dir = fake_tree(&[509, 510]);
        let arbiter = arbiter(dir.path());

        arbiter.release();
        assert_eq!(fs::read_to_string(dir.path().join("unexport")).unwrap(), "510");
    }
}
