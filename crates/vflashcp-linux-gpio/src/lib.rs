//! vflashcp-linux-gpio - flash bus arbitration via Linux sysfs GPIO
//!
//! On the target board the SPI flash is wired through a mux that either the
//! processor or the FPGA controls. Two GPIO lines, the FPGA reset line and
//! the bus condition line, pick the side:
//!
//! | Owner     | reset (509) | condition (510) |
//! |-----------|-------------|-----------------|
//! | Processor | 0           | 0               |
//! | FPGA      | 1           | 1               |
//!
//! The lines are driven through the sysfs interface at `/sys/class/gpio`.
//! GPIO failures are reported but never abort an update; the flash device
//! operations that follow will fail loudly if the bus was not granted.
//!
//! # Example
//!
//! ```no_run
//! use vflashcp_core::{BusArbiter, BusOwner};
//! use vflashcp_linux_gpio::SysfsBusArbiter;
//!
//! let mut arbiter = SysfsBusArbiter::default();
//! arbiter.grant_access(BusOwner::Processor);
//! // ... program the flash ...
//! arbiter.grant_access(BusOwner::Fpga);
//! ```

pub mod arbiter;
pub mod error;
pub mod sysfs;

pub use arbiter::{SysfsBusArbiter, DEFAULT_CONDITION_PIN, DEFAULT_RESET_PIN};
pub use error::{GpioError, Result};
pub use sysfs::{GpioLine, Level, SysfsGpio, SYSFS_GPIO_ROOT};
