//! Flash device bring-up
//!
//! The MTD node only exists while the flash controller driver has probed the
//! chip, and the driver can only probe it while the processor owns the bus.
//! Bring-up therefore loops:
//!
//! ```text
//! Checking --present--> Ready
//!    |
//!    +--absent--> GrantProcessorAccess -> UnloadModule -> ReloadModule -> Wait -> Checking
//! ```
//!
//! bounded by a number of attempts. Running out of attempts is fatal.

use crate::bus::{BusArbiter, BusOwner};
use crate::error::{Error, Result};
use core::fmt;
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Attempts before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Pause between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Control over the kernel driver of the flash controller
///
/// All operations are best effort; bring-up logs failures and keeps going.
pub trait DriverControl {
    /// Error reported by unload/load
    type Error: fmt::Display;

    /// Whether the driver module is currently loaded
    fn is_loaded(&mut self) -> bool;

    /// Unload the driver module
    fn unload(&mut self) -> core::result::Result<(), Self::Error>;

    /// Load the driver module
    fn load(&mut self) -> core::result::Result<(), Self::Error>;
}

/// States of the bring-up loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BringupState {
    /// Looking for the device node
    Checking,
    /// Routing the bus to the processor
    GrantProcessorAccess,
    /// Removing a stale driver instance
    UnloadModule,
    /// Loading the driver so it probes the chip
    ReloadModule,
    /// Giving the driver time to create the node
    Wait,
    /// The device node exists
    Ready,
}

/// Result of a successful bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BringupReport {
    /// Reload cycles needed before the device appeared (0 if it was already there)
    pub attempts: u32,
}

/// Bring-up state machine
#[derive(Debug, Clone)]
pub struct FlashDeviceBringup {
    max_attempts: u32,
    retry_delay: Duration,
}

impl Default for FlashDeviceBringup {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl FlashDeviceBringup {
    /// Create a bring-up with the default bound and delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of reload attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the pause after each reload
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Make sure `device` exists, reloading the driver as needed
    ///
    /// `privileged` must be true; GPIO and module control need root.
    pub fn run<A, K>(
        &self,
        device: &Path,
        privileged: bool,
        arbiter: &mut A,
        driver: &mut K,
    ) -> Result<BringupReport>
    where
        A: BusArbiter + ?Sized,
        K: DriverControl + ?Sized,
    {
        if !privileged {
            return Err(Error::PermissionDenied);
        }

        let mut attempts = 0u32;
        let mut state = BringupState::Checking;

        loop {
            log::trace!("bring-up: {:?} (attempt {})", state, attempts);

            state = match state {
                BringupState::Checking => {
                    if device.exists() {
                        BringupState::Ready
                    } else if attempts >= self.max_attempts {
                        return Err(Error::BringupExhausted {
                            device: device.display().to_string(),
                            attempts,
                        });
                    } else {
                        attempts += 1;
                        log::info!(
                            "{} not available, reloading flash driver ({}/{})",
                            device.display(),
                            attempts,
                            self.max_attempts
                        );
                        BringupState::GrantProcessorAccess
                    }
                }
                BringupState::GrantProcessorAccess => {
                    arbiter.grant_access(BusOwner::Processor);
                    BringupState::UnloadModule
                }
                BringupState::UnloadModule => {
                    if driver.is_loaded() {
                        if let Err(e) = driver.unload() {
                            log::warn!("Failed to unload flash driver: {}", e);
                        }
                    }
                    BringupState::ReloadModule
                }
                BringupState::ReloadModule => {
                    if let Err(e) = driver.load() {
                        log::warn!("Failed to load flash driver: {}", e);
                    }
                    BringupState::Wait
                }
                BringupState::Wait => {
                    thread::sleep(self.retry_delay);
                    BringupState::Checking
                }
                BringupState::Ready => {
                    log::debug!("{} is available", device.display());
                    return Ok(BringupReport { attempts });
                }
            };
        }
    }
}
