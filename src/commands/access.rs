//! Bus hand-over without programming

use crate::config::Config;
use vflashcp_core::{BusArbiter, BusOwner};

/// Route the flash bus to `owner` and leave it there
///
/// Used by `--read_from_flash` (FPGA) and `--external_cable` (processor).
/// The MTD device and the flash driver are not touched.
pub fn run_grant(config: &Config, owner: BusOwner) {
    let mut arbiter = config.arbiter();
    arbiter.grant_access(owner);
    if config.gpio.release_lines {
        arbiter.release();
    }
    log::info!("Flash access given to the {}", owner);
}
