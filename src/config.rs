//! Configuration file loading
//!
//! Every key is optional; missing keys keep the built-in board defaults:
//!
//! ```toml
//! [flash]
//! device = "/dev/mtd0"
//! module = "spi_rockchip"
//!
//! [gpio]
//! root = "/sys/class/gpio"
//! reset_pin = 509
//! condition_pin = 510
//! release_lines = false
//!
//! [bringup]
//! max_attempts = 10
//! retry_delay_ms = 1000
//! settle_delay_ms = 10
//! ```

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use vflashcp_core::bringup::{FlashDeviceBringup, DEFAULT_MAX_ATTEMPTS};
use vflashcp_linux_gpio::{SysfsBusArbiter, SysfsGpio, DEFAULT_CONDITION_PIN, DEFAULT_RESET_PIN, SYSFS_GPIO_ROOT};
use vflashcp_linux_mtd::{DEFAULT_DEVICE, DEFAULT_FLASH_MODULE};

/// Configuration file read when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "/etc/vflashcp.toml";

/// Errors from loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Complete program configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub flash: FlashConfig,
    pub gpio: GpioConfig,
    pub bringup: BringupConfig,
}

/// `[flash]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlashConfig {
    /// MTD device node
    pub device: PathBuf,
    /// Kernel module of the flash controller
    pub module: String,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_DEVICE),
            module: DEFAULT_FLASH_MODULE.to_string(),
        }
    }
}

/// `[gpio]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GpioConfig {
    /// sysfs GPIO root
    pub root: PathBuf,
    /// FPGA reset line
    pub reset_pin: u32,
    /// Bus condition line
    pub condition_pin: u32,
    /// Unexport both lines once the bus has been handed over
    pub release_lines: bool,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(SYSFS_GPIO_ROOT),
            reset_pin: DEFAULT_RESET_PIN,
            condition_pin: DEFAULT_CONDITION_PIN,
            release_lines: false,
        }
    }
}

/// `[bringup]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BringupConfig {
    /// Driver reload attempts before giving up
    pub max_attempts: u32,
    /// Pause after each reload, in milliseconds
    pub retry_delay_ms: u64,
    /// Pause between closing the device and unloading the driver, in milliseconds
    pub settle_delay_ms: u64,
}

impl Default for BringupConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: 1000,
            settle_delay_ms: 10,
        }
    }
}

impl BringupConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Config {
    /// Parse configuration from TOML text; `path` is only used in errors
    pub fn from_toml_str(text: &str, path: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            source: e,
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: display.clone(),
            source: e,
        })?;
        Self::from_toml_str(&text, &display)
    }

    /// Load `explicit` if given, otherwise the default file if it exists,
    /// otherwise the built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        if default_path.is_file() {
            log::debug!("Using configuration from {}", default_path.display());
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Bus arbiter on the configured lines
    pub fn arbiter(&self) -> SysfsBusArbiter {
        SysfsBusArbiter::new(
            SysfsGpio::new(self.gpio.root.clone()),
            self.gpio.reset_pin,
            self.gpio.condition_pin,
        )
    }

    /// Bring-up state machine with the configured bound and delay
    pub fn bringup(&self) -> FlashDeviceBringup {
        FlashDeviceBringup::new()
            .with_max_attempts(self.bringup.max_attempts)
            .with_retry_delay(self.bringup.retry_delay())
    }
}
