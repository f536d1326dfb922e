//! sysfs GPIO lines
//!
//! Lines are driven through the legacy `/sys/class/gpio` interface:
//! the pin number is written to `export`, after which `gpioN/direction` and
//! `gpioN/value` control the line.

use crate::error::{GpioError, Result};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Default sysfs GPIO root
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// Line level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Self::Low => "0",
            Self::High => "1",
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Self::High
        } else {
            Self::Low
        }
    }
}

/// An output line and the level to drive it to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioLine {
    /// Global GPIO number
    pub pin: u32,
    pub level: Level,
}

impl GpioLine {
    /// Output line `pin` driven to `level`
    pub fn output(pin: u32, level: Level) -> Self {
        Self { pin, level }
    }
}

fn write_attr(path: &Path, value: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).truncate(true).open(path)?;
    file.write_all(value.as_bytes())
}

/// Handle on a sysfs GPIO tree
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    root: PathBuf,
}

impl Default for SysfsGpio {
    fn default() -> Self {
        Self::new(SYSFS_GPIO_ROOT)
    }
}

impl SysfsGpio {
    /// Use the GPIO tree at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn line_attr(&self, pin: u32, attr: &str) -> PathBuf {
        self.root.join(format!("gpio{}", pin)).join(attr)
    }

    /// Export `pin` to userspace
    pub fn export(&self, pin: u32) -> Result<()> {
        let path = self.root.join("export");
        write_attr(&path, &pin.to_string()).map_err(|e| GpioError::Export {
            pin,
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Hand `pin` back to the kernel
    pub fn unexport(&self, pin: u32) -> Result<()> {
        let path = self.root.join("unexport");
        write_attr(&path, &pin.to_string()).map_err(|e| GpioError::Unexport {
            pin,
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Make `pin` an output
    ///
    /// Lines without a direction attribute have a fixed direction and are
    /// left alone.
    pub fn set_output(&self, pin: u32) -> Result<()> {
        let path = self.line_attr(pin, "direction");
        if !path.exists() {
            log::trace!("GPIO {} has no direction attribute, skipping", pin);
            return Ok(());
        }
        write_attr(&path, "out").map_err(|e| GpioError::Direction {
            pin,
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Drive `pin` to `level`
    pub fn set_value(&self, pin: u32, level: Level) -> Result<()> {
        let path = self.line_attr(pin, "value");
        write_attr(&path, level.as_str()).map_err(|e| GpioError::Value {
            pin,
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Export the line, set its direction, then its value
    ///
    /// The line may already be exported, so export and direction failures
    /// are only logged. A failed value write is returned.
    pub fn apply(&self, line: &GpioLine) -> Result<()> {
        if let Err(e) = self.export(line.pin) {
            log::debug!("{}", e);
        }
        if let Err(e) = self.set_output(line.pin) {
            log::debug!("{}", e);
        }
        self.set_value(line.pin, line.level)
    }

    /// Drive `pin` as an output at `level`
    pub fn set_line(&self, pin: u32, level: Level) -> Result<()> {
        self.apply(&GpioLine::output(pin, level))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;

    /// Build a fake sysfs tree with `export`, `unexport` and the given lines
    pub(crate) fn fake_tree(pins: &[u32]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("export"), "").unwrap();
        fs::write(dir.path().join("unexport"), "").unwrap();
        for pin in pins {
            let line = dir.path().join(format!("gpio{}", pin));
            fs::create_dir(&line).unwrap();
            fs::write(line.join("direction"), "in").unwrap();
            fs::write(line.join("value"), "0").unwrap();
        }
        dir
    }

    pub(crate) fn read_attr(root: &Path, pin: u32, attr: &str) -> String {
        fs::read_to_string(root.join(format!("gpio{}", pin)).join(attr)).unwrap()
    }

    #[test]
    fn test_set_line() {
        let dir = fake_tree(&[509]);
        let gpio = SysfsGpio::new(dir.path());

        gpio.set_line(509, Level::High).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("export")).unwrap(), "509");
        assert_eq!(read_attr(dir.path(), 509, "direction"), "out");
        assert_eq!(read_attr(dir.path(), 509, "value"), "1");

        gpio.set_line(509, Level::Low).unwrap();
        assert_eq!(read_attr(dir.path(), 509, "value"), "0");
    }

    #[test]
    fn test_missing_direction_is_skipped() {
        let dir = fake_tree(&[510]);
        fs::remove_file(dir.path().join("gpio510").join("direction")).unwrap();
        let gpio = SysfsGpio::new(dir.path());

        gpio.set_line(510, Level::High).unwrap();
        assert_eq!(read_attr(dir.path(), 510, "value"), "1");
        assert!(!dir.path().join("gpio510").join("direction").exists());
    }

    #[test]
    fn test_export_failure_is_not_fatal() {
        let dir = fake_tree(&[509]);
        fs::remove_file(dir.path().join("export")).unwrap();
        let gpio = SysfsGpio::new(dir.path());

        assert!(matches!(gpio.export(509), Err(GpioError::Export { pin: 509, .. })));
        gpio.set_line(509, Level::High).unwrap();
        assert_eq!(read_attr(dir.path(), 509, "value"), "1");
    }

    #[test]
    fn test_value_failure_is_reported() {
        let dir = fake_tree(&[]);
        let gpio = SysfsGpio::new(dir.path());

        assert!(matches!(
            gpio.set_line(509, Level::High),
            Err(GpioError::Value { pin: 509, .. })
        ));
    }

    #[test]
    fn test_unexport() {
        let dir = fake_tree(&[509]);
        let gpio = SysfsGpio::new(dir.path());

        gpio.unexport(509).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("unexport")).unwrap(), "509");
    }

    #[test]
    fn test_level_from_bool() {
        assert_eq!(Level::from(true), Level::High);
        assert_eq!(Level::from(false), Level::Low);
    }
}
