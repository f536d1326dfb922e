//! Flash controller driver control
//!
//! The MTD node is created by the SPI controller driver when it probes the
//! flash. Reloading the module forces a new probe after the bus has been
//! routed to the processor.

use crate::error::{LinuxMtdError, Result};
use nix::kmod::{delete_module, DeleteModuleFlags};
use std::ffi::CString;
use std::process::Command;
use vflashcp_core::bringup::DriverControl;

/// Driver of the SPI controller the flash hangs off
pub const DEFAULT_FLASH_MODULE: &str = "spi_rockchip";

/// Whether the process may drive GPIOs and load modules
pub fn is_privileged() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Kernel module names treat `-` and `_` as the same character
fn normalize(name: &str) -> String {
    name.replace('-', "_")
}

/// Whether `name` appears in the first column of `lsmod` output
pub fn module_listed(lsmod_output: &str, name: &str) -> bool {
    let wanted = normalize(name);
    lsmod_output
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .any(|module| normalize(module) == wanted)
}

/// A loadable kernel module
#[derive(Debug, Clone)]
pub struct KernelModule {
    name: String,
}

impl KernelModule {
    /// Refer to the module called `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Remove the module from the kernel
    pub fn unload(&self) -> Result<()> {
        let cname = CString::new(self.name.as_str())
            .map_err(|_| LinuxMtdError::InvalidModuleName(self.name.clone()))?;

        delete_module(&cname, DeleteModuleFlags::O_TRUNC).map_err(|e| LinuxMtdError::ModuleUnload {
            name: self.name.clone(),
            source: e,
        })?;

        log::debug!("Unloaded kernel module {}", self.name);
        Ok(())
    }

    /// Load the module with modprobe
    pub fn load(&self) -> Result<()> {
        let status = Command::new("modprobe")
            .arg(&self.name)
            .status()
            .map_err(|e| LinuxMtdError::ModuleLoad {
                name: self.name.clone(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(LinuxMtdError::ModuleLoad {
                name: self.name.clone(),
                reason: format!("modprobe exited with {}", status),
            });
        }

        log::debug!("Loaded kernel module {}", self.name);
        Ok(())
    }

    /// Whether `lsmod` lists the module
    ///
    /// A failure to run `lsmod` is logged and reported as not loaded.
    pub fn is_loaded(&self) -> bool {
        match Command::new("lsmod").output() {
            Ok(output) => module_listed(&String::from_utf8_lossy(&output.stdout), &self.name),
            Err(e) => {
                log::warn!("Failed to run lsmod: {}", e);
                false
            }
        }
    }
}

impl DriverControl for KernelModule {
    type Error = LinuxMtdError;

    fn is_loaded(&mut self) -> bool {
        KernelModule::is_loaded(self)
    }

    fn unload(&mut self) -> Result<()> {
        KernelModule::unload(self)
    }

    fn load(&mut self) -> Result<()> {
        KernelModule::load(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSMOD: &str = "\
Module                  Size  Used by
spi_rockchip           24576  0
spidev                 20480  0
rockchip_saradc        16384  0
";

    #[test]
    fn test_module_listed() {
        assert!(module_listed(LSMOD, "spi_rockchip"));
        assert!(module_listed(LSMOD, "spi-rockchip"));
        assert!(module_listed(LSMOD, "spidev"));
        assert!(!module_listed(LSMOD, "spi"));
        assert!(!module_listed(LSMOD, "rockchip"));
        // The header line is not a module
        assert!(!module_listed(LSMOD, "Module"));
    }

    #[test]
    fn test_module_listed_empty() {
        assert!(!module_listed("", "spi_rockchip"));
    }

    #[test]
    fn test_invalid_module_name() {
        let module = KernelModule::new("spi\0rockchip");
        assert!(matches!(
            module.unload(),
            Err(LinuxMtdError::InvalidModuleName(_))
        ));
    }
}
