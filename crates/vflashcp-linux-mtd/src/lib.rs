//! vflashcp-linux-mtd - Linux MTD (Memory Technology Device) support
//!
//! This crate provides access to raw flash through the Linux MTD subsystem.
//! MTD devices are exposed at `/dev/mtdN`; the kernel handles the flash
//! protocol and timing while we read, write and erase through the character
//! device and its ioctls.
//!
//! It also controls the kernel module of the flash controller, which
//! vflashcp reloads during bring-up until the MTD node appears.
//!
//! # Example
//!
//! ```ignore
//! use vflashcp_linux_mtd::LinuxMtd;
//! use vflashcp_core::MtdDevice;
//!
//! let mtd = LinuxMtd::open("/dev/mtd0".as_ref())?;
//! let info = mtd.info();
//! println!("Size: {} bytes", info.size);
//! println!("Erase size: {} bytes", info.erase_size);
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with MTD support (`CONFIG_MTD`, `CONFIG_MTD_CHAR`)
//! - Read/write access to `/dev/mtdN`
//! - Root for module unload/load
//!
//! # Device Discovery
//!
//! ```bash
//! cat /proc/mtd
//! cat /sys/class/mtd/mtd0/erasesize
//! ```

pub mod device;
pub mod error;
pub mod kmod;

// Re-exports
pub use device::{LinuxMtd, MtdFlags, MtdType, DEFAULT_DEVICE};
pub use error::{LinuxMtdError, Result};
pub use kmod::{is_privileged, KernelModule, DEFAULT_FLASH_MODULE};
