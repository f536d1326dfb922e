//! vflashcp-core - Core engine for programming a shared MTD flash
//!
//! This crate holds the parts of vflashcp that do not depend on a particular
//! kernel interface. It is used by the `vflashcp` binary together with the
//! Linux backends (`vflashcp-linux-mtd`, `vflashcp-linux-gpio`) and is tested
//! against the in-memory emulator in `vflashcp-dummy`.
//!
//! # Flow
//!
//! 1. [`hex::convert`] turns a one-byte-per-line hex dump into a binary image
//! 2. [`bringup::FlashDeviceBringup`] routes the flash bus to the processor
//!    and reloads the flash controller driver until the device node shows up
//! 3. A [`session::FlashSession`] pairs the opened device with the image
//! 4. Either [`pipeline::EraseWriteVerifyPipeline`] (whole image) or
//!    [`diff::DiffBlockUpdater`] (changed blocks only) programs the flash
//! 5. The bus is handed back to the FPGA through a [`bus::BusArbiter`]
//!
//! # Example
//!
//! ```ignore
//! use vflashcp_core::pipeline::{EraseWriteVerifyPipeline, PipelineOptions};
//! use vflashcp_core::progress::NoProgress;
//! use vflashcp_core::{FlashSession, ImageFile};
//!
//! let mut image = ImageFile::open("firmware.hex.bin".as_ref())?;
//! let mut session = FlashSession::new(&mut device, &mut image)?;
//! EraseWriteVerifyPipeline::new(PipelineOptions::default())
//!     .run(&mut session, &mut NoProgress)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bringup;
pub mod bus;
pub mod device;
pub mod diff;
pub mod error;
pub mod geometry;
pub mod hex;
pub mod image;
pub mod pipeline;
pub mod progress;
pub mod session;

pub use bus::{BusArbiter, BusOwner};
pub use device::MtdDevice;
pub use error::{Error, Result};
pub use geometry::{DeviceInfo, EraseRegion};
pub use image::ImageFile;
pub use session::FlashSession;
