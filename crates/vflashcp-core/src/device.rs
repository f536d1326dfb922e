//! MTD device trait
//!
//! The pipelines drive a device through its cursor (`Read`/`Write`/`Seek`)
//! plus the two operations a plain file does not have: geometry and erase.

use crate::geometry::{DeviceInfo, EraseRegion};
use std::io::{self, Read, Seek, Write};

/// A raw flash device with a read/write cursor
///
/// Implemented by `LinuxMtd` for `/dev/mtdN` nodes and by the in-memory
/// emulator used in tests.
pub trait MtdDevice: Read + Write + Seek {
    /// Geometry read when the device was opened
    fn info(&self) -> DeviceInfo;

    /// Path used in error messages
    fn path(&self) -> &str;

    /// Erase `region`, which must be erase-block aligned
    ///
    /// Does not move the cursor.
    fn erase(&mut self, region: EraseRegion) -> io::Result<()>;
}

impl<T: MtdDevice + ?Sized> MtdDevice for &mut T {
    fn info(&self) -> DeviceInfo {
        (**self).info()
    }

    fn path(&self) -> &str {
        (**self).path()
    }

    fn erase(&mut self, region: EraseRegion) -> io::Result<()> {
        (**self).erase(region)
    }
}
