//! Linux MTD device implementation

use crate::error::{LinuxMtdError, Result};
use bitflags::bitflags;
use log::{debug, info};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use vflashcp_core::{DeviceInfo, EraseRegion, MtdDevice};

/// Default device node
pub const DEFAULT_DEVICE: &str = "/dev/mtd0";

bitflags! {
    /// MTD flags from kernel headers
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MtdFlags: u32 {
        /// MTD device is writable
        const WRITEABLE = 0x400;
        /// MTD device doesn't require erase
        const NO_ERASE = 0x1000;
    }
}

/// MTD device type from kernel headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MtdType {
    Absent,
    Ram,
    Rom,
    NorFlash,
    NandFlash,
    DataFlash,
    UbiVolume,
    MlcNandFlash,
    Unknown(u8),
}

impl From<u8> for MtdType {
    fn from(raw: u8) -> Self {
        match raw {
            0 => Self::Absent,
            1 => Self::Ram,
            2 => Self::Rom,
            3 => Self::NorFlash,
            4 => Self::NandFlash,
            6 => Self::DataFlash,
            7 => Self::UbiVolume,
            8 => Self::MlcNandFlash,
            other => Self::Unknown(other),
        }
    }
}

/// MEMGETINFO ioctl argument structure
/// Matches struct mtd_info_user from mtd/mtd-user.h
#[repr(C)]
#[derive(Debug, Default)]
#[allow(dead_code)]
struct MtdInfoUser {
    mtd_type: u8,
    flags: u32,
    size: u32,
    erasesize: u32,
    writesize: u32,
    oobsize: u32,
    padding: u64,
}

/// MEMERASE ioctl argument structure
/// Matches struct erase_info_user from mtd/mtd-user.h
#[repr(C)]
struct EraseInfo {
    start: u32,
    length: u32,
}

// MEMGETINFO = _IOR('M', 1, struct mtd_info_user)
nix::ioctl_read!(memgetinfo, b'M', 1, MtdInfoUser);
// MEMERASE = _IOW('M', 2, struct erase_info_user)
nix::ioctl_write_ptr!(memerase, b'M', 2, EraseInfo);

/// Linux MTD device handle
///
/// Wraps `/dev/mtdN` opened with `O_SYNC`. Reads, writes and seeks go
/// straight to the character device; erase uses the `MEMERASE` ioctl.
pub struct LinuxMtd {
    /// Device file handle
    file: File,
    /// Device node path
    path: String,
    /// Geometry from MEMGETINFO
    info: DeviceInfo,
    flags: MtdFlags,
}

impl LinuxMtd {
    /// Open an MTD device node
    ///
    /// # Errors
    /// Returns an error if:
    /// - The node cannot be opened for read/write
    /// - MEMGETINFO fails (not an MTD device)
    /// - The device reports an unusable geometry
    /// - The device is not writable
    pub fn open(path: &Path) -> Result<Self> {
        let display = path.display().to_string();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(nix::fcntl::OFlag::O_SYNC.bits())
            .open(path)
            .map_err(|e| LinuxMtdError::Open {
                path: display.clone(),
                source: e,
            })?;

        let mut raw = MtdInfoUser::default();
        // SAFETY: the descriptor is open and `raw` matches struct mtd_info_user
        unsafe { memgetinfo(file.as_raw_fd(), &mut raw) }.map_err(|e| LinuxMtdError::NotMtd {
            path: display.clone(),
            source: e,
        })?;

        let mtd_type = MtdType::from(raw.mtd_type);
        let flags = MtdFlags::from_bits_truncate(raw.flags);

        debug!(
            "{}: type={:?}, flags={:?}, size={}, erase_size={}, write_size={}",
            display, mtd_type, flags, raw.size, raw.erasesize, raw.writesize
        );

        let info = DeviceInfo::new(raw.size as u64, raw.erasesize as u64)?;

        if !flags.contains(MtdFlags::WRITEABLE) {
            return Err(LinuxMtdError::NotWritable(display));
        }

        info!(
            "Opened {} successfully (size={} bytes, erase_size={} bytes)",
            display, info.size, info.erase_size
        );

        Ok(Self {
            file,
            path: display,
            info,
            flags,
        })
    }
}

impl Read for LinuxMtd {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for LinuxMtd {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Seek for LinuxMtd {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

impl MtdDevice for LinuxMtd {
    fn info(&self) -> DeviceInfo {
        self.info
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn erase(&mut self, region: EraseRegion) -> io::Result<()> {
        if self.flags.contains(MtdFlags::NO_ERASE) {
            // Device doesn't require erase (e.g., RAM-backed MTD)
            return Ok(());
        }

        let out_of_range = || io::Error::new(io::ErrorKind::InvalidInput, "erase region beyond 4 GiB");
        let erase_info = EraseInfo {
            start: u32::try_from(region.start).map_err(|_| out_of_range())?,
            length: u32::try_from(region.length).map_err(|_| out_of_range())?,
        };

        // SAFETY: We're calling an ioctl with a valid file descriptor and
        // a properly initialized EraseInfo struct
        unsafe { memerase(self.file.as_raw_fd(), &erase_info) }
            .map(|_| ())
            .map_err(io::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mtd_type_from_raw() {
        assert_eq!(MtdType::from(3), MtdType::NorFlash);
        assert_eq!(MtdType::from(4), MtdType::NandFlash);
        assert_eq!(MtdType::from(5), MtdType::Unknown(5));
    }

    #[test]
    fn test_flags() {
        let flags = MtdFlags::from_bits_truncate(0x0c00);
        assert!(flags.contains(MtdFlags::WRITEABLE));
        assert!(!flags.contains(MtdFlags::NO_ERASE));
        assert_eq!(flags, MtdFlags::WRITEABLE);

        let ram = MtdFlags::from_bits_truncate(0x1400);
        assert!(ram.contains(MtdFlags::WRITEABLE | MtdFlags::NO_ERASE));
    }

    #[test]
    fn test_mtd_info_user_layout() {
        // struct mtd_info_user is 32 bytes on every Linux ABI
        assert_eq!(std::mem::size_of::<MtdInfoUser>(), 32);
        assert_eq!(std::mem::size_of::<EraseInfo>(), 8);
    }

    #[test]
    fn test_open_regular_file_is_not_mtd() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mtd0");
        std::fs::write(&path, [0u8; 16]).unwrap();

        assert!(matches!(
            LinuxMtd::open(&path),
            Err(LinuxMtdError::NotMtd { .. })
        ));
    }

    #[test]
    fn test_open_missing_node() {
        assert!(matches!(
            LinuxMtd::open(Path::new("/nonexistent/mtd0")),
            Err(LinuxMtdError::Open { .. })
        ));
    }
}
