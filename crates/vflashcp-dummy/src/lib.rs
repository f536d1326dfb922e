//! vflashcp-dummy - In-memory MTD emulator for testing
//!
//! This crate provides a flash device that lives in memory and behaves like a
//! NOR MTD node: erase sets whole blocks to 0xFF, programming can only clear
//! bits, and the cursor is moved by reads, writes and seeks but not by erase.
//! Faults can be injected to exercise the error paths of the pipelines
//! without real hardware.

use std::io::{self, Read, Seek, SeekFrom, Write};

use vflashcp_core::{DeviceInfo, EraseRegion, MtdDevice, Result};

/// Configuration for the dummy device
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Device size in bytes
    pub size: u64,
    /// Erase block size in bytes
    pub erase_size: u64,
    /// Path reported in error messages
    pub path: String,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            size: 1024 * 1024,
            erase_size: 64 * 1024,
            path: "/dev/mtd-dummy".to_string(),
        }
    }
}

/// Dummy MTD device
pub struct DummyMtd {
    config: DummyConfig,
    info: DeviceInfo,
    data: Vec<u8>,
    pos: u64,
    erases: Vec<EraseRegion>,
    stuck: Option<(u64, u8)>,
    short_write: Option<usize>,
    fail_erase: bool,
}

impl DummyMtd {
    /// Create an erased device with the given configuration
    pub fn new(config: DummyConfig) -> Result<Self> {
        let info = DeviceInfo::new(config.size, config.erase_size)?;
        Ok(Self {
            data: vec![0xFF; config.size as usize],
            config,
            info,
            pos: 0,
            erases: Vec::new(),
            stuck: None,
            short_write: None,
            fail_erase: false,
        })
    }

    /// Create a device with pre-filled contents
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Result<Self> {
        let mut mtd = Self::new(config)?;
        let len = initial_data.len().min(mtd.data.len());
        mtd.data[..len].copy_from_slice(&initial_data[..len]);
        Ok(mtd)
    }

    /// Get a reference to the flash contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Erase requests received so far
    pub fn erases(&self) -> &[EraseRegion] {
        &self.erases
    }

    /// Forget recorded erase requests
    pub fn clear_erases(&mut self) {
        self.erases.clear();
    }

    /// Current cursor position
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Make the byte at `offset` always read back as `value`
    pub fn stick_byte(&mut self, offset: u64, value: u8) {
        self.stuck = Some((offset, value));
    }

    /// Let the next write accept at most `limit` bytes
    pub fn short_next_write(&mut self, limit: usize) {
        self.short_write = Some(limit);
    }

    /// Make every erase request fail
    pub fn fail_erases(&mut self, fail: bool) {
        self.fail_erase = fail;
    }
}

impl Read for DummyMtd {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let size = self.info.size;
        if self.pos >= size {
            return Ok(0);
        }

        let start = self.pos as usize;
        let n = buf.len().min((size - self.pos) as usize);
        buf[..n].copy_from_slice(&self.data[start..start + n]);

        if let Some((offset, value)) = self.stuck {
            if offset >= self.pos && offset < self.pos + n as u64 {
                buf[(offset - self.pos) as usize] = value;
            }
        }

        self.pos += n as u64;
        Ok(n)
    }
}

impl Write for DummyMtd {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.pos + buf.len() as u64 > self.info.size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "write past end of device",
            ));
        }

        let n = match self.short_write.take() {
            Some(limit) => buf.len().min(limit),
            None => buf.len(),
        };

        // Programming can only change 1 -> 0
        let start = self.pos as usize;
        for (i, &byte) in buf[..n].iter().enumerate() {
            self.data[start + i] &= byte;
        }

        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for DummyMtd {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
            SeekFrom::End(delta) => self.info.size.checked_add_signed(delta),
        };

        match target {
            Some(offset) => {
                self.pos = offset;
                Ok(offset)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek to a negative offset",
            )),
        }
    }
}

impl MtdDevice for DummyMtd {
    fn info(&self) -> DeviceInfo {
        self.info
    }

    fn path(&self) -> &str {
        &self.config.path
    }

    fn erase(&mut self, region: EraseRegion) -> io::Result<()> {
        if self.fail_erase {
            return Err(io::Error::other("erase failed"));
        }
        if !region.is_aligned(&self.info) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "erase region not aligned to erase blocks",
            ));
        }
        if region.end() > self.info.size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "erase region beyond end of device",
            ));
        }

        log::trace!("dummy: erase 0x{:08x}-0x{:08x}", region.start, region.end());

        for byte in &mut self.data[region.start as usize..region.end() as usize] {
            *byte = 0xFF;
        }
        self.erases.push(region);
        Ok(())
    }
}
