//! Device/image pairing shared by both pipelines
//!
//! A [`FlashSession`] is the setup step common to
//! [`EraseWriteVerifyPipeline`](crate::pipeline::EraseWriteVerifyPipeline) and
//! [`DiffBlockUpdater`](crate::diff::DiffBlockUpdater): it checks that the
//! image fits, rewinds both cursors and owns the two scratch buffers, each one
//! erase block long. Every I/O helper here fails hard; nothing is retried.

use crate::device::MtdDevice;
use crate::error::{Error, Result};
use crate::geometry::{DeviceInfo, EraseRegion};
use crate::image::ImageFile;
use std::io::{self, Read, Seek, SeekFrom, Write};

enum ReadFailure {
    Io(io::Error),
    Short(usize),
}

/// Fill `buf`, stopping early only at end of input
fn read_full<T: Read + ?Sized>(reader: &mut T, buf: &mut [u8]) -> std::result::Result<(), ReadFailure> {
    let mut got = 0;
    while got < buf.len() {
        match reader.read(&mut buf[got..]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(ReadFailure::Io(e)),
        }
    }
    if got != buf.len() {
        return Err(ReadFailure::Short(got));
    }
    Ok(())
}

fn read_error(failure: ReadFailure, path: &str, offset: u64, expected: usize) -> Error {
    match failure {
        ReadFailure::Io(source) => Error::Read {
            path: path.to_string(),
            offset,
            source,
        },
        ReadFailure::Short(got) => Error::ShortRead {
            path: path.to_string(),
            offset,
            expected,
            got,
        },
    }
}

/// An opened device paired with the image to program into it
pub struct FlashSession<'a, D: MtdDevice + ?Sized, R> {
    device: &'a mut D,
    image: &'a mut ImageFile<R>,
    info: DeviceInfo,
    /// Scratch for image data
    src: Vec<u8>,
    /// Scratch for device data
    dst: Vec<u8>,
}

impl<'a, D: MtdDevice + ?Sized, R: Read + Seek> FlashSession<'a, D, R> {
    /// Pair `device` with `image`
    ///
    /// Fails with `SizeMismatch` before anything touches the device if the
    /// image is larger than the device.
    pub fn new(device: &'a mut D, image: &'a mut ImageFile<R>) -> Result<Self> {
        let info = device.info();
        image.ensure_fits(&info, device.path())?;

        let mut session = Self {
            device,
            image,
            info,
            src: vec![0u8; info.block_len()],
            dst: vec![0u8; info.block_len()],
        };
        session.rewind()?;
        Ok(session)
    }

    /// Device geometry
    pub fn info(&self) -> DeviceInfo {
        self.info
    }

    /// Image size in bytes
    pub fn image_size(&self) -> u64 {
        self.image.size()
    }

    /// Device path
    pub fn device_path(&self) -> &str {
        self.device.path()
    }

    /// Move both cursors back to offset zero
    pub fn rewind(&mut self) -> Result<()> {
        self.seek_image(0)?;
        self.seek_device(0)
    }

    /// Length of the image chunk starting at `offset`: one erase block, or
    /// less for the final chunk
    pub(crate) fn chunk_len(&self, offset: u64) -> usize {
        (self.image.size() - offset).min(self.info.erase_size) as usize
    }

    pub(crate) fn seek_device(&mut self, offset: u64) -> Result<()> {
        self.device
            .seek(SeekFrom::Start(offset))
            .map(|_| ())
            .map_err(|e| Error::Seek {
                path: self.device.path().to_string(),
                offset,
                source: e,
            })
    }

    pub(crate) fn seek_image(&mut self, offset: u64) -> Result<()> {
        let (reader, path) = self.image.reader_and_path();
        reader
            .seek(SeekFrom::Start(offset))
            .map(|_| ())
            .map_err(|e| Error::Seek {
                path: path.to_string(),
                offset,
                source: e,
            })
    }

    /// Erase `region`; an empty region is a no-op
    pub(crate) fn erase(&mut self, region: EraseRegion) -> Result<()> {
        if region.is_empty() {
            return Ok(());
        }
        log::trace!(
            "Erasing 0x{:08x}-0x{:08x} on {}",
            region.start,
            region.end(),
            self.device.path()
        );
        self.device.erase(region).map_err(|e| Error::Erase {
            path: self.device.path().to_string(),
            start: region.start,
            end: region.end(),
            source: e,
        })
    }

    /// Read `len` bytes at the image cursor into the image scratch buffer
    pub(crate) fn read_image(&mut self, offset: u64, len: usize) -> Result<()> {
        let (reader, path) = self.image.reader_and_path();
        read_full(reader, &mut self.src[..len]).map_err(|f| read_error(f, path, offset, len))
    }

    /// Read `len` bytes at the device cursor into the device scratch buffer
    pub(crate) fn read_device(&mut self, offset: u64, len: usize) -> Result<()> {
        match read_full(&mut *self.device, &mut self.dst[..len]) {
            Ok(()) => Ok(()),
            Err(f) => Err(read_error(f, self.device.path(), offset, len)),
        }
    }

    /// Write the first `len` bytes of the image scratch buffer at the device
    /// cursor, which the caller has placed at `offset`
    ///
    /// One write request per chunk; a short count is fatal.
    pub(crate) fn write_device(&mut self, offset: u64, len: usize) -> Result<()> {
        let end = offset + len as u64;
        match self.device.write(&self.src[..len]) {
            Ok(n) if n == len => Ok(()),
            Ok(n) => Err(Error::ShortWrite {
                path: self.device.path().to_string(),
                start: offset,
                end,
                written: offset + n as u64,
                total: self.image.size(),
            }),
            Err(e) => Err(Error::Write {
                path: self.device.path().to_string(),
                start: offset,
                end,
                source: e,
            }),
        }
    }

    /// Whether the first `len` bytes of both scratch buffers are equal
    pub(crate) fn buffers_match(&self, len: usize) -> bool {
        self.src[..len] == self.dst[..len]
    }
}
