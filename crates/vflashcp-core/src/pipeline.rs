//! Erase, write and verify a whole image
//!
//! The full update path:
//!
//! 1. Erase the blocks the image needs (or the whole device)
//! 2. Stream the image into the device one erase block at a time
//! 3. Rewind both cursors and compare every chunk byte for byte
//!
//! Any failure aborts the run. There is no rollback of blocks already erased
//! or written.

use crate::device::MtdDevice;
use crate::error::{Error, Result};
use crate::geometry::{DeviceInfo, EraseRegion};
use crate::progress::Progress;
use crate::session::FlashSession;
use std::io::{Read, Seek};

/// Options for [`EraseWriteVerifyPipeline`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Erase the whole device instead of only the blocks the image covers
    pub erase_all: bool,
    /// Issue one erase request per block instead of one for the whole region
    pub erase_per_block: bool,
}

/// Summary of a successful run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReport {
    /// Region that was erased
    pub erased: EraseRegion,
    /// Bytes written and verified
    pub bytes_written: u64,
}

/// Full erase/write/verify of an image
#[derive(Debug, Clone, Copy, Default)]
pub struct EraseWriteVerifyPipeline {
    options: PipelineOptions,
}

impl EraseWriteVerifyPipeline {
    /// Create a pipeline with the given options
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Region erased before writing an image of `image_size` bytes
    pub fn erase_region(&self, info: &DeviceInfo, image_size: u64) -> EraseRegion {
        if self.options.erase_all {
            EraseRegion::whole(info)
        } else {
            EraseRegion::covering(info, image_size)
        }
    }

    /// Run all three steps
    pub fn run<D, R>(
        &self,
        session: &mut FlashSession<'_, D, R>,
        progress: &mut dyn Progress,
    ) -> Result<PipelineReport>
    where
        D: MtdDevice + ?Sized,
        R: Read + Seek,
    {
        let info = session.info();
        let region = self.erase_region(&info, session.image_size());

        self.erase(session, region, progress)?;
        let bytes_written = write(session, progress)?;
        verify(session, progress)?;

        progress.finish();

        Ok(PipelineReport {
            erased: region,
            bytes_written,
        })
    }

    fn erase<D, R>(
        &self,
        session: &mut FlashSession<'_, D, R>,
        region: EraseRegion,
        progress: &mut dyn Progress,
    ) -> Result<()>
    where
        D: MtdDevice + ?Sized,
        R: Read + Seek,
    {
        let info = session.info();
        let blocks = region.length / info.erase_size;

        log::debug!(
            "Erasing {} blocks (0x{:08x}-0x{:08x}) on {}",
            blocks,
            region.start,
            region.end(),
            session.device_path()
        );
        progress.erasing(blocks, region.length);

        if self.options.erase_per_block {
            for (i, block) in region.blocks(&info).enumerate() {
                session.erase(block)?;
                progress.erase_progress(i as u64 + 1);
            }
        } else {
            session.erase(region)?;
            progress.erase_progress(blocks);
        }

        Ok(())
    }
}

/// Stream the image into the device from offset zero
///
/// Returns the number of bytes written.
pub fn write<D, R>(session: &mut FlashSession<'_, D, R>, progress: &mut dyn Progress) -> Result<u64>
where
    D: MtdDevice + ?Sized,
    R: Read + Seek,
{
    let size = session.image_size();
    session.rewind()?;
    progress.writing(size);

    let mut written = 0u64;
    while written < size {
        let len = session.chunk_len(written);
        session.read_image(written, len)?;
        session.write_device(written, len)?;
        written += len as u64;
        progress.write_progress(written);
    }

    log::debug!("Wrote {} bytes to {}", written, session.device_path());
    Ok(written)
}

/// Compare the device against the image from offset zero
///
/// Fails with `VerifyMismatch` naming the first chunk that differs.
pub fn verify<D, R>(session: &mut FlashSession<'_, D, R>, progress: &mut dyn Progress) -> Result<()>
where
    D: MtdDevice + ?Sized,
    R: Read + Seek,
{
    let size = session.image_size();
    session.rewind()?;
    progress.verifying(size);

    let mut verified = 0u64;
    while verified < size {
        let len = session.chunk_len(verified);
        session.read_image(verified, len)?;
        session.read_device(verified, len)?;

        if !session.buffers_match(len) {
            return Err(Error::VerifyMismatch {
                start: verified,
                end: verified + len as u64,
            });
        }

        verified += len as u64;
        progress.verify_progress(verified);
    }

    log::debug!("Verified {} bytes on {}", verified, session.device_path());
    Ok(())
}
