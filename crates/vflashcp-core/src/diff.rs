//! Rewrite only the erase blocks that changed
//!
//! Used for partition updates. Each block of the image is compared with the
//! block at the same offset on the device; identical blocks are left alone,
//! which saves both time and erase cycles. A differing block is erased,
//! rewritten and read back straight away.

use crate::device::MtdDevice;
use crate::error::{Error, Result};
use crate::geometry::EraseRegion;
use crate::progress::Progress;
use crate::session::FlashSession;
use std::io::{Read, Seek};

/// Outcome of a diff update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffReport {
    /// Blocks covered by the image
    pub blocks: u64,
    /// Blocks that differed and were rewritten
    pub rewritten: u64,
}

/// Block-by-block compare and rewrite
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffBlockUpdater;

impl DiffBlockUpdater {
    /// Create an updater
    pub fn new() -> Self {
        Self
    }

    /// Bring the device in line with the image
    ///
    /// Fails with `VerifyAfterWrite` if a rewritten block reads back
    /// differently, which points at the flash or its driver.
    pub fn run<D, R>(
        &self,
        session: &mut FlashSession<'_, D, R>,
        progress: &mut dyn Progress,
    ) -> Result<DiffReport>
    where
        D: MtdDevice + ?Sized,
        R: Read + Seek,
    {
        let info = session.info();
        let size = session.image_size();
        let blocks = info.blocks_for(size);
        let mut rewritten = 0u64;

        session.rewind()?;
        progress.comparing(blocks);

        for index in 0..blocks {
            let offset = index * info.erase_size;
            let len = session.chunk_len(offset);

            session.read_image(offset, len)?;

            // Erase and write leave the device cursor elsewhere, so place it
            // explicitly for every block.
            session.seek_device(offset)?;
            session.read_device(offset, len)?;

            if !session.buffers_match(len) {
                log::debug!(
                    "Block {} (0x{:08x}-0x{:08x}) differs, rewriting",
                    index,
                    offset,
                    offset + len as u64
                );
                rewritten += 1;
                rewrite_block(session, EraseRegion::block_at(&info, offset), len)?;
            }

            progress.compare_progress(index + 1, rewritten);
        }

        progress.finish();
        log::debug!("diff blocks: {}/{}", rewritten, blocks);

        Ok(DiffReport { blocks, rewritten })
    }
}

fn rewrite_block<D, R>(session: &mut FlashSession<'_, D, R>, block: EraseRegion, len: usize) -> Result<()>
where
    D: MtdDevice + ?Sized,
    R: Read + Seek,
{
    let offset = block.start;

    session.erase(block)?;

    session.seek_device(offset)?;
    session.write_device(offset, len)?;

    session.seek_device(offset)?;
    session.read_device(offset, len)?;

    if !session.buffers_match(len) {
        return Err(Error::VerifyAfterWrite {
            start: offset,
            end: offset + len as u64,
        });
    }

    Ok(())
}
