//! Progress reporting for the flash pipelines

/// Callback for progress reporting while programming
pub trait Progress {
    /// Called when starting to erase `blocks` erase blocks
    fn erasing(&mut self, blocks: u64, bytes: u64);

    /// Called after each block when erasing block by block
    fn erase_progress(&mut self, blocks_erased: u64);

    /// Called when starting to write the image
    fn writing(&mut self, bytes: u64);

    /// Called after each chunk is written
    fn write_progress(&mut self, bytes_written: u64);

    /// Called when starting to verify the image
    fn verifying(&mut self, bytes: u64);

    /// Called after each chunk is verified
    fn verify_progress(&mut self, bytes_verified: u64);

    /// Called when starting a block-by-block comparison
    fn comparing(&mut self, blocks: u64);

    /// Called after each compared block
    fn compare_progress(&mut self, blocks_done: u64, blocks_rewritten: u64);

    /// Called once the pipeline has finished successfully
    fn finish(&mut self);
}

/// A no-op progress reporter
pub struct NoProgress;

impl Progress for NoProgress {
    fn erasing(&mut self, _blocks: u64, _bytes: u64) {}
    fn erase_progress(&mut self, _blocks_erased: u64) {}
    fn writing(&mut self, _bytes: u64) {}
    fn write_progress(&mut self, _bytes_written: u64) {}
    fn verifying(&mut self, _bytes: u64) {}
    fn verify_progress(&mut self, _bytes_verified: u64) {}
    fn comparing(&mut self, _blocks: u64) {}
    fn compare_progress(&mut self, _blocks_done: u64, _blocks_rewritten: u64) {}
    fn finish(&mut self) {}
}
