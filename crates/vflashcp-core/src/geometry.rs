//! Device geometry and erase regions

use crate::error::{Error, Result};

/// Geometry of an MTD device as reported when it is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Total size in bytes
    pub size: u64,
    /// Erase block size in bytes
    pub erase_size: u64,
}

impl DeviceInfo {
    /// Create a new geometry, rejecting a zero erase size, a size that is
    /// not a whole number of erase blocks, or an erase block too large to
    /// buffer in memory
    pub fn new(size: u64, erase_size: u64) -> Result<Self> {
        if erase_size == 0 || size % erase_size != 0 || usize::try_from(erase_size).is_err() {
            return Err(Error::InvalidGeometry { size, erase_size });
        }
        Ok(Self { size, erase_size })
    }

    /// Number of erase blocks on the device
    pub fn block_count(&self) -> u64 {
        self.size / self.erase_size
    }

    /// Number of erase blocks needed to hold `len` bytes
    pub fn blocks_for(&self, len: u64) -> u64 {
        len.div_ceil(self.erase_size)
    }

    /// Round `len` up to the next erase block boundary
    pub fn round_up(&self, len: u64) -> u64 {
        self.blocks_for(len) * self.erase_size
    }

    /// Erase block size as a buffer length
    ///
    /// `new` guarantees the erase size fits in `usize`.
    pub fn block_len(&self) -> usize {
        self.erase_size as usize
    }
}

/// An erase-block aligned span of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EraseRegion {
    /// Start offset in bytes
    pub start: u64,
    /// Length in bytes
    pub length: u64,
}

impl EraseRegion {
    /// Create a region
    pub fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }

    /// The whole device
    pub fn whole(info: &DeviceInfo) -> Self {
        Self::new(0, info.size)
    }

    /// The smallest region starting at zero that holds `len` bytes
    pub fn covering(info: &DeviceInfo, len: u64) -> Self {
        Self::new(0, info.round_up(len))
    }

    /// The single erase block starting at `offset`
    pub fn block_at(info: &DeviceInfo, offset: u64) -> Self {
        Self::new(offset, info.erase_size)
    }

    /// Exclusive end offset
    pub fn end(&self) -> u64 {
        self.start + self.length
    }

    /// Whether the region covers no bytes
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether start and length fall on erase block boundaries
    pub fn is_aligned(&self, info: &DeviceInfo) -> bool {
        self.start % info.erase_size == 0 && self.length % info.erase_size == 0
    }

    /// Split the region into single erase blocks
    pub fn blocks(&self, info: &DeviceInfo) -> impl Iterator<Item = EraseRegion> {
        let erase_size = info.erase_size;
        let start = self.start;
        (0..self.length / erase_size).map(move |i| EraseRegion::new(start + i * erase_size, erase_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_validation() {
        assert!(DeviceInfo::new(0x10000, 0x1000).is_ok());
        assert!(matches!(
            DeviceInfo::new(0x10000, 0),
            Err(Error::InvalidGeometry { .. })
        ));
        assert!(matches!(
            DeviceInfo::new(0x10800, 0x1000),
            Err(Error::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn test_block_len() {
        let info = DeviceInfo::new(0x10000, 0x1000).unwrap();
        assert_eq!(info.block_len(), 0x1000);
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn test_erase_size_must_fit_usize() {
        let erase_size = u64::from(u32::MAX) + 1;
        assert!(matches!(
            DeviceInfo::new(erase_size * 2, erase_size),
            Err(Error::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn test_round_up() {
        let info = DeviceInfo::new(0x10000, 0x1000).unwrap();
        assert_eq!(info.round_up(0), 0);
        assert_eq!(info.round_up(1), 0x1000);
        assert_eq!(info.round_up(0x1000), 0x1000);
        assert_eq!(info.round_up(0x1001), 0x2000);
        assert_eq!(info.blocks_for(0x2fff), 3);
        assert_eq!(info.block_count(), 16);
    }

    #[test]
    fn test_region_blocks() {
        let info = DeviceInfo::new(0x10000, 0x1000).unwrap();
        let region = EraseRegion::covering(&info, 0x2800);
        assert_eq!(region, EraseRegion::new(0, 0x3000));
        assert!(region.is_aligned(&info));

        let blocks: Vec<_> = region.blocks(&info).collect();
        assert_eq!(
            blocks,
            vec![
                EraseRegion::new(0, 0x1000),
                EraseRegion::new(0x1000, 0x1000),
                EraseRegion::new(0x2000, 0x1000),
            ]
        );

        assert!(!EraseRegion::new(0x800, 0x1000).is_aligned(&info));
        assert!(EraseRegion::covering(&info, 0).is_empty());
        assert_eq!(EraseRegion::whole(&info).end(), 0x10000);
    }
}
