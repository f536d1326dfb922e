//! Binary image files

use crate::error::{Error, Result};
use crate::geometry::DeviceInfo;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

/// A binary image to be copied to flash
///
/// The size is fixed when the image is opened; the reader's cursor is moved
/// by the pipelines.
#[derive(Debug)]
pub struct ImageFile<R> {
    reader: R,
    path: String,
    size: u64,
}

impl ImageFile<File> {
    /// Open an image on disk
    pub fn open(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let file = File::open(path).map_err(|e| Error::Io {
            path: display.clone(),
            source: e,
        })?;
        let size = file
            .metadata()
            .map_err(|e| Error::Io {
                path: display.clone(),
                source: e,
            })?
            .len();

        log::debug!("Opened image {} ({} bytes)", display, size);

        Ok(Self::from_reader(file, display, size))
    }
}

impl<R: Read + Seek> ImageFile<R> {
    /// Wrap an arbitrary reader holding `size` bytes
    pub fn from_reader(reader: R, path: impl Into<String>, size: u64) -> Self {
        Self {
            reader,
            path: path.into(),
            size,
        }
    }

    /// Image size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Path used in error messages
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fail with `SizeMismatch` unless the image fits into `info.size` bytes
    pub fn ensure_fits(&self, info: &DeviceInfo, device: &str) -> Result<()> {
        if self.size > info.size {
            return Err(Error::SizeMismatch {
                image: self.path.clone(),
                image_size: self.size,
                device: device.to_string(),
                device_size: info.size,
            });
        }
        Ok(())
    }

    pub(crate) fn reader_and_path(&mut self) -> (&mut R, &str) {
        (&mut self.reader, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_ensure_fits() {
        let info = DeviceInfo::new(0x4000, 0x1000).unwrap();

        let image = ImageFile::from_reader(Cursor::new(vec![0u8; 0x4000]), "exact.bin", 0x4000);
        assert!(image.ensure_fits(&info, "/dev/mtd0").is_ok());

        let image = ImageFile::from_reader(Cursor::new(vec![0u8; 0x4001]), "big.bin", 0x4001);
        match image.ensure_fits(&info, "/dev/mtd0") {
            Err(Error::SizeMismatch {
                image_size,
                device_size,
                ..
            }) => {
                assert_eq!(image_size, 0x4001);
                assert_eq!(device_size, 0x4000);
            }
            other => panic!("expected SizeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_open_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.bin");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let image = ImageFile::open(&path).unwrap();
        assert_eq!(image.size(), 3);

        assert!(matches!(
            ImageFile::open(&dir.path().join("missing.bin")),
            Err(Error::Io { .. })
        ));
    }
}
