//! Error types for vflashcp-core
//!
//! Every device and file failure is fatal to the run. The messages are single
//! lines that name the path and, where one applies, the offset range.

use std::io;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Opening, creating or inspecting a file failed
    #[error("while accessing {path}: {source}")]
    Io {
        /// File involved
        path: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A hex input line is not exactly two characters plus a newline
    #[error("{path}:{line}: file is not properly formatted: expected 2 hex digits and a newline, got {len} bytes")]
    Format {
        /// Hex input file
        path: String,
        /// 1-based line number
        line: usize,
        /// Length of the line including any terminator
        len: usize,
    },

    /// A hex input line has the right length but is not a hex byte
    #[error("{path}:{line}: '{token}' is not a hex byte")]
    InvalidHex {
        /// Hex input file
        path: String,
        /// 1-based line number
        line: usize,
        /// The offending two characters
        token: String,
    },

    /// A read failed outright
    #[error("while reading data from {path} at 0x{offset:08x}: {source}")]
    Read {
        /// Device or image read from
        path: String,
        /// Offset of the chunk being read
        offset: u64,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A read returned fewer bytes than requested
    #[error("short read count returned while reading from {path} at 0x{offset:08x}: {got}/{expected} bytes")]
    ShortRead {
        /// Device or image read from
        path: String,
        /// Offset of the chunk being read
        offset: u64,
        /// Bytes requested
        expected: usize,
        /// Bytes actually read
        got: usize,
    },

    /// A write failed outright
    #[error("while writing data to 0x{start:08x}-0x{end:08x} on {path}: {source}")]
    Write {
        /// Device or file written to
        path: String,
        /// Start offset of the chunk
        start: u64,
        /// End offset of the chunk (exclusive)
        end: u64,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A write persisted fewer bytes than requested
    #[error("short write count returned while writing to 0x{start:08x}-0x{end:08x} on {path}: {written}/{total} bytes written")]
    ShortWrite {
        /// Device or file written to
        path: String,
        /// Start offset of the chunk
        start: u64,
        /// End offset of the chunk (exclusive)
        end: u64,
        /// Bytes persisted so far
        written: u64,
        /// Bytes that should have been persisted in total
        total: u64,
    },

    /// Repositioning a cursor failed
    #[error("while seeking to 0x{offset:08x} on {path}: {source}")]
    Seek {
        /// Device or image being repositioned
        path: String,
        /// Target offset
        offset: u64,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The driver rejected an erase request
    #[error("while erasing blocks 0x{start:08x}-0x{end:08x} on {path}: {source}")]
    Erase {
        /// Device node
        path: String,
        /// Start of the erase region
        start: u64,
        /// End of the erase region (exclusive)
        end: u64,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Flash contents differ from the image after a full write
    #[error("file does not seem to match flash data, first mismatch at 0x{start:08x}-0x{end:08x}")]
    VerifyMismatch {
        /// Start of the mismatching chunk
        start: u64,
        /// End of the mismatching chunk (exclusive)
        end: u64,
    },

    /// A rewritten block still differs from the image
    #[error("block 0x{start:08x}-0x{end:08x} does not match after rewrite, flash hardware or driver fault")]
    VerifyAfterWrite {
        /// Start of the block
        start: u64,
        /// End of the compared span (exclusive)
        end: u64,
    },

    /// Bring-up needs to drive GPIOs and kernel modules
    #[error("flash configuration requires root privileges, please run with sudo")]
    PermissionDenied,

    /// The device node never appeared
    #[error("flash configuration failed after {attempts} retries, {device} is not available")]
    BringupExhausted {
        /// Device node that was waited for
        device: String,
        /// Driver reload attempts made
        attempts: u32,
    },

    /// The image does not fit into the target region
    #[error("{image} ({image_size} bytes) won't fit into {device} ({device_size} bytes)")]
    SizeMismatch {
        /// Image path
        image: String,
        /// Image size in bytes
        image_size: u64,
        /// Device node
        device: String,
        /// Device size in bytes
        device_size: u64,
    },

    /// The device reported an unusable geometry
    #[error("invalid device geometry: size {size:#x}, erase block size {erase_size:#x}")]
    InvalidGeometry {
        /// Reported size in bytes
        size: u64,
        /// Reported erase block size in bytes
        erase_size: u64,
    },
}

/// Result type alias using the core Error type
pub type Result<T> = std::result::Result<T, Error>;
