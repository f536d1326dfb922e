//! Error types for sysfs GPIO operations

use std::io;
use thiserror::Error;

/// sysfs GPIO errors
#[derive(Debug, Error)]
pub enum GpioError {
    /// Writing the pin number to the export file failed
    #[error("failed to export GPIO {pin} via {path}: {source}")]
    Export {
        pin: u32,
        path: String,
        #[source]
        source: io::Error,
    },

    /// Writing the pin number to the unexport file failed
    #[error("failed to unexport GPIO {pin} via {path}: {source}")]
    Unexport {
        pin: u32,
        path: String,
        #[source]
        source: io::Error,
    },

    /// Writing the direction file failed
    #[error("failed to set direction of GPIO {pin} via {path}: {source}")]
    Direction {
        pin: u32,
        path: String,
        #[source]
        source: io::Error,
    },

    /// Writing the value file failed
    #[error("failed to set value of GPIO {pin} via {path}: {source}")]
    Value {
        pin: u32,
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Result type for sysfs GPIO operations
pub type Result<T> = std::result::Result<T, GpioError>;
