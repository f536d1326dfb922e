//! Error types for Linux MTD operations

use std::io;
use thiserror::Error;

/// Linux MTD-specific errors
#[derive(Debug, Error)]
pub enum LinuxMtdError {
    /// Opening the device node failed
    #[error("while trying to open {path} for read/write access: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    /// MEMGETINFO was rejected
    #[error("{path} doesn't seem to be a valid MTD flash device: {source}")]
    NotMtd {
        path: String,
        #[source]
        source: nix::errno::Errno,
    },

    /// The reported geometry is unusable
    #[error(transparent)]
    Geometry(#[from] vflashcp_core::Error),

    /// Device is not writable
    #[error("MTD device {0} is not writable")]
    NotWritable(String),

    /// Module name cannot be passed to the kernel
    #[error("invalid kernel module name '{0}'")]
    InvalidModuleName(String),

    /// delete_module failed
    #[error("failed to unload kernel module {name}: {source}")]
    ModuleUnload {
        name: String,
        #[source]
        source: nix::errno::Errno,
    },

    /// modprobe could not be run or reported failure
    #[error("failed to load kernel module {name}: {reason}")]
    ModuleLoad { name: String, reason: String },
}

/// Result type for Linux MTD operations
pub type Result<T> = std::result::Result<T, LinuxMtdError>;
