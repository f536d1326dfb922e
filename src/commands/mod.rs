//! Command implementations

mod access;
mod program;

pub use access::run_grant;
pub use program::{run_program, ProgramOptions};
