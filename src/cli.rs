//! CLI argument parsing

use clap::{ArgAction, Parser};
use std::path::PathBuf;

const EXAMPLES: &str = "\
Examples:
  vflashcp -p input.hex     Copy input.hex to the flash partition.
  vflashcp -A firmware.hex  Erase the entire device and copy firmware.hex.";

#[derive(Parser, Debug)]
#[command(name = "vflashcp")]
#[command(author, about = "Copy data to an MTD flash device shared with the FPGA", long_about = None)]
#[command(disable_version_flag = true, after_help = EXAMPLES)]
pub struct Cli {
    /// Verbosity level (-v shows progress, -vv traces bring-up)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Copy to a specific partition, rewriting only the erase blocks that differ
    #[arg(short, long, conflicts_with = "erase_all")]
    pub partition: bool,

    /// Erase the entire device before copying
    #[arg(short = 'A', long)]
    pub erase_all: bool,

    /// Display the program version
    #[arg(short = 'V', long)]
    pub version: bool,

    /// Give flash access to the FPGA and exit
    #[arg(short, long = "read_from_flash", conflicts_with = "external_cable")]
    pub read_from_flash: bool,

    /// Give flash access to the processor so the FPGA can be programmed from the external cable, and exit
    #[arg(short, long = "external_cable")]
    pub external_cable: bool,

    /// MTD device to program (overrides the configuration file)
    #[arg(long, value_name = "PATH")]
    pub device: Option<PathBuf>,

    /// Configuration file (TOML), defaults to /etc/vflashcp.toml if present
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Input file to copy: one two-digit hex byte per line
    #[arg(
        value_name = "FILE",
        required_unless_present_any = ["version", "read_from_flash", "external_cable"]
    )]
    pub file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_partition() {
        let cli = Cli::try_parse_from(["vflashcp", "-v", "-p", "image.hex"]).unwrap();
        assert_eq!(cli.verbose, 1);
        assert!(cli.partition);
        assert!(!cli.erase_all);
        assert_eq!(cli.file, Some(PathBuf::from("image.hex")));
    }

    #[test]
    fn test_partition_conflicts_with_erase_all() {
        assert!(Cli::try_parse_from(["vflashcp", "-p", "-A", "image.hex"]).is_err());
    }

    #[test]
    fn test_file_required_for_programming() {
        assert!(Cli::try_parse_from(["vflashcp", "-A"]).is_err());
        assert!(Cli::try_parse_from(["vflashcp", "-V"]).is_ok());
        assert!(Cli::try_parse_from(["vflashcp", "--read_from_flash"]).is_ok());
        assert!(Cli::try_parse_from(["vflashcp", "-e"]).is_ok());
    }

    #[test]
    fn test_bus_flags_conflict() {
        assert!(Cli::try_parse_from(["vflashcp", "-r", "-e"]).is_err());
    }
}
