//! vflashcp - copy firmware images to an MTD flash shared with an FPGA
//!
//! The board routes a single SPI flash either to the processor or to the
//! FPGA. vflashcp takes the bus for the processor, reloads the flash
//! controller driver until the MTD device appears, converts the hex input
//! to a binary image and programs it:
//!
//! - by default: erase, write and verify the whole image
//! - with `--partition`: rewrite only the erase blocks that differ
//!
//! Afterwards the driver is unloaded and the bus handed back to the FPGA.

mod cli;
mod commands;
mod config;
mod progress;

use clap::Parser;
use cli::Cli;
use commands::ProgramOptions;
use config::Config;
use vflashcp_core::BusOwner;

fn main() {
    let cli = Cli::parse();

    // Initialize logger
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        log::debug!("{:?}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.version {
        println!("vflashcp: Version: {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(device) = cli.device {
        config.flash.device = device;
    }

    if cli.read_from_flash {
        commands::run_grant(&config, BusOwner::Fpga);
        return Ok(());
    }
    if cli.external_cable {
        commands::run_grant(&config, BusOwner::Processor);
        return Ok(());
    }

    let Some(input) = cli.file else {
        return Err("no input file given".into());
    };

    commands::run_program(
        &config,
        &ProgramOptions {
            input,
            partition: cli.partition,
            erase_all: cli.erase_all,
            verbose: cli.verbose > 0,
        },
    )
}
