//! Programming command implementation

use crate::config::Config;
use crate::progress::IndicatifProgress;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::thread;
use vflashcp_core::bringup::DriverControl;
use vflashcp_core::diff::DiffBlockUpdater;
use vflashcp_core::hex;
use vflashcp_core::pipeline::{EraseWriteVerifyPipeline, PipelineOptions};
use vflashcp_core::progress::{NoProgress, Progress};
use vflashcp_core::{BusArbiter, BusOwner, FlashSession, ImageFile, MtdDevice};
use vflashcp_linux_mtd::{is_privileged, KernelModule, LinuxMtd};

/// What to program and how
#[derive(Debug, Clone)]
pub struct ProgramOptions {
    /// Hex input file
    pub input: PathBuf,
    /// Only rewrite the erase blocks that differ
    pub partition: bool,
    /// Erase the whole device first
    pub erase_all: bool,
    /// Erase block by block and show progress bars
    pub verbose: bool,
}

/// Program the image on the board's MTD device
pub fn run_program(config: &Config, opts: &ProgramOptions) -> Result<(), Box<dyn Error>> {
    let mut arbiter = config.arbiter();
    let mut module = KernelModule::new(config.flash.module.as_str());

    program_flash(
        config,
        opts,
        is_privileged(),
        &mut arbiter,
        &mut module,
        |path: &Path| -> Result<LinuxMtd, Box<dyn Error>> { Ok(LinuxMtd::open(path)?) },
    )?;

    if config.gpio.release_lines {
        arbiter.release();
    }
    Ok(())
}

/// Bring the device up, program the image and hand the bus back
///
/// `open` is called once, after bring-up, hex conversion and the processor
/// grant. The bus goes back to the FPGA only if programming succeeded.
pub fn program_flash<A, K, D, F>(
    config: &Config,
    opts: &ProgramOptions,
    privileged: bool,
    arbiter: &mut A,
    driver: &mut K,
    open: F,
) -> Result<(), Box<dyn Error>>
where
    A: BusArbiter + ?Sized,
    K: DriverControl + ?Sized,
    D: MtdDevice,
    F: FnOnce(&Path) -> Result<D, Box<dyn Error>>,
{
    let device = config.flash.device.as_path();

    let bringup = config
        .bringup()
        .run(device, privileged, &mut *arbiter, &mut *driver)?;
    if bringup.attempts > 0 {
        log::info!(
            "{} available after {} driver reload(s)",
            device.display(),
            bringup.attempts
        );
    }

    let bin = hex::bin_path(&opts.input);
    let bytes = hex::convert(&opts.input, &bin)?;
    log::info!(
        "Converted {} to {} ({} bytes)",
        opts.input.display(),
        bin.display(),
        bytes
    );

    // Bring-up leaves the lines alone when the node already exists
    arbiter.grant_access(BusOwner::Processor);

    // Both handles are closed at the end of this block, before the driver
    // is released.
    {
        let mut mtd = open(device)?;
        let mut image = ImageFile::open(&bin)?;
        let mut session = FlashSession::new(&mut mtd, &mut image)?;

        let mut progress: Box<dyn Progress> = if opts.verbose {
            Box::new(IndicatifProgress::new())
        } else {
            Box::new(NoProgress)
        };

        if opts.partition {
            let report = DiffBlockUpdater::new().run(&mut session, progress.as_mut())?;
            log::info!(
                "diff blocks: {} of {} rewritten on {}",
                report.rewritten,
                report.blocks,
                device.display()
            );
        } else {
            let pipeline = EraseWriteVerifyPipeline::new(PipelineOptions {
                erase_all: opts.erase_all,
                erase_per_block: opts.verbose,
            });
            let report = pipeline.run(&mut session, progress.as_mut())?;
            log::info!(
                "Wrote and verified {} bytes on {} (erased 0x{:08x}-0x{:08x})",
                report.bytes_written,
                device.display(),
                report.erased.start,
                report.erased.end()
            );
        }
    }

    release_flash(config, arbiter, driver);
    Ok(())
}

/// Unload the flash driver and give the bus back to the FPGA
fn release_flash<A, K>(config: &Config, arbiter: &mut A, driver: &mut K)
where
    A: BusArbiter + ?Sized,
    K: DriverControl + ?Sized,
{
    thread::sleep(config.bringup.settle_delay());

    if let Err(e) = driver.unload() {
        log::warn!("Failed to unload flash driver: {}", e);
    }

    arbiter.grant_access(BusOwner::Fpga);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use vflashcp_dummy::{DummyConfig, DummyMtd};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Grant(BusOwner),
        Unload,
        Load,
        Open,
    }

    type Events = Rc<RefCell<Vec<Event>>>;

    struct RecordingArbiter(Events);

    impl BusArbiter for RecordingArbiter {
        fn grant_access(&mut self, owner: BusOwner) {
            self.0.borrow_mut().push(Event::Grant(owner));
        }
    }

    struct FakeDriver(Events);

    impl DriverControl for FakeDriver {
        type Error = String;

        fn is_loaded(&mut self) -> bool {
            true
        }

        fn unload(&mut self) -> Result<(), String> {
            self.0.borrow_mut().push(Event::Unload);
            Ok(())
        }

        fn load(&mut self) -> Result<(), String> {
            self.0.borrow_mut().push(Event::Load);
            Ok(())
        }
    }

    struct Board {
        dir: tempfile::TempDir,
        config: Config,
        opts: ProgramOptions,
        bytes: Vec<u8>,
        mtd: DummyMtd,
        events: Events,
    }

    /// A board whose device node already exists, and a 0x2800 byte hex image
    fn board() -> Board {
        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join("mtd0");
        fs::write(&node, b"").unwrap();

        let bytes: Vec<u8> = (0..0x2800).map(|i| (i % 251) as u8).collect();
        let text: String = bytes.iter().map(|b| format!("{:02x}\n", b)).collect();
        let input = dir.path().join("image.hex");
        fs::write(&input, text).unwrap();

        let mut config = Config::default();
        config.flash.device = node;
        config.bringup.retry_delay_ms = 0;
        config.bringup.settle_delay_ms = 0;

        let mtd = DummyMtd::new(DummyConfig {
            size: 0x10000,
            erase_size: 0x1000,
            path: "/dev/mtd0".to_string(),
        })
        .unwrap();

        Board {
            dir,
            config,
            opts: ProgramOptions {
                input,
                partition: false,
                erase_all: false,
                verbose: false,
            },
            bytes,
            mtd,
            events: Events::default(),
        }
    }

    fn run(board: &mut Board, privileged: bool) -> Result<(), Box<dyn Error>> {
        let mut arbiter = RecordingArbiter(board.events.clone());
        let mut driver = FakeDriver(board.events.clone());
        let events = board.events.clone();
        let mtd = &mut board.mtd;

        program_flash(
            &board.config,
            &board.opts,
            privileged,
            &mut arbiter,
            &mut driver,
            move |_path: &Path| {
                events.borrow_mut().push(Event::Open);
                Ok::<_, Box<dyn Error>>(mtd)
            },
        )
    }

    fn events(board: &Board) -> Vec<Event> {
        board.events.borrow().clone()
    }

    #[test]
    fn test_program_grants_processor_then_hands_back() {
        let mut board = board();
        run(&mut board, true).unwrap();

        assert_eq!(
            events(&board),
            vec![
                Event::Grant(BusOwner::Processor),
                Event::Open,
                Event::Unload,
                Event::Grant(BusOwner::Fpga),
            ]
        );
        assert_eq!(&board.mtd.data()[..board.bytes.len()], &board.bytes[..]);
        assert!(board.dir.path().join("image.hex.bin").exists());
    }

    #[test]
    fn test_partition_update_hands_back() {
        let mut board = board();
        let mut stale = board.bytes.clone();
        stale[0x1800] ^= 0xFF;
        board.mtd = DummyMtd::with_data(
            DummyConfig {
                size: 0x10000,
                erase_size: 0x1000,
                path: "/dev/mtd0".to_string(),
            },
            &stale,
        )
        .unwrap();
        board.opts.partition = true;

        run(&mut board, true).unwrap();

        assert_eq!(&board.mtd.data()[..board.bytes.len()], &board.bytes[..]);
        assert_eq!(board.mtd.erases().len(), 1);
        assert_eq!(
            events(&board).last(),
            Some(&Event::Grant(BusOwner::Fpga))
        );
    }

    #[test]
    fn test_verify_failure_keeps_bus() {
        let mut board = board();
        board.mtd.stick_byte(0x10, 0xAA);

        let err = run(&mut board, true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<vflashcp_core::Error>(),
            Some(vflashcp_core::Error::VerifyMismatch { start: 0, end: 0x1000 })
        ));
        assert_eq!(
            events(&board),
            vec![Event::Grant(BusOwner::Processor), Event::Open]
        );
    }

    #[test]
    fn test_unprivileged_touches_nothing() {
        let mut board = board();

        let err = run(&mut board, false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<vflashcp_core::Error>(),
            Some(vflashcp_core::Error::PermissionDenied)
        ));
        assert!(events(&board).is_empty());
        assert!(!board.dir.path().join("image.hex.bin").exists());
    }

    #[test]
    fn test_bad_hex_never_opens_device() {
        let mut board = board();
        fs::write(&board.opts.input, "ff\nzz\n").unwrap();

        let err = run(&mut board, true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<vflashcp_core::Error>(),
            Some(vflashcp_core::Error::InvalidHex { line: 2, .. })
        ));
        assert!(events(&board).is_empty());
    }
}
