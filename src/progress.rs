//! Progress reporter using indicatif progress bars

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use vflashcp_core::progress::Progress;

/// Shows one bar per phase, finishing the previous one when a phase starts
pub struct IndicatifProgress {
    multi: MultiProgress,
    current_bar: Option<ProgressBar>,
}

impl IndicatifProgress {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            current_bar: None,
        }
    }

    fn byte_bar(&mut self, total: u64, phase: &str) {
        self.finish_bar();
        let pb = self.multi.add(ProgressBar::new(total));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(&format!(
                    "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                    phase
                ))
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        self.current_bar = Some(pb);
    }

    fn block_bar(&mut self, total: u64, phase: &str) {
        self.finish_bar();
        let pb = self.multi.add(ProgressBar::new(total));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(&format!(
                    "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} blocks {} {{msg}}",
                    phase
                ))
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        self.current_bar = Some(pb);
    }

    fn set_position(&self, pos: u64) {
        if let Some(pb) = &self.current_bar {
            pb.set_position(pos);
        }
    }

    fn finish_bar(&mut self) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish();
        }
    }
}

impl Progress for IndicatifProgress {
    fn erasing(&mut self, blocks: u64, bytes: u64) {
        self.block_bar(blocks, "Erasing");
        if let Some(pb) = &self.current_bar {
            pb.set_message(format!("({} bytes)", bytes));
        }
    }

    fn erase_progress(&mut self, blocks_erased: u64) {
        self.set_position(blocks_erased);
    }

    fn writing(&mut self, bytes: u64) {
        self.byte_bar(bytes, "Writing");
    }

    fn write_progress(&mut self, bytes_written: u64) {
        self.set_position(bytes_written);
    }

    fn verifying(&mut self, bytes: u64) {
        self.byte_bar(bytes, "Verifying");
    }

    fn verify_progress(&mut self, bytes_verified: u64) {
        self.set_position(bytes_verified);
    }

    fn comparing(&mut self, blocks: u64) {
        self.block_bar(blocks, "Processing");
    }

    fn compare_progress(&mut self, blocks_done: u64, blocks_rewritten: u64) {
        if let Some(pb) = &self.current_bar {
            pb.set_position(blocks_done);
            pb.set_message(format!("({} rewritten)", blocks_rewritten));
        }
    }

    fn finish(&mut self) {
        self.finish_bar();
    }
}
