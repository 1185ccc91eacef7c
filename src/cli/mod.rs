//! Command-line surface

mod args;

pub use args::{Args, Backend, SubCommand};

use crate::sandbox::OutputSink;

/// Echoes program output to stderr as it arrives
#[derive(Debug, Default)]
pub struct EchoSink;

impl OutputSink for EchoSink {
    fn on_output_chunk(&mut self, text: &str) {
        eprint!("[stdout] {}", text);
        if !text.ends_with('\n') {
            eprintln!();
        }
    }

    fn on_error_chunk(&mut self, text: &str) {
        eprint!("[stderr] {}", text);
        if !text.ends_with('\n') {
            eprintln!();
        }
    }
}
