//! Live output callbacks

use super::result::ExecutionResult;

/// Receives output while a program runs. Chunks are whole lines (the last
/// one may lack its newline) and arrive in write order within a stream.
/// All calls happen on the thread that called `Executor::run_with`.
pub trait OutputSink {
    fn on_output_chunk(&mut self, _text: &str) {}

    fn on_error_chunk(&mut self, _text: &str) {}

    fn on_finished(&mut self, _result: &ExecutionResult) {}
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {}
