//! Reassembly of SysEx messages split across several input events.

use crate::message::{END_OF_EXCLUSIVE, SYSTEM_EXCLUSIVE};
use tracing::debug;

#[derive(Debug, Default)]
pub(crate) struct SysExBuffer {
    bytes: Vec<u8>,
    chunks: usize,
}

impl SysExBuffer {
    pub(crate) fn is_open(&self) -> bool {
        !self.bytes.is_empty()
    }

    /// Appends a chunk and returns the whole message once its `F7` arrives.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Option<Vec<u8>> {
        if chunk.first() == Some(&SYSTEM_EXCLUSIVE) && self.is_open() {
            debug!(
                "Discarding unterminated SysEx of {} bytes ({} chunks)",
                self.bytes.len(),
                self.chunks
            );
            self.bytes.clear();
            self.chunks = 0;
        }

        self.bytes.extend_from_slice(chunk);
        self.chunks += 1;

        if self.bytes.last() == Some(&END_OF_EXCLUSIVE) {
            debug!("SysEx complete after {} chunks", self.chunks);
            self.chunks = 0;
            return Some(std::mem::take(&mut self.bytes));
        }
        None
    }
}
