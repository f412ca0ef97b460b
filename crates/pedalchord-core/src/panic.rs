//! The panic command: a fixed sequence of raw messages.
//!
//! It is sent on demand (bank-select CC 123, `SendPanic` pedals) and is also
//! recognised on input, where a device's own panic sequence is let through
//! untouched.

use crate::error::Result;
use crate::message::MidiMessage;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanicCommand {
    messages: Vec<MidiMessage>,
}

impl PanicCommand {
    /// One hex message per line; blank lines and `//` comments are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let messages = text
            .split(|c: char| c == '\r' || c == '\n')
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("//"))
            .map(MidiMessage::parse_hex)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { messages })
    }

    pub fn messages(&self) -> &[MidiMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Position inside the panic sequence as seen on input.
#[derive(Debug, Default)]
pub(crate) struct PanicTracker {
    pointer: usize,
}

impl PanicTracker {
    /// Returns `true` when `event` continues the sequence. A mismatch restarts
    /// matching, so the event is checked against the first message again.
    pub(crate) fn observe(&mut self, command: &PanicCommand, event: &[u8]) -> bool {
        let messages = command.messages();
        if messages.is_empty() {
            return false;
        }

        if messages[self.pointer].bytes() == event {
            self.pointer = (self.pointer + 1) % messages.len();
            return true;
        }

        if self.pointer != 0 {
            self.pointer = 0;
            if messages[0].bytes() == event {
                self.pointer = 1 % messages.len();
                return true;
            }
        }
        false
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> usize {
        self.pointer
    }
}
