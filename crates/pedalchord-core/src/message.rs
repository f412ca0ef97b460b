//! Raw MIDI messages as they travel through the dispatcher.
//!
//! Messages are kept as plain byte sequences: channel messages fit inline,
//! SysEx spills to the heap.

use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;

pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;
pub const CONTROL_CHANGE: u8 = 0xB0;
pub const SYSTEM_EXCLUSIVE: u8 = 0xF0;
pub const END_OF_EXCLUSIVE: u8 = 0xF7;

/// Coarse message classification used to index the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    NoteOff,
    NoteOn,
    PolyPressure,
    ControlChange,
    ProgramChange,
    ChannelPressure,
    PitchBend,
    /// `F0` or `F7`.
    SystemExclusive,
    SystemCommon,
    SystemRealTime,
    /// Leading data byte: a SysEx continuation chunk or running status.
    Data,
}

impl MessageKind {
    pub const COUNT: usize = 11;

    pub fn of(first_byte: u8) -> Self {
        match first_byte {
            0x00..=0x7F => MessageKind::Data,
            0x80..=0x8F => MessageKind::NoteOff,
            0x90..=0x9F => MessageKind::NoteOn,
            0xA0..=0xAF => MessageKind::PolyPressure,
            0xB0..=0xBF => MessageKind::ControlChange,
            0xC0..=0xCF => MessageKind::ProgramChange,
            0xD0..=0xDF => MessageKind::ChannelPressure,
            0xE0..=0xEF => MessageKind::PitchBend,
            SYSTEM_EXCLUSIVE | END_OF_EXCLUSIVE => MessageKind::SystemExclusive,
            0xF1..=0xF6 => MessageKind::SystemCommon,
            0xF8..=0xFF => MessageKind::SystemRealTime,
        }
    }

    pub fn is_channel_message(self) -> bool {
        !matches!(
            self,
            MessageKind::SystemExclusive
                | MessageKind::SystemCommon
                | MessageKind::SystemRealTime
                | MessageKind::Data
        )
    }
}

/// Total length of a non-SysEx message introduced by `status`, or `None`
/// for status bytes that cannot start a complete message on their own
/// (undefined system bytes, `F0`, `F7`).
pub fn message_len(status: u8) -> Option<usize> {
    match status {
        0x80..=0xBF | 0xE0..=0xEF => Some(3),
        0xC0..=0xDF => Some(2),
        0xF1 | 0xF3 => Some(2),
        0xF2 => Some(3),
        0xF6 | 0xF8 | 0xFA | 0xFB | 0xFC | 0xFE | 0xFF => Some(1),
        _ => None,
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct MidiMessage {
    bytes: SmallVec<[u8; 3]>,
}

impl MidiMessage {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: SmallVec::from_slice(bytes),
        }
    }

    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self::channel_message(NOTE_ON, channel, note, velocity)
    }

    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Self {
        Self::channel_message(NOTE_OFF, channel, note, velocity)
    }

    pub fn control_change(channel: u8, controller: u8, value: u8) -> Self {
        Self::channel_message(CONTROL_CHANGE, channel, controller, value)
    }

    fn channel_message(kind: u8, channel: u8, data1: u8, data2: u8) -> Self {
        let channel = channel.min(15); // MIDI channels are 0-15
        Self::from_bytes(&[kind | channel, data1 & 0x7F, data2 & 0x7F])
    }

    /// Parses space-separated hex byte pairs (`"B0 7B 00"`) and checks that
    /// they form exactly one complete MIDI message or one `F0 .. F7` SysEx.
    pub fn parse_hex(text: &str) -> Result<Self> {
        let mut bytes = SmallVec::<[u8; 3]>::new();
        for token in text.split_whitespace() {
            let byte = (token.len() == 2 && token.bytes().all(|b| b.is_ascii_hexdigit()))
                .then(|| u8::from_str_radix(token, 16).ok())
                .flatten()
                .ok_or_else(|| {
                    Error::Config(format!(
                        "invalid MIDI message '{}': '{}' is not a hex byte",
                        text, token
                    ))
                })?;
            bytes.push(byte);
        }

        let message = Self { bytes };
        if !message.is_complete() {
            return Err(Error::Config(format!("invalid MIDI message '{}'", text)));
        }
        Ok(message)
    }

    /// Whether the bytes form one well-formed message.
    pub fn is_complete(&self) -> bool {
        let Some((&status, data)) = self.bytes.split_first() else {
            return false;
        };

        if status == SYSTEM_EXCLUSIVE {
            return match data.split_last() {
                Some((&END_OF_EXCLUSIVE, payload)) => {
                    !payload.is_empty() && payload.iter().all(|b| *b < 0x80)
                }
                _ => false,
            };
        }

        match message_len(status) {
            Some(len) => self.bytes.len() == len && data.iter().all(|b| *b < 0x80),
            None => false,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes.into_vec()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn kind(&self) -> Option<MessageKind> {
        self.bytes.first().map(|b| MessageKind::of(*b))
    }

    pub fn is_sysex(&self) -> bool {
        self.bytes.first() == Some(&SYSTEM_EXCLUSIVE)
    }

    /// Low nibble of the status byte, for channel messages only.
    pub fn channel(&self) -> Option<u8> {
        let status = *self.bytes.first()?;
        MessageKind::of(status)
            .is_channel_message()
            .then_some(status & 0x0F)
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.bytes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MidiMessage[{}]", self)
    }
}

impl AsRef<[u8]> for MidiMessage {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for MidiMessage {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            bytes: SmallVec::from_vec(bytes),
        }
    }
}

impl From<&[u8]> for MidiMessage {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}
