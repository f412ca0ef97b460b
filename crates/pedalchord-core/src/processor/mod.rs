//! The dispatch state machine.
//!
//! A [`Processor`] owns a compiled [`Controller`] and the runtime state built
//! on top of it: the current bank, the held pedals, a SysEx reassembly buffer,
//! the panic sequence position and the quit latch. Each input event produces
//! an ordered list of output messages.
//!
//! ```
//! use pedalchord_core::config::{compile, ControllerDocument};
//! use pedalchord_core::Processor;
//!
//! let document = ControllerDocument::from_json(
//!     r#"{ "BassPedalVelocity": "100",
//!          "Bank": [ { "Pedal": [ { "Note": 36, "BassNote": "C", "Octave": 1 } ] } ] }"#,
//! )?;
//! let mut processor = Processor::new(compile(&document)?);
//!
//! let out = processor.process(&[0x90, 36, 64]);
//! assert_eq!(out[0].bytes(), &[0x90, 36, 100]);
//! # Ok::<(), pedalchord_core::Error>(())
//! ```

mod dispatch;
mod sysex;

use crate::config::{Controller, PedalRef, QuitStatus};
use crate::message::{MessageKind, MidiMessage};
use crate::panic::PanicTracker;
use std::collections::BTreeMap;
use sysex::SysExBuffer;
use tracing::debug;

/// A pedal that is currently sounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldPedal {
    pub pedal: PedalRef,
    /// Velocity of the strike that started it.
    pub velocity: u8,
}

/// Turns raw input events into output messages for one compiled controller.
pub struct Processor {
    controller: Controller,
    current_bank: usize,
    held: BTreeMap<u8, HeldPedal>,
    sysex: SysExBuffer,
    panic: PanicTracker,
    status: Option<QuitStatus>,
}

impl Processor {
    /// Starts on the controller's initial bank with nothing held.
    pub fn new(controller: Controller) -> Self {
        let current_bank = controller.initial_bank;
        Self {
            controller,
            current_bank,
            held: BTreeMap::new(),
            sysex: SysExBuffer::default(),
            panic: PanicTracker::default(),
            status: None,
        }
    }

    /// Handles one raw input event.
    pub fn process(&mut self, event: &[u8]) -> Vec<MidiMessage> {
        let mut out = Vec::new();
        let Some(&first) = event.first() else {
            return out;
        };

        if self.panic.observe(self.controller.panic_command(), event) {
            debug!("Panic sequence message {:02X?} passed through", event);
            out.push(MidiMessage::from_bytes(event));
            return out;
        }

        dispatch::handler(MessageKind::of(first))(self, event, &mut out);

        if self.status.is_some() && !self.held.is_empty() {
            self.release_all(&mut out);
        }

        debug!("{:02X?} -> {:?}", event, out);
        out
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Zero-based.
    pub fn current_bank(&self) -> usize {
        self.current_bank
    }

    /// Input notes of the pedals currently sounding, ascending.
    pub fn held_notes(&self) -> Vec<u8> {
        self.held.keys().copied().collect()
    }

    pub fn held_pedal(&self, note: u8) -> Option<HeldPedal> {
        self.held.get(&note).copied()
    }

    /// True once a quit command has been seen.
    pub fn is_quit(&self) -> bool {
        self.status.is_some()
    }

    pub fn status(&self) -> Option<QuitStatus> {
        self.status
    }

    /// NOTE OFFs for every held pedal, leaving nothing held.
    pub fn release_held(&mut self) -> Vec<MidiMessage> {
        let mut out = Vec::new();
        self.release_all(&mut out);
        out
    }

    pub fn bank_list_sysex(&self) -> &MidiMessage {
        self.controller.bank_list_sysex()
    }

    /// Sent once before the first event is processed.
    pub fn start_messages(&self) -> &[MidiMessage] {
        self.controller.start_messages()
    }

    /// Sent once after the held pedals are released on exit.
    pub fn stop_messages(&self) -> &[MidiMessage] {
        self.controller.stop_messages()
    }

    fn emit_note_on(&self, pedal: PedalRef, strike: u8, out: &mut Vec<MidiMessage>) {
        out.extend(
            self.controller
                .pedal(pedal)
                .note_on
                .iter()
                .map(|message| message.render(strike)),
        );
    }

    /// NOTE OFF for a pedal released on our own initiative.
    fn emit_note_off(&self, pedal: PedalRef, strike: u8, out: &mut Vec<MidiMessage>) {
        out.extend(
            self.controller
                .pedal(pedal)
                .note_off
                .iter()
                .map(|message| message.render(strike)),
        );
    }

    fn release_all(&mut self, out: &mut Vec<MidiMessage>) {
        let held = std::mem::take(&mut self.held);
        for entry in held.values() {
            self.emit_note_off(entry.pedal, entry.velocity, out);
        }
    }
}
