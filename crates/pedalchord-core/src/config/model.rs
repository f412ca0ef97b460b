//! The compiled controller: immutable once built.

use crate::message::MidiMessage;
use crate::panic::PanicCommand;
use crate::velocity::Velocity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Highest bank-select controller value that addresses a bank directly.
pub const MAX_DIRECT_BANK: u8 = 118;
pub const CC_LIST_BANKS: u8 = 119;
pub const CC_PREVIOUS_BANK: u8 = 120;
pub const CC_NEXT_BANK: u8 = 121;
pub const CC_LAST_BANK: u8 = 122;
pub const CC_PANIC: u8 = 123;

/// What still-held pedals do when the bank changes under them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OnBankChange {
    #[default]
    ContinuePlayback,
    StopPlayback,
    QuickChange,
}

/// Why the dispatcher stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuitStatus {
    Quit,
    Reload,
    Reboot,
    Shutdown,
}

impl QuitStatus {
    /// Bank-select controller values 124..=127.
    pub fn from_controller_value(value: u8) -> Option<Self> {
        match value {
            124 => Some(QuitStatus::Quit),
            125 => Some(QuitStatus::Reload),
            126 => Some(QuitStatus::Reboot),
            127 => Some(QuitStatus::Shutdown),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QuitStatus::Quit => "Quit",
            QuitStatus::Reload => "Reload",
            QuitStatus::Reboot => "Reboot",
            QuitStatus::Shutdown => "Shutdown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankSelect {
    /// Zero-based target bank.
    Bank(usize),
    List,
    Quit(QuitStatus),
}

/// Which trigger an extra message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    NoteOn,
    NoteOff,
}

/// Address of a pedal inside the compiled controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PedalRef {
    pub bank: usize,
    pub pedal: usize,
}

/// A note message whose velocity may still depend on the strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteMessage {
    pub status: u8,
    pub note: u8,
    pub velocity: Velocity,
}

impl NoteMessage {
    pub fn render(&self, strike: u8) -> MidiMessage {
        MidiMessage::from_bytes(&[self.status, self.note, self.velocity.resolve(strike)])
    }

    pub fn render_with_velocity(&self, velocity: u8) -> MidiMessage {
        MidiMessage::from_bytes(&[self.status, self.note, velocity & 0x7F])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pedal {
    /// Input note that triggers the pedal.
    pub note: u8,
    pub bass_notes: Vec<u8>,
    pub chord_notes: Vec<u8>,
    pub note_on: Vec<NoteMessage>,
    pub note_off: Vec<NoteMessage>,
    pub on_note_on: Vec<MidiMessage>,
    pub on_note_off: Vec<MidiMessage>,
    pub bank_select: Option<BankSelect>,
}

impl Pedal {
    pub fn extra_messages(&self, trigger: Trigger) -> &[MidiMessage] {
        match trigger {
            Trigger::NoteOn => &self.on_note_on,
            Trigger::NoteOff => &self.on_note_off,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bank {
    pub name: String,
    pub pedals: Vec<Pedal>,
    pub(crate) pedal_list: HashMap<u8, usize>,
}

impl Bank {
    pub fn pedal_for_note(&self, note: u8) -> Option<usize> {
        self.pedal_list.get(&note).copied()
    }
}

#[derive(Debug, Clone)]
pub struct Controller {
    pub in_channel: u8,
    pub midi_echo: bool,
    pub pedal_monophony: bool,
    pub min_velocity_note_off: bool,
    pub on_bank_change: OnBankChange,
    pub bank_select_controller: u8,
    pub initial_bank: usize,
    pub(crate) banks: Vec<Bank>,
    pub(crate) start: Vec<MidiMessage>,
    pub(crate) stop: Vec<MidiMessage>,
    pub(crate) panic: PanicCommand,
    pub(crate) bank_list: MidiMessage,
}

impl Controller {
    pub fn banks(&self) -> &[Bank] {
        &self.banks
    }

    pub fn pedal(&self, pedal: PedalRef) -> &Pedal {
        &self.banks[pedal.bank].pedals[pedal.pedal]
    }

    pub fn find_pedal(&self, bank: usize, note: u8) -> Option<PedalRef> {
        let index = self.banks.get(bank)?.pedal_for_note(note)?;
        Some(PedalRef { bank, pedal: index })
    }

    pub fn start_messages(&self) -> &[MidiMessage] {
        &self.start
    }

    pub fn stop_messages(&self) -> &[MidiMessage] {
        &self.stop
    }

    pub fn panic_command(&self) -> &PanicCommand {
        &self.panic
    }

    pub fn bank_list_sysex(&self) -> &MidiMessage {
        &self.bank_list
    }

    pub fn pedal_count(&self) -> usize {
        self.banks.iter().map(|bank| bank.pedals.len()).sum()
    }
}
