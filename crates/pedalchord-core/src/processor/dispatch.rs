//! Per-kind event handlers.

use super::{HeldPedal, Processor};
use crate::config::{
    BankSelect, OnBankChange, QuitStatus, Trigger, CC_LAST_BANK, CC_LIST_BANKS, CC_NEXT_BANK,
    CC_PANIC, CC_PREVIOUS_BANK, MAX_DIRECT_BANK,
};
use crate::message::{MessageKind, MidiMessage, NOTE_ON, SYSTEM_EXCLUSIVE};
use tracing::{debug, info};

type Handler = fn(&mut Processor, &[u8], &mut Vec<MidiMessage>);

/// Indexed by `MessageKind as usize`.
const HANDLERS: [Handler; MessageKind::COUNT] = [
    Processor::on_note,             // NoteOff
    Processor::on_note,             // NoteOn
    Processor::passthrough,         // PolyPressure
    Processor::on_control_change,   // ControlChange
    Processor::passthrough,         // ProgramChange
    Processor::passthrough,         // ChannelPressure
    Processor::passthrough,         // PitchBend
    Processor::on_system_exclusive, // SystemExclusive
    Processor::passthrough,         // SystemCommon
    Processor::passthrough,         // SystemRealTime
    Processor::on_system_exclusive, // Data
];

pub(super) fn handler(kind: MessageKind) -> Handler {
    HANDLERS[kind as usize]
}

impl Processor {
    /// Forwards the event unchanged when echo is on.
    pub(super) fn passthrough(&mut self, event: &[u8], out: &mut Vec<MidiMessage>) {
        if self.controller.midi_echo {
            out.push(MidiMessage::from_bytes(event));
        }
    }

    fn on_note(&mut self, event: &[u8], out: &mut Vec<MidiMessage>) {
        let &[status, note, velocity] = event else {
            return self.passthrough(event, out);
        };
        if status & 0x0F != self.controller.in_channel {
            return self.passthrough(event, out);
        }

        let is_note_on = status & 0xF0 == NOTE_ON;
        if is_note_on && velocity == 0 && self.controller.min_velocity_note_off {
            self.release(event, note, 0, true, out);
        } else if is_note_on {
            self.press(event, note, velocity, out);
        } else {
            self.release(event, note, velocity, false, out);
        }
    }

    fn press(&mut self, event: &[u8], note: u8, velocity: u8, out: &mut Vec<MidiMessage>) {
        let Some(pedal) = self.controller.find_pedal(self.current_bank, note) else {
            return self.passthrough(event, out);
        };

        if self.controller.pedal_monophony {
            let previous = std::mem::take(&mut self.held);
            for entry in previous.into_values() {
                self.emit_note_off(entry.pedal, entry.velocity, out);
            }
        }

        self.emit_note_on(pedal, velocity, out);
        out.extend_from_slice(
            self.controller
                .pedal(pedal)
                .extra_messages(Trigger::NoteOn),
        );
        self.held.insert(note, HeldPedal { pedal, velocity });
    }

    /// `swapped` marks a NOTE ON with velocity 0 read as NOTE OFF; its note
    /// messages go out with velocity 0.
    fn release(
        &mut self,
        event: &[u8],
        note: u8,
        velocity: u8,
        swapped: bool,
        out: &mut Vec<MidiMessage>,
    ) {
        let held = self.held.remove(&note);
        let pedal = match held {
            Some(entry) => entry.pedal,
            None => match self.controller.find_pedal(self.current_bank, note) {
                Some(pedal) => pedal,
                None => return self.passthrough(event, out),
            },
        };

        // Under monophony a pedal that is not held was already released.
        if held.is_some() || !self.controller.pedal_monophony {
            let compiled = self.controller.pedal(pedal);
            out.extend(compiled.note_off.iter().map(|message| {
                if swapped {
                    message.render_with_velocity(0)
                } else {
                    message.render(velocity)
                }
            }));
        }

        let compiled = self.controller.pedal(pedal);
        out.extend_from_slice(compiled.extra_messages(Trigger::NoteOff));

        if let Some(select) = compiled.bank_select {
            self.apply_bank_select(select, out);
        }
    }

    fn apply_bank_select(&mut self, select: BankSelect, out: &mut Vec<MidiMessage>) {
        match select {
            BankSelect::Bank(bank) => self.change_bank(bank, out),
            BankSelect::List => out.push(self.controller.bank_list_sysex().clone()),
            BankSelect::Quit(status) => self.quit(status),
        }
    }

    fn on_control_change(&mut self, event: &[u8], out: &mut Vec<MidiMessage>) {
        let &[status, controller, value] = event else {
            return self.passthrough(event, out);
        };
        if status & 0x0F != self.controller.in_channel
            || controller != self.controller.bank_select_controller
        {
            return self.passthrough(event, out);
        }

        let banks = self.controller.banks().len();
        let last = banks - 1;
        match value {
            0..=MAX_DIRECT_BANK => self.change_bank((value as usize).min(last), out),
            CC_LIST_BANKS => out.push(self.controller.bank_list_sysex().clone()),
            CC_PREVIOUS_BANK => self.change_bank((self.current_bank + last) % banks, out),
            CC_NEXT_BANK => self.change_bank((self.current_bank + 1) % banks, out),
            CC_LAST_BANK => self.change_bank(last, out),
            CC_PANIC => self.send_panic(out),
            _ => {
                if let Some(status) = QuitStatus::from_controller_value(value) {
                    self.quit(status);
                }
            }
        }
    }

    fn on_system_exclusive(&mut self, event: &[u8], out: &mut Vec<MidiMessage>) {
        if event[0] != SYSTEM_EXCLUSIVE && !self.sysex.is_open() {
            return self.passthrough(event, out);
        }
        if let Some(message) = self.sysex.push(event) {
            if self.controller.midi_echo {
                out.push(MidiMessage::from(message));
            }
        }
    }

    fn send_panic(&mut self, out: &mut Vec<MidiMessage>) {
        let panic = self.controller.panic_command();
        if panic.is_empty() {
            debug!("Panic requested but no panic command is configured");
        } else {
            out.extend_from_slice(panic.messages());
        }
        self.held.clear();
    }

    fn quit(&mut self, status: QuitStatus) {
        info!("{} requested", status.name());
        self.status = Some(status);
    }

    fn change_bank(&mut self, bank: usize, out: &mut Vec<MidiMessage>) {
        if bank == self.current_bank {
            return;
        }
        self.current_bank = bank;
        info!(
            "Bank changed to {}: {}",
            bank + 1,
            self.controller.banks()[bank].name
        );

        match self.controller.on_bank_change {
            OnBankChange::ContinuePlayback => {}
            OnBankChange::StopPlayback => self.release_all(out),
            OnBankChange::QuickChange => {
                let held = std::mem::take(&mut self.held);
                for (note, entry) in held {
                    self.emit_note_off(entry.pedal, entry.velocity, out);
                    if let Some(pedal) = self.controller.find_pedal(bank, note) {
                        self.emit_note_on(pedal, entry.velocity, out);
                        self.held.insert(
                            note,
                            HeldPedal {
                                pedal,
                                velocity: entry.velocity,
                            },
                        );
                    }
                }
            }
        }
    }
}
