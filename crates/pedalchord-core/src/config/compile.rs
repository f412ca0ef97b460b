//! Turns a validated [`ControllerDocument`] into a [`Controller`].

use super::document::{
    parse_channel_list, BankDocument, ControllerDocument, MessageBlock, MessageDocument,
    MessageType, Overrides, PedalDocument, Scalar,
};
use super::model::{Bank, BankSelect, Controller, NoteMessage, Pedal, QuitStatus, Trigger};
use crate::error::{Error, Result};
use crate::message::{MidiMessage, NOTE_OFF, NOTE_ON};
use crate::note::{note_label, transpose, NoteSpec};
use crate::panic::PanicCommand;
use crate::sysex::build_bank_list;
use crate::velocity::{resolve_level, Level, Velocity, TRANSPOSE_RANGE, VELOCITY_RANGE};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use tracing::{debug, info, warn};

/// Overridable attributes of one level, parsed but not yet inherited.
#[derive(Debug, Clone, Default)]
struct LevelSettings {
    bass_channels: Option<Vec<u8>>,
    chord_channels: Option<Vec<u8>>,
    bass_velocity: Option<Vec<Level>>,
    chord_velocity: Option<Vec<Level>>,
    bass_transpose: Option<Vec<Level>>,
    chord_transpose: Option<Vec<Level>>,
    octave: Option<i32>,
}

fn parse_levels(
    value: &Option<Scalar>,
    parse: fn(&str) -> Result<Level>,
) -> Result<Option<Vec<Level>>> {
    value
        .as_ref()
        .map(|value| value.items().iter().map(|item| parse(item)).collect())
        .transpose()
}

impl LevelSettings {
    fn parse(overrides: &Overrides) -> Result<Self> {
        let channels = |value: &Option<Scalar>, what: &str| {
            value
                .as_ref()
                .map(|value| parse_channel_list(value, what))
                .transpose()
        };

        Ok(Self {
            bass_channels: channels(&overrides.out_bass_pedal_channel, "OutBassPedalChannel")?,
            chord_channels: channels(&overrides.out_chord_channel, "OutChordChannel")?,
            bass_velocity: parse_levels(&overrides.bass_pedal_velocity, Level::parse_velocity)?,
            chord_velocity: parse_levels(&overrides.chord_velocity, Level::parse_velocity)?,
            bass_transpose: parse_levels(&overrides.bass_pedal_transpose, Level::parse_transpose)?,
            chord_transpose: parse_levels(&overrides.chord_transpose, Level::parse_transpose)?,
            octave: overrides
                .octave
                .as_ref()
                .map(|value| {
                    let n = value.to_int("Octave")?;
                    i32::try_from(n)
                        .map_err(|_| Error::Config(format!("Octave {} is out of range", n)))
                })
                .transpose()?,
        })
    }
}

/// Prefixes config errors with where they happened.
fn in_scope(scope: &str) -> impl Fn(Error) -> Error + '_ {
    move |e| match e {
        Error::Config(msg) => Error::Config(format!("{}: {}", scope, msg)),
        other => other,
    }
}

/// Repeats the last value until the list covers every channel.
fn pad_to_channels(values: &[Level], channels: usize, what: &str) -> Result<Vec<Level>> {
    if values.len() > channels {
        return Err(Error::Config(format!(
            "{} has {} values for {} output channels",
            what,
            values.len(),
            channels
        )));
    }
    let mut padded = values.to_vec();
    if let Some(last) = values.last().copied() {
        padded.resize(channels, last);
    }
    Ok(padded)
}

/// Per-channel inheritance of one attribute over global → bank → pedal.
fn resolve_per_channel(
    levels: [Option<&Vec<Level>>; 3],
    channels: usize,
    what: &str,
    range: &RangeInclusive<i32>,
) -> Result<Vec<Option<Level>>> {
    let [global, bank, pedal] = levels
        .map(|values| values.map(|values| pad_to_channels(values, channels, what)).transpose());
    let (global, bank, pedal) = (global?, bank?, pedal?);

    let at = |values: &Option<Vec<Level>>, i: usize| values.as_ref().map(|values| values[i]);
    Ok((0..channels)
        .map(|i| resolve_level(at(&global, i), at(&bank, i), at(&pedal, i), range))
        .collect())
}

fn parse_message(message: &MessageDocument) -> Result<MidiMessage> {
    let parsed = MidiMessage::parse_hex(&message.string)?;
    let matches_type = match message.kind {
        MessageType::Midi => !parsed.is_sysex(),
        MessageType::SysEx => parsed.is_sysex(),
    };
    if !matches_type {
        return Err(Error::Config(format!(
            "message '{}' is not of type {:?}",
            message.string, message.kind
        )));
    }
    Ok(parsed)
}

fn parse_message_list(messages: &[MessageDocument]) -> Result<Vec<MidiMessage>> {
    messages.iter().map(parse_message).collect()
}

fn push_note_pair(
    channel: u8,
    note: u8,
    velocity: Option<Level>,
    note_on: &mut Vec<NoteMessage>,
    note_off: &mut Vec<NoteMessage>,
) {
    let velocity = Velocity::from_level(velocity);
    note_on.push(NoteMessage {
        status: NOTE_ON | channel,
        note,
        velocity,
    });
    note_off.push(NoteMessage {
        status: NOTE_OFF | channel,
        note,
        velocity,
    });
}

struct Compiler<'a> {
    document: &'a ControllerDocument,
    global: LevelSettings,
    panic: PanicCommand,
}

/// Compiles `document`, failing on the first invalid value.
pub fn compile(document: &ControllerDocument) -> Result<Controller> {
    document.validate()?;

    let panic = match document.panic_text()? {
        Some(text) => PanicCommand::parse(&text)?,
        None => PanicCommand::default(),
    };
    let compiler = Compiler {
        document,
        global: LevelSettings::parse(&document.overrides).map_err(in_scope("global"))?,
        panic,
    };

    let mut banks = Vec::with_capacity(document.banks.len());
    for (index, bank) in document.banks.iter().enumerate() {
        banks.push(compiler.compile_bank(index, bank)?);
    }

    let names: Vec<&str> = banks.iter().map(|bank| bank.name.as_str()).collect();
    let bank_list = build_bank_list(&names)?;

    let block = |block: &Option<MessageBlock>| match block {
        Some(block) => parse_message_list(&block.messages),
        None => Ok(Vec::new()),
    };

    let controller = Controller {
        in_channel: document.in_channel()?,
        midi_echo: document.midi_echo,
        pedal_monophony: document.pedal_monophony,
        min_velocity_note_off: document.min_velocity_note_off,
        on_bank_change: document.on_bank_change,
        bank_select_controller: document.bank_select_controller()?,
        initial_bank: document.initial_bank()?,
        start: block(&document.start)?,
        stop: block(&document.stop)?,
        panic: compiler.panic,
        bank_list,
        banks,
    };

    info!(
        "Compiled {} banks with {} pedals",
        controller.banks.len(),
        controller.pedal_count()
    );
    Ok(controller)
}

impl Compiler<'_> {
    fn compile_bank(&self, index: usize, bank: &BankDocument) -> Result<Bank> {
        let scope = format!("bank {}", index + 1);
        let settings = LevelSettings::parse(&bank.overrides).map_err(in_scope(&scope))?;

        let name = match bank.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Bank{}", index + 1),
        };

        let mut pedals = Vec::with_capacity(bank.pedals.len());
        let mut pedal_list = HashMap::new();
        for (pedal_index, pedal) in bank.pedals.iter().enumerate() {
            let pedal_scope = format!("{} pedal {}", scope, pedal_index + 1);
            let compiled = self
                .compile_pedal(index, &settings, pedal)
                .map_err(in_scope(&pedal_scope))?;
            if let Some(previous) = pedal_list.insert(compiled.note, pedal_index) {
                warn!(
                    "Bank '{}': pedal {} reuses note {} of pedal {}, the later one wins",
                    name,
                    pedal_index + 1,
                    compiled.note,
                    previous + 1
                );
            }
            pedals.push(compiled);
        }

        debug!("Bank {} '{}': {} pedals", index + 1, name, pedals.len());
        Ok(Bank {
            name,
            pedals,
            pedal_list,
        })
    }

    fn compile_pedal(
        &self,
        bank_index: usize,
        bank: &LevelSettings,
        document: &PedalDocument,
    ) -> Result<Pedal> {
        let pedal = LevelSettings::parse(&document.overrides)?;
        let global = &self.global;

        let octave = pedal.octave.or(bank.octave).or(global.octave).unwrap_or(0);
        let trigger = match &document.note {
            Some(note) => NoteSpec::parse(&note.as_text())?.base_note(Some(octave))?,
            None => return Err(Error::Config("missing Note".to_string())),
        };

        let bass_channels = pedal
            .bass_channels
            .as_ref()
            .or(bank.bass_channels.as_ref())
            .or(global.bass_channels.as_ref())
            .cloned()
            .unwrap_or_else(|| vec![0]);
        let chord_channels = pedal
            .chord_channels
            .as_ref()
            .or(bank.chord_channels.as_ref())
            .or(global.chord_channels.as_ref())
            .cloned()
            .unwrap_or_else(|| vec![0]);

        let bass_velocity = resolve_per_channel(
            [
                global.bass_velocity.as_ref(),
                bank.bass_velocity.as_ref(),
                pedal.bass_velocity.as_ref(),
            ],
            bass_channels.len(),
            "BassPedalVelocity",
            &VELOCITY_RANGE,
        )?;
        let chord_velocity = resolve_per_channel(
            [
                global.chord_velocity.as_ref(),
                bank.chord_velocity.as_ref(),
                pedal.chord_velocity.as_ref(),
            ],
            chord_channels.len(),
            "ChordVelocity",
            &VELOCITY_RANGE,
        )?;
        let bass_transpose: Vec<i32> = resolve_per_channel(
            [
                global.bass_transpose.as_ref(),
                bank.bass_transpose.as_ref(),
                pedal.bass_transpose.as_ref(),
            ],
            bass_channels.len(),
            "BassPedalTranspose",
            &TRANSPOSE_RANGE,
        )?
        .into_iter()
        .map(|level| level.map_or(0, Level::value))
        .collect();

        let chord_transpose_defined = global.chord_transpose.is_some()
            || bank.chord_transpose.is_some()
            || pedal.chord_transpose.is_some();
        let chord_transpose: Vec<i32> = if chord_transpose_defined {
            resolve_per_channel(
                [
                    global.chord_transpose.as_ref(),
                    bank.chord_transpose.as_ref(),
                    pedal.chord_transpose.as_ref(),
                ],
                chord_channels.len(),
                "ChordTranspose",
                &TRANSPOSE_RANGE,
            )?
            .into_iter()
            .map(|level| level.map_or(0, Level::value))
            .collect()
        } else {
            let inherited = match &document.bass_note {
                Some(_) => bass_transpose.first().copied().unwrap_or(0),
                None => 0,
            };
            vec![inherited; chord_channels.len()]
        };

        let mut note_on = Vec::new();
        let mut note_off = Vec::new();

        let mut bass_notes = Vec::new();
        if let Some(bass) = &document.bass_note {
            let base = NoteSpec::parse(&bass.as_text())?.base_note(Some(octave))?;
            for ((channel, velocity), shift) in bass_channels
                .iter()
                .zip(&bass_velocity)
                .zip(&bass_transpose)
            {
                let note = transpose(base, *shift);
                push_note_pair(*channel, note, *velocity, &mut note_on, &mut note_off);
                bass_notes.push(note);
            }
        }

        let mut chord_notes = Vec::new();
        if let Some(chord) = &document.chord_notes {
            let bases = chord_bases(&chord.items(), octave)?;
            for base in bases {
                for ((channel, velocity), shift) in chord_channels
                    .iter()
                    .zip(&chord_velocity)
                    .zip(&chord_transpose)
                {
                    let note = transpose(base, *shift);
                    push_note_pair(*channel, note, *velocity, &mut note_on, &mut note_off);
                    chord_notes.push(note);
                }
            }
        }

        let mut on_note_on = Vec::new();
        let mut on_note_off = Vec::new();
        for message in &document.messages {
            let parsed = parse_message(message)?;
            match message.trigger {
                Some(Trigger::NoteOn) => on_note_on.push(parsed),
                Some(Trigger::NoteOff) => on_note_off.push(parsed),
                None => {
                    return Err(Error::Config(format!(
                        "message '{}' has no Trigger",
                        message.string
                    )))
                }
            }
        }
        if document.send_panic {
            on_note_off.extend_from_slice(self.panic.messages());
        }

        let bank_select = document
            .bank_select
            .as_ref()
            .map(|select| self.resolve_bank_select(bank_index, select))
            .transpose()?;

        debug!(
            "Pedal {}: bass {:?}, chord {:?}",
            note_label(trigger),
            bass_notes.iter().map(|n| note_label(*n)).collect::<Vec<_>>(),
            chord_notes.iter().map(|n| note_label(*n)).collect::<Vec<_>>()
        );

        Ok(Pedal {
            note: trigger,
            bass_notes,
            chord_notes,
            note_on,
            note_off,
            on_note_on,
            on_note_off,
            bank_select,
        })
    }

    fn resolve_bank_select(&self, bank_index: usize, select: &Scalar) -> Result<BankSelect> {
        let banks = self.document.banks.len();
        let text = select.as_text();
        let select = match text.as_ref() {
            "Next" => BankSelect::Bank((bank_index + 1) % banks),
            "Previous" => BankSelect::Bank((bank_index + banks - 1) % banks),
            "Last" => BankSelect::Bank(banks - 1),
            "List" => BankSelect::List,
            "Quit" => BankSelect::Quit(QuitStatus::Quit),
            "Reload" => BankSelect::Quit(QuitStatus::Reload),
            "Reboot" => BankSelect::Quit(QuitStatus::Reboot),
            "Shutdown" => BankSelect::Quit(QuitStatus::Shutdown),
            digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                match digits.parse::<usize>() {
                    Ok(n) if (1..=banks).contains(&n) => BankSelect::Bank(n - 1),
                    _ => {
                        return Err(Error::Config(format!(
                            "BankSelect {} must be between 1 and {}",
                            digits, banks
                        )))
                    }
                }
            }
            other => {
                return Err(Error::Config(format!("unknown BankSelect '{}'", other)));
            }
        };
        Ok(select)
    }
}

/// Untransposed chord notes. Symbolic chords are voiced upwards from
/// `octave`: whenever a note's pitch class drops below the previous one the
/// octave goes up by one. Numeric chords are taken as written.
fn chord_bases(items: &[String], octave: i32) -> Result<Vec<u8>> {
    let numeric = items
        .first()
        .is_some_and(|first| !first.is_empty() && first.bytes().all(|b| b.is_ascii_digit()));

    let mut octave = octave;
    let mut previous: Option<u8> = None;
    let mut bases = Vec::with_capacity(items.len());
    for item in items {
        let spec = NoteSpec::parse(item)?;
        if numeric {
            bases.push(spec.base_note(None)?);
            continue;
        }
        let semitone = spec.semitone();
        if previous.is_some_and(|previous| semitone < previous) {
            octave += 1;
        }
        previous = Some(semitone);
        bases.push(spec.base_note(Some(octave))?);
    }
    Ok(bases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::OnBankChange;

    fn compile_json(json: &str) -> Result<Controller> {
        compile(&ControllerDocument::from_json(json)?)
    }

    fn bytes(messages: &[NoteMessage], strike: u8) -> Vec<Vec<u8>> {
        messages
            .iter()
            .map(|m| m.render(strike).into_vec())
            .collect()
    }

    #[test]
    fn test_bass_note_at_octave_one() {
        let controller = compile_json(
            r#"{ "BassPedalVelocity": "100", "Bank": [ { "Pedal": [
                { "Note": 36, "BassNote": "C", "Octave": 1 } ] } ] }"#,
        )
        .unwrap();
        let pedal = &controller.banks()[0].pedals[0];
        assert_eq!(pedal.note, 36);
        assert_eq!(bytes(&pedal.note_on, 64), vec![vec![0x90, 36, 100]]);
        assert_eq!(bytes(&pedal.note_off, 64), vec![vec![0x80, 36, 100]]);
        assert_eq!(controller.banks()[0].pedal_for_note(36), Some(0));
    }

    #[test]
    fn test_ascending_symbolic_chord() {
        assert_eq!(
            chord_bases(&["A".into(), "C".into(), "E".into()], 0).unwrap(),
            vec![33, 36, 40]
        );
        assert_eq!(
            chord_bases(&["G".into(), "C".into(), "A".into(), "D".into()], 0).unwrap(),
            vec![31, 36, 45, 50]
        );
    }

    #[test]
    fn test_numeric_chord_is_not_bumped() {
        assert_eq!(
            chord_bases(&["64".into(), "60".into(), "67".into()], 3).unwrap(),
            vec![64, 60, 67]
        );
        assert!(chord_bases(&["64".into(), "C".into()], 3).is_err());
    }

    #[test]
    fn test_chord_ordering_is_note_major() {
        let controller = compile_json(
            r#"{ "OutChordChannel": "2,3", "ChordVelocity": "90", "Bank": [ { "Pedal": [
                { "Note": 40, "ChordNotes": "C,E", "Octave": 3 } ] } ] }"#,
        )
        .unwrap();
        let pedal = &controller.banks()[0].pedals[0];
        assert_eq!(
            bytes(&pedal.note_on, 64),
            vec![
                vec![0x91, 60, 90],
                vec![0x92, 60, 90],
                vec![0x91, 64, 90],
                vec![0x92, 64, 90],
            ]
        );
    }

    #[test]
    fn test_chord_inherits_bass_transpose() {
        let controller = compile_json(
            r#"{ "BassPedalTranspose": "12", "Bank": [ { "Pedal": [
                { "Note": 40, "BassNote": "C", "ChordNotes": "E", "Octave": 0 },
                { "Note": 41, "ChordNotes": "E", "Octave": 0 } ] } ] }"#,
        )
        .unwrap();
        let pedals = &controller.banks()[0].pedals;
        assert_eq!(pedals[0].bass_notes, vec![36]);
        assert_eq!(pedals[0].chord_notes, vec![40]);
        assert_eq!(pedals[1].chord_notes, vec![28]);
    }

    #[test]
    fn test_per_channel_lists_pad() {
        let controller = compile_json(
            r#"{ "OutBassPedalChannel": "1,2,3", "BassPedalVelocity": "mf,+10",
                 "BassPedalTranspose": "0,12", "Bank": [ { "Pedal": [
                { "Note": 36, "BassNote": "C", "Octave": 0 } ] } ] }"#,
        )
        .unwrap();
        let pedal = &controller.banks()[0].pedals[0];
        assert_eq!(pedal.bass_notes, vec![24, 36, 36]);
        assert_eq!(
            bytes(&pedal.note_on, 50),
            vec![vec![0x90, 24, 75], vec![0x91, 36, 60], vec![0x92, 36, 60]]
        );
    }

    #[test]
    fn test_too_many_values_for_channels() {
        let err = compile_json(
            r#"{ "BassPedalVelocity": "10,20", "Bank": [ { "Pedal": [
                { "Note": 36, "BassNote": "C", "Octave": 0 } ] } ] }"#,
        );
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn test_velocity_inheritance() {
        let controller = compile_json(
            r#"{ "BassPedalVelocity": "80", "Bank": [
                { "BassPedalVelocity": "+10", "Pedal": [
                    { "Note": 36, "BassNote": "C", "Octave": 0 },
                    { "Note": 37, "BassNote": "C", "Octave": 0, "BassPedalVelocity": "-5" },
                    { "Note": 38, "BassNote": "C", "Octave": 0, "BassPedalVelocity": "pp" } ] } ] }"#,
        )
        .unwrap();
        let pedals = &controller.banks()[0].pedals;
        assert_eq!(pedals[0].note_on[0].velocity, Velocity::Absolute(90));
        assert_eq!(pedals[1].note_on[0].velocity, Velocity::Absolute(85));
        assert_eq!(pedals[2].note_on[0].velocity, Velocity::Absolute(36));
    }

    #[test]
    fn test_unset_velocity_follows_strike() {
        let controller = compile_json(
            r#"{ "Bank": [ { "Pedal": [ { "Note": 36, "BassNote": "C", "Octave": 0 } ] } ] }"#,
        )
        .unwrap();
        let pedal = &controller.banks()[0].pedals[0];
        assert_eq!(pedal.note_on[0].velocity, Velocity::Relative(0));
        assert_eq!(pedal.note_on[0].render(77).bytes(), &[0x90, 24, 77]);
    }

    #[test]
    fn test_bank_select_resolution() {
        let controller = compile_json(
            r#"{ "Bank": [
                { "Pedal": [ { "Note": 36, "BankSelect": "Previous" },
                             { "Note": 37, "BankSelect": "Next" },
                             { "Note": 38, "BankSelect": 3 },
                             { "Note": 39, "BankSelect": "Reboot" } ] },
                { "Pedal": [ { "Note": 36, "BankSelect": "Last" } ] },
                { "Name": "Third", "Pedal": [ { "Note": 36, "BankSelect": "Next" },
                                              { "Note": 37, "BankSelect": "List" } ] } ] }"#,
        )
        .unwrap();
        let select = |bank: usize, pedal: usize| controller.banks()[bank].pedals[pedal].bank_select;
        assert_eq!(select(0, 0), Some(BankSelect::Bank(2)));
        assert_eq!(select(0, 1), Some(BankSelect::Bank(1)));
        assert_eq!(select(0, 2), Some(BankSelect::Bank(2)));
        assert_eq!(select(0, 3), Some(BankSelect::Quit(QuitStatus::Reboot)));
        assert_eq!(select(1, 0), Some(BankSelect::Bank(2)));
        assert_eq!(select(2, 0), Some(BankSelect::Bank(0)));
        assert_eq!(select(2, 1), Some(BankSelect::List));
        assert_eq!(controller.banks()[1].name, "Bank2");
        assert_eq!(controller.banks()[2].name, "Third");
    }

    #[test]
    fn test_bank_select_out_of_range() {
        for select in [r#""4""#, r#""0""#, r#""Sideways""#] {
            let json = format!(
                r#"{{ "Bank": [ {{ "Pedal": [ {{ "Note": 36, "BankSelect": {} }} ] }} ] }}"#,
                select
            );
            assert!(compile_json(&json).is_err(), "accepted {}", select);
        }
    }

    #[test]
    fn test_messages_and_send_panic() {
        let controller = compile_json(
            r#"{ "Panic": "B0 7B 00\n// comment\nB0 78 00", "Bank": [ { "Pedal": [
                { "Note": 36, "SendPanic": true, "Message": [
                    { "Trigger": "NoteOn", "Type": "Midi", "String": "C0 01" },
                    { "Trigger": "NoteOff", "Type": "SysEx", "String": "F0 10 F7" } ] } ] } ] }"#,
        )
        .unwrap();
        let pedal = &controller.banks()[0].pedals[0];
        assert_eq!(pedal.extra_messages(Trigger::NoteOn)[0].bytes(), &[0xC0, 0x01]);
        let off: Vec<String> = pedal
            .extra_messages(Trigger::NoteOff)
            .iter()
            .map(|m| m.to_string())
            .collect();
        assert_eq!(off, vec!["F0 10 F7", "B0 7B 00", "B0 78 00"]);
        assert_eq!(controller.panic_command().messages().len(), 2);
    }

    #[test]
    fn test_message_type_mismatch() {
        assert!(compile_json(
            r#"{ "Bank": [ { "Pedal": [ { "Note": 36, "Message": [
                { "Trigger": "NoteOn", "Type": "SysEx", "String": "C0 01" } ] } ] } ] }"#
        )
        .is_err());
        assert!(compile_json(
            r#"{ "Bank": [ { "Pedal": [ { "Note": 36, "Message": [
                { "Trigger": "NoteOn", "String": "C0 01 02" } ] } ] } ] }"#
        )
        .is_err());
    }

    #[test]
    fn test_duplicate_pedal_note_last_wins() {
        let controller = compile_json(
            r#"{ "Bank": [ { "Pedal": [ { "Note": 36, "BankSelect": "List" },
                                        { "Note": 36, "BankSelect": "Quit" } ] } ] }"#,
        )
        .unwrap();
        assert_eq!(controller.find_pedal(0, 36).map(|p| p.pedal), Some(1));
    }

    #[test]
    fn test_globals_and_bank_list() {
        let controller = compile_json(
            r#"{ "InChannel": 2, "MidiEcho": true, "PedalMonophony": true,
                 "MinVelocityNoteOff": false, "OnBankChange": "QuickChange",
                 "BankSelectController": 0, "InitialBank": 2,
                 "Start": { "Message": [ { "Type": "Midi", "String": "FA" } ] },
                 "Bank": [ { "Name": "One", "Pedal": [ { "Note": 36 } ] },
                           { "Name": "Two", "Pedal": [ { "Note": 36 } ] } ] }"#,
        )
        .unwrap();
        assert_eq!(controller.in_channel, 1);
        assert!(controller.midi_echo);
        assert!(controller.pedal_monophony);
        assert!(!controller.min_velocity_note_off);
        assert_eq!(controller.on_bank_change, OnBankChange::QuickChange);
        assert_eq!(controller.bank_select_controller, 0);
        assert_eq!(controller.initial_bank, 1);
        assert_eq!(controller.start_messages()[0].bytes(), &[0xFA]);
        assert!(controller.stop_messages().is_empty());
        assert_eq!(
            crate::sysex::decode_bank_list(controller.bank_list_sysex().bytes()).unwrap(),
            vec!["One", "Two"]
        );
    }

    #[test]
    fn test_named_note_without_octave_defaults_to_zero() {
        let controller =
            compile_json(r#"{ "Bank": [ { "Pedal": [ { "Note": "C" } ] } ] }"#).unwrap();
        assert_eq!(controller.banks()[0].pedals[0].note, 24);
    }

    #[test]
    fn test_octave_beyond_i32_is_rejected() {
        let err = compile_json(
            r#"{ "Bank": [ { "Pedal": [ { "Note": "C", "Octave": 4294967297 } ] } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Octave 4294967297 is out of range"));
    }

    #[test]
    fn test_errors_carry_location() {
        let err = compile_json(
            r#"{ "Bank": [ { "Pedal": [ { "Note": 36 }, { "Note": 37, "ChordVelocity": "loud" } ] } ] }"#,
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("bank 1 pedal 2"), "{}", message);
    }
}
