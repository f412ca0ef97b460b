//! Integration tests for pedalchord-core.
//!
//! A controller document is compiled and driven through the dispatcher one
//! raw event at a time, checking the exact output sequence.

use pedalchord_core::config::{compile, ControllerDocument, QuitStatus};
use pedalchord_core::sysex::decode_bank_list;
use pedalchord_core::{MidiMessage, Processor};
use serde_json::{json, Value};

const BANK_SELECT: u8 = 102;

fn base_document() -> Value {
    json!({
        "BassPedalVelocity": "100",
        "ChordVelocity": "80",
        "OutChordChannel": "2",
        "Panic": "B0 7B 00\n// reset all controllers\nB0 79 00",
        "Bank": [
            { "Name": "Intro", "Pedal": [
                { "Note": 36, "BassNote": "C", "Octave": 1 },
                { "Note": 38, "BassNote": "D", "Octave": 1, "ChordNotes": "F#,A" },
                { "Note": 40, "BankSelect": "Next" },
                { "Note": 41, "BankSelect": "Previous" },
                { "Note": 43, "BankSelect": "List" },
                { "Note": 45, "BassNote": "A", "Octave": 0, "Message": [
                    { "Trigger": "NoteOn", "Type": "Midi", "String": "C0 07" },
                    { "Trigger": "NoteOff", "Type": "SysEx", "String": "F0 7D 10 F7" }
                ] }
            ] },
            { "Name": "Verse", "Pedal": [
                { "Note": 36, "BassNote": "G", "Octave": 1 },
                { "Note": 40, "BankSelect": "Next" }
            ] },
            { "Name": "Chorus", "Pedal": [
                { "Note": 50, "BassNote": "E", "Octave": 1 }
            ] }
        ]
    })
}

/// Base document with top-level attributes replaced by `overrides`.
fn processor_with(overrides: Value) -> Processor {
    let mut document = base_document();
    if let (Some(target), Some(source)) = (document.as_object_mut(), overrides.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
    let document = ControllerDocument::from_json(&document.to_string()).unwrap();
    Processor::new(compile(&document).unwrap())
}

fn processor() -> Processor {
    processor_with(json!({}))
}

fn bytes(out: &[MidiMessage]) -> Vec<Vec<u8>> {
    out.iter().map(|m| m.bytes().to_vec()).collect()
}

fn run(p: &mut Processor, event: &[u8]) -> Vec<Vec<u8>> {
    bytes(&p.process(event))
}

// ---------------------------------------------------------------------------
// 1. Note materialization
// ---------------------------------------------------------------------------

/// C at octave 1 is note 36; one NOTE ON out, one NOTE OFF back.
#[test]
fn test_bass_note_c1() {
    let mut p = processor();
    assert_eq!(run(&mut p, &[0x90, 36, 64]), vec![vec![0x90, 36, 100]]);
    assert_eq!(run(&mut p, &[0x80, 36, 64]), vec![vec![0x80, 36, 100]]);
}

/// Bass first, then the chord on its own channel.
#[test]
fn test_bass_and_chord() {
    let mut p = processor();
    assert_eq!(
        run(&mut p, &[0x90, 38, 64]),
        vec![vec![0x90, 38, 100], vec![0x91, 42, 80], vec![0x91, 45, 80]]
    );
    assert_eq!(
        run(&mut p, &[0x80, 38, 64]),
        vec![vec![0x80, 38, 100], vec![0x81, 42, 80], vec![0x81, 45, 80]]
    );
}

/// Extra messages follow the pedal's own note messages.
#[test]
fn test_extra_messages_per_trigger() {
    let mut p = processor();
    assert_eq!(
        run(&mut p, &[0x90, 45, 64]),
        vec![vec![0x90, 33, 100], vec![0xC0, 0x07]]
    );
    assert_eq!(
        run(&mut p, &[0x80, 45, 64]),
        vec![vec![0x80, 33, 100], vec![0xF0, 0x7D, 0x10, 0xF7]]
    );
}

/// Relative velocities follow the strike and stay within 1..=127.
#[test]
fn test_relative_velocity_clamps() {
    let mut p = processor_with(json!({ "ChordVelocity": "+50", "BassPedalVelocity": "-100" }));
    assert_eq!(
        run(&mut p, &[0x90, 38, 100]),
        vec![vec![0x90, 38, 1], vec![0x91, 42, 127], vec![0x91, 45, 127]]
    );
}

/// An absolute pedal velocity is never changed by relative ancestors.
#[test]
fn test_pedal_absolute_velocity_wins() {
    let document = ControllerDocument::from_json(
        r#"{ "BassPedalVelocity": "+20", "Bank": [ { "BassPedalVelocity": "+10", "Pedal": [
            { "Note": 36, "BassNote": "C", "Octave": 1, "BassPedalVelocity": "30" } ] } ] }"#,
    )
    .unwrap();
    let mut p = Processor::new(compile(&document).unwrap());
    for strike in [1, 64, 127] {
        assert_eq!(run(&mut p, &[0x90, 36, strike]), vec![vec![0x90, 36, 30]]);
        run(&mut p, &[0x80, 36, strike]);
    }
}

/// Every registered pedal answers with at least its compiled NOTE ONs, all
/// with audible velocities.
#[test]
fn test_every_pedal_yields_its_note_ons() {
    let mut p = processor_with(json!({ "BassPedalVelocity": "+100", "ChordVelocity": "-100" }));
    let pedals = p.controller().banks()[0].pedals.clone();
    for pedal in &pedals {
        if pedal.bank_select.is_some() {
            continue;
        }
        for strike in [1, 64, 127] {
            let out = p.process(&[0x90, pedal.note, strike]);
            let note_ons: Vec<&MidiMessage> =
                out.iter().filter(|m| m.bytes()[0] & 0xF0 == 0x90).collect();
            assert_eq!(note_ons.len(), pedal.note_on.len());
            for message in note_ons {
                assert!((1..=127).contains(&message.bytes()[2]), "{}", message);
            }
            p.process(&[0x80, pedal.note, strike]);
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Monophony
// ---------------------------------------------------------------------------

/// The first pedal's NOTE OFFs come strictly before the second pedal's NOTE ONs.
#[test]
fn test_monophony_releases_previous_pedal_first() {
    let mut p = processor_with(json!({ "PedalMonophony": true }));
    run(&mut p, &[0x90, 36, 64]);
    assert_eq!(
        run(&mut p, &[0x90, 38, 90]),
        vec![
            vec![0x80, 36, 100],
            vec![0x90, 38, 100],
            vec![0x91, 42, 80],
            vec![0x91, 45, 80],
        ]
    );
    assert_eq!(p.held_notes(), vec![38]);

    // The first pedal was already released on our side.
    assert!(run(&mut p, &[0x80, 36, 64]).is_empty());
    assert_eq!(p.held_notes(), vec![38]);
}

/// Striking a held pedal again releases it before sounding it again.
#[test]
fn test_monophony_restrike_releases_same_pedal() {
    let mut p = processor_with(json!({ "PedalMonophony": true }));
    run(&mut p, &[0x90, 36, 64]);
    assert_eq!(
        run(&mut p, &[0x90, 36, 90]),
        vec![vec![0x80, 36, 100], vec![0x90, 36, 100]]
    );
    assert_eq!(p.held_notes(), vec![36]);

    assert_eq!(run(&mut p, &[0x80, 36, 64]), vec![vec![0x80, 36, 100]]);
    assert!(p.held_notes().is_empty());
}

/// Without monophony pedals stack up.
#[test]
fn test_polyphonic_pedals_stack() {
    let mut p = processor();
    run(&mut p, &[0x90, 36, 64]);
    assert_eq!(run(&mut p, &[0x90, 38, 64]).len(), 3);
    assert_eq!(p.held_notes(), vec![36, 38]);
}

// ---------------------------------------------------------------------------
// 3. Bank navigation
// ---------------------------------------------------------------------------

/// Pedal-driven Next/Previous wrap around the bank list.
#[test]
fn test_pedal_bank_select_cycles() {
    let mut p = processor();
    run(&mut p, &[0x90, 41, 64]);
    assert!(run(&mut p, &[0x80, 41, 64]).is_empty());
    assert_eq!(p.current_bank(), 2);

    let mut p = processor();
    run(&mut p, &[0x90, 40, 64]);
    run(&mut p, &[0x80, 40, 64]);
    assert_eq!(p.current_bank(), 1);
    run(&mut p, &[0x90, 40, 64]);
    run(&mut p, &[0x80, 40, 64]);
    assert_eq!(p.current_bank(), 2);
}

/// The bank only changes on release.
#[test]
fn test_bank_select_waits_for_note_off() {
    let mut p = processor();
    run(&mut p, &[0x90, 40, 64]);
    assert_eq!(p.current_bank(), 0);
}

/// Controller values 120/121 step backwards/forwards with wraparound.
#[test]
fn test_controller_previous_next_wrap() {
    let mut p = processor();
    run(&mut p, &[0xB0, BANK_SELECT, 120]);
    assert_eq!(p.current_bank(), 2);
    run(&mut p, &[0xB0, BANK_SELECT, 121]);
    assert_eq!(p.current_bank(), 0);
    run(&mut p, &[0xB0, BANK_SELECT, 121]);
    assert_eq!(p.current_bank(), 1);
}

/// Direct selection clamps to the last bank; 122 jumps there.
#[test]
fn test_controller_direct_and_last() {
    let mut p = processor();
    run(&mut p, &[0xB0, BANK_SELECT, 1]);
    assert_eq!(p.current_bank(), 1);
    run(&mut p, &[0xB0, BANK_SELECT, 100]);
    assert_eq!(p.current_bank(), 2);
    run(&mut p, &[0xB0, BANK_SELECT, 0]);
    assert_eq!(p.current_bank(), 0);
    run(&mut p, &[0xB0, BANK_SELECT, 122]);
    assert_eq!(p.current_bank(), 2);
}

/// Notes resolve against the current bank.
#[test]
fn test_pedals_follow_current_bank() {
    let mut p = processor();
    run(&mut p, &[0xB0, BANK_SELECT, 1]);
    assert_eq!(run(&mut p, &[0x90, 36, 64]), vec![vec![0x90, 43, 100]]);
}

/// Both the List pedal and controller value 119 emit the bank listing.
#[test]
fn test_bank_listing() {
    let mut p = processor();
    run(&mut p, &[0x90, 43, 64]);
    let out = p.process(&[0x80, 43, 64]);
    assert_eq!(out.len(), 1);
    assert_eq!(
        decode_bank_list(out[0].bytes()).unwrap(),
        vec!["Intro", "Verse", "Chorus"]
    );

    let out = p.process(&[0xB0, BANK_SELECT, 119]);
    assert_eq!(out, vec![p.bank_list_sysex().clone()]);
}

// ---------------------------------------------------------------------------
// 4. Bank change policies
// ---------------------------------------------------------------------------

fn hold_36_then_next_bank(p: &mut Processor) -> Vec<Vec<u8>> {
    run(p, &[0x90, 36, 64]);
    run(p, &[0x90, 40, 64]);
    run(p, &[0x80, 40, 64])
}

/// ContinuePlayback leaves held notes alone; their release still targets the
/// pedal that started them.
#[test]
fn test_continue_playback() {
    let mut p = processor();
    assert!(hold_36_then_next_bank(&mut p).is_empty());
    assert_eq!(p.current_bank(), 1);
    assert_eq!(run(&mut p, &[0x80, 36, 64]), vec![vec![0x80, 36, 100]]);
}

/// StopPlayback releases everything still held.
#[test]
fn test_stop_playback() {
    let mut p = processor_with(json!({ "OnBankChange": "StopPlayback" }));
    assert_eq!(hold_36_then_next_bank(&mut p), vec![vec![0x80, 36, 100]]);
    assert!(p.held_notes().is_empty());
}

/// QuickChange swaps held pedals for their counterpart in the new bank.
#[test]
fn test_quick_change() {
    let mut p = processor_with(json!({ "OnBankChange": "QuickChange" }));
    assert_eq!(
        hold_36_then_next_bank(&mut p),
        vec![vec![0x80, 36, 100], vec![0x90, 43, 100]]
    );
    assert_eq!(p.held_notes(), vec![36]);
    assert_eq!(run(&mut p, &[0x80, 36, 64]), vec![vec![0x80, 43, 100]]);
}

/// QuickChange into a bank without the note just stops it.
#[test]
fn test_quick_change_without_counterpart() {
    let mut p = processor_with(json!({ "OnBankChange": "QuickChange" }));
    run(&mut p, &[0x90, 36, 64]);
    assert_eq!(
        run(&mut p, &[0xB0, BANK_SELECT, 2]),
        vec![vec![0x80, 36, 100]]
    );
    assert!(p.held_notes().is_empty());
}

// ---------------------------------------------------------------------------
// 5. Panic and quit
// ---------------------------------------------------------------------------

/// Controller value 123 sends the panic command and forgets held pedals.
#[test]
fn test_controller_panic() {
    let mut p = processor();
    run(&mut p, &[0x90, 36, 64]);
    assert_eq!(
        run(&mut p, &[0xB0, BANK_SELECT, 123]),
        vec![vec![0xB0, 0x7B, 0x00], vec![0xB0, 0x79, 0x00]]
    );
    assert!(p.held_notes().is_empty());
}

/// An incoming panic sequence passes through even with echo off.
#[test]
fn test_incoming_panic_passes_through() {
    let mut p = processor();
    assert_eq!(run(&mut p, &[0xB0, 0x7B, 0x00]), vec![vec![0xB0, 0x7B, 0x00]]);
    assert_eq!(run(&mut p, &[0xB0, 0x79, 0x00]), vec![vec![0xB0, 0x79, 0x00]]);
    // Any other controller is dropped.
    assert!(run(&mut p, &[0xB0, 0x79, 0x00]).is_empty());
}

/// Controller value 127 latches Shutdown and releases what is held.
#[test]
fn test_controller_shutdown_flushes() {
    let mut p = processor();
    run(&mut p, &[0x90, 36, 64]);
    assert_eq!(
        run(&mut p, &[0xB0, BANK_SELECT, 127]),
        vec![vec![0x80, 36, 100]]
    );
    assert_eq!(p.status(), Some(QuitStatus::Shutdown));
    assert!(p.held_notes().is_empty());
}

#[test]
fn test_controller_quit_statuses() {
    for (value, status) in [
        (124, QuitStatus::Quit),
        (125, QuitStatus::Reload),
        (126, QuitStatus::Reboot),
    ] {
        let mut p = processor();
        assert!(run(&mut p, &[0xB0, BANK_SELECT, value]).is_empty());
        assert_eq!(p.status(), Some(status));
    }
}

// ---------------------------------------------------------------------------
// 6. Echo and SysEx
// ---------------------------------------------------------------------------

/// With echo on, anything not handled is forwarded byte for byte.
#[test]
fn test_echo_forwards_unhandled_events() {
    let mut p = processor_with(json!({ "MidiEcho": true }));
    for event in [
        vec![0x91, 36, 64],
        vec![0x90, 60, 64],
        vec![0xB0, 7, 100],
        vec![0xB1, BANK_SELECT, 1],
        vec![0xE0, 0, 64],
        vec![0xC0, 3],
        vec![0xF8],
    ] {
        assert_eq!(run(&mut p, &event), vec![event.clone()]);
    }
    assert_eq!(p.current_bank(), 0);
}

/// Without echo they are dropped.
#[test]
fn test_no_echo_drops_unhandled_events() {
    let mut p = processor();
    for event in [vec![0x91, 36, 64], vec![0x90, 60, 64], vec![0xB0, 7, 100], vec![0xF8]] {
        assert!(run(&mut p, &event).is_empty());
    }
}

/// SysEx split over several events is forwarded once complete.
#[test]
fn test_sysex_reassembly() {
    let mut p = processor_with(json!({ "MidiEcho": true }));
    assert!(run(&mut p, &[0xF0, 0x43, 0x10]).is_empty());
    assert!(run(&mut p, &[0x4C, 0x00]).is_empty());
    assert_eq!(
        run(&mut p, &[0x00, 0x7E, 0xF7]),
        vec![vec![0xF0, 0x43, 0x10, 0x4C, 0x00, 0x00, 0x7E, 0xF7]]
    );

    let mut p = processor();
    assert!(run(&mut p, &[0xF0, 0x43, 0xF7]).is_empty());
}
