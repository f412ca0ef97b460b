//! Note names, octaves, and transposition.
//!
//! Octaves follow the `FIRST_OCTAVE = -2` convention, so `C-2` is MIDI note 0,
//! `C1` is 36 and `G8` is 127.
//!
//! # Example
//! ```
//! use pedalchord_core::note::{resolve_note, NoteSpec};
//!
//! let c1 = NoteSpec::parse("C").unwrap();
//! assert_eq!(resolve_note(c1, Some(1), &[0, 12]).unwrap(), vec![36, 48]);
//! ```

use crate::error::{Error, Result};

pub const FIRST_OCTAVE: i32 = -2;
pub const LAST_OCTAVE: i32 = 8;
pub const MAX_NOTE: u8 = 127;

pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Semitone index (0 = C) of a note name. Sharps and flats are both accepted.
pub fn semitone(name: &str) -> Option<u8> {
    let mut chars = name.trim().chars();
    let base: i32 = match chars.next()?.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let accidental = match chars.as_str() {
        "" => 0,
        "#" => 1,
        "b" => -1,
        _ => return None,
    };
    Some((base + accidental).rem_euclid(12) as u8)
}

/// A configured note: a name that still needs an octave, or an absolute MIDI
/// note number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteSpec {
    Named(u8),
    Absolute(u8),
}

impl NoteSpec {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            return match text.parse::<u8>() {
                Ok(note) if note <= MAX_NOTE => Ok(NoteSpec::Absolute(note)),
                _ => Err(Error::Config(format!(
                    "note number {} is out of range 0-127",
                    text
                ))),
            };
        }
        semitone(text)
            .map(NoteSpec::Named)
            .ok_or_else(|| Error::Config(format!("unknown note name '{}'", text)))
    }

    pub fn is_absolute(&self) -> bool {
        matches!(self, NoteSpec::Absolute(_))
    }

    /// Pitch class, used by the ascending-chord heuristic.
    pub fn semitone(&self) -> u8 {
        match *self {
            NoteSpec::Named(semitone) => semitone,
            NoteSpec::Absolute(note) => note % 12,
        }
    }

    /// Untransposed MIDI note. Named notes require an octave.
    pub fn base_note(&self, octave: Option<i32>) -> Result<u8> {
        match *self {
            NoteSpec::Absolute(note) => Ok(note),
            NoteSpec::Named(semitone) => {
                let octave = octave.ok_or_else(|| {
                    Error::Config(format!(
                        "note '{}' needs an octave",
                        NOTE_NAMES[semitone as usize]
                    ))
                })?;
                if !(FIRST_OCTAVE..=LAST_OCTAVE).contains(&octave) {
                    return Err(Error::Config(format!(
                        "octave {} is out of range {}..{}",
                        octave, FIRST_OCTAVE, LAST_OCTAVE
                    )));
                }
                let note = 12 * (octave - FIRST_OCTAVE) + semitone as i32;
                if note > MAX_NOTE as i32 {
                    return Err(Error::Config(format!(
                        "note {}{} is above the MIDI range",
                        NOTE_NAMES[semitone as usize], octave
                    )));
                }
                Ok(note as u8)
            }
        }
    }
}

/// Shifts `note` by `semitones`, folding results outside 0-127 back into the
/// range while keeping the pitch class.
///
/// The top octave stops at G8, so high pitch classes G# to B land one octave
/// lower than the rest.
pub fn transpose(note: u8, semitones: i32) -> u8 {
    let shifted = note as i32 + semitones;
    if shifted > MAX_NOTE as i32 {
        let pitch_class = shifted % 12;
        let octave_base = if pitch_class >= 8 { 108 } else { 120 };
        (octave_base + pitch_class) as u8
    } else if shifted < 0 {
        shifted.rem_euclid(12) as u8
    } else {
        shifted as u8
    }
}

/// Resolves a note to one MIDI note per transpose value.
pub fn resolve_note(spec: NoteSpec, octave: Option<i32>, transposes: &[i32]) -> Result<Vec<u8>> {
    let base = spec.base_note(octave)?;
    Ok(transposes.iter().map(|t| transpose(base, *t)).collect())
}

/// Inverse of the named-note formula: `(semitone, octave)`.
pub fn base_note_octave(note: u8) -> (u8, i32) {
    let octave = note as i32 / 12 + FIRST_OCTAVE;
    let semitone = note as i32 - 12 * (octave - FIRST_OCTAVE);
    (semitone as u8, octave)
}

/// Human-readable label such as `C#1`.
pub fn note_label(note: u8) -> String {
    let (semitone, octave) = base_note_octave(note);
    format!("{}{}", NOTE_NAMES[semitone as usize], octave)
}
