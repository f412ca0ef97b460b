//! Core of the pedal remapper.
//!
//! A foot controller sends a handful of notes; this crate turns each of them
//! into bass notes, chords, extra MIDI/SysEx messages and bank navigation,
//! following a user-written controller document.
//!
//! - [`note`] / [`velocity`]: note names, octaves, transposition and
//!   velocity/transpose inheritance.
//! - [`config`]: the JSON document and the compiler that turns it into an
//!   immutable [`Controller`].
//! - [`Processor`]: the dispatch state machine, one input event at a time.
//! - [`sysex`]: 7-bit packing and the bank-listing SysEx.

pub mod config;
pub mod error;
pub mod message;
pub mod note;
pub mod panic;
pub mod processor;
pub mod sysex;
pub mod velocity;

pub use config::{compile, Controller, ControllerDocument, OnBankChange, QuitStatus};
pub use error::{Error, Result};
pub use message::{MessageKind, MidiMessage};
pub use panic::PanicCommand;
pub use processor::{HeldPedal, Processor};
