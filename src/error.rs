//! Umbrella error type; wraps the subsystem errors so `?` crosses crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] pedalchord_core::Error),

    #[error("MIDI: {0}")]
    MidiIo(#[from] pedalchord_midi_io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
