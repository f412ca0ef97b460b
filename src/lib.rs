//! # pedalchord - MIDI foot-pedal remapper
//!
//! Turns the few notes a foot controller sends into bass notes, chords,
//! extra MIDI/SysEx messages and bank navigation.
//!
//! ## Architecture
//!
//! pedalchord is an umbrella crate over:
//! - **pedalchord-core** - note model, controller document, compiler and the
//!   dispatch state machine
//! - **pedalchord-midi-io** - port selection, midir transport and the driver loop
//!
//! ## Quick Start
//!
//! ```no_run
//! use pedalchord::prelude::*;
//!
//! let controller = pedalchord::load_controller("pedals.json")?;
//! let mut processor = Processor::new(controller);
//! for message in processor.process(&[0x90, 36, 100]) {
//!     println!("{}", message);
//! }
//! # Ok::<(), pedalchord::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `midi-io` (default) - hardware ports through midir and the `pedalchord` binary

use std::path::Path;

/// Re-export of pedalchord-core for direct access
pub use pedalchord_core as core;

/// Re-export of pedalchord-midi-io for direct access
pub use pedalchord_midi_io as midi_io;

pub mod error;

pub use error::{Error, Result};

pub use pedalchord_core::{
    compile, Controller, ControllerDocument, MessageKind, MidiMessage, OnBankChange,
    PanicCommand, Processor, QuitStatus,
};
pub use pedalchord_midi_io::{Driver, EventSink, PortInfo, PortSelector, RunOutcome};

pub mod prelude {
    pub use crate::{
        Controller, ControllerDocument, Driver, EventSink, MidiMessage, PortSelector, Processor,
        QuitStatus, RunOutcome,
    };
}

/// Loads, validates and compiles the controller document at `path`.
pub fn load_controller(path: impl AsRef<Path>) -> Result<Controller> {
    let document = ControllerDocument::load(path)?;
    Ok(compile(&document)?)
}

/// Bank names as a receiving device sees them, decoded from the bank-listing SysEx.
pub fn bank_names(controller: &Controller) -> Result<Vec<String>> {
    let message = controller.bank_list_sysex();
    Ok(pedalchord_core::sysex::decode_bank_list(message.bytes())?)
}
