//! MIDI transport for pedalchord.
//!
//! Port listing and selection, midir-backed input/output managers that keep
//! their connections on dedicated threads, and the [`Driver`] loop that feeds
//! a [`pedalchord_core::Processor`].

#![cfg_attr(not(feature = "midi-io"), allow(unused_imports, dead_code))]

pub mod driver;
pub mod error;
#[cfg(feature = "midi-io")]
pub mod io;
pub mod port;

pub use driver::{Driver, EventSink, RunOutcome};
pub use error::{Error, Result};
#[cfg(feature = "midi-io")]
pub use io::{list_input_ports, list_output_ports, open, Connection, MidiInputManager, MidiOutputManager};
pub use port::{prompt_port, PortInfo, PortSelector, PortType};
