//! Hardware ports through midir.

mod input;
mod output;

pub use input::{MidiInputManager, INPUT_QUEUE_CAPACITY};
pub use output::MidiOutputManager;

use crate::error::{Error, Result};
use crate::port::{PortInfo, PortSelector};
use crossbeam_channel::Receiver;
use tracing::info;

pub fn list_input_ports() -> Vec<PortInfo> {
    MidiInputManager::list_devices()
}

pub fn list_output_ports() -> Vec<PortInfo> {
    MidiOutputManager::list_devices()
}

/// An open input/output pair. Dropping it closes both ports.
pub struct Connection {
    pub input: MidiInputManager,
    pub output: MidiOutputManager,
    pub events: Receiver<Vec<u8>>,
}

/// Opens the selected ports, defaulting to the first one of each kind.
pub fn open(input: Option<&PortSelector>, output: Option<&PortSelector>) -> Result<Connection> {
    let input_port = select("input", &list_input_ports(), input)?;
    let output_port = select("output", &list_output_ports(), output)?;

    let input_manager = MidiInputManager::new()?;
    let (input_name, events) = input_manager.connect(input_port.index)?;
    let output_manager = MidiOutputManager::new()?;
    let output_name = output_manager.connect(output_port.index)?;
    info!("Routing {} -> {}", input_name, output_name);

    Ok(Connection {
        input: input_manager,
        output: output_manager,
        events,
    })
}

fn select(
    kind: &'static str,
    ports: &[PortInfo],
    selector: Option<&PortSelector>,
) -> Result<PortInfo> {
    let found = match selector {
        Some(selector) => selector.resolve(ports),
        None => ports.first(),
    };
    found.cloned().ok_or_else(|| Error::PortNotFound {
        kind,
        selector: selector
            .map(|s| s.to_string())
            .unwrap_or_else(|| "<first>".to_string()),
    })
}
