//! MIDI input: device enumeration and a connection that forwards raw bytes
//! into a channel. The connection lives on its own thread.

use crate::error::{Error, Result};
use crate::port::{PortInfo, PortType};
use crossbeam_channel::{bounded, Receiver, Sender};
use midir::{Ignore, MidiInput, MidiInputConnection};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

const CLIENT_NAME: &str = "pedalchord-input";

/// Capacity of the channel between the midir callback and the driver.
pub const INPUT_QUEUE_CAPACITY: usize = 4096;

enum MidiInputCommand {
    Connect(usize, Sender<Vec<u8>>, Sender<Result<String>>),
    Disconnect,
    Shutdown,
}

pub struct MidiInputManager {
    command_sender: Sender<MidiInputCommand>,
    connected_device: Arc<arc_swap::ArcSwap<Option<String>>>,
    is_connected: Arc<AtomicBool>,
}

impl MidiInputManager {
    pub fn new() -> Result<Self> {
        let (command_sender, command_receiver) = bounded(16);
        let connected_device = Arc::new(arc_swap::ArcSwap::new(Arc::new(None)));
        let is_connected = Arc::new(AtomicBool::new(false));

        let connected_device_clone = Arc::clone(&connected_device);
        let is_connected_clone = Arc::clone(&is_connected);

        thread::Builder::new()
            .name("midi-input-thread".to_string())
            .spawn(move || {
                Self::midi_thread(command_receiver, connected_device_clone, is_connected_clone);
            })
            .map_err(|e| Error::MidiDevice(format!("Failed to spawn MIDI input thread: {}", e)))?;

        Ok(Self {
            command_sender,
            connected_device,
            is_connected,
        })
    }

    fn midi_thread(
        command_receiver: Receiver<MidiInputCommand>,
        connected_device: Arc<arc_swap::ArcSwap<Option<String>>>,
        is_connected: Arc<AtomicBool>,
    ) {
        let mut connection: Option<MidiInputConnection<()>> = None;

        loop {
            match command_receiver.recv_timeout(Duration::from_millis(100)) {
                Ok(MidiInputCommand::Connect(device_index, events, reply)) => {
                    if let Some(conn) = connection.take() {
                        conn.close();
                    }

                    let result = match Self::connect_to_device(device_index, events) {
                        Ok((conn, name)) => {
                            connection = Some(conn);
                            is_connected.store(true, Ordering::SeqCst);
                            connected_device.store(Arc::new(Some(name.clone())));
                            Ok(name)
                        }
                        Err(e) => {
                            is_connected.store(false, Ordering::SeqCst);
                            connected_device.store(Arc::new(None));
                            Err(e)
                        }
                    };
                    let _ = reply.send(result);
                }
                Ok(MidiInputCommand::Disconnect) => {
                    if let Some(conn) = connection.take() {
                        conn.close();
                        is_connected.store(false, Ordering::SeqCst);
                        connected_device.store(Arc::new(None));
                    }
                }
                Ok(MidiInputCommand::Shutdown) => {
                    if let Some(conn) = connection.take() {
                        conn.close();
                    }
                    break;
                }
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                    break;
                }
            }
        }
    }

    fn connect_to_device(
        device_index: usize,
        events: Sender<Vec<u8>>,
    ) -> Result<(MidiInputConnection<()>, String)> {
        let mut midi_input = MidiInput::new(CLIENT_NAME)?;
        // SysEx, timing and active sensing all pass through to the processor.
        midi_input.ignore(Ignore::None);

        let ports = midi_input.ports();
        let port = ports.get(device_index).ok_or_else(|| {
            Error::MidiDevice(format!("MIDI input device {} not found", device_index))
        })?;

        let port_name = midi_input
            .port_name(port)
            .unwrap_or_else(|_| format!("Device {}", device_index));

        let connection = midi_input.connect(
            port,
            CLIENT_NAME,
            move |_timestamp, message, _| {
                if events.try_send(message.to_vec()).is_err() {
                    debug!("MIDI input queue full, dropping {} bytes", message.len());
                }
            },
            (),
        )?;
        info!("Connected MIDI input: {}", port_name);

        Ok((connection, port_name))
    }

    pub fn list_devices() -> Vec<PortInfo> {
        let mut devices = Vec::new();
        if let Ok(midi_input) = MidiInput::new("pedalchord-device-list") {
            let ports = midi_input.ports();
            for (index, port) in ports.iter().enumerate() {
                let name = midi_input
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index));
                devices.push(PortInfo {
                    index,
                    name,
                    port_type: PortType::Input,
                });
            }
        }
        devices
    }

    /// Connects to `device_index` and returns the receiving end of its byte stream.
    ///
    /// The receiver disconnects once the connection is closed.
    pub fn connect(&self, device_index: usize) -> Result<(String, Receiver<Vec<u8>>)> {
        let (event_sender, event_receiver) = bounded(INPUT_QUEUE_CAPACITY);
        let (reply_sender, reply_receiver) = bounded(1);
        self.command_sender
            .send(MidiInputCommand::Connect(
                device_index,
                event_sender,
                reply_sender,
            ))
            .map_err(|_| Error::MidiDevice("MIDI input thread not running".to_string()))?;
        let name = reply_receiver
            .recv()
            .map_err(|_| Error::MidiDevice("MIDI input thread not running".to_string()))??;
        Ok((name, event_receiver))
    }

    pub fn disconnect(&self) {
        let _ = self.command_sender.send(MidiInputCommand::Disconnect);
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::SeqCst)
    }

    pub fn connected_device_name(&self) -> Option<String> {
        self.connected_device.load().as_ref().clone()
    }
}

impl Drop for MidiInputManager {
    fn drop(&mut self) {
        let _ = self.command_sender.send(MidiInputCommand::Shutdown);
    }
}
