//! MIDI output: device enumeration, connection, and message sending via a dedicated thread.

use crate::error::{Error, Result};
use crate::port::{PortInfo, PortType};
use crossbeam_channel::{bounded, Receiver, Sender};
use midir::{MidiOutput, MidiOutputConnection};
use pedalchord_core::MidiMessage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const CLIENT_NAME: &str = "pedalchord-output";

enum MidiOutputCommand {
    Connect(usize, Sender<Result<String>>),
    Disconnect,
    SendMessage(MidiMessage),
    Shutdown,
}

/// Owns the output connection on its own thread; sending never blocks.
pub struct MidiOutputManager {
    command_sender: Sender<MidiOutputCommand>,
    connected_device: Arc<arc_swap::ArcSwap<Option<String>>>,
    is_connected: Arc<AtomicBool>,
}

impl MidiOutputManager {
    pub fn new() -> Result<Self> {
        let (command_sender, command_receiver) = bounded(1024);
        let connected_device = Arc::new(arc_swap::ArcSwap::new(Arc::new(None)));
        let is_connected = Arc::new(AtomicBool::new(false));

        let connected_device_clone = Arc::clone(&connected_device);
        let is_connected_clone = Arc::clone(&is_connected);

        thread::Builder::new()
            .name("midi-output-thread".to_string())
            .spawn(move || {
                Self::midi_output_thread(
                    command_receiver,
                    connected_device_clone,
                    is_connected_clone,
                );
            })
            .map_err(|e| {
                Error::MidiDevice(format!("Failed to spawn MIDI output thread: {}", e))
            })?;

        Ok(Self {
            command_sender,
            connected_device,
            is_connected,
        })
    }

    fn midi_output_thread(
        command_receiver: Receiver<MidiOutputCommand>,
        connected_device: Arc<arc_swap::ArcSwap<Option<String>>>,
        is_connected: Arc<AtomicBool>,
    ) {
        let mut connection: Option<MidiOutputConnection> = None;

        loop {
            match command_receiver.recv_timeout(Duration::from_millis(100)) {
                Ok(MidiOutputCommand::Connect(device_index, reply)) => {
                    if let Some(conn) = connection.take() {
                        conn.close();
                    }

                    let result = match Self::connect_to_device(device_index) {
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
                Ok(MidiOutputCommand::Disconnect) => {
                    if let Some(conn) = connection.take() {
                        conn.close();
                        is_connected.store(false, Ordering::SeqCst);
                        connected_device.store(Arc::new(None));
                    }
                }
                Ok(MidiOutputCommand::SendMessage(msg)) => {
                    if let Some(ref mut conn) = connection {
                        if let Err(e) = conn.send(msg.bytes()) {
                            warn!("Failed to send {}: {}", msg, e);
                        }
                    } else {
                        debug!("Cannot send MIDI message: no device connected");
                    }
                }
                Ok(MidiOutputCommand::Shutdown) => {
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

    fn connect_to_device(device_index: usize) -> Result<(MidiOutputConnection, String)> {
        let midi_output = MidiOutput::new(CLIENT_NAME)?;

        let ports = midi_output.ports();
        let port = ports.get(device_index).ok_or_else(|| {
            Error::MidiDevice(format!("MIDI output device {} not found", device_index))
        })?;

        let port_name = midi_output
            .port_name(port)
            .unwrap_or_else(|_| format!("Device {}", device_index));

        let connection = midi_output.connect(port, CLIENT_NAME)?;
        info!("Connected MIDI output: {}", port_name);

        Ok((connection, port_name))
    }

    pub fn list_devices() -> Vec<PortInfo> {
        let mut devices = Vec::new();
        if let Ok(midi_output) = MidiOutput::new("pedalchord-device-list") {
            let ports = midi_output.ports();
            for (index, port) in ports.iter().enumerate() {
                let name = midi_output
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index));
                devices.push(PortInfo {
                    index,
                    name,
                    port_type: PortType::Output,
                });
            }
        }
        devices
    }

    /// Connects and waits for the output thread to report back.
    pub fn connect(&self, device_index: usize) -> Result<String> {
        let (reply_sender, reply_receiver) = bounded(1);
        self.command_sender
            .send(MidiOutputCommand::Connect(device_index, reply_sender))
            .map_err(|_| Error::MidiDevice("MIDI output thread not running".to_string()))?;
        reply_receiver
            .recv()
            .map_err(|_| Error::MidiDevice("MIDI output thread not running".to_string()))?
    }

    pub fn disconnect(&self) {
        let _ = self.command_sender.send(MidiOutputCommand::Disconnect);
    }

    pub fn send_message(&self, message: MidiMessage) {
        if let Err(e) = self
            .command_sender
            .try_send(MidiOutputCommand::SendMessage(message))
        {
            debug!("MIDI output command channel full or disconnected: {}", e);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::SeqCst)
    }

    pub fn connected_device_name(&self) -> Option<String> {
        self.connected_device.load().as_ref().clone()
    }
}

impl Drop for MidiOutputManager {
    fn drop(&mut self) {
        let _ = self.command_sender.send(MidiOutputCommand::Shutdown);
    }
}
