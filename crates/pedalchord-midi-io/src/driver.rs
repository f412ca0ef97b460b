//! Event loop between an input stream and an output sink.

use crossbeam_channel::{Receiver, RecvTimeoutError};
use pedalchord_core::{MidiMessage, Processor, QuitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where processed messages go.
pub trait EventSink {
    fn send(&mut self, message: MidiMessage);
}

impl EventSink for Vec<MidiMessage> {
    fn send(&mut self, message: MidiMessage) {
        self.push(message);
    }
}

#[cfg(feature = "midi-io")]
impl EventSink for crate::io::MidiOutputManager {
    fn send(&mut self, message: MidiMessage) {
        self.send_message(message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The processor asked to stop.
    Finished(QuitStatus),
    /// The shutdown flag was raised.
    Interrupted,
    /// The input side went away.
    InputClosed,
}

impl RunOutcome {
    pub fn status(&self) -> Option<QuitStatus> {
        match self {
            RunOutcome::Finished(status) => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Driver {
    poll_interval: Duration,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver {
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
        }
    }

    /// How often the shutdown flag is checked while no input arrives.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sends the start messages, feeds every input event through `processor`
    /// until it quits, then sends the stop messages.
    ///
    /// Notes still held when the loop ends for another reason are released
    /// before the stop messages go out.
    pub fn run<S: EventSink>(
        &self,
        processor: &mut Processor,
        events: &Receiver<Vec<u8>>,
        sink: &mut S,
        shutdown: &AtomicBool,
    ) -> RunOutcome {
        for message in processor.start_messages() {
            sink.send(message.clone());
        }
        info!(
            "Running bank {} of {}",
            processor.current_bank() + 1,
            processor.controller().banks().len()
        );

        let outcome = loop {
            if shutdown.load(Ordering::SeqCst) {
                break RunOutcome::Interrupted;
            }
            match events.recv_timeout(self.poll_interval) {
                Ok(event) => {
                    for message in processor.process(&event) {
                        sink.send(message);
                    }
                    if let Some(status) = processor.status() {
                        break RunOutcome::Finished(status);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("MIDI input closed");
                    break RunOutcome::InputClosed;
                }
            }
        };

        for message in processor.release_held() {
            sink.send(message);
        }
        for message in processor.stop_messages() {
            sink.send(message.clone());
        }
        debug!("Driver finished: {:?}", outcome);
        outcome
    }
}
