//! Transport that talks to the ALSA sequencer directly through `midir`.
//!
//! A link owns an output connection plus an input connection (with SysEx
//! passed through) whose callback forwards every message over a channel.
//! Queries drain stale input, send, then wait on that channel.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

use super::transport::{Endpoint, MidiBus, MidiLink, TransportError, TransportResult};
use super::is_program_change;

/// Native MIDI bus. Port lists are re-read on every scan so hot-plugged
/// devices show up.
#[derive(Debug, Clone)]
pub struct MidirBus {
    client_name: String,
}

impl MidirBus {
    pub fn new() -> Self {
        Self {
            client_name: "patchstep".to_string(),
        }
    }
}

impl Default for MidirBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiBus for MidirBus {
    type Link = MidirLink;

    fn endpoints(&mut self) -> TransportResult<Vec<Endpoint>> {
        let midi_out = MidiOutput::new(&self.client_name).map_err(|e| e.to_string())?;
        let mut endpoints = Vec::new();
        for port in midi_out.ports() {
            if let Ok(name) = midi_out.port_name(&port) {
                endpoints.push(Endpoint::new(name.clone(), name));
            }
        }
        Ok(endpoints)
    }

    fn open(&mut self, endpoint: &Endpoint) -> TransportResult<MidirLink> {
        let midi_out = MidiOutput::new(&self.client_name).map_err(|e| e.to_string())?;
        let out_port = midi_out
            .ports()
            .into_iter()
            .find(|p| midi_out.port_name(p).map_or(false, |n| n == endpoint.id))
            .ok_or_else(|| TransportError(format!("output port {} vanished", endpoint.id)))?;

        let mut midi_in = MidiInput::new(&self.client_name).map_err(|e| e.to_string())?;
        midi_in.ignore(Ignore::None);
        let in_port = midi_in
            .ports()
            .into_iter()
            .find(|p| midi_in.port_name(p).map_or(false, |n| n == endpoint.id))
            .ok_or_else(|| TransportError(format!("no input port for {}", endpoint.id)))?;

        let (tx, rx) = crossbeam_channel::unbounded();
        let input = midi_in
            .connect(
                &in_port,
                "patchstep-in",
                move |_timestamp, message, _| {
                    let _ = tx.send(message.to_vec());
                },
                (),
            )
            .map_err(|e| e.to_string())?;

        let output = midi_out
            .connect(&out_port, "patchstep-out")
            .map_err(|e| e.to_string())?;

        Ok(MidirLink {
            output,
            _input: input,
            replies: rx,
        })
    }
}

/// Open output and input connections to one device.
pub struct MidirLink {
    output: MidiOutputConnection,
    _input: MidiInputConnection<()>,
    replies: Receiver<Vec<u8>>,
}

impl MidiLink for MidirLink {
    fn send(&mut self, frame: &[u8]) -> TransportResult {
        self.output.send(frame).map_err(|e| TransportError(e.to_string()))
    }

    fn request(&mut self, frame: &[u8], timeout: Duration) -> TransportResult<Vec<u8>> {
        while self.replies.try_recv().is_ok() {}

        self.send(frame)?;

        let deadline = Instant::now() + timeout;
        let mut collected = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.replies.recv_timeout(remaining) {
                Ok(message) => {
                    let answered = message
                        .first()
                        .is_some_and(|&status| is_program_change(status));
                    collected.extend_from_slice(&message);
                    if answered {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(TransportError("input connection closed".to_string()));
                }
            }
        }
        Ok(collected)
    }
}
