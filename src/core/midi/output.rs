use log::info;
use midir::{MidiOutput, MidiOutputConnection};

use crate::core::midi::MidiMessage;
use crate::core::router::MidiSink;
use crate::error::MidiIoError;

const CLIENT_NAME: &str = "midiscope output";

/// Discovers and opens hardware MIDI output ports.
pub struct MidiOutputHandler;

impl MidiOutputHandler {
    /// List the names of all available MIDI output ports.
    pub fn list_ports() -> Result<Vec<String>, MidiIoError> {
        let midi_out = MidiOutput::new(CLIENT_NAME)?;
        let mut port_names = Vec::new();
        for port in midi_out.ports() {
            if let Ok(name) = midi_out.port_name(&port) {
                port_names.push(name);
            }
        }
        Ok(port_names)
    }

    /// Open the output port with the given name as a router sink.
    ///
    /// Failure here is recoverable: the caller simply keeps running without
    /// an audio path.
    pub fn connect(port_name: &str) -> Result<MidiPortSink, MidiIoError> {
        let midi_out = MidiOutput::new(CLIENT_NAME)?;
        let port = midi_out
            .ports()
            .into_iter()
            .find(|port| {
                midi_out
                    .port_name(port)
                    .map(|name| name == port_name)
                    .unwrap_or(false)
            })
            .ok_or_else(|| MidiIoError::PortNotFound(port_name.to_string()))?;

        let connection = midi_out.connect(&port, "midiscope-out")?;
        info!("connected MIDI output port '{port_name}'");
        Ok(MidiPortSink {
            connection: Some(connection),
        })
    }
}

/// `MidiSink` over a hardware MIDI output connection.
pub struct MidiPortSink {
    connection: Option<MidiOutputConnection>,
}

impl MidiSink for MidiPortSink {
    fn send(&mut self, message: &MidiMessage, _timestamp: u64) -> anyhow::Result<()> {
        // hardware ports take messages immediately; the timestamp is only
        // meaningful to sinks that schedule
        if let Some(connection) = self.connection.as_mut() {
            connection.send(&message.to_bytes()).map_err(MidiIoError::from)?;
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
            info!("closed MIDI output port");
        }
    }
}

impl Drop for MidiPortSink {
    fn drop(&mut self) {
        MidiSink::close(self);
    }
}
