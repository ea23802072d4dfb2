use crossbeam_channel::Sender;
use log::{debug, info};
use midir::{MidiInput, MidiInputConnection};

use crate::core::midi::MidiMessage;
use crate::error::MidiIoError;
use crate::messaging::TimedMessage;

const CLIENT_NAME: &str = "midiscope input";

/// Connects a hardware MIDI input port and feeds parsed messages onto the
/// event bus.
///
/// The midir callback thread is the delivery context: it parses raw packets
/// and pushes `TimedMessage`s into the channel; whoever pumps the bus drives
/// the router.
pub struct MidiInputHandler {
    connection: Option<MidiInputConnection<()>>,
}

impl Default for MidiInputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiInputHandler {
    pub fn new() -> Self {
        Self { connection: None }
    }

    /// List the names of all available MIDI input ports.
    pub fn list_ports(&self) -> Result<Vec<String>, MidiIoError> {
        let midi_in = MidiInput::new(CLIENT_NAME)?;
        let mut port_names = Vec::new();
        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                port_names.push(name);
            }
        }
        Ok(port_names)
    }

    /// Connect to the input port with the given name, replacing any existing
    /// connection. Parsed messages are sent to `sender` with midir's
    /// microsecond timestamps; unparseable packets are dropped with a debug
    /// log.
    pub fn connect(
        &mut self,
        port_name: &str,
        sender: Sender<TimedMessage>,
    ) -> Result<(), MidiIoError> {
        self.disconnect();

        let midi_in = MidiInput::new(CLIENT_NAME)?;
        let port = midi_in
            .ports()
            .into_iter()
            .find(|port| {
                midi_in
                    .port_name(port)
                    .map(|name| name == port_name)
                    .unwrap_or(false)
            })
            .ok_or_else(|| MidiIoError::PortNotFound(port_name.to_string()))?;

        let connection = midi_in.connect(
            &port,
            "midiscope-in",
            move |timestamp, bytes, _| match MidiMessage::parse(bytes) {
                Some(message) => {
                    // receiver gone means shutdown; nothing useful to do here
                    let _ = sender.send(TimedMessage { message, timestamp });
                }
                None => debug!("ignoring unparseable MIDI packet: {bytes:02x?}"),
            },
            (),
        )?;

        info!("connected MIDI input port '{port_name}'");
        self.connection = Some(connection);
        Ok(())
    }

    /// Drop the current connection, if any.
    pub fn disconnect(&mut self) {
        if self.connection.take().is_some() {
            info!("disconnected MIDI input port");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}
