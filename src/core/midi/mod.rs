mod input;
mod output;

pub use input::MidiInputHandler;
pub use output::{MidiOutputHandler, MidiPortSink};

/// A decoded MIDI message.
///
/// Only the channel-voice subset the engine interprets is decoded field by
/// field; everything else (system common, system real-time, sysex) is carried
/// verbatim as `System` so it can still be forwarded to an output sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOff { channel: u8, note: u8, velocity: u8 },
    NoteOn { channel: u8, note: u8, velocity: u8 },
    PolyPressure { channel: u8, note: u8, pressure: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    ChannelPressure { channel: u8, pressure: u8 },
    PitchBend { channel: u8, value: u16 },
    System(Vec<u8>),
}

impl MidiMessage {
    /// Decode a raw MIDI byte packet.
    ///
    /// Returns `None` for empty or truncated packets. Data bytes are masked
    /// to 7 bits so a malformed packet cannot smuggle out-of-range values
    /// into the engine.
    pub fn parse(bytes: &[u8]) -> Option<MidiMessage> {
        let status = *bytes.first()?;
        if status < 0x80 {
            // Running status is not supported; callers deliver full packets.
            return None;
        }
        if status >= 0xF0 {
            return Some(MidiMessage::System(bytes.to_vec()));
        }

        let channel = status & 0x0F;
        let data1 = bytes.get(1).map(|b| b & 0x7F);
        let data2 = bytes.get(2).map(|b| b & 0x7F);

        match status & 0xF0 {
            0x80 => Some(MidiMessage::NoteOff {
                channel,
                note: data1?,
                velocity: data2?,
            }),
            0x90 => Some(MidiMessage::NoteOn {
                channel,
                note: data1?,
                velocity: data2?,
            }),
            0xA0 => Some(MidiMessage::PolyPressure {
                channel,
                note: data1?,
                pressure: data2?,
            }),
            0xB0 => Some(MidiMessage::ControlChange {
                channel,
                controller: data1?,
                value: data2?,
            }),
            0xC0 => Some(MidiMessage::ProgramChange {
                channel,
                program: data1?,
            }),
            0xD0 => Some(MidiMessage::ChannelPressure {
                channel,
                pressure: data1?,
            }),
            0xE0 => {
                let lsb = u16::from(data1?);
                let msb = u16::from(data2?);
                Some(MidiMessage::PitchBend {
                    channel,
                    value: (msb << 7) | lsb,
                })
            }
            _ => unreachable!("status byte {status:#04x} already classified"),
        }
    }

    /// Encode back to wire bytes for an output port.
    pub fn to_bytes(&self) -> Vec<u8> {
        match *self {
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => vec![0x80 | (channel & 0x0F), note, velocity],
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => vec![0x90 | (channel & 0x0F), note, velocity],
            MidiMessage::PolyPressure {
                channel,
                note,
                pressure,
            } => vec![0xA0 | (channel & 0x0F), note, pressure],
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => vec![0xB0 | (channel & 0x0F), controller, value],
            MidiMessage::ProgramChange { channel, program } => {
                vec![0xC0 | (channel & 0x0F), program]
            }
            MidiMessage::ChannelPressure { channel, pressure } => {
                vec![0xD0 | (channel & 0x0F), pressure]
            }
            MidiMessage::PitchBend { channel, value } => vec![
                0xE0 | (channel & 0x0F),
                (value & 0x7F) as u8,
                ((value >> 7) & 0x7F) as u8,
            ],
            MidiMessage::System(ref bytes) => bytes.clone(),
        }
    }

    /// The channel this message addresses, `Some` exactly for channel-voice
    /// messages (command nibble 0x8 through 0xE).
    pub fn channel(&self) -> Option<u8> {
        match *self {
            MidiMessage::NoteOff { channel, .. }
            | MidiMessage::NoteOn { channel, .. }
            | MidiMessage::PolyPressure { channel, .. }
            | MidiMessage::ControlChange { channel, .. }
            | MidiMessage::ProgramChange { channel, .. }
            | MidiMessage::ChannelPressure { channel, .. }
            | MidiMessage::PitchBend { channel, .. } => Some(channel),
            MidiMessage::System(_) => None,
        }
    }

    /// Whether this message carries per-channel performance intent and is
    /// therefore subject to mute/solo gating on the audio path.
    pub fn is_channel_voice(&self) -> bool {
        self.channel().is_some()
    }
}
