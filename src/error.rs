use thiserror::Error;

/// Faults surfaced by the visualization core itself.
///
/// An out-of-range channel index always indicates a malformed message or a
/// confused caller upstream, so it is reported rather than silently dropped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("channel index {0} out of range (expected 0-15)")]
    ChannelOutOfRange(usize),
}

/// Faults from the MIDI port adapters.
///
/// These are recoverable: the engine keeps running in visualization-only mode
/// when no output port can be opened.
#[derive(Debug, Error)]
pub enum MidiIoError {
    #[error("failed to initialize MIDI backend: {0}")]
    Init(String),

    #[error("MIDI port '{0}' not found")]
    PortNotFound(String),

    #[error("failed to connect to MIDI port: {0}")]
    Connect(String),

    #[error("failed to send on MIDI port: {0}")]
    Send(String),
}

impl From<midir::InitError> for MidiIoError {
    fn from(e: midir::InitError) -> Self {
        MidiIoError::Init(e.to_string())
    }
}

impl From<midir::ConnectError<midir::MidiInput>> for MidiIoError {
    fn from(e: midir::ConnectError<midir::MidiInput>) -> Self {
        MidiIoError::Connect(e.to_string())
    }
}

impl From<midir::ConnectError<midir::MidiOutput>> for MidiIoError {
    fn from(e: midir::ConnectError<midir::MidiOutput>) -> Self {
        MidiIoError::Connect(e.to_string())
    }
}

impl From<midir::SendError> for MidiIoError {
    fn from(e: midir::SendError) -> Self {
        MidiIoError::Send(e.to_string())
    }
}
