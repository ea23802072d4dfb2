//! MIDI performance visualization core.
//!
//! Routes a stream of MIDI events to a per-channel visualization
//! synthesizer and optionally on to a real output device with mute/solo
//! gating. Each channel keeps a rolling waveform buffer from which level
//! meters and spectrum displays derive their readings. No audio device is
//! required; the synthesized waveform exists purely to be looked at.

pub mod core;
pub mod error;
pub mod messaging;

pub use crate::core::analyzer::{rms_and_peak, LevelAnalyzer, BAND_COUNT};
pub use crate::core::engine::{ChannelControls, VisualizationEngine, CHANNELS};
pub use crate::core::midi::{MidiInputHandler, MidiMessage, MidiOutputHandler, MidiPortSink};
pub use crate::core::router::{EventRouter, MidiSink};
pub use crate::error::{EngineError, MidiIoError};
pub use crate::messaging::{EventBus, TimedMessage};
