use std::sync::{Mutex, RwLock};

use crate::core::midi::MidiMessage;
use crate::core::synth::ChannelSynth;
use crate::error::EngineError;

/// Number of MIDI channels.
pub const CHANNELS: usize = 16;

/// Per-channel mute/solo flags, toggled by user-facing controls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelControls {
    pub muted: bool,
    pub solo: bool,
}

/// Composition root of the visualization core: sixteen independently locked
/// channel synthesizers plus the mute/solo table.
///
/// Each channel has its own mutex so the MIDI delivery thread and renderer
/// refresh threads only contend when they touch the same channel. Mute/solo
/// affects only what the router forwards to the audio sink; visualization
/// state always reflects the full performance.
pub struct VisualizationEngine {
    channels: Vec<Mutex<ChannelSynth>>,
    controls: RwLock<[ChannelControls; CHANNELS]>,
}

impl Default for VisualizationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualizationEngine {
    pub fn new() -> Self {
        Self {
            channels: (0..CHANNELS).map(|_| Mutex::new(ChannelSynth::new())).collect(),
            controls: RwLock::new([ChannelControls::default(); CHANNELS]),
        }
    }

    fn channel(&self, channel: usize) -> Result<&Mutex<ChannelSynth>, EngineError> {
        self.channels
            .get(channel)
            .ok_or(EngineError::ChannelOutOfRange(channel))
    }

    /// Apply a MIDI message to the addressed channel's synthesizer.
    ///
    /// System messages are a successful no-op. The timestamp is accepted for
    /// interface symmetry with sinks but synthesis is clocked off wall time,
    /// not event time.
    pub fn handle(&self, message: &MidiMessage, _timestamp: u64) -> Result<(), EngineError> {
        let Some(channel) = message.channel() else {
            return Ok(());
        };
        if let Ok(mut synth) = self.channel(usize::from(channel))?.lock() {
            synth.apply_event(message);
        }
        Ok(())
    }

    /// Advance the channel's synthesis to now and copy out the most recent
    /// `length` samples, oldest first.
    pub fn snapshot(&self, channel: usize, length: usize) -> Result<Vec<f32>, EngineError> {
        match self.channel(channel)?.lock() {
            Ok(mut synth) => Ok(synth.advance_and_read(length)),
            // a poisoned channel degrades to silence rather than poisoning
            // every renderer
            Err(_) => Ok(Vec::new()),
        }
    }

    pub fn set_mute(&self, channel: usize, muted: bool) -> Result<(), EngineError> {
        if channel >= CHANNELS {
            return Err(EngineError::ChannelOutOfRange(channel));
        }
        if let Ok(mut controls) = self.controls.write() {
            controls[channel].muted = muted;
        }
        Ok(())
    }

    pub fn set_solo(&self, channel: usize, solo: bool) -> Result<(), EngineError> {
        if channel >= CHANNELS {
            return Err(EngineError::ChannelOutOfRange(channel));
        }
        if let Ok(mut controls) = self.controls.write() {
            controls[channel].solo = solo;
        }
        Ok(())
    }

    pub fn is_muted(&self, channel: usize) -> Result<bool, EngineError> {
        Ok(self.channel_controls(channel)?.muted)
    }

    pub fn is_solo(&self, channel: usize) -> Result<bool, EngineError> {
        Ok(self.channel_controls(channel)?.solo)
    }

    /// Whether any channel is currently soloed (which suppresses audio from
    /// every non-solo channel).
    pub fn any_solo(&self) -> bool {
        self.controls
            .read()
            .map(|controls| controls.iter().any(|c| c.solo))
            .unwrap_or(false)
    }

    pub fn channel_controls(&self, channel: usize) -> Result<ChannelControls, EngineError> {
        if channel >= CHANNELS {
            return Err(EngineError::ChannelOutOfRange(channel));
        }
        Ok(self
            .controls
            .read()
            .map(|controls| controls[channel])
            .unwrap_or_default())
    }

    pub fn program(&self, channel: usize) -> Result<u8, EngineError> {
        Ok(self
            .channel(channel)?
            .lock()
            .map(|synth| synth.program())
            .unwrap_or(0))
    }

    /// Set a channel's program directly, as channel-strip program up/down
    /// controls do (no MIDI message involved).
    pub fn set_program(&self, channel: usize, program: u8) -> Result<(), EngineError> {
        if let Ok(mut synth) = self.channel(channel)?.lock() {
            synth.set_program(program);
        }
        Ok(())
    }

    pub fn instrument_name(&self, channel: usize) -> Result<&'static str, EngineError> {
        Ok(self
            .channel(channel)?
            .lock()
            .map(|synth| synth.instrument_name())
            .unwrap_or_else(|_| crate::core::instruments::name(0)))
    }

    pub fn active_note_count(&self, channel: usize) -> Result<usize, EngineError> {
        Ok(self
            .channel(channel)?
            .lock()
            .map(|synth| synth.active_note_count())
            .unwrap_or(0))
    }
}
