use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::warn;

use crate::core::engine::VisualizationEngine;
use crate::core::midi::MidiMessage;
use crate::error::EngineError;

/// Destination for the audio path: a real MIDI device, a software synth, or
/// anything else that accepts wire-level messages.
///
/// Implementations must tolerate being replaced at any time; the router never
/// assumes a sink is present.
pub trait MidiSink: Send {
    fn send(&mut self, message: &MidiMessage, timestamp: u64) -> anyhow::Result<()>;
    fn close(&mut self);
}

/// Tees incoming MIDI messages to the visualization engine and, when one is
/// attached, to an output sink.
///
/// Visualization always sees every message. The sink only receives
/// channel-voice messages that survive mute/solo gating: mute suppresses a
/// channel unconditionally, and any active solo suppresses every non-solo
/// channel. Non-channel-voice traffic is never gated.
pub struct EventRouter {
    engine: Arc<VisualizationEngine>,
    sink: Mutex<Option<Box<dyn MidiSink>>>,
    closed: AtomicBool,
}

impl EventRouter {
    pub fn new(engine: Arc<VisualizationEngine>) -> Self {
        Self {
            engine,
            sink: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    pub fn engine(&self) -> &Arc<VisualizationEngine> {
        &self.engine
    }

    /// Replace the output sink, returning the previous one. Closing the
    /// returned sink is the caller's responsibility.
    pub fn set_target(&self, sink: Option<Box<dyn MidiSink>>) -> Option<Box<dyn MidiSink>> {
        match self.sink.lock() {
            Ok(mut guard) => std::mem::replace(&mut *guard, sink),
            Err(_) => None,
        }
    }

    /// Route one timestamped message.
    ///
    /// A closed router ignores the call. Sink faults are swallowed here —
    /// a disconnected or misbehaving output device must never interrupt
    /// visualization — but an out-of-range channel is a protocol violation
    /// and is surfaced.
    pub fn dispatch(&self, message: &MidiMessage, timestamp: u64) -> Result<(), EngineError> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(());
        }

        // visualization reflects the full performance, muted or not
        self.engine.handle(message, timestamp)?;

        if let Some(channel) = message.channel() {
            let ch = usize::from(channel);
            let audible = !self.engine.is_muted(ch)?
                && (!self.engine.any_solo() || self.engine.is_solo(ch)?);
            if !audible {
                return Ok(());
            }
        }

        if let Ok(mut guard) = self.sink.lock() {
            if let Some(sink) = guard.as_mut() {
                if let Err(err) = sink.send(message, timestamp) {
                    warn!("dropping MIDI output send failure: {err}");
                }
            }
        }
        Ok(())
    }

    /// Permanently close the router and the attached sink, if any.
    /// Subsequent dispatches become no-ops; closing twice is harmless.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        if let Ok(mut guard) = self.sink.lock() {
            if let Some(mut sink) = guard.take() {
                sink.close();
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
