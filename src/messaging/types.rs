use crate::core::midi::MidiMessage;

/// A MIDI message stamped with its delivery time, as carried on the event
/// bus between the source callback and the router.
///
/// Timestamps are microseconds from the MIDI source; the core only requires
/// them to be non-decreasing, best-effort real time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedMessage {
    pub message: MidiMessage,
    pub timestamp: u64,
}
