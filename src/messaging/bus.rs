use crossbeam_channel::{unbounded, Receiver, Sender};
use log::warn;

use crate::core::router::EventRouter;
use crate::messaging::TimedMessage;

/// Channel between the MIDI delivery context and the router.
///
/// Source adapters clone the sender and push from their callback threads;
/// one pump loop drains into `EventRouter::dispatch`. The channel is
/// unbounded — MIDI event rates are tiny next to memory, and the delivery
/// callback must never block.
pub struct EventBus {
    sender: Sender<TimedMessage>,
    receiver: Receiver<TimedMessage>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        EventBus { sender, receiver }
    }

    /// A sender that can be cloned and handed to MIDI source adapters.
    pub fn sender(&self) -> Sender<TimedMessage> {
        self.sender.clone()
    }

    /// Drain up to `max_messages` pending messages into the router.
    /// Returns how many were dispatched.
    pub fn pump(&self, router: &EventRouter, max_messages: usize) -> usize {
        let mut count = 0;
        while count < max_messages {
            let Ok(timed) = self.receiver.try_recv() else {
                break;
            };
            count += 1;
            if let Err(err) = router.dispatch(&timed.message, timed.timestamp) {
                warn!("dropping undeliverable MIDI message: {err}");
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::VisualizationEngine;
    use crate::core::midi::MidiMessage;
    use std::sync::Arc;

    #[test]
    fn pump_dispatches_queued_messages_in_order() {
        let bus = EventBus::new();
        let router = EventRouter::new(Arc::new(VisualizationEngine::new()));

        let sender = bus.sender();
        for note in [60, 61, 62] {
            sender
                .send(TimedMessage {
                    message: MidiMessage::NoteOn {
                        channel: 2,
                        note,
                        velocity: 100,
                    },
                    timestamp: u64::from(note),
                })
                .unwrap();
        }

        assert_eq!(bus.pump(&router, 100), 3);
        assert_eq!(router.engine().active_note_count(2).unwrap(), 3);
        assert_eq!(bus.pump(&router, 100), 0);
    }

    #[test]
    fn pump_respects_the_message_cap() {
        let bus = EventBus::new();
        let router = EventRouter::new(Arc::new(VisualizationEngine::new()));

        let sender = bus.sender();
        for note in 0..10u8 {
            sender
                .send(TimedMessage {
                    message: MidiMessage::NoteOn {
                        channel: 0,
                        note,
                        velocity: 100,
                    },
                    timestamp: 0,
                })
                .unwrap();
        }

        assert_eq!(bus.pump(&router, 4), 4);
        assert_eq!(router.engine().active_note_count(0).unwrap(), 4);
        assert_eq!(bus.pump(&router, 100), 6);
    }

    #[test]
    fn malformed_channel_does_not_stall_the_pump() {
        let bus = EventBus::new();
        let router = EventRouter::new(Arc::new(VisualizationEngine::new()));

        let sender = bus.sender();
        sender
            .send(TimedMessage {
                message: MidiMessage::NoteOn {
                    channel: 200,
                    note: 60,
                    velocity: 100,
                },
                timestamp: 0,
            })
            .unwrap();
        sender
            .send(TimedMessage {
                message: MidiMessage::NoteOn {
                    channel: 0,
                    note: 60,
                    velocity: 100,
                },
                timestamp: 1,
            })
            .unwrap();

        // the bad message is logged and skipped, the good one lands
        assert_eq!(bus.pump(&router, 100), 2);
        assert_eq!(router.engine().active_note_count(0).unwrap(), 1);
    }
}
