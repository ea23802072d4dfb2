use std::collections::HashMap;
use std::time::Instant;

use crate::core::instruments;
use crate::core::midi::MidiMessage;
use crate::core::voice::NoteVoice;

/// Internal synthesis rate. Far below audio quality on purpose: the waveform
/// only drives meters and scopes, and 8 kHz keeps catch-up work tiny.
pub const SAMPLE_RATE: f64 = 8000.0;

/// Capacity of the rolling waveform buffer, in samples.
pub const BUFFER_SIZE: usize = 2048;

/// Upper bound on samples generated per advance, so a long pause between
/// reads never triggers a runaway catch-up burst.
const MAX_CATCHUP_SAMPLES: usize = 512;

/// Per-channel synthesizer state: the active voices, the current program,
/// and a circular buffer of the most recently generated samples.
///
/// Synthesis is lazy — it advances by wall-clock elapsed time whenever a
/// reader asks for the recent waveform.
pub struct ChannelSynth {
    voices: HashMap<u8, NoteVoice>,
    program: u8,
    instrument_name: &'static str,
    buffer: Box<[f32; BUFFER_SIZE]>,
    write_pos: usize,
    last_advance: Instant,
}

impl Default for ChannelSynth {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelSynth {
    pub fn new() -> Self {
        Self {
            voices: HashMap::new(),
            program: 0,
            instrument_name: instruments::name(0),
            buffer: Box::new([0.0; BUFFER_SIZE]),
            write_pos: 0,
            last_advance: Instant::now(),
        }
    }

    /// Update note/program state from a MIDI message.
    ///
    /// Unhandled message kinds are accepted and ignored.
    pub fn apply_event(&mut self, message: &MidiMessage) {
        match *message {
            MidiMessage::NoteOn { note, velocity, .. } => {
                if velocity == 0 {
                    self.note_off(note);
                } else {
                    self.note_on(note, velocity);
                }
            }
            MidiMessage::NoteOff { note, .. } => self.note_off(note),
            MidiMessage::ProgramChange { program, .. } => self.set_program(program),
            _ => {}
        }
    }

    /// Start (or retrigger) a voice. Retriggering replaces the existing
    /// voice, resetting its phase and envelope.
    pub fn note_on(&mut self, note: u8, velocity: u8) {
        self.voices.insert(note, NoteVoice::new(note, velocity));
    }

    /// Release a voice. Releasing a note that is not sounding is a no-op.
    pub fn note_off(&mut self, note: u8) {
        self.voices.remove(&note);
    }

    pub fn set_program(&mut self, program: u8) {
        self.program = program.min(127);
        self.instrument_name = instruments::name(self.program);
    }

    pub fn program(&self) -> u8 {
        self.program
    }

    pub fn instrument_name(&self) -> &'static str {
        self.instrument_name
    }

    pub fn active_note_count(&self) -> usize {
        self.voices.len()
    }

    /// Advance synthesis by the wall-clock time elapsed since the previous
    /// advance, then return the most recent `min(length, BUFFER_SIZE)`
    /// samples in chronological order (oldest first).
    pub fn advance_and_read(&mut self, length: usize) -> Vec<f32> {
        self.advance(Instant::now());
        self.read_recent(length)
    }

    /// Generate samples covering `now - last_advance`, bounded to
    /// `MAX_CATCHUP_SAMPLES`. Returns how many samples were written.
    ///
    /// A non-positive elapsed time (clock anomaly, duplicate instant)
    /// generates nothing and leaves `last_advance` untouched.
    fn advance(&mut self, now: Instant) -> usize {
        let dt = now.saturating_duration_since(self.last_advance).as_secs_f64();
        if dt <= 0.0 {
            return 0;
        }
        self.last_advance = now;

        let count = ((dt * SAMPLE_RATE).round() as usize).clamp(1, MAX_CATCHUP_SAMPLES);
        self.render(count);
        count
    }

    /// Synthesize `count` samples into the circular buffer.
    fn render(&mut self, count: usize) {
        for _ in 0..count {
            let mut sample = 0.0f64;
            for voice in self.voices.values_mut() {
                sample += voice.next_sample(SAMPLE_RATE);
            }
            // reclaim silent voices the same tick they finish
            self.voices.retain(|_, voice| !voice.is_finished());

            self.buffer[self.write_pos] = (sample as f32).clamp(-1.0, 1.0);
            self.write_pos = (self.write_pos + 1) % BUFFER_SIZE;
        }
    }

    /// Copy out the newest `min(length, BUFFER_SIZE)` samples, oldest first.
    /// Slots never written still read as silence.
    fn read_recent(&self, length: usize) -> Vec<f32> {
        let length = length.min(BUFFER_SIZE);
        let start = (self.write_pos + BUFFER_SIZE - length) % BUFFER_SIZE;
        let mut out = Vec::with_capacity(length);
        for i in 0..length {
            out.push(self.buffer[(start + i) % BUFFER_SIZE]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analyzer::rms_and_peak;
    use std::time::Duration;

    #[test]
    fn note_off_for_inactive_note_is_noop() {
        let mut synth = ChannelSynth::new();
        synth.note_off(60);
        assert_eq!(synth.active_note_count(), 0);

        synth.note_on(60, 100);
        synth.note_off(61);
        assert_eq!(synth.active_note_count(), 1);
    }

    #[test]
    fn note_on_velocity_zero_releases() {
        let mut synth = ChannelSynth::new();
        synth.apply_event(&MidiMessage::NoteOn {
            channel: 0,
            note: 60,
            velocity: 100,
        });
        assert_eq!(synth.active_note_count(), 1);
        synth.apply_event(&MidiMessage::NoteOn {
            channel: 0,
            note: 60,
            velocity: 0,
        });
        assert_eq!(synth.active_note_count(), 0);
    }

    #[test]
    fn retrigger_replaces_the_voice() {
        let mut synth = ChannelSynth::new();
        synth.note_on(60, 100);
        synth.render(500);
        synth.note_on(60, 100);
        assert_eq!(synth.active_note_count(), 1);
        // the fresh voice is back in its attack: the very next samples are
        // near-silent again
        synth.render(4);
        let tail = synth.read_recent(4);
        assert!(tail.iter().all(|s| s.abs() < 0.05), "tail was {tail:?}");
    }

    #[test]
    fn program_change_updates_name_and_clamps() {
        let mut synth = ChannelSynth::new();
        assert_eq!(synth.instrument_name(), "Acoustic Grand Piano");

        synth.apply_event(&MidiMessage::ProgramChange {
            channel: 0,
            program: 40,
        });
        assert_eq!(synth.program(), 40);
        assert_eq!(synth.instrument_name(), "Violin");

        synth.set_program(200);
        assert_eq!(synth.program(), 127);
        assert_eq!(synth.instrument_name(), "Gunshot");
    }

    #[test]
    fn unhandled_events_are_ignored() {
        let mut synth = ChannelSynth::new();
        synth.apply_event(&MidiMessage::ControlChange {
            channel: 0,
            controller: 64,
            value: 127,
        });
        synth.apply_event(&MidiMessage::PitchBend {
            channel: 0,
            value: 0x2000,
        });
        synth.apply_event(&MidiMessage::System(vec![0xF8]));
        assert_eq!(synth.active_note_count(), 0);
        assert_eq!(synth.program(), 0);
    }

    #[test]
    fn silent_synth_renders_silence() {
        let mut synth = ChannelSynth::new();
        synth.render(BUFFER_SIZE);
        assert!(synth.read_recent(BUFFER_SIZE).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn peak_approaches_velocity_amplitude() {
        let mut synth = ChannelSynth::new();
        synth.note_on(69, 100);
        // several cycles past the attack so the sine reaches its crest
        synth.render(400);
        let (_, peak) = rms_and_peak(&synth.read_recent(400));
        let amplitude = 100.0f32 / 127.0 * 0.3;
        assert!(
            peak > amplitude * 0.9 && peak <= amplitude + 1e-6,
            "peak {peak} vs amplitude {amplitude}"
        );
    }

    #[test]
    fn rms_returns_to_zero_after_note_off() {
        let mut synth = ChannelSynth::new();
        synth.note_on(69, 100);
        synth.render(512);
        synth.note_off(69);
        synth.render(BUFFER_SIZE);
        let (rms, peak) = rms_and_peak(&synth.read_recent(BUFFER_SIZE));
        assert_eq!(rms, 0.0);
        assert_eq!(peak, 0.0);
    }

    #[test]
    fn sum_of_many_voices_is_clipped() {
        let mut synth = ChannelSynth::new();
        // a dense cluster at full velocity sums well past 1.0 unclipped
        for note in 60..76 {
            synth.note_on(note, 127);
        }
        synth.render(BUFFER_SIZE);
        assert!(synth
            .read_recent(BUFFER_SIZE)
            .iter()
            .all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn read_is_chronological() {
        let mut synth = ChannelSynth::new();
        synth.note_on(69, 100);
        synth.render(64);
        let long = synth.read_recent(64);
        let short = synth.read_recent(16);
        // the shorter read is the tail of the longer one
        assert_eq!(&long[48..], &short[..]);
    }

    #[test]
    fn read_longer_than_capacity_is_capped() {
        let mut synth = ChannelSynth::new();
        assert_eq!(synth.advance_and_read(10_000).len(), BUFFER_SIZE);
    }

    #[test]
    fn advance_is_bounded_after_a_pause() {
        let mut synth = ChannelSynth::new();
        synth.last_advance = Instant::now() - Duration::from_secs(10);
        assert_eq!(synth.advance(Instant::now()), 512);
    }

    #[test]
    fn advance_with_no_elapsed_time_generates_nothing() {
        let mut synth = ChannelSynth::new();
        let frozen = synth.last_advance;
        assert_eq!(synth.advance(frozen), 0);
    }

    #[test]
    fn finished_voices_are_reclaimed() {
        let mut synth = ChannelSynth::new();
        synth.note_on(60, 1);
        // enough ticks for the envelope to decay below the floor
        for _ in 0..40 {
            synth.render(512);
        }
        assert_eq!(synth.active_note_count(), 0);
    }
}
