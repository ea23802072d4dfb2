use std::f64::consts::TAU;

/// Attack time of the fixed attack/decay envelope, in seconds.
const ATTACK_SECONDS: f64 = 0.01;

/// Per-sample geometric decay factor applied after the attack completes.
const DECAY_FACTOR: f64 = 0.9995;

/// Envelope level below which a voice is considered silent and reclaimable.
const FINISHED_THRESHOLD: f64 = 0.0005;

/// One sounding note on a channel: a sine oscillator plus a simple
/// attack/decay envelope.
///
/// The envelope is a deliberate approximation (linear 10 ms attack, then slow
/// geometric decay); the output only ever feeds visual meters, never a
/// speaker.
pub struct NoteVoice {
    pub note: u8,
    freq: f64,
    amp: f64,
    phase: f64,
    env: f64,
    life_samples: u32,
}

impl NoteVoice {
    pub fn new(note: u8, velocity: u8) -> Self {
        Self {
            note,
            // equal temperament referenced to A4 = 440 Hz at MIDI note 69
            freq: 440.0 * 2.0f64.powf((f64::from(note) - 69.0) / 12.0),
            // modest amplitude so a handful of voices stays under the clip
            amp: f64::from(velocity) / 127.0 * 0.3,
            phase: 0.0,
            env: 1.0,
            life_samples: 0,
        }
    }

    /// Advance the oscillator and envelope by one tick and return the sample.
    pub fn next_sample(&mut self, sample_rate: f64) -> f64 {
        self.life_samples += 1;

        let attack_samples = sample_rate * ATTACK_SECONDS;
        if f64::from(self.life_samples) < attack_samples {
            self.env = f64::from(self.life_samples) / attack_samples;
        } else {
            self.env = (self.env * DECAY_FACTOR).max(0.0);
        }

        self.phase += TAU * self.freq / sample_rate;
        if self.phase > TAU {
            self.phase -= TAU;
        }
        self.phase.sin() * self.amp * self.env
    }

    /// Whether the envelope has decayed below the audible floor.
    pub fn is_finished(&self) -> bool {
        self.env < FINISHED_THRESHOLD
    }

    #[cfg(test)]
    pub(crate) fn envelope(&self) -> f64 {
        self.env
    }

    #[cfg(test)]
    pub(crate) fn frequency(&self) -> f64 {
        self.freq
    }

    #[cfg(test)]
    pub(crate) fn amplitude(&self) -> f64 {
        self.amp
    }
}
