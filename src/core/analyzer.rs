//! Loudness and pseudo-spectrum metrics over waveform snapshots.
//!
//! The band profile is a cheap multi-window energy estimate, not an FFT: each
//! band rectifies and averages the signal over a sliding window whose size
//! shrinks exponentially from band 0 to band 19, which roughly separates low
//! from high frequency content at a fraction of the cost.

/// Number of bands in the pseudo-spectrum.
pub const BAND_COUNT: usize = 20;

/// Attack coefficient for band level smoothing.
const ATTACK_RATE: f32 = 0.4;

/// Decay coefficient for band level smoothing.
const DECAY_RATE: f32 = 0.08;

/// Per-call multiplicative fall of the peak-hold indicators.
const PEAK_FALL: f32 = 0.96;

/// Per-call level fall applied when there is no input to analyze.
const SILENCE_DECAY: f32 = 0.9;

/// Post-average gain before clamping a band level to 1.0.
const ENERGY_BOOST: f32 = 1.5;

/// Peak absolute value and root-mean-square of a sample snapshot.
///
/// Both land in [0,1] for clipped input; an empty snapshot yields (0,0).
pub fn rms_and_peak(samples: &[f32]) -> (f32, f32) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    let mut peak = 0.0f32;
    let mut sum_sq = 0.0f64;
    for &s in samples {
        peak = peak.max(s.abs());
        sum_sq += f64::from(s) * f64::from(s);
    }
    let rms = (sum_sq / samples.len() as f64).sqrt() as f32;
    (rms, peak)
}

/// Smoothed 20-band energy meter with peak-hold.
///
/// Holds only smoothing memory; one instance per channel, owned by whichever
/// renderer (or engine acting for it) wants a spectrum view. Levels rise fast
/// and fall slow so the display reads calmly instead of flickering, and peaks
/// snap up instantly then fall 4% per call.
pub struct LevelAnalyzer {
    levels: [f32; BAND_COUNT],
    peaks: [f32; BAND_COUNT],
}

impl Default for LevelAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelAnalyzer {
    pub fn new() -> Self {
        Self {
            levels: [0.0; BAND_COUNT],
            peaks: [0.0; BAND_COUNT],
        }
    }

    /// Fold one waveform snapshot into the band levels.
    ///
    /// An empty snapshot decays every level and peak toward zero instead of
    /// freezing the display.
    pub fn band_energies(&mut self, samples: &[f32]) {
        if samples.is_empty() {
            for b in 0..BAND_COUNT {
                self.levels[b] *= SILENCE_DECAY;
                self.peaks[b] *= PEAK_FALL;
            }
            return;
        }

        for b in 0..BAND_COUNT {
            let raw = band_energy(samples, b);
            let level = (raw * ENERGY_BOOST).min(1.0);

            let prev = self.levels[b];
            let target = level.max(prev * (1.0 - DECAY_RATE));
            self.levels[b] = prev + ATTACK_RATE * (target - prev);
            self.peaks[b] = (self.peaks[b] * PEAK_FALL).max(self.levels[b]);
        }
    }

    pub fn levels(&self) -> &[f32; BAND_COUNT] {
        &self.levels
    }

    pub fn peaks(&self) -> &[f32; BAND_COUNT] {
        &self.peaks
    }
}

/// Raw rectified energy of one band: the maximum windowed mean |x| across
/// the snapshot.
///
/// Window size maps band index exponentially from ~25% of the snapshot
/// (band 0) down to a 4-sample floor, stepping by a quarter window.
fn band_energy(samples: &[f32], band: usize) -> f32 {
    let t = band as f64 / (BAND_COUNT - 1) as f64;
    let mut win = (samples.len() as f64 * (0.25 * 0.5f64.powf(t))) as usize;
    if win < 4 {
        win = 4;
    }
    let step = (win / 4).max(1);

    let mut max_avg = 0.0f64;
    let mut i = 0;
    while i + win <= samples.len() {
        let sum: f64 = samples[i..i + win].iter().map(|&s| f64::from(s.abs())).sum();
        let avg = sum / win as f64;
        if avg > max_avg {
            max_avg = avg;
        }
        i += step;
    }
    max_avg as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rms_and_peak_of_empty_input_is_zero() {
        assert_eq!(rms_and_peak(&[]), (0.0, 0.0));
    }

    #[test]
    fn rms_and_peak_of_known_signal() {
        let samples = [0.5, -0.5, 0.5, -0.5];
        let (rms, peak) = rms_and_peak(&samples);
        assert_relative_eq!(rms, 0.5, epsilon = 1e-6);
        assert_relative_eq!(peak, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn peak_tracks_largest_magnitude_of_either_sign() {
        let (_, peak) = rms_and_peak(&[0.1, -0.9, 0.3]);
        assert_relative_eq!(peak, 0.9, epsilon = 1e-6);
    }

    #[test]
    fn loud_signal_raises_band_levels() {
        let samples = vec![0.8f32; 512];
        let mut analyzer = LevelAnalyzer::new();
        analyzer.band_energies(&samples);
        assert!(analyzer.levels().iter().all(|&l| l > 0.0));
        assert!(analyzer.peaks().iter().all(|&p| p > 0.0));
    }

    #[test]
    fn levels_and_peaks_stay_in_unit_range() {
        let samples = vec![1.0f32; 2048];
        let mut analyzer = LevelAnalyzer::new();
        for _ in 0..50 {
            analyzer.band_energies(&samples);
        }
        assert!(analyzer.levels().iter().all(|&l| (0.0..=1.0).contains(&l)));
        assert!(analyzer.peaks().iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn silence_decays_levels_monotonically_without_new_energy() {
        let mut analyzer = LevelAnalyzer::new();
        analyzer.band_energies(&vec![0.8f32; 512]);
        let mut prev_levels = *analyzer.levels();
        let mut prev_peaks = *analyzer.peaks();

        for _ in 0..100 {
            analyzer.band_energies(&[]);
            for b in 0..BAND_COUNT {
                assert!(analyzer.levels()[b] <= prev_levels[b]);
                assert!(analyzer.peaks()[b] <= prev_peaks[b]);
                assert!(analyzer.levels()[b] >= 0.0);
                assert!(analyzer.peaks()[b] >= 0.0);
            }
            prev_levels = *analyzer.levels();
            prev_peaks = *analyzer.peaks();
        }
        assert!(analyzer.levels().iter().all(|&l| l < 1e-3));
    }

    #[test]
    fn all_zero_input_also_settles_to_silence() {
        let mut analyzer = LevelAnalyzer::new();
        analyzer.band_energies(&vec![0.8f32; 512]);
        for _ in 0..200 {
            analyzer.band_energies(&vec![0.0f32; 512]);
        }
        assert!(analyzer.levels().iter().all(|&l| l < 1e-3));
        assert!(analyzer.peaks().iter().all(|&p| p < 1e-2));
    }

    #[test]
    fn levels_rise_faster_than_they_fall() {
        let loud = vec![0.8f32; 512];
        let mut analyzer = LevelAnalyzer::new();
        analyzer.band_energies(&loud);
        let after_rise = analyzer.levels()[0];

        analyzer.band_energies(&vec![0.0f32; 512]);
        let after_fall = analyzer.levels()[0];

        // one loud call jumps 40% of the way up; one silent call sheds only
        // a few percent
        assert!(after_rise > 0.3);
        assert!(after_fall > after_rise * 0.9);
    }

    #[test]
    fn peak_hold_lags_a_dropping_level() {
        let mut analyzer = LevelAnalyzer::new();
        for _ in 0..20 {
            analyzer.band_energies(&vec![0.8f32; 512]);
        }
        // once the signal cuts out, levels fall faster than the held peaks
        for _ in 0..5 {
            analyzer.band_energies(&[]);
        }
        assert!(analyzer.peaks()[0] > analyzer.levels()[0]);
    }

    #[test]
    fn snapshot_shorter_than_any_window_reads_as_quiet() {
        let mut analyzer = LevelAnalyzer::new();
        analyzer.band_energies(&[1.0, 1.0]);
        // no window fits, so no band can report energy
        assert!(analyzer.levels().iter().all(|&l| l == 0.0));
    }
}
