//! Adaptive peak detection
//!
//! Onset picking walks a fixed descending ladder of sensitivity thresholds
//! and stops at the first rung that yields enough peaks. The retry policy
//! is data (an ordered threshold list consumed by one loop), not branching
//! logic, so it stays inspectable and testable on its own.

use crate::envelope::Envelope;
use log::debug;

/// Descending sensitivity thresholds plus the onset-count target that
/// stops the walk
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdLadder {
    pub thresholds: Vec<f32>,
    pub min_onset_count: usize,
}

impl ThresholdLadder {
    pub fn new(thresholds: Vec<f32>, min_onset_count: usize) -> Self {
        Self {
            thresholds,
            min_onset_count,
        }
    }
}

/// Peak frames for one band, with a flag for ladder exhaustion
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Envelope frame indices of retained peaks, ascending
    pub frames: Vec<usize>,
    /// True when no rung met the count target and the most permissive
    /// rung's result was returned as-is (possibly under-dense)
    pub ladder_exhausted: bool,
}

impl Detection {
    /// Convert peak frames to onset times in seconds
    pub fn times(&self, hop_duration: f32) -> Vec<f32> {
        self.frames
            .iter()
            .map(|&f| f as f32 * hop_duration)
            .collect()
    }
}

/// Detect onset peaks in an envelope with a descending threshold ladder
///
/// Each rung finds local maxima above its threshold separated by at least
/// `min_separation_sec`. The first rung whose peak count reaches the
/// ladder's target wins; if none does, the last (most permissive) rung's
/// result is returned regardless of count. A result is always produced.
///
/// Deterministic: identical envelope and ladder always yield identical
/// peaks. Walking to a lower threshold never reduces the peak count.
pub fn detect(envelope: &Envelope, ladder: &ThresholdLadder, min_separation_sec: f32) -> Detection {
    let min_distance_frames = if envelope.hop_duration > 0.0 {
        (min_separation_sec / envelope.hop_duration) as usize
    } else {
        0
    };

    let mut last = Vec::new();
    for (rung, &threshold) in ladder.thresholds.iter().enumerate() {
        let peaks = find_peaks(&envelope.values, threshold, min_distance_frames);
        debug!(
            "ladder rung {} (threshold {:.3}): {} peaks",
            rung,
            threshold,
            peaks.len()
        );
        if peaks.len() >= ladder.min_onset_count {
            return Detection {
                frames: peaks,
                ladder_exhausted: false,
            };
        }
        last = peaks;
    }

    Detection {
        frames: last,
        ladder_exhausted: true,
    }
}

/// Find local maxima above `threshold` with a minimum frame spacing
///
/// Boundary frames count as maxima when they exceed their single
/// neighbor, so a hit in the very first analysis frame is not lost.
fn find_peaks(signal: &[f32], threshold: f32, min_distance_frames: usize) -> Vec<usize> {
    let mut peaks = Vec::new();
    let mut last_peak: Option<usize> = None;

    for i in 0..signal.len() {
        if let Some(last) = last_peak {
            if i < last + min_distance_frames.max(1) {
                continue;
            }
        }

        let above_prev = i == 0 || signal[i] > signal[i - 1];
        let above_next = i + 1 == signal.len() || signal[i] > signal[i + 1];

        if above_prev && above_next && signal[i] > threshold {
            peaks.push(i);
            last_peak = Some(i);
        }
    }

    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(values: Vec<f32>) -> Envelope {
        Envelope {
            values,
            hop_duration: 512.0 / 44100.0,
        }
    }

    fn impulse_envelope(n_frames: usize, peak_frames: &[usize], amplitude: f32) -> Envelope {
        let mut values = vec![0.0; n_frames];
        for &f in peak_frames {
            values[f] = amplitude;
        }
        envelope(values)
    }

    #[test]
    fn test_recovers_known_peaks() {
        let env = impulse_envelope(200, &[10, 50, 90, 130], 0.5);
        let ladder = ThresholdLadder::new(vec![0.15, 0.10, 0.05, 0.02], 4);

        let detection = detect(&env, &ladder, 0.03);
        assert_eq!(detection.frames, vec![10, 50, 90, 130]);
        assert!(!detection.ladder_exhausted);
    }

    #[test]
    fn test_peak_in_first_frame_is_found() {
        let env = impulse_envelope(100, &[0, 50], 0.8);
        let ladder = ThresholdLadder::new(vec![0.15], 1);

        let detection = detect(&env, &ladder, 0.03);
        assert_eq!(detection.frames, vec![0, 50]);
    }

    #[test]
    fn test_exhausted_ladder_returns_last_rung() {
        // Only two peaks but a target of 20: every rung falls short
        let env = impulse_envelope(200, &[10, 100], 0.5);
        let ladder = ThresholdLadder::new(vec![0.15, 0.10, 0.05, 0.02], 20);

        let detection = detect(&env, &ladder, 0.03);
        assert_eq!(detection.frames, vec![10, 100]);
        assert!(detection.ladder_exhausted);
    }

    #[test]
    fn test_quiet_peaks_need_permissive_rung() {
        // Amplitude 0.04 is only above the last rung (0.02)
        let env = impulse_envelope(300, &[20, 80, 140, 200], 0.04);
        let ladder = ThresholdLadder::new(vec![0.15, 0.10, 0.05, 0.02], 4);

        let detection = detect(&env, &ladder, 0.03);
        assert_eq!(detection.frames.len(), 4);
        assert!(!detection.ladder_exhausted);
    }

    #[test]
    fn test_min_separation_enforced() {
        // Two peaks one frame apart; only the first survives
        let mut values = vec![0.0; 100];
        values[40] = 0.9;
        values[42] = 0.8;
        let env = envelope(values);
        let ladder = ThresholdLadder::new(vec![0.15], 1);

        // 0.05s separation is ~4 frames at 512/44100
        let detection = detect(&env, &ladder, 0.05);
        assert_eq!(detection.frames, vec![40]);
    }

    #[test]
    fn test_determinism() {
        let env = impulse_envelope(500, &[5, 60, 120, 180, 240, 300], 0.3);
        let ladder = ThresholdLadder::new(vec![0.15, 0.10, 0.05, 0.02], 20);

        let a = detect(&env, &ladder, 0.03);
        let b = detect(&env, &ladder, 0.03);
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_envelope_yields_no_peaks() {
        let env = envelope(vec![0.0; 100]);
        let ladder = ThresholdLadder::new(vec![0.15, 0.10, 0.05, 0.02], 20);

        let detection = detect(&env, &ladder, 0.03);
        assert!(detection.frames.is_empty());
        assert!(detection.ladder_exhausted);
    }

    #[test]
    fn test_times_conversion() {
        let detection = Detection {
            frames: vec![0, 43, 86],
            ladder_exhausted: false,
        };
        let times = detection.times(512.0 / 44100.0);
        assert_eq!(times.len(), 3);
        assert!((times[1] - 0.4993).abs() < 1e-3);
    }
}
