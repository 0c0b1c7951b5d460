//! Band energy extraction
//!
//! Converts a percussive waveform into a normalized per-frame energy
//! envelope for one frequency band. All three band envelopes come from the
//! same STFT, so their frame indices align and map to time via
//! `frame_index * hop_duration`.

use crate::analysis::DrumClass;
use crate::config::Config;
use crate::spectral::StftData;
use log::debug;
use ndarray::Array2;

/// Frequency band owned by one drum class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBand {
    pub low_hz: f32,
    pub high_hz: f32,
    pub drum_class: DrumClass,
}

impl FrequencyBand {
    /// Build the fixed band for a drum class from config
    pub fn for_class(drum_class: DrumClass, config: &Config) -> Self {
        let [low_hz, high_hz] = match drum_class {
            DrumClass::Kick => config.bands.kick_hz,
            DrumClass::Snare => config.bands.snare_hz,
            DrumClass::HiHat => config.bands.hihat_hz,
        };
        Self {
            low_hz,
            high_hz,
            drum_class,
        }
    }
}

/// Normalized time-energy envelope for one band
///
/// Values are in [0,1]; an all-zero input band stays all-zero rather than
/// producing NaN from a zero-max normalization.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub values: Vec<f32>,
    pub hop_duration: f32,
}

impl Envelope {
    /// Time in seconds of a frame index
    pub fn frame_time(&self, frame_idx: usize) -> f32 {
        frame_idx as f32 * self.hop_duration
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Extract the normalized energy envelope of `band` from a precomputed
/// magnitude spectrogram
///
/// Bins whose center frequency falls in `[low_hz, high_hz]` are averaged
/// per frame. A band narrower than the bin resolution selects no bins and
/// yields an all-zero envelope of the full frame count - not an error.
pub fn extract(mag: &Array2<f32>, stft_data: &StftData, band: &FrequencyBand) -> Envelope {
    let n_frames = stft_data.n_frames();
    let hop_duration = stft_data.hop_duration();

    let bin_indices: Vec<usize> = stft_data
        .freqs
        .iter()
        .enumerate()
        .filter(|(_, &f)| f >= band.low_hz && f <= band.high_hz)
        .map(|(i, _)| i)
        .collect();

    if bin_indices.is_empty() {
        debug!(
            "band {} [{:.0},{:.0}] Hz selects no bins, returning zero envelope",
            band.drum_class.name(),
            band.low_hz,
            band.high_hz
        );
        return Envelope {
            values: vec![0.0; n_frames],
            hop_duration,
        };
    }

    let mut values = vec![0.0f32; n_frames];
    for (frame, value) in values.iter_mut().enumerate() {
        let mut sum = 0.0;
        for &bin in &bin_indices {
            sum += mag[[bin, frame]];
        }
        *value = sum / bin_indices.len() as f32;
    }

    let max = values.iter().cloned().fold(0.0f32, f32::max);
    if max > 0.0 {
        for value in &mut values {
            *value /= max;
        }
    }

    Envelope {
        values,
        hop_duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::{magnitude_spectrogram, stft};

    fn band(low: f32, high: f32) -> FrequencyBand {
        FrequencyBand {
            low_hz: low,
            high_hz: high,
            drum_class: DrumClass::Kick,
        }
    }

    #[test]
    fn test_zero_input_gives_zero_envelope() {
        let y = vec![0.0f32; 44100];
        let data = stft(&y, 2048, 512, "hann", 44100).unwrap();
        let mag = magnitude_spectrogram(&data);
        let env = extract(&mag, &data, &band(20.0, 150.0));

        assert_eq!(env.len(), data.n_frames());
        assert!(env.values.iter().all(|&v| v == 0.0));
        assert!(env.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_empty_band_gives_zero_envelope() {
        let y: Vec<f32> = (0..44100)
            .map(|i| (2.0 * std::f32::consts::PI * 100.0 * i as f32 / 44100.0).sin())
            .collect();
        let data = stft(&y, 2048, 512, "hann", 44100).unwrap();
        let mag = magnitude_spectrogram(&data);

        // Narrower than one bin (bin resolution is ~21.5 Hz at 2048/44100)
        let env = extract(&mag, &data, &band(1000.0, 1001.0));
        assert_eq!(env.len(), data.n_frames());
        assert!(env.values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_envelope_normalized_to_unit_max() {
        let y: Vec<f32> = (0..44100)
            .map(|i| (2.0 * std::f32::consts::PI * 80.0 * i as f32 / 44100.0).sin() * 0.3)
            .collect();
        let data = stft(&y, 2048, 512, "hann", 44100).unwrap();
        let mag = magnitude_spectrogram(&data);
        let env = extract(&mag, &data, &band(20.0, 150.0));

        let max = env.values.iter().cloned().fold(0.0f32, f32::max);
        assert!((max - 1.0).abs() < 1e-6);
        assert!(env.values.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_in_band_tone_reaches_unit_max() {
        let y: Vec<f32> = (0..44100)
            .map(|i| (2.0 * std::f32::consts::PI * 8000.0 * i as f32 / 44100.0).sin())
            .collect();
        let data = stft(&y, 2048, 512, "hann", 44100).unwrap();
        let mag = magnitude_spectrogram(&data);

        let hihat = extract(
            &mag,
            &data,
            &FrequencyBand {
                low_hz: 5000.0,
                high_hz: 20000.0,
                drum_class: DrumClass::HiHat,
            },
        );
        let max_hihat = hihat.values.iter().cloned().fold(0.0f32, f32::max);
        assert!((max_hihat - 1.0).abs() < 1e-6);
    }
}
