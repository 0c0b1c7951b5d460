//! Tempo estimation
//!
//! Estimates beats-per-minute by autocorrelating an onset-strength
//! envelope (spectral flux) of the percussive waveform over the lag range
//! of the plausible tempo window. Unconstrained estimators frequently
//! return half/double-tempo errors or fail outright on sparse material,
//! so raw estimates outside the window are replaced by the fallback BPM
//! rather than destabilizing the quantizer.

use crate::analysis::TempoEstimate;
use crate::config::Config;
use crate::error::Result;
use crate::spectral::{magnitude_spectrogram, stft};
use log::debug;
use ndarray::Array2;

/// Estimate a clamped integer BPM from a percussive waveform
///
/// Never fails on well-formed input: silence, too-short buffers, and
/// aperiodic material all resolve to the fallback BPM with
/// `fallback_used` set.
pub fn estimate(y: &[f32], sample_rate: u32, config: &Config) -> Result<TempoEstimate> {
    let raw = raw_estimate(y, sample_rate, config)?;
    Ok(resolve_bpm(raw, config))
}

/// Clamp and round a raw BPM estimate
///
/// `None` (failed periodicity analysis) and out-of-range values both map
/// to the fallback; in-range values map to their rounded integer
/// unchanged.
pub fn resolve_bpm(raw: Option<f32>, config: &Config) -> TempoEstimate {
    let [lo, hi] = config.tempo.range_bpm;
    match raw {
        Some(bpm) if bpm.is_finite() && bpm >= lo && bpm <= hi => TempoEstimate {
            bpm: bpm.round() as u32,
            fallback_used: false,
        },
        _ => TempoEstimate {
            bpm: config.tempo.fallback_bpm,
            fallback_used: true,
        },
    }
}

/// Periodicity analysis producing an unclamped BPM, or `None` on failure
fn raw_estimate(y: &[f32], sample_rate: u32, config: &Config) -> Result<Option<f32>> {
    if y.len() < config.stft.n_fft {
        return Ok(None);
    }

    let stft_data = stft(
        y,
        config.stft.n_fft,
        config.stft.hop_length,
        &config.stft.window,
        sample_rate,
    )?;
    let mag = magnitude_spectrogram(&stft_data);
    let flux = onset_strength(&mag);

    let frame_duration = stft_data.hop_duration();
    let [lo_bpm, hi_bpm] = config.tempo.range_bpm;

    // Lag range in frames for the plausible tempo window
    let min_lag = (60.0 / (hi_bpm * frame_duration)).floor() as usize;
    let max_lag = ((60.0 / (lo_bpm * frame_duration)).ceil() as usize).min(flux.len() / 2);
    if min_lag == 0 || min_lag >= max_lag {
        return Ok(None);
    }

    // Remove DC bias before correlating
    let mean = flux.iter().sum::<f32>() / flux.len() as f32;
    let centered: Vec<f32> = flux.iter().map(|&x| x - mean).collect();

    let energy: f32 = centered.iter().map(|&x| x * x).sum();
    if energy < 1e-10 {
        return Ok(None);
    }

    let n = centered.len();
    let mut best_lag = 0usize;
    let mut best_corr = 0.0f32;
    for lag in min_lag..=max_lag {
        let corr: f32 = centered[..n - lag]
            .iter()
            .zip(centered[lag..].iter())
            .map(|(&a, &b)| a * b)
            .sum::<f32>()
            / energy;
        if corr > best_corr {
            best_corr = corr;
            best_lag = lag;
        }
    }

    if best_lag == 0 || best_corr <= 0.0 {
        return Ok(None);
    }

    let bpm = 60.0 / (best_lag as f32 * frame_duration);
    debug!("raw tempo estimate: {:.2} BPM (lag {} frames)", bpm, best_lag);
    Ok(Some(bpm))
}

/// Onset-strength envelope: per-frame sum of positive magnitude
/// differences across all bins
fn onset_strength(mag: &Array2<f32>) -> Vec<f32> {
    let mut flux = vec![0.0; mag.shape()[1]];

    for t in 1..mag.shape()[1] {
        let mut frame_flux = 0.0;
        for f in 0..mag.shape()[0] {
            let diff = mag[[f, t]] - mag[[f, t - 1]];
            if diff > 0.0 {
                frame_flux += diff;
            }
        }
        flux[t] = frame_flux;
    }

    flux
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_maps_to_fallback() {
        let config = Config::default();
        for raw in [20.0, 59.9, 180.5, 400.0] {
            let estimate = resolve_bpm(Some(raw), &config);
            assert_eq!(estimate.bpm, 120);
            assert!(estimate.fallback_used);
        }
    }

    #[test]
    fn test_in_range_rounds_unchanged() {
        let config = Config::default();
        let estimate = resolve_bpm(Some(127.4), &config);
        assert_eq!(estimate.bpm, 127);
        assert!(!estimate.fallback_used);

        let estimate = resolve_bpm(Some(127.6), &config);
        assert_eq!(estimate.bpm, 128);
    }

    #[test]
    fn test_range_endpoints_accepted() {
        let config = Config::default();
        assert_eq!(resolve_bpm(Some(60.0), &config).bpm, 60);
        assert_eq!(resolve_bpm(Some(180.0), &config).bpm, 180);
    }

    #[test]
    fn test_failed_estimate_maps_to_fallback() {
        let config = Config::default();
        let estimate = resolve_bpm(None, &config);
        assert_eq!(estimate.bpm, 120);
        assert!(estimate.fallback_used);

        assert!(resolve_bpm(Some(f32::NAN), &config).fallback_used);
    }

    #[test]
    fn test_silence_falls_back() {
        let config = Config::default();
        let y = vec![0.0f32; 44100 * 2];
        let estimate = estimate(&y, 44100, &config).unwrap();
        assert_eq!(estimate.bpm, 120);
        assert!(estimate.fallback_used);
    }

    #[test]
    fn test_short_buffer_falls_back() {
        let config = Config::default();
        let y = vec![0.1f32; 100];
        let estimate = estimate(&y, 44100, &config).unwrap();
        assert_eq!(estimate.bpm, 120);
        assert!(estimate.fallback_used);
    }
}
