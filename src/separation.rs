//! Harmonic/percussive source separation (median-filter HPSS)
//!
//! Implements the median-filtering approach of Fitzgerald (2010): harmonic
//! content forms horizontal ridges in the spectrogram, percussive content
//! vertical ones. Median filtering along each axis plus Wiener-style soft
//! masking extracts the percussive component.

use crate::config::Config;
use crate::error::Result;
use crate::spectral::{inverse_stft, magnitude_spectrogram, stft};
use log::debug;
use ndarray::Array2;

/// Extract the percussive component of a waveform
///
/// Returns the percussive waveform, truncated or padded to the input
/// length. When separation is disabled or the input is shorter than one
/// FFT window, returns `None` and the caller falls back to the raw
/// waveform (a degraded but valid result).
pub fn percussive_component(
    y: &[f32],
    sample_rate: u32,
    config: &Config,
) -> Result<Option<Vec<f32>>> {
    if !config.separation.enabled || y.len() < config.stft.n_fft {
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

    let harmonic = median_filter_time(&mag, config.separation.harmonic_kernel);
    let percussive = median_filter_freq(&mag, config.separation.percussive_kernel);

    // Wiener-style soft mask favoring the percussive estimate
    let power = config.separation.mask_power;
    let mut masked = stft_data.s.clone();
    for ((bin, frame), value) in masked.indexed_iter_mut() {
        let h = harmonic[[bin, frame]].powf(power);
        let p = percussive[[bin, frame]].powf(power);
        let denom = h + p;
        let mask = if denom > 0.0 { p / denom } else { 0.0 };
        *value *= mask;
    }

    let mut out = inverse_stft(
        &masked,
        config.stft.n_fft,
        config.stft.hop_length,
        &config.stft.window,
    );
    out.resize(y.len(), 0.0);

    debug!("hpss: separated {} samples", out.len());
    Ok(Some(out))
}

/// Median filter each row (bin) across time frames
fn median_filter_time(mag: &Array2<f32>, kernel: usize) -> Array2<f32> {
    let (n_bins, n_frames) = (mag.shape()[0], mag.shape()[1]);
    let half = kernel / 2;
    let mut out = Array2::<f32>::zeros((n_bins, n_frames));

    let mut window = Vec::with_capacity(kernel);
    for bin in 0..n_bins {
        for frame in 0..n_frames {
            let start = frame.saturating_sub(half);
            let end = (frame + half + 1).min(n_frames);
            window.clear();
            for t in start..end {
                window.push(mag[[bin, t]]);
            }
            out[[bin, frame]] = median(&mut window);
        }
    }

    out
}

/// Median filter each column (frame) across frequency bins
fn median_filter_freq(mag: &Array2<f32>, kernel: usize) -> Array2<f32> {
    let (n_bins, n_frames) = (mag.shape()[0], mag.shape()[1]);
    let half = kernel / 2;
    let mut out = Array2::<f32>::zeros((n_bins, n_frames));

    let mut window = Vec::with_capacity(kernel);
    for frame in 0..n_frames {
        for bin in 0..n_bins {
            let start = bin.saturating_sub(half);
            let end = (bin + half + 1).min(n_bins);
            window.clear();
            for f in start..end {
                window.push(mag[[f, frame]]);
            }
            out[[bin, frame]] = median(&mut window);
        }
    }

    out
}

fn median(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) * 0.5
    } else {
        values[mid]
    }
}
