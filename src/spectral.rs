//! Spectral processing utilities (STFT, inverse STFT, magnitudes)

use crate::error::{EngineError, Result};
use ndarray::Array2;
use rustfft::{num_complex::Complex32, FftPlanner};

/// STFT data structure
///
/// `s` is laid out bins x frames; `freqs` holds the bin center frequencies
/// and `times` the frame start times in seconds.
#[derive(Debug, Clone)]
pub struct StftData {
    pub s: Array2<Complex32>,
    pub freqs: Vec<f32>,
    pub times: Vec<f32>,
    pub hop_length: usize,
    pub sample_rate: u32,
}

impl StftData {
    /// Number of analysis frames
    pub fn n_frames(&self) -> usize {
        self.s.shape()[1]
    }

    /// Duration of one hop in seconds
    pub fn hop_duration(&self) -> f32 {
        self.hop_length as f32 / self.sample_rate as f32
    }
}

/// Compute STFT of an audio signal
///
/// Signals shorter than one window are zero-padded to a single frame so
/// every finite input yields at least one column.
pub fn stft(
    y: &[f32],
    n_fft: usize,
    hop_length: usize,
    window: &str,
    sample_rate: u32,
) -> Result<StftData> {
    if n_fft == 0 || hop_length == 0 {
        return Err(EngineError::StftProcessingError(
            "n_fft and hop_length must be non-zero".to_string(),
        ));
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n_fft);

    let n_frames = if y.len() >= n_fft {
        (y.len() - n_fft) / hop_length + 1
    } else {
        1
    };
    let n_bins = n_fft / 2 + 1;
    let mut s = Array2::<Complex32>::zeros((n_bins, n_frames));

    let window_fn = generate_window(window, n_fft);

    let mut frame = vec![Complex32::new(0.0, 0.0); n_fft];
    for frame_idx in 0..n_frames {
        let start = frame_idx * hop_length;

        for (i, slot) in frame.iter_mut().enumerate() {
            let sample = y.get(start + i).copied().unwrap_or(0.0);
            *slot = Complex32::new(sample * window_fn[i], 0.0);
        }

        fft.process(&mut frame);

        for (i, &val) in frame[..n_bins].iter().enumerate() {
            s[[i, frame_idx]] = val;
        }
    }

    let freqs: Vec<f32> = (0..n_bins)
        .map(|i| i as f32 * sample_rate as f32 / n_fft as f32)
        .collect();

    let times: Vec<f32> = (0..n_frames)
        .map(|i| i as f32 * hop_length as f32 / sample_rate as f32)
        .collect();

    Ok(StftData {
        s,
        freqs,
        times,
        hop_length,
        sample_rate,
    })
}

/// Generate window function
fn generate_window(window_type: &str, size: usize) -> Vec<f32> {
    match window_type {
        "hann" => (0..size)
            .map(|i| {
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos())
            })
            .collect(),
        _ => vec![1.0; size], // Rectangular window as fallback
    }
}

/// Compute magnitude spectrogram
pub fn magnitude_spectrogram(stft_data: &StftData) -> Array2<f32> {
    stft_data.s.map(|c| c.norm())
}

/// Compute inverse STFT of a complex spectrogram via overlap-add
pub fn inverse_stft(
    s: &Array2<Complex32>,
    n_fft: usize,
    hop_length: usize,
    window: &str,
) -> Vec<f32> {
    let mut planner = FftPlanner::new();
    let ifft = planner.plan_fft_inverse(n_fft);

    let n_frames = s.shape()[1];
    if n_frames == 0 {
        return Vec::new();
    }
    let expected_length = (n_frames - 1) * hop_length + n_fft;

    let window_fn = generate_window(window, n_fft);
    let mut y = vec![0.0f32; expected_length];

    for frame_idx in 0..n_frames {
        // Positive frequencies from the spectrogram column
        let mut frame: Vec<Complex32> = s.column(frame_idx).iter().cloned().collect();

        // Mirror into negative frequencies (conjugate symmetric)
        for i in 1..(n_fft / 2) {
            frame.push(frame[n_fft / 2 - i].conj());
        }

        ifft.process(&mut frame);

        let start = frame_idx * hop_length;
        for i in 0..n_fft {
            if start + i < y.len() {
                let sample = frame[i].re / n_fft as f32;
                y[start + i] += sample * window_fn[i];
            }
        }
    }

    // Compensate for window overlap
    let window_sum = window_fn.iter().sum::<f32>();
    if window_sum > 0.0 {
        let norm_factor = hop_length as f32 / window_sum;
        for sample in &mut y {
            *sample *= norm_factor;
        }
    }

    y
}
