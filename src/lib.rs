//! Adaptive drum onset-detection and quantization engine
//!
//! Turns a decoded percussive recording into a quantized, class-labeled
//! sequence of drum notes ready for an external notation or MIDI
//! serializer. The pipeline runs percussive separation, per-band energy
//! extraction, adaptive-threshold peak picking, tempo estimation,
//! cross-band merging, and beat-grid quantization.
//!
//! The engine is stateless and pure per invocation: each call processes
//! one waveform end-to-end with no persisted state, no file access, and no
//! network access. Decoding media containers, isolating drums from a full
//! mix, and serializing the resulting score are the caller's concern.

pub mod analysis;
pub mod config;
pub mod envelope;
pub mod error;
pub mod merge;
pub mod onset;
pub mod quantize;
pub mod score;
pub mod separation;
pub mod spectral;
pub mod tempo;

pub use analysis::{Difficulty, DrumClass, QualityReport, TempoEstimate, Transcription};
pub use config::Config;
pub use error::{EngineError, Result};
pub use merge::OnsetEvent;
pub use quantize::{Notehead, QuantizedNote};
pub use score::{Score, TimeSignature};

use envelope::FrequencyBand;
use log::{info, warn};
use onset::{Detection, ThresholdLadder};
use rayon::prelude::*;

/// Decoded mono sample buffer plus sample rate
///
/// Immutable once constructed; construction rejects fundamentally invalid
/// input (empty or non-finite buffers). Silence and any other finite,
/// well-formed waveform are accepted.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if samples.is_empty() || sample_rate == 0 {
            return Err(EngineError::EmptyInput);
        }
        if let Some(idx) = samples.iter().position(|s| !s.is_finite()) {
            return Err(EngineError::NonFiniteInput(idx));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_sec(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Main processing pipeline for drum transcription
pub struct TranscriptionEngine {
    config: Config,
}

impl TranscriptionEngine {
    /// Create a new engine with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        config::validate_config(&config)?;
        Ok(Self { config })
    }

    /// Create an engine with default configuration
    pub fn with_defaults() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Transcribe one waveform end-to-end
    ///
    /// The three band pipelines read the same immutable percussive
    /// waveform and write disjoint outputs, so they run on separate rayon
    /// tasks joined before the merge step; tempo estimation runs
    /// concurrently with them. Internal fallbacks (zero-energy band,
    /// failed periodicity estimate, exhausted threshold ladder) never
    /// surface as errors; they are reported in the quality report.
    pub fn transcribe(&self, buffer: &SampleBuffer) -> Result<Transcription> {
        let config = &self.config;
        let sample_rate = buffer.sample_rate();

        info!(
            "transcribing {:.2}s of audio at {} Hz",
            buffer.duration_sec(),
            sample_rate
        );

        let percussive =
            separation::percussive_component(buffer.samples(), sample_rate, config)?;
        let separation_bypassed = percussive.is_none();
        if separation_bypassed {
            warn!("percussive separation bypassed, using raw waveform");
        }
        let wave: &[f32] = percussive.as_deref().unwrap_or(buffer.samples());

        // Fork-join: tempo estimation alongside the three band pipelines
        let (tempo_result, band_result) = rayon::join(
            || tempo::estimate(wave, sample_rate, config),
            || self.detect_bands(wave, sample_rate),
        );
        let tempo_estimate = tempo_result?;
        let detections = band_result?;

        if tempo_estimate.fallback_used {
            warn!("tempo estimate fell back to {} BPM", tempo_estimate.bpm);
        } else {
            info!("estimated tempo: {} BPM", tempo_estimate.bpm);
        }

        let band_times: Vec<Vec<f32>> = detections
            .iter()
            .map(|(_, detection, hop_duration)| detection.times(*hop_duration))
            .collect();
        let merged = merge::merge(
            &band_times[0],
            &band_times[1],
            &band_times[2],
            config.merge.dedup_window_sec,
        );
        info!("merged {} onsets across bands", merged.len());

        let notes = quantize::quantize(&merged, tempo_estimate, config);
        let score = score::assemble(&notes, tempo_estimate);

        let quality = QualityReport {
            tempo_fallback: tempo_estimate.fallback_used,
            ladder_exhausted: detections
                .iter()
                .filter(|(_, detection, _)| detection.ladder_exhausted)
                .map(|(class, _, _)| *class)
                .collect(),
            separation_bypassed,
            onset_counts: detections
                .iter()
                .map(|(class, detection, _)| (*class, detection.frames.len()))
                .collect(),
        };

        let duration_seconds = buffer.duration_sec();
        let onset_density = if duration_seconds > 0.0 {
            merged.len() as f32 / duration_seconds
        } else {
            0.0
        };

        Ok(Transcription {
            score,
            tempo: tempo_estimate,
            quality,
            duration_seconds,
            difficulty: Difficulty::from_onset_density(onset_density),
        })
    }

    /// Run the three per-band envelope + peak-detection pipelines
    ///
    /// One STFT is shared by all bands so their frame indices align.
    /// Returns `(class, detection, hop_duration)` in fixed band order
    /// (kick, snare, hi-hat).
    fn detect_bands(
        &self,
        wave: &[f32],
        sample_rate: u32,
    ) -> Result<Vec<(DrumClass, Detection, f32)>> {
        let config = &self.config;
        let stft_data = spectral::stft(
            wave,
            config.stft.n_fft,
            config.stft.hop_length,
            &config.stft.window,
            sample_rate,
        )?;
        let mag = spectral::magnitude_spectrogram(&stft_data);

        let detections = DrumClass::all()
            .par_iter()
            .map(|&drum_class| {
                let band = FrequencyBand::for_class(drum_class, config);
                let env = envelope::extract(&mag, &stft_data, &band);
                let ladder = ThresholdLadder::new(
                    config.detection.threshold_ladder.clone(),
                    self.min_onset_count(drum_class),
                );
                let detection = onset::detect(&env, &ladder, config.detection.min_separation_sec);
                (drum_class, detection, env.hop_duration)
            })
            .collect();

        Ok(detections)
    }

    fn min_onset_count(&self, drum_class: DrumClass) -> usize {
        match drum_class {
            DrumClass::HiHat => self.config.detection.hihat_min_onset_count,
            DrumClass::Kick | DrumClass::Snare => self.config.detection.min_onset_count,
        }
    }
}
