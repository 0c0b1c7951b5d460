//! Configuration system for the transcription engine

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub stft: StftConfig,
    pub separation: SeparationConfig,
    pub bands: BandsConfig,
    pub detection: DetectionConfig,
    pub tempo: TempoConfig,
    pub merge: MergeConfig,
    pub quantize: QuantizeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            stft: StftConfig::default(),
            separation: SeparationConfig::default(),
            bands: BandsConfig::default(),
            detection: DetectionConfig::default(),
            tempo: TempoConfig::default(),
            merge: MergeConfig::default(),
            quantize: QuantizeConfig::default(),
        }
    }
}

/// STFT configuration
///
/// A single window/hop pair is used for every analysis stage so the frame
/// indices of the three band envelopes stay aligned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StftConfig {
    pub n_fft: usize,
    pub hop_length: usize,
    pub window: String,
}

impl Default for StftConfig {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
            window: "hann".to_string(),
        }
    }
}

/// Harmonic/percussive separation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationConfig {
    pub enabled: bool,
    /// Median filter length across time frames (harmonic kernel)
    pub harmonic_kernel: usize,
    /// Median filter length across frequency bins (percussive kernel)
    pub percussive_kernel: usize,
    /// Exponent for Wiener-style soft masking
    pub mask_power: f32,
}

impl Default for SeparationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            harmonic_kernel: 31,
            percussive_kernel: 17,
            mask_power: 2.0,
        }
    }
}

/// Frequency band boundaries per drum class, in Hz
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BandsConfig {
    pub kick_hz: [f32; 2],
    pub snare_hz: [f32; 2],
    pub hihat_hz: [f32; 2],
}

impl Default for BandsConfig {
    fn default() -> Self {
        Self {
            kick_hz: [20.0, 150.0],
            snare_hz: [200.0, 2500.0],
            hihat_hz: [5000.0, 20000.0],
        }
    }
}

/// Adaptive peak detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Sensitivity thresholds walked in descending order
    pub threshold_ladder: Vec<f32>,
    /// Minimum onset count that stops the ladder walk
    pub min_onset_count: usize,
    /// Hi-hats are denser than kick/snare and get a higher target
    pub hihat_min_onset_count: usize,
    /// Minimum spacing between retained peaks, in seconds
    pub min_separation_sec: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold_ladder: vec![0.15, 0.10, 0.05, 0.02],
            min_onset_count: 20,
            hihat_min_onset_count: 50,
            min_separation_sec: 0.03,
        }
    }
}

/// Tempo estimation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoConfig {
    /// Plausible BPM range; raw estimates outside it are discarded
    pub range_bpm: [f32; 2],
    /// BPM substituted when the raw estimate is out of range or fails
    pub fallback_bpm: u32,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            range_bpm: [60.0, 180.0],
            fallback_bpm: 120,
        }
    }
}

/// Cross-band merge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Events within this window of the last retained event are dropped,
    /// irrespective of drum class
    pub dedup_window_sec: f32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            dedup_window_sec: 0.05,
        }
    }
}

/// Beat-grid quantization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizeConfig {
    /// Grid subdivisions per quarter note (4 = sixteenth-note grid)
    pub divisions_per_quarter: u32,
    /// Notated duration assigned to every hit, in quarter-length units
    pub note_duration_ql: f64,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            divisions_per_quarter: 4,
            note_duration_ql: 0.25,
        }
    }
}

/// Validate configuration parameters
pub fn validate_config(config: &Config) -> anyhow::Result<()> {
    if config.stft.n_fft == 0 || !config.stft.n_fft.is_power_of_two() {
        anyhow::bail!("stft.n_fft must be a non-zero power of two");
    }
    if config.stft.hop_length == 0 || config.stft.hop_length > config.stft.n_fft {
        anyhow::bail!("stft.hop_length must be in 1..=n_fft");
    }
    if config.detection.threshold_ladder.is_empty() {
        anyhow::bail!("detection.threshold_ladder must not be empty");
    }
    if config
        .detection
        .threshold_ladder
        .windows(2)
        .any(|w| w[0] <= w[1])
    {
        anyhow::bail!("detection.threshold_ladder must be strictly descending");
    }
    if config.tempo.range_bpm[0] >= config.tempo.range_bpm[1] {
        anyhow::bail!("tempo.range_bpm min must be < max");
    }
    for band in [
        config.bands.kick_hz,
        config.bands.snare_hz,
        config.bands.hihat_hz,
    ] {
        if band[0] >= band[1] {
            anyhow::bail!("band low_hz must be < high_hz");
        }
    }
    if config.quantize.divisions_per_quarter == 0 {
        anyhow::bail!("quantize.divisions_per_quarter must be >= 1");
    }
    Ok(())
}

/// Load configuration from JSON file
pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Save configuration to JSON file
pub fn save_config<P: AsRef<std::path::Path>>(config: &Config, path: P) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
