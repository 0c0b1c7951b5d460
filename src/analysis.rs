//! Result types and quality reporting

use serde::{Deserialize, Serialize};

use crate::score::Score;

/// Drum instrument classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrumClass {
    Kick,
    Snare,
    HiHat,
}

impl DrumClass {
    /// Standard percussion-key identifier for this class
    ///
    /// Matches the General MIDI drum map (kick = 36, snare = 38, closed
    /// hi-hat = 42). Carried purely as an identifier; the engine assigns
    /// no pitch semantics.
    pub fn percussion_key(&self) -> u8 {
        match self {
            DrumClass::Kick => 36,  // C2
            DrumClass::Snare => 38, // D2
            DrumClass::HiHat => 42, // F#2 (closed hi-hat)
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            DrumClass::Kick => "kick",
            DrumClass::Snare => "snare",
            DrumClass::HiHat => "hi-hat",
        }
    }

    /// All classes in band order (kick, snare, hi-hat)
    pub fn all() -> [DrumClass; 3] {
        [DrumClass::Kick, DrumClass::Snare, DrumClass::HiHat]
    }
}

/// Resolved tempo with provenance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoEstimate {
    /// Integer BPM, always within the configured plausible range
    pub bpm: u32,
    /// True when the raw estimate was out of range or periodicity
    /// analysis failed and the fallback BPM was substituted
    pub fallback_used: bool,
}

/// Difficulty grade derived from onset density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Difficulty {
    /// Grade a performance by merged onsets per second
    pub fn from_onset_density(onsets_per_sec: f32) -> Self {
        if onsets_per_sec > 8.0 {
            Difficulty::Expert
        } else if onsets_per_sec > 5.0 {
            Difficulty::Advanced
        } else if onsets_per_sec > 3.0 {
            Difficulty::Intermediate
        } else {
            Difficulty::Beginner
        }
    }
}

/// Per-run quality report distinguishing degraded results from confident
/// ones
///
/// None of these flags is an error: the pipeline always produces a score.
/// Callers that care about transcription confidence can inspect them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    /// Tempo fallback was substituted for the raw estimate
    pub tempo_fallback: bool,
    /// Classes whose threshold ladder was exhausted without reaching the
    /// minimum onset-count target
    pub ladder_exhausted: Vec<DrumClass>,
    /// Percussive separation was skipped and the raw waveform used
    pub separation_bypassed: bool,
    /// Onset count per class after peak detection, before dedup
    pub onset_counts: Vec<(DrumClass, usize)>,
}

impl QualityReport {
    /// True when every stage completed without a fallback
    pub fn is_clean(&self) -> bool {
        !self.tempo_fallback && self.ladder_exhausted.is_empty() && !self.separation_bypassed
    }
}

/// Complete transcription result handed to the external serializer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    pub score: Score,
    pub tempo: TempoEstimate,
    pub quality: QualityReport,
    pub duration_seconds: f32,
    pub difficulty: Difficulty,
}

impl Transcription {
    /// Duration formatted as m:ss for display metadata
    pub fn duration_display(&self) -> String {
        let total = self.duration_seconds.max(0.0) as u32;
        format!("{}:{:02}", total / 60, total % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percussion_key_mapping() {
        assert_eq!(DrumClass::Kick.percussion_key(), 36);
        assert_eq!(DrumClass::Snare.percussion_key(), 38);
        assert_eq!(DrumClass::HiHat.percussion_key(), 42);
    }

    #[test]
    fn test_difficulty_boundaries() {
        assert_eq!(
            Difficulty::from_onset_density(0.5),
            Difficulty::Beginner
        );
        assert_eq!(
            Difficulty::from_onset_density(4.0),
            Difficulty::Intermediate
        );
        assert_eq!(Difficulty::from_onset_density(6.0), Difficulty::Advanced);
        assert_eq!(Difficulty::from_onset_density(9.0), Difficulty::Expert);
    }
}
