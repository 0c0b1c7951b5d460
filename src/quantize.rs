//! Beat-grid quantization
//!
//! Snaps onset times to the nearest sixteenth-note subdivision and assigns
//! every hit a fixed notated duration. Drum hits are modeled as discrete
//! grid events, not sustained notes.

use crate::analysis::{DrumClass, TempoEstimate};
use crate::config::Config;
use crate::merge::OnsetEvent;
use serde::{Deserialize, Serialize};

/// Notehead marking for the external notation serializer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notehead {
    Normal,
    Cross,
}

impl Notehead {
    /// Hi-hats are marked with a cross notehead per percussion notation
    /// convention; kick and snare use the default
    pub fn for_class(drum_class: DrumClass) -> Self {
        match drum_class {
            DrumClass::HiHat => Notehead::Cross,
            DrumClass::Kick | DrumClass::Snare => Notehead::Normal,
        }
    }
}

/// A note snapped to the beat grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantizedNote {
    /// Position in quarter-length units, always a multiple of the grid
    /// resolution (0.25 for a sixteenth grid)
    pub beat_position: f64,
    /// Fixed notated duration in quarter-length units
    pub duration_ql: f64,
    pub drum_class: DrumClass,
    pub notehead: Notehead,
}

/// Snap one onset time to the beat grid
///
/// `ql = time / quarter_note_duration`, rounded to the nearest
/// `1/divisions_per_quarter`. Deterministic given (tempo, onset time) and
/// idempotent on already-aligned values.
pub fn quantize_time(time_sec: f32, tempo: TempoEstimate, config: &Config) -> f64 {
    let quarter_note_duration = 60.0 / tempo.bpm as f64;
    let ql = time_sec as f64 / quarter_note_duration;
    let divisions = config.quantize.divisions_per_quarter as f64;
    (ql * divisions).round() / divisions
}

/// Quantize merged onset events into grid-aligned notes
pub fn quantize(
    events: &[OnsetEvent],
    tempo: TempoEstimate,
    config: &Config,
) -> Vec<QuantizedNote> {
    events
        .iter()
        .map(|event| QuantizedNote {
            beat_position: quantize_time(event.time_sec, tempo, config),
            duration_ql: config.quantize.note_duration_ql,
            drum_class: event.drum_class,
            notehead: Notehead::for_class(event.drum_class),
        })
        .collect()
}
