//! Score assembly
//!
//! Arranges quantized notes into a single percussion voice under a fixed
//! 4/4 meter. Measure boundary computation and file emission belong to the
//! external notation serializer, which consumes the ordered note list plus
//! tempo and meter.

use crate::analysis::TempoEstimate;
use crate::quantize::QuantizedNote;
use serde::{Deserialize, Serialize};

/// Fixed meter carried alongside the note list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl TimeSignature {
    pub const COMMON_TIME: TimeSignature = TimeSignature {
        numerator: 4,
        denominator: 4,
    };
}

/// One percussion voice of grid-aligned notes under a single meter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Score {
    pub time_signature: TimeSignature,
    pub tempo_bpm: u32,
    pub notes: Vec<QuantizedNote>,
}

/// Assemble quantized notes into a score
///
/// Input is already ordered by the merge step, but the assembler does not
/// assume this and stable-sorts by beat position.
pub fn assemble(notes: &[QuantizedNote], tempo: TempoEstimate) -> Score {
    let mut notes = notes.to_vec();
    notes.sort_by(|a, b| {
        a.beat_position
            .partial_cmp(&b.beat_position)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Score {
        time_signature: TimeSignature::COMMON_TIME,
        tempo_bpm: tempo.bpm,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DrumClass;
    use crate::quantize::Notehead;

    fn note(beat_position: f64, drum_class: DrumClass) -> QuantizedNote {
        QuantizedNote {
            beat_position,
            duration_ql: 0.25,
            drum_class,
            notehead: Notehead::for_class(drum_class),
        }
    }

    #[test]
    fn test_assemble_sorts_defensively() {
        let tempo = TempoEstimate {
            bpm: 120,
            fallback_used: false,
        };
        let notes = vec![
            note(2.0, DrumClass::Snare),
            note(0.0, DrumClass::Kick),
            note(1.0, DrumClass::HiHat),
        ];

        let score = assemble(&notes, tempo);
        let positions: Vec<f64> = score.notes.iter().map(|n| n.beat_position).collect();
        assert_eq!(positions, vec![0.0, 1.0, 2.0]);
        assert_eq!(score.time_signature, TimeSignature::COMMON_TIME);
        assert_eq!(score.tempo_bpm, 120);
    }

    #[test]
    fn test_stable_sort_keeps_equal_position_order() {
        let tempo = TempoEstimate {
            bpm: 90,
            fallback_used: false,
        };
        let notes = vec![note(1.0, DrumClass::Kick), note(1.0, DrumClass::Snare)];

        let score = assemble(&notes, tempo);
        assert_eq!(score.notes[0].drum_class, DrumClass::Kick);
        assert_eq!(score.notes[1].drum_class, DrumClass::Snare);
    }

    #[test]
    fn test_empty_score() {
        let tempo = TempoEstimate {
            bpm: 120,
            fallback_used: true,
        };
        let score = assemble(&[], tempo);
        assert!(score.notes.is_empty());
    }
}
