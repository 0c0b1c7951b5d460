//! Cross-band onset merging and deduplication

use crate::analysis::DrumClass;
use serde::{Deserialize, Serialize};

/// A detected drum hit: onset time plus class identifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnsetEvent {
    pub time_sec: f32,
    pub drum_class: DrumClass,
}

/// Merge per-band onset times into one time-ordered, deduplicated stream
///
/// Events are tagged with their class, concatenated, and sorted ascending
/// by time. The scan then drops any event within `dedup_window_sec` of the
/// last retained event, irrespective of class. A true simultaneous
/// kick+snare hit therefore collapses to a single retained event; this is
/// the documented behavior of the detector design, kept rather than
/// silently changed to same-class-only suppression.
pub fn merge(
    kick_times: &[f32],
    snare_times: &[f32],
    hihat_times: &[f32],
    dedup_window_sec: f32,
) -> Vec<OnsetEvent> {
    let mut events: Vec<OnsetEvent> = Vec::with_capacity(
        kick_times.len() + snare_times.len() + hihat_times.len(),
    );

    for (times, drum_class) in [
        (kick_times, DrumClass::Kick),
        (snare_times, DrumClass::Snare),
        (hihat_times, DrumClass::HiHat),
    ] {
        events.extend(times.iter().map(|&time_sec| OnsetEvent {
            time_sec,
            drum_class,
        }));
    }

    // Stable sort keeps class order deterministic for equal times
    events.sort_by(|a, b| {
        a.time_sec
            .partial_cmp(&b.time_sec)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut merged: Vec<OnsetEvent> = Vec::with_capacity(events.len());
    for event in events {
        match merged.last() {
            Some(last) if event.time_sec - last.time_sec < dedup_window_sec => {}
            _ => merged.push(event),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_orders_across_bands() {
        let merged = merge(&[0.0, 1.0], &[0.5], &[0.25, 0.75], 0.05);
        let times: Vec<f32> = merged.iter().map(|e| e.time_sec).collect();
        assert_eq!(times, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(merged[0].drum_class, DrumClass::Kick);
        assert_eq!(merged[2].drum_class, DrumClass::Snare);
    }

    #[test]
    fn test_dedup_within_window() {
        // Snare 30ms after the kick is suppressed
        let merged = merge(&[1.0], &[1.03], &[], 0.05);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].drum_class, DrumClass::Kick);
    }

    #[test]
    fn test_simultaneous_cross_class_collapses() {
        // Kick and snare at the same instant: one retained event
        let merged = merge(&[2.0], &[2.0], &[], 0.05);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_spacing_measured_from_retained_event() {
        // 0.00, 0.04, 0.08: the middle event is dropped, and 0.08 is kept
        // because it is 80ms after the last *retained* event
        let merged = merge(&[0.0, 0.04, 0.08], &[], &[], 0.05);
        let times: Vec<f32> = merged.iter().map(|e| e.time_sec).collect();
        assert_eq!(times, vec![0.0, 0.08]);
    }

    #[test]
    fn test_output_strictly_increasing() {
        let merged = merge(
            &[0.0, 0.1, 0.2, 0.21],
            &[0.05, 0.15],
            &[0.02, 0.12, 0.22],
            0.05,
        );
        for pair in merged.windows(2) {
            assert!(pair[1].time_sec - pair[0].time_sec >= 0.05);
        }
    }

    #[test]
    fn test_empty_inputs() {
        assert!(merge(&[], &[], &[], 0.05).is_empty());
    }
}
