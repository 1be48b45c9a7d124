//! Real-time length of notes and whole sheets.
//!
//! A beat is a quarter note and tempo is quarter-note beats per minute, so one
//! beat lasts `60 / tempo` seconds.

use crate::score::Measure;

/// Slowest tempo ever used in timing arithmetic
pub const MIN_TEMPO: u32 = 1;

/// Clamp a tempo so duration math never divides by zero.
pub fn sanitize_tempo(tempo: u32) -> u32 {
    if tempo < MIN_TEMPO {
        tracing::warn!("tempo {} BPM is not positive, using {} BPM", tempo, MIN_TEMPO);
        MIN_TEMPO
    } else {
        tempo
    }
}

pub fn seconds_per_beat(tempo: u32) -> f64 {
    60.0 / sanitize_tempo(tempo) as f64
}

/// Total playback time of `measures` in seconds, rests included.
///
/// # Example
/// ```
/// use sheetplay::{estimate_duration, parse_measures};
///
/// let parsed = parse_measures("C4 D4p | -o").unwrap();
/// // 7 beats at 120 BPM
/// assert_eq!(estimate_duration(&parsed.measures, 120), 3.5);
/// ```
pub fn estimate_duration(measures: &[Measure], tempo: u32) -> f64 {
    let beats: f64 = measures.iter().map(Measure::total_beats).sum();
    beats * seconds_per_beat(tempo)
}

/// How long a note of `beats` lasts at `tempo`, in whole milliseconds (at least 1).
pub fn note_duration_ms(beats: f64, tempo: u32) -> u64 {
    let ms = (seconds_per_beat(tempo) * 1000.0 * beats).round();
    if ms.is_finite() && ms >= 1.0 {
        ms as u64
    } else {
        1
    }
}
