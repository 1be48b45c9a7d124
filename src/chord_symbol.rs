//! Chord symbol expansion
//!
//! Turns lead-sheet chord symbols (`C`, `Am`, `G7`, `Bbmaj7`, ...) written as
//! `{symbol}` into the pitches of a close voicing rooted in octave 3.

use crate::score::{Accidental, NoteName, Pitch};

/// Octave the chord root is voiced in (C3 = MIDI 48)
const CHORD_ROOT_OCTAVE: u8 = 3;

/// Expand a chord symbol into pitches, or `None` if the symbol is not understood.
///
/// # Supported Chord Types
/// - **Major**: `C`, `maj`, `M`
/// - **Minor**: `m`, `min`, `-`
/// - **Dominant 7th**: `7`
/// - **Major 7th**: `maj7`, `M7`
/// - **Minor 7th**: `m7`, `min7`, `-7`
/// - **Diminished**: `dim`, `°`
/// - **Augmented**: `aug`, `+`
/// - **Suspended**: `sus2`, `sus4`
/// - **9th chords**: `9`, `maj9`/`M9`, `m9`/`min9`
///
/// # Examples
/// ```
/// use sheetplay::chord_symbol::expand_chord_symbol;
///
/// let midi = |s: &str| -> Vec<u8> {
///     expand_chord_symbol(s).unwrap().iter().map(|p| p.midi()).collect()
/// };
/// assert_eq!(midi("C"), vec![48, 52, 55]);
/// assert_eq!(midi("Dm"), vec![50, 53, 57]);
/// assert_eq!(midi("G7"), vec![55, 59, 62, 65]);
/// assert!(expand_chord_symbol("H7").is_none());
/// ```
pub fn expand_chord_symbol(symbol: &str) -> Option<Vec<Pitch>> {
    let mut chars = symbol.trim().chars();
    let name = chars.next().and_then(NoteName::from_char)?;
    // Chord roots are always written upper-case; "b" would otherwise be ambiguous
    if !symbol.trim().starts_with(name.as_char()) {
        return None;
    }

    let rest = chars.as_str();
    let (accidental, quality) = match rest.chars().next() {
        Some('#') => (Accidental::Sharp, &rest[1..]),
        Some('b') => (Accidental::Flat, &rest[1..]),
        _ => (Accidental::Natural, rest),
    };

    let intervals: &[u8] = match quality {
        "" | "maj" | "M" => &[0, 4, 7],
        "m" | "min" | "-" => &[0, 3, 7],
        "7" => &[0, 4, 7, 10],
        "maj7" | "M7" => &[0, 4, 7, 11],
        "m7" | "min7" | "-7" => &[0, 3, 7, 10],
        "dim" | "°" => &[0, 3, 6],
        "aug" | "+" => &[0, 4, 8],
        "sus4" => &[0, 5, 7],
        "sus2" => &[0, 2, 7],
        "9" => &[0, 4, 7, 10, 14],
        "maj9" | "M9" => &[0, 4, 7, 11, 14],
        "m9" | "min9" => &[0, 3, 7, 10, 14],
        _ => return None,
    };

    let root = Pitch::new(name, accidental, CHORD_ROOT_OCTAVE).midi();
    Some(
        intervals
            .iter()
            .map(|interval| Pitch::from_midi(root + interval))
            .collect(),
    )
}
