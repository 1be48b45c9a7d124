//! # Score Types
//!
//! Structured representation of a parsed note sheet.
//!
//! ## Type Hierarchy
//! ```text
//! Page (1-based number)
//!   └── Vec<Measure> (1-based number, fragments when a bar crosses pages)
//!         └── Vec<Note>
//!               ├── kind: NoteKind (Single | Chord | Rest)
//!               ├── text: original notation, e.g. "C#4/" or "[C4 E4 G4]p"
//!               └── beats: duration in quarter-note beats (always > 0)
//! ```
//!
//! ## Octaves
//! Octave numbers follow scientific pitch notation: `C4` is middle C (MIDI 60)
//! and octaves change at C, so `B3` sits directly below `C4`.

use serde::Serialize;
use std::fmt;

/// Time signature (e.g., 4/4, 3/4, 6/8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSignature {
    pub beats: u8,
    pub beat_type: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            beats: 4,
            beat_type: 4,
        }
    }
}

impl TimeSignature {
    /// Parse "N/D" where D is a power of two.
    pub fn parse(s: &str) -> Option<Self> {
        let (beats, beat_type) = s.trim().split_once('/')?;
        let beats: u8 = beats.trim().parse().ok()?;
        let beat_type: u8 = beat_type.trim().parse().ok()?;
        if beats == 0 || !beat_type.is_power_of_two() {
            return None;
        }
        Some(Self { beats, beat_type })
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats, self.beat_type)
    }
}

/// Note names A through G
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteName {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteName {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'C' => Some(NoteName::C),
            'D' => Some(NoteName::D),
            'E' => Some(NoteName::E),
            'F' => Some(NoteName::F),
            'G' => Some(NoteName::G),
            'A' => Some(NoteName::A),
            'B' => Some(NoteName::B),
            _ => None,
        }
    }

    /// Semitones above C within the same octave
    pub fn semitone(&self) -> i16 {
        match self {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            NoteName::C => 'C',
            NoteName::D => 'D',
            NoteName::E => 'E',
            NoteName::F => 'F',
            NoteName::G => 'G',
            NoteName::A => 'A',
            NoteName::B => 'B',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Accidental {
    #[default]
    Natural,
    Sharp,
    Flat,
}

impl Accidental {
    pub fn to_semitone_offset(&self) -> i16 {
        match self {
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::Flat => -1,
        }
    }
}

pub const DEFAULT_OCTAVE: u8 = 4;
pub const MAX_OCTAVE: u8 = 8;

/// A concrete pitch such as `C#4` or `Bb3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct Pitch {
    pub name: NoteName,
    pub accidental: Accidental,
    pub octave: u8,
}

impl Pitch {
    pub fn new(name: NoteName, accidental: Accidental, octave: u8) -> Self {
        Self {
            name,
            accidental,
            octave,
        }
    }

    /// MIDI note number (C4 = 60), clamped to the valid 0-127 range.
    pub fn midi(&self) -> u8 {
        let value = (self.octave as i16 + 1) * 12
            + self.name.semitone()
            + self.accidental.to_semitone_offset();
        value.clamp(0, 127) as u8
    }

    /// Build the natural/sharp spelling of a MIDI note number.
    pub fn from_midi(midi: u8) -> Self {
        let octave = (midi / 12).saturating_sub(1).min(MAX_OCTAVE);
        let (name, accidental) = match midi % 12 {
            0 => (NoteName::C, Accidental::Natural),
            1 => (NoteName::C, Accidental::Sharp),
            2 => (NoteName::D, Accidental::Natural),
            3 => (NoteName::D, Accidental::Sharp),
            4 => (NoteName::E, Accidental::Natural),
            5 => (NoteName::F, Accidental::Natural),
            6 => (NoteName::F, Accidental::Sharp),
            7 => (NoteName::G, Accidental::Natural),
            8 => (NoteName::G, Accidental::Sharp),
            9 => (NoteName::A, Accidental::Natural),
            10 => (NoteName::A, Accidental::Sharp),
            _ => (NoteName::B, Accidental::Natural),
        };
        Self::new(name, accidental, octave)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let accidental = match self.accidental {
            Accidental::Natural => "",
            Accidental::Sharp => "#",
            Accidental::Flat => "b",
        };
        write!(f, "{}{}{}", self.name.as_char(), accidental, self.octave)
    }
}

impl From<Pitch> for String {
    fn from(pitch: Pitch) -> Self {
        pitch.to_string()
    }
}

/// Rhythmic value written as a suffix: none, `/`, `//`, `///`, `p`, `o`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Duration {
    Whole,
    Half,
    #[default]
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
}

impl Duration {
    /// Length in quarter-note beats
    pub fn beats(&self) -> f64 {
        match self {
            Duration::Whole => 4.0,
            Duration::Half => 2.0,
            Duration::Quarter => 1.0,
            Duration::Eighth => 0.5,
            Duration::Sixteenth => 0.25,
            Duration::ThirtySecond => 0.125,
        }
    }

    pub fn dotted_beats(&self, dotted: bool) -> f64 {
        if dotted {
            self.beats() * 1.5
        } else {
            self.beats()
        }
    }
}

/// What a note sounds like.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "pitches", rename_all = "lowercase")]
pub enum NoteKind {
    Single(Pitch),
    Chord(Vec<Pitch>),
    Rest,
}

/// One note, chord or rest together with its source text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub kind: NoteKind,
    pub text: String,
    pub beats: f64,
}

impl Note {
    pub fn is_rest(&self) -> bool {
        matches!(self.kind, NoteKind::Rest)
    }

    /// All pitches sounded by this note; empty for a rest.
    pub fn pitches(&self) -> &[Pitch] {
        match &self.kind {
            NoteKind::Single(pitch) => std::slice::from_ref(pitch),
            NoteKind::Chord(pitches) => pitches,
            NoteKind::Rest => &[],
        }
    }

    /// Characters the note occupies on a rendered line, excluding the separator.
    pub fn display_width(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    pub number: usize,
    pub notes: Vec<Note>,
}

impl Measure {
    pub fn total_beats(&self) -> f64 {
        self.notes.iter().map(|n| n.beats).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub number: usize,
    pub measures: Vec<Measure>,
}
