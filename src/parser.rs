//! # Parser Module
//!
//! Turns note-sheet text into measures of notes, chords and rests.
//!
//! ## Notation
//! ```text
//! ---                      optional YAML frontmatter
//! title: Ode to Joy
//! tempo: 120
//! ---
//! E4 E4 F4 G4 | G4 F4 E4 D4 | [C4 E4 G4]p -p | {G7}o
//! ```
//! - Pitch: letter `A`-`G` (any case), optional `#`/`b`, optional octave `0`-`8` (default 4)
//! - Rest: `-`
//! - Chord: `[C4 E4 G4]` or `[C4E4G4]`; chord symbol: `{Am7}`
//! - Rhythm suffix on any of the above: none = quarter, `/` eighth, `//` sixteenth,
//!   `///` thirty-second, `p` half, `o` whole, trailing `*` dots the value
//! - `|` ends a measure
//!
//! ## Error Recovery
//! Anything that is not valid notation is skipped and reported in
//! [`ParsedNotation::skipped`]. Only a sheet with no playable content at all is
//! an error ([`SheetError::NoSheetData`]).
//!
//! ## Example
//! ```rust
//! use sheetplay::parse_measures;
//!
//! let parsed = parse_measures("C4 D4 | E4 ?? F4").unwrap();
//! assert_eq!(parsed.measures.len(), 2);
//! assert_eq!(parsed.measures[1].notes.len(), 2);
//! assert_eq!(parsed.skipped[0].text, "??");
//! ```

use crate::chord_symbol::expand_chord_symbol;
use crate::error::SheetError;
use crate::lexer::{Lexer, LocatedToken, Token};
use crate::score::{
    Accidental, Duration, Measure, Note, NoteKind, NoteName, Pitch, TimeSignature, DEFAULT_OCTAVE,
    MAX_OCTAVE,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const FRONTMATTER_FENCE: &str = "---";

/// Sheet metadata from the optional frontmatter block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub tempo: Option<u32>,
    pub time_signature: TimeSignature,
    pub tags: BTreeSet<String>,
}

/// Raw metadata for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawMetadata {
    title: Option<String>,
    artist: Option<String>,
    tempo: Option<u32>,
    time_signature: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

/// A lexeme the parser could not make sense of
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedToken {
    pub text: String,
    pub line: usize,
    pub column: usize,
}

/// Result of parsing note-sheet text
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNotation {
    pub metadata: Metadata,
    pub measures: Vec<Measure>,
    pub skipped: Vec<SkippedToken>,
}

/// Parse note-sheet text, including any frontmatter.
///
/// Deterministic: the same text always yields the same measures.
pub fn parse_measures(source: &str) -> Result<ParsedNotation, SheetError> {
    let (frontmatter, body, body_line) = split_frontmatter(source)?;
    let metadata = match frontmatter {
        Some(yaml) => parse_metadata(yaml)?,
        None => Metadata::default(),
    };

    let tokens = Lexer::starting_at_line(body, body_line).tokenize();
    let mut parser = NotationParser::new();
    for token in tokens {
        parser.accept(token);
    }
    let (measures, skipped) = parser.finish();

    if measures.is_empty() {
        return Err(SheetError::NoSheetData);
    }

    Ok(ParsedNotation {
        metadata,
        measures,
        skipped,
    })
}

/// Split off a leading `---` fenced block. Returns (yaml, body, line the body starts on).
fn split_frontmatter(source: &str) -> Result<(Option<&str>, &str, usize), SheetError> {
    let trimmed = source.trim_start();
    let leading_lines = source[..source.len() - trimmed.len()].matches('\n').count();

    let Some(after_fence) = trimmed.strip_prefix(FRONTMATTER_FENCE) else {
        return Ok((None, source, 1));
    };
    // "---" must be alone on its line to open frontmatter
    let Some(after_fence) = after_fence
        .strip_prefix("\r\n")
        .or_else(|| after_fence.strip_prefix('\n'))
    else {
        return Ok((None, source, 1));
    };

    let mut offset = 0;
    for line in after_fence.split_inclusive('\n') {
        if line.trim_end() == FRONTMATTER_FENCE {
            let yaml = &after_fence[..offset];
            let body = &after_fence[offset + line.len()..];
            let body_line = leading_lines + 2 + yaml.matches('\n').count() + 1;
            return Ok((Some(yaml), body, body_line));
        }
        offset += line.len();
    }

    Err(SheetError::MetadataError(
        "frontmatter opened with '---' is never closed".to_string(),
    ))
}

fn parse_metadata(yaml: &str) -> Result<Metadata, SheetError> {
    let raw: RawMetadata = if yaml.trim().is_empty() {
        RawMetadata::default()
    } else {
        serde_yaml::from_str(yaml).map_err(|e| SheetError::MetadataError(e.to_string()))?
    };

    let time_signature = match &raw.time_signature {
        Some(ts) => TimeSignature::parse(ts).ok_or_else(|| {
            SheetError::MetadataError(format!("Invalid time signature: {}", ts))
        })?,
        None => TimeSignature::default(),
    };

    if raw.tempo == Some(0) {
        return Err(SheetError::MetadataError("tempo must be positive".to_string()));
    }

    Ok(Metadata {
        title: raw.title,
        artist: raw.artist,
        tempo: raw.tempo,
        time_signature,
        tags: raw.tags.into_iter().collect(),
    })
}

/// Accumulates notes into measures one token at a time
struct NotationParser {
    measures: Vec<Measure>,
    current: Vec<Note>,
    skipped: Vec<SkippedToken>,
}

impl NotationParser {
    fn new() -> Self {
        Self {
            measures: Vec::new(),
            current: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn accept(&mut self, located: LocatedToken) {
        let note = match &located.token {
            Token::Bar => {
                self.close_measure();
                return;
            }
            Token::Word(word) => parse_word(word),
            Token::ChordGroup { inner, suffix } => parse_chord_group(inner, suffix),
            Token::ChordSymbol { symbol, suffix } => parse_rhythm(suffix).and_then(|beats| {
                let pitches = expand_chord_symbol(symbol)?;
                Some((NoteKind::Chord(pitches), beats))
            }),
            Token::Unterminated(_) => None,
        };

        match note {
            Some((kind, beats)) => self.current.push(Note {
                kind,
                text: located.text,
                beats,
            }),
            None => {
                tracing::debug!(
                    line = located.line,
                    column = located.column,
                    "skipping unrecognized token '{}'",
                    located.text
                );
                self.skipped.push(SkippedToken {
                    text: located.text,
                    line: located.line,
                    column: located.column,
                });
            }
        }
    }

    fn close_measure(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let notes = std::mem::take(&mut self.current);
        self.measures.push(Measure {
            number: self.measures.len() + 1,
            notes,
        });
    }

    fn finish(mut self) -> (Vec<Measure>, Vec<SkippedToken>) {
        self.close_measure();
        (self.measures, self.skipped)
    }
}

fn parse_word(word: &str) -> Option<(NoteKind, f64)> {
    if let Some(suffix) = word.strip_prefix('-') {
        return Some((NoteKind::Rest, parse_rhythm(suffix)?));
    }
    let (pitch, suffix) = parse_pitch_prefix(word)?;
    Some((NoteKind::Single(pitch), parse_rhythm(suffix)?))
}

fn parse_chord_group(inner: &str, suffix: &str) -> Option<(NoteKind, f64)> {
    let beats = parse_rhythm(suffix)?;
    let mut pitches: Vec<Pitch> = Vec::new();
    for member in inner.split_whitespace() {
        let mut remaining = member;
        while !remaining.is_empty() {
            let (pitch, rest) = parse_pitch_prefix(remaining)?;
            // A key sounds once per chord, however it is spelled
            if !pitches.iter().any(|p| p.midi() == pitch.midi()) {
                pitches.push(pitch);
            }
            remaining = rest;
        }
    }

    match pitches.len() {
        0 => None,
        1 => Some((NoteKind::Single(pitches[0]), beats)),
        _ => Some((NoteKind::Chord(pitches), beats)),
    }
}

/// Read a pitch from the front of `s`, returning it and the unread remainder.
fn parse_pitch_prefix(s: &str) -> Option<(Pitch, &str)> {
    let mut chars = s.chars();
    let name = chars.next().and_then(NoteName::from_char)?;
    let mut rest = chars.as_str();

    let accidental = if let Some(r) = rest.strip_prefix('#') {
        rest = r;
        Accidental::Sharp
    } else if let Some(r) = rest.strip_prefix('b') {
        rest = r;
        Accidental::Flat
    } else {
        Accidental::Natural
    };

    let octave = match rest.chars().next().and_then(|c| c.to_digit(10)) {
        Some(digit) if digit as u8 <= MAX_OCTAVE => {
            rest = &rest[1..];
            digit as u8
        }
        Some(_) => return None,
        None => DEFAULT_OCTAVE,
    };

    Some((Pitch::new(name, accidental, octave), rest))
}

/// Beats for a rhythm suffix, or `None` if the suffix is malformed.
fn parse_rhythm(suffix: &str) -> Option<f64> {
    let (value, dotted) = match suffix.strip_suffix('*') {
        Some(value) => (value, true),
        None => (suffix, false),
    };

    let duration = match value {
        "" => Duration::Quarter,
        "/" => Duration::Eighth,
        "//" => Duration::Sixteenth,
        "///" => Duration::ThirtySecond,
        "p" => Duration::Half,
        "o" => Duration::Whole,
        _ => return None,
    };

    Some(duration.dotted_beats(dotted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pitch(s: &str) -> Pitch {
        let (pitch, rest) = parse_pitch_prefix(s).unwrap();
        assert!(rest.is_empty());
        pitch
    }

    #[test]
    fn test_single_notes_and_modifiers() {
        let parsed = parse_measures("C4 c#5 Bb3 G").unwrap();
        let notes = &parsed.measures[0].notes;
        assert_eq!(notes.len(), 4);
        assert_eq!(notes[0].kind, NoteKind::Single(pitch("C4")));
        assert_eq!(notes[1].pitches()[0].midi(), 73);
        assert_eq!(notes[2].pitches()[0].midi(), 58);
        assert_eq!(notes[3].pitches()[0].to_string(), "G4");
        assert!(notes.iter().all(|n| n.beats == 1.0));
    }

    #[test]
    fn test_rhythm_suffixes() {
        let parsed = parse_measures("C4/ C4// C4/// C4p C4o C4p* -/ -o*").unwrap();
        let beats: Vec<f64> = parsed.measures[0].notes.iter().map(|n| n.beats).collect();
        assert_eq!(beats, vec![0.5, 0.25, 0.125, 2.0, 4.0, 3.0, 0.5, 6.0]);
        assert!(parsed.measures[0].notes[6].is_rest());
    }

    #[test]
    fn test_bars_split_measures() {
        let parsed = parse_measures("C4 D4 | E4 | | F4 |").unwrap();
        assert_eq!(parsed.measures.len(), 3);
        let numbers: Vec<usize> = parsed.measures.iter().map(|m| m.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(parsed.measures[0].notes.len(), 2);
    }

    #[test]
    fn test_chord_groups() {
        let parsed = parse_measures("[C4 E4 G4]p [CEG] [A3]").unwrap();
        let notes = &parsed.measures[0].notes;
        assert_eq!(
            notes[0].kind,
            NoteKind::Chord(vec![pitch("C4"), pitch("E4"), pitch("G4")])
        );
        assert_eq!(notes[0].beats, 2.0);
        assert_eq!(notes[0].text, "[C4 E4 G4]p");
        assert_eq!(notes[1].pitches().len(), 3);
        // A one-member chord is just a note
        assert_eq!(notes[2].kind, NoteKind::Single(pitch("A3")));
    }

    #[test]
    fn test_chord_group_drops_repeated_pitches() {
        let parsed = parse_measures("[C4 E4 C4 G4 E4] [C#4 Db4] [D4D4]").unwrap();
        let notes = &parsed.measures[0].notes;
        assert_eq!(
            notes[0].kind,
            NoteKind::Chord(vec![pitch("C4"), pitch("E4"), pitch("G4")])
        );
        // Enharmonic spellings share a key; the first spelling wins
        assert_eq!(notes[1].kind, NoteKind::Single(pitch("C#4")));
        assert_eq!(notes[2].kind, NoteKind::Single(pitch("D4")));
        assert_eq!(notes[0].text, "[C4 E4 C4 G4 E4]");
    }

    #[test]
    fn test_chord_symbols() {
        let parsed = parse_measures("{Am}p {G7}").unwrap();
        let notes = &parsed.measures[0].notes;
        let midi: Vec<u8> = notes[0].pitches().iter().map(|p| p.midi()).collect();
        assert_eq!(midi, vec![57, 60, 64]);
        assert_eq!(notes[0].beats, 2.0);
        assert_eq!(notes[1].pitches().len(), 4);
    }

    #[test]
    fn test_unrecognized_tokens_are_skipped() {
        let parsed = parse_measures("C4 X9 D4q [C4 ZZ] {Hm} ] E4\n[G4").unwrap();
        let texts: Vec<&str> = parsed.measures[0].notes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["C4", "E4", "G4"]);
        let skipped: Vec<&str> = parsed.skipped.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(skipped, vec!["X9", "D4q", "[C4 ZZ]", "{Hm}", "]", "["]);
        assert_eq!(parsed.skipped[5].line, 2);
        assert_eq!(parsed.skipped[5].column, 1);
    }

    #[test]
    fn test_octave_out_of_range_is_skipped() {
        let parsed = parse_measures("C9 C8").unwrap();
        assert_eq!(parsed.measures[0].notes.len(), 1);
        assert_eq!(parsed.skipped[0].text, "C9");
    }

    #[test]
    fn test_empty_input_is_no_sheet_data() {
        assert!(matches!(parse_measures(""), Err(SheetError::NoSheetData)));
        assert!(matches!(parse_measures("  | |\n"), Err(SheetError::NoSheetData)));
        assert!(matches!(parse_measures("??? !!"), Err(SheetError::NoSheetData)));
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let source = "E4 E4 F4 G4 | [C4 E4]/ -/ {Dm7}p | ?? B3o";
        assert_eq!(parse_measures(source).unwrap(), parse_measures(source).unwrap());
    }

    #[test]
    fn test_frontmatter() {
        let source = "---\ntitle: Ode to Joy\nartist: Beethoven\ntempo: 96\ntime-signature: 3/4\ntags: [classical, easy]\n---\nE4 E4 F4\nG4 ??";
        let parsed = parse_measures(source).unwrap();
        assert_eq!(parsed.metadata.title.as_deref(), Some("Ode to Joy"));
        assert_eq!(parsed.metadata.artist.as_deref(), Some("Beethoven"));
        assert_eq!(parsed.metadata.tempo, Some(96));
        assert_eq!(parsed.metadata.time_signature, TimeSignature { beats: 3, beat_type: 4 });
        assert!(parsed.metadata.tags.contains("easy"));
        assert_eq!(parsed.measures[0].notes.len(), 4);
        // Positions count from the top of the file
        assert_eq!(parsed.skipped[0].line, 9);
        assert_eq!(parsed.skipped[0].column, 4);
    }

    #[test]
    fn test_frontmatter_errors() {
        assert!(matches!(
            parse_measures("---\ntitle: x\nC4 D4"),
            Err(SheetError::MetadataError(_))
        ));
        assert!(matches!(
            parse_measures("---\ntime-signature: waltz\n---\nC4"),
            Err(SheetError::MetadataError(_))
        ));
        assert!(matches!(
            parse_measures("---\ntempo: 0\n---\nC4"),
            Err(SheetError::MetadataError(_))
        ));
    }

    #[test]
    fn test_dashes_without_newline_are_notation() {
        // "---" not alone on its line is a malformed rest, not frontmatter
        let parsed = parse_measures("--- C4").unwrap();
        assert_eq!(parsed.measures[0].notes.len(), 1);
        assert_eq!(parsed.skipped[0].text, "---");
    }
}
