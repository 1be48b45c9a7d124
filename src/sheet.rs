//! Fully built, paginated music sheet.

use crate::config::Config;
use crate::duration::estimate_duration;
use crate::error::SheetError;
use crate::pagination::Paginator;
use crate::parser::{parse_measures, SkippedToken};
use crate::score::{Measure, Page, TimeSignature};
use serde::Serialize;
use std::collections::BTreeSet;

const UNTITLED: &str = "Untitled";
const UNKNOWN_ARTIST: &str = "Unknown";

/// A parsed sheet laid out on pages, ready for a renderer and for playback.
///
/// Built once from its notation text and never modified; new text means a new sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicSheet {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub tempo: u32,
    pub time_signature: TimeSignature,
    pub pages: Vec<Page>,
    pub tags: BTreeSet<String>,
    /// Seconds at `tempo`
    pub total_duration: f64,
    pub raw_notation: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedToken>,
}

impl MusicSheet {
    /// Parse `raw_notation` and lay it out with `config.layout`.
    ///
    /// Frontmatter values win over `config.playback.tempo`.
    ///
    /// # Example
    /// ```
    /// use sheetplay::{Config, MusicSheet};
    ///
    /// let sheet = MusicSheet::build("ode", "---\ntitle: Ode to Joy\n---\nE4 E4 F4 G4", &Config::default())?;
    /// assert_eq!(sheet.title, "Ode to Joy");
    /// assert_eq!(sheet.total_duration, 2.0);
    /// assert_eq!(sheet.pages.len(), 1);
    /// # Ok::<(), sheetplay::SheetError>(())
    /// ```
    pub fn build(
        id: impl Into<String>,
        raw_notation: impl Into<String>,
        config: &Config,
    ) -> Result<Self, SheetError> {
        let raw_notation = raw_notation.into();
        let parsed = parse_measures(&raw_notation)?;
        let metadata = parsed.metadata;

        let tempo = metadata.tempo.unwrap_or(config.playback.tempo);
        let total_duration = estimate_duration(&parsed.measures, tempo);
        let pages = Paginator::new(config.layout).paginate(&parsed.measures);

        let sheet = Self {
            id: id.into(),
            title: metadata.title.unwrap_or_else(|| UNTITLED.to_string()),
            artist: metadata.artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            tempo,
            time_signature: metadata.time_signature,
            pages,
            tags: metadata.tags,
            total_duration,
            raw_notation,
            skipped: parsed.skipped,
        };

        tracing::info!(
            id = %sheet.id,
            measures = parsed.measures.len(),
            pages = sheet.pages.len(),
            skipped = sheet.skipped.len(),
            "built sheet '{}'",
            sheet.title
        );
        Ok(sheet)
    }

    /// Reassemble whole measures from their per-page fragments.
    pub fn measures(&self) -> Vec<Measure> {
        let mut measures: Vec<Measure> = Vec::new();
        for fragment in self.pages.iter().flat_map(|page| &page.measures) {
            if let Some(last) = measures
                .last_mut()
                .filter(|last| last.number == fragment.number)
            {
                last.notes.extend(fragment.notes.iter().cloned());
            } else {
                measures.push(fragment.clone());
            }
        }
        measures
    }

    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;

    fn narrow_config() -> Config {
        Config {
            layout: LayoutConfig {
                max_chars_per_line: 7,
                lines_per_page: 1,
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_defaults_without_frontmatter() {
        let sheet = MusicSheet::build("s1", "C4 D4 | E4p", &Config::default()).unwrap();
        assert_eq!(sheet.id, "s1");
        assert_eq!(sheet.title, UNTITLED);
        assert_eq!(sheet.artist, UNKNOWN_ARTIST);
        assert_eq!(sheet.tempo, 120);
        assert_eq!(sheet.time_signature, TimeSignature::default());
        assert!(sheet.tags.is_empty());
        assert_eq!(sheet.total_duration, 2.0);
        assert_eq!(sheet.raw_notation, "C4 D4 | E4p");
    }

    #[test]
    fn test_frontmatter_overrides_config() {
        let source = "---\ntitle: Scale\nartist: Anon\ntempo: 60\ntags: [practice, scales, practice]\n---\nC4 D4 E4 F4";
        let sheet = MusicSheet::build("s2", source, &Config::default()).unwrap();
        assert_eq!(sheet.title, "Scale");
        assert_eq!(sheet.artist, "Anon");
        assert_eq!(sheet.tempo, 60);
        assert_eq!(sheet.total_duration, 4.0);
        assert_eq!(sheet.tags.len(), 2);
    }

    #[test]
    fn test_measures_survive_pagination() {
        let source = "C4 D4 E4 | F4 G4 | [C4 E4 G4]o";
        let sheet = MusicSheet::build("s3", source, &narrow_config()).unwrap();
        assert!(sheet.total_pages() > 1);
        let measures = sheet.measures();
        assert_eq!(measures, parse_measures(source).unwrap().measures);
    }

    #[test]
    fn test_no_sheet_data() {
        let err = MusicSheet::build("empty", "   ", &Config::default()).unwrap_err();
        assert!(matches!(err, SheetError::NoSheetData));
    }

    #[test]
    fn test_serializes_camel_case() {
        let sheet = MusicSheet::build("s4", "C#4 [C4 E4] -", &Config::default()).unwrap();
        let json = serde_json::to_value(&sheet).unwrap();
        assert_eq!(json["timeSignature"]["beatType"], 4);
        assert_eq!(json["totalDuration"], 1.5);
        let notes = &json["pages"][0]["measures"][0]["notes"];
        assert_eq!(notes[0]["kind"]["type"], "single");
        assert_eq!(notes[0]["kind"]["pitches"], "C#4");
        assert_eq!(notes[1]["kind"]["pitches"][1], "E4");
        assert_eq!(notes[2]["kind"]["type"], "rest");
        assert!(json.get("skipped").is_none());
    }
}
