//! Integration tests for sheetplay
//!
//! Tests the full pipeline from notation text to pages, durations and playback.

use sheetplay::playback::{AudioCommand, PlaybackScheduler, Playhead, TransportState};
use sheetplay::{
    calculate_page_for_position, estimate_duration, parse_measures, Config, LayoutConfig,
    MusicSheet, NoteKind, Paginator, SheetError, VelocityMapper,
};

const ODE_TO_JOY: &str = r#"---
title: Ode to Joy
artist: Beethoven
tempo: 120
time-signature: 4/4
tags: [classical, beginner]
---
E4 E4 F4 G4 | G4 F4 E4 D4 | C4 C4 D4 E4 | E4* D4/ D4p |
E4 E4 F4 G4 | G4 F4 E4 D4 | C4 C4 D4 E4 | D4* C4/ C4p
"#;

#[test]
fn test_build_full_sheet() {
    let sheet = MusicSheet::build("ode", ODE_TO_JOY, &Config::default()).unwrap();
    assert_eq!(sheet.title, "Ode to Joy");
    assert_eq!(sheet.artist, "Beethoven");
    assert_eq!(sheet.tempo, 120);
    assert_eq!(sheet.time_signature.to_string(), "4/4");
    assert!(sheet.tags.contains("classical"));
    // 8 measures of 4 beats at 120 BPM
    assert_eq!(sheet.total_duration, 16.0);
    assert!(sheet.skipped.is_empty());

    let measures = sheet.measures();
    assert_eq!(measures.len(), 8);
    assert!(measures.iter().all(|m| m.total_beats() == 4.0));
}

#[test]
fn test_duration_scales_with_tempo() {
    let measures = parse_measures(ODE_TO_JOY).unwrap().measures;
    assert_eq!(estimate_duration(&measures, 60), 32.0);
    assert_eq!(estimate_duration(&measures, 240), 8.0);

    let mut previous = f64::INFINITY;
    for tempo in [30, 60, 90, 120, 180, 300] {
        let d = estimate_duration(&measures, tempo);
        assert!(d < previous, "duration must shrink as tempo grows");
        previous = d;
    }
}

#[test]
fn test_mixed_notation() {
    let source = "C#4/ Db4/ [C4 E4 G4] {Am} - | b3p -o*";
    let parsed = parse_measures(source).unwrap();
    assert_eq!(parsed.measures.len(), 2);

    let first = &parsed.measures[0].notes;
    assert_eq!(first.len(), 5);
    assert_eq!(first[0].beats, 0.5);
    assert_eq!(first[0].pitches()[0].midi(), first[1].pitches()[0].midi());
    assert!(matches!(first[2].kind, NoteKind::Chord(ref p) if p.len() == 3));
    assert!(matches!(first[3].kind, NoteKind::Chord(ref p) if p.len() == 3));
    assert!(first[4].is_rest());

    let second = &parsed.measures[1].notes;
    assert_eq!(second[0].pitches()[0].to_string(), "B3");
    assert_eq!(second[0].beats, 2.0);
    assert_eq!(second[1].beats, 6.0);
}

#[test]
fn test_unrecognized_tokens_are_reported_not_fatal() {
    let source = "C4 H9 D4 | ?? E4";
    let sheet = MusicSheet::build("typos", source, &Config::default()).unwrap();
    let skipped: Vec<&str> = sheet.skipped.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(skipped, vec!["H9", "??"]);
    assert_eq!(sheet.measures().len(), 2);
    assert_eq!(sheet.total_duration, 1.5);
}

#[test]
fn test_empty_and_invalid_input() {
    assert!(matches!(
        parse_measures("").unwrap_err(),
        SheetError::NoSheetData
    ));
    assert!(matches!(
        parse_measures("| | |").unwrap_err(),
        SheetError::NoSheetData
    ));
    assert!(matches!(
        parse_measures("---\ntitle: Only metadata\n---\n").unwrap_err(),
        SheetError::NoSheetData
    ));
    assert!(matches!(
        parse_measures("---\ntempo: 0\n---\nC4").unwrap_err(),
        SheetError::MetadataError(_)
    ));
    assert!(matches!(
        parse_measures("---\ntitle: never closed\nC4").unwrap_err(),
        SheetError::MetadataError(_)
    ));
}

#[test]
fn test_pagination_is_consistent() {
    let measures = parse_measures(ODE_TO_JOY).unwrap().measures;
    for (max_chars, lines) in [(1, 1), (7, 1), (12, 2), (48, 6), (500, 1)] {
        let paginator = Paginator::new(LayoutConfig {
            max_chars_per_line: max_chars,
            lines_per_page: lines,
        });
        let pages = paginator.paginate(&measures);
        assert_eq!(pages.len(), paginator.total_pages(&measures));

        for (page_idx, page) in pages.iter().enumerate() {
            for fragment in &page.measures {
                let measure_idx = measures
                    .iter()
                    .position(|m| m.number == fragment.number)
                    .unwrap();
                // First note of each fragment lands on the page that holds it
                let first_note = measures[measure_idx]
                    .notes
                    .iter()
                    .position(|n| n == &fragment.notes[0])
                    .unwrap();
                let page_of = calculate_page_for_position(
                    &measures,
                    measure_idx,
                    first_note,
                    max_chars,
                    lines,
                );
                assert!(page_of <= page_idx);
            }
        }
    }
}

#[test]
fn test_wide_layout_fits_one_page() {
    let config = Config {
        layout: LayoutConfig {
            max_chars_per_line: 10_000,
            lines_per_page: 1,
        },
        ..Config::default()
    };
    let sheet = MusicSheet::build("ode", ODE_TO_JOY, &config).unwrap();
    assert_eq!(sheet.total_pages(), 1);
}

#[test]
fn test_config_from_yaml_drives_build() {
    let config = Config::from_yaml_str(
        "layout:\n  max-chars-per-line: 12\n  lines-per-page: 1\nplayback:\n  tempo: 60\n",
    )
    .unwrap();
    let sheet = MusicSheet::build("plain", "C4 D4 E4 F4 G4 A4", &config).unwrap();
    assert_eq!(sheet.tempo, 60);
    assert_eq!(sheet.total_duration, 6.0);
    // Four 3-character tokens per 12-character line
    assert_eq!(sheet.total_pages(), 2);

    assert!(matches!(
        Config::from_yaml_str("layout:\n  columns: 3\n").unwrap_err(),
        SheetError::ConfigError(_)
    ));
}

#[test]
fn test_missing_config_file() {
    let err = Config::load("/definitely/not/here.yaml").unwrap_err();
    assert!(matches!(err, SheetError::Io { .. }));
}

#[test]
fn test_playback_of_built_sheet() {
    let config = Config::default();
    let sheet = MusicSheet::build("ode", ODE_TO_JOY, &config).unwrap();
    let mut scheduler = PlaybackScheduler::for_sheet(
        &sheet,
        config.layout,
        false,
        VelocityMapper::new(config.velocity),
        Vec::<(u64, AudioCommand)>::new(),
        Vec::<Playhead>::new(),
    );

    scheduler.start(0);
    scheduler.run_until(60_000);
    assert_eq!(scheduler.transport(), TransportState::Idle);

    let (events, playheads) = scheduler.into_parts();
    let note_ons = events
        .iter()
        .filter(|(_, c)| matches!(c, AudioCommand::NoteOn { .. }))
        .count();
    let note_offs = events.len() - note_ons;
    assert_eq!(note_ons, 30);
    assert_eq!(note_offs, 30);

    // Last release lands at the estimated duration
    assert_eq!(events.last().unwrap().0, 16_000);

    // Every note is published once, in order, starting with the first
    assert_eq!(playheads.len(), 30);
    assert_eq!(playheads[0], Playhead::default());
    for pair in playheads.windows(2) {
        assert!((pair[0].measure, pair[0].note) < (pair[1].measure, pair[1].note));
    }
}

#[test]
fn test_playback_pages_follow_layout() {
    let layout = LayoutConfig {
        max_chars_per_line: 12,
        lines_per_page: 1,
    };
    let config = Config {
        layout,
        ..Config::default()
    };
    let sheet = MusicSheet::build("ode", ODE_TO_JOY, &config).unwrap();
    let measures = sheet.measures();
    let mut scheduler = PlaybackScheduler::for_sheet(
        &sheet,
        layout,
        false,
        VelocityMapper::default(),
        Vec::<(u64, AudioCommand)>::new(),
        Vec::<Playhead>::new(),
    );
    scheduler.start(0);
    scheduler.run_until(60_000);

    let playheads = scheduler.store();
    assert!(playheads.last().unwrap().page > 0);
    for p in playheads {
        assert_eq!(
            p.page,
            calculate_page_for_position(&measures, p.measure, p.note, 12, 1)
        );
    }
}
