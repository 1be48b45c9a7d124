//! # sheetplay
//!
//! Plain-text note sheets in, paginated scores and tempo-synced playback out.
//!
//! ## Pipeline
//! 1. [`parse_measures`] tokenizes notation into measures of notes, chords and rests
//! 2. [`estimate_duration`] gives the real-time length at a tempo
//! 3. [`Paginator`] packs the notes into lines and pages
//! 4. [`PlaybackScheduler`] walks the notes in time, emitting note-on/note-off
//!    commands and keeping the playhead's page current
//!
//! [`MusicSheet::build`] runs steps 1-3 in one go.
//!
//! ## Example
//! ```rust
//! use sheetplay::{Config, MusicSheet};
//!
//! let source = r#"---
//! title: Ode to Joy
//! tempo: 120
//! ---
//! E4 E4 F4 G4 | G4 F4 E4 D4 | C4 C4 D4 E4 | E4* D4/ D4p
//! "#;
//!
//! let sheet = MusicSheet::build("ode-to-joy", source, &Config::default())?;
//! assert_eq!(sheet.title, "Ode to Joy");
//! assert_eq!(sheet.total_duration, 8.0);
//! # Ok::<(), sheetplay::SheetError>(())
//! ```

pub mod chord_symbol;
pub mod config;
pub mod duration;
pub mod error;
pub mod lexer;
pub mod pagination;
pub mod parser;
pub mod playback;
pub mod score;
pub mod sheet;
pub mod velocity;

pub use config::{Config, LayoutConfig, PlaybackConfig, VelocityConfig};
pub use duration::{estimate_duration, note_duration_ms, MIN_TEMPO};
pub use error::SheetError;
pub use pagination::{calculate_page_for_position, Layout, Paginator};
pub use parser::{parse_measures, ParsedNotation, SkippedToken};
pub use playback::PlaybackScheduler;
pub use score::{Measure, Note, NoteKind, Page, Pitch, TimeSignature};
pub use sheet::MusicSheet;
pub use velocity::{VelocityMapper, DEFAULT_VELOCITY};
