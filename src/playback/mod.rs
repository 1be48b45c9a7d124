//! # Playback Module
//!
//! Real-time, note-by-note playback of a parsed sheet.
//!
//! ## Sub-modules
//! - `types` - transport state, playhead, audio commands, timer tokens, collaborator traits
//! - `scheduler` - the [`PlaybackScheduler`] state machine
//!
//! ## States
//! ```text
//!            start                 pause
//!   Idle ───────────► Playing ───────────► Paused
//!    ▲  ◄─────────────  │  ▲ ◄─────────────  │
//!    │   end of sheet   │  │  start/resume   │
//!    └──────────────────┴──┴─────────────────┘
//!                      stop
//! ```
//!
//! ## Timing
//! A note of `b` beats at tempo `t` lasts `60 / t * 1000 * b` ms. When it
//! elapses its pitches are released, the playhead moves to the next note (or the
//! first note of the next measure) and that note sounds at the same instant.
//! Tempo changes apply from the next note.
//!
//! ## Example
//! ```rust
//! use sheetplay::parse_measures;
//! use sheetplay::config::{LayoutConfig, PlaybackConfig};
//! use sheetplay::playback::{AudioCommand, Discard, PlaybackScheduler, TransportState};
//! use sheetplay::VelocityMapper;
//!
//! let measures = parse_measures("C4 D4").unwrap().measures;
//! let mut scheduler = PlaybackScheduler::new(
//!     measures,
//!     LayoutConfig::default(),
//!     PlaybackConfig { tempo: 120, loop_enabled: false },
//!     VelocityMapper::default(),
//!     Vec::<(u64, AudioCommand)>::new(),
//!     Discard,
//! );
//!
//! scheduler.start(0);
//! scheduler.run_until(1_000);
//! assert_eq!(scheduler.transport(), TransportState::Idle);
//! assert_eq!(scheduler.sink().len(), 4); // two note-ons, two note-offs
//! ```

mod scheduler;
mod types;


pub use scheduler::PlaybackScheduler;
pub use types::{
    AudioCommand, AudioSink, Discard, PlaybackState, Playhead, PlayheadStore, ScheduledTick,
    TimerToken, TransportState,
};
