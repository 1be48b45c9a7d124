//! Playback type definitions
//!
//! Transport state, playhead, timer tokens, and the two collaborator traits the
//! scheduler talks to: an [`AudioSink`] for note commands and a
//! [`PlayheadStore`] for position updates.

use crate::score::Pitch;
use serde::Serialize;

/// Transport state of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportState {
    /// Not playing; the initial and terminal state
    Idle,
    /// Advancing through the sheet
    Playing,
    /// Position and remaining note time retained, nothing pending
    Paused,
}

/// Current position: zero-based measure, note within the measure, and page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Playhead {
    pub measure: usize,
    pub note: usize,
    pub page: usize,
}

/// Snapshot of a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub playhead: Playhead,
    pub playing: bool,
    pub tempo: u32,
    pub loop_enabled: bool,
}

/// Command for the audio collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AudioCommand {
    NoteOn { pitch: Pitch, velocity: u8 },
    NoteOff { pitch: Pitch },
}

/// Identifies one scheduled tick of one playback session.
///
/// A token only matches the scheduler's pending slot if it was issued by the
/// currently active session and has not been cancelled or already fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub(crate) session: u64,
    pub(crate) serial: u64,
}

impl TimerToken {
    pub fn session(&self) -> u64 {
        self.session
    }
}

/// The single pending timer a host must arm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTick {
    pub token: TimerToken,
    /// Absolute time on the host clock when the tick should fire
    pub due_ms: u64,
}

/// Receives note commands, stamped with the host-clock time they were emitted at.
pub trait AudioSink {
    fn send(&mut self, at_ms: u64, command: AudioCommand);
}

/// Receives playhead updates.
pub trait PlayheadStore {
    fn store(&mut self, playhead: Playhead);
}

impl AudioSink for Vec<(u64, AudioCommand)> {
    fn send(&mut self, at_ms: u64, command: AudioCommand) {
        self.push((at_ms, command));
    }
}

impl PlayheadStore for Vec<Playhead> {
    fn store(&mut self, playhead: Playhead) {
        self.push(playhead);
    }
}

/// Discards everything; for hosts that do not track one side.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl AudioSink for Discard {
    fn send(&mut self, _at_ms: u64, _command: AudioCommand) {}
}

impl PlayheadStore for Discard {
    fn store(&mut self, _playhead: Playhead) {}
}
