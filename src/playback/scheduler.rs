//! Note-by-note playback state machine
//!
//! The scheduler never sleeps or spawns. Each note arms exactly one tick that
//! fires after the note's duration; firing it releases the note, advances the
//! playhead and arms the tick for the next note. Hosts drive it in one of two
//! ways:
//! - read [`PlaybackScheduler::pending_tick`], arm a real timer, and call
//!   [`PlaybackScheduler::fire`] with the token when it elapses, or
//! - call [`PlaybackScheduler::run_until`] with the current clock time.
//!
//! Ticks from a stopped, paused or superseded session carry a token that no
//! longer matches the pending slot and are ignored when fired.

use super::types::{
    AudioCommand, AudioSink, PlaybackState, Playhead, PlayheadStore, ScheduledTick, TimerToken,
    TransportState,
};
use crate::config::{LayoutConfig, PlaybackConfig};
use crate::duration::{note_duration_ms, sanitize_tempo};
use crate::pagination::{Layout, Paginator};
use crate::score::{Measure, Note, Pitch};
use crate::sheet::MusicSheet;
use crate::velocity::VelocityMapper;

#[derive(Debug, Clone)]
struct PendingTick {
    token: TimerToken,
    due_ms: u64,
    /// Pitches to release when the tick fires
    sounding: Vec<Pitch>,
}

#[derive(Debug, Clone)]
struct PausedNote {
    remaining_ms: u64,
    sounding: Vec<Pitch>,
}

pub struct PlaybackScheduler<S: AudioSink, P: PlayheadStore> {
    measures: Vec<Measure>,
    layout: Layout,
    velocity: VelocityMapper,
    sink: S,
    store: P,
    transport: TransportState,
    playhead: Playhead,
    tempo: u32,
    loop_enabled: bool,
    session: u64,
    next_serial: u64,
    pending: Option<PendingTick>,
    paused: Option<PausedNote>,
}

impl<S: AudioSink, P: PlayheadStore> PlaybackScheduler<S, P> {
    pub fn new(
        measures: Vec<Measure>,
        layout: LayoutConfig,
        playback: PlaybackConfig,
        velocity: VelocityMapper,
        sink: S,
        store: P,
    ) -> Self {
        let layout = Paginator::new(layout).layout(&measures);
        Self {
            measures,
            layout,
            velocity,
            sink,
            store,
            transport: TransportState::Idle,
            playhead: Playhead::default(),
            tempo: sanitize_tempo(playback.tempo),
            loop_enabled: playback.loop_enabled,
            session: 0,
            next_serial: 0,
            pending: None,
            paused: None,
        }
    }

    /// Scheduler for a built sheet, playing at the sheet's tempo.
    pub fn for_sheet(
        sheet: &MusicSheet,
        layout: LayoutConfig,
        loop_enabled: bool,
        velocity: VelocityMapper,
        sink: S,
        store: P,
    ) -> Self {
        let playback = PlaybackConfig {
            tempo: sheet.tempo,
            loop_enabled,
        };
        Self::new(sheet.measures(), layout, playback, velocity, sink, store)
    }

    pub fn transport(&self) -> TransportState {
        self.transport
    }

    pub fn playhead(&self) -> Playhead {
        self.playhead
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            playhead: self.playhead,
            playing: self.transport == TransportState::Playing,
            tempo: self.tempo,
            loop_enabled: self.loop_enabled,
        }
    }

    pub fn pending_tick(&self) -> Option<ScheduledTick> {
        self.pending.as_ref().map(|p| ScheduledTick {
            token: p.token,
            due_ms: p.due_ms,
        })
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn into_parts(self) -> (S, P) {
        (self.sink, self.store)
    }

    /// Takes effect from the next note; a note already sounding keeps its length.
    pub fn set_tempo(&mut self, tempo: u32) {
        self.tempo = sanitize_tempo(tempo);
    }

    pub fn set_loop(&mut self, loop_enabled: bool) {
        self.loop_enabled = loop_enabled;
    }

    /// Start from the current playhead, or resume when paused.
    pub fn start(&mut self, now_ms: u64) {
        match self.transport {
            TransportState::Playing => {}
            TransportState::Paused => self.resume(now_ms),
            TransportState::Idle => {
                self.session += 1;
                self.transport = TransportState::Playing;
                tracing::debug!(session = self.session, "playback started at {:?}", self.playhead);
                let Playhead { measure, note, .. } = self.playhead;
                self.move_to(measure, note);
                self.play_current(now_ms);
            }
        }
    }

    /// Continue a paused note with the time it had left, measured from `now_ms`.
    pub fn resume(&mut self, now_ms: u64) {
        if self.transport != TransportState::Paused {
            return;
        }
        self.transport = TransportState::Playing;
        match self.paused.take() {
            Some(paused) => {
                tracing::debug!(session = self.session, "resumed with {} ms left", paused.remaining_ms);
                self.schedule(now_ms + paused.remaining_ms, paused.sounding);
            }
            None => self.play_current(now_ms),
        }
    }

    pub fn pause(&mut self, now_ms: u64) {
        if self.transport != TransportState::Playing {
            return;
        }
        self.transport = TransportState::Paused;
        self.paused = self.pending.take().map(|pending| PausedNote {
            remaining_ms: pending.due_ms.saturating_sub(now_ms),
            sounding: pending.sounding,
        });
        tracing::debug!(session = self.session, "paused at {:?}", self.playhead);
    }

    /// Cancel everything, release sounding notes and rewind to the start.
    pub fn stop(&mut self, now_ms: u64) {
        let sounding = match (self.pending.take(), self.paused.take()) {
            (Some(pending), _) => pending.sounding,
            (None, Some(paused)) => paused.sounding,
            (None, None) => Vec::new(),
        };
        self.release(now_ms, &sounding);

        self.transport = TransportState::Idle;
        self.playhead = Playhead::default();
        self.store.store(self.playhead);
        tracing::debug!(session = self.session, "playback stopped");
    }

    /// Handle an elapsed timer. Returns false if the token is stale.
    pub fn fire(&mut self, token: TimerToken, now_ms: u64) -> bool {
        let matches = self.pending.as_ref().is_some_and(|p| p.token == token);
        if !matches {
            tracing::trace!(
                session = token.session,
                active = self.session,
                "ignoring stale tick"
            );
            return false;
        }
        let Some(pending) = self.pending.take() else {
            return false;
        };

        self.release(now_ms, &pending.sounding);
        self.advance(now_ms);
        true
    }

    /// Fire every tick due at or before `now_ms`, each at its own due time.
    pub fn run_until(&mut self, now_ms: u64) {
        while let Some(tick) = self.pending_tick() {
            if tick.due_ms > now_ms {
                break;
            }
            self.fire(tick.token, tick.due_ms);
        }
    }

    fn note_at(&self, measure: usize, note: usize) -> Option<&Note> {
        self.measures.get(measure)?.notes.get(note)
    }

    /// First note at or after the start of `measure`, skipping empty measures.
    fn first_note_from(&self, measure: usize) -> Option<(usize, usize)> {
        (measure..self.measures.len())
            .find(|&m| !self.measures[m].notes.is_empty())
            .map(|m| (m, 0))
    }

    fn move_to(&mut self, measure: usize, note: usize) {
        self.playhead = Playhead {
            measure,
            note,
            page: self.layout.page_of(measure, note).unwrap_or(0),
        };
        self.store.store(self.playhead);
    }

    /// Sound the note under the playhead and arm the tick that ends it.
    fn play_current(&mut self, now_ms: u64) {
        let Playhead { measure, note, .. } = self.playhead;
        let Some(current) = self.note_at(measure, note) else {
            self.end_of_sheet(now_ms);
            return;
        };

        let delay = note_duration_ms(current.beats, self.tempo);
        let sounding = current.pitches().to_vec();
        let velocity = self.velocity.calculate_velocity(None);
        for &pitch in &sounding {
            self.sink.send(now_ms, AudioCommand::NoteOn { pitch, velocity });
        }

        tracing::trace!(measure, note, delay, "note scheduled");
        self.schedule(now_ms + delay, sounding);
    }

    fn schedule(&mut self, due_ms: u64, sounding: Vec<Pitch>) {
        self.next_serial += 1;
        self.pending = Some(PendingTick {
            token: TimerToken {
                session: self.session,
                serial: self.next_serial,
            },
            due_ms,
            sounding,
        });
    }

    fn release(&mut self, now_ms: u64, pitches: &[Pitch]) {
        for &pitch in pitches {
            self.sink.send(now_ms, AudioCommand::NoteOff { pitch });
        }
    }

    fn advance(&mut self, now_ms: u64) {
        let Playhead { measure, note, .. } = self.playhead;
        let next = if self.note_at(measure, note + 1).is_some() {
            Some((measure, note + 1))
        } else if measure < self.measures.len() {
            self.first_note_from(measure + 1)
        } else {
            None
        };

        match next {
            Some((measure, note)) => {
                self.move_to(measure, note);
                self.play_current(now_ms);
            }
            None => self.end_of_sheet(now_ms),
        }
    }

    fn end_of_sheet(&mut self, now_ms: u64) {
        if self.loop_enabled {
            if let Some((measure, note)) = self.first_note_from(0) {
                tracing::debug!(session = self.session, "looping to start");
                self.move_to(measure, note);
                self.play_current(now_ms);
                return;
            }
        }
        tracing::debug!(session = self.session, "end of sheet");
        self.transport = TransportState::Idle;
    }
}
