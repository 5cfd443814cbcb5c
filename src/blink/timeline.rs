//! Timeline events that drive the blink highlight.
//!
//! The synchronizer itself never keeps time; it reacts to events as they
//! arrive on a channel. [`Timeline`] is a small pacing helper for callers
//! that have a list of timestamped events (for example a JSON file on the
//! command line) rather than a live source.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::blink::SyncError;

/// MIDI channel voice status nibbles.
const MIDI_NOTE_OFF: u8 = 0x80;
const MIDI_NOTE_ON: u8 = 0x90;

/// Highlight state requested by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlinkKind {
    /// Selected regions go bright
    On,
    /// Selected regions return to their overlay color
    Off,
}

/// One discrete on/off signal, consumed strictly in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineEvent {
    pub ordinal: u64,
    pub kind: BlinkKind,
}

impl TimelineEvent {
    pub fn new(ordinal: u64, kind: BlinkKind) -> Self {
        Self { ordinal, kind }
    }

    /// Classify a MIDI-style channel message.
    ///
    /// Note-on with a positive velocity is `On`; note-off, or note-on with
    /// velocity zero, is `Off`. Every other status returns `None`.
    pub fn from_midi_like(ordinal: u64, status: u8, velocity: u8) -> Option<Self> {
        let kind = match (status & 0xF0, velocity) {
            (MIDI_NOTE_ON, v) if v > 0 => BlinkKind::On,
            (MIDI_NOTE_ON, _) | (MIDI_NOTE_OFF, _) => BlinkKind::Off,
            _ => return None,
        };
        Some(Self::new(ordinal, kind))
    }
}

/// An event scheduled at an offset from the start of playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Offset from playback start in milliseconds
    pub at_ms: u64,
    pub kind: BlinkKind,
}

/// A list of timed events, kept sorted by offset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeline {
    entries: Vec<TimedEvent>,
}

impl Timeline {
    /// Build a timeline; entries with equal offsets keep their given order.
    pub fn new(mut entries: Vec<TimedEvent>) -> Self {
        entries.sort_by_key(|e| e.at_ms);
        Self { entries }
    }

    /// Parse a JSON array of `{ "at_ms": .., "kind": "on" | "off" }`.
    pub fn from_json(json: &str) -> Result<Self, SyncError> {
        let entries: Vec<TimedEvent> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    pub fn to_json(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    pub fn entries(&self) -> &[TimedEvent] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Events in order, numbered from zero.
    pub fn events(&self) -> impl Iterator<Item = TimelineEvent> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| TimelineEvent::new(i as u64, e.kind))
    }

    /// Forward each event to `sender` once its offset has elapsed.
    ///
    /// Sleeps in slices of at most `poll_interval` so that setting `cancel`
    /// stops playback within one slice. Returns how many events were sent.
    /// The sender is dropped by the caller afterwards, which tells the
    /// receiver the stream ended.
    pub fn play(
        &self,
        sender: &Sender<TimelineEvent>,
        cancel: &AtomicBool,
        poll_interval: Duration,
    ) -> usize {
        let slice = poll_interval.max(Duration::from_millis(1));
        let started = web_time::Instant::now();
        let mut sent = 0;

        for (event, entry) in self.events().zip(&self.entries) {
            let due = Duration::from_millis(entry.at_ms);
            loop {
                if cancel.load(Ordering::Acquire) {
                    log::debug!("Timeline playback cancelled after {} event(s)", sent);
                    return sent;
                }
                let elapsed = started.elapsed();
                if elapsed >= due {
                    break;
                }
                std::thread::sleep((due - elapsed).min(slice));
            }

            log::trace!("Timeline event {} ({:?}) at {:?}", event.ordinal, event.kind, due);
            if sender.send(event).is_err() {
                log::debug!("Timeline receiver dropped");
                return sent;
            }
            sent += 1;
        }
        sent
    }
}
