//! Event-driven blinking of the selected regions.
//!
//! A run owns a snapshot of the base image, the region collection and the
//! selection taken at `start`, so later selection edits do not affect frames
//! already in flight. Each received event renders one frame on the blink
//! thread and posts it back over a channel; the thread never touches the
//! caller's state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::blink::{BlinkKind, SyncError, TimelineEvent};
use crate::compositor::{CompositeFrame, CompositeOptions, HighlightMode, render_with};
use crate::constants::DEFAULT_BLINK_POLL_MS;
use crate::data::RasterImage;
use crate::model::{Region, RegionCollection};

/// Lifecycle of a synchronizer.
///
/// `Stopped` behaves like `Idle` for restarting; it only records that a run
/// has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SyncState {
    Idle = 0,
    Running = 1,
    Stopped = 2,
}

impl SyncState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SyncState::Running,
            2 => SyncState::Stopped,
            _ => SyncState::Idle,
        }
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// The event stream was closed
    Exhausted,
    /// `stop()` was called, or the frame receiver went away
    Cancelled,
}

/// Message posted by the blink thread.
#[derive(Debug)]
pub enum BlinkMessage {
    /// A frame rendered for one event
    Frame {
        ordinal: u64,
        kind: BlinkKind,
        frame: CompositeFrame,
    },
    /// The run is over; no further frames follow
    Finished { reason: FinishReason },
}

/// Everything the blink thread renders from.
struct BlinkRun {
    base: Arc<RasterImage>,
    collection: Arc<RegionCollection>,
    selection: Vec<Arc<Region>>,
    options: CompositeOptions,
}

/// Drives blink runs on a background thread.
pub struct BlinkSynchronizer {
    state: Arc<AtomicU8>,
    cancel: Arc<AtomicBool>,
    /// Receiver for the current (or last) run's messages
    message_rx: Option<Receiver<BlinkMessage>>,
    thread_handle: Option<JoinHandle<()>>,
    /// How often a blocked wait re-checks the cancel flag
    poll_interval: Duration,
}

impl Default for BlinkSynchronizer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_BLINK_POLL_MS))
    }
}

impl BlinkSynchronizer {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(SyncState::Idle as u8)),
            cancel: Arc::new(AtomicBool::new(false)),
            message_rx: None,
            thread_handle: None,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    pub fn state(&self) -> SyncState {
        SyncState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.state() == SyncState::Running
    }

    /// Start blinking `selection` in response to `events`.
    ///
    /// Fails without changing state if the selection is empty or a run is
    /// already in progress.
    pub fn start(
        &mut self,
        base: Arc<RasterImage>,
        collection: Arc<RegionCollection>,
        selection: Vec<Arc<Region>>,
        options: CompositeOptions,
        events: Receiver<TimelineEvent>,
    ) -> Result<(), SyncError> {
        if self.is_running() {
            return Err(SyncError::AlreadyRunning);
        }
        if selection.is_empty() {
            return Err(SyncError::NothingSelected);
        }

        // The previous run has already finished; reap its thread.
        self.join_thread();

        let cancel = Arc::new(AtomicBool::new(false));
        let state = Arc::clone(&self.state);
        let (message_tx, message_rx) = mpsc::channel::<BlinkMessage>();
        let poll_interval = self.poll_interval;
        let run = BlinkRun {
            base,
            collection,
            selection,
            options,
        };
        let selected = run.selection.len();

        state.store(SyncState::Running as u8, Ordering::Release);
        let thread_cancel = Arc::clone(&cancel);
        let spawned = thread::Builder::new()
            .name("blink-sync".to_string())
            .spawn(move || {
                let reason =
                    Self::thread_loop(&run, &events, &message_tx, &thread_cancel, poll_interval);
                state.store(SyncState::Stopped as u8, Ordering::Release);
                log::info!("Blink run finished ({:?})", reason);
                let _ = message_tx.send(BlinkMessage::Finished { reason });
            });

        match spawned {
            Ok(handle) => {
                self.cancel = cancel;
                self.message_rx = Some(message_rx);
                self.thread_handle = Some(handle);
                log::info!("Blink run started for {} selected region(s)", selected);
                Ok(())
            }
            Err(e) => {
                self.state.store(SyncState::Idle as u8, Ordering::Release);
                Err(SyncError::Spawn(e.to_string()))
            }
        }
    }

    /// Background thread main loop.
    fn thread_loop(
        run: &BlinkRun,
        events: &Receiver<TimelineEvent>,
        message_tx: &Sender<BlinkMessage>,
        cancel: &AtomicBool,
        poll_interval: Duration,
    ) -> FinishReason {
        loop {
            // Checked before every wait so a stop during a rest wins.
            if cancel.load(Ordering::Acquire) {
                return FinishReason::Cancelled;
            }
            let event = match events.recv_timeout(poll_interval) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return FinishReason::Exhausted,
            };
            if cancel.load(Ordering::Acquire) {
                return FinishReason::Cancelled;
            }

            let mode = match event.kind {
                BlinkKind::On => HighlightMode::Bright,
                BlinkKind::Off => HighlightMode::Normal,
            };
            log::trace!("Blink event {} -> {:?}", event.ordinal, mode);
            let frame = render_with(
                &run.base,
                &run.collection,
                &run.selection,
                mode,
                &run.options,
            );

            let message = BlinkMessage::Frame {
                ordinal: event.ordinal,
                kind: event.kind,
                frame,
            };
            if message_tx.send(message).is_err() {
                log::warn!("Blink frame receiver dropped");
                return FinishReason::Cancelled;
            }
        }
    }

    /// Request cancellation and wait for the run to wind down.
    ///
    /// Events not yet rendered are abandoned. Safe to call when idle.
    pub fn stop(&mut self) {
        if self.thread_handle.is_none() {
            return;
        }
        log::info!("Stopping blink run");
        self.cancel.store(true, Ordering::Release);
        self.join_thread();
        self.state.store(SyncState::Stopped as u8, Ordering::Release);
    }

    /// Take one pending message, if any. Non-blocking.
    pub fn try_recv(&self) -> Option<BlinkMessage> {
        let rx = self.message_rx.as_ref()?;
        match rx.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for the next message.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<BlinkMessage> {
        self.message_rx.as_ref()?.recv_timeout(timeout).ok()
    }

    /// All messages currently queued.
    pub fn drain(&self) -> Vec<BlinkMessage> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    fn join_thread(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                log::warn!("Blink thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for BlinkSynchronizer {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Release);
        self.join_thread();
    }
}
