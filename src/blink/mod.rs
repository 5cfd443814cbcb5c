//! Blinking highlight of the selected regions, paced by external events.
//!
//! ## State machine
//!
//! ```text
//!   Idle ──start()──▶ Running ──stream closed──▶ Stopped
//!                        │                          │
//!                        └───────stop()────────────▶┘
//! ```
//!
//! `start()` needs a non-empty selection and fails while a run is active.
//! `Stopped` accepts `start()` again.

mod error;
mod synchronizer;
mod timeline;

pub use error::SyncError;
pub use synchronizer::{BlinkMessage, BlinkSynchronizer, FinishReason, SyncState};
pub use timeline::{BlinkKind, TimedEvent, Timeline, TimelineEvent};
