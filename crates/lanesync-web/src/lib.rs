#![forbid(unsafe_code)]

//! `lanesync-web` provides host-driven building blocks for LaneSync.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment pushes drag signals and
//!   re-render notifications; nothing here reaches for a browser API.
//! - **Deterministic time**: the host advances a monotonic clock explicitly.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! This crate does not bind to `wasm-bindgen`. `lanesync-wasm` wraps these
//! pieces with a JS API.

pub mod backend;
pub mod collaborators;
#[cfg(feature = "input-parser")]
pub mod host_message;
pub mod memory_dom;
pub mod simulator;

use web_time::Duration;

pub use backend::{BackendEvent, RecordingDragBackend};
pub use collaborators::{
    ClearOnSubmit, ClipboardCopy, ClipboardError, ClipboardWriter, DebouncedSave,
    MemoryClipboard,
};
#[cfg(feature = "input-parser")]
pub use host_message::{HostMessage, HostMessageError, parse_host_message};
pub use memory_dom::{BoardMarkup, DomMutation, Element, MemoryDom, WebDomError};
pub use simulator::{DragSimulator, DropTarget};

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Current monotonic time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_advances_and_saturates() {
        let mut clock = DeterministicClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
        clock.advance(Duration::from_millis(150));
        assert_eq!(clock.now(), Duration::from_millis(150));
        clock.set(Duration::MAX);
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::MAX);
    }
}
