#![forbid(unsafe_code)]

//! LaneSync public facade crate.
//!
//! Re-exports the reorder synchronizer and, with the default `web` feature,
//! the in-memory host building blocks. Most code only needs the prelude:
//!
//! ```
//! use lanesync::prelude::*;
//!
//! let config = SyncConfig::for_kind(ItemKind::Task);
//! let board = BoardMarkup::new(&config).lane("1", &["t7"]).lane("2", &[]).build();
//! let (dom, container) = MemoryDom::from_element(&board);
//! let mut sync = ReorderSynchronizer::new(
//!     config,
//!     container,
//!     dom,
//!     RecordingDragBackend::new(),
//!     Vec::<PushEvent>::new(),
//! )?;
//! assert_eq!(sync.mount(), 2);
//! # Ok::<(), lanesync::Error>(())
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use lanesync_core::{
    BindingHandle, ContainerDom, DragBackend, DragOptions, DragSignal, EmitOutcome,
    GestureIgnoredReason, GesturePhase, IntentSink, ItemId, ItemKind, LaneId, LifecyclePhase,
    Marker, MoveIntent, NodeId, PushEvent, PushTarget, ReconcileDecision, ReorderSynchronizer,
    SkipReason, SyncConfig, SyncConfigError, SyncDispatch, SynchronizerState,
};

// --- Web re-exports --------------------------------------------------------

#[cfg(feature = "web")]
pub use lanesync_web::{
    BoardMarkup, ClearOnSubmit, ClipboardCopy, ClipboardError, ClipboardWriter, DebouncedSave,
    DeterministicClock, DragSimulator, DropTarget, Element, MemoryClipboard, MemoryDom,
    RecordingDragBackend, WebDomError,
};

#[cfg(feature = "input-parser")]
pub use lanesync_web::{HostMessage, HostMessageError, parse_host_message};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for LaneSync hosts.
#[derive(Debug)]
pub enum Error {
    /// Rejected synchronizer configuration.
    Config(SyncConfigError),
    /// In-memory document operation failed.
    #[cfg(feature = "web")]
    Dom(WebDomError),
    /// Malformed host message.
    #[cfg(feature = "input-parser")]
    Host(HostMessageError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            #[cfg(feature = "web")]
            Self::Dom(err) => write!(f, "{err}"),
            #[cfg(feature = "input-parser")]
            Self::Host(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            #[cfg(feature = "web")]
            Self::Dom(err) => Some(err),
            #[cfg(feature = "input-parser")]
            Self::Host(err) => Some(err),
        }
    }
}

impl From<SyncConfigError> for Error {
    fn from(err: SyncConfigError) -> Self {
        Self::Config(err)
    }
}

#[cfg(feature = "web")]
impl From<WebDomError> for Error {
    fn from(err: WebDomError) -> Self {
        Self::Dom(err)
    }
}

#[cfg(feature = "input-parser")]
impl From<HostMessageError> for Error {
    fn from(err: HostMessageError) -> Self {
        Self::Host(err)
    }
}

/// Standard result type for LaneSync APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        DragSignal, Error, ItemKind, LifecyclePhase, MoveIntent, NodeId, PushEvent, PushTarget,
        ReorderSynchronizer, Result, SyncConfig,
    };

    #[cfg(feature = "web")]
    pub use crate::{BoardMarkup, DragSimulator, DropTarget, MemoryDom, RecordingDragBackend};

    pub use crate::core;
    #[cfg(feature = "web")]
    pub use crate::web;
}

pub use lanesync_core as core;
#[cfg(feature = "web")]
pub use lanesync_web as web;
