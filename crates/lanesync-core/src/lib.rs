// Forbid unsafe in production; deny in tests.
#![cfg_attr(not(test), forbid(unsafe_code))]
#![cfg_attr(test, deny(unsafe_code))]

//! Core: lane model, gesture detection, reconciliation, and move intents.
//!
//! # Role in LaneSync
//! `lanesync-core` is the reorder synchronization engine. It lets a user drag
//! an item between lanes while an external authoritative layer remains the
//! only writer of final placement.
//!
//! # Primary responsibilities
//! - **DragGestureDetector**: binds the drag library to every lane and turns
//!   raw drag signals into [`GestureRecord`](model::GestureRecord)s.
//! - **ReconciliationPolicy**: moves the dragged element back to its origin
//!   so the authoritative re-render is the only source of final placement.
//! - **MoveIntentEmitter**: emits at most one move intent per cross-lane
//!   gesture.
//! - **ReorderSynchronizer**: owns bind/rebind/teardown and runs every drop
//!   through reconciliation before emission.
//!
//! # How it fits in the system
//! The engine never touches a browser directly. The host implements
//! [`ContainerDom`](dom::ContainerDom), [`DragBackend`](backend::DragBackend)
//! and [`IntentSink`](emitter::IntentSink); `lanesync-web` ships in-memory
//! implementations of all three.

pub mod backend;
pub mod config;
pub mod detector;
pub mod dom;
pub mod emitter;
pub mod model;
pub mod reconcile;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

pub use backend::{BindingHandle, DragBackend, DragOptions};
pub use config::{PushTarget, SyncConfig, SyncConfigError};
pub use detector::{
    DragGestureDetector, GestureDispatch, GestureEvent, GestureIgnoredReason, GestureLogEntry,
    GestureLogOutcome, GesturePhase, LaneBinding,
};
pub use dom::{ContainerDom, Marker, MarkerParseError};
pub use emitter::{EmitOutcome, IntentSink, MoveIntentEmitter, SkipReason};
pub use model::{GestureRecord, ItemId, ItemKind, LaneId, MoveIntent, NodeId, PushEvent};
pub use reconcile::{ReconcileDecision, ReconcileOutcome, ReconciliationPolicy};
pub use sync::{DragSignal, LifecyclePhase, ReorderSynchronizer, SyncDispatch, SynchronizerState};
