#![forbid(unsafe_code)]

//! Reorder synchronizer: lifecycle plus the drop pipeline.
//!
//! # State machine
//!
//! ```text
//! Unbound --bind()--> Bound --container_updated()--> Unbound --bind()--> Bound
//!    \                  |
//!     `--teardown()-----`--teardown()--> Terminal (idempotent)
//! ```
//!
//! # Invariants
//!
//! 1. The live binding count equals the number of lanes found by the last
//!    bind; a rebind releases every previous binding first.
//! 2. A drop is reconciled before it is offered to the emitter, so the DOM is
//!    back in its pre-drag shape whenever an intent is sent.
//! 3. Rebind and teardown abandon an in-flight gesture; it never emits.
//! 4. Nothing is observed after teardown.

use tracing::{debug, debug_span, warn};

use crate::backend::DragBackend;
use crate::config::{SyncConfig, SyncConfigError};
use crate::detector::{
    DragGestureDetector, GestureDispatch, GestureIgnoredReason, GesturePhase, LaneBinding,
};
use crate::dom::ContainerDom;
use crate::emitter::{EmitOutcome, IntentSink, MoveIntentEmitter};
use crate::model::{MoveIntent, NodeId};
use crate::reconcile::{ReconcileOutcome, ReconciliationPolicy};

/// Raw drag signal pushed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSignal {
    /// Pointer went down on `grabbed`, inside `item`, inside `lane`.
    Start {
        lane: NodeId,
        item: NodeId,
        grabbed: NodeId,
    },
    /// The placeholder moved into `lane`.
    Over { lane: NodeId },
    /// Pointer released; `to` is `None` outside every lane.
    Drop {
        item: NodeId,
        to: Option<NodeId>,
        new_index: usize,
    },
    Cancel,
}

/// Lifecycle state of one synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Unbound,
    Bound,
    Terminal,
}

/// Per-container state owned by the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynchronizerState {
    pub container: NodeId,
    pub bound_lanes: Vec<LaneBinding>,
}

/// Everything one signal caused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncDispatch {
    pub gesture: GestureDispatch,
    /// Present only when the signal completed a gesture.
    pub reconcile: Option<ReconcileOutcome>,
    pub emit: Option<EmitOutcome>,
}

impl SyncDispatch {
    fn gesture_only(gesture: GestureDispatch) -> Self {
        Self {
            gesture,
            reconcile: None,
            emit: None,
        }
    }

    /// Intent sent by this dispatch, if any.
    #[must_use]
    pub fn intent(&self) -> Option<&MoveIntent> {
        self.emit.as_ref().and_then(EmitOutcome::intent)
    }
}

/// Drag-and-drop reorder synchronizer for one mounted container.
#[derive(Debug)]
pub struct ReorderSynchronizer<D, B, S> {
    config: SyncConfig,
    detector: DragGestureDetector,
    policy: ReconciliationPolicy,
    emitter: MoveIntentEmitter,
    dom: D,
    backend: B,
    sink: S,
    state: SynchronizerState,
    phase: LifecyclePhase,
}

impl<D, B, S> ReorderSynchronizer<D, B, S>
where
    D: ContainerDom,
    B: DragBackend,
    S: IntentSink,
{
    /// Create an unbound synchronizer for `container`.
    pub fn new(
        config: SyncConfig,
        container: NodeId,
        dom: D,
        backend: B,
        sink: S,
    ) -> Result<Self, SyncConfigError> {
        config.validate()?;
        Ok(Self {
            detector: DragGestureDetector::new(&config),
            policy: ReconciliationPolicy::new(&config),
            emitter: MoveIntentEmitter::new(&config),
            config,
            dom,
            backend,
            sink,
            state: SynchronizerState {
                container,
                bound_lanes: Vec::new(),
            },
            phase: LifecyclePhase::Unbound,
        })
    }

    /// View mounted: bind to the current lanes.
    pub fn mount(&mut self) -> usize {
        self.bind()
    }

    /// Attach the drag library to every lane currently in the container.
    ///
    /// Returns the bound lane count. From `Bound` this rebinds; from
    /// `Terminal` it does nothing.
    pub fn bind(&mut self) -> usize {
        let _span = debug_span!(
            target: "lanesync::sync",
            "lanesync.bind",
            container = %self.state.container
        )
        .entered();
        match self.phase {
            LifecyclePhase::Terminal => {
                debug!(target: "lanesync::sync", "bind after teardown ignored");
                return 0;
            }
            LifecyclePhase::Bound => self.release(Release::Rebind),
            LifecyclePhase::Unbound => {}
        }
        self.state.bound_lanes =
            self.detector
                .bind(&self.dom, &mut self.backend, self.state.container);
        self.phase = LifecyclePhase::Bound;
        debug!(
            target: "lanesync::sync",
            lanes = self.state.bound_lanes.len(),
            "lanes bound"
        );
        self.state.bound_lanes.len()
    }

    /// The authoritative layer re-rendered the container: tear down every
    /// binding, rescan, rebind. Returns the new bound lane count.
    pub fn container_updated(&mut self) -> usize {
        if self.phase == LifecyclePhase::Terminal {
            debug!(target: "lanesync::sync", "container update after teardown ignored");
            return 0;
        }
        self.release(Release::Rebind);
        self.bind()
    }

    /// View unmounted: release everything. Returns `false` when already
    /// torn down.
    pub fn teardown(&mut self) -> bool {
        if self.phase == LifecyclePhase::Terminal {
            return false;
        }
        self.release(Release::Teardown);
        self.phase = LifecyclePhase::Terminal;
        debug!(
            target: "lanesync::sync",
            container = %self.state.container,
            "synchronizer torn down"
        );
        true
    }

    /// Feed one drag signal through detection, reconciliation and emission.
    pub fn handle(&mut self, signal: DragSignal) -> SyncDispatch {
        let _span = debug_span!(target: "lanesync::sync", "lanesync.dispatch", ?signal).entered();
        if self.phase != LifecyclePhase::Bound {
            return SyncDispatch::gesture_only(GestureDispatch::ignored(
                phase_of(&signal),
                GestureIgnoredReason::NotBound,
                None,
                None,
            ));
        }
        let bindings = &self.state.bound_lanes;
        match signal {
            DragSignal::Start {
                lane,
                item,
                grabbed,
            } => SyncDispatch::gesture_only(
                self.detector
                    .drag_start(&self.dom, bindings, lane, item, grabbed),
            ),
            DragSignal::Over { lane } => {
                SyncDispatch::gesture_only(self.detector.drag_over(&self.dom, bindings, lane))
            }
            DragSignal::Cancel => SyncDispatch::gesture_only(self.detector.cancel()),
            DragSignal::Drop {
                item,
                to,
                new_index,
            } => {
                let gesture = self
                    .detector
                    .drag_end(&self.dom, bindings, item, to, new_index);
                let Some(record) = gesture.record().cloned() else {
                    return SyncDispatch::gesture_only(gesture);
                };
                let reconcile = self.policy.apply(&mut self.dom, &record);
                let emit = self.emitter.emit(&mut self.sink, &record);
                SyncDispatch {
                    gesture,
                    reconcile: Some(reconcile),
                    emit: Some(emit),
                }
            }
        }
    }

    fn release(&mut self, cause: Release) {
        if let Some(sequence) = self.detector.abandon() {
            match cause {
                Release::Rebind => warn!(
                    target: "lanesync::sync",
                    sequence,
                    "in-flight gesture abandoned by rebind"
                ),
                Release::Teardown => debug!(
                    target: "lanesync::sync",
                    sequence,
                    "in-flight gesture dropped at teardown"
                ),
            }
        }
        let bindings = std::mem::take(&mut self.state.bound_lanes);
        let released = self.detector.unbind(&mut self.backend, bindings);
        if self.phase == LifecyclePhase::Bound {
            self.phase = LifecyclePhase::Unbound;
        }
        debug!(target: "lanesync::sync", released, ?cause, "lane bindings released");
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    #[must_use]
    pub const fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    #[must_use]
    pub fn state(&self) -> &SynchronizerState {
        &self.state
    }

    #[must_use]
    pub fn bound_lane_count(&self) -> usize {
        self.state.bound_lanes.len()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.detector.is_dragging()
    }

    #[must_use]
    pub const fn emitted_count(&self) -> u64 {
        self.emitter.emitted_count()
    }

    #[must_use]
    pub fn dom(&self) -> &D {
        &self.dom
    }

    /// Mutable DOM access, for hosts applying the authoritative re-render
    /// before calling [`container_updated`](Self::container_updated).
    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable backend access, for hosts draining binding events.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Tear down and hand back the collaborators.
    pub fn into_parts(mut self) -> (D, B, S) {
        self.teardown();
        (self.dom, self.backend, self.sink)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Release {
    Rebind,
    Teardown,
}

fn phase_of(signal: &DragSignal) -> GesturePhase {
    match signal {
        DragSignal::Start { .. } => GesturePhase::Start,
        DragSignal::Over { .. } => GesturePhase::Over,
        DragSignal::Drop { .. } => GesturePhase::Drop,
        DragSignal::Cancel => GesturePhase::Cancel,
    }
}
