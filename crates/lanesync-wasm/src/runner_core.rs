#![forbid(unsafe_code)]

//! Platform-independent runner core wrapping one `ReorderSynchronizer`.
//!
//! This module contains the logic shared between the wasm-bindgen exports
//! and the native test harness. No JS/WASM types here.

use core::fmt;

use lanesync_core::{
    ContainerDom, DragOptions, DragSignal, GestureIgnoredReason, GestureLogOutcome, GesturePhase, ItemKind,
    MoveIntent, NodeId, PushEvent, ReconcileDecision, ReorderSynchronizer, SkipReason, SyncConfig,
    SyncConfigError, SyncDispatch,
};
use lanesync_web::{
    BackendEvent, DebouncedSave, DeterministicClock, DomMutation, DragSimulator, Element,
    HostMessage, HostMessageError, MemoryDom, RecordingDragBackend, WebDomError,
    parse_host_message,
};
use tracing::debug;
use web_time::Duration;

type Synchronizer = ReorderSynchronizer<MemoryDom, RecordingDragBackend, Vec<PushEvent>>;

/// Errors surfaced to the host.
#[derive(Debug)]
pub enum RunnerError {
    /// No container has been loaded yet.
    NotLoaded,
    Config(SyncConfigError),
    Host(HostMessageError),
    Dom(WebDomError),
    /// The container snapshot was not valid JSON.
    Snapshot(String),
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotLoaded => write!(f, "no container loaded"),
            Self::Config(err) => write!(f, "config: {err}"),
            Self::Host(err) => write!(f, "host message: {err}"),
            Self::Dom(err) => write!(f, "dom: {err}"),
            Self::Snapshot(msg) => write!(f, "container snapshot: {msg}"),
        }
    }
}

impl std::error::Error for RunnerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Host(err) => Some(err),
            Self::Dom(err) => Some(err),
            Self::NotLoaded | Self::Snapshot(_) => None,
        }
    }
}

impl From<SyncConfigError> for RunnerError {
    fn from(err: SyncConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<HostMessageError> for RunnerError {
    fn from(err: HostMessageError) -> Self {
        Self::Host(err)
    }
}

impl From<WebDomError> for RunnerError {
    fn from(err: WebDomError) -> Self {
        Self::Dom(err)
    }
}

/// Structural work the host must mirror onto the real document and drag
/// library, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomCommand {
    CreateBinding {
        handle: u64,
        lane: NodeId,
        options: DragOptions,
    },
    DestroyBinding {
        handle: u64,
        lane: NodeId,
    },
    InsertBefore {
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    },
}

/// Host-facing summary of one drag signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureSummary {
    pub phase: GesturePhase,
    pub sequence: Option<u64>,
    pub ignored: Option<GestureIgnoredReason>,
    pub decision: Option<ReconcileDecision>,
    pub restored: Option<bool>,
    pub intent: Option<MoveIntent>,
    pub skipped: Option<SkipReason>,
}

impl GestureSummary {
    fn from_dispatch(dispatch: &SyncDispatch) -> Self {
        let ignored = match dispatch.gesture.log.outcome {
            GestureLogOutcome::Forwarded => None,
            GestureLogOutcome::Ignored(reason) => Some(reason),
        };
        let skipped = match &dispatch.emit {
            Some(lanesync_core::EmitOutcome::Skipped(reason)) => Some(*reason),
            _ => None,
        };
        Self {
            phase: dispatch.gesture.log.phase,
            sequence: dispatch.gesture.log.sequence,
            ignored,
            decision: dispatch.reconcile.map(|outcome| outcome.decision),
            restored: dispatch.reconcile.map(|outcome| outcome.restored),
            intent: dispatch.intent().cloned(),
            skipped,
        }
    }

    #[must_use]
    pub const fn accepted(&self) -> bool {
        self.ignored.is_none()
    }
}

/// Host-facing outcome of one host message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Gesture(GestureSummary),
    Rebound { lanes: usize },
    TornDown { released: bool },
    /// Unknown message kind.
    Unsupported,
}

/// Everything the host must act on after a call, in application order:
/// apply `dom_commands` to the document first, then relay `push_events`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outbox {
    pub dom_commands: Vec<DomCommand>,
    pub push_events: Vec<PushEvent>,
}

/// Platform-independent runner for one board.
pub struct RunnerCore {
    config: SyncConfig,
    sync: Option<Synchronizer>,
    clock: DeterministicClock,
    save: DebouncedSave,
    pending_pushes: Vec<PushEvent>,
    dom_commands: Vec<DomCommand>,
    /// Structured JSONL log lines, one per signal.
    logs: Vec<String>,
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
impl RunnerCore {
    /// Runner using the built-in profile for `kind`.
    #[must_use]
    pub fn new(kind: ItemKind) -> Self {
        Self {
            config: SyncConfig::for_kind(kind),
            sync: None,
            clock: DeterministicClock::new(),
            save: DebouncedSave::new(true),
            pending_pushes: Vec::new(),
            dom_commands: Vec::new(),
            logs: Vec::new(),
        }
    }

    /// Runner with a custom configuration.
    pub fn with_config(config: SyncConfig) -> Result<Self, RunnerError> {
        config.validate()?;
        let mut runner = Self::new(config.kind);
        runner.config = config;
        Ok(runner)
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Replace the document with `container`; returns the container node.
    ///
    /// A previously loaded board is torn down first.
    pub fn load_container(&mut self, container: &Element) -> Result<NodeId, RunnerError> {
        self.teardown();
        let (dom, node) = MemoryDom::from_element(container);
        let sync = ReorderSynchronizer::new(
            self.config.clone(),
            node,
            dom,
            RecordingDragBackend::new(),
            Vec::new(),
        )?;
        self.sync = Some(sync);
        debug!(target: "lanesync::wasm", container = %node, "container loaded");
        Ok(node)
    }

    pub fn load_container_json(&mut self, json: &str) -> Result<NodeId, RunnerError> {
        let element: Element =
            serde_json::from_str(json).map_err(|e| RunnerError::Snapshot(e.to_string()))?;
        self.load_container(&element)
    }

    /// Bind to the loaded container's lanes.
    pub fn mount(&mut self) -> Result<usize, RunnerError> {
        let lanes = self.sync_mut()?.mount();
        self.flush();
        Ok(lanes)
    }

    /// The authoritative layer re-rendered. `content`, when given, replaces
    /// the container's children first.
    pub fn container_updated(&mut self, content: Option<&Element>) -> Result<usize, RunnerError> {
        let sync = self.sync_mut()?;
        if let Some(content) = content {
            let container = sync.state().container;
            sync.dom_mut()
                .replace_children(container, &content.children)?;
        }
        let lanes = sync.container_updated();
        self.flush();
        Ok(lanes)
    }

    /// Parse and apply one host message.
    pub fn dispatch_json(&mut self, json: &str) -> Result<DispatchOutcome, RunnerError> {
        let Some(message) = parse_host_message(json)? else {
            return Ok(DispatchOutcome::Unsupported);
        };
        match message {
            HostMessage::Signal(signal) => {
                self.mirror_drop(signal)?;
                let dispatch = self.sync_mut()?.handle(signal);
                let summary = GestureSummary::from_dispatch(&dispatch);
                self.logs.push(log_line(&summary));
                self.flush();
                Ok(DispatchOutcome::Gesture(summary))
            }
            HostMessage::ContainerUpdated(content) => {
                let lanes = self.container_updated(content.as_ref())?;
                Ok(DispatchOutcome::Rebound { lanes })
            }
            HostMessage::Teardown => Ok(DispatchOutcome::TornDown {
                released: self.teardown(),
            }),
        }
    }

    /// Release every binding. Returns `false` when nothing was mounted.
    pub fn teardown(&mut self) -> bool {
        let released = self.sync.as_mut().is_some_and(|sync| sync.teardown());
        self.flush();
        released
    }

    #[must_use]
    pub fn bound_lane_count(&self) -> usize {
        self.sync.as_ref().map_or(0, |sync| sync.bound_lane_count())
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.sync.as_ref().is_some_and(|sync| sync.is_dragging())
    }

    #[must_use]
    pub fn dom(&self) -> Option<&MemoryDom> {
        self.sync.as_ref().map(|sync| sync.dom())
    }

    /// Node of the item carrying `item_id`.
    #[must_use]
    pub fn find_item(&self, item_id: &str) -> Option<NodeId> {
        let sync = self.sync.as_ref()?;
        sync.dom()
            .find_by_attribute(sync.state().container, &self.config.item_id_attr, item_id)
    }

    /// Node of the lane carrying `state_id`.
    #[must_use]
    pub fn find_lane(&self, state_id: &str) -> Option<NodeId> {
        let sync = self.sync.as_ref()?;
        sync.dom()
            .find_by_attribute(sync.state().container, &self.config.lane_id_attr, state_id)
    }

    /// Drag handle inside `item`.
    #[must_use]
    pub fn find_handle(&self, item: NodeId) -> Option<NodeId> {
        self.dom()?.first_marked(item, &self.config.handle_marker)
    }

    /// Lane node currently holding `item`.
    #[must_use]
    pub fn lane_of(&self, item: NodeId) -> Option<NodeId> {
        self.dom()?.parent(item)
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.save.set_editable(editable);
    }

    /// Editor content changed; returns whether a save is scheduled.
    pub fn editor_changed(&mut self, markdown: &str, previous: &str) -> bool {
        self.save
            .content_changed(self.clock.now(), markdown, previous)
    }

    pub fn advance_time_ms(&mut self, dt_ms: f64) {
        if let Ok(dt) = Duration::try_from_secs_f64(dt_ms / 1000.0) {
            self.clock.advance(dt);
        }
        if let Some(event) = self.save.poll(self.clock.now()) {
            self.pending_pushes.push(event);
        }
    }

    /// Push events for the authoritative layer, oldest first.
    pub fn drain_push_events(&mut self) -> Vec<PushEvent> {
        let mut events = self
            .sync
            .as_mut()
            .map(|sync| std::mem::take(sync.sink_mut()))
            .unwrap_or_default();
        events.append(&mut self.pending_pushes);
        events
    }

    pub fn drain_dom_commands(&mut self) -> Vec<DomCommand> {
        std::mem::take(&mut self.dom_commands)
    }

    /// Drain both queues at once so restores cannot trail their intent.
    pub fn drain_outbox(&mut self) -> Outbox {
        Outbox {
            dom_commands: self.drain_dom_commands(),
            push_events: self.drain_push_events(),
        }
    }

    pub fn take_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.logs)
    }

    /// The drag library has already moved the element in the real document;
    /// replay that move on the mirror so reconciliation reads the same tree.
    fn mirror_drop(&mut self, signal: DragSignal) -> Result<(), RunnerError> {
        let DragSignal::Drop {
            item,
            to: Some(lane),
            new_index,
        } = signal
        else {
            return Ok(());
        };
        let simulator = DragSimulator::new(&self.config);
        let sync = self.sync_mut()?;
        if !sync.is_dragging() {
            return Ok(());
        }
        if let Err(err) = simulator.hover(sync.dom_mut(), item, lane, new_index) {
            debug!(
                target: "lanesync::wasm",
                %item,
                %lane,
                %err,
                "drop relocation not mirrored"
            );
        }
        Ok(())
    }

    fn sync_mut(&mut self) -> Result<&mut Synchronizer, RunnerError> {
        self.sync.as_mut().ok_or(RunnerError::NotLoaded)
    }

    /// Move binding changes and engine writes into the command outbox.
    fn flush(&mut self) {
        let Some(sync) = self.sync.as_mut() else {
            return;
        };
        for event in sync.backend_mut().drain_events() {
            self.dom_commands.push(match event {
                BackendEvent::Created {
                    handle,
                    lane,
                    options,
                } => DomCommand::CreateBinding {
                    handle: handle.get(),
                    lane,
                    options,
                },
                BackendEvent::Destroyed { handle, lane } => DomCommand::DestroyBinding {
                    handle: handle.get(),
                    lane,
                },
            });
        }
        for mutation in sync.dom_mut().drain_mutations() {
            let DomMutation::InsertBefore {
                parent,
                node,
                reference,
            } = mutation;
            self.dom_commands.push(DomCommand::InsertBefore {
                parent,
                node,
                reference,
            });
        }
    }
}

#[must_use]
pub fn phase_label(phase: GesturePhase) -> &'static str {
    match phase {
        GesturePhase::Start => "drag_start",
        GesturePhase::Over => "drag_over",
        GesturePhase::Drop => "drop",
        GesturePhase::Cancel => "cancel",
    }
}

#[must_use]
pub fn ignored_reason_label(reason: GestureIgnoredReason) -> &'static str {
    match reason {
        GestureIgnoredReason::NotBound => "not_bound",
        GestureIgnoredReason::UnknownLane => "unknown_lane",
        GestureIgnoredReason::UnboundLane => "unbound_lane",
        GestureIgnoredReason::NotDraggable => "not_draggable",
        GestureIgnoredReason::MissingHandle => "missing_handle",
        GestureIgnoredReason::GestureInFlight => "gesture_in_flight",
        GestureIgnoredReason::NoActiveGesture => "no_active_gesture",
        GestureIgnoredReason::ItemMismatch => "item_mismatch",
    }
}

#[must_use]
pub fn skip_reason_label(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::SameLane => "same_lane",
        SkipReason::MissingItemId => "missing_item_id",
        SkipReason::MissingLaneId => "missing_lane_id",
        SkipReason::AlreadyEmitted => "already_emitted",
    }
}

#[must_use]
pub fn decision_label(decision: ReconcileDecision) -> &'static str {
    match decision {
        ReconcileDecision::Revert { .. } => "revert",
        ReconcileDecision::Reflect => "reflect",
        ReconcileDecision::Defer => "defer",
    }
}

fn log_line(summary: &GestureSummary) -> String {
    serde_json::json!({
        "event": "lanesync.signal",
        "phase": phase_label(summary.phase),
        "sequence": summary.sequence,
        "outcome": summary.ignored.map_or("forwarded", ignored_reason_label),
        "decision": summary.decision.map(decision_label),
        "intent": summary.intent.as_ref().map(|intent| serde_json::json!({
            "item_id": intent.item_id.as_str(),
            "new_lane_id": intent.new_lane_id.as_str(),
        })),
        "skipped": summary.skipped.map(skip_reason_label),
    })
    .to_string()
}
