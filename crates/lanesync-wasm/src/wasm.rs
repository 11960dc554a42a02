#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for the LaneSyncRunner.
//!
//! This module wraps [`super::runner_core::RunnerCore`] with JS-friendly types.
//! Only compiled on `wasm32` targets.

use js_sys::{Array, Object, Reflect};
use lanesync_core::{ItemKind, Marker, NodeId, PushEvent, PushTarget, ReconcileDecision};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use super::runner_core::{
    DispatchOutcome, DomCommand, GestureSummary, Outbox, RunnerCore, RunnerError, decision_label,
    ignored_reason_label, phase_label, skip_reason_label,
};

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

fn set_js(obj: &Object, key: &str, value: JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), &value);
}

fn node_to_js(node: NodeId) -> JsValue {
    JsValue::from_f64(node.get() as f64)
}

fn optional_node_to_js(node: Option<NodeId>) -> JsValue {
    node.map_or(JsValue::NULL, node_to_js)
}

fn error_to_js(err: &RunnerError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn marker_to_js(marker: &Marker) -> JsValue {
    JsValue::from_str(&marker.to_string())
}

fn target_label(target: PushTarget) -> &'static str {
    match target {
        PushTarget::Hook => "hook",
        PushTarget::View => "view",
    }
}

fn push_event_to_js(event: &PushEvent) -> JsValue {
    let obj = Object::new();
    set_js(&obj, "event", JsValue::from_str(&event.event));
    set_js(&obj, "target", JsValue::from_str(target_label(event.target)));
    let payload = js_sys::JSON::parse(&event.payload.to_string()).unwrap_or(JsValue::NULL);
    set_js(&obj, "payload", payload);
    obj.into()
}

fn dom_command_to_js(command: &DomCommand) -> JsValue {
    let obj = Object::new();
    match command {
        DomCommand::CreateBinding {
            handle,
            lane,
            options,
        } => {
            set_js(&obj, "op", JsValue::from_str("create_binding"));
            set_js(&obj, "handle", JsValue::from_f64(*handle as f64));
            set_js(&obj, "lane", node_to_js(*lane));
            let opts = Object::new();
            set_js(&opts, "group", JsValue::from_str(&options.group));
            set_js(&opts, "handle", marker_to_js(&options.handle));
            set_js(&opts, "draggable", marker_to_js(&options.draggable));
            set_js(
                &opts,
                "animation",
                JsValue::from_f64(f64::from(options.animation_ms)),
            );
            set_js(&opts, "ghostClass", JsValue::from_str(&options.ghost_class));
            set_js(&obj, "options", opts.into());
        }
        DomCommand::DestroyBinding { handle, lane } => {
            set_js(&obj, "op", JsValue::from_str("destroy_binding"));
            set_js(&obj, "handle", JsValue::from_f64(*handle as f64));
            set_js(&obj, "lane", node_to_js(*lane));
        }
        DomCommand::InsertBefore {
            parent,
            node,
            reference,
        } => {
            set_js(&obj, "op", JsValue::from_str("insert_before"));
            set_js(&obj, "parent", node_to_js(*parent));
            set_js(&obj, "node", node_to_js(*node));
            set_js(&obj, "reference", optional_node_to_js(*reference));
        }
    }
    obj.into()
}

fn outbox_to_js(outbox: &Outbox) -> JsValue {
    let obj = Object::new();
    let commands: Array = outbox.dom_commands.iter().map(dom_command_to_js).collect();
    let pushes: Array = outbox.push_events.iter().map(push_event_to_js).collect();
    set_js(&obj, "domCommands", commands.into());
    set_js(&obj, "pushEvents", pushes.into());
    obj.into()
}

fn gesture_to_js(summary: &GestureSummary) -> JsValue {
    let obj = Object::new();
    set_js(&obj, "kind", JsValue::from_str("gesture"));
    set_js(&obj, "accepted", summary.accepted().into());
    set_js(&obj, "phase", JsValue::from_str(phase_label(summary.phase)));
    set_js(
        &obj,
        "sequence",
        summary
            .sequence
            .map_or(JsValue::NULL, |seq| JsValue::from_f64(seq as f64)),
    );
    set_js(
        &obj,
        "ignored",
        summary
            .ignored
            .map_or(JsValue::NULL, |reason| {
                JsValue::from_str(ignored_reason_label(reason))
            }),
    );
    set_js(
        &obj,
        "decision",
        summary
            .decision
            .map_or(JsValue::NULL, |decision| {
                JsValue::from_str(decision_label(decision))
            }),
    );
    if let Some(ReconcileDecision::Revert { lane, index }) = summary.decision {
        set_js(&obj, "revert_lane", node_to_js(lane));
        set_js(&obj, "revert_index", JsValue::from_f64(index as f64));
    }
    set_js(
        &obj,
        "restored",
        summary.restored.map_or(JsValue::NULL, JsValue::from_bool),
    );
    let intent = summary.intent.as_ref().map_or(JsValue::NULL, |intent| {
        let js = Object::new();
        set_js(&js, "item_id", JsValue::from_str(intent.item_id.as_str()));
        set_js(
            &js,
            "new_lane_id",
            JsValue::from_str(intent.new_lane_id.as_str()),
        );
        js.into()
    });
    set_js(&obj, "intent", intent);
    set_js(
        &obj,
        "skipped",
        summary
            .skipped
            .map_or(JsValue::NULL, |reason| JsValue::from_str(skip_reason_label(reason))),
    );
    obj.into()
}

fn outcome_to_js(outcome: &DispatchOutcome) -> JsValue {
    match outcome {
        DispatchOutcome::Gesture(summary) => gesture_to_js(summary),
        DispatchOutcome::Rebound { lanes } => {
            let obj = Object::new();
            set_js(&obj, "kind", JsValue::from_str("rebound"));
            set_js(&obj, "lanes", JsValue::from_f64(*lanes as f64));
            obj.into()
        }
        DispatchOutcome::TornDown { released } => {
            let obj = Object::new();
            set_js(&obj, "kind", JsValue::from_str("torn_down"));
            set_js(&obj, "released", (*released).into());
            obj.into()
        }
        DispatchOutcome::Unsupported => {
            let obj = Object::new();
            set_js(&obj, "kind", JsValue::from_str("unsupported"));
            obj.into()
        }
    }
}

/// WASM runner for one drag-and-drop board.
///
/// Host-driven: JavaScript forwards drag-library callbacks as JSON messages,
/// mirrors the returned DOM commands, and relays push events upstream.
///
/// After a drop the host must apply every `insert_before` command before it
/// relays the matching push event, so the authoritative re-render patches a
/// document already back in its pre-drag shape. `drainOutbox()` returns both
/// queues from one call for exactly that order.
#[wasm_bindgen]
pub struct LaneSyncRunner {
    inner: RunnerCore,
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
}

#[wasm_bindgen]
impl LaneSyncRunner {
    /// Create a runner for `"task"` or `"todo"` boards.
    #[wasm_bindgen(constructor)]
    pub fn new(kind: &str) -> Result<LaneSyncRunner, JsValue> {
        install_panic_hook();
        let kind = ItemKind::from_label(kind)
            .ok_or_else(|| JsValue::from_str(&format!("unknown board kind: {kind}")))?;
        Ok(Self {
            inner: RunnerCore::new(kind),
        })
    }

    /// Load the container snapshot; returns the container node id.
    #[wasm_bindgen(js_name = loadContainer)]
    pub fn load_container(&mut self, json: &str) -> Result<f64, JsValue> {
        self.inner
            .load_container_json(json)
            .map(|node| node.get() as f64)
            .map_err(|err| error_to_js(&err))
    }

    /// Bind every lane; returns the bound lane count.
    pub fn mount(&mut self) -> Result<u32, JsValue> {
        self.inner
            .mount()
            .map(|lanes| u32::try_from(lanes).unwrap_or(u32::MAX))
            .map_err(|err| error_to_js(&err))
    }

    /// The server re-rendered the board. `json`, when given, is the new
    /// container snapshot.
    #[wasm_bindgen(js_name = containerUpdated)]
    pub fn container_updated(&mut self, json: Option<String>) -> Result<u32, JsValue> {
        let content = match json {
            Some(json) => Some(
                serde_json::from_str::<lanesync_web::Element>(&json)
                    .map_err(|err| JsValue::from_str(&format!("container snapshot: {err}")))?,
            ),
            None => None,
        };
        self.inner
            .container_updated(content.as_ref())
            .map(|lanes| u32::try_from(lanes).unwrap_or(u32::MAX))
            .map_err(|err| error_to_js(&err))
    }

    /// Apply one JSON host message and describe what it did.
    pub fn dispatch(&mut self, json: &str) -> JsValue {
        match self.inner.dispatch_json(json) {
            Ok(outcome) => outcome_to_js(&outcome),
            Err(err) => {
                let obj = Object::new();
                set_js(&obj, "kind", JsValue::from_str("error"));
                set_js(&obj, "error", error_to_js(&err));
                obj.into()
            }
        }
    }

    /// `{ domCommands, pushEvents }`; apply `domCommands` first.
    #[wasm_bindgen(js_name = drainOutbox)]
    pub fn drain_outbox(&mut self) -> JsValue {
        outbox_to_js(&self.inner.drain_outbox())
    }

    /// Prefer `drainOutbox()`; relay these only after `drainDomCommands()`
    /// has been applied.
    #[wasm_bindgen(js_name = drainPushEvents)]
    pub fn drain_push_events(&mut self) -> Array {
        self.inner
            .drain_push_events()
            .iter()
            .map(push_event_to_js)
            .collect()
    }

    #[wasm_bindgen(js_name = drainDomCommands)]
    pub fn drain_dom_commands(&mut self) -> Array {
        self.inner
            .drain_dom_commands()
            .iter()
            .map(dom_command_to_js)
            .collect()
    }

    /// Structured JSONL logs since the last call.
    #[wasm_bindgen(js_name = takeLogs)]
    pub fn take_logs(&mut self) -> Array {
        self.inner
            .take_logs()
            .into_iter()
            .map(|line| JsValue::from_str(&line))
            .collect()
    }

    pub fn teardown(&mut self) -> bool {
        self.inner.teardown()
    }

    #[wasm_bindgen(js_name = findItem)]
    pub fn find_item(&self, item_id: &str) -> Option<f64> {
        self.inner.find_item(item_id).map(|node| node.get() as f64)
    }

    #[wasm_bindgen(js_name = findLane)]
    pub fn find_lane(&self, state_id: &str) -> Option<f64> {
        self.inner.find_lane(state_id).map(|node| node.get() as f64)
    }

    #[wasm_bindgen(js_name = findHandle)]
    pub fn find_handle(&self, item: f64) -> Option<f64> {
        self.inner
            .find_handle(NodeId::new(item as u64))
            .map(|node| node.get() as f64)
    }

    #[wasm_bindgen(js_name = isDragging)]
    pub fn is_dragging(&self) -> bool {
        self.inner.is_dragging()
    }

    #[wasm_bindgen(js_name = setEditable)]
    pub fn set_editable(&mut self, editable: bool) {
        self.inner.set_editable(editable);
    }

    /// Markdown editor content changed.
    #[wasm_bindgen(js_name = editorChanged)]
    pub fn editor_changed(&mut self, markdown: &str, previous: &str) -> bool {
        self.inner.editor_changed(markdown, previous)
    }

    /// Advance the deterministic clock by `dt_ms` milliseconds.
    #[wasm_bindgen(js_name = advanceTime)]
    pub fn advance_time(&mut self, dt_ms: f64) {
        self.inner.advance_time_ms(dt_ms);
    }
}
