#![forbid(unsafe_code)]

//! WASM runner for LaneSync boards.
//!
//! This crate provides [`LaneSyncRunner`], a `wasm-bindgen`-exported struct
//! that wraps one `lanesync_core::ReorderSynchronizer` over an in-memory
//! mirror of the board. The host forwards drag-library callbacks as JSON
//! messages, applies the returned DOM commands to the real document, and
//! relays push events to the authoritative layer.

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::LaneSyncRunner;

// Runner core is used by the wasm module and by native tests.
#[cfg(any(target_arch = "wasm32", test))]
mod runner_core;

#[cfg(test)]
mod tests {
    use crate::runner_core::{DispatchOutcome, DomCommand, Outbox, RunnerCore, RunnerError};
    use lanesync_core::{
        GestureIgnoredReason, GesturePhase, ItemKind, NodeId, PushTarget, ReconcileDecision,
        SkipReason, SyncConfig,
    };
    use lanesync_web::{BoardMarkup, Element};
    use pretty_assertions::assert_eq;

    fn board_json(kind: ItemKind, lanes: &[(&str, &[&str])]) -> String {
        let config = SyncConfig::for_kind(kind);
        let mut markup = BoardMarkup::new(&config);
        for (state, items) in lanes {
            markup = markup.lane(state, items);
        }
        serde_json::to_string(&markup.build()).expect("element serializes")
    }

    fn mounted(kind: ItemKind, lanes: &[(&str, &[&str])]) -> RunnerCore {
        let mut core = RunnerCore::new(kind);
        core.load_container_json(&board_json(kind, lanes))
            .expect("snapshot should load");
        assert_eq!(core.mount().expect("loaded"), lanes.len());
        core.drain_dom_commands();
        core
    }

    /// Drive a full pick-hover-drop through JSON messages.
    fn drag(core: &mut RunnerCore, item_id: &str, to_state: &str, index: usize) -> DispatchOutcome {
        let item = core.find_item(item_id).expect("item rendered");
        let handle = core.find_handle(item).expect("handle rendered");
        let from = core.lane_of(item).expect("item attached");
        let to = core.find_lane(to_state).expect("lane rendered");
        let start = format!(
            r#"{{"kind":"drag_start","item":{},"grabbed":{},"lane":{}}}"#,
            item.get(),
            handle.get(),
            from.get()
        );
        let over = format!(r#"{{"kind":"drag_over","lane":{}}}"#, to.get());
        let drop = format!(
            r#"{{"kind":"drop","item":{},"to":{},"new_index":{index}}}"#,
            item.get(),
            to.get()
        );
        for json in [start, over] {
            let Ok(DispatchOutcome::Gesture(summary)) = core.dispatch_json(&json) else {
                panic!("gesture message should dispatch: {json}");
            };
            assert!(summary.accepted(), "{summary:?}");
        }
        core.dispatch_json(&drop).expect("drop should dispatch")
    }

    #[test]
    fn dispatch_before_load_is_an_error() {
        let mut core = RunnerCore::new(ItemKind::Task);
        assert!(matches!(core.mount(), Err(RunnerError::NotLoaded)));
        assert!(matches!(
            core.dispatch_json(r#"{"kind":"cancel"}"#),
            Err(RunnerError::NotLoaded)
        ));
        assert!(!core.teardown());
    }

    #[test]
    fn malformed_inputs_are_reported() {
        let mut core = RunnerCore::new(ItemKind::Task);
        assert!(matches!(
            core.load_container_json("{"),
            Err(RunnerError::Snapshot(_))
        ));
        assert!(matches!(
            core.dispatch_json("not json"),
            Err(RunnerError::Host(_))
        ));
        assert_eq!(
            core.dispatch_json(r#"{"kind":"hover"}"#).expect("parses"),
            DispatchOutcome::Unsupported
        );
    }

    #[test]
    fn mount_emits_one_binding_per_lane() {
        let mut core = RunnerCore::new(ItemKind::Task);
        core.load_container_json(&board_json(ItemKind::Task, &[("1", &["t1"]), ("2", &[])]))
            .expect("snapshot should load");
        assert_eq!(core.mount().expect("loaded"), 2);
        let commands = core.drain_dom_commands();
        assert_eq!(commands.len(), 2);
        for (command, state) in commands.iter().zip(["1", "2"]) {
            let DomCommand::CreateBinding { lane, options, .. } = command else {
                panic!("expected binding, got {command:?}");
            };
            assert_eq!(Some(*lane), core.find_lane(state));
            assert_eq!(options.group, "tasks");
            assert_eq!(options.handle.to_string(), ".task-drag-handle");
        }
        assert_eq!(core.bound_lane_count(), 2);
    }

    #[test]
    fn cross_lane_drop_restores_and_pushes_intent() {
        let mut core = mounted(ItemKind::Task, &[("1", &["t1", "t2"]), ("2", &["t3"])]);
        let item = core.find_item("t1").expect("rendered");
        let origin = core.find_lane("1").expect("rendered");
        let next = core.find_item("t2").expect("rendered");

        let DispatchOutcome::Gesture(summary) = drag(&mut core, "t1", "2", 0) else {
            panic!("drop should be a gesture");
        };
        assert_eq!(summary.phase, GesturePhase::Drop);
        assert_eq!(
            summary.decision,
            Some(ReconcileDecision::Revert {
                lane: origin,
                index: 0
            })
        );
        assert_eq!(summary.restored, Some(true));
        let intent = summary.intent.expect("cross-lane drop emits");
        assert_eq!(intent.item_id.as_str(), "t1");
        assert_eq!(intent.new_lane_id.as_str(), "2");
        assert_eq!(core.lane_of(item), Some(origin));
        assert!(!core.is_dragging());

        assert_eq!(
            core.drain_dom_commands(),
            vec![DomCommand::InsertBefore {
                parent: origin,
                node: item,
                reference: Some(next),
            }]
        );
        let pushes = core.drain_push_events();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].event, "task-moved");
        assert_eq!(pushes[0].target, PushTarget::Hook);
        assert_eq!(
            pushes[0].payload,
            serde_json::json!({"task_id": "t1", "new_state_id": "2"})
        );
        assert!(core.drain_push_events().is_empty());
    }

    fn lane_order(core: &RunnerCore, state_id: &str) -> Vec<String> {
        let lane = core.find_lane(state_id).expect("lane rendered");
        core.dom()
            .expect("loaded")
            .child_attributes(lane, &core.config().item_id_attr)
    }

    #[test]
    fn same_lane_reorder_is_mirrored_for_the_next_revert() {
        let mut core = mounted(ItemKind::Task, &[("1", &["a", "b", "c"]), ("2", &[])]);
        let DispatchOutcome::Gesture(summary) = drag(&mut core, "a", "1", 2) else {
            panic!("drop should be a gesture");
        };
        assert_eq!(summary.decision, Some(ReconcileDecision::Reflect));
        assert!(core.drain_dom_commands().is_empty());
        assert_eq!(lane_order(&core, "1"), ["b", "c", "a"]);

        let origin = core.find_lane("1").expect("rendered");
        let moved = core.find_item("c").expect("rendered");
        let after = core.find_item("a").expect("rendered");
        let DispatchOutcome::Gesture(summary) = drag(&mut core, "c", "2", 0) else {
            panic!("drop should be a gesture");
        };
        assert_eq!(
            summary.decision,
            Some(ReconcileDecision::Revert {
                lane: origin,
                index: 1
            })
        );
        assert_eq!(
            core.drain_dom_commands(),
            vec![DomCommand::InsertBefore {
                parent: origin,
                node: moved,
                reference: Some(after),
            }]
        );
        assert_eq!(lane_order(&core, "1"), ["b", "c", "a"]);
        assert!(lane_order(&core, "2").is_empty());
    }

    #[test]
    fn drop_without_gesture_leaves_mirror_alone() {
        let mut core = mounted(ItemKind::Task, &[("1", &["a", "b"])]);
        let item = core.find_item("a").expect("rendered");
        let json = format!(
            r#"{{"kind":"drop","item":{},"to":{},"new_index":1}}"#,
            item.get(),
            core.find_lane("1").expect("rendered").get()
        );
        let Ok(DispatchOutcome::Gesture(summary)) = core.dispatch_json(&json) else {
            panic!("drop should dispatch");
        };
        assert_eq!(summary.ignored, Some(GestureIgnoredReason::NoActiveGesture));
        assert_eq!(lane_order(&core, "1"), ["a", "b"]);
    }

    #[test]
    fn outbox_carries_restore_alongside_intent() {
        let mut core = mounted(ItemKind::Task, &[("1", &["t1", "t2"]), ("2", &[])]);
        drag(&mut core, "t1", "2", 0);
        let Outbox {
            dom_commands,
            push_events,
        } = core.drain_outbox();
        assert!(matches!(
            dom_commands.as_slice(),
            [DomCommand::InsertBefore { .. }]
        ));
        assert_eq!(push_events.len(), 1);
        assert_eq!(push_events[0].event, "task-moved");
        assert_eq!(core.drain_outbox(), Outbox::default());
    }

    #[test]
    fn same_lane_drop_emits_nothing() {
        let mut core = mounted(ItemKind::Todo, &[("1", &["a", "b"]), ("2", &[])]);
        let DispatchOutcome::Gesture(summary) = drag(&mut core, "a", "1", 1) else {
            panic!("drop should be a gesture");
        };
        assert_eq!(summary.intent, None);
        assert_eq!(summary.skipped, Some(SkipReason::SameLane));
        assert!(core.drain_push_events().is_empty());
    }

    #[test]
    fn todo_intent_targets_the_view() {
        let mut core = mounted(ItemKind::Todo, &[("1", &["a"]), ("2", &[])]);
        drag(&mut core, "a", "2", 0);
        let pushes = core.drain_push_events();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].event, "todo-moved");
        assert_eq!(pushes[0].target, PushTarget::View);
        assert_eq!(
            pushes[0].payload,
            serde_json::json!({"todo_id": "a", "new_state_id": "2"})
        );
    }

    #[test]
    fn ignored_signal_is_summarized() {
        let mut core = mounted(ItemKind::Task, &[("1", &["t1"])]);
        let outcome = core
            .dispatch_json(r#"{"kind":"cancel"}"#)
            .expect("parses");
        let DispatchOutcome::Gesture(summary) = outcome else {
            panic!("cancel should be a gesture");
        };
        assert!(!summary.accepted());
        assert_eq!(summary.ignored, Some(GestureIgnoredReason::NoActiveGesture));
    }

    #[test]
    fn container_updated_rebinds_new_lanes() {
        let mut core = mounted(ItemKind::Task, &[("1", &["t1"]), ("2", &[])]);
        let fresh: Element = serde_json::from_str(&board_json(
            ItemKind::Task,
            &[("1", &[]), ("2", &["t1"]), ("3", &[])],
        ))
        .expect("snapshot parses");
        let json = serde_json::json!({"kind": "container_updated", "container": fresh});
        assert_eq!(
            core.dispatch_json(&json.to_string()).expect("parses"),
            DispatchOutcome::Rebound { lanes: 3 }
        );
        let commands = core.drain_dom_commands();
        let destroyed = commands
            .iter()
            .filter(|c| matches!(c, DomCommand::DestroyBinding { .. }))
            .count();
        let created = commands
            .iter()
            .filter(|c| matches!(c, DomCommand::CreateBinding { .. }))
            .count();
        assert_eq!((destroyed, created), (2, 3));
        assert!(core.find_lane("3").is_some());
        let item = core.find_item("t1").expect("re-rendered");
        assert_eq!(core.lane_of(item), core.find_lane("2"));
    }

    #[test]
    fn teardown_releases_once() {
        let mut core = mounted(ItemKind::Task, &[("1", &["t1"]), ("2", &[])]);
        assert_eq!(
            core.dispatch_json(r#"{"kind":"teardown"}"#).expect("parses"),
            DispatchOutcome::TornDown { released: true }
        );
        assert_eq!(core.drain_dom_commands().len(), 2);
        assert!(!core.teardown());
        assert!(core.drain_dom_commands().is_empty());
        assert_eq!(core.bound_lane_count(), 0);

        let item = core.find_item("t1").expect("still rendered");
        let json = format!(
            r#"{{"kind":"drop","item":{},"to":null,"new_index":0}}"#,
            item.get()
        );
        let Ok(DispatchOutcome::Gesture(summary)) = core.dispatch_json(&json) else {
            panic!("drop should dispatch");
        };
        assert_eq!(summary.ignored, Some(GestureIgnoredReason::NotBound));
    }

    #[test]
    fn reloading_tears_down_previous_board() {
        let mut core = mounted(ItemKind::Task, &[("1", &["t1"])]);
        let container = core
            .load_container_json(&board_json(ItemKind::Task, &[("9", &[])]))
            .expect("snapshot loads");
        assert_eq!(container, NodeId::new(1));
        assert!(matches!(
            core.drain_dom_commands().as_slice(),
            [DomCommand::DestroyBinding { .. }]
        ));
        assert_eq!(core.bound_lane_count(), 0);
        assert!(core.find_item("t1").is_none());
    }

    #[test]
    fn description_save_is_debounced() {
        let mut core = RunnerCore::new(ItemKind::Task);
        assert!(core.editor_changed("# a", ""));
        core.advance_time_ms(600.0);
        assert!(core.editor_changed("# ab", "# a"));
        core.advance_time_ms(600.0);
        assert!(core.drain_push_events().is_empty());
        core.advance_time_ms(400.0);
        let pushes = core.drain_push_events();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].event, "save-description");
        assert_eq!(pushes[0].payload, serde_json::json!({"content": "# ab"}));

        core.set_editable(false);
        assert!(!core.editor_changed("# abc", "# ab"));
        core.advance_time_ms(f64::NAN);
        core.advance_time_ms(-5.0);
        assert!(core.drain_push_events().is_empty());
    }

    #[test]
    fn logs_are_jsonl_per_signal() {
        let mut core = mounted(ItemKind::Task, &[("1", &["t1"]), ("2", &[])]);
        drag(&mut core, "t1", "2", 0);
        let logs = core.take_logs();
        assert_eq!(logs.len(), 3);
        let last: serde_json::Value = serde_json::from_str(&logs[2]).expect("valid json");
        assert_eq!(last["event"], "lanesync.signal");
        assert_eq!(last["phase"], "drop");
        assert_eq!(last["outcome"], "forwarded");
        assert_eq!(last["decision"], "revert");
        assert_eq!(last["intent"]["new_lane_id"], "2");
        assert!(core.take_logs().is_empty());
    }

    #[test]
    fn custom_config_is_validated() {
        let mut config = SyncConfig::for_kind(ItemKind::Task);
        config.event_name.clear();
        assert!(matches!(
            RunnerCore::with_config(config),
            Err(RunnerError::Config(_))
        ));
        let core = RunnerCore::with_config(SyncConfig::for_kind(ItemKind::Todo)).expect("valid");
        assert_eq!(core.config().kind, ItemKind::Todo);
    }
}
