#![no_main]

use arbitrary::Arbitrary;
use lanesync_core::{ContainerDom, DragSignal, NodeId, PushEvent, ReorderSynchronizer, SyncConfig};
use lanesync_web::{BoardMarkup, MemoryDom, RecordingDragBackend};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Start { lane: u8, item: u8, grabbed: u8 },
    Over { lane: u8 },
    Drop { item: u8, to: Option<u8>, index: u8 },
    Cancel,
    Relocate { item: u8, lane: u8 },
    Rebind,
    Teardown,
    Mount,
}

fuzz_target!(|ops: Vec<Op>| {
    let config = SyncConfig::default();
    let board = BoardMarkup::new(&config)
        .lane("1", &["a", "b", "c"])
        .lane("2", &["d"])
        .lane("3", &[])
        .build();
    let (dom, container) = MemoryDom::from_element(&board);
    let node_count = dom.node_count() as u64;
    let Ok(mut sync) = ReorderSynchronizer::new(
        config,
        container,
        dom,
        RecordingDragBackend::new(),
        Vec::<PushEvent>::new(),
    ) else {
        return;
    };
    sync.mount();
    let node = |raw: u8| NodeId::new(u64::from(raw) % node_count);

    for op in ops.into_iter().take(256) {
        let emitted = sync.sink().len();
        match op {
            Op::Start {
                lane,
                item,
                grabbed,
            } => {
                sync.handle(DragSignal::Start {
                    lane: node(lane),
                    item: node(item),
                    grabbed: node(grabbed),
                });
            }
            Op::Over { lane } => {
                sync.handle(DragSignal::Over { lane: node(lane) });
            }
            Op::Drop { item, to, index } => {
                sync.handle(DragSignal::Drop {
                    item: node(item),
                    to: to.map(node),
                    new_index: usize::from(index),
                });
            }
            Op::Cancel => {
                sync.handle(DragSignal::Cancel);
            }
            Op::Relocate { item, lane } => {
                let _ = sync.dom_mut().relocate(node(item), node(lane), None);
            }
            Op::Rebind => {
                sync.container_updated();
            }
            Op::Teardown => {
                sync.teardown();
            }
            Op::Mount => {
                sync.mount();
            }
        }
        assert!(sync.sink().len() <= emitted + 1, "more than one intent per signal");
        assert_eq!(sync.backend().live_count(), sync.bound_lane_count());
        assert!(sync.dom().contains(container));
    }
});
