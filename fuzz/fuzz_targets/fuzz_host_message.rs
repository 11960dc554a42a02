#![no_main]

use lanesync_core::{PushEvent, ReorderSynchronizer, SyncConfig};
use lanesync_web::{
    BoardMarkup, HostMessage, MemoryDom, RecordingDragBackend, parse_host_message,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(Some(message)) = parse_host_message(json) else {
        return;
    };

    let config = SyncConfig::default();
    let board = BoardMarkup::new(&config)
        .lane("1", &["a", "b"])
        .lane("2", &["c"])
        .build();
    let (dom, container) = MemoryDom::from_element(&board);
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

    match message {
        HostMessage::Signal(signal) => {
            sync.handle(signal);
        }
        HostMessage::ContainerUpdated(content) => {
            if let Some(content) = content {
                let _ = sync.dom_mut().replace_children(container, &content.children);
            }
            sync.container_updated();
        }
        HostMessage::Teardown => {
            sync.teardown();
        }
    }

    // Arbitrary node ids must never leave bindings out of step with lanes.
    assert_eq!(sync.backend().live_count(), sync.bound_lane_count());
    assert!(sync.sink().len() <= 1, "one message emitted twice");
});
