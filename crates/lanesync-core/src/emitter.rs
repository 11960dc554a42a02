#![forbid(unsafe_code)]

//! Move intent emission.
//!
//! A completed gesture yields at most one intent, and only when the origin
//! and destination lane ids differ. Delivery is fire-and-forget: the sink is
//! the authoritative layer's channel and owns any retry.

use tracing::{debug, warn};

use crate::config::{PushTarget, SyncConfig};
use crate::model::{GestureRecord, ItemKind, MoveIntent, PushEvent};

/// Outbound channel to the authoritative layer.
pub trait IntentSink {
    fn push_event(&mut self, event: PushEvent);
}

impl IntentSink for Vec<PushEvent> {
    fn push_event(&mut self, event: PushEvent) {
        self.push(event);
    }
}

impl<S: IntentSink + ?Sized> IntentSink for &mut S {
    fn push_event(&mut self, event: PushEvent) {
        (**self).push_event(event);
    }
}

/// Why a gesture produced no intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    SameLane,
    /// The dragged element carried no item id attribute.
    MissingItemId,
    /// The origin or destination lane carried no state id attribute.
    MissingLaneId,
    /// An intent for this gesture was already sent.
    AlreadyEmitted,
}

/// Result of offering one gesture to the emitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitOutcome {
    Emitted(MoveIntent),
    Skipped(SkipReason),
}

impl EmitOutcome {
    #[must_use]
    pub fn intent(&self) -> Option<&MoveIntent> {
        match self {
            Self::Emitted(intent) => Some(intent),
            Self::Skipped(_) => None,
        }
    }
}

/// Turns gesture records into push events.
#[derive(Debug, Clone)]
pub struct MoveIntentEmitter {
    kind: ItemKind,
    event_name: String,
    payload_item_key: String,
    payload_lane_key: String,
    target: PushTarget,
    last_emitted: Option<u64>,
    emitted: u64,
}

impl MoveIntentEmitter {
    #[must_use]
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            kind: config.kind,
            event_name: config.event_name.clone(),
            payload_item_key: config.payload_item_key.clone(),
            payload_lane_key: config.payload_lane_key.clone(),
            target: config.push_target,
            last_emitted: None,
            emitted: 0,
        }
    }

    /// Intents sent so far.
    #[must_use]
    pub const fn emitted_count(&self) -> u64 {
        self.emitted
    }

    /// Intent implied by `record`, without emitting it.
    pub fn intent_for(&self, record: &GestureRecord) -> Result<MoveIntent, SkipReason> {
        let (Some(from), Some(to)) = (&record.from_lane_id, &record.to_lane_id) else {
            return Err(SkipReason::MissingLaneId);
        };
        if from == to {
            return Err(SkipReason::SameLane);
        }
        let Some(item_id) = &record.item_id else {
            return Err(SkipReason::MissingItemId);
        };
        Ok(MoveIntent {
            kind: self.kind,
            item_id: item_id.clone(),
            new_lane_id: to.clone(),
        })
    }

    /// Wire form of `intent`.
    #[must_use]
    pub fn push_event_for(&self, intent: &MoveIntent) -> PushEvent {
        let mut payload = serde_json::Map::new();
        payload.insert(
            self.payload_item_key.clone(),
            serde_json::Value::String(intent.item_id.as_str().to_owned()),
        );
        payload.insert(
            self.payload_lane_key.clone(),
            serde_json::Value::String(intent.new_lane_id.as_str().to_owned()),
        );
        PushEvent {
            event: self.event_name.clone(),
            target: self.target,
            payload: serde_json::Value::Object(payload),
        }
    }

    /// Send the intent for `record` if it has one and none was sent yet.
    pub fn emit<S: IntentSink + ?Sized>(
        &mut self,
        sink: &mut S,
        record: &GestureRecord,
    ) -> EmitOutcome {
        if self
            .last_emitted
            .is_some_and(|last| record.sequence <= last)
        {
            return EmitOutcome::Skipped(SkipReason::AlreadyEmitted);
        }
        let intent = match self.intent_for(record) {
            Ok(intent) => intent,
            Err(reason) => {
                if matches!(reason, SkipReason::MissingItemId | SkipReason::MissingLaneId) {
                    warn!(
                        target: "lanesync::emit",
                        sequence = record.sequence,
                        ?reason,
                        item = %record.item,
                        from_lane = %record.from_lane,
                        to_lane = %record.to_lane,
                        "malformed binding; move intent skipped"
                    );
                }
                return EmitOutcome::Skipped(reason);
            }
        };
        let event = self.push_event_for(&intent);
        debug!(
            target: "lanesync::emit",
            sequence = record.sequence,
            event = %event.event,
            item_id = %intent.item_id,
            new_lane_id = %intent.new_lane_id,
            "move intent emitted"
        );
        sink.push_event(event);
        self.last_emitted = Some(record.sequence);
        self.emitted = self.emitted.saturating_add(1);
        EmitOutcome::Emitted(intent)
    }
}
