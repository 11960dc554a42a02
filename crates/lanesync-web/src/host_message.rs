#![forbid(unsafe_code)]

//! JSON host messages for the synchronizer.
//!
//! The host forwards drag-library callbacks and re-render notifications as
//! small JSON objects tagged by `kind`:
//!
//! ```json
//! {"kind":"drag_start","item":12,"grabbed":13,"lane":11}
//! {"kind":"drag_over","lane":20}
//! {"kind":"drop","item":12,"to":20,"new_index":0}
//! {"kind":"cancel"}
//! {"kind":"container_updated","container":{"tag":"div","children":[]}}
//! {"kind":"teardown"}
//! ```
//!
//! Unknown kinds parse to `Ok(None)`. `container` is optional; when present
//! it replaces the container's children before rebinding.

use lanesync_core::{DragSignal, NodeId};
use serde::Deserialize;

use crate::memory_dom::Element;

/// Errors from parsing a host message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostMessageError {
    /// Malformed JSON.
    Json(String),
    /// Missing required field.
    MissingField(&'static str),
    /// Index does not fit this platform's `usize`.
    IndexOutOfRange(u64),
}

impl core::fmt::Display for HostMessageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "JSON parse error: {msg}"),
            Self::MissingField(field) => write!(f, "missing required field: {field}"),
            Self::IndexOutOfRange(index) => write!(f, "index out of range: {index}"),
        }
    }
}

impl std::error::Error for HostMessageError {}

/// One parsed host message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostMessage {
    Signal(DragSignal),
    /// The authoritative layer re-rendered; carries the new container
    /// content when the host ships it.
    ContainerUpdated(Option<Element>),
    Teardown,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    kind: String,
    #[serde(default)]
    item: Option<u64>,
    #[serde(default)]
    grabbed: Option<u64>,
    #[serde(default)]
    lane: Option<u64>,
    #[serde(default)]
    to: Option<u64>,
    #[serde(default)]
    new_index: Option<u64>,
    #[serde(default)]
    container: Option<Element>,
}

/// Parse one JSON host message.
pub fn parse_host_message(json: &str) -> Result<Option<HostMessage>, HostMessageError> {
    let raw: RawMessage =
        serde_json::from_str(json).map_err(|e| HostMessageError::Json(e.to_string()))?;

    let signal = match raw.kind.as_str() {
        "drag_start" => DragSignal::Start {
            lane: node(raw.lane, "lane")?,
            item: node(raw.item, "item")?,
            grabbed: node(raw.grabbed, "grabbed")?,
        },
        "drag_over" => DragSignal::Over {
            lane: node(raw.lane, "lane")?,
        },
        "drop" => {
            let index = raw
                .new_index
                .ok_or(HostMessageError::MissingField("new_index"))?;
            DragSignal::Drop {
                item: node(raw.item, "item")?,
                to: raw.to.map(NodeId::new),
                new_index: usize::try_from(index)
                    .map_err(|_| HostMessageError::IndexOutOfRange(index))?,
            }
        }
        "cancel" => DragSignal::Cancel,
        "container_updated" => return Ok(Some(HostMessage::ContainerUpdated(raw.container))),
        "teardown" => return Ok(Some(HostMessage::Teardown)),
        _ => return Ok(None),
    };
    Ok(Some(HostMessage::Signal(signal)))
}

fn node(raw: Option<u64>, field: &'static str) -> Result<NodeId, HostMessageError> {
    raw.map(NodeId::new)
        .ok_or(HostMessageError::MissingField(field))
}
