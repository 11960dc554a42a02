#![forbid(unsafe_code)]

//! Synchronizer configuration: markup contract, drag options, and the shape
//! of the outbound move event.
//!
//! Two built-in profiles mirror the boards the engine is mounted on:
//!
//! | field | task | todo |
//! |-------|------|------|
//! | group | `tasks` | `todos` |
//! | handle | `.task-drag-handle` | `.todo-drag-handle` |
//! | item | `.task-item` | `.todo-item` |
//! | id attribute | `data-task-id` | `data-todo-id` |
//! | event | `task-moved` | `todo-moved` |
//! | payload key | `task_id` | `todo_id` |
//! | push target | hook element | view |
//!
//! # Loading
//!
//! ```toml
//! kind = "todo"
//! animation_ms = 200
//! ```
//!
//! ```rust,ignore
//! let config = SyncConfig::from_toml_file("lanesync.toml")?;
//! let config = SyncConfig::from_json_str(json)?;
//! ```
//!
//! Fields omitted from a file fall back to the profile named by `kind`
//! (task when `kind` is omitted too).

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backend::DragOptions;
use crate::dom::Marker;
use crate::model::ItemKind;

/// Where the authoritative layer should route a push event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushTarget {
    /// Scoped to the element the synchronizer is mounted on.
    Hook,
    /// Delivered to the enclosing view.
    View,
}

/// Full synchronizer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    pub kind: ItemKind,
    /// Drag group shared by every lane in the container.
    pub group: String,
    pub lane_marker: Marker,
    pub lane_id_attr: String,
    pub item_marker: Marker,
    pub handle_marker: Marker,
    pub item_id_attr: String,
    pub animation_ms: u32,
    pub ghost_class: String,
    pub event_name: String,
    pub payload_item_key: String,
    pub payload_lane_key: String,
    pub push_target: PushTarget,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::for_kind(ItemKind::Task)
    }
}

impl SyncConfig {
    /// Built-in profile for `kind`.
    #[must_use]
    pub fn for_kind(kind: ItemKind) -> Self {
        let label = kind.label();
        Self {
            kind,
            group: format!("{label}s"),
            lane_marker: Marker::attribute("data-dropzone"),
            lane_id_attr: "data-state-id".into(),
            item_marker: Marker::class(format!("{label}-item")),
            handle_marker: Marker::class(format!("{label}-drag-handle")),
            item_id_attr: format!("data-{label}-id"),
            animation_ms: 150,
            ghost_class: "opacity-50".into(),
            event_name: format!("{label}-moved"),
            payload_item_key: format!("{label}_id"),
            payload_lane_key: "new_state_id".into(),
            push_target: match kind {
                ItemKind::Task => PushTarget::Hook,
                ItemKind::Todo => PushTarget::View,
            },
        }
    }

    /// Reject configurations that could never produce a well-formed intent.
    pub fn validate(&self) -> Result<(), SyncConfigError> {
        let required = [
            ("group", self.group.as_str()),
            ("lane_id_attr", self.lane_id_attr.as_str()),
            ("item_id_attr", self.item_id_attr.as_str()),
            ("event_name", self.event_name.as_str()),
            ("payload_item_key", self.payload_item_key.as_str()),
            ("payload_lane_key", self.payload_lane_key.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SyncConfigError::Empty(field));
            }
        }
        if self.payload_item_key == self.payload_lane_key {
            return Err(SyncConfigError::DuplicatePayloadKey(
                self.payload_item_key.clone(),
            ));
        }
        Ok(())
    }

    /// Options handed to the drag library for every lane binding.
    #[must_use]
    pub fn drag_options(&self) -> DragOptions {
        DragOptions {
            group: self.group.clone(),
            handle: self.handle_marker.clone(),
            draggable: self.item_marker.clone(),
            animation_ms: self.animation_ms,
            ghost_class: self.ghost_class.clone(),
        }
    }

    /// Parse from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, SyncConfigError> {
        let file: SyncConfigFile = serde_json::from_str(s).map_err(SyncConfigError::Json)?;
        file.resolve()
    }

    /// Load from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SyncConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(SyncConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Parse from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, SyncConfigError> {
        let file: SyncConfigFile = toml::from_str(s).map_err(SyncConfigError::Toml)?;
        file.resolve()
    }

    /// Load from a TOML file.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, SyncConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(SyncConfigError::Io)?;
        Self::from_toml_str(&content)
    }
}

/// On-disk shape: every field optional, filled from the `kind` profile.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SyncConfigFile {
    kind: Option<ItemKind>,
    group: Option<String>,
    lane_marker: Option<Marker>,
    lane_id_attr: Option<String>,
    item_marker: Option<Marker>,
    handle_marker: Option<Marker>,
    item_id_attr: Option<String>,
    animation_ms: Option<u32>,
    ghost_class: Option<String>,
    event_name: Option<String>,
    payload_item_key: Option<String>,
    payload_lane_key: Option<String>,
    push_target: Option<PushTarget>,
}

impl SyncConfigFile {
    fn resolve(self) -> Result<SyncConfig, SyncConfigError> {
        let base = SyncConfig::for_kind(self.kind.unwrap_or(ItemKind::Task));
        let config = SyncConfig {
            kind: base.kind,
            group: self.group.unwrap_or(base.group),
            lane_marker: self.lane_marker.unwrap_or(base.lane_marker),
            lane_id_attr: self.lane_id_attr.unwrap_or(base.lane_id_attr),
            item_marker: self.item_marker.unwrap_or(base.item_marker),
            handle_marker: self.handle_marker.unwrap_or(base.handle_marker),
            item_id_attr: self.item_id_attr.unwrap_or(base.item_id_attr),
            animation_ms: self.animation_ms.unwrap_or(base.animation_ms),
            ghost_class: self.ghost_class.unwrap_or(base.ghost_class),
            event_name: self.event_name.unwrap_or(base.event_name),
            payload_item_key: self.payload_item_key.unwrap_or(base.payload_item_key),
            payload_lane_key: self.payload_lane_key.unwrap_or(base.payload_lane_key),
            push_target: self.push_target.unwrap_or(base.push_target),
        };
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when building or loading a [`SyncConfig`].
#[derive(Debug)]
pub enum SyncConfigError {
    /// A required string field is empty.
    Empty(&'static str),
    /// Item and lane payload keys collide.
    DuplicatePayloadKey(String),
    /// File I/O error.
    Io(std::io::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
}

impl fmt::Display for SyncConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty(field) => write!(f, "config field `{field}` must not be empty"),
            Self::DuplicatePayloadKey(key) => {
                write!(f, "payload item and lane keys are both `{key}`")
            }
            Self::Io(e) => write!(f, "config I/O error: {e}"),
            Self::Json(e) => write!(f, "config JSON parse error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "config TOML parse error: {e}"),
        }
    }
}

impl std::error::Error for SyncConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            Self::Empty(_) | Self::DuplicatePayloadKey(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_profile_matches_markup_contract() {
        let config = SyncConfig::for_kind(ItemKind::Task);
        assert_eq!(config.group, "tasks");
        assert_eq!(config.handle_marker, Marker::class("task-drag-handle"));
        assert_eq!(config.item_marker, Marker::class("task-item"));
        assert_eq!(config.item_id_attr, "data-task-id");
        assert_eq!(config.lane_marker, Marker::attribute("data-dropzone"));
        assert_eq!(config.lane_id_attr, "data-state-id");
        assert_eq!(config.event_name, "task-moved");
        assert_eq!(config.payload_item_key, "task_id");
        assert_eq!(config.push_target, PushTarget::Hook);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn todo_profile_pushes_to_view() {
        let config = SyncConfig::for_kind(ItemKind::Todo);
        assert_eq!(config.group, "todos");
        assert_eq!(config.item_id_attr, "data-todo-id");
        assert_eq!(config.event_name, "todo-moved");
        assert_eq!(config.payload_item_key, "todo_id");
        assert_eq!(config.push_target, PushTarget::View);
    }

    #[test]
    fn drag_options_carry_profile_markers() {
        let options = SyncConfig::default().drag_options();
        assert_eq!(options.group, "tasks");
        assert_eq!(options.animation_ms, 150);
        assert_eq!(options.ghost_class, "opacity-50");
        assert_eq!(options.draggable, Marker::class("task-item"));
    }

    #[test]
    fn validate_rejects_empty_group() {
        let config = SyncConfig {
            group: "  ".into(),
            ..SyncConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SyncConfigError::Empty("group"))
        ));
    }

    #[test]
    fn validate_rejects_colliding_payload_keys() {
        let config = SyncConfig {
            payload_item_key: "new_state_id".into(),
            ..SyncConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SyncConfigError::DuplicatePayloadKey(_))
        ));
    }

    #[test]
    fn json_fills_missing_fields_from_kind_profile() {
        let config = SyncConfig::from_json_str(r#"{"kind":"todo","animation_ms":200}"#)
            .expect("partial config should parse");
        assert_eq!(config.animation_ms, 200);
        assert_eq!(config.group, "todos");
        assert_eq!(config.event_name, "todo-moved");
    }

    #[test]
    fn json_markers_are_parsed_as_selectors() {
        let config = SyncConfig::from_json_str(r#"{"handle_marker":".grip"}"#)
            .expect("marker should parse");
        assert_eq!(config.handle_marker, Marker::class("grip"));
        assert!(SyncConfig::from_json_str(r#"{"handle_marker":"grip"}"#).is_err());
    }

    #[test]
    fn json_rejects_unknown_fields() {
        let err = SyncConfig::from_json_str(r#"{"reinsert":false}"#)
            .expect_err("unknown fields should be rejected");
        assert!(matches!(err, SyncConfigError::Json(_)));
    }

    #[test]
    fn json_file_missing_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = SyncConfig::from_json_file(dir.path().join("absent.json"))
            .expect_err("missing file should fail");
        assert!(matches!(err, SyncConfigError::Io(_)));
    }

    #[cfg(feature = "config")]
    #[test]
    fn toml_file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lanesync.toml");
        std::fs::write(&path, "kind = \"todo\"\nghost_class = \"ghost\"\n").expect("write");
        let config = SyncConfig::from_toml_file(&path).expect("toml should load");
        assert_eq!(config.kind, ItemKind::Todo);
        assert_eq!(config.ghost_class, "ghost");
        assert_eq!(config.item_marker, Marker::class("todo-item"));
    }
}
