#![forbid(unsafe_code)]

//! Small page behaviours that live next to the board but share no state
//! with the synchronizer. Each is driven by the host clock and polled.

use std::fmt;

use lanesync_core::{ContainerDom, NodeId, PushEvent, PushTarget};
use tracing::debug;
use web_time::Duration;

use crate::memory_dom::{MemoryDom, WebDomError};

/// Event pushed when editor content settles.
pub const SAVE_EVENT: &str = "save-description";
/// Quiet period before a save fires.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(1000);
/// How long the copy button shows its confirmation.
pub const COPIED_LABEL_HOLD: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingSave {
    due: Duration,
    content: String,
}

/// Debounced description save for the markdown editor.
#[derive(Debug, Clone)]
pub struct DebouncedSave {
    delay: Duration,
    editable: bool,
    pending: Option<PendingSave>,
    destroyed: bool,
}

impl DebouncedSave {
    #[must_use]
    pub fn new(editable: bool) -> Self {
        Self {
            delay: SAVE_DEBOUNCE,
            editable,
            pending: None,
            destroyed: false,
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    /// The editor reported new markdown. Returns whether a save is now
    /// scheduled; any earlier pending save is replaced.
    pub fn content_changed(&mut self, now: Duration, markdown: &str, previous: &str) -> bool {
        if self.destroyed || !self.editable || markdown == previous {
            return false;
        }
        self.pending = Some(PendingSave {
            due: now.saturating_add(self.delay),
            content: markdown.to_owned(),
        });
        true
    }

    /// When the pending save will fire.
    #[must_use]
    pub fn pending_deadline(&self) -> Option<Duration> {
        self.pending.as_ref().map(|pending| pending.due)
    }

    /// Fire the pending save if its quiet period has elapsed.
    pub fn poll(&mut self, now: Duration) -> Option<PushEvent> {
        if now < self.pending_deadline()? {
            return None;
        }
        let pending = self.pending.take()?;
        debug!(
            target: "lanesync::web",
            bytes = pending.content.len(),
            "description save fired"
        );
        Some(PushEvent {
            event: SAVE_EVENT.to_owned(),
            target: PushTarget::View,
            payload: serde_json::json!({ "content": pending.content }),
        })
    }

    /// Editor unmounted: drop the pending save.
    pub fn destroy(&mut self) {
        self.pending = None;
        self.destroyed = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardError {
    /// The host refused clipboard access.
    Denied,
    Unavailable,
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Denied => write!(f, "clipboard write denied"),
            Self::Unavailable => write!(f, "clipboard unavailable"),
        }
    }
}

impl std::error::Error for ClipboardError {}

/// The host's asynchronous clipboard, resolved synchronously here.
pub trait ClipboardWriter {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Clipboard that keeps the last write in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    contents: Option<String>,
    denied: bool,
}

impl MemoryClipboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clipboard that rejects every write.
    #[must_use]
    pub fn denying() -> Self {
        Self {
            contents: None,
            denied: true,
        }
    }

    #[must_use]
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl ClipboardWriter for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.denied {
            return Err(ClipboardError::Denied);
        }
        self.contents = Some(text.to_owned());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingRevert {
    due: Duration,
    label: String,
}

/// Copy-to-clipboard button.
#[derive(Debug, Clone)]
pub struct ClipboardCopy {
    button: NodeId,
    target: Option<NodeId>,
    pending: Option<PendingRevert>,
}

impl ClipboardCopy {
    /// `target` is the node the button's target selector resolved to.
    #[must_use]
    pub fn new(button: NodeId, target: Option<NodeId>) -> Self {
        Self {
            button,
            target,
            pending: None,
        }
    }

    /// Button clicked. Returns the copied text, or `None` when the target
    /// is gone.
    ///
    /// The target's value wins unless it is empty, then its text. A second
    /// click while the confirmation shows keeps the first original label.
    pub fn click<W: ClipboardWriter + ?Sized>(
        &mut self,
        dom: &mut MemoryDom,
        clipboard: &mut W,
        now: Duration,
    ) -> Result<Option<String>, ClipboardError> {
        let Some(target) = self.target.filter(|target| dom.contains(*target)) else {
            return Ok(None);
        };
        let text = dom
            .value(target)
            .filter(|value| !value.is_empty())
            .or_else(|| dom.text(target))
            .unwrap_or_default()
            .to_owned();
        clipboard.write_text(&text)?;

        let Some(label) = dom.text(self.button).map(str::to_owned) else {
            return Ok(Some(text));
        };
        let original = self
            .pending
            .take()
            .map_or_else(|| label.clone(), |pending| pending.label);
        if dom
            .set_text(self.button, label.replacen("Copy", "Copied!", 1))
            .is_ok()
        {
            self.pending = Some(PendingRevert {
                due: now.saturating_add(COPIED_LABEL_HOLD),
                label: original,
            });
        }
        Ok(Some(text))
    }

    /// Restore the button label once the confirmation has been shown long
    /// enough. Returns whether it was restored.
    pub fn poll(&mut self, dom: &mut MemoryDom, now: Duration) -> bool {
        match &self.pending {
            Some(pending) if now >= pending.due => {}
            _ => return false,
        }
        let Some(pending) = self.pending.take() else {
            return false;
        };
        dom.set_text(self.button, pending.label).is_ok()
    }
}

/// Clears a text input on the frame after its form submits.
#[derive(Debug, Clone)]
pub struct ClearOnSubmit {
    input: NodeId,
    scheduled: bool,
}

impl ClearOnSubmit {
    #[must_use]
    pub fn new(input: NodeId) -> Self {
        Self {
            input,
            scheduled: false,
        }
    }

    /// The owning form submitted.
    pub fn submit(&mut self) {
        self.scheduled = true;
    }

    #[must_use]
    pub const fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Next animation frame. Returns whether the input was cleared.
    pub fn animation_frame(&mut self, dom: &mut MemoryDom) -> Result<bool, WebDomError> {
        if !std::mem::take(&mut self.scheduled) {
            return Ok(false);
        }
        dom.set_value(self.input, "")?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_dom::Element;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn save_fires_after_quiet_period_with_latest_content() {
        let mut save = DebouncedSave::new(true);
        assert!(save.content_changed(ms(0), "a", ""));
        assert!(save.content_changed(ms(400), "ab", "a"));
        assert_eq!(save.poll(ms(1000)), None);
        let event = save.poll(ms(1400)).expect("save due");
        assert_eq!(event.event, "save-description");
        assert_eq!(event.payload, serde_json::json!({ "content": "ab" }));
        assert_eq!(save.poll(ms(5000)), None);
    }

    #[test]
    fn read_only_or_unchanged_content_is_not_saved() {
        let mut save = DebouncedSave::new(false);
        assert!(!save.content_changed(ms(0), "a", ""));
        save.set_editable(true);
        assert!(!save.content_changed(ms(0), "same", "same"));
        assert_eq!(save.pending_deadline(), None);
    }

    #[test]
    fn destroy_cancels_pending_save() {
        let mut save = DebouncedSave::new(true).with_delay(ms(10));
        save.content_changed(ms(0), "a", "");
        save.destroy();
        assert_eq!(save.poll(ms(100)), None);
        assert!(!save.content_changed(ms(200), "b", "a"));
    }

    fn copy_fixture(value: &str, text: &str) -> (MemoryDom, NodeId, NodeId) {
        let mut dom = MemoryDom::new();
        let root = dom.root();
        let source = dom
            .append(root, &Element::new("input").value(value).text(text))
            .expect("root exists");
        let button = dom
            .append(root, &Element::new("button").text("Copy link"))
            .expect("root exists");
        (dom, source, button)
    }

    #[test]
    fn copy_prefers_value_and_confirms_then_reverts() {
        let (mut dom, source, button) = copy_fixture("https://x", "ignored");
        let mut clipboard = MemoryClipboard::new();
        let mut copy = ClipboardCopy::new(button, Some(source));
        let copied = copy.click(&mut dom, &mut clipboard, ms(0)).expect("allowed");
        assert_eq!(copied.as_deref(), Some("https://x"));
        assert_eq!(clipboard.contents(), Some("https://x"));
        assert_eq!(dom.text(button), Some("Copied! link"));
        copy.click(&mut dom, &mut clipboard, ms(1500)).expect("allowed");
        assert!(!copy.poll(&mut dom, ms(2000)));
        assert!(copy.poll(&mut dom, ms(3500)));
        assert_eq!(dom.text(button), Some("Copy link"));
    }

    #[test]
    fn empty_value_falls_back_to_text() {
        let (mut dom, source, button) = copy_fixture("", "plain text");
        let mut clipboard = MemoryClipboard::new();
        let mut copy = ClipboardCopy::new(button, Some(source));
        copy.click(&mut dom, &mut clipboard, ms(0)).expect("allowed");
        assert_eq!(clipboard.contents(), Some("plain text"));
    }

    #[test]
    fn missing_target_or_denied_write_leaves_label() {
        let (mut dom, source, button) = copy_fixture("v", "");
        let mut copy = ClipboardCopy::new(button, None);
        assert_eq!(copy.click(&mut dom, &mut MemoryClipboard::new(), ms(0)), Ok(None));

        let mut copy = ClipboardCopy::new(button, Some(source));
        let denied = copy.click(&mut dom, &mut MemoryClipboard::denying(), ms(0));
        assert_eq!(denied, Err(ClipboardError::Denied));
        assert_eq!(dom.text(button), Some("Copy link"));
    }

    #[test]
    fn submit_clears_input_on_next_frame_only() {
        let mut dom = MemoryDom::new();
        let input = dom
            .append(dom.root(), &Element::new("input").value("new todo"))
            .expect("root exists");
        let mut clear = ClearOnSubmit::new(input);
        assert_eq!(clear.animation_frame(&mut dom), Ok(false));
        clear.submit();
        assert!(clear.is_scheduled());
        assert_eq!(dom.value(input), Some("new todo"));
        assert_eq!(clear.animation_frame(&mut dom), Ok(true));
        assert_eq!(dom.value(input), Some(""));
        assert_eq!(clear.animation_frame(&mut dom), Ok(false));
    }
}
