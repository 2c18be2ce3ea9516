//! Synthetic DOM-style events delivered to element listeners.

use crate::dom::NodeId;
use std::fmt;
use std::rc::Rc;
use strum::{AsRefStr, Display, EnumString};

/// Event listener attached to an element.
pub type Listener = Rc<dyn Fn(&mut Event)>;

/// Event type, named as in the DOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum EventKind {
    PointerOver,
    PointerEnter,
    PointerMove,
    PointerDown,
    PointerUp,
    PointerOut,
    PointerLeave,
    MouseOver,
    MouseEnter,
    MouseMove,
    MouseDown,
    MouseUp,
    MouseOut,
    MouseLeave,
    Click,
    DblClick,
    Focus,
    FocusIn,
    Blur,
    FocusOut,
    KeyDown,
    KeyPress,
    KeyUp,
    Input,
    Change,
    Submit,
}

impl EventKind {
    /// Whether the event propagates to ancestors after the target.
    pub fn bubbles(self) -> bool {
        !matches!(
            self,
            Self::PointerEnter
                | Self::PointerLeave
                | Self::MouseEnter
                | Self::MouseLeave
                | Self::Focus
                | Self::Blur
        )
    }
}

/// Named (non-printable) keys understood by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
pub enum NamedKey {
    Enter,
    Backspace,
    Escape,
    Tab,
}

/// A keyboard key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Character(char),
    Named(NamedKey),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Character(c) => write!(f, "{c}"),
            Self::Named(named) => write!(f, "{named}"),
        }
    }
}

/// Split typed text into keys.
///
/// `{enter}`, `{backspace}`, `{esc}`/`{escape}` and `{tab}` become named
/// keys; any other braced text is typed literally.
pub fn parse_keys(text: &str) -> Vec<Key> {
    let mut keys = Vec::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if c == '{'
            && let Some(end) = rest.find('}')
            && let Some(named) = named_key(&rest[1..end])
        {
            keys.push(Key::Named(named));
            rest = &rest[end + 1..];
            continue;
        }
        keys.push(Key::Character(c));
        rest = &rest[c.len_utf8()..];
    }

    keys
}

fn named_key(name: &str) -> Option<NamedKey> {
    match name.to_ascii_lowercase().as_str() {
        "enter" => Some(NamedKey::Enter),
        "backspace" => Some(NamedKey::Backspace),
        "esc" | "escape" => Some(NamedKey::Escape),
        "tab" => Some(NamedKey::Tab),
        _ => None,
    }
}

/// An event in flight.
///
/// Listeners receive `&mut Event` and may cancel the default action or
/// stop propagation to ancestors.
#[derive(Debug, Clone)]
pub struct Event {
    kind: EventKind,
    target: NodeId,
    current_target: NodeId,
    key: Option<Key>,
    data: Option<String>,
    value: Option<String>,
    detail: u32,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl Event {
    pub(crate) fn new(kind: EventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            current_target: target,
            key: None,
            data: None,
            value: None,
            detail: 0,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub(crate) fn with_key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    pub(crate) fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub(crate) fn with_value(mut self, value: Option<String>) -> Self {
        self.value = value;
        self
    }

    pub(crate) fn with_detail(mut self, detail: u32) -> Self {
        self.detail = detail;
        self
    }

    pub(crate) fn set_current_target(&mut self, node: NodeId) {
        self.current_target = node;
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Element whose listener is running.
    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    /// Key for keyboard events.
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Inserted text for `input` events.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// Value of the target control when the event was dispatched.
    pub fn target_value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Click count for click events.
    pub fn detail(&self) -> u32 {
        self.detail
    }

    /// Cancel the default action (focus, submit, label forwarding).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether a listener cancelled the default action.
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Stop delivery to further ancestors.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}
