//! Realistic user interactions.
//!
//! Every primitive expands into the event sequence a browser would produce
//! and flushes after each event, so handlers observe intermediate states
//! (the `"a"` before `"ab"`) exactly as they would for a real user.

use crate::aria;
use crate::container::ContainerInner;
use crate::dom::NodeId;
use crate::error::{HarnessError, Result};
use crate::event::{Event, EventKind, Key, NamedKey, parse_keys};
use crate::handle::ElementHandle;
use crate::injection::{EventSequence, Step};
use std::rc::{Rc, Weak};
use tracing::debug;

/// Interaction simulator for one container. Obtain with
/// [`crate::Container::user`].
#[derive(Clone)]
pub struct UserEvent {
    container: Weak<ContainerInner>,
    skip_hover: bool,
}

enum DefaultAction {
    /// Label click forwarded to its control.
    Activate(NodeId),
    Submit(NodeId),
}

impl UserEvent {
    pub(crate) fn new(container: Weak<ContainerInner>) -> Self {
        Self {
            container,
            skip_hover: false,
        }
    }

    /// Omit the pointer-over/enter/move events before clicks.
    pub fn skip_hover(mut self) -> Self {
        self.skip_hover = true;
        self
    }

    fn container(&self, action: &'static str) -> Result<Rc<ContainerInner>> {
        self.container
            .upgrade()
            .filter(|inner| !inner.is_torn_down())
            .ok_or_else(|| HarnessError::invalid_target(action, "container has been unmounted"))
    }

    fn owned(&self, target: &ElementHandle, action: &'static str) -> Result<(Rc<ContainerInner>, NodeId)> {
        let (inner, id) = target.resolve(action)?;
        let mine = self.container(action)?;
        if !Rc::ptr_eq(&mine, &inner) {
            return Err(HarnessError::invalid_target(
                action,
                "element belongs to a different container",
            ));
        }
        Ok((inner, id))
    }

    fn ensure_enabled(inner: &ContainerInner, id: NodeId, action: &'static str) -> Result<()> {
        let doc = inner.document.borrow();
        if aria::is_disabled(&doc, id) {
            return Err(HarnessError::invalid_target(
                action,
                format!("<{}> is disabled", doc.tag(id).unwrap_or_default()),
            ));
        }
        Ok(())
    }

    fn ensure_editable(inner: &ContainerInner, id: NodeId, action: &'static str) -> Result<()> {
        Self::ensure_enabled(inner, id, action)?;
        let doc = inner.document.borrow();
        let tag = doc.tag(id).unwrap_or_default();
        if !aria::is_text_field(&doc, id) {
            return Err(HarnessError::invalid_target(
                action,
                format!("<{tag}> is not an editable text field"),
            ));
        }
        if doc.has_attr(id, "readonly") {
            return Err(HarnessError::invalid_target(
                action,
                format!("<{tag}> is read-only"),
            ));
        }
        Ok(())
    }

    /// Hover, press, focus, release and click.
    pub fn click(&self, target: &ElementHandle) -> Result<()> {
        let (inner, id) = self.owned(target, "click")?;
        Self::ensure_enabled(&inner, id, "click")?;
        debug!(target = %id, "user click");
        self.play(&inner, id, &EventSequence::click(self.skip_hover))
    }

    /// Two clicks followed by `dblclick`.
    pub fn dblclick(&self, target: &ElementHandle) -> Result<()> {
        let (inner, id) = self.owned(target, "double-click")?;
        Self::ensure_enabled(&inner, id, "double-click")?;
        debug!(target = %id, "user double click");
        self.play(&inner, id, &EventSequence::double_click(self.skip_hover))
    }

    /// Pointer over, enter and move.
    pub fn hover(&self, target: &ElementHandle) -> Result<()> {
        let (inner, id) = self.owned(target, "hover")?;
        self.play(&inner, id, &EventSequence::hover())
    }

    /// Pointer out and leave.
    pub fn unhover(&self, target: &ElementHandle) -> Result<()> {
        let (inner, id) = self.owned(target, "unhover")?;
        self.play(&inner, id, &EventSequence::unhover())
    }

    /// Focus the field once, then press each key.
    ///
    /// `{enter}`, `{backspace}`, `{esc}` and `{tab}` are special keys.
    pub fn type_text(&self, target: &ElementHandle, text: &str) -> Result<()> {
        let (inner, id) = self.owned(target, "type into")?;
        Self::ensure_editable(&inner, id, "type into")?;
        debug!(target = %id, text, "user type");

        if inner.document.borrow().focused() != Some(id) {
            inner.move_focus(Some(id))?;
        }
        for key in parse_keys(text) {
            if !inner.document.borrow().is_element(id) {
                return Err(HarnessError::invalid_target(
                    "type into",
                    "element was removed while typing",
                ));
            }
            self.keystroke(&inner, id, key)?;
        }
        Ok(())
    }

    /// Press keys against whatever currently has focus.
    pub fn keyboard(&self, text: &str) -> Result<()> {
        let inner = self.container("press keys in")?;
        for key in parse_keys(text) {
            let target = {
                let doc = inner.document.borrow();
                doc.focused().unwrap_or_else(|| doc.root())
            };
            self.keystroke(&inner, target, key)?;
        }
        Ok(())
    }

    /// Empty a text field with a single `input` event.
    pub fn clear(&self, target: &ElementHandle) -> Result<()> {
        let (inner, id) = self.owned(target, "clear")?;
        Self::ensure_editable(&inner, id, "clear")?;
        inner.move_focus(Some(id))?;

        let had_value = inner
            .document
            .borrow()
            .value(id)
            .is_some_and(|value| !value.is_empty());
        if had_value {
            inner.document.borrow_mut().set_value(id, String::new());
            inner.dispatch(Event::new(EventKind::Input, id))?;
        }
        Ok(())
    }

    /// Move focus to the next element in tab order, wrapping around.
    pub fn tab(&self) -> Result<()> {
        let inner = self.container("tab in")?;
        let from = {
            let doc = inner.document.borrow();
            doc.focused().unwrap_or_else(|| doc.root())
        };
        let tab = Key::Named(NamedKey::Tab);
        let down = inner.dispatch(Event::new(EventKind::KeyDown, from).with_key(tab.clone()))?;
        if !down.is_default_prevented() {
            Self::advance_focus(&inner)?;
        }
        let to = {
            let doc = inner.document.borrow();
            doc.focused().unwrap_or_else(|| doc.root())
        };
        inner.dispatch(Event::new(EventKind::KeyUp, to).with_key(tab))?;
        Ok(())
    }

    fn advance_focus(inner: &ContainerInner) -> Result<()> {
        let next = {
            let doc = inner.document.borrow();
            let order = aria::tab_order(&doc);
            let current = doc
                .focused()
                .and_then(|focused| order.iter().position(|node| *node == focused));
            match current {
                Some(index) => order.get((index + 1) % order.len()).copied(),
                None => order.first().copied(),
            }
        };
        if next.is_some() {
            inner.move_focus(next)?;
        }
        Ok(())
    }

    fn play(&self, inner: &ContainerInner, target: NodeId, sequence: &EventSequence) -> Result<()> {
        let mut clicks = 0;
        let mut press_prevented = false;

        for step in sequence.steps() {
            if !inner.document.borrow().is_element(target) {
                debug!(target = %target, "target removed mid-interaction");
                return Ok(());
            }
            match *step {
                Step::Focus => {
                    if !press_prevented {
                        Self::focus_from_pointer(inner, target)?;
                    }
                }
                Step::Dispatch(kind) => {
                    let mut event = Event::new(kind, target);
                    if kind == EventKind::Click {
                        clicks += 1;
                        event = event.with_detail(clicks);
                    } else if kind == EventKind::DblClick {
                        event = event.with_detail(2);
                    }
                    let event = inner.dispatch(event)?;
                    if kind == EventKind::MouseDown {
                        press_prevented = event.is_default_prevented();
                    }
                    if kind == EventKind::Click && !event.is_default_prevented() {
                        Self::click_default_action(inner, target)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn focus_from_pointer(inner: &ContainerInner, target: NodeId) -> Result<()> {
        let next = {
            let doc = inner.document.borrow();
            doc.closest(target, |node| aria::is_focusable(&doc, node))
        };
        inner.move_focus(next)
    }

    fn click_default_action(inner: &ContainerInner, target: NodeId) -> Result<()> {
        let action = {
            let doc = inner.document.borrow();
            let label = doc.closest(target, |node| doc.tag(node) == Some("label"));
            let forwarded = label
                .and_then(|label| aria::label_control(&doc, label))
                .filter(|control| doc.closest(target, |node| node == *control).is_none())
                .filter(|control| !aria::is_disabled(&doc, *control));
            match forwarded {
                Some(control) => Some(DefaultAction::Activate(control)),
                None => doc
                    .closest(target, |node| aria::is_submit_button(&doc, node))
                    .filter(|button| !aria::is_disabled(&doc, *button))
                    .and_then(|button| aria::owning_form(&doc, button))
                    .map(DefaultAction::Submit),
            }
        };

        match action {
            Some(DefaultAction::Activate(control)) => {
                inner.move_focus(Some(control))?;
                let event = inner.dispatch(Event::new(EventKind::Click, control).with_detail(1))?;
                if !event.is_default_prevented() {
                    Self::click_default_action(inner, control)?;
                }
                Ok(())
            }
            Some(DefaultAction::Submit(form)) => {
                debug!(form = %form, "submitting form");
                inner.dispatch(Event::new(EventKind::Submit, form))?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn keystroke(&self, inner: &ContainerInner, target: NodeId, key: Key) -> Result<()> {
        let down = inner.dispatch(Event::new(EventKind::KeyDown, target).with_key(key.clone()))?;

        if !down.is_default_prevented() {
            match &key {
                Key::Character(c) => {
                    let press =
                        inner.dispatch(Event::new(EventKind::KeyPress, target).with_key(key.clone()))?;
                    if !press.is_default_prevented() {
                        Self::insert(inner, target, *c)?;
                    }
                }
                Key::Named(NamedKey::Enter) => {
                    let press =
                        inner.dispatch(Event::new(EventKind::KeyPress, target).with_key(key.clone()))?;
                    if !press.is_default_prevented() {
                        Self::enter(inner, target)?;
                    }
                }
                Key::Named(NamedKey::Backspace) => Self::delete_backward(inner, target)?,
                Key::Named(NamedKey::Tab) => Self::advance_focus(inner)?,
                Key::Named(NamedKey::Escape) => {}
            }
        }

        // Tab moves focus before the key is released.
        let up_target = {
            let doc = inner.document.borrow();
            match (&key, doc.focused()) {
                (Key::Named(NamedKey::Tab), Some(focused)) => focused,
                _ if doc.is_element(target) => target,
                _ => return Ok(()),
            }
        };
        inner.dispatch(Event::new(EventKind::KeyUp, up_target).with_key(key))?;
        Ok(())
    }

    fn editable(inner: &ContainerInner, target: NodeId) -> bool {
        let doc = inner.document.borrow();
        aria::is_text_field(&doc, target)
            && !aria::is_disabled(&doc, target)
            && !doc.has_attr(target, "readonly")
    }

    fn insert(inner: &ContainerInner, target: NodeId, c: char) -> Result<()> {
        if !Self::editable(inner, target) {
            return Ok(());
        }
        let next = {
            let doc = inner.document.borrow();
            let current = doc.value(target).unwrap_or_default();
            let max_length = doc
                .attr(target, "maxlength")
                .and_then(|max| max.trim().parse::<usize>().ok());
            if max_length.is_some_and(|max| current.chars().count() >= max) {
                return Ok(());
            }
            format!("{current}{c}")
        };
        inner.document.borrow_mut().set_value(target, next);
        inner.dispatch(Event::new(EventKind::Input, target).with_data(c.to_string()))?;
        Ok(())
    }

    fn delete_backward(inner: &ContainerInner, target: NodeId) -> Result<()> {
        if !Self::editable(inner, target) {
            return Ok(());
        }
        let next = {
            let doc = inner.document.borrow();
            let current = doc.value(target).unwrap_or_default();
            if current.is_empty() {
                return Ok(());
            }
            let mut next = current.to_string();
            next.pop();
            next
        };
        inner.document.borrow_mut().set_value(target, next);
        inner.dispatch(Event::new(EventKind::Input, target))?;
        Ok(())
    }

    /// Newline in a textarea, implicit submission in other fields.
    fn enter(inner: &ContainerInner, target: NodeId) -> Result<()> {
        let (is_textarea, form) = {
            let doc = inner.document.borrow();
            (
                doc.tag(target) == Some("textarea"),
                aria::owning_form(&doc, target),
            )
        };
        if is_textarea {
            return Self::insert(inner, target, '\n');
        }
        if let Some(form) = form
            && Self::editable(inner, target)
        {
            debug!(form = %form, "implicit form submission");
            inner.dispatch(Event::new(EventKind::Submit, form))?;
        }
        Ok(())
    }
}
