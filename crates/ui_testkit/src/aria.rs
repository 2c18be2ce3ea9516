//! Accessibility semantics computed from the live document.
//!
//! Roles, accessible names, label association and the hidden/disabled/
//! focusable states that queries and the interaction simulator rely on.

use crate::dom::{Document, NodeId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};

/// ARIA role of an element.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    AsRefStr,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Alert,
    Article,
    Banner,
    Button,
    Cell,
    Checkbox,
    ColumnHeader,
    Combobox,
    Complementary,
    ContentInfo,
    Dialog,
    Form,
    Group,
    Heading,
    Img,
    Link,
    List,
    ListBox,
    ListItem,
    Main,
    Menu,
    MenuItem,
    Navigation,
    #[strum(serialize = "option")]
    #[serde(rename = "option")]
    ListOption,
    Paragraph,
    Presentation,
    ProgressBar,
    Radio,
    Region,
    Row,
    SearchBox,
    Separator,
    Slider,
    SpinButton,
    Status,
    Switch,
    Tab,
    Table,
    TabList,
    TabPanel,
    TextBox,
    Tooltip,
}

impl Role {
    /// Roles whose accessible name comes from their text content.
    fn named_from_content(self) -> bool {
        matches!(
            self,
            Self::Button
                | Self::Cell
                | Self::Checkbox
                | Self::ColumnHeader
                | Self::Heading
                | Self::Link
                | Self::ListOption
                | Self::MenuItem
                | Self::Radio
                | Self::Switch
                | Self::Tab
                | Self::Tooltip
        )
    }
}

/// Explicit `role` attribute (first recognised token), else the implicit
/// role of the tag.
pub(crate) fn role_of(doc: &Document, id: NodeId) -> Option<Role> {
    if let Some(explicit) = doc.attr(id, "role") {
        if let Some(role) = explicit
            .split_whitespace()
            .find_map(|token| Role::from_str(&token.to_ascii_lowercase()).ok())
        {
            return Some(role);
        }
    }
    implicit_role(doc, id)
}

fn input_type(doc: &Document, id: NodeId) -> String {
    doc.attr(id, "type")
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "text".to_string())
}

fn implicit_role(doc: &Document, id: NodeId) -> Option<Role> {
    let tag = doc.tag(id)?;
    let role = match tag {
        "button" => Role::Button,
        "a" | "area" if doc.has_attr(id, "href") => Role::Link,
        "input" => match input_type(doc, id).as_str() {
            "button" | "image" | "reset" | "submit" => Role::Button,
            "checkbox" => Role::Checkbox,
            "radio" => Role::Radio,
            "range" => Role::Slider,
            "number" => Role::SpinButton,
            "search" => Role::SearchBox,
            "email" | "tel" | "text" | "url" => Role::TextBox,
            _ => return None,
        },
        "textarea" => Role::TextBox,
        "select" => {
            if doc.has_attr(id, "multiple") {
                Role::ListBox
            } else {
                Role::Combobox
            }
        }
        "option" => Role::ListOption,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Role::Heading,
        "ul" | "ol" | "menu" => Role::List,
        "li" => Role::ListItem,
        "img" => {
            if doc.attr(id, "alt") == Some("") {
                Role::Presentation
            } else {
                Role::Img
            }
        }
        "form" => Role::Form,
        "nav" => Role::Navigation,
        "main" => Role::Main,
        "header" => Role::Banner,
        "footer" => Role::ContentInfo,
        "aside" => Role::Complementary,
        "article" => Role::Article,
        "section" if doc.has_attr(id, "aria-label") => Role::Region,
        "dialog" => Role::Dialog,
        "fieldset" => Role::Group,
        "table" => Role::Table,
        "tr" => Role::Row,
        "td" => Role::Cell,
        "th" => Role::ColumnHeader,
        "p" => Role::Paragraph,
        "hr" => Role::Separator,
        "progress" => Role::ProgressBar,
        "output" => Role::Status,
        _ => return None,
    };
    Some(role)
}

/// Collapse runs of whitespace and trim.
pub(crate) fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Computed accessible name, normalized.
pub(crate) fn accessible_name(doc: &Document, id: NodeId) -> String {
    if let Some(ids) = doc.attr(id, "aria-labelledby") {
        let name = ids
            .split_whitespace()
            .filter_map(|html_id| doc.by_id(html_id))
            .map(|label| doc.text_content(label))
            .collect::<Vec<_>>()
            .join(" ");
        let name = normalize(&name);
        if !name.is_empty() {
            return name;
        }
    }

    if let Some(label) = doc.attr(id, "aria-label") {
        let name = normalize(label);
        if !name.is_empty() {
            return name;
        }
    }

    if is_labelable(doc, id) {
        let name = labels_of(doc, id)
            .into_iter()
            .map(|label| doc.text_content(label))
            .collect::<Vec<_>>()
            .join(" ");
        let name = normalize(&name);
        if !name.is_empty() {
            return name;
        }
    }

    if doc.tag(id) == Some("img")
        && let Some(alt) = doc.attr(id, "alt")
    {
        return normalize(alt);
    }

    if doc.tag(id) == Some("input") {
        match input_type(doc, id).as_str() {
            "submit" => return normalize(doc.attr(id, "value").unwrap_or("Submit")),
            "reset" => return normalize(doc.attr(id, "value").unwrap_or("Reset")),
            "button" => return normalize(doc.attr(id, "value").unwrap_or_default()),
            _ => {}
        }
    }

    if role_of(doc, id).is_some_and(Role::named_from_content) {
        let name = normalize(&doc.text_content(id));
        if !name.is_empty() {
            return name;
        }
    }

    if let Some(title) = doc.attr(id, "title") {
        return normalize(title);
    }

    doc.attr(id, "placeholder").map(normalize).unwrap_or_default()
}

/// Elements a `<label>` can point at.
pub(crate) fn is_labelable(doc: &Document, id: NodeId) -> bool {
    match doc.tag(id) {
        Some("input") => input_type(doc, id) != "hidden",
        Some("button" | "select" | "textarea" | "meter" | "output" | "progress") => true,
        _ => false,
    }
}

/// Control associated with a `<label>`: its `for` target, else the first
/// labelable descendant.
pub(crate) fn label_control(doc: &Document, label: NodeId) -> Option<NodeId> {
    if doc.tag(label) != Some("label") {
        return None;
    }
    if let Some(target) = doc.attr(label, "for") {
        return doc
            .by_id(target)
            .filter(|control| is_labelable(doc, *control));
    }
    doc.descendant_elements(label)
        .into_iter()
        .find(|node| is_labelable(doc, *node))
}

/// Labels of a control, in document order.
pub(crate) fn labels_of(doc: &Document, control: NodeId) -> Vec<NodeId> {
    doc.descendant_elements(doc.root())
        .into_iter()
        .filter(|node| doc.tag(*node) == Some("label"))
        .filter(|label| label_control(doc, *label) == Some(control))
        .collect()
}

fn hides_itself(doc: &Document, id: NodeId) -> bool {
    doc.has_attr(id, "hidden")
        || doc.attr(id, "aria-hidden") == Some("true")
        || doc
            .style(id)
            .is_some_and(|style| style.get("display") == Some("none"))
        || doc
            .style(id)
            .is_some_and(|style| style.get("visibility") == Some("hidden"))
}

/// Excluded from the accessibility tree by itself or an ancestor.
pub(crate) fn is_hidden(doc: &Document, id: NodeId) -> bool {
    doc.closest(id, |node| hides_itself(doc, node)).is_some()
}

const DISABLEABLE: &[&str] = &[
    "button", "fieldset", "input", "optgroup", "option", "select", "textarea",
];

/// Disabled directly, or inside a disabled `<fieldset>` (outside its
/// first `<legend>`).
pub(crate) fn is_disabled(doc: &Document, id: NodeId) -> bool {
    let Some(tag) = doc.tag(id) else {
        return false;
    };
    if !DISABLEABLE.contains(&tag) {
        return false;
    }
    if doc.has_attr(id, "disabled") {
        return true;
    }
    doc.ancestors(id).into_iter().any(|ancestor| {
        doc.tag(ancestor) == Some("fieldset")
            && doc.has_attr(ancestor, "disabled")
            && !in_first_legend(doc, ancestor, id)
    })
}

fn in_first_legend(doc: &Document, fieldset: NodeId, id: NodeId) -> bool {
    let legend = doc
        .children(fieldset)
        .iter()
        .copied()
        .find(|child| doc.tag(*child) == Some("legend"));
    legend.is_some_and(|legend| doc.ancestors(id).contains(&legend))
}

fn tab_index(doc: &Document, id: NodeId) -> Option<i32> {
    doc.attr(id, "tabindex")?.trim().parse().ok()
}

fn natively_focusable(doc: &Document, id: NodeId) -> bool {
    match doc.tag(id) {
        Some("button" | "select" | "textarea") => true,
        Some("input") => input_type(doc, id) != "hidden",
        Some("a" | "area") => doc.has_attr(id, "href"),
        _ => doc.attr(id, "contenteditable").is_some_and(|v| v != "false"),
    }
}

/// Can receive focus from a pointer or script.
pub(crate) fn is_focusable(doc: &Document, id: NodeId) -> bool {
    if is_disabled(doc, id) || is_hidden(doc, id) {
        return false;
    }
    natively_focusable(doc, id) || tab_index(doc, id).is_some()
}

/// Sequential (Tab) focus order: positive tabindex ascending, then
/// document order.
pub(crate) fn tab_order(doc: &Document) -> Vec<NodeId> {
    let mut positive = Vec::new();
    let mut natural = Vec::new();
    for node in doc.descendant_elements(doc.root()) {
        if !is_focusable(doc, node) {
            continue;
        }
        match tab_index(doc, node) {
            Some(index) if index < 0 => {}
            Some(index) if index > 0 => positive.push((index, node)),
            _ => natural.push(node),
        }
    }
    positive.sort_by_key(|(index, _)| *index);
    positive
        .into_iter()
        .map(|(_, node)| node)
        .chain(natural)
        .collect()
}

/// Accepts typed text.
pub(crate) fn is_text_field(doc: &Document, id: NodeId) -> bool {
    match doc.tag(id) {
        Some("textarea") => true,
        Some("input") => matches!(
            input_type(doc, id).as_str(),
            "text" | "email" | "password" | "search" | "tel" | "url" | "number"
        ),
        _ => false,
    }
}

/// Submits its form when clicked.
pub(crate) fn is_submit_button(doc: &Document, id: NodeId) -> bool {
    match doc.tag(id) {
        Some("button") => doc
            .attr(id, "type")
            .is_none_or(|kind| kind.eq_ignore_ascii_case("submit")),
        Some("input") => matches!(input_type(doc, id).as_str(), "submit" | "image"),
        _ => false,
    }
}

pub(crate) fn owning_form(doc: &Document, id: NodeId) -> Option<NodeId> {
    doc.ancestors(id)
        .into_iter()
        .find(|node| doc.tag(*node) == Some("form"))
}
