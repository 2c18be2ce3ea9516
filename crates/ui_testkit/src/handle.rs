//! References to elements in a mounted tree.

use crate::aria::{self, Role};
use crate::container::ContainerInner;
use crate::dom::{Document, NodeId};
use crate::error::{HarnessError, Result};
use crate::query::Screen;
use crate::style::StyleMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// A reference to one element of a container's live tree.
///
/// The handle stays valid while the element keeps rendering at the same
/// place. Once a re-render removes it, or the container is unmounted,
/// reads and interactions fail with [`HarnessError::InvalidTarget`].
#[derive(Clone)]
pub struct ElementHandle {
    container: Weak<ContainerInner>,
    id: NodeId,
}

impl ElementHandle {
    pub(crate) fn new(container: Weak<ContainerInner>, id: NodeId) -> Self {
        Self { container, id }
    }

    /// Node id, stable across rerenders while the node survives.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Container and node, if the element is still attached.
    pub(crate) fn resolve(&self, action: &'static str) -> Result<(Rc<ContainerInner>, NodeId)> {
        let inner = self
            .container
            .upgrade()
            .filter(|inner| !inner.is_torn_down())
            .ok_or_else(|| HarnessError::invalid_target(action, "container has been unmounted"))?;
        if !inner.document.borrow().is_element(self.id) {
            return Err(HarnessError::invalid_target(
                action,
                "element is no longer attached to the tree",
            ));
        }
        Ok((inner, self.id))
    }

    fn read<R>(&self, f: impl FnOnce(&Document, NodeId) -> R) -> Result<R> {
        let (inner, id) = self.resolve("read")?;
        let doc = inner.document.borrow();
        Ok(f(&doc, id))
    }

    /// Whether the node is still in a mounted tree.
    pub fn is_attached(&self) -> bool {
        self.resolve("read").is_ok()
    }

    /// Lowercase tag name.
    pub fn tag_name(&self) -> Result<String> {
        self.read(|doc, id| doc.tag(id).unwrap_or_default().to_string())
    }

    /// Raw attribute value.
    pub fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.read(|doc, id| doc.attr(id, name).map(str::to_string))
    }

    /// Text of all descendant text nodes, unnormalized.
    pub fn text_content(&self) -> Result<String> {
        self.read(|doc, id| doc.text_content(id))
    }

    /// Live value of an input, textarea or select.
    pub fn value(&self) -> Result<Option<String>> {
        self.read(|doc, id| doc.value(id).map(str::to_string))
    }

    /// Explicit or implicit role.
    pub fn role(&self) -> Result<Option<Role>> {
        self.read(aria::role_of)
    }

    /// Computed accessible name.
    pub fn accessible_name(&self) -> Result<String> {
        self.read(aria::accessible_name)
    }

    /// Declared inline style. There is no cascade.
    pub fn computed_style(&self) -> Result<StyleMap> {
        self.read(|doc, id| doc.style(id).cloned().unwrap_or_default())
    }

    /// Disabled directly or through a disabled fieldset.
    pub fn is_disabled(&self) -> Result<bool> {
        self.read(aria::is_disabled)
    }

    /// Not hidden by `hidden`, `aria-hidden` or styles, here or above.
    pub fn is_visible(&self) -> Result<bool> {
        self.read(|doc, id| !aria::is_hidden(doc, id))
    }

    /// Whether this element is focused.
    pub fn has_focus(&self) -> Result<bool> {
        self.read(|doc, id| doc.focused() == Some(id))
    }

    /// Parent element, `None` at the container root.
    pub fn parent(&self) -> Result<Option<ElementHandle>> {
        let parent = self.read(|doc, id| doc.parent(id))?;
        Ok(parent.map(|id| Self::new(self.container.clone(), id)))
    }

    /// Queries scoped to this element's subtree.
    pub fn within(&self) -> Screen {
        Screen::new(self.container.clone(), self.id)
    }

    /// Serializable summary of the element's current state.
    pub fn snapshot(&self) -> Result<ElementSnapshot> {
        self.read(|doc, id| ElementSnapshot {
            tag: doc.tag(id).unwrap_or_default().to_string(),
            role: aria::role_of(doc, id),
            name: aria::accessible_name(doc, id),
            text: aria::normalize(&doc.text_content(id)),
            value: doc.value(id).map(str::to_string),
            attributes: doc
                .element(id)
                .map(|element| element.attrs.clone())
                .unwrap_or_default(),
            style: doc.style(id).cloned().unwrap_or_default(),
            disabled: aria::is_disabled(doc, id),
            hidden: aria::is_hidden(doc, id),
            focused: doc.focused() == Some(id),
        })
    }
}

impl PartialEq for ElementHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.container, &other.container)
    }
}

impl Eq for ElementHandle {}

impl fmt::Debug for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementHandle({})", self.id)
    }
}

/// Point-in-time view of an element, for assertions and golden files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    pub tag: String,
    pub role: Option<Role>,
    pub name: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "StyleMap::is_empty", default)]
    pub style: StyleMap,
    pub disabled: bool,
    pub hidden: bool,
    pub focused: bool,
}
