//! UI descriptions.
//!
//! A [`View`] is an immutable, cheaply clonable description of a tree:
//! host elements, text, fragments, components (render functions with
//! hook state) and context providers. The container keeps the root
//! description and re-expands it on every flush.
//!
//! ```rust,ignore
//! use ui_testkit::view::{component, el};
//!
//! let counter = component("Counter", |cx| {
//!     let (count, set_count) = cx.use_state(|| 0);
//!     Ok(el("div")
//!         .child(el("div").child("Current count: ").child(count.to_string()))
//!         .child(el("button").on_click(move |_| set_count.update(|c| *c += 1)).child("Increment"))
//!         .into())
//! });
//! ```

use crate::error::RenderError;
use crate::event::{Event, EventKind, Listener};
use crate::scope::Scope;
use crate::style::StyleMap;
use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Output of a component render function.
pub type RenderResult = Result<View, RenderError>;

/// A component render function.
pub type RenderFn = Rc<dyn Fn(&mut Scope<'_>) -> RenderResult>;

/// A node of a UI description.
#[derive(Clone, Default)]
pub enum View {
    #[default]
    Empty,
    Text(String),
    Element(Element),
    Fragment(Vec<View>),
    Component(Component),
    Provider(Provider),
}

impl View {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<Element> for View {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<&str> for View {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for View {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<View>> for View {
    fn from(children: Vec<View>) -> Self {
        Self::Fragment(children)
    }
}

impl<T: Into<View>> From<Option<T>> for View {
    fn from(view: Option<T>) -> Self {
        view.map(Into::into).unwrap_or_default()
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Element(element) => fmt::Debug::fmt(element, f),
            Self::Fragment(children) => f.debug_list().entries(children).finish(),
            Self::Component(component) => f
                .debug_struct("Component")
                .field("name", &component.name)
                .finish(),
            Self::Provider(provider) => f
                .debug_struct("Provider")
                .field("type", &provider.type_name)
                .field("child", &provider.child)
                .finish(),
        }
    }
}

/// A host element description, built fluently.
#[derive(Clone)]
pub struct Element {
    pub(crate) tag: String,
    pub(crate) attrs: BTreeMap<String, String>,
    pub(crate) style: StyleMap,
    pub(crate) listeners: Vec<(EventKind, Listener)>,
    pub(crate) value: Option<String>,
    pub(crate) children: Vec<View>,
}

/// Start describing an element with the given tag.
pub fn el(tag: impl Into<String>) -> Element {
    Element {
        tag: tag.into(),
        attrs: BTreeMap::new(),
        style: StyleMap::new(),
        listeners: Vec::new(),
        value: None,
        children: Vec::new(),
    }
}

impl Element {
    /// Set an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Set the `id` attribute.
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Set an explicit `role`.
    pub fn role(self, role: impl Into<String>) -> Self {
        self.attr("role", role)
    }

    /// Set `aria-label`.
    pub fn aria_label(self, label: impl Into<String>) -> Self {
        self.attr("aria-label", label)
    }

    /// Set `data-testid`.
    pub fn test_id(self, id: impl Into<String>) -> Self {
        self.attr("data-testid", id)
    }

    /// Set `placeholder`.
    pub fn placeholder(self, text: impl Into<String>) -> Self {
        self.attr("placeholder", text)
    }

    /// Sets or clears the boolean `disabled` attribute.
    pub fn disabled(mut self, disabled: bool) -> Self {
        if disabled {
            self.attrs.insert("disabled".into(), String::new());
        } else {
            self.attrs.remove("disabled");
        }
        self
    }

    /// Add an inline style declaration.
    pub fn style(mut self, property: &str, value: &str) -> Self {
        self.style.set(property, value);
        self
    }

    /// Controlled value: every commit resets the live value to this.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Listen for `kind` on this element.
    pub fn on<F>(mut self, kind: EventKind, listener: F) -> Self
    where
        F: Fn(&mut Event) + 'static,
    {
        self.listeners.push((kind, Rc::new(listener)));
        self
    }

    /// Listen for clicks.
    pub fn on_click<F>(self, listener: F) -> Self
    where
        F: Fn(&mut Event) + 'static,
    {
        self.on(EventKind::Click, listener)
    }

    /// Listen for input events.
    pub fn on_input<F>(self, listener: F) -> Self
    where
        F: Fn(&mut Event) + 'static,
    {
        self.on(EventKind::Input, listener)
    }

    /// Listen for form submission.
    pub fn on_submit<F>(self, listener: F) -> Self
    where
        F: Fn(&mut Event) + 'static,
    {
        self.on(EventKind::Submit, listener)
    }

    /// Append a child.
    pub fn child(mut self, child: impl Into<View>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several children.
    pub fn children<I, V>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<View>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Lowercase tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("attrs", &self.attrs)
            .field("listeners", &self.listeners.len())
            .field("children", &self.children)
            .finish()
    }
}

/// A render function plus the name used for hook bookkeeping and errors.
#[derive(Clone)]
pub struct Component {
    pub(crate) name: &'static str,
    pub(crate) render: RenderFn,
}

/// Describe a component instance.
pub fn component<F>(name: &'static str, render: F) -> View
where
    F: Fn(&mut Scope<'_>) -> RenderResult + 'static,
{
    View::Component(Component {
        name,
        render: Rc::new(render),
    })
}

/// Makes a value of type `T` visible to `use_context::<T>()` below it.
#[derive(Clone)]
pub struct Provider {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) value: Rc<dyn Any>,
    pub(crate) child: Box<View>,
}

/// Wrap `child` in a context provider for `value`.
pub fn provide<T: 'static>(value: T, child: impl Into<View>) -> View {
    View::Provider(Provider {
        type_id: TypeId::of::<T>(),
        type_name: std::any::type_name::<T>(),
        value: Rc::new(value),
        child: Box::new(child.into()),
    })
}

/// A text node.
pub fn text(text: impl Into<String>) -> View {
    View::Text(text.into())
}

/// A list of siblings without a wrapping element.
pub fn fragment<I, V>(children: I) -> View
where
    I: IntoIterator<Item = V>,
    V: Into<View>,
{
    View::Fragment(children.into_iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_builder() {
        let button = el("button")
            .id("save")
            .disabled(true)
            .style("backgroundColor", "black")
            .on_click(|_| {})
            .child("Save");

        assert_eq!(button.tag(), "button");
        assert_eq!(button.attrs.get("id").map(String::as_str), Some("save"));
        assert!(button.attrs.contains_key("disabled"));
        assert_eq!(button.style.get("background-color"), Some("black"));
        assert_eq!(button.listeners.len(), 1);
        assert_eq!(button.children.len(), 1);

        let enabled = button.disabled(false);
        assert!(!enabled.attrs.contains_key("disabled"));
    }

    #[test]
    fn test_option_into_view() {
        let none: Option<&str> = None;
        assert!(View::from(none).is_empty());
        assert!(matches!(View::from(Some("hi")), View::Text(_)));
    }

    #[test]
    fn test_debug_hides_closures() {
        let view = fragment([
            text("a"),
            component("Thing", |_| Ok(View::Empty)),
            provide(3_u8, el("p")),
        ]);
        let debug = format!("{view:?}");
        assert!(debug.contains("Thing"));
        assert!(debug.contains("u8"));
    }
}
