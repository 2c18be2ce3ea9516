//! Finding elements the way a user would.
//!
//! Queries match on role and accessible name, visible text, label text,
//! placeholder, test id or current form value. `get_*` variants fail with a
//! DOM dump when nothing (or, for single-element variants, more than one
//! thing) matches; `query_*` variants report absence as `None`/empty.

use crate::aria::{self, Role};
use crate::config::HarnessConfig;
use crate::container::ContainerInner;
use crate::dom::{Document, NodeId};
use crate::error::{HarnessError, Result};
use crate::handle::ElementHandle;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::debug;

/// How text is compared. Candidate text is whitespace-normalized first.
#[derive(Debug, Clone)]
pub enum TextMatch {
    /// The whole normalized text equals the expected string.
    Exact(String),
    /// The normalized text contains the expected string.
    Substring(String),
    /// The regex matches somewhere in the normalized text.
    Pattern(Regex),
}

impl TextMatch {
    /// Match the whole normalized text.
    pub fn exact(text: impl Into<String>) -> Self {
        Self::Exact(text.into())
    }

    /// Match any case-sensitive substring.
    pub fn substring(text: impl Into<String>) -> Self {
        Self::Substring(text.into())
    }

    /// Compile `pattern`. Use `(?i)` for case-insensitive matching.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Pattern)
    }

    /// Whether `text`, after normalization, matches.
    pub fn matches(&self, text: &str) -> bool {
        let text = aria::normalize(text);
        match self {
            Self::Exact(expected) => text == aria::normalize(expected),
            Self::Substring(expected) => text.contains(aria::normalize(expected).as_str()),
            Self::Pattern(regex) => regex.is_match(&text),
        }
    }
}

impl From<&str> for TextMatch {
    fn from(text: &str) -> Self {
        Self::exact(text)
    }
}

impl From<String> for TextMatch {
    fn from(text: String) -> Self {
        Self::Exact(text)
    }
}

impl From<Regex> for TextMatch {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

impl fmt::Display for TextMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(text) => write!(f, "{text:?}"),
            Self::Substring(text) => write!(f, "containing {text:?}"),
            Self::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

/// What a query matches on.
#[derive(Debug, Clone)]
pub enum By {
    Role {
        role: Role,
        name: Option<TextMatch>,
    },
    Text(TextMatch),
    LabelText(TextMatch),
    PlaceholderText(TextMatch),
    TestId(TextMatch),
    DisplayValue(TextMatch),
}

/// A query description, built fluently.
///
/// ```rust,ignore
/// let increment = container.get_by(&Query::role(Role::Button).name(TextMatch::pattern("(?i)increment")?))?;
/// let username = container.get_by(&Query::label_text("Username"))?;
/// ```
#[derive(Debug, Clone)]
pub struct Query {
    by: By,
    include_hidden: bool,
    selector: Option<String>,
}

impl Query {
    fn new(by: By) -> Self {
        Self {
            by,
            include_hidden: false,
            selector: None,
        }
    }

    /// Elements with `role`, explicit or implicit.
    pub fn role(role: Role) -> Self {
        Self::new(By::Role { role, name: None })
    }

    /// Elements whose own text matches.
    pub fn text(text: impl Into<TextMatch>) -> Self {
        Self::new(By::Text(text.into()))
    }

    /// Form controls whose label matches.
    pub fn label_text(text: impl Into<TextMatch>) -> Self {
        Self::new(By::LabelText(text.into()))
    }

    /// Elements whose `placeholder` matches.
    pub fn placeholder_text(text: impl Into<TextMatch>) -> Self {
        Self::new(By::PlaceholderText(text.into()))
    }

    /// Elements whose `data-testid` matches.
    pub fn test_id(id: impl Into<TextMatch>) -> Self {
        Self::new(By::TestId(id.into()))
    }

    /// Form controls whose current value matches.
    pub fn display_value(value: impl Into<TextMatch>) -> Self {
        Self::new(By::DisplayValue(value.into()))
    }

    /// Accessible-name filter for role queries; ignored otherwise.
    pub fn name(mut self, name: impl Into<TextMatch>) -> Self {
        match &mut self.by {
            By::Role { name: slot, .. } => *slot = Some(name.into()),
            other => debug!(query = ?other, "name filter ignored on a non-role query"),
        }
        self
    }

    /// Let a role query match elements excluded from the accessibility
    /// tree. Other query kinds never skip hidden elements.
    pub fn include_hidden(mut self) -> Self {
        self.include_hidden = true;
        self
    }

    /// Only match elements with this tag.
    pub fn selector(mut self, tag: impl Into<String>) -> Self {
        self.selector = Some(tag.into().to_ascii_lowercase());
        self
    }

    /// What the query matches on.
    pub fn by(&self) -> &By {
        &self.by
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.by {
            By::Role { role, name: None } => write!(f, "an element with the role \"{role}\""),
            By::Role {
                role,
                name: Some(name),
            } => write!(f, "an element with the role \"{role}\" and name {name}"),
            By::Text(text) => write!(f, "an element with the text {text}"),
            By::LabelText(text) => write!(f, "a label with the text {text}"),
            By::PlaceholderText(text) => write!(f, "an element with the placeholder text {text}"),
            By::TestId(id) => write!(f, "an element by test id {id}"),
            By::DisplayValue(value) => write!(f, "an element with the display value {value}"),
        }?;
        if let Some(tag) = &self.selector {
            write!(f, " matching <{tag}>")?;
        }
        Ok(())
    }
}

/// Raw query result.
struct Outcome {
    matches: Vec<NodeId>,
    /// Labels whose text matched but which have no associated control.
    orphan_labels: usize,
}

fn find_all(doc: &Document, root: NodeId, query: &Query, config: &HarnessConfig) -> Outcome {
    let candidates = doc.subtree_elements(root);
    let mut orphan_labels = 0;

    let mut matches: Vec<NodeId> = match &query.by {
        By::Role { role, name } => candidates
            .iter()
            .copied()
            .filter(|node| aria::role_of(doc, *node) == Some(*role))
            .filter(|node| {
                name.as_ref()
                    .is_none_or(|name| name.matches(&aria::accessible_name(doc, *node)))
            })
            .collect(),
        By::Text(text) => candidates
            .iter()
            .copied()
            .filter(|node| doc.tag(*node).is_some_and(|tag| !config.ignores(tag)))
            .filter(|node| {
                let own = doc.own_text(*node);
                !own.trim().is_empty() && text.matches(&own)
            })
            .collect(),
        By::LabelText(text) => {
            let mut found = Vec::new();
            for node in &candidates {
                let node = *node;
                if doc.tag(node) == Some("label") && text.matches(&doc.text_content(node)) {
                    match aria::label_control(doc, node) {
                        Some(control) => found.push(control),
                        None => orphan_labels += 1,
                    }
                }
                if doc
                    .attr(node, "aria-label")
                    .is_some_and(|label| text.matches(label))
                {
                    found.push(node);
                }
                if let Some(ids) = doc.attr(node, "aria-labelledby")
                    && ids
                        .split_whitespace()
                        .filter_map(|id| doc.by_id(id))
                        .any(|label| text.matches(&doc.text_content(label)))
                {
                    found.push(node);
                }
            }
            found
        }
        By::PlaceholderText(text) => candidates
            .iter()
            .copied()
            .filter(|node| {
                doc.attr(*node, "placeholder")
                    .is_some_and(|placeholder| text.matches(placeholder))
            })
            .collect(),
        By::TestId(id) => candidates
            .iter()
            .copied()
            .filter(|node| {
                doc.attr(*node, "data-testid")
                    .is_some_and(|test_id| id.matches(test_id))
            })
            .collect(),
        By::DisplayValue(value) => candidates
            .iter()
            .copied()
            .filter(|node| doc.value(*node).is_some_and(|current| value.matches(current)))
            .collect(),
    };

    if matches!(query.by, By::Role { .. }) && !query.include_hidden {
        matches.retain(|node| !aria::is_hidden(doc, *node));
    }
    if let Some(tag) = &query.selector {
        matches.retain(|node| doc.tag(*node) == Some(tag.as_str()));
    }

    // Label lookups can resolve out of order; restore document order.
    let mut seen = HashSet::new();
    matches.retain(|node| seen.insert(*node));
    matches.sort_by_key(|node| candidates.iter().position(|candidate| candidate == node));

    Outcome {
        matches,
        orphan_labels,
    }
}

/// Query entry point scoped to a subtree of one container.
///
/// [`crate::Container`] delegates to a screen over its root;
/// [`ElementHandle::within`] scopes to a single element.
#[derive(Clone)]
pub struct Screen {
    container: Weak<ContainerInner>,
    root: NodeId,
}

impl Screen {
    pub(crate) fn new(container: Weak<ContainerInner>, root: NodeId) -> Self {
        Self { container, root }
    }

    fn upgrade(&self) -> Result<Rc<ContainerInner>> {
        self.container
            .upgrade()
            .filter(|inner| !inner.is_torn_down())
            .ok_or_else(|| HarnessError::invalid_target("query", "container has been unmounted"))
    }

    fn search(&self, query: &Query) -> Result<(Rc<ContainerInner>, Outcome)> {
        let inner = self.upgrade()?;
        let outcome = {
            let doc = inner.document.borrow();
            if !doc.contains(self.root) {
                return Err(HarnessError::invalid_target(
                    "query",
                    "scope element is no longer attached",
                ));
            }
            find_all(&doc, self.root, query, &inner.config)
        };
        Ok((inner, outcome))
    }

    fn not_found(&self, inner: &ContainerInner, query: &Query, outcome: &Outcome) -> HarnessError {
        let mut description = query.to_string();
        if outcome.orphan_labels > 0 {
            description.push_str(
                ": found a label with matching text, but no form control is associated with it",
            );
        }
        HarnessError::NotFound {
            description,
            dom: self.dump(inner),
        }
    }

    fn dump(&self, inner: &ContainerInner) -> String {
        inner
            .document
            .borrow()
            .pretty(self.root, inner.config.debug_print_limit)
    }

    fn handles(inner: &Rc<ContainerInner>, nodes: Vec<NodeId>) -> Vec<ElementHandle> {
        nodes
            .into_iter()
            .map(|node| ElementHandle::new(Rc::downgrade(inner), node))
            .collect()
    }

    /// Exactly one match, or `NotFound` / `AmbiguousMatch`.
    pub fn get_by(&self, query: &Query) -> Result<ElementHandle> {
        let (inner, outcome) = self.search(query)?;
        match outcome.matches.as_slice() {
            [] => Err(self.not_found(&inner, query, &outcome)),
            [node] => Ok(ElementHandle::new(Rc::downgrade(&inner), *node)),
            many => Err(HarnessError::AmbiguousMatch {
                description: query.to_string(),
                count: many.len(),
                dom: self.dump(&inner),
            }),
        }
    }

    /// At most one match; absence is `Ok(None)`.
    pub fn query_by(&self, query: &Query) -> Result<Option<ElementHandle>> {
        let (inner, outcome) = self.search(query)?;
        match outcome.matches.as_slice() {
            [] => Ok(None),
            [node] => Ok(Some(ElementHandle::new(Rc::downgrade(&inner), *node))),
            many => Err(HarnessError::AmbiguousMatch {
                description: query.to_string(),
                count: many.len(),
                dom: self.dump(&inner),
            }),
        }
    }

    /// One or more matches in document order, or `NotFound`.
    pub fn get_all_by(&self, query: &Query) -> Result<Vec<ElementHandle>> {
        let (inner, outcome) = self.search(query)?;
        if outcome.matches.is_empty() {
            return Err(self.not_found(&inner, query, &outcome));
        }
        Ok(Self::handles(&inner, outcome.matches))
    }

    /// Every match in document order, possibly none.
    pub fn query_all_by(&self, query: &Query) -> Result<Vec<ElementHandle>> {
        let (inner, outcome) = self.search(query)?;
        Ok(Self::handles(&inner, outcome.matches))
    }

    /// Indented markup of the screen's subtree.
    pub fn pretty_dom(&self) -> Result<String> {
        let inner = self.upgrade()?;
        Ok(self.dump(&inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_ignores_surrounding_whitespace() {
        let exact = TextMatch::from("Current count: 0");
        assert!(exact.matches("  Current   count: 0 "));
        assert!(!exact.matches("Current count: 01"));
    }

    #[test]
    fn test_substring_is_case_sensitive() {
        let partial = TextMatch::substring("count");
        assert!(partial.matches("Current count: 0"));
        assert!(!partial.matches("COUNT"));
    }

    #[test]
    fn test_pattern_case_insensitive() {
        let pattern = TextMatch::pattern("(?i)^increment$").unwrap();
        assert!(pattern.matches("Increment"));
        assert!(!pattern.matches("Increment by two"));
        assert!(TextMatch::pattern("(").is_err());
    }

    #[test]
    fn test_query_descriptions() {
        let by_role = Query::role(Role::Button).name("Submit");
        assert_eq!(
            by_role.to_string(),
            "an element with the role \"button\" and name \"Submit\""
        );
        let by_label = Query::label_text(TextMatch::pattern("(?i)user").unwrap()).selector("INPUT");
        assert_eq!(
            by_label.to_string(),
            "a label with the text /(?i)user/ matching <input>"
        );
    }

    #[test]
    fn test_name_only_applies_to_role_queries() {
        let query = Query::text("hello").name("ignored");
        assert!(matches!(query.by(), By::Text(_)));
    }
}
