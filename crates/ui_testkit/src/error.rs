//! Error types for the harness.

use std::time::Duration;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T, E = HarnessError> = std::result::Result<T, E>;

/// Errors surfaced to the calling test scenario.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The UI description could not be rendered (mount or re-render).
    #[error("failed to render tree: {0}")]
    InvalidTree(#[from] RenderError),

    /// A query matched zero elements.
    #[error("unable to find {description}\n\n{dom}")]
    NotFound { description: String, dom: String },

    /// A single-element query matched more than one element.
    #[error("found {count} elements {description}\n\n{dom}")]
    AmbiguousMatch {
        description: String,
        count: usize,
        dom: String,
    },

    /// An interaction targeted an element that cannot receive it.
    #[error("cannot {action} element: {reason}")]
    InvalidTarget {
        action: &'static str,
        reason: String,
    },

    /// An asynchronous wait exceeded its deadline.
    #[error("timed out after {elapsed:?}: {last_error}")]
    Timeout {
        elapsed: Duration,
        last_error: String,
    },

    /// Flushing never quiesced.
    #[error("exceeded {limit} flush passes; a component keeps scheduling updates")]
    UpdateLoop { limit: usize },
}

impl HarnessError {
    pub(crate) fn invalid_target(action: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            action,
            reason: reason.into(),
        }
    }

    /// Returns true for [`HarnessError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for [`HarnessError::AmbiguousMatch`].
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::AmbiguousMatch { .. })
    }

    /// Returns true for [`HarnessError::InvalidTarget`].
    pub fn is_invalid_target(&self) -> bool {
        matches!(self, Self::InvalidTarget { .. })
    }

    /// Returns true for [`HarnessError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Errors raised while expanding a UI description into host nodes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("invalid element tag {0:?}")]
    InvalidTag(String),

    #[error("<{tag}> is a void element and cannot have children")]
    VoidElementChildren { tag: String },

    #[error("hook #{index} in component {component} changed type between renders")]
    HookOrder {
        component: &'static str,
        index: usize,
    },

    #[error("no {0} service was provided at mount time")]
    MissingService(&'static str),

    #[error("component requires a {0} context provider above it")]
    MissingContext(&'static str),

    #[error("component {component} failed: {message}")]
    Component {
        component: &'static str,
        message: String,
    },
}

impl RenderError {
    /// Convenience constructor for component-raised failures.
    pub fn component(component: &'static str, message: impl Into<String>) -> Self {
        Self::Component {
            component,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_converts_to_invalid_tree() {
        let err: HarnessError = RenderError::InvalidTag("".into()).into();
        assert!(matches!(err, HarnessError::InvalidTree(_)));
        assert!(err.to_string().contains("invalid element tag"));
    }

    #[test]
    fn test_predicates() {
        let err = HarnessError::invalid_target("click", "element is disabled");
        assert!(err.is_invalid_target());
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "cannot click element: element is disabled"
        );
    }
}
