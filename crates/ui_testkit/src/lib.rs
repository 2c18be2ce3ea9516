//! Mount, query, interact and flush: a harness for component tests.
//!
//! Components are render functions over a [`Scope`] that produce a
//! [`View`]. A test mounts a description into an isolated [`Container`],
//! finds elements by role, text or label, drives them through
//! [`UserEvent`] and asserts on what a user would see.
//!
//! ```rust,ignore
//! use ui_testkit::{Query, Role, TextMatch, mount};
//!
//! let container = mount(counter())?;
//! let increment = container.get_by(&Query::role(Role::Button).name(TextMatch::pattern("(?i)increment")?))?;
//! container.user().click(&increment)?;
//! container.get_by(&Query::text("Current count: 1"))?;
//! ```
//!
//! State updates are applied at flush boundaries: every simulated event,
//! [`Container::act`], [`Container::act_async`] and each `wait_for` poll.

pub mod aria;
pub mod config;
pub mod container;
pub mod deferred;
pub mod dom;
pub mod error;
pub mod event;
pub mod handle;
pub mod hook;
pub mod injection;
pub mod platform;
pub mod query;
mod runtime;
pub mod scope;
pub mod style;
pub mod user;
pub mod view;

pub use aria::Role;
pub use config::HarnessConfig;
pub use container::{Container, MountOptions, Wrapper, mount, mount_with, mount_with_wrapper};
pub use deferred::{DeferredError, Promise, Resolver, deferred};
pub use dom::NodeId;
pub use error::{HarnessError, RenderError, Result};
pub use event::{Event, EventKind, Key, NamedKey};
pub use handle::{ElementHandle, ElementSnapshot};
pub use hook::{HookResult, render_hook, render_hook_with};
pub use platform::Services;
pub use platform::geolocation::{
    Coordinates, FakeGeolocation, GeolocationProvider, Position, PositionError,
    PositionErrorCode, SharedGeolocation,
};
pub use query::{By, Query, Screen, TextMatch};
pub use runtime::TaskSpawner;
pub use scope::{Scope, Setter};
pub use style::StyleMap;
pub use user::UserEvent;
pub use view::{Element, View, component, el, fragment, provide, text};
