//! Platform services injected into a container at mount time.
//!
//! Components read services through [`crate::Scope::service`]. Nothing is
//! installed globally, so two containers can see different fakes.

pub mod geolocation;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A type-keyed set of service values.
#[derive(Clone, Default)]
pub struct Services {
    entries: HashMap<TypeId, (&'static str, Rc<dyn Any>)>,
}

impl Services {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Services::insert`].
    pub fn with<T: 'static>(mut self, service: T) -> Self {
        self.insert(service);
        self
    }

    /// Register `service`, replacing any previous value of the same type.
    pub fn insert<T: 'static>(&mut self, service: T) {
        self.entries.insert(
            TypeId::of::<T>(),
            (std::any::type_name::<T>(), Rc::new(service)),
        );
    }

    /// Clone of the registered `T`, if any.
    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|(_, service)| service.downcast_ref::<T>().cloned())
    }

    /// Whether a `T` is registered.
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no service is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.entries.values().map(|(name, _)| name))
            .finish()
    }
}
