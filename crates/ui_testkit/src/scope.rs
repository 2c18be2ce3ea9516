//! Per-render component scope: hooks, context and injected services.

use crate::error::RenderError;
use crate::platform::Services;
use crate::runtime::{Effect, HookSlots, Scheduler, TaskSpawner};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

/// Handed to a component's render function.
///
/// Hooks are identified by call order, so a component must call the same
/// hooks in the same order on every render. A violation is reported as
/// [`RenderError::HookOrder`] when the render returns.
pub struct Scope<'a> {
    component: &'static str,
    slots: &'a mut HookSlots,
    cursor: usize,
    contexts: &'a [(TypeId, Rc<dyn Any>)],
    services: &'a Services,
    scheduler: &'a Rc<Scheduler>,
    spawner: &'a TaskSpawner,
    effects: &'a mut Vec<Effect>,
    error: Option<RenderError>,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(
        component: &'static str,
        slots: &'a mut HookSlots,
        contexts: &'a [(TypeId, Rc<dyn Any>)],
        services: &'a Services,
        scheduler: &'a Rc<Scheduler>,
        spawner: &'a TaskSpawner,
        effects: &'a mut Vec<Effect>,
    ) -> Self {
        Self {
            component,
            slots,
            cursor: 0,
            contexts,
            services,
            scheduler,
            spawner,
            effects,
            error: None,
        }
    }

    pub(crate) fn take_error(&mut self) -> Option<RenderError> {
        self.error.take()
    }

    /// Name of the component being rendered.
    pub fn component_name(&self) -> &'static str {
        self.component
    }

    fn fail(&mut self, error: RenderError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Next hook slot, created with `init` on first use.
    fn slot<S: Clone + 'static>(&mut self, init: impl FnOnce() -> S) -> S {
        let index = self.cursor;
        self.cursor += 1;

        if let Some(existing) = self.slots.get(index) {
            if let Some(slot) = existing.downcast_ref::<S>() {
                return slot.clone();
            }
            self.fail(RenderError::HookOrder {
                component: self.component,
                index,
            });
            let slot = init();
            self.slots[index] = Box::new(slot.clone());
            return slot;
        }

        trace!(component = self.component, index, "allocating hook slot");
        let slot = init();
        self.slots.push(Box::new(slot.clone()));
        slot
    }

    /// Local state that survives re-renders. The setter schedules an
    /// update; the new value is visible on the next render.
    pub fn use_state<T: Clone + 'static>(&mut self, init: impl FnOnce() -> T) -> (T, Setter<T>) {
        let cell = self.slot(|| Rc::new(RefCell::new(init())));
        let value = cell.borrow().clone();
        let setter = Setter {
            cell: Rc::downgrade(&cell),
            scheduler: Rc::downgrade(self.scheduler),
        };
        (value, setter)
    }

    /// A mutable box that survives re-renders without triggering them.
    pub fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
        self.slot(|| Rc::new(RefCell::new(init())))
    }

    /// Run `effect` after this render is committed, if `deps` differ from
    /// the previous render's.
    pub fn use_effect<D, F>(&mut self, deps: D, effect: F)
    where
        D: PartialEq + 'static,
        F: FnOnce() + 'static,
    {
        let last = self.slot(|| Rc::new(RefCell::new(None::<D>)));
        if last.borrow().as_ref() == Some(&deps) {
            return;
        }
        *last.borrow_mut() = Some(deps);
        self.effects.push(Box::new(effect));
    }

    /// Nearest provided value of type `T`.
    pub fn use_context<T: Clone + 'static>(&self) -> Option<T> {
        let wanted = TypeId::of::<T>();
        self.contexts
            .iter()
            .rev()
            .find(|(id, _)| *id == wanted)
            .and_then(|(_, value)| value.downcast_ref::<T>().cloned())
    }

    /// Like `use_context`, failing with a render error when absent.
    pub fn require_context<T: Clone + 'static>(&self) -> Result<T, RenderError> {
        self.use_context()
            .ok_or(RenderError::MissingContext(std::any::type_name::<T>()))
    }

    /// A platform service injected at mount time.
    pub fn service<T: Clone + 'static>(&self) -> Option<T> {
        self.services.get::<T>()
    }

    /// Like `service`, failing with a render error when absent.
    pub fn require_service<T: Clone + 'static>(&self) -> Result<T, RenderError> {
        self.service()
            .ok_or(RenderError::MissingService(std::any::type_name::<T>()))
    }

    /// Spawner for futures driven by the container's executor.
    pub fn spawner(&self) -> TaskSpawner {
        self.spawner.clone()
    }
}

/// Schedules updates to one piece of [`Scope::use_state`] state.
///
/// Setters outlive their component harmlessly: once the component is
/// unmounted or the container torn down, updates are dropped.
pub struct Setter<T> {
    cell: Weak<RefCell<T>>,
    scheduler: Weak<Scheduler>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<T: 'static> Setter<T> {
    /// Queue a replacement value.
    pub fn set(&self, value: T) {
        self.update(move |slot| *slot = value);
    }

    /// Queue an in-place update.
    pub fn update(&self, f: impl FnOnce(&mut T) + 'static) {
        let Some(scheduler) = self.scheduler.upgrade() else {
            debug!("ignoring state update for a dropped container");
            return;
        };
        let cell = self.cell.clone();
        scheduler.schedule(Box::new(move || match cell.upgrade() {
            Some(cell) => {
                f(&mut cell.borrow_mut());
                true
            }
            None => false,
        }));
    }
}
