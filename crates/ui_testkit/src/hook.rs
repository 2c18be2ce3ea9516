//! Testing hook logic without writing a component.
//!
//! [`render_hook`] mounts a throwaway component that calls the hook and
//! records what it returned. [`HookResult::current`] always reads the
//! value from the most recent render.

use crate::container::{Container, MountOptions, mount_with};
use crate::error::{HarnessError, Result};
use crate::scope::Scope;
use crate::view::{View, component};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Latest output of a hook under test.
pub struct HookResult<R> {
    container: Container,
    view: View,
    latest: Rc<RefCell<Option<R>>>,
    renders: Rc<Cell<usize>>,
}

/// Render `hook` inside a fresh container.
///
/// ```rust,ignore
/// let result = render_hook(|cx| use_counter(cx, CounterOptions::default()))?;
/// result.act(|| result.current().unwrap().increment())?;
/// assert_eq!(result.current()?.count, 1);
/// ```
pub fn render_hook<R, F>(hook: F) -> Result<HookResult<R>>
where
    R: Clone + 'static,
    F: Fn(&mut Scope<'_>) -> R + 'static,
{
    render_hook_with(hook, MountOptions::default())
}

/// [`render_hook`] with services, a wrapper (for context) or config.
pub fn render_hook_with<R, F>(hook: F, options: MountOptions) -> Result<HookResult<R>>
where
    R: Clone + 'static,
    F: Fn(&mut Scope<'_>) -> R + 'static,
{
    let latest = Rc::new(RefCell::new(None));
    let renders = Rc::new(Cell::new(0));

    let view = {
        let latest = Rc::clone(&latest);
        let renders = Rc::clone(&renders);
        component("HookHarness", move |cx| {
            let value = hook(cx);
            *latest.borrow_mut() = Some(value);
            renders.set(renders.get() + 1);
            Ok(View::Empty)
        })
    };

    let container = mount_with(view.clone(), options)?;
    Ok(HookResult {
        container,
        view,
        latest,
        renders,
    })
}

impl<R: Clone> HookResult<R> {
    /// Value returned by the most recent render.
    pub fn current(&self) -> Result<R> {
        if !self.container.is_mounted() {
            return Err(HarnessError::invalid_target(
                "read",
                "hook container has been unmounted",
            ));
        }
        self.latest
            .borrow()
            .clone()
            .ok_or_else(|| HarnessError::invalid_target("read", "hook has not rendered"))
    }

    /// Number of times the hook has run.
    pub fn render_count(&self) -> usize {
        self.renders.get()
    }

    /// Run the hook again with its state intact. Hooks that read
    /// test-controlled inputs (a `Cell` captured by the closure) pick up
    /// new values this way.
    pub fn rerender(&self) -> Result<()> {
        self.container.rerender(self.view.clone())
    }

    /// See [`Container::act`].
    pub fn act<T>(&self, scope: impl FnOnce() -> T) -> Result<T> {
        self.container.act(scope)
    }

    /// See [`Container::wait_for`].
    pub fn wait_for<T>(&self, condition: impl FnMut() -> Result<T>) -> Result<T> {
        self.container.wait_for(condition)
    }

    /// The container hosting the hook.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Unmount the host component.
    pub fn unmount(&self) {
        self.container.unmount();
    }
}

impl<R> fmt::Debug for HookResult<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookResult")
            .field("renders", &self.renders.get())
            .field("container", &self.container)
            .finish()
    }
}
