//! Mounting descriptions and the update flush boundary.
//!
//! A [`Container`] owns everything one scenario needs: the document, the
//! update scheduler, hook state, injected services and a single-threaded
//! executor. Containers share nothing, so scenarios in the same process
//! cannot observe each other. Dropping a container (or calling
//! [`Container::unmount`]) tears all of it down.

use crate::config::HarnessConfig;
use crate::dom::{Document, NodeId};
use crate::error::{HarnessError, Result};
use crate::event::{Event, EventKind};
use crate::handle::ElementHandle;
use crate::platform::Services;
use crate::query::{Query, Screen};
use crate::runtime::{HookSlots, InstanceKey, RenderPass, Scheduler, TaskSpawner};
use crate::user::UserEvent;
use crate::view::View;
use futures::channel::oneshot;
use futures::executor::LocalPool;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Wraps the mounted description, typically in context providers.
pub type Wrapper = Rc<dyn Fn(View) -> View>;

/// Options for [`mount_with`].
pub struct MountOptions {
    wrapper: Option<Wrapper>,
    services: Services,
    config: HarnessConfig,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            wrapper: None,
            services: Services::new(),
            config: HarnessConfig::from_env(),
        }
    }
}

impl MountOptions {
    /// Create options with no wrapper, no services and config from the environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the description in `wrapper` on mount and on every rerender.
    pub fn wrapper<F>(mut self, wrapper: F) -> Self
    where
        F: Fn(View) -> View + 'static,
    {
        self.wrapper = Some(Rc::new(wrapper));
        self
    }

    /// Register a platform service for this container only.
    pub fn service<T: 'static>(mut self, service: T) -> Self {
        self.services.insert(service);
        self
    }

    /// Replace every registered service with `services`.
    pub fn services(mut self, services: Services) -> Self {
        self.services = services;
        self
    }

    /// Use `config` instead of the environment defaults.
    pub fn config(mut self, config: HarnessConfig) -> Self {
        self.config = config;
        self
    }
}

pub(crate) struct ContainerInner {
    pub(crate) document: RefCell<Document>,
    pub(crate) config: HarnessConfig,
    scheduler: Rc<Scheduler>,
    hooks: RefCell<HashMap<InstanceKey, HookSlots>>,
    root_view: RefCell<View>,
    wrapper: Option<Wrapper>,
    services: Services,
    pool: RefCell<Option<LocalPool>>,
    spawner: TaskSpawner,
    renders: Cell<usize>,
}

impl ContainerInner {
    pub(crate) fn is_torn_down(&self) -> bool {
        self.scheduler.is_torn_down()
    }

    fn wrap(&self, view: View) -> View {
        match &self.wrapper {
            Some(wrapper) => wrapper(view),
            None => view,
        }
    }

    fn render(&self) -> Result<()> {
        let view = self.root_view.borrow().clone();
        let (nodes, effects) = {
            let mut hooks = self.hooks.borrow_mut();
            RenderPass::run(
                &view,
                &mut hooks,
                &self.services,
                &self.scheduler,
                &self.spawner,
            )?
        };
        self.document.borrow_mut().commit(nodes);
        self.renders.set(self.renders.get() + 1);
        debug!(
            render = self.renders.get(),
            effects = effects.len(),
            "committed render"
        );
        for effect in effects {
            effect();
        }
        Ok(())
    }

    /// Run spawned tasks until they stall. The pool is out of its cell
    /// while it runs, so a task that re-enters the harness (a click
    /// inside `act_async`) finds it empty and leaves driving to this loop.
    fn run_tasks(&self) {
        let Some(mut pool) = self.pool.borrow_mut().take() else {
            return;
        };
        pool.run_until_stalled();
        if self.is_torn_down() {
            drop(pool);
            return;
        }
        *self.pool.borrow_mut() = Some(pool);
    }

    /// Drive spawned tasks and apply queued updates until nothing is
    /// pending.
    pub(crate) fn flush(&self) -> Result<()> {
        if self.is_torn_down() {
            return Ok(());
        }
        let _batch = self.scheduler.enter();
        self.run_tasks();

        let limit = self.config.max_flush_iterations;
        for pass in 0..limit {
            let pending = self.scheduler.take_pending();
            if pending.is_empty() {
                return Ok(());
            }
            let applied = pending
                .into_iter()
                .map(|update| update())
                .filter(|applied| *applied)
                .count();
            debug!(pass, applied, "flush pass");
            if applied > 0 {
                self.render()?;
            }
            self.run_tasks();
        }

        if self.scheduler.pending_len() == 0 {
            return Ok(());
        }
        Err(HarnessError::UpdateLoop { limit })
    }

    /// Deliver `event` to its target and, if it bubbles, each ancestor;
    /// then flush.
    pub(crate) fn dispatch(&self, mut event: Event) -> Result<Event> {
        let target = event.target();
        let path = {
            let doc = self.document.borrow();
            if !doc.is_element(target) {
                return Err(HarnessError::invalid_target(
                    "dispatch to",
                    "element is no longer attached to the tree",
                ));
            }
            if event.target_value().is_none() {
                event = event.with_value(doc.value(target).map(str::to_string));
            }
            let mut path = vec![target];
            if event.kind().bubbles() {
                path.extend(doc.ancestors(target));
            }
            path
        };
        debug!(event = %event.kind(), target = %target, "dispatching event");

        {
            let _batch = self.scheduler.enter();
            for node in path {
                let listeners = self.document.borrow().listeners(node, event.kind());
                if listeners.is_empty() {
                    continue;
                }
                event.set_current_target(node);
                for listener in listeners {
                    listener(&mut event);
                }
                if event.is_propagation_stopped() {
                    break;
                }
            }
        }

        self.flush()?;
        Ok(event)
    }

    /// Blur the focused element (if any) and focus `next`.
    pub(crate) fn move_focus(&self, next: Option<NodeId>) -> Result<()> {
        let previous = self.document.borrow().focused();
        if previous == next {
            return Ok(());
        }

        if let Some(previous) = previous {
            self.document.borrow_mut().set_focused(None);
            if self.document.borrow().is_element(previous) {
                self.dispatch(Event::new(EventKind::Blur, previous))?;
                self.dispatch(Event::new(EventKind::FocusOut, previous))?;
            }
        }

        if let Some(next) = next {
            if !self.document.borrow().is_element(next) {
                return Ok(());
            }
            self.document.borrow_mut().set_focused(Some(next));
            debug!(target = %next, "focus moved");
            self.dispatch(Event::new(EventKind::Focus, next))?;
            self.dispatch(Event::new(EventKind::FocusIn, next))?;
        }
        Ok(())
    }

    fn tear_down(&self) {
        if self.is_torn_down() {
            return;
        }
        self.scheduler.tear_down();
        let pool = self.pool.borrow_mut().take();
        drop(pool);
        let hooks = std::mem::take(&mut *self.hooks.borrow_mut());
        drop(hooks);
        self.document.borrow_mut().clear();
        debug!(renders = self.renders.get(), "container unmounted");
    }
}

/// Mount `view` into a fresh, isolated container.
pub fn mount(view: impl Into<View>) -> Result<Container> {
    mount_with(view, MountOptions::default())
}

/// Mount `view` wrapped by `wrapper`, which is re-applied on rerender.
pub fn mount_with_wrapper<F>(view: impl Into<View>, wrapper: F) -> Result<Container>
where
    F: Fn(View) -> View + 'static,
{
    mount_with(view, MountOptions::new().wrapper(wrapper))
}

/// Mount with explicit services, wrapper and config.
///
/// The initial render and any updates it triggers (effects, resolved
/// tasks) are flushed before this returns.
pub fn mount_with(view: impl Into<View>, options: MountOptions) -> Result<Container> {
    let MountOptions {
        wrapper,
        services,
        config,
    } = options;

    let pool = LocalPool::new();
    let scheduler = Scheduler::new(config.warn_on_unscoped_updates);
    let spawner = TaskSpawner::new(pool.spawner(), Rc::downgrade(&scheduler));

    let inner = Rc::new(ContainerInner {
        document: RefCell::new(Document::new()),
        config,
        scheduler,
        hooks: RefCell::new(HashMap::new()),
        root_view: RefCell::new(View::Empty),
        wrapper,
        services,
        pool: RefCell::new(Some(pool)),
        spawner,
        renders: Cell::new(0),
    });
    *inner.root_view.borrow_mut() = inner.wrap(view.into());

    let container = Container { inner };
    {
        let _batch = container.inner.scheduler.enter();
        container.inner.render()?;
    }
    container.inner.flush()?;
    debug!(services = ?container.inner.services, "mounted container");
    Ok(container)
}

/// A mounted UI tree and its isolated runtime.
pub struct Container {
    inner: Rc<ContainerInner>,
}

impl Container {
    fn live(&self, action: &'static str) -> Result<()> {
        if self.inner.is_torn_down() {
            return Err(HarnessError::invalid_target(
                action,
                "container has been unmounted",
            ));
        }
        Ok(())
    }

    /// Timeouts and limits this container was mounted with.
    pub fn config(&self) -> &HarnessConfig {
        &self.inner.config
    }

    /// Whether the container is still mounted.
    pub fn is_mounted(&self) -> bool {
        !self.inner.is_torn_down()
    }

    /// Completed render passes, including the initial one.
    pub fn render_count(&self) -> usize {
        self.inner.renders.get()
    }

    /// Replace the root description, keeping state and node identity
    /// wherever the structure still matches.
    pub fn rerender(&self, view: impl Into<View>) -> Result<()> {
        self.live("rerender")?;
        let view = self.inner.wrap(view.into());
        *self.inner.root_view.borrow_mut() = view;
        debug!("rerendering container");
        {
            let _batch = self.inner.scheduler.enter();
            self.inner.render()?;
        }
        self.inner.flush()
    }

    /// Tear down the tree, state, tasks and services. Idempotent.
    pub fn unmount(&self) {
        self.inner.tear_down();
    }

    /// Run `scope` inside a flush boundary: updates it triggers are
    /// applied, and spawned tasks driven, before this returns.
    pub fn act<R>(&self, scope: impl FnOnce() -> R) -> Result<R> {
        self.live("act in")?;
        let output = {
            let _batch = self.inner.scheduler.enter();
            scope()
        };
        self.inner.flush()?;
        Ok(output)
    }

    /// Fallible [`Container::act`]. When `scope` fails, whatever it queued
    /// is still flushed (best effort) before the error is returned.
    pub fn try_act<T, E>(&self, scope: impl FnOnce() -> std::result::Result<T, E>) -> std::result::Result<T, E>
    where
        E: From<HarnessError>,
    {
        self.live("act in")?;
        let output = {
            let _batch = self.inner.scheduler.enter();
            scope()
        };
        match output {
            Ok(value) => {
                self.inner.flush()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(flush_err) = self.inner.flush() {
                    warn!(%flush_err, "flush after a failed act scope also failed");
                }
                Err(err)
            }
        }
    }

    /// Run `future` to completion on the container's executor, flushing
    /// as it makes progress. Bounded by the configured async timeout.
    pub fn act_async<F>(&self, future: F) -> Result<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        self.live("act in")?;
        let (tx, mut rx) = oneshot::channel();
        self.inner.spawner.spawn(async move {
            let _ = tx.send(future.await);
        });

        let started = Instant::now();
        let timeout = self.inner.config.async_timeout();
        loop {
            self.inner.flush()?;
            match rx.try_recv() {
                Ok(Some(output)) => return Ok(output),
                Ok(None) => {}
                Err(_) => {
                    return Err(HarnessError::invalid_target(
                        "act in",
                        "async scope was dropped before completing",
                    ));
                }
            }
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(HarnessError::Timeout {
                    elapsed,
                    last_error: "async act scope did not complete".to_string(),
                });
            }
            thread::sleep(self.inner.config.poll_interval());
        }
    }

    fn poll<T>(&self, mut attempt: impl FnMut() -> std::result::Result<T, String>) -> Result<T> {
        let started = Instant::now();
        let timeout = self.inner.config.async_timeout();
        loop {
            self.live("wait in")?;
            self.inner.flush()?;
            match attempt() {
                Ok(value) => return Ok(value),
                Err(last_error) => {
                    let elapsed = started.elapsed();
                    if elapsed >= timeout {
                        debug!(?elapsed, %last_error, "wait timed out");
                        return Err(HarnessError::Timeout {
                            elapsed,
                            last_error,
                        });
                    }
                }
            }
            thread::sleep(self.inner.config.poll_interval());
        }
    }

    /// Retry `condition` until it succeeds or the async timeout passes.
    /// Pending tasks and updates are flushed before every attempt.
    pub fn wait_for<T>(&self, mut condition: impl FnMut() -> Result<T>) -> Result<T> {
        self.poll(|| condition().map_err(|err| err.to_string()))
    }

    /// [`Container::get_by`], retried until it succeeds.
    pub fn find_by(&self, query: &Query) -> Result<ElementHandle> {
        self.wait_for(|| self.get_by(query))
    }

    /// [`Container::get_all_by`], retried until it succeeds.
    pub fn find_all_by(&self, query: &Query) -> Result<Vec<ElementHandle>> {
        self.wait_for(|| self.get_all_by(query))
    }

    /// Wait until `query` matches nothing. Fails immediately if it
    /// matches nothing to begin with.
    pub fn wait_for_element_to_be_removed(&self, query: &Query) -> Result<()> {
        if self.query_all_by(query)?.is_empty() {
            return Err(HarnessError::NotFound {
                description: format!("{query}; it must be present before waiting for its removal"),
                dom: self.pretty_dom()?,
            });
        }
        self.poll(|| match self.query_all_by(query) {
            Ok(found) if found.is_empty() => Ok(()),
            Ok(found) => Err(format!("{} element(s) {query} still present", found.len())),
            Err(err) => Err(err.to_string()),
        })
    }

    /// Queries over the whole container.
    pub fn screen(&self) -> Screen {
        Screen::new(Rc::downgrade(&self.inner), self.inner.document.borrow().root())
    }

    /// The single element matching `query`.
    pub fn get_by(&self, query: &Query) -> Result<ElementHandle> {
        self.screen().get_by(query)
    }

    /// The single element matching `query`, or `None`.
    pub fn query_by(&self, query: &Query) -> Result<Option<ElementHandle>> {
        self.screen().query_by(query)
    }

    /// Every element matching `query`; at least one.
    pub fn get_all_by(&self, query: &Query) -> Result<Vec<ElementHandle>> {
        self.screen().get_all_by(query)
    }

    /// Every element matching `query`, possibly none.
    pub fn query_all_by(&self, query: &Query) -> Result<Vec<ElementHandle>> {
        self.screen().query_all_by(query)
    }

    /// The container element every description is mounted into.
    pub fn root(&self) -> Result<ElementHandle> {
        self.live("read")?;
        Ok(ElementHandle::new(
            Rc::downgrade(&self.inner),
            self.inner.document.borrow().root(),
        ))
    }

    /// The focused element, if any.
    pub fn focused(&self) -> Result<Option<ElementHandle>> {
        self.live("read")?;
        let focused = self.inner.document.borrow().focused();
        Ok(focused.map(|id| ElementHandle::new(Rc::downgrade(&self.inner), id)))
    }

    /// Interaction simulator bound to this container.
    pub fn user(&self) -> UserEvent {
        UserEvent::new(self.weak())
    }

    fn weak(&self) -> Weak<ContainerInner> {
        Rc::downgrade(&self.inner)
    }

    fn owned(&self, target: &ElementHandle, action: &'static str) -> Result<NodeId> {
        let (inner, id) = target.resolve(action)?;
        if !Rc::ptr_eq(&inner, &self.inner) {
            return Err(HarnessError::invalid_target(
                action,
                "element belongs to a different container",
            ));
        }
        Ok(id)
    }

    /// Dispatch a single bare event. Returns false if a listener
    /// prevented its default action.
    pub fn fire_event(&self, target: &ElementHandle, kind: EventKind) -> Result<bool> {
        let id = self.owned(target, "dispatch to")?;
        let event = self.inner.dispatch(Event::new(kind, id))?;
        Ok(!event.is_default_prevented())
    }

    /// Set a form control's value in one step and dispatch `input`.
    pub fn fire_input(&self, target: &ElementHandle, value: &str) -> Result<()> {
        let id = self.owned(target, "set value of")?;
        if !self.inner.document.borrow().has_form_value(id) {
            return Err(HarnessError::invalid_target(
                "set value of",
                "element has no form value",
            ));
        }
        self.inner
            .document
            .borrow_mut()
            .set_value(id, value.to_string());
        self.inner
            .dispatch(Event::new(EventKind::Input, id).with_data(value))?;
        Ok(())
    }

    /// Indented markup of the container, cut at the debug print limit.
    pub fn pretty_dom(&self) -> Result<String> {
        self.screen().pretty_dom()
    }

    /// Log the container's markup and return it.
    pub fn debug(&self) -> Result<String> {
        let dom = self.pretty_dom()?;
        info!("\n{dom}");
        Ok(dom)
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        self.inner.tear_down();
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("mounted", &self.is_mounted())
            .field("renders", &self.render_count())
            .field("nodes", &self.inner.document.borrow().len())
            .finish()
    }
}
