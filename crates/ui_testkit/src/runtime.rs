//! Update scheduling and render passes.
//!
//! State setters never touch the tree directly. They queue a
//! [`PendingUpdate`] on the container's [`Scheduler`]; the flush loop in
//! [`crate::container`] drains the queue, re-expands the root description
//! with a [`RenderPass`] and commits the result to the document.

use crate::dom::{HostElement, HostNode, VOID_TAGS};
use crate::error::RenderError;
use crate::platform::Services;
use crate::scope::Scope;
use crate::view::View;
use futures::executor::LocalSpawner;
use futures::task::LocalSpawnExt;
use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

/// A queued state transition. Returns false when its target state no
/// longer exists (the component instance was unmounted).
pub(crate) type PendingUpdate = Box<dyn FnOnce() -> bool>;

/// Work to run after a commit.
pub(crate) type Effect = Box<dyn FnOnce()>;

/// Hook storage of one component instance, indexed by call order.
pub(crate) type HookSlots = Vec<Box<dyn Any>>;

pub(crate) struct Scheduler {
    queue: RefCell<VecDeque<PendingUpdate>>,
    batch_depth: Cell<usize>,
    torn_down: Cell<bool>,
    warn_unscoped: bool,
}

impl Scheduler {
    pub(crate) fn new(warn_unscoped: bool) -> Rc<Self> {
        Rc::new(Self {
            queue: RefCell::new(VecDeque::new()),
            batch_depth: Cell::new(0),
            torn_down: Cell::new(false),
            warn_unscoped,
        })
    }

    pub(crate) fn schedule(&self, update: PendingUpdate) {
        if self.torn_down.get() {
            debug!("dropping state update for an unmounted container");
            return;
        }
        if self.batch_depth.get() == 0 && self.warn_unscoped {
            warn!(
                "state update scheduled outside a flush boundary; \
                 wrap the code that triggers it in Container::act"
            );
        }
        self.queue.borrow_mut().push_back(update);
    }

    /// Enter a flush boundary. Updates scheduled while the guard lives
    /// are considered expected.
    pub(crate) fn enter(self: &Rc<Self>) -> BatchGuard {
        self.batch_depth.set(self.batch_depth.get() + 1);
        BatchGuard {
            scheduler: Rc::clone(self),
        }
    }

    pub(crate) fn take_pending(&self) -> VecDeque<PendingUpdate> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.queue.borrow().len()
    }

    #[cfg(test)]
    pub(crate) fn in_batch(&self) -> bool {
        self.batch_depth.get() > 0
    }

    pub(crate) fn tear_down(&self) {
        self.torn_down.set(true);
        let dropped = self.take_pending();
        drop(dropped);
    }

    pub(crate) fn is_torn_down(&self) -> bool {
        self.torn_down.get()
    }
}

pub(crate) struct BatchGuard {
    scheduler: Rc<Scheduler>,
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        let depth = self.scheduler.batch_depth.get();
        self.scheduler.batch_depth.set(depth.saturating_sub(1));
    }
}

/// Spawns futures onto the owning container's single-threaded executor.
///
/// Tasks only make progress inside a flush boundary (`act`, `act_async`,
/// `wait_for`, or event dispatch) and are dropped at teardown.
#[derive(Clone)]
pub struct TaskSpawner {
    spawner: LocalSpawner,
    scheduler: Weak<Scheduler>,
}

impl TaskSpawner {
    pub(crate) fn new(spawner: LocalSpawner, scheduler: Weak<Scheduler>) -> Self {
        Self { spawner, scheduler }
    }

    pub fn spawn(&self, future: impl Future<Output = ()> + 'static) {
        let alive = self
            .scheduler
            .upgrade()
            .is_some_and(|scheduler| !scheduler.is_torn_down());
        if !alive {
            debug!("not spawning task on an unmounted container");
            return;
        }
        if let Err(err) = self.spawner.spawn_local(future) {
            debug!(%err, "executor shut down; task dropped");
        }
    }
}

/// Identity of a component instance across renders: its position in
/// the description tree plus its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct InstanceKey {
    path: Vec<usize>,
    name: &'static str,
}

fn valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// One expansion of a description into host nodes.
pub(crate) struct RenderPass<'a> {
    hooks: &'a mut HashMap<InstanceKey, HookSlots>,
    seen: HashSet<InstanceKey>,
    contexts: Vec<(TypeId, Rc<dyn Any>)>,
    services: &'a Services,
    scheduler: &'a Rc<Scheduler>,
    spawner: &'a TaskSpawner,
    effects: Vec<Effect>,
}

impl<'a> RenderPass<'a> {
    /// Expand `view`, returning the host tree and effects to run after
    /// commit. Instances not reached by this pass lose their state.
    pub(crate) fn run(
        view: &View,
        hooks: &'a mut HashMap<InstanceKey, HookSlots>,
        services: &'a Services,
        scheduler: &'a Rc<Scheduler>,
        spawner: &'a TaskSpawner,
    ) -> Result<(Vec<HostNode>, Vec<Effect>), RenderError> {
        let mut pass = Self {
            hooks,
            seen: HashSet::new(),
            contexts: Vec::new(),
            services,
            scheduler,
            spawner,
            effects: Vec::new(),
        };

        let mut nodes = Vec::new();
        pass.expand(view, &mut Vec::new(), &mut nodes)?;

        let RenderPass {
            hooks,
            seen,
            effects,
            ..
        } = pass;
        let before = hooks.len();
        hooks.retain(|key, _| seen.contains(key));
        if hooks.len() < before {
            debug!(unmounted = before - hooks.len(), "released component state");
        }

        Ok((nodes, effects))
    }

    fn expand(
        &mut self,
        view: &View,
        path: &mut Vec<usize>,
        out: &mut Vec<HostNode>,
    ) -> Result<(), RenderError> {
        match view {
            View::Empty => Ok(()),
            View::Text(text) => {
                out.push(HostNode::Text(text.clone()));
                Ok(())
            }
            View::Fragment(children) => self.expand_children(children, path, out),
            View::Element(element) => {
                if !valid_tag(&element.tag) {
                    return Err(RenderError::InvalidTag(element.tag.clone()));
                }
                let tag = element.tag.to_ascii_lowercase();
                if VOID_TAGS.contains(&tag.as_str())
                    && element.children.iter().any(|child| !child.is_empty())
                {
                    return Err(RenderError::VoidElementChildren { tag });
                }

                let mut children = Vec::new();
                self.expand_children(&element.children, path, &mut children)?;
                out.push(HostNode::Element(HostElement {
                    tag,
                    attrs: element.attrs.clone(),
                    style: element.style.clone(),
                    listeners: element.listeners.clone(),
                    value: element.value.clone(),
                    children,
                }));
                Ok(())
            }
            View::Component(component) => {
                let key = InstanceKey {
                    path: path.clone(),
                    name: component.name,
                };
                let mut slots = self.hooks.remove(&key).unwrap_or_default();
                self.seen.insert(key.clone());

                let rendered = {
                    let mut scope = Scope::new(
                        component.name,
                        &mut slots,
                        &self.contexts,
                        self.services,
                        self.scheduler,
                        self.spawner,
                        &mut self.effects,
                    );
                    let result = (component.render)(&mut scope);
                    match scope.take_error() {
                        Some(err) => Err(err),
                        None => result,
                    }
                };
                self.hooks.insert(key, slots);

                let child = rendered?;
                path.push(0);
                let result = self.expand(&child, path, out);
                path.pop();
                result
            }
            View::Provider(provider) => {
                self.contexts
                    .push((provider.type_id, Rc::clone(&provider.value)));
                path.push(0);
                let result = self.expand(&provider.child, path, out);
                path.pop();
                self.contexts.pop();
                result
            }
        }
    }

    fn expand_children(
        &mut self,
        children: &[View],
        path: &mut Vec<usize>,
        out: &mut Vec<HostNode>,
    ) -> Result<(), RenderError> {
        for (index, child) in children.iter().enumerate() {
            path.push(index);
            let result = self.expand(child, path, out);
            path.pop();
            result?;
        }
        Ok(())
    }
}
