//! Namespaced event listeners with synchronous dispatch.
//!
//! Listeners are registered per [`Target`] under an event spec such as
//! `"click.menu keydown.menu.shortcuts"`: a whitespace-separated list of event
//! types, each optionally followed by dotted namespaces. Namespaces only
//! matter for removal: `off(target, "*.menu", None)` drops every listener
//! registered under the `menu` namespace, whatever its type.

use crate::data::DataValue;
use crate::dom::{Document, NodeKind};
use crate::trace;
use indexmap::IndexMap;
use indextree::NodeId;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Window,
    Document,
    Node(NodeId),
}

impl From<NodeId> for Target {
    fn from(node: NodeId) -> Self {
        Target::Node(node)
    }
}

/// Unique listener id. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

impl ListenerId {
    fn next() -> Self {
        ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A listener callback. Two handlers are the same when they share the same
/// allocation, so keep a clone around to remove it later.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&mut Event)>);

impl Handler {
    pub fn new(f: impl Fn(&mut Event) + 'static) -> Self {
        Handler(Rc::new(f))
    }

    /// Identity comparison.
    pub fn same(&self, other: &Handler) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }

    fn call(&self, event: &mut Event) {
        (self.0)(event)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// One recorded `(type, namespaces, handler)` triple.
#[derive(Debug, Clone)]
pub struct Registration {
    pub id: ListenerId,
    pub event_type: String,
    pub namespaces: SmallVec<[String; 2]>,
    pub handler: Handler,
}

/// An event being dispatched.
#[derive(Debug, Clone)]
pub struct Event {
    event_type: String,
    detail: Option<DataValue>,
    bubbles: bool,
    cancelable: bool,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_propagation_stopped: bool,
    target: Option<Target>,
    current_target: Option<Target>,
}

impl Event {
    /// A plain event: does not bubble, not cancelable.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            detail: None,
            bubbles: false,
            cancelable: false,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
            target: None,
            current_target: None,
        }
    }

    /// Like `new CustomEvent(type, { detail })`.
    pub fn custom(event_type: impl Into<String>, detail: Option<DataValue>) -> Self {
        Self {
            detail,
            ..Self::new(event_type)
        }
    }

    pub fn bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    pub fn cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn detail(&self) -> Option<&DataValue> {
        self.detail.as_ref()
    }

    pub fn does_bubble(&self) -> bool {
        self.bubbles
    }

    /// The target `trigger` was called on.
    pub fn target(&self) -> Option<Target> {
        self.target
    }

    /// The target whose listeners are running.
    pub fn current_target(&self) -> Option<Target> {
        self.current_target
    }

    /// Has no effect unless the event is cancelable.
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Finish the current target, then stop.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop right after the running listener.
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }
}

impl From<&str> for Event {
    fn from(event_type: &str) -> Self {
        Event::custom(event_type, None)
    }
}

impl From<String> for Event {
    fn from(event_type: String) -> Self {
        Event::custom(event_type, None)
    }
}

const TOUCH_EVENTS: &[&str] = &["touchstart", "touchmove", "touchend", "touchcancel"];

pub fn is_touch_event(event: &Event) -> bool {
    TOUCH_EVENTS.contains(&event.event_type())
}

/// `click.a.b` -> (`click`, [`a`, `b`]). Empty namespaces are dropped.
fn parse_event_type(token: &str) -> (&str, SmallVec<[String; 2]>) {
    let mut parts = token.split('.');
    let event_type = parts.next().unwrap_or_default();
    let namespaces = parts
        .filter(|ns| !ns.is_empty())
        .map(str::to_string)
        .collect();
    (event_type, namespaces)
}

/// Every listener, keyed by target, in registration order.
#[derive(Debug, Default, Clone)]
pub struct EventRegistry {
    listeners: HashMap<Target, IndexMap<ListenerId, Registration>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every type in `events`. Returns the new ids.
    pub fn on(&mut self, target: Target, events: &str, handler: &Handler) -> Vec<ListenerId> {
        let mut tokens = events.split_whitespace().peekable();
        if tokens.peek().is_none() {
            return Vec::new();
        }

        let registrations = self.listeners.entry(target).or_default();
        let mut ids = Vec::new();

        for token in tokens {
            let (event_type, namespaces) = parse_event_type(token);
            let id = ListenerId::next();
            trace!(?target, event_type, ?namespaces, id = id.0, "listener added");
            registrations.insert(
                id,
                Registration {
                    id,
                    event_type: event_type.to_string(),
                    namespaces,
                    handler: handler.clone(),
                },
            );
            ids.push(id);
        }
        ids
    }

    /// Remove the registrations of `target` matching `events`.
    ///
    /// A registration goes when its type equals the requested one (or `*`
    /// was requested), it carries every requested namespace, and `handler`
    /// is either `None` or the same handler. Returns how many were removed.
    pub fn off(&mut self, target: Target, events: &str, handler: Option<&Handler>) -> usize {
        let Some(registrations) = self.listeners.get_mut(&target) else {
            return 0;
        };

        let before = registrations.len();
        for token in events.split_whitespace() {
            let (event_type, namespaces) = parse_event_type(token);
            registrations.retain(|_, reg| {
                let matches = (event_type == "*" || reg.event_type == event_type)
                    && namespaces.iter().all(|ns| reg.namespaces.contains(ns))
                    && handler.is_none_or(|h| h.same(&reg.handler));
                !matches
            });
        }
        let removed = before - registrations.len();

        if registrations.is_empty() {
            self.listeners.remove(&target);
        }
        trace!(?target, events, removed, "listeners removed");
        removed
    }

    pub fn on_each<I>(&mut self, targets: I, events: &str, handler: &Handler) -> Vec<ListenerId>
    where
        I: IntoIterator<Item = Target>,
    {
        targets
            .into_iter()
            .flat_map(|target| self.on(target, events, handler))
            .collect()
    }

    pub fn off_each<I>(&mut self, targets: I, events: &str, handler: Option<&Handler>) -> usize
    where
        I: IntoIterator<Item = Target>,
    {
        targets
            .into_iter()
            .map(|target| self.off(target, events, handler))
            .sum()
    }

    /// Drop every registration of `target`.
    pub fn release(&mut self, target: Target) {
        self.listeners.remove(&target);
    }

    /// Registrations of `target`, in registration order.
    pub fn listeners(&self, target: Target) -> impl Iterator<Item = &Registration> + '_ {
        self.listeners
            .get(&target)
            .into_iter()
            .flat_map(|registrations| registrations.values())
    }

    /// Dispatch `event` at `target` and return it once every listener ran.
    ///
    /// Listeners of the target run first, in registration order. A bubbling
    /// event then visits each ancestor element, the document (when the node
    /// is attached to it) and finally the window.
    pub fn trigger(&self, doc: &Document, target: Target, event: impl Into<Event>) -> Event {
        let mut event = event.into();
        event.target = Some(target);

        let path = if event.bubbles {
            propagation_path(doc, target)
        } else {
            vec![target]
        };

        let mut _invoked = 0usize;
        for current in path {
            event.current_target = Some(current);

            // Listeners added or removed by a handler do not affect this target
            let handlers: Vec<Handler> = self
                .listeners(current)
                .filter(|reg| reg.event_type == event.event_type)
                .map(|reg| reg.handler.clone())
                .collect();

            for handler in handlers {
                handler.call(&mut event);
                _invoked += 1;
                if event.immediate_propagation_stopped {
                    break;
                }
            }
            if event.propagation_stopped {
                break;
            }
        }

        event.current_target = None;
        trace!(
            event_type = event.event_type.as_str(),
            ?target,
            invoked = _invoked,
            "event dispatched"
        );
        event
    }
}

/// Target, ancestor elements, document, window.
fn propagation_path(doc: &Document, target: Target) -> Vec<Target> {
    match target {
        Target::Window => vec![Target::Window],
        Target::Document => vec![Target::Document, Target::Window],
        Target::Node(node) => {
            let mut path = vec![Target::Node(node)];
            let mut attached = false;
            for ancestor in node.ancestors(&doc.arena).skip(1) {
                match doc.get(ancestor).kind {
                    NodeKind::Document => attached = true,
                    _ => path.push(Target::Node(ancestor)),
                }
            }
            if attached {
                path.push(Target::Document);
                path.push(Target::Window);
            }
            path
        }
    }
}
