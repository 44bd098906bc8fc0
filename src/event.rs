//! Pattern-based event dispatch.
//!
//! Handlers subscribe to shell-style glob patterns (`*`, `?`, `[...]`),
//! matched case-insensitively against event names such as `PRIVMSG`,
//! `001` or `CTCP_VERSION`. Every handler of every matching pattern runs as
//! its own task on the bus's [`TaskPool`].
//!
//! ```no_run
//! # async fn demo() {
//! use slirc_client::event::{handler, EventBus};
//! use slirc_client::pool::TaskPool;
//!
//! let bus = EventBus::new(TaskPool::new());
//! bus.bind("ctcp_*", handler(|event| async move {
//!     println!("{} from {:?}", event.name, event.source);
//! }));
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use glob::{MatchOptions, Pattern};
use parking_lot::RwLock;
use tracing::trace;

use crate::pool::TaskPool;
use crate::prefix::Prefix;

/// Payload carried by an [`Event`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventData {
    /// Synthetic events with nothing to carry (`CONNECT`, `DISCONNECT`).
    None,
    /// Remaining command arguments.
    Args(Vec<String>),
    /// Message text of `PRIVMSG`, `PUBMSG`, `PRIVNOTICE` and `PUBNOTICE`.
    Text(String),
    /// Data part of a `CTCP_*` or `CTCPREPLY_*` frame.
    Ctcp(Option<String>),
    /// The unmodified line of a `RAW_MESSAGE`.
    Raw(String),
}

impl EventData {
    pub fn args(&self) -> &[String] {
        match self {
            EventData::Args(args) => args,
            _ => &[],
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            EventData::Text(s) | EventData::Raw(s) => Some(s),
            EventData::Ctcp(data) => data.as_deref(),
            _ => None,
        }
    }
}

/// A dispatched event.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    /// Event name as dispatched (upper-cased command or synthetic name).
    pub name: String,
    /// Origin of the message; the server for synthetic events, once known.
    pub source: Option<Prefix>,
    /// Channel or nickname the message was addressed to, where applicable.
    pub target: Option<String>,
    pub data: EventData,
}

impl Event {
    pub fn new(name: &str, source: Option<Prefix>, target: Option<String>, data: EventData) -> Self {
        Event {
            name: name.to_owned(),
            source,
            target,
            data,
        }
    }
}

/// A subscribed handler. Identity (for [`EventBus::unbind`]) is the `Arc`.
pub type EventHandler = Arc<dyn Fn(Arc<Event>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap an async closure as an [`EventHandler`].
pub fn handler<F, Fut>(f: F) -> EventHandler
where
    F: Fn(Arc<Event>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |event| f(event).boxed())
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

struct Subscription {
    key: String,
    // None when the key is not a valid glob (an unbalanced `[`); such a
    // key matches only itself.
    pattern: Option<Pattern>,
    handlers: Vec<EventHandler>,
}

impl Subscription {
    fn new(key: String) -> Self {
        Subscription {
            pattern: Pattern::new(&key).ok(),
            key,
            handlers: Vec::new(),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.matches_with(name, MATCH_OPTIONS),
            None => self.key.eq_ignore_ascii_case(name),
        }
    }
}

/// Glob-pattern publish/subscribe registry.
pub struct EventBus {
    pool: TaskPool,
    subscriptions: RwLock<Vec<Subscription>>,
}

impl EventBus {
    /// Create a bus whose handlers run on `pool`.
    pub fn new(pool: TaskPool) -> Self {
        EventBus {
            pool,
            subscriptions: RwLock::new(Vec::new()),
        }
    }

    /// Append `handler` to the handlers of `pattern`.
    pub fn bind(&self, pattern: &str, handler: EventHandler) {
        let key = pattern.to_uppercase();
        let mut subs = self.subscriptions.write();
        match subs.iter_mut().find(|s| s.key == key) {
            Some(sub) => sub.handlers.push(handler),
            None => {
                let mut sub = Subscription::new(key);
                sub.handlers.push(handler);
                subs.push(sub);
            }
        }
    }

    /// Remove one handler from `pattern`, or all of them when `handler` is
    /// `None`. Unknown patterns and handlers are ignored.
    pub fn unbind(&self, pattern: &str, handler: Option<&EventHandler>) {
        let key = pattern.to_uppercase();
        let mut subs = self.subscriptions.write();
        let Some(sub) = subs.iter_mut().find(|s| s.key == key) else {
            return;
        };
        match handler {
            None => sub.handlers.clear(),
            Some(h) => {
                if let Some(pos) = sub.handlers.iter().position(|x| Arc::ptr_eq(x, h)) {
                    sub.handlers.remove(pos);
                }
            }
        }
    }

    /// Patterns that currently have at least one handler, in bind order.
    pub fn patterns(&self) -> Vec<String> {
        self.subscriptions
            .read()
            .iter()
            .filter(|s| !s.handlers.is_empty())
            .map(|s| s.key.clone())
            .collect()
    }

    /// Handlers that `name` would reach, in dispatch order.
    pub fn handlers_for(&self, name: &str) -> Vec<EventHandler> {
        self.subscriptions
            .read()
            .iter()
            .filter(|s| s.matches(name))
            .flat_map(|s| s.handlers.iter().cloned())
            .collect()
    }

    /// Spawn every handler whose pattern matches `event.name`.
    ///
    /// Handlers under one pattern are spawned in registration order; no
    /// completion order is promised.
    pub fn dispatch(&self, event: Event) {
        let handlers = self.handlers_for(&event.name);
        trace!(event = %event.name, handlers = handlers.len(), "dispatch");
        if handlers.is_empty() {
            return;
        }

        let event = Arc::new(event);
        for handler in handlers {
            self.pool.spawn(handler(event.clone()));
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("patterns", &self.patterns())
            .finish()
    }
}
