//! Handler table and pending queue kept consistent with each other.
//!
//! Every mutation that touches both structures lives here so the
//! handler → task and task → handler links are updated together.

use std::sync::Arc;

use tracing::error;

use crate::error::BusResult;
use crate::event::{Callback, Event, EventKey, RegistrationToken};
use crate::handler::{Handler, HandlerTable};
use crate::listener::ListenerId;
use crate::queue::{HandlerRef, PendingQueue, PendingTask, TaskAction};

/// Handlers and tasks taken out of the registry.
///
/// Kept alive until the caller has released its borrow of the registry so
/// that callback destructors may call back into the bus.
#[derive(Debug, Default)]
#[must_use]
pub(crate) struct Removed {
    handlers: Vec<Handler>,
    cancelled: Vec<PendingTask>,
}

impl Removed {
    pub(crate) fn handlers(&self) -> usize {
        self.handlers.len()
    }

    pub(crate) fn cancelled(&self) -> usize {
        self.cancelled.len()
    }
}

/// All mutable bus state.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    handlers: HandlerTable,
    queue: PendingQueue,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            handlers: HandlerTable::new(),
            queue: PendingQueue::new(),
        }
    }

    /// Store a handler for `(E, listener)`.
    ///
    /// A duplicate is handed back untouched so the caller can drop it.
    pub(crate) fn register<E: Event>(
        &mut self,
        listener: ListenerId,
        callback: Callback<E::Args>,
    ) -> Result<RegistrationToken, Handler> {
        let key = EventKey::of::<E>();
        if self.handlers.get(key, listener).is_some() {
            return Err(Handler::new::<E>(listener, callback));
        }
        self.handlers.insert(key, Handler::new::<E>(listener, callback));
        Ok(RegistrationToken::new(key))
    }

    /// Remove one handler and cancel its pending tasks.
    pub(crate) fn remove(&mut self, key: EventKey, listener: ListenerId) -> Option<Removed> {
        let handler = self.handlers.remove(key, listener)?;
        let mut removed = Removed::default();
        self.cancel_pending(&handler, &mut removed.cancelled);
        removed.handlers.push(handler);
        Some(removed)
    }

    /// Remove every handler of a type and cancel their pending tasks.
    pub(crate) fn remove_event(&mut self, key: EventKey) -> Removed {
        let mut removed = Removed::default();
        for handler in self.handlers.remove_event(key) {
            self.cancel_pending(&handler, &mut removed.cancelled);
            removed.handlers.push(handler);
        }
        removed
    }

    fn cancel_pending(&mut self, handler: &Handler, cancelled: &mut Vec<PendingTask>) {
        for id in handler.pending() {
            match self.queue.cancel(id) {
                Some(task) => cancelled.push(task),
                None => error!(
                    listener = %handler.listener(),
                    "Handler referenced a task that is no longer queued"
                ),
            }
        }
    }

    pub(crate) fn contains(&self, key: EventKey, listener: ListenerId) -> bool {
        self.handlers.get(key, listener).is_some()
    }

    pub(crate) fn listeners(&self, key: EventKey) -> Vec<ListenerId> {
        self.handlers.listeners(key)
    }

    /// Typed callback for a pair, `None` if the pair is not registered.
    pub(crate) fn callback<E: Event>(
        &self,
        key: EventKey,
        listener: ListenerId,
    ) -> BusResult<Option<Callback<E::Args>>> {
        self.handlers
            .get(key, listener)
            .map(Handler::callback::<E>)
            .transpose()
    }

    /// Queue one task per current handler of `E`, all sharing `args`.
    pub(crate) fn enqueue<E: Event>(&mut self, args: &Arc<E::Args>) -> BusResult<usize> {
        let key = EventKey::of::<E>();
        let Self { handlers, queue } = self;

        let mut enqueued: usize = 0;
        for handler in handlers.handlers_mut(key) {
            let callback = handler.callback::<E>()?;
            let args = Arc::clone(args);
            let origin = HandlerRef {
                key,
                listener: handler.listener(),
            };
            let id = queue.push(Some(origin), Box::new(move || callback(&*args)));
            handler.track(id);
            enqueued = enqueued.saturating_add(1);
        }
        Ok(enqueued)
    }

    /// Queue a task that belongs to no handler.
    pub(crate) fn enqueue_sentinel(&mut self, action: TaskAction) {
        self.queue.push(None, action);
    }

    /// Take the oldest task and detach it from its handler.
    pub(crate) fn pop_next(&mut self) -> Option<PendingTask> {
        let (id, task) = self.queue.pop_front()?;
        if let Some(origin) = task.origin() {
            let detached = self
                .handlers
                .get_mut(origin.key, origin.listener)
                .is_some_and(|handler| handler.untrack(id));
            if !detached {
                error!(
                    event = %origin.key,
                    listener = %origin.listener,
                    "Pending task was not tracked by its handler"
                );
            }
        }
        Some(task)
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn handler_count(&self, key: EventKey) -> usize {
        self.handlers.count(key)
    }

    pub(crate) fn handler_total(&self) -> usize {
        self.handlers.total()
    }

    pub(crate) fn pending_for(&self, key: EventKey, listener: ListenerId) -> usize {
        self.handlers
            .get(key, listener)
            .map_or(0, Handler::pending_len)
    }
}
