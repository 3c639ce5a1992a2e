//! Per-event-type handler storage.

use std::any::Any;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;

use crate::error::{BusError, BusResult};
use crate::event::{Callback, Event, EventKey};
use crate::listener::ListenerId;
use crate::queue::TaskId;

/// A callback with its argument type erased.
///
/// Always holds a `Callback<E::Args>` for the `E` it was created with; the
/// handler table only hands it back out under the same event key.
struct ErasedCallback(Box<dyn Any + Send + Sync>);

impl ErasedCallback {
    fn new<E: Event>(callback: Callback<E::Args>) -> Self {
        Self(Box::new(callback))
    }

    fn typed<E: Event>(&self) -> Option<Callback<E::Args>> {
        self.0.downcast_ref::<Callback<E::Args>>().cloned()
    }
}

/// A registered listener for one event type.
pub(crate) struct Handler {
    listener: ListenerId,
    callback: ErasedCallback,
    pending: VecDeque<TaskId>,
}

impl Handler {
    pub(crate) fn new<E: Event>(listener: ListenerId, callback: Callback<E::Args>) -> Self {
        Self {
            listener,
            callback: ErasedCallback::new::<E>(callback),
            pending: VecDeque::new(),
        }
    }

    pub(crate) fn listener(&self) -> ListenerId {
        self.listener
    }

    /// Typed view of the stored callback.
    pub(crate) fn callback<E: Event>(&self) -> BusResult<Callback<E::Args>> {
        self.callback
            .typed::<E>()
            .ok_or(BusError::CallbackMismatch { event: E::name() })
    }

    /// Record a task enqueued on behalf of this handler.
    pub(crate) fn track(&mut self, id: TaskId) {
        self.pending.push_back(id);
    }

    /// Forget a task that left the queue. Returns `false` if it was unknown.
    pub(crate) fn untrack(&mut self, id: TaskId) -> bool {
        // Tasks leave the queue in FIFO order, so this is almost always the front.
        if self.pending.front() == Some(&id) {
            self.pending.pop_front();
            return true;
        }
        let before = self.pending.len();
        self.pending.retain(|pending| *pending != id);
        self.pending.len() != before
    }

    /// Ids of this handler's tasks still waiting in the queue, oldest first.
    pub(crate) fn pending(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.pending.iter().copied()
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("listener", &self.listener)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

/// Mapping from event type to the ordered handlers of that type.
#[derive(Debug, Default)]
pub(crate) struct HandlerTable {
    events: HashMap<EventKey, BTreeMap<ListenerId, Handler>>,
}

impl HandlerTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a handler unless one already exists for the pair.
    pub(crate) fn insert(&mut self, key: EventKey, handler: Handler) -> bool {
        let listeners = self.events.entry(key).or_default();
        if listeners.contains_key(&handler.listener) {
            return false;
        }
        listeners.insert(handler.listener, handler);
        true
    }

    pub(crate) fn get(&self, key: EventKey, listener: ListenerId) -> Option<&Handler> {
        self.events.get(&key)?.get(&listener)
    }

    pub(crate) fn get_mut(&mut self, key: EventKey, listener: ListenerId) -> Option<&mut Handler> {
        self.events.get_mut(&key)?.get_mut(&listener)
    }

    /// Remove the handler for a pair, pruning the type entry once empty.
    pub(crate) fn remove(&mut self, key: EventKey, listener: ListenerId) -> Option<Handler> {
        let listeners = self.events.get_mut(&key)?;
        let removed = listeners.remove(&listener);
        if listeners.is_empty() {
            self.events.remove(&key);
        }
        removed
    }

    /// Remove every handler of an event type.
    pub(crate) fn remove_event(&mut self, key: EventKey) -> Vec<Handler> {
        self.events
            .remove(&key)
            .map(|listeners| listeners.into_values().collect())
            .unwrap_or_default()
    }

    /// Listener ids for a type in ascending order.
    pub(crate) fn listeners(&self, key: EventKey) -> Vec<ListenerId> {
        self.events
            .get(&key)
            .map(|listeners| listeners.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Handlers for a type in ascending listener order.
    pub(crate) fn handlers_mut(&mut self, key: EventKey) -> impl Iterator<Item = &mut Handler> {
        self.events
            .get_mut(&key)
            .into_iter()
            .flat_map(BTreeMap::values_mut)
    }

    pub(crate) fn count(&self, key: EventKey) -> usize {
        self.events.get(&key).map_or(0, BTreeMap::len)
    }

    pub(crate) fn total(&self) -> usize {
        self.events.values().map(BTreeMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::PendingQueue;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    crate::define_event!(IntPair => (i32, f64));
    crate::define_event!(Label => String);

    fn noop<E: Event>() -> Callback<E::Args> {
        Arc::new(|_: &E::Args| {})
    }

    fn listener(n: u128) -> ListenerId {
        ListenerId::from_uuid(Uuid::from_u128(n))
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let mut table = HandlerTable::new();
        let key = EventKey::of::<IntPair>();
        let id = listener(1);

        assert!(table.insert(key, Handler::new::<IntPair>(id, noop::<IntPair>())));
        assert!(!table.insert(key, Handler::new::<IntPair>(id, noop::<IntPair>())));
        assert_eq!(table.count(key), 1);
    }

    #[test]
    fn test_duplicate_keeps_first_callback() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);
        let first: Callback<(i32, f64)> = Arc::new(move |_: &(i32, f64)| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        let mut table = HandlerTable::new();
        let key = EventKey::of::<IntPair>();
        table.insert(key, Handler::new::<IntPair>(listener(1), first));
        table.insert(key, Handler::new::<IntPair>(listener(1), noop::<IntPair>()));

        let callback = table
            .get(key, listener(1))
            .unwrap()
            .callback::<IntPair>()
            .unwrap();
        callback(&(1, 2.0));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listeners_are_ordered() {
        let mut table = HandlerTable::new();
        let key = EventKey::of::<IntPair>();
        for n in [3, 1, 2] {
            table.insert(key, Handler::new::<IntPair>(listener(n), noop::<IntPair>()));
        }

        assert_eq!(
            table.listeners(key),
            vec![listener(1), listener(2), listener(3)]
        );
        let visited: Vec<_> = table.handlers_mut(key).map(|h| h.listener()).collect();
        assert_eq!(visited, table.listeners(key));
    }

    #[test]
    fn test_remove_prunes_empty_type() {
        let mut table = HandlerTable::new();
        let key = EventKey::of::<IntPair>();
        table.insert(key, Handler::new::<IntPair>(listener(1), noop::<IntPair>()));

        assert!(table.remove(key, listener(1)).is_some());
        assert!(table.remove(key, listener(1)).is_none());
        assert_eq!(table.count(key), 0);
        assert_eq!(table.total(), 0);
        assert!(table.handlers_mut(key).next().is_none());
    }

    #[test]
    fn test_remove_event_leaves_other_types() {
        let mut table = HandlerTable::new();
        table.insert(
            EventKey::of::<IntPair>(),
            Handler::new::<IntPair>(listener(1), noop::<IntPair>()),
        );
        table.insert(
            EventKey::of::<IntPair>(),
            Handler::new::<IntPair>(listener(2), noop::<IntPair>()),
        );
        table.insert(
            EventKey::of::<Label>(),
            Handler::new::<Label>(listener(1), noop::<Label>()),
        );

        assert_eq!(table.remove_event(EventKey::of::<IntPair>()).len(), 2);
        assert!(table.remove_event(EventKey::of::<IntPair>()).is_empty());
        assert_eq!(table.count(EventKey::of::<Label>()), 1);
    }

    #[test]
    fn test_callback_type_is_checked() {
        let handler = Handler::new::<IntPair>(listener(1), noop::<IntPair>());
        assert!(handler.callback::<IntPair>().is_ok());
        assert_eq!(
            handler.callback::<Label>().err(),
            Some(BusError::CallbackMismatch { event: "Label" })
        );
    }

    #[test]
    fn test_track_and_untrack() {
        let mut queue = PendingQueue::new();
        let a = queue.push(None, Box::new(|| {}));
        let b = queue.push(None, Box::new(|| {}));
        let c = queue.push(None, Box::new(|| {}));

        let mut handler = Handler::new::<IntPair>(listener(1), noop::<IntPair>());
        handler.track(a);
        handler.track(b);
        handler.track(c);

        assert!(handler.untrack(b));
        assert!(handler.untrack(a));
        assert!(!handler.untrack(a));
        assert_eq!(handler.pending().collect::<Vec<_>>(), vec![c]);
        assert_eq!(handler.pending_len(), 1);
    }
}
