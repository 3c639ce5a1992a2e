//! The shared FIFO of deferred invocations.

use std::collections::BTreeMap;
use std::fmt;

use crate::event::EventKey;
use crate::listener::ListenerId;

/// Stable slot handle for a queued task.
///
/// Ids are handed out in increasing order, so iterating the queue by id is
/// FIFO order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct TaskId(u64);

/// The handler a task was enqueued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HandlerRef {
    pub(crate) key: EventKey,
    pub(crate) listener: ListenerId,
}

/// Deferred closure with its arguments already captured.
pub(crate) type TaskAction = Box<dyn FnOnce() + Send>;

/// One deferred invocation awaiting a drain.
pub(crate) struct PendingTask {
    origin: Option<HandlerRef>,
    action: TaskAction,
}

impl PendingTask {
    /// Handler that produced this task, `None` for a finish sentinel.
    pub(crate) fn origin(&self) -> Option<HandlerRef> {
        self.origin
    }

    /// Consume the task and run its action.
    pub(crate) fn run(self) {
        (self.action)();
    }
}

impl fmt::Debug for PendingTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTask")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Ordered slot map of pending tasks.
#[derive(Debug, Default)]
pub(crate) struct PendingQueue {
    tasks: BTreeMap<TaskId, PendingTask>,
    next_id: u64,
}

impl PendingQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a task at the tail and return its slot handle.
    pub(crate) fn push(&mut self, origin: Option<HandlerRef>, action: TaskAction) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.tasks.insert(id, PendingTask { origin, action });
        id
    }

    /// Remove the oldest task.
    pub(crate) fn pop_front(&mut self) -> Option<(TaskId, PendingTask)> {
        self.tasks.pop_first()
    }

    /// Remove a specific task without running it.
    pub(crate) fn cancel(&mut self, id: TaskId) -> Option<PendingTask> {
        self.tasks.remove(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn ids(&self) -> Vec<TaskId> {
        self.tasks.keys().copied().collect()
    }
}
