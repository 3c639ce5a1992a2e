//! Recorders and identity fixtures for event bus tests.

use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use uuid::Uuid;

/// Deterministic UUID for the `n`th test listener.
///
/// Smaller `n` orders first, so tests can rely on listener ordering.
#[must_use]
pub fn test_uuid(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

/// Shared, ordered log of callback invocations.
///
/// Clones share the same log, so one clone can be moved into callbacks
/// while the test keeps another for assertions.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Callback that records `tag` followed by the debug form of its arguments.
    pub fn recorder<A: Debug + 'static>(
        &self,
        tag: &str,
    ) -> impl Fn(&A) + Send + Sync + 'static + use<A> {
        let log = self.clone();
        let tag = tag.to_owned();
        move |args: &A| log.push(format!("{tag}{args:?}"))
    }

    /// Callback that records only `tag`, ignoring its arguments.
    pub fn tagger<A: 'static>(&self, tag: &str) -> impl Fn(&A) + Send + Sync + 'static + use<A> {
        let log = self.clone();
        let tag = tag.to_owned();
        move |_: &A| log.push(tag.clone())
    }

    /// Snapshot of all entries in invocation order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Number of entries equal to `entry`.
    #[must_use]
    pub fn count_of(&self, entry: &str) -> usize {
        self.entries.lock().iter().filter(|e| *e == entry).count()
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Shared invocation counter.
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    count: Arc<AtomicUsize>,
}

impl CallCounter {
    /// Create a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback that increments the counter on every invocation.
    pub fn callback<A: 'static>(&self) -> impl Fn(&A) + Send + Sync + 'static + use<A> {
        let count = Arc::clone(&self.count);
        move |_: &A| {
            count.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Increment by one.
    pub fn hit(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Current count.
    #[must_use]
    pub fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_fixture_orders_by_index() {
        assert!(test_uuid(1) < test_uuid(2));
        assert_eq!(test_uuid(7), test_uuid(7));
    }

    #[test]
    fn test_call_log_records_in_order() {
        let log = CallLog::new();
        let pair = log.recorder::<(i32, f64)>("L1");
        let label = log.tagger::<String>("label");

        pair(&(1, 2.0));
        label(&"ignored".to_string());
        pair(&(3, 4.5));

        assert_eq!(log.entries(), vec!["L1(1, 2.0)", "label", "L1(3, 4.5)"]);
        assert_eq!(log.count_of("label"), 1);
        assert_eq!(log.len(), 3);

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let log = CallLog::new();
        let other = log.clone();
        other.push("from clone");
        assert_eq!(log.entries(), vec!["from clone"]);
    }

    #[test]
    fn test_counter() {
        let counter = CallCounter::new();
        let callback = counter.callback::<()>();
        callback(&());
        callback(&());
        counter.hit();
        assert_eq!(counter.get(), 3);
    }
}
