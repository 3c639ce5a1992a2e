//! Event bus: registration, broadcast and the tick-budgeted drain.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::ReentrantMutex;
use serde::Serialize;
use tracing::{debug, error, trace, warn};

use crate::error::{BusError, BusResult};
use crate::event::{Callback, Event, EventKey, RegistrationToken};
use crate::listener::ListenerId;
use crate::queue::TaskAction;
use crate::registry::Registry;

/// Default time a single [`EventBus::tick`] may spend running deferred tasks.
pub const DEFAULT_DRAIN_BUDGET: Duration = Duration::from_micros(160);

/// Tunables fixed at bus construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusOptions {
    /// Budget used by [`EventBus::tick`].
    pub drain_budget: Duration,
    /// Log a warning when a drain runs past twice its budget.
    pub warn_on_overrun: bool,
}

impl Default for BusOptions {
    fn default() -> Self {
        Self {
            drain_budget: DEFAULT_DRAIN_BUDGET,
            warn_on_overrun: true,
        }
    }
}

impl BusOptions {
    /// Set the per-tick drain budget.
    #[must_use]
    pub fn with_drain_budget(mut self, budget: Duration) -> Self {
        self.drain_budget = budget;
        self
    }

    /// Do not warn when a drain overruns its budget.
    #[must_use]
    pub fn without_overrun_warnings(mut self) -> Self {
        self.warn_on_overrun = false;
        self
    }
}

/// Outcome of one drain call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Tasks invoked during this call.
    pub executed: usize,
    /// Tasks left in the queue for a later tick.
    pub remaining: usize,
    /// Wall time spent in the call.
    pub elapsed: Duration,
}

impl DrainReport {
    /// Whether the queue was empty when the drain returned.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

/// Typed in-process event bus.
///
/// Listeners register one callback per event type. Broadcasts either invoke
/// those callbacks immediately ([`broadcast_sync`](Self::broadcast_sync)) or
/// queue them ([`broadcast_async`](Self::broadcast_async)) for the next
/// [`drain`](Self::drain), which the host calls once per tick.
///
/// All state sits behind one reentrant lock: calls from different threads are
/// serialized, while a callback may call back into the bus on its own thread.
/// Panics raised by callbacks are not caught; they unwind into whoever
/// triggered the invocation and leave the bus usable.
///
/// **WARNING:** a callback that owns an `Arc<EventBus>` forms a reference
/// cycle with the bus. Capture a `std::sync::Weak<EventBus>` instead.
pub struct EventBus {
    state: ReentrantMutex<BusState>,
    options: BusOptions,
}

/// Everything guarded by the bus lock.
struct BusState {
    registry: RefCell<Option<Registry>>,
    /// Set while a drained task runs; only the lock holder can observe it.
    running_task: Cell<bool>,
}

impl BusState {
    fn new(registry: Option<Registry>) -> Self {
        Self {
            registry: RefCell::new(registry),
            running_task: Cell::new(false),
        }
    }
}

/// Clears [`BusState::running_task`] when a drained task returns or unwinds.
struct RunningTask<'a>(&'a Cell<bool>);

impl<'a> RunningTask<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for RunningTask<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl EventBus {
    /// Create an initialized bus with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(BusOptions::default())
    }

    /// Create an initialized bus with the given options.
    #[must_use]
    pub fn with_options(options: BusOptions) -> Self {
        Self {
            state: ReentrantMutex::new(BusState::new(Some(Registry::new()))),
            options,
        }
    }

    /// Create a bus with no state; every operation fails until [`init`](Self::init).
    #[must_use]
    pub fn uninitialized(options: BusOptions) -> Self {
        Self {
            state: ReentrantMutex::new(BusState::new(None)),
            options,
        }
    }

    /// Options this bus was built with.
    #[must_use]
    pub fn options(&self) -> BusOptions {
        self.options
    }

    /// Allocate empty registry state, discarding any existing state.
    pub fn init(&self) {
        let guard = self.state.lock();
        let previous = guard.registry.borrow_mut().replace(Registry::new());
        match &previous {
            Some(old) => debug!(
                handlers = old.handler_total(),
                pending = old.pending_len(),
                "Event bus reinitialized, previous state discarded"
            ),
            None => debug!("Event bus initialized"),
        }
        drop(previous);
    }

    /// Discard all handlers and pending tasks. Pending tasks never run.
    pub fn destroy(&self) {
        let guard = self.state.lock();
        let previous = guard.registry.borrow_mut().take();
        if let Some(old) = &previous {
            debug!(
                handlers = old.handler_total(),
                pending = old.pending_len(),
                "Event bus destroyed"
            );
        }
        drop(previous);
    }

    /// Destroy and reinitialize in one step.
    pub fn reset(&self) {
        let _guard = self.state.lock();
        self.destroy();
        self.init();
    }

    /// Whether the bus currently holds registry state.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.with_registry(|_| ()).is_ok()
    }

    /// Run `f` against the registry.
    ///
    /// The registry borrow ends when `f` returns; `f` must never run user
    /// callbacks.
    fn with_registry<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> BusResult<R> {
        let guard = self.state.lock();
        let mut slot = guard.registry.borrow_mut();
        let registry = slot.as_mut().ok_or(BusError::NotInitialized)?;
        Ok(f(registry))
    }

    /// Register `callback` for events of type `E` on behalf of `listener`.
    ///
    /// Returns `Ok(None)` without changing anything if `listener` already
    /// has a callback for `E`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NotInitialized`] if the bus has no state.
    pub fn register<E: Event>(
        &self,
        listener: ListenerId,
        callback: impl Fn(&E::Args) + Send + Sync + 'static,
    ) -> BusResult<Option<RegistrationToken>> {
        let callback: Callback<E::Args> = Arc::new(callback);
        let _guard = self.state.lock();
        let outcome = self.with_registry(|registry| registry.register::<E>(listener, callback))?;

        match outcome {
            Ok(token) => {
                debug!(event = E::name(), %listener, "Listener registered");
                Ok(Some(token))
            },
            Err(rejected) => {
                debug!(event = E::name(), %listener, "Duplicate registration ignored");
                drop(rejected);
                Ok(None)
            },
        }
    }

    /// Remove `listener`'s callback for `E` and cancel its queued deliveries.
    ///
    /// Returns `false` if there was nothing to remove.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NotInitialized`] if the bus has no state.
    pub fn unregister<E: Event>(&self, listener: ListenerId) -> BusResult<bool> {
        self.remove_listener(EventKey::of::<E>(), listener)
    }

    /// Token form of [`unregister`](Self::unregister).
    ///
    /// Accepts either a token or the `Option` returned by
    /// [`register`](Self::register) as is; `None` removes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NotInitialized`] if the bus has no state.
    pub fn unregister_token(
        &self,
        token: impl Into<Option<RegistrationToken>>,
        listener: ListenerId,
    ) -> BusResult<bool> {
        match token.into() {
            Some(token) => self.remove_listener(token.event_key(), listener),
            None => {
                self.with_registry(|_| ())?;
                Ok(false)
            },
        }
    }

    fn remove_listener(&self, key: EventKey, listener: ListenerId) -> BusResult<bool> {
        // Hold the lock until the removed callbacks are dropped so no other
        // thread can observe their tasks' shared arguments still alive.
        let _guard = self.state.lock();
        let Some(removed) = self.with_registry(|registry| registry.remove(key, listener))? else {
            trace!(event = %key, %listener, "Unregister of unknown listener ignored");
            return Ok(false);
        };

        debug!(
            event = %key,
            %listener,
            cancelled = removed.cancelled(),
            "Listener unregistered"
        );
        drop(removed);
        Ok(true)
    }

    /// Remove every listener of `E`, cancelling their queued deliveries.
    ///
    /// Returns the number of listeners removed.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NotInitialized`] if the bus has no state.
    pub fn clear<E: Event>(&self) -> BusResult<usize> {
        let key = EventKey::of::<E>();
        let _guard = self.state.lock();
        let removed = self.with_registry(|registry| registry.remove_event(key))?;
        let count = removed.handlers();

        if count > 0 {
            debug!(
                event = %key,
                listeners = count,
                cancelled = removed.cancelled(),
                "Event listeners cleared"
            );
        }
        drop(removed);
        Ok(count)
    }

    /// Invoke every listener of `E` now, in ascending listener order.
    ///
    /// The listener set is fixed when the call starts: listeners removed by
    /// an earlier callback are skipped and listeners added during the call
    /// are not invoked. Returns the number of callbacks invoked.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NotInitialized`] if the bus has no state, including
    /// when a callback destroys it mid-broadcast.
    pub fn broadcast_sync<E: Event>(&self, args: E::Args) -> BusResult<usize> {
        let key = EventKey::of::<E>();
        let _guard = self.state.lock();
        let listeners = self.with_registry(|registry| registry.listeners(key))?;

        let mut delivered: usize = 0;
        for listener in listeners {
            let Some(callback) =
                self.with_registry(|registry| registry.callback::<E>(key, listener))??
            else {
                continue;
            };
            trace!(event = %key, %listener, "Delivering event");
            callback(&args);
            delivered = delivered.saturating_add(1);
        }
        Ok(delivered)
    }

    /// Queue one delivery of `args` per current listener of `E`.
    ///
    /// Nothing runs until the next drain. Returns the number of deliveries
    /// queued.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NotInitialized`] if the bus has no state.
    pub fn broadcast_async<E: Event>(&self, args: E::Args) -> BusResult<usize> {
        let args = Arc::new(args);
        let enqueued = self.with_registry(|registry| registry.enqueue::<E>(&args))??;
        trace!(event = E::name(), enqueued, "Event queued");
        Ok(enqueued)
    }

    /// Like [`broadcast_async`](Self::broadcast_async), then queue `finish`.
    ///
    /// `finish` receives ownership of `args` after every delivery queued by
    /// this call has run. It is queued even when `E` has no listeners.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NotInitialized`] if the bus has no state.
    pub fn broadcast_async_with_callback<E: Event>(
        &self,
        args: E::Args,
        finish: impl FnOnce(E::Args) + Send + 'static,
    ) -> BusResult<usize> {
        let args = Arc::new(args);
        let enqueued = self.with_registry(|registry| {
            let enqueued = registry.enqueue::<E>(&args)?;
            registry.enqueue_sentinel(finish_action::<E>(args, finish));
            Ok::<_, BusError>(enqueued)
        })??;
        trace!(event = E::name(), enqueued, "Event queued with finish callback");
        Ok(enqueued)
    }

    /// Run queued tasks in FIFO order until the queue is empty or `budget`
    /// has elapsed.
    ///
    /// The budget is checked between tasks, never during one, and the first
    /// task always runs. Tasks left over wait for the next call.
    ///
    /// A drain started from inside a task that is itself being drained runs
    /// nothing and reports `executed == 0`. The outer drain goes on with the
    /// remaining tasks once the current one returns, so queue order and
    /// finish callbacks are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NotInitialized`] if the bus has no state when the
    /// call starts.
    pub fn drain(&self, budget: Duration) -> BusResult<DrainReport> {
        let started = Instant::now();
        {
            let guard = self.state.lock();
            let pending = self.with_registry(|registry| registry.pending_len())?;
            if guard.running_task.get() {
                debug!(pending, "Nested drain ignored");
                return Ok(DrainReport {
                    executed: 0,
                    remaining: pending,
                    elapsed: started.elapsed(),
                });
            }
        }

        let mut executed: usize = 0;
        loop {
            if executed > 0 && started.elapsed() > budget {
                break;
            }
            let guard = self.state.lock();
            let Ok(Some(task)) = self.with_registry(Registry::pop_next) else {
                break;
            };
            trace!(sentinel = task.origin().is_none(), "Running pending task");
            {
                let _running = RunningTask::enter(&guard.running_task);
                task.run();
            }
            drop(guard);
            executed = executed.saturating_add(1);
        }

        let elapsed = started.elapsed();
        let remaining = self.with_registry(|registry| registry.pending_len()).unwrap_or(0);
        if self.options.warn_on_overrun && elapsed > budget.saturating_mul(2) {
            warn!(
                budget_us = budget.as_micros(),
                elapsed_us = elapsed.as_micros(),
                executed,
                "Drain overran its budget"
            );
        }
        if executed > 0 {
            trace!(executed, remaining, "Drain finished");
        }

        Ok(DrainReport {
            executed,
            remaining,
            elapsed,
        })
    }

    /// Drain with the configured per-tick budget.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NotInitialized`] if the bus has no state.
    pub fn tick(&self) -> BusResult<DrainReport> {
        self.drain(self.options.drain_budget)
    }

    /// Number of tasks waiting for a drain.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NotInitialized`] if the bus has no state.
    pub fn pending_len(&self) -> BusResult<usize> {
        self.with_registry(|registry| registry.pending_len())
    }

    /// Number of listeners registered for `E`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NotInitialized`] if the bus has no state.
    pub fn handler_count<E: Event>(&self) -> BusResult<usize> {
        self.with_registry(|registry| registry.handler_count(EventKey::of::<E>()))
    }

    /// Whether `listener` has a callback for `E`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NotInitialized`] if the bus has no state.
    pub fn is_registered<E: Event>(&self, listener: ListenerId) -> BusResult<bool> {
        self.with_registry(|registry| registry.contains(EventKey::of::<E>(), listener))
    }

    /// Number of queued deliveries for `listener`'s callback on `E`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NotInitialized`] if the bus has no state.
    pub fn pending_for<E: Event>(&self, listener: ListenerId) -> BusResult<usize> {
        self.with_registry(|registry| registry.pending_for(EventKey::of::<E>(), listener))
    }
}

/// Sentinel action handing the broadcast arguments to `finish`.
fn finish_action<E: Event>(
    args: Arc<E::Args>,
    finish: impl FnOnce(E::Args) + Send + 'static,
) -> TaskAction {
    Box::new(move || match Arc::try_unwrap(args) {
        Ok(args) => finish(args),
        // Deliveries queued ahead of the sentinel have run or been cancelled,
        // and a nested drain never pops the sentinel mid-delivery.
        Err(_) => error!(
            event = E::name(),
            "Broadcast arguments still shared when finish callback ran; skipping it"
        ),
    })
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.state.lock();
        let mut out = f.debug_struct("EventBus");
        out.field("options", &self.options);
        match guard.registry.try_borrow() {
            Ok(slot) => match slot.as_ref() {
                Some(registry) => out
                    .field("handlers", &registry.handler_total())
                    .field("pending", &registry.pending_len()),
                None => out.field("initialized", &false),
            },
            Err(_) => out.field("state", &"<in use>"),
        };
        out.finish()
    }
}
