//! Reference-counted registration of one remote listener shared by many local callbacks.

use std::collections::HashMap;
use std::sync::Arc;

use async_lock::Mutex;
use log::trace;

use crate::error::ErrorKind;
use crate::executor::Executor;
use crate::util::OptionExt;
use crate::Result;

type Action<S> = Box<dyn Fn(&S) + Send + Sync + 'static>;

/// Keeps the application callbacks of one profile feature and the server-side
/// registration they depend on.
///
/// The service is told to start sending events when the first callback is
/// registered and to stop when the last one is unregistered. The service handle
/// itself is never stored here: every call receives the handle the owner
/// currently has, which is `None` while disconnected.
///
/// Callbacks are identified by their `Arc` allocation, not by value, so two
/// equal-looking callbacks are still distinct subscribers.
pub struct CallbackWrapper<C: ?Sized, S: ?Sized> {
    subscribers: Mutex<HashMap<usize, Subscriber<C>>>,
    on_start: Action<S>,
    on_stop: Action<S>,
}

struct Subscriber<C: ?Sized> {
    callback: Arc<C>,
    executor: Arc<dyn Executor>,
}

impl<C: ?Sized> Clone for Subscriber<C> {
    fn clone(&self) -> Self {
        Self {
            callback: self.callback.clone(),
            executor: self.executor.clone(),
        }
    }
}

fn identity<C: ?Sized>(callback: &Arc<C>) -> usize {
    Arc::as_ptr(callback) as *const () as usize
}

impl<C: ?Sized, S: ?Sized> CallbackWrapper<C, S> {
    /// Creates an empty wrapper.
    /// - `on_start` asks the service to begin sending events to this process.
    /// - `on_stop` asks it to stop.
    pub fn new(
        on_start: impl Fn(&S) + Send + Sync + 'static,
        on_stop: impl Fn(&S) + Send + Sync + 'static,
    ) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            on_start: Box::new(on_start),
            on_stop: Box::new(on_stop),
        }
    }

    /// Registers `callback` to be invoked on `executor`.
    ///
    /// Starts the server-side registration if this is the first callback and
    /// `service` is available. Fails with [`ErrorKind::AlreadyRegistered`] if the
    /// same callback is registered already, even with a different executor.
    pub fn subscribe(
        &self,
        service: Option<&S>,
        callback: Arc<C>,
        executor: Arc<dyn Executor>,
    ) -> Result<()> {
        let key = identity(&callback);
        let mut subscribers = self.subscribers.lock_blocking();
        if subscribers.contains_key(&key) {
            return Err(crate::Error::new(
                ErrorKind::AlreadyRegistered,
                None,
                "unregister the callback before registering it again",
            ));
        }
        if subscribers.is_empty() {
            if let Some(service) = service {
                trace!("first callback registered, starting remote registration");
                (self.on_start)(service);
            }
        }
        subscribers.insert(key, Subscriber { callback, executor });
        Ok(())
    }

    /// Unregisters `callback`.
    ///
    /// Stops the server-side registration if it was the last callback and
    /// `service` is available.
    pub fn unsubscribe(&self, service: Option<&S>, callback: &Arc<C>) -> Result<()> {
        let mut subscribers = self.subscribers.lock_blocking();
        if subscribers.remove(&identity(callback)).is_none() {
            return Err(ErrorKind::NotRegistered.into());
        }
        if subscribers.is_empty() {
            if let Some(service) = service {
                trace!("last callback unregistered, stopping remote registration");
                (self.on_stop)(service);
            }
        }
        Ok(())
    }

    /// Re-arms the server-side registration on a newly connected service if any
    /// callback is registered. `service` must be present.
    pub fn on_service_available(&self, service: Option<&S>) -> Result<()> {
        self.rearm(service.required("service")?);
        Ok(())
    }

    pub(crate) fn rearm(&self, service: &S) {
        let subscribers = self.subscribers.lock_blocking();
        if !subscribers.is_empty() {
            trace!(
                "service available with {} callback(s), starting remote registration",
                subscribers.len()
            );
            (self.on_start)(service);
        }
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.subscribers.lock_blocking().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.lock_blocking().is_empty()
    }

    /// Checks if this very callback is registered.
    pub fn is_registered(&self, callback: &Arc<C>) -> bool {
        self.subscribers
            .lock_blocking()
            .contains_key(&identity(callback))
    }
}

impl<C: ?Sized + Send + Sync + 'static, S: ?Sized> CallbackWrapper<C, S> {
    /// Submits `invoker` for every registered callback to that callback's executor.
    ///
    /// The set of callbacks is taken at the time of the call; the lock is released
    /// before any executor sees a job, so a callback may freely register or
    /// unregister from inside `invoker`.
    pub fn dispatch(&self, invoker: impl Fn(&C) + Send + Sync + 'static) {
        let snapshot: Vec<Subscriber<C>> =
            self.subscribers.lock_blocking().values().cloned().collect();
        if snapshot.is_empty() {
            return;
        }
        let invoker = Arc::new(invoker);
        for Subscriber { callback, executor } in snapshot {
            let invoker = invoker.clone();
            executor.execute(Box::new(move || (*invoker)(&*callback)));
        }
    }
}

impl<C: ?Sized, S: ?Sized> std::fmt::Debug for CallbackWrapper<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackWrapper")
            .field("subscribers", &self.len())
            .finish()
    }
}
