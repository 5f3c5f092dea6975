use std::sync::Arc;

use async_lock::{RwLock, RwLockWriteGuard};
use log::{debug, error};

use crate::adapter::Adapter;
use crate::address::Device;
use crate::callback_wrapper::CallbackWrapper;
use crate::config::ProxyConfig;
use crate::error::{ErrorKind, RemoteError};
use crate::executor::Executor;
use crate::util::{IntExt, OptionExt};
use crate::Result;

/// Client-side proxy of one Bluetooth profile service.
///
/// `S` is the service interface reached across the process boundary, `C` the
/// application callback type. The proxy keeps the service handle while it is
/// bound and registers a single listener with the service on behalf of all
/// application callbacks.
pub struct ProfileProxy<S: ?Sized, C: ?Sized> {
    adapter: Adapter,
    config: ProxyConfig,
    service: RwLock<Option<Arc<S>>>,
    callbacks: CallbackWrapper<C, S>,
}

impl<S: ?Sized + 'static, C: ?Sized + 'static> ProfileProxy<S, C> {
    /// Creates an unbound proxy.
    ///
    /// `register` and `unregister` add and remove this process's listener on the
    /// service; their failures are logged and otherwise ignored.
    pub fn new(
        adapter: Adapter,
        config: ProxyConfig,
        register: impl Fn(&S) -> Result<(), RemoteError> + Send + Sync + 'static,
        unregister: impl Fn(&S) -> Result<(), RemoteError> + Send + Sync + 'static,
    ) -> Self {
        let (start_tag, stop_tag) = (config.tag.clone(), config.tag.clone());
        let callbacks = CallbackWrapper::new(
            move |service: &S| {
                if let Err(e) = register(service) {
                    error!("{start_tag}: failed to register the service callback: {e}");
                }
            },
            move |service: &S| {
                if let Err(e) = unregister(service) {
                    error!("{stop_tag}: failed to unregister the service callback: {e}");
                }
            },
        );
        Self {
            adapter,
            config,
            service: RwLock::new(None),
            callbacks,
        }
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The application callbacks of this proxy.
    pub fn callbacks(&self) -> &CallbackWrapper<C, S> {
        &self.callbacks
    }

    /// The bound service, if any.
    pub fn service(&self) -> Option<Arc<S>> {
        self.service.read_blocking().clone()
    }

    /// Binds the proxy to `service`; callbacks registered while unbound get their
    /// server-side registration restored.
    pub fn on_service_connected(&self, service: Arc<S>) {
        debug!("{}: service connected", self.config.tag);
        let mut guard = self.service.write_blocking();
        *guard = Some(service.clone());
        let _guard = RwLockWriteGuard::downgrade(guard);
        self.callbacks.rearm(&*service);
    }

    pub fn on_service_disconnected(&self) {
        debug!("{}: service disconnected", self.config.tag);
        self.service.write_blocking().take();
    }

    /// Unbinds the proxy. Calling it again has no effect.
    pub fn close(&self) {
        if self.service.write_blocking().take().is_some() {
            debug!("{}: closed", self.config.tag);
        }
    }

    /// Registers `callback` to be invoked on `executor`.
    ///
    /// Registering the same callback twice fails with
    /// [`ErrorKind::AlreadyRegistered`], even with a different executor.
    pub fn register_callback(&self, executor: Arc<dyn Executor>, callback: Arc<C>) -> Result<()> {
        let service = self.service.read_blocking();
        self.callbacks.subscribe(service.as_deref(), callback, executor)
    }

    /// Unregisters a callback previously passed to [`ProfileProxy::register_callback`].
    pub fn unregister_callback(&self, callback: &Arc<C>) -> Result<()> {
        let service = self.service.read_blocking();
        self.callbacks.unsubscribe(service.as_deref(), callback)
    }

    /// Calls `f` on the bound service if the adapter is enabled.
    pub fn try_call_service<T>(&self, f: impl FnOnce(&S) -> Result<T, RemoteError>) -> Result<T> {
        if !self.adapter.is_enabled() {
            return Err(ErrorKind::AdapterUnavailable.into());
        }
        let service = self.service().ok_or_not_attached()?;
        Ok(f(&*service)?)
    }

    /// Calls `f` on the bound service, returning `default` if the adapter is
    /// disabled, the proxy is unbound or the remote call fails.
    pub fn call_service_if_enabled<T>(
        &self,
        f: impl FnOnce(&S) -> Result<T, RemoteError>,
        default: T,
    ) -> T {
        match self.try_call_service(f) {
            Ok(val) => val,
            Err(e) => {
                match e.kind() {
                    ErrorKind::AdapterUnavailable => {
                        debug!("{}: Bluetooth adapter is not enabled", self.config.tag)
                    }
                    ErrorKind::NotAttached => {
                        debug!("{}: proxy not attached to service", self.config.tag)
                    }
                    _ => error!("{}: {e}", self.config.tag),
                }
                default
            }
        }
    }

    /// Like [`ProfileProxy::call_service_if_enabled`], also returning `default`
    /// without any call when `device` has an invalid address.
    pub fn call_service_for_device<T>(
        &self,
        device: &Device,
        f: impl FnOnce(&S) -> Result<T, RemoteError>,
        default: T,
    ) -> T {
        if !device.is_valid() {
            debug!("{}: invalid device address `{device}`", self.config.tag);
            return default;
        }
        self.call_service_if_enabled(f, default)
    }

    /// Calls a service method returning a Bluetooth status code.
    pub fn call_service_for_status(
        &self,
        f: impl FnOnce(&S) -> Result<i32, RemoteError>,
    ) -> Result<()> {
        self.try_call_service(f)?.check_status_code()
    }
}

impl<S: ?Sized + 'static, C: ?Sized + Send + Sync + 'static> ProfileProxy<S, C> {
    /// Delivers an event from the service to every registered callback.
    pub fn dispatch(&self, invoker: impl Fn(&C) + Send + Sync + 'static) {
        self.callbacks.dispatch(invoker)
    }
}

impl<S: ?Sized, C: ?Sized> std::fmt::Debug for ProfileProxy<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileProxy")
            .field("tag", &self.config.tag)
            .field("bound", &self.service.read_blocking().is_some())
            .field("callbacks", &self.callbacks)
            .finish()
    }
}
