#![doc = include_str!("../README.md")]

pub use adapter::Adapter;
pub use address::{check_bluetooth_address, Device};
pub use callback_wrapper::CallbackWrapper;
pub use config::{HandlerThreadConfig, ProxyConfig};
pub use error::{BluetoothStatusCode, Error, ErrorKind, RemoteError};
pub use executor::{Executor, HandlerThread, InlineExecutor, Job, TaskQueue};
pub use proxy::ProfileProxy;

/// Convenience alias for a result with [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

pub mod address;
pub mod error;

mod adapter;
mod callback_wrapper;
mod config;
mod executor;
mod proxy;
mod util;
