//! Defines error types.

use std::num::NonZeroI32;

/// Failure of a call across the process boundary to the profile service.
///
/// This is what a proxy sees instead of a value when the remote side is gone or
/// the transaction could not be completed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteError {
    /// The process hosting the service has died.
    DeadObject,
    /// The service threw an error carrying a service-defined code.
    ServiceSpecific(i32),
    /// The transaction failed in the transport.
    Transaction(String),
}

impl std::error::Error for RemoteError {}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeadObject => f.write_str("remote service process has died"),
            Self::ServiceSpecific(code) => write!(f, "service-specific error {code}"),
            Self::Transaction(msg) => write!(f, "remote transaction failed: {msg}"),
        }
    }
}

impl From<RemoteError> for Error {
    fn from(err: RemoteError) -> Self {
        Error {
            kind: ErrorKind::Remote,
            source: Some(err),
            message: String::new(),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            kind,
            source: None,
            message: String::new(),
        }
    }
}

impl From<BluetoothStatusCode> for Error {
    fn from(code: BluetoothStatusCode) -> Self {
        ErrorKind::Status(code).into()
    }
}

/// Status codes returned by profile service methods, `0` being success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BluetoothStatusCode {
    NotEnabled,
    NotAllowed,
    NotBonded,
    MissingBluetoothConnectPermission,
    ProfileServiceNotBound,
    FeatureNotSupported,
    ProfileNotConnected,
    Timeout,
    GattWriteNotAllowed,
    GattWriteBusy,
    Unknown,
    UnknownError(NonZeroI32),
}

impl BluetoothStatusCode {
    pub const SUCCESS: i32 = 0;
    pub const ERROR_BLUETOOTH_NOT_ENABLED: i32 = 1;
    pub const ERROR_BLUETOOTH_NOT_ALLOWED: i32 = 2;
    pub const ERROR_DEVICE_NOT_BONDED: i32 = 3;
    pub const ERROR_MISSING_BLUETOOTH_CONNECT_PERMISSION: i32 = 6;
    pub const ERROR_PROFILE_SERVICE_NOT_BOUND: i32 = 9;
    pub const FEATURE_NOT_SUPPORTED: i32 = 11;
    pub const ERROR_PROFILE_NOT_CONNECTED: i32 = 14;
    pub const ERROR_TIMEOUT: i32 = 15;
    pub const ERROR_GATT_WRITE_NOT_ALLOWED: i32 = 200;
    pub const ERROR_GATT_WRITE_REQUEST_BUSY: i32 = 201;
    pub const ERROR_UNKNOWN: i32 = i32::MAX;
}

impl std::fmt::Display for BluetoothStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let err_str = match self {
            Self::NotEnabled => "Bluetooth is not enabled",
            Self::NotAllowed => {
                "the API call was initiated by neither the system nor the active user"
            }
            Self::NotBonded => "the Bluetooth device specified is not bonded",
            Self::MissingBluetoothConnectPermission => {
                "the caller does not have the BLUETOOTH_CONNECT permission"
            }
            Self::ProfileServiceNotBound => "the profile service is not bound",
            Self::FeatureNotSupported => "the feature is not supported",
            Self::ProfileNotConnected => "the profile is not connected",
            Self::Timeout => "the operation timed out",
            Self::GattWriteNotAllowed => {
                "a GATT writeCharacteristic request is not permitted on the remote device"
            }
            Self::GattWriteBusy => "a GATT writeCharacteristic request is already in progress",
            Self::Unknown => "an unknown error has occurred",
            Self::UnknownError(code) => {
                return write!(f, "unknown error with code {code}");
            }
        };
        f.write_str(err_str)
    }
}

impl From<NonZeroI32> for BluetoothStatusCode {
    fn from(code: NonZeroI32) -> Self {
        match code.get() {
            Self::ERROR_BLUETOOTH_NOT_ENABLED => Self::NotEnabled,
            Self::ERROR_BLUETOOTH_NOT_ALLOWED => Self::NotAllowed,
            Self::ERROR_DEVICE_NOT_BONDED => Self::NotBonded,
            Self::ERROR_MISSING_BLUETOOTH_CONNECT_PERMISSION => {
                Self::MissingBluetoothConnectPermission
            }
            Self::ERROR_PROFILE_SERVICE_NOT_BOUND => Self::ProfileServiceNotBound,
            Self::FEATURE_NOT_SUPPORTED => Self::FeatureNotSupported,
            Self::ERROR_PROFILE_NOT_CONNECTED => Self::ProfileNotConnected,
            Self::ERROR_TIMEOUT => Self::Timeout,
            Self::ERROR_GATT_WRITE_NOT_ALLOWED => Self::GattWriteNotAllowed,
            Self::ERROR_GATT_WRITE_REQUEST_BUSY => Self::GattWriteBusy,
            Self::ERROR_UNKNOWN => Self::Unknown,
            _ => Self::UnknownError(code),
        }
    }
}

/// The error type for callback registration and profile calls.
#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<RemoteError>,
    message: String,
}

impl Error {
    pub(crate) fn new<S: ToString>(kind: ErrorKind, source: Option<RemoteError>, message: S) -> Self {
        Error {
            kind,
            source,
            message: message.to_string(),
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the message for this error.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.message.is_empty(), &self.source) {
            (true, None) => write!(f, "{}", &self.kind),
            (false, None) => write!(f, "{}: {}", &self.kind, &self.message),
            (true, Some(err)) => write!(f, "{}: {}", &self.kind, err),
            (false, Some(err)) => write!(f, "{}: {} ({})", &self.kind, &self.message, err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|x| {
            let x: &(dyn std::error::Error + 'static) = x;
            x
        })
    }
}

/// A list of general categories of errors.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    /// a required argument is missing
    InvalidArgument,
    /// the callback is already registered
    AlreadyRegistered,
    /// the callback is not registered
    NotRegistered,
    /// the Bluetooth adapter is not enabled
    AdapterUnavailable,
    /// the proxy is not attached to the profile service
    NotAttached,
    /// the remote call failed
    Remote,
    /// the profile service returned a failure status: {0}
    Status(BluetoothStatusCode),
    /// error
    Other,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidArgument => f.write_str("a required argument is missing"),
            ErrorKind::AlreadyRegistered => f.write_str("the callback is already registered"),
            ErrorKind::NotRegistered => f.write_str("the callback is not registered"),
            ErrorKind::AdapterUnavailable => f.write_str("the Bluetooth adapter is not enabled"),
            ErrorKind::NotAttached => {
                f.write_str("the proxy is not attached to the profile service")
            }
            ErrorKind::Remote => f.write_str("the remote call failed"),
            ErrorKind::Status(code) => {
                write!(f, "the profile service returned a failure status: {code}")
            }
            ErrorKind::Other => f.write_str("error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn status_code_mapping() {
        let code = |c: i32| BluetoothStatusCode::from(NonZeroI32::new(c).unwrap());
        assert_eq!(code(1), BluetoothStatusCode::NotEnabled);
        assert_eq!(code(9), BluetoothStatusCode::ProfileServiceNotBound);
        assert_eq!(code(i32::MAX), BluetoothStatusCode::Unknown);
        assert_eq!(
            code(42),
            BluetoothStatusCode::UnknownError(NonZeroI32::new(42).unwrap())
        );
    }

    #[test]
    fn remote_error_is_kept_as_source() {
        let err = Error::from(RemoteError::DeadObject);
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(
            err.source().map(|e| e.to_string()),
            Some("remote service process has died".to_string())
        );
        assert_eq!(
            err.to_string(),
            "the remote call failed: remote service process has died"
        );
    }

    #[test]
    fn display_with_message() {
        let err = Error::new(ErrorKind::NotRegistered, None, "callback 0x10");
        assert_eq!(err.to_string(), "the callback is not registered: callback 0x10");
        assert!(err.source().is_none());
    }
}
