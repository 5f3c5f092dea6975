use crate::error::{BluetoothStatusCode, ErrorKind};

use std::num::NonZeroI32;

pub(crate) trait OptionExt<T> {
    fn required(self, what: &str) -> Result<T, crate::Error>;
    fn ok_or_not_attached(self) -> Result<T, crate::Error>;
}

impl<T> OptionExt<T> for Option<T> {
    #[track_caller]
    fn required(self, what: &str) -> Result<T, crate::Error> {
        self.ok_or_else(|| {
            crate::Error::new(ErrorKind::InvalidArgument, None, format!("`{what}` is required"))
        })
    }

    #[track_caller]
    fn ok_or_not_attached(self) -> Result<T, crate::Error> {
        self.ok_or_else(|| ErrorKind::NotAttached.into())
    }
}

pub(crate) trait IntExt {
    fn check_status_code(self) -> Result<(), crate::Error>;
}

impl IntExt for i32 {
    #[track_caller]
    fn check_status_code(self) -> Result<(), crate::Error> {
        let Some(code) = NonZeroI32::new(self) else {
            return Ok(());
        };
        Err(BluetoothStatusCode::from(code).into())
    }
}

/// Extracts a printable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "(non-string panic payload)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_zero_is_success() {
        assert!(0.check_status_code().is_ok());
        let err = BluetoothStatusCode::ERROR_PROFILE_NOT_CONNECTED
            .check_status_code()
            .unwrap_err();
        assert_eq!(
            err.kind(),
            ErrorKind::Status(BluetoothStatusCode::ProfileNotConnected)
        );
    }

    #[test]
    fn missing_option_is_invalid_argument() {
        let err = None::<u8>.required("service").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.message(), "`service` is required");
        assert_eq!(Some(3).required("x").unwrap(), 3);
    }
}
