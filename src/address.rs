//! Remote device identity as seen by profile proxies.

/// Length of a textual Bluetooth address, e.g. `00:11:22:33:AA:BB`.
pub const ADDRESS_LENGTH: usize = 17;

/// Validates a textual Bluetooth address.
///
/// Valid addresses are upper case, in big endian byte order, and in the form
/// `00:11:22:33:AA:BB`.
pub fn check_bluetooth_address(address: &str) -> bool {
    address.len() == ADDRESS_LENGTH
        && address.bytes().enumerate().all(|(i, c)| match i % 3 {
            2 => c == b':',
            _ => c.is_ascii_digit() || (b'A'..=b'F').contains(&c),
        })
}

/// A remote Bluetooth device, identified by its address.
///
/// The address is kept as given; profile calls check [`Device::is_valid`] before
/// reaching the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Device {
    address: String,
}

impl Device {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_valid(&self) -> bool {
        check_bluetooth_address(&self.address)
    }

    /// The six address bytes in the order they are written, or `None` if the
    /// address is not valid.
    pub fn to_bytes(&self) -> Option<[u8; 6]> {
        if !self.is_valid() {
            return None;
        }
        let mut bytes = [0u8; 6];
        for (byte, part) in bytes.iter_mut().zip(self.address.split(':')) {
            *byte = u8::from_str_radix(part, 16).ok()?;
        }
        Some(bytes)
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_upper_case_addresses() {
        assert!(check_bluetooth_address("00:11:22:33:AA:BB"));
        assert!(check_bluetooth_address("F0:43:A8:23:10:00"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!check_bluetooth_address("00:11:22:33:aa:bb"));
        assert!(!check_bluetooth_address("00:11:22:33:AA"));
        assert!(!check_bluetooth_address("00-11-22-33-AA-BB"));
        assert!(!check_bluetooth_address("00:11:22:33:AA:BB:"));
        assert!(!check_bluetooth_address("0G:11:22:33:AA:BB"));
        assert!(!check_bluetooth_address(""));
    }

    #[test]
    fn device_bytes() {
        let dev = Device::new("F0:43:A8:23:10:00");
        assert_eq!(dev.to_bytes(), Some([0xF0, 0x43, 0xA8, 0x23, 0x10, 0x00]));
        assert_eq!(dev.to_string(), "F0:43:A8:23:10:00");
        assert_eq!(Device::new("bogus").to_bytes(), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn device_serde() {
        let dev = Device::new("00:11:22:33:AA:BB");
        let json = serde_json::to_string(&dev).unwrap();
        assert_eq!(json, r#"{"address":"00:11:22:33:AA:BB"}"#);
        let back: Device = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dev);
    }
}
