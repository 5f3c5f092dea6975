//! Configuration for proxies and handler threads.

/// Settings for a [`crate::ProfileProxy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Label prefixed to every log line emitted by the proxy.
    pub tag: String,
}

impl ProxyConfig {
    /// Replaces the log tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            tag: "BluetoothProfile".into(),
        }
    }
}

/// Settings for a [`crate::HandlerThread`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerThreadConfig {
    /// Name given to the worker thread.
    pub name: String,
}

impl HandlerThreadConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for HandlerThreadConfig {
    fn default() -> Self {
        Self {
            name: "bt-callback".into(),
        }
    }
}
