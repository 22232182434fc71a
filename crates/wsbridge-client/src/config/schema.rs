use serde::Deserialize;
use wsbridge_core::deprecation::Deprecations;
use wsbridge_core::error::{Result, WsBridgeError};

const KIB: usize = 1024;
const MIB: usize = 1024 * KIB;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub socket: SocketSection,

    #[serde(default)]
    pub deprecations: DeprecationSection,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(WsBridgeError::UnsupportedVersion);
        }

        self.socket.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocketSection {
    /// Endpoint for the `wsbridge-tail` binary.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for SocketSection {
    fn default() -> Self {
        Self {
            url: None,
            max_message_bytes: default_max_message_bytes(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl SocketSection {
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.url {
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                return Err(WsBridgeError::BadConfig(
                    "socket.url must start with ws:// or wss://".into(),
                ));
            }
        }
        if !(KIB..=64 * MIB).contains(&self.max_message_bytes) {
            return Err(WsBridgeError::BadConfig(
                "socket.max_message_bytes must be between 1 KiB and 64 MiB".into(),
            ));
        }
        if !(KIB..=self.max_message_bytes).contains(&self.max_frame_bytes) {
            return Err(WsBridgeError::BadConfig(
                "socket.max_frame_bytes must be between 1 KiB and max_message_bytes".into(),
            ));
        }
        Ok(())
    }
}

fn default_max_message_bytes() -> usize {
    16 * MIB
}
fn default_max_frame_bytes() -> usize {
    4 * MIB
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeprecationSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for DeprecationSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl DeprecationSection {
    /// Switch `port` on or off to match this section.
    pub fn apply(&self, port: &Deprecations) {
        port.set_enabled(self.enabled);
    }
}

fn default_true() -> bool {
    true
}
