//! Engine configuration - root configuration structure.

use heapless::{FnvIndexMap, String};
use serde::Deserialize;

use super::channel::ChannelConfig;
use super::timer::TimerConfig;

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Shared timer settings.
    #[serde(default)]
    pub timer: TimerConfig,

    /// Named channel configurations.
    #[serde(default)]
    pub channels: FnvIndexMap<String<32>, ChannelConfig, 4>,
}

impl EngineConfig {
    /// Get a channel configuration by name.
    pub fn channel(&self, name: &str) -> Option<&ChannelConfig> {
        self.channels
            .iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| v)
    }

    /// List all channel names.
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(|s| s.as_str())
    }
}
