//! Coordinator configuration.

use std::time::Duration;

use pairplay_protocol::{DEFAULT_PLAYER_NAME, normalize_player_name};

/// Settings for one [`Coordinator`](crate::Coordinator).
///
/// ```rust
/// use std::time::Duration;
/// use pairplay::CoordinatorConfig;
///
/// let config = CoordinatorConfig::new()
///     .player_name("  Ada ")
///     .handshake_timeout(Duration::from_secs(2));
/// assert_eq!(config.name(), "Ada");
/// ```
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    player_name: String,

    /// How long to wait for the peer's handshake before resending ours.
    pub handshake_timeout: Duration,

    /// Resends allowed before the session fails.
    pub handshake_retries: u32,

    /// Refuse peers that announce a different protocol version.
    pub require_same_version: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            player_name: DEFAULT_PLAYER_NAME.to_string(),
            handshake_timeout: Duration::from_secs(5),
            handshake_retries: 3,
            require_same_version: true,
        }
    }
}

impl CoordinatorConfig {
    /// Creates a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the local display name. It is trimmed and capped; a blank
    /// name falls back to the default.
    pub fn player_name(mut self, name: &str) -> Self {
        self.player_name = normalize_player_name(name);
        self
    }

    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn handshake_retries(mut self, retries: u32) -> Self {
        self.handshake_retries = retries;
        self
    }

    pub fn require_same_version(mut self, require: bool) -> Self {
        self.require_same_version = require;
        self
    }

    /// The normalized local display name.
    pub fn name(&self) -> &str {
        &self.player_name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.player_name = name;
    }
}
