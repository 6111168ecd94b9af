use serde::{Deserialize, Serialize};
use std::time::Duration;
use voxsign_types::Locale;
use voxsign_voice::RealtimeConfig;

fn default_reveal_pause_ms() -> u64 {
    400
}

fn default_welcome_delay_ms() -> u64 {
    4000
}

/// Settings for one signup interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupConfig {
    /// Language of every prompt, remark and message.
    #[serde(default)]
    pub locale: Locale,
    /// Pause between a prompt finishing and its input being shown.
    #[serde(default = "default_reveal_pause_ms")]
    pub reveal_pause_ms: u64,
    /// How long the welcome screen stays up before the flow completes.
    #[serde(default = "default_welcome_delay_ms")]
    pub welcome_delay_ms: u64,
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

impl Default for SignupConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            reveal_pause_ms: default_reveal_pause_ms(),
            welcome_delay_ms: default_welcome_delay_ms(),
            realtime: RealtimeConfig::default(),
        }
    }
}

impl SignupConfig {
    pub fn for_locale(locale: Locale) -> Self {
        Self {
            locale,
            ..Default::default()
        }
    }

    pub fn reveal_pause(&self) -> Duration {
        Duration::from_millis(self.reveal_pause_ms)
    }

    pub fn welcome_delay(&self) -> Duration {
        Duration::from_millis(self.welcome_delay_ms)
    }
}
