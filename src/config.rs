//! Application-level configuration loading, including the game variant the kiosk runs.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use validator::{Validate, ValidationErrors};

use crate::state::state_machine::Rules;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "FLASHKA_CONFIG_PATH";
/// Environment variable pointing at the directory served as static content.
const PUBLIC_DIR_ENV: &str = "FLASHKA_PUBLIC_DIR";
/// Environment variable pointing at the device-local key-value file.
const DEVICE_STORE_ENV: &str = "FLASHKA_DEVICE_STORE";
const DEFAULT_PUBLIC_DIR: &str = "public";
const DEFAULT_DEVICE_STORE: &str = "data/device.json";
/// Number of `image_<n>.png` slots the admin shuffle rotates.
const DEFAULT_SHUFFLE_IMAGE_COUNT: u8 = 10;

/// Failures that make the configuration unusable. These abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config `{}`", .path.display())]
    Read {
        /// Config file location.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid JSON for [`RawConfig`].
    #[error("failed to parse config `{}`", .path.display())]
    Parse {
        /// Config file location.
        path: PathBuf,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// The file parsed but holds out-of-range values.
    #[error("invalid config `{}`: {source}", .path.display())]
    Invalid {
        /// Config file location.
        path: PathBuf,
        /// Fields that failed validation.
        #[source]
        source: ValidationErrors,
    },
}

/// When the tracking endpoint is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyOn {
    /// Once when a board is dealt.
    Start,
    /// Once when the player wins.
    Win,
}

/// When the device play counter is bumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountOn {
    /// When a board is dealt.
    Start,
    /// When a session terminates, won or lost.
    Finish,
}

/// Built-in deployments of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantPreset {
    /// 4 pairs, 6 attempts, one play per device.
    Mini,
    /// 8 pairs, 17 attempts, unlimited replays.
    #[default]
    Classic,
    /// 10 pairs, 22 attempts, one play per device.
    Deluxe,
}

/// Everything that distinguishes one deployment of the game from another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameVariant {
    /// Preset the variant was derived from.
    pub preset: VariantPreset,
    /// Board size and attempt budget.
    pub rules: Rules,
    /// How long a mismatched pair stays face up.
    pub mismatch_delay: Duration,
    /// Persist the lock flag when a session terminates.
    pub lock_after_play: bool,
    /// When the tracking endpoint is called.
    pub notify_on: NotifyOn,
    /// When the play counter is bumped.
    pub count_on: CountOn,
    /// Text pre-filled in the SMS composer after a win.
    pub sms_message: Option<String>,
}

impl GameVariant {
    /// Resolve a preset to its concrete settings.
    pub fn preset(preset: VariantPreset) -> Self {
        match preset {
            VariantPreset::Mini => Self {
                preset,
                rules: Rules {
                    pair_count: 4,
                    max_attempts: 6,
                },
                mismatch_delay: Duration::from_millis(600),
                lock_after_play: true,
                notify_on: NotifyOn::Start,
                count_on: CountOn::Start,
                sms_message: None,
            },
            VariantPreset::Classic => Self {
                preset,
                rules: Rules {
                    pair_count: 8,
                    max_attempts: 17,
                },
                mismatch_delay: Duration::from_millis(1000),
                lock_after_play: false,
                notify_on: NotifyOn::Win,
                count_on: CountOn::Finish,
                sms_message: Some("I just won a choccy at the Flashka memory game!".into()),
            },
            VariantPreset::Deluxe => Self {
                preset,
                rules: Rules {
                    pair_count: 10,
                    max_attempts: 22,
                },
                mismatch_delay: Duration::from_millis(800),
                lock_after_play: true,
                notify_on: NotifyOn::Win,
                count_on: CountOn::Finish,
                sms_message: Some("I just won a choccy at the Flashka memory game!".into()),
            },
        }
    }
}

/// Texts shown on the result and locked screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMessages {
    /// Overlay title after a win.
    pub win_title: String,
    /// Body text after a win.
    pub win: String,
    /// Overlay title after a loss.
    pub lose_title: String,
    /// Body text after a loss.
    pub lose: String,
    /// Permanent screen shown on a device that already played.
    pub locked: String,
}

impl Default for ResultMessages {
    fn default() -> Self {
        Self {
            win_title: "WINNER!".into(),
            win: "Congratulations! You won a choccy!".into(),
            lose_title: "BETTER LUCK NEXT TIME".into(),
            lose: "Oh shucks! Out of attempts. Try again tomorrow!".into(),
            locked: "You've already played on this device. Thanks for stopping by!".into(),
        }
    }
}

/// Endpoints receiving the fire-and-forget tracking calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationTargets {
    /// Called once per dealt board.
    pub start_url: Option<String>,
    /// Called once per win.
    pub win_url: Option<String>,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Game rules and side-effect policy.
    pub variant: GameVariant,
    /// Result and locked screen texts.
    pub messages: ResultMessages,
    /// Tracking endpoints.
    pub notifications: NotificationTargets,
    /// Number of `image_<n>.png` slots rotated by the admin shuffle.
    pub shuffle_image_count: u8,
    /// Directory served as static content and holding the card images.
    pub public_dir: PathBuf,
    /// JSON file backing the device store, or `:memory:`.
    pub device_store_path: PathBuf,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to the built-in defaults when the
    /// file does not exist. A file that exists but cannot be used is fatal.
    pub fn load() -> Result<Self, ConfigError> {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => {
                let config = Self::from_json(&contents).map_err(|err| match err {
                    RawConfigError::Parse(source) => ConfigError::Parse {
                        path: path.clone(),
                        source,
                    },
                    RawConfigError::Invalid(source) => ConfigError::Invalid {
                        path: path.clone(),
                        source,
                    },
                })?;
                info!(
                    path = %path.display(),
                    preset = ?config.variant.preset,
                    pairs = config.variant.rules.pair_count,
                    max_attempts = config.variant.rules.max_attempts,
                    "loaded game variant from config"
                );
                config
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        config.public_dir = env_path(PUBLIC_DIR_ENV, DEFAULT_PUBLIC_DIR);
        config.device_store_path = env_path(DEVICE_STORE_ENV, DEFAULT_DEVICE_STORE);
        Ok(config)
    }

    fn from_json(contents: &str) -> Result<Self, RawConfigError> {
        let raw = serde_json::from_str::<RawConfig>(contents).map_err(RawConfigError::Parse)?;
        raw.validate().map_err(RawConfigError::Invalid)?;
        Ok(raw.into())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            variant: GameVariant::preset(VariantPreset::default()),
            messages: ResultMessages::default(),
            notifications: NotificationTargets::default(),
            shuffle_image_count: DEFAULT_SHUFFLE_IMAGE_COUNT,
            public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            device_store_path: PathBuf::from(DEFAULT_DEVICE_STORE),
        }
    }
}

enum RawConfigError {
    Parse(serde_json::Error),
    Invalid(ValidationErrors),
}

#[derive(Debug, Deserialize, Validate)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    variant: VariantPreset,
    /// Image slots only exist for faces 1 to 10.
    #[validate(range(min = 1, max = 10))]
    pair_count: Option<u8>,
    #[validate(range(min = 1))]
    max_attempts: Option<u32>,
    #[validate(range(max = 10_000))]
    mismatch_delay_ms: Option<u64>,
    lock_after_play: Option<bool>,
    notify_on: Option<NotifyOn>,
    count_on: Option<CountOn>,
    sms_message: Option<String>,
    #[validate(url)]
    start_notification_url: Option<String>,
    #[validate(url)]
    win_notification_url: Option<String>,
    #[validate(range(min = 2, max = 10))]
    shuffle_image_count: Option<u8>,
    #[serde(default)]
    messages: RawMessages,
}

#[derive(Debug, Default, Deserialize)]
/// Optional overrides for [`ResultMessages`].
struct RawMessages {
    win_title: Option<String>,
    win: Option<String>,
    lose_title: Option<String>,
    lose: Option<String>,
    locked: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let mut variant = GameVariant::preset(value.variant);
        if let Some(pair_count) = value.pair_count {
            variant.rules.pair_count = pair_count;
        }
        if let Some(max_attempts) = value.max_attempts {
            variant.rules.max_attempts = max_attempts;
        }
        if let Some(delay) = value.mismatch_delay_ms {
            variant.mismatch_delay = Duration::from_millis(delay);
        }
        if let Some(lock) = value.lock_after_play {
            variant.lock_after_play = lock;
        }
        if let Some(notify_on) = value.notify_on {
            variant.notify_on = notify_on;
        }
        if let Some(count_on) = value.count_on {
            variant.count_on = count_on;
        }
        if value.sms_message.is_some() {
            variant.sms_message = value.sms_message;
        }

        let defaults = ResultMessages::default();
        let messages = ResultMessages {
            win_title: value.messages.win_title.unwrap_or(defaults.win_title),
            win: value.messages.win.unwrap_or(defaults.win),
            lose_title: value.messages.lose_title.unwrap_or(defaults.lose_title),
            lose: value.messages.lose.unwrap_or(defaults.lose),
            locked: value.messages.locked.unwrap_or(defaults.locked),
        };

        Self {
            variant,
            messages,
            notifications: NotificationTargets {
                start_url: value.start_notification_url,
                win_url: value.win_notification_url,
            },
            shuffle_image_count: value
                .shuffle_image_count
                .unwrap_or(DEFAULT_SHUFFLE_IMAGE_COUNT),
            ..Self::default()
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env_path(CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH)
}

fn env_path(var: &str, default: &str) -> PathBuf {
    env::var_os(var)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(default))
}
