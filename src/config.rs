use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Trigger words, lowercased and de-duplicated at input time.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Alarm tone file. `None` falls back to the platform default alarm sound.
    #[serde(default)]
    pub alarm_tone: Option<PathBuf>,

    #[serde(default = "default_snooze_minutes")]
    pub snooze_minutes: u64,

    /// Source apps to watch (case-insensitive substring match on the app
    /// identifier). Empty means every app.
    #[serde(default = "default_watch_apps")]
    pub watch_apps: Vec<String>,

    // Settings-UI state; persisted here but not interpreted by the daemon.
    #[serde(default)]
    pub dark_mode: bool,

    #[serde(default = "default_first_launch")]
    pub first_launch: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_snooze_minutes() -> u64 {
    10
}

fn default_watch_apps() -> Vec<String> {
    vec!["whatsapp".to_string()]
}

fn default_first_launch() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            keywords: Vec::new(),
            alarm_tone: None,
            snooze_minutes: default_snooze_minutes(),
            watch_apps: default_watch_apps(),
            dark_mode: false,
            first_launch: default_first_launch(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.config/keybell/config.json)
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!(
                "Config file not found at {:?}, creating default config",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let mut config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
        let keywords = std::mem::take(&mut config.keywords);
        config.set_keywords(keywords);

        tracing::info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved config to {:?}", config_path);
        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(dir)
        } else {
            let home = std::env::var("HOME").context("HOME environment variable not set")?;
            PathBuf::from(home).join(".config")
        };

        Ok(config_dir.join("keybell").join("config.json"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.snooze_minutes == 0 {
            return Err(anyhow::anyhow!("snooze_minutes must be at least 1"));
        }

        if let Some(tone) = &self.alarm_tone {
            if tone.as_os_str().is_empty() {
                return Err(anyhow::anyhow!("alarm_tone must not be an empty path"));
            }
        }

        Ok(())
    }

    /// Replace the keyword list, applying input-time normalization.
    pub fn set_keywords(&mut self, keywords: Vec<String>) {
        self.keywords = normalize_keywords(keywords);
    }

    /// Whether notifications from this source app should be inspected.
    pub fn watches_app(&self, app: &str) -> bool {
        if self.watch_apps.is_empty() {
            return true;
        }
        let app = app.to_lowercase();
        self.watch_apps
            .iter()
            .any(|watched| app.contains(&watched.to_lowercase()))
    }
}

/// Lowercase, trim, drop empties, de-duplicate preserving first occurrence.
pub fn normalize_keywords(keywords: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(keywords.len());
    for kw in keywords {
        let kw = kw.trim().to_lowercase();
        if kw.is_empty() || out.contains(&kw) {
            continue;
        }
        out.push(kw);
    }
    out
}
