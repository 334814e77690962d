use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;
use std::path::{Path, PathBuf};

use crate::store::default_reset_at;

/// Environment variable naming an alternate config file.
pub const CONFIG_ENV: &str = "TICKTOCK_CONFIG";
/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "TICKTOCK_HOME";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default output mode: `pretty`, `text` or `json`.
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub reset: ResetConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(
        default = "default_reset_at",
        serialize_with = "serialize_hhmm",
        deserialize_with = "deserialize_hhmm"
    )]
    pub at: NaiveTime,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            at: default_reset_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_ms: default_refresh_ms(),
        }
    }
}

/// Path of the user config file: `$TICKTOCK_CONFIG`, else
/// `<config dir>/ticktock/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("ticktock/config.toml"))
}

/// Load the config at `path`; a missing file means defaults.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<Config>(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_config() -> Result<Config> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(Config::default()),
    }
}

/// Resolve where tickets live: CLI flag, then `$TICKTOCK_HOME`, then config,
/// then `<data dir>/ticktock`, then `./.ticktock`.
#[must_use]
pub fn resolve_data_dir(cli_dir: Option<&Path>, config: &Config) -> PathBuf {
    let env_dir = env::var_os(HOME_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    resolve_data_dir_inner(cli_dir, env_dir, config.store.dir.as_deref(), dirs::data_dir())
}

fn resolve_data_dir_inner(
    cli_dir: Option<&Path>,
    env_dir: Option<PathBuf>,
    config_dir: Option<&Path>,
    platform_dir: Option<PathBuf>,
) -> PathBuf {
    if let Some(dir) = cli_dir {
        return dir.to_path_buf();
    }
    if let Some(dir) = env_dir {
        return dir;
    }
    if let Some(dir) = config_dir {
        return dir.to_path_buf();
    }
    platform_dir.map_or_else(|| PathBuf::from(".ticktock"), |dir| dir.join("ticktock"))
}

const fn default_true() -> bool {
    true
}

const fn default_refresh_ms() -> u64 {
    1000
}

fn serialize_hhmm<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.format("%H:%M").to_string())
}

fn deserialize_hhmm<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S"))
        .map_err(|err| serde::de::Error::custom(format!("invalid reset time '{raw}': {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = TempDir::new().expect("temp dir must be created");
        let cfg = load_config_from(&dir.path().join("config.toml")).expect("load should succeed");
        assert!(cfg.output.is_none());
        assert!(cfg.store.dir.is_none());
        assert!(cfg.reset.enabled);
        assert_eq!(cfg.reset.at, NaiveTime::from_hms_opt(3, 0, 0).unwrap());
        assert_eq!(cfg.display.refresh_ms, 1000);
    }

    #[test]
    fn config_file_parses_all_sections() {
        let dir = TempDir::new().expect("temp dir must be created");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
output = "json"

[store]
dir = "/var/lib/tickets"

[reset]
enabled = false
at = "04:30"

[display]
refresh_ms = 250
"#,
        )
        .expect("write config");

        let cfg = load_config_from(&path).expect("parse");
        assert_eq!(cfg.output.as_deref(), Some("json"));
        assert_eq!(cfg.store.dir, Some(PathBuf::from("/var/lib/tickets")));
        assert!(!cfg.reset.enabled);
        assert_eq!(cfg.reset.at, NaiveTime::from_hms_opt(4, 30, 0).unwrap());
        assert_eq!(cfg.display.refresh_ms, 250);
    }

    #[test]
    fn bad_reset_time_is_a_parse_error() {
        let dir = TempDir::new().expect("temp dir must be created");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[reset]\nat = \"quarter past three\"\n").expect("write config");
        let err = load_config_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("invalid reset time"));
    }

    #[test]
    fn data_dir_precedence() {
        let cli = PathBuf::from("/cli");
        let cfg = PathBuf::from("/cfg");
        assert_eq!(
            resolve_data_dir_inner(
                Some(&cli),
                Some(PathBuf::from("/env")),
                Some(&cfg),
                Some(PathBuf::from("/data"))
            ),
            cli
        );
        assert_eq!(
            resolve_data_dir_inner(None, Some(PathBuf::from("/env")), Some(&cfg), None),
            PathBuf::from("/env")
        );
        assert_eq!(
            resolve_data_dir_inner(None, None, Some(&cfg), Some(PathBuf::from("/data"))),
            cfg
        );
        assert_eq!(
            resolve_data_dir_inner(None, None, None, Some(PathBuf::from("/data"))),
            PathBuf::from("/data/ticktock")
        );
        assert_eq!(
            resolve_data_dir_inner(None, None, None, None),
            PathBuf::from(".ticktock")
        );
    }
}
