//! Layered CLI configuration.
//!
//! Built-in defaults, then an optional TOML file, then `AOTLEDGER_*`
//! environment variables. Command-line flags are applied last by `main`.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "AOTLEDGER_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "aotledger.toml";

const STATE_FILE_ENV: &str = "AOTLEDGER_STATE_FILE";
const STORE_ENV: &str = "AOTLEDGER_STORE";
const LOG_DIR_ENV: &str = "AOTLEDGER_LOG_DIR";
const LOG_LEVEL_ENV: &str = "AOTLEDGER_LOG_LEVEL";

/// Ledger persistence format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    #[default]
    Markdown,
    Sqlite,
}

impl StoreFormat {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "sqlite" | "db" => Ok(Self::Sqlite),
            other => bail!("unknown store format `{other}`; expected markdown|sqlite"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub state_file: PathBuf,
    pub store: StoreFormat,
    pub command_timeout_secs: u64,
    /// Root for relative `file` / `not_file` checks; current directory when unset.
    pub probe_root: Option<PathBuf>,
    pub log_level: Option<String>,
    /// File logging is off unless this is set.
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(aotledger_core::repo::markdown_store::DEFAULT_STATE_FILE),
            store: StoreFormat::Markdown,
            command_timeout_secs: 120,
            probe_root: None,
            log_level: None,
            log_dir: None,
        }
    }
}

impl Config {
    /// Defaults, then the config file, then the process environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let lookup = |key: &str| std::env::var(key).ok();
        let mut config = match config_file_path(explicit, &lookup) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(lookup)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = non_empty(STATE_FILE_ENV) {
            self.state_file = PathBuf::from(value);
        }
        if let Some(value) = non_empty(STORE_ENV) {
            self.store = StoreFormat::parse(&value)
                .with_context(|| format!("Invalid {STORE_ENV}"))?;
        }
        if let Some(value) = non_empty(LOG_DIR_ENV) {
            self.log_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = non_empty(LOG_LEVEL_ENV) {
            self.log_level = Some(value);
        }
        Ok(())
    }
}

/// `--config`, else `$AOTLEDGER_CONFIG`, else `./aotledger.toml` when present.
fn config_file_path(
    explicit: Option<&Path>,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = lookup(CONFIG_ENV).filter(|value| !value.trim().is_empty()) {
        return Some(PathBuf::from(path));
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    local.is_file().then_some(local)
}

#[cfg(test)]
mod tests {
    use super::{config_file_path, Config, StoreFormat};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_markdown_state_file() {
        let config = Config::default();
        assert_eq!(config.state_file, PathBuf::from(".claude/aot-loop-state.md"));
        assert_eq!(config.store, StoreFormat::Markdown);
        assert_eq!(config.command_timeout_secs, 120);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn file_values_override_defaults_and_keep_the_rest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("aotledger.toml");
        std::fs::write(
            &path,
            "store = \"sqlite\"\nstate_file = \"ledger.db\"\ncommand_timeout_secs = 30\n",
        )
        .expect("write config");

        let config = Config::from_file(&path).expect("parse config");
        assert_eq!(config.store, StoreFormat::Sqlite);
        assert_eq!(config.state_file, PathBuf::from("ledger.db"));
        assert_eq!(config.command_timeout_secs, 30);
        assert!(config.probe_root.is_none());
    }

    #[test]
    fn unknown_file_store_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "store = \"redis\"\n").expect("write config");
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("AOTLEDGER_STATE_FILE", "other.md"),
                ("AOTLEDGER_STORE", "SQLite"),
                ("AOTLEDGER_LOG_LEVEL", "debug"),
                ("AOTLEDGER_LOG_DIR", ""),
            ]))
            .expect("apply env");
        assert_eq!(config.state_file, PathBuf::from("other.md"));
        assert_eq!(config.store, StoreFormat::Sqlite);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert!(config.log_dir.is_none());

        let err = config
            .apply_env(env(&[("AOTLEDGER_STORE", "redis")]))
            .expect_err("bad store");
        assert!(format!("{err:#}").contains("unknown store format"));
    }

    #[test]
    fn explicit_config_path_wins_over_env() {
        let lookup = env(&[("AOTLEDGER_CONFIG", "/etc/aotledger.toml")]);
        assert_eq!(
            config_file_path(Some(Path::new("mine.toml")), &lookup),
            Some(PathBuf::from("mine.toml"))
        );
        assert_eq!(
            config_file_path(None, &lookup),
            Some(PathBuf::from("/etc/aotledger.toml"))
        );
    }
}
