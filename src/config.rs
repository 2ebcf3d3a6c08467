use serde::Deserialize;
use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::errors::ConfigError;

/// Snapshot interval used when none (or a non-positive one) is configured.
pub const DEFAULT_SNAPSHOT_INTERVAL_MINUTES: i64 = 10;

/// Longest accepted snapshot interval: one week.
pub const MAX_SNAPSHOT_INTERVAL_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// Address to listen on. `:8080` binds every interface.
    pub listen_addr: String,

    /// Log level for tracing (e.g. "info", "debug").
    pub log_level: String,

    /// Path to the snapshot JSON file.
    pub snapshot_path: String,

    /// Interval (minutes) between automatic snapshot saves.
    ///
    /// Zero, negative, or values above one week resolve to the ten minute
    /// default.
    pub snapshot_interval_minutes: i64,

    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub mongodb_collection: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: ":8080".to_string(),
            log_level: "info".to_string(),
            snapshot_path: "output.json".to_string(),
            snapshot_interval_minutes: DEFAULT_SNAPSHOT_INTERVAL_MINUTES,
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_database: "getir-case-study".to_string(),
            mongodb_collection: "records".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then an optional `config.json`, then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let cfg = match locate_config_file() {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };

        Ok(cfg.with_overrides(|name| std::env::var(name).ok()))
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str::<AppConfig>(&file).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment-style overrides looked up through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("EXPORT_FILE_NAME") {
            self.snapshot_path = v;
        }
        if let Some(v) = lookup("API_PORT") {
            self.listen_addr = v;
        }
        if let Some(v) = lookup("DURATION") {
            self.snapshot_interval_minutes = match v.trim().parse::<i64>() {
                Ok(minutes) => minutes,
                Err(e) => {
                    tracing::warn!(
                        "DURATION={v:?} is not a number ({e}), using {DEFAULT_SNAPSHOT_INTERVAL_MINUTES} minutes"
                    );
                    DEFAULT_SNAPSHOT_INTERVAL_MINUTES
                }
            };
        }
        if let Some(v) = lookup("MONGODB_URI") {
            self.mongodb_uri = v;
        }
        if let Some(v) = lookup("MONGODB_DATABASE") {
            self.mongodb_database = v;
        }
        if let Some(v) = lookup("MONGODB_COLLECTION") {
            self.mongodb_collection = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log_level = v;
        }
        self
    }

    pub fn snapshot_interval(&self) -> Duration {
        let minutes = match self.snapshot_interval_minutes {
            m if m > MAX_SNAPSHOT_INTERVAL_MINUTES => {
                tracing::warn!(
                    "Snapshot interval of {m} minutes exceeds {MAX_SNAPSHOT_INTERVAL_MINUTES}, using {DEFAULT_SNAPSHOT_INTERVAL_MINUTES} minutes"
                );
                DEFAULT_SNAPSHOT_INTERVAL_MINUTES
            }
            m if m > 0 => m,
            _ => DEFAULT_SNAPSHOT_INTERVAL_MINUTES,
        };
        Duration::from_secs(minutes.unsigned_abs() * 60)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = self.listen_addr.trim();
        let addr = if addr.starts_with(':') {
            format!("0.0.0.0{addr}")
        } else {
            addr.to_string()
        };

        addr.parse()
            .map_err(|_| ConfigError::ListenAddr(self.listen_addr.clone()))
    }
}

/// `STOREAPI_CONFIG`, else `config.json` next to the executable or one level up.
fn locate_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("STOREAPI_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let exe_path = std::env::current_exe().ok()?;
    let exe_dir = exe_path.parent()?;

    [exe_dir.join("config.json"), exe_dir.join("..").join("config.json")]
        .into_iter()
        .find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.snapshot_path, "output.json");
        assert_eq!(cfg.listen_addr, ":8080");
        assert_eq!(cfg.snapshot_interval(), Duration::from_secs(600));
        assert_eq!(cfg.socket_addr().unwrap(), "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn environment_overrides_file_values() {
        let cfg = AppConfig::default().with_overrides(env(&[
            ("EXPORT_FILE_NAME", "/tmp/store.json"),
            ("API_PORT", "127.0.0.1:9000"),
            ("DURATION", "3"),
            ("MONGODB_URI", "mongodb://db:27017"),
        ]));

        assert_eq!(cfg.snapshot_path, "/tmp/store.json");
        assert_eq!(cfg.socket_addr().unwrap(), "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.snapshot_interval(), Duration::from_secs(180));
        assert_eq!(cfg.mongodb_uri, "mongodb://db:27017");
        assert_eq!(cfg.mongodb_collection, "records");
    }

    #[test]
    fn bad_interval_falls_back_to_default() {
        let huge = i64::MAX.to_string();
        for raw in ["abc", "0", "-5", "", "10081", huge.as_str()] {
            let cfg = AppConfig::default().with_overrides(env(&[("DURATION", raw)]));
            assert_eq!(cfg.snapshot_interval(), Duration::from_secs(600), "DURATION={raw:?}");
        }
    }

    #[test]
    fn one_week_is_the_longest_interval() {
        let cfg = AppConfig::default().with_overrides(env(&[("DURATION", "10080")]));
        assert_eq!(cfg.snapshot_interval(), Duration::from_secs(7 * 24 * 60 * 60));
    }

    #[test]
    fn partial_config_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "snapshot_path": "snap.json", "log_level": "debug" }"#).unwrap();

        let cfg = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(cfg.snapshot_path, "snap.json");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.mongodb_database, "getir-case-study");
    }

    #[test]
    fn invalid_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            AppConfig::load_from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn malformed_listen_addr_is_rejected() {
        let cfg = AppConfig {
            listen_addr: "nowhere".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(cfg.socket_addr(), Err(ConfigError::ListenAddr(_))));
    }
}
