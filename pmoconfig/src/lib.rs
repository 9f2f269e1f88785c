//! # PMOParty Configuration Module
//!
//! This module provides configuration management for PMOParty, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides (kept in memory, never written back)
//! - Type-safe getters and setters for configuration values
//! - Thread-safe singleton access pattern
//!
//! Domain crates extend [`Config`] through their own traits
//! (`SpotifyConfigExt`, `PartyConfigExt`) instead of adding getters here.
//!
//! ## Usage
//!
//! ```no_run
//! use pmoconfig::get_config;
//!
//! let config = get_config();
//! let port = config.get_http_port();
//! config.set_http_port(9000)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Result, anyhow};
use dirs::home_dir;
use lazy_static::lazy_static;
use pmoutils::guess_local_ip;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{info, warn};

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmoparty.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load PMOParty configuration"));
}

const ENV_CONFIG_DIR: &str = "PMOPARTY_CONFIG";
const ENV_PREFIX: &str = "PMOPARTY_CONFIG__";

/// Variables d'environnement « historiques » des déploiements (Render, Docker…)
/// et le chemin de configuration qu'elles surchargent.
const WELL_KNOWN_ENV: &[(&str, &[&str])] = &[
    ("PORT", &["host", "http_port"]),
    ("SPOTIFY_CLIENT_ID", &["accounts", "spotify", "client_id"]),
    ("SPOTIFY_CLIENT_SECRET", &["accounts", "spotify", "client_secret"]),
    ("PARTY_ADMIN_PASSWORD", &["party", "admin_password"]),
];

// Default values for configuration
const DEFAULT_HTTP_PORT: u16 = 3000;
const DEFAULT_PORT_ATTEMPTS: usize = 20;
const DEFAULT_LOG_BUFFER_CAPACITY: usize = 1000;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;

/// Macro to generate getter/setter for usize values with default
macro_rules! impl_usize_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> usize {
            match self.get_value($path) {
                Ok(Value::Number(n)) => n.as_u64().map(|n| n as usize).unwrap_or($default),
                Ok(Value::String(s)) => s.trim().parse().unwrap_or($default),
                _ => $default,
            }
        }

        pub fn $setter(&self, value: usize) -> Result<()> {
            self.set_value($path, Value::Number(Number::from(value)))
        }
    };
}

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> bool {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => b,
                _ => $default,
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Configuration manager for PMOParty
///
/// Two layers are kept apart:
/// - `data`: embedded defaults merged with `config.yaml`, persisted on change
/// - `overrides`: values coming from the environment, visible to getters
///   but never saved (the Spotify secret must not end up on disk)
#[derive(Debug)]
pub struct Config {
    config_dir: Option<String>,
    path: Option<PathBuf>,
    data: Mutex<Value>,
    overrides: Mutex<Value>,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        if !directory.is_empty() {
            return directory.to_string();
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        if Path::new(".pmoparty").exists() {
            return ".pmoparty".to_string();
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(".pmoparty");
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        ".pmoparty".to_string()
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        Ok(())
    }

    /// Loads the configuration from the specified directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `PMOPARTY_CONFIG` environment variable
    /// 3. `.pmoparty` in the current directory
    /// 4. `.pmoparty` in the user's home directory
    ///
    /// Defaults are merged with `config.yaml`, the result is written back
    /// (so the operator gets a complete template), then environment
    /// overrides are layered in memory.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);
        Self::validate_config_dir(Path::new(&config_dir))?;
        info!(config_dir = %config_dir, "Using config directory");

        let path = Path::new(&config_dir).join("config.yaml");

        let external = match fs::read(&path) {
            Ok(bytes) => {
                info!(config_file = %path.display(), "Loaded config file");
                Some(serde_yaml::from_slice::<Value>(&bytes)?)
            }
            Err(_) => {
                info!(config_file = %path.display(), "Config file not found, using default embedded config");
                None
            }
        };

        let data = Self::merged_defaults(external.as_ref())?;

        let mut overrides = Value::Mapping(Mapping::new());
        Self::apply_env_overrides(&mut overrides, env::vars());

        let config = Config {
            config_dir: Some(config_dir),
            path: Some(path),
            data: Mutex::new(data),
            overrides: Mutex::new(overrides),
        };

        config.save()?;
        Ok(config)
    }

    /// Builds an in-memory configuration from a YAML document
    ///
    /// The document is merged over the embedded defaults. Nothing is read
    /// from the environment and nothing is written to disk.
    ///
    /// # Exemple
    ///
    /// ```
    /// use pmoconfig::Config;
    ///
    /// let config = Config::from_yaml_str("host:\n  http_port: 4000\n")?;
    /// assert_eq!(config.get_http_port(), 4000);
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let external: Value = serde_yaml::from_str(yaml)?;
        let data = Self::merged_defaults(Some(&external))?;
        Ok(Config {
            config_dir: None,
            path: None,
            data: Mutex::new(data),
            overrides: Mutex::new(Value::Mapping(Mapping::new())),
        })
    }

    fn merged_defaults(external: Option<&Value>) -> Result<Value> {
        let mut value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        if let Some(external) = external {
            if !external.is_null() {
                merge_yaml(&mut value, &lower_keys_value(external.clone()));
            }
        }
        Ok(lower_keys_value(value))
    }

    /// Returns the configuration directory, if the config is file-backed
    pub fn config_dir(&self) -> Option<&str> {
        self.config_dir.as_deref()
    }

    fn data(&self) -> MutexGuard<'_, Value> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn overrides(&self) -> MutexGuard<'_, Value> {
        self.overrides.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Saves the file-backed layer to `config.yaml` (no-op for in-memory configs)
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let yaml = serde_yaml::to_string(&*self.data())?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// An environment override at the same path is dropped so the new
    /// value becomes visible immediately.
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.data();
            set_value_internal(&mut data, path, value)?;
        }
        remove_value_internal(&mut self.overrides(), path);
        self.save()
    }

    /// Gets a configuration value at the specified path
    ///
    /// Environment overrides take precedence over the file-backed layer.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        if let Ok(value) = get_value_internal(&self.overrides(), path) {
            if !matches!(value, Value::Mapping(_)) {
                return Ok(value);
            }
        }

        let mut merged = self.data().clone();
        merge_yaml(&mut merged, &self.overrides());
        get_value_internal(&merged, path)
    }

    /// Gets a string value, treating empty strings as absent
    pub fn get_string(&self, path: &[&str]) -> Option<String> {
        match self.get_value(path) {
            Ok(Value::String(s)) if !s.trim().is_empty() => Some(s),
            Ok(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Gets a list of strings, skipping non-string entries
    pub fn get_string_list(&self, path: &[&str]) -> Option<Vec<String>> {
        match self.get_value(path) {
            Ok(Value::Sequence(seq)) => Some(
                seq.into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Gets an unsigned integer value, accepting numeric strings
    pub fn get_u64(&self, path: &[&str]) -> Option<u64> {
        match self.get_value(path) {
            Ok(Value::Number(n)) => n.as_u64(),
            Ok(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn apply_env_overrides<I>(overrides: &mut Value, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                let key_path: Vec<&str> = stripped.split("__").collect();
                let _ = set_value_internal(overrides, &key_path, convert_env_value(&value));
                continue;
            }

            if let Some((_, path)) = WELL_KNOWN_ENV.iter().find(|(name, _)| *name == key) {
                if !value.trim().is_empty() {
                    let _ = set_value_internal(overrides, path, convert_env_value(&value));
                }
            }
        }
    }

    /// Gets the base URL (host part) advertised to guests
    ///
    /// Returns the configured value, or the guessed local IP if none.
    pub fn get_base_url(&self) -> String {
        match self.get_string(&["host", "base_url"]) {
            Some(url) => url,
            None => guess_local_ip(),
        }
    }

    /// Gets the HTTP port from configuration (default 3000)
    pub fn get_http_port(&self) -> u16 {
        match self.get_u64(&["host", "http_port"]) {
            Some(port) if port <= u16::MAX as u64 => port as u16,
            Some(port) => {
                warn!("Invalid HTTP port '{}', using default {}", port, DEFAULT_HTTP_PORT);
                DEFAULT_HTTP_PORT
            }
            None => DEFAULT_HTTP_PORT,
        }
    }

    /// Sets the HTTP port in configuration
    pub fn set_http_port(&self, port: u16) -> Result<()> {
        self.set_value(&["host", "http_port"], Value::Number(Number::from(port)))
    }

    impl_usize_config!(
        get_port_attempts,
        set_port_attempts,
        &["host", "port_attempts"],
        DEFAULT_PORT_ATTEMPTS
    );

    impl_usize_config!(
        get_log_cache_size,
        set_log_cache_size,
        &["host", "logger", "buffer_capacity"],
        DEFAULT_LOG_BUFFER_CAPACITY
    );

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    /// Récupère le niveau de log minimum depuis la configuration
    pub fn get_log_min_level(&self) -> String {
        self.get_string(&["host", "logger", "min_level"])
            .unwrap_or_else(|| DEFAULT_LOG_MIN_LEVEL.to_string())
    }

    /// Définit le niveau de log minimum dans la configuration
    pub fn set_log_min_level(&self, level: &str) -> Result<()> {
        self.set_value(
            &["host", "logger", "min_level"],
            Value::String(level.to_string()),
        )
    }
}

/// Returns the global configuration instance
///
/// The instance is lazily loaded on first access.
///
/// # Panics
///
/// Panics if the configuration directory cannot be created or the
/// `config.yaml` file is not valid YAML.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    if path.is_empty() {
        *data = value;
        return Ok(());
    }
    if data.is_null() {
        *data = Value::Mapping(Mapping::new());
    }
    if let Value::Mapping(map) = data {
        let key = Value::String(path[0].to_lowercase());
        if path.len() == 1 {
            map.insert(key, value);
        } else {
            let entry = map.entry(key).or_insert(Value::Mapping(Mapping::new()));
            set_value_internal(entry, &path[1..], value)?;
        }
        Ok(())
    } else {
        Err(anyhow!("Current node is not a map"))
    }
}

fn remove_value_internal(data: &mut Value, path: &[&str]) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = data;
    for key in parents {
        match current {
            Value::Mapping(map) => match map.get_mut(Value::String(key.to_lowercase())) {
                Some(next) => current = next,
                None => return,
            },
            _ => return,
        }
    }
    if let Value::Mapping(map) = current {
        map.remove(Value::String(last.to_lowercase()));
    }
}

fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
    let mut current = data;
    for (i, key) in path.iter().enumerate() {
        match current {
            Value::Mapping(map) => match map.get(Value::String(key.to_lowercase())) {
                Some(next) => current = next,
                None => return Err(anyhow!("Path {} does not exist", path[..=i].join("."))),
            },
            _ => return Err(anyhow!("Path {} is not a mapping", path[..i].join("."))),
        }
    }
    Ok(current.clone())
}

fn convert_env_value(value: &str) -> Value {
    match serde_yaml::from_str::<Value>(value) {
        Ok(parsed @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => parsed,
        _ => Value::String(value.to_string()),
    }
}

fn lower_keys_value(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| {
                    let k = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (k, lower_keys_value(v))
                })
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys_value).collect()),
        _ => value,
    }
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key; scalars and sequences are replaced.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_are_embedded() {
        let config = Config::from_yaml_str("{}").unwrap();
        assert_eq!(config.get_http_port(), 3000);
        assert_eq!(config.get_port_attempts(), 20);
        assert_eq!(config.get_log_min_level(), "INFO");
        assert!(config.get_log_enable_console());
        assert_eq!(
            config.get_string_list(&["party", "seed", "themes"]).unwrap().len(),
            3
        );
    }

    #[test]
    fn test_external_yaml_merges_over_defaults() {
        let config = Config::from_yaml_str("HOST:\n  HTTP_PORT: 8081\n").unwrap();
        assert_eq!(config.get_http_port(), 8081);
        // Les clés voisines restent celles par défaut
        assert_eq!(config.get_port_attempts(), 20);
    }

    #[test]
    fn test_prefixed_env_override() {
        let mut overrides = Value::Mapping(Mapping::new());
        Config::apply_env_overrides(
            &mut overrides,
            vars(&[("PMOPARTY_CONFIG__HOST__HTTP_PORT", "9090"), ("UNRELATED", "x")]),
        );
        assert_eq!(
            get_value_internal(&overrides, &["host", "http_port"]).unwrap(),
            Value::Number(Number::from(9090))
        );
        assert!(get_value_internal(&overrides, &["unrelated"]).is_err());
    }

    #[test]
    fn test_well_known_env_override() {
        let config = Config::from_yaml_str("{}").unwrap();
        Config::apply_env_overrides(
            &mut config.overrides(),
            vars(&[
                ("PORT", "4242"),
                ("SPOTIFY_CLIENT_ID", "abc"),
                ("SPOTIFY_CLIENT_SECRET", ""),
            ]),
        );
        assert_eq!(config.get_http_port(), 4242);
        assert_eq!(
            config.get_string(&["accounts", "spotify", "client_id"]).as_deref(),
            Some("abc")
        );
        // Une variable vide ne masque pas la configuration
        assert_eq!(config.get_string(&["accounts", "spotify", "client_secret"]), None);
    }

    #[test]
    fn test_overrides_are_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        Config::apply_env_overrides(
            &mut config.overrides(),
            vars(&[("SPOTIFY_CLIENT_SECRET", "top-secret")]),
        );
        config.set_log_min_level("DEBUG").unwrap();

        let saved = fs::read_to_string(dir.path().join("config.yaml")).unwrap();
        assert!(saved.contains("DEBUG"));
        assert!(!saved.contains("top-secret"));
        assert_eq!(
            config.get_string(&["accounts", "spotify", "client_secret"]).as_deref(),
            Some("top-secret")
        );
    }

    #[test]
    fn test_set_value_wins_over_override() {
        let config = Config::from_yaml_str("{}").unwrap();
        Config::apply_env_overrides(&mut config.overrides(), vars(&[("PORT", "4242")]));
        config.set_http_port(5000).unwrap();
        assert_eq!(config.get_http_port(), 5000);
    }

    #[test]
    fn test_load_config_reloads_saved_file() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();
        {
            let config = Config::load_config(dir_str).unwrap();
            config.set_port_attempts(3).unwrap();
        }
        let config = Config::load_config(dir_str).unwrap();
        assert_eq!(config.get_port_attempts(), 3);
        assert_eq!(config.config_dir(), Some(dir_str));
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = Config::from_yaml_str("host:\n  http_port: 700000\n").unwrap();
        assert_eq!(config.get_http_port(), 3000);
    }
}
