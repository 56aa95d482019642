// Configuration loading and parsing (banpick.toml, roles.toml).

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::catalog::Role;
use crate::recommend::ControllerScope;
use crate::series::SeriesFormat;

/// Upper bound for the automated controller's thinking delay.
const MAIN_FILE: &str = "banpick.toml";
const ROLES_FILE: &str = "roles.toml";

const MAX_THINKING_DELAY_MS: u64 = 60_000;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub series: SeriesConfig,
    pub controller: ControllerConfig,
    pub database: DatabaseConfig,
    /// Role tags per entity id, from roles.toml.
    pub roles: HashMap<String, BTreeSet<Role>>,
}

// ---------------------------------------------------------------------------
// banpick.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire banpick.toml file.
#[derive(Debug, Clone, Deserialize)]
struct BanpickFile {
    catalog: CatalogConfig,
    series: SeriesConfig,
    controller: ControllerConfig,
    database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub base_url: String,
    /// Locale tags to fetch. The first one is the display locale.
    pub locales: Vec<String>,
    pub request_timeout_secs: u64,
}

impl CatalogConfig {
    pub fn display_locale(&self) -> &str {
        self.locales.first().map(String::as_str).unwrap_or("en_US")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeriesConfig {
    pub default_format: SeriesFormat,
    pub fearless: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    pub scope: ControllerScope,
    pub auto_apply: bool,
    pub thinking_delay_ms: u64,
}

impl ControllerConfig {
    pub fn thinking_delay(&self) -> Duration {
        Duration::from_millis(self.thinking_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path. Empty selects the platform data directory.
    #[serde(default)]
    pub path: String,
    pub series_key: String,
}

impl DatabaseConfig {
    /// Resolve the configured path, falling back to the per-user data dir.
    pub fn resolved_path(&self) -> PathBuf {
        if !self.path.trim().is_empty() {
            return PathBuf::from(&self.path);
        }
        directories::ProjectDirs::from("", "", "banpick")
            .map(|dirs| dirs.data_dir().join("banpick.db"))
            .unwrap_or_else(|| PathBuf::from("banpick.db"))
    }
}

// ---------------------------------------------------------------------------
// roles.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
struct RolesFile {
    #[serde(default)]
    roles: HashMap<String, BTreeSet<Role>>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/banpick.toml` and
/// (optionally) `config/roles.toml`, relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- banpick.toml (required) ---
    let main_path = config_dir.join(MAIN_FILE);
    let main_text = read_file(&main_path)?;
    let main: BanpickFile = toml::from_str(&main_text).map_err(|e| ConfigError::ParseError {
        path: main_path.clone(),
        source: e,
    })?;

    // --- roles.toml (optional) ---
    let roles_path = config_dir.join(ROLES_FILE);
    let roles = if roles_path.exists() {
        let roles_text = read_file(&roles_path)?;
        let file: RolesFile = toml::from_str(&roles_text).map_err(|e| ConfigError::ParseError {
            path: roles_path.clone(),
            source: e,
        })?;
        file.roles
    } else {
        HashMap::new()
    };

    let config = Config {
        catalog: main.catalog,
        series: main.series,
        controller: main.controller,
        database: main.database,
        roles,
    };

    validate(&config)?;

    Ok(config)
}

/// Copy `banpick.toml` and `roles.toml` from `defaults/` into `config/`
/// when missing. Existing files are never overwritten. Returns the files
/// copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");
    let copy_error = |message: String| ConfigError::DefaultsCopyError { message };

    let mut copied = Vec::new();
    for name in [MAIN_FILE, ROLES_FILE] {
        let source = defaults_dir.join(name);
        let target = config_dir.join(name);
        if target.exists() || !source.exists() {
            continue;
        }
        std::fs::create_dir_all(&config_dir)
            .map_err(|e| copy_error(format!("failed to create {}: {e}", config_dir.display())))?;
        std::fs::copy(&source, &target).map_err(|e| {
            copy_error(format!(
                "failed to copy {} to {}: {e}",
                source.display(),
                target.display()
            ))
        })?;
        copied.push(target);
    }

    if !config_dir.join(MAIN_FILE).exists() {
        return Err(copy_error(format!(
            "{MAIN_FILE} found in neither defaults/ nor config/ under {}",
            base_dir.display()
        )));
    }
    Ok(copied)
}

/// Loads config relative to the current working directory, copying
/// defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let base_url = config.catalog.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(invalid(
            "catalog.base_url",
            format!("must be an http(s) URL, got {base_url:?}"),
        ));
    }

    if config.catalog.locales.is_empty() {
        return Err(invalid("catalog.locales", "must list at least one locale"));
    }
    if let Some(bad) = config.catalog.locales.iter().find(|l| l.trim().is_empty()) {
        return Err(invalid(
            "catalog.locales",
            format!("locale tags must not be blank, got {bad:?}"),
        ));
    }

    if config.catalog.request_timeout_secs == 0 {
        return Err(invalid("catalog.request_timeout_secs", "must be > 0"));
    }

    let delay = config.controller.thinking_delay_ms;
    if delay > MAX_THINKING_DELAY_MS {
        return Err(invalid(
            "controller.thinking_delay_ms",
            format!("must be at most {MAX_THINKING_DELAY_MS}, got {delay}"),
        ));
    }

    if config.database.series_key.trim().is_empty() {
        return Err(invalid("database.series_key", "must not be empty"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const DEFAULT_MAIN: &str = include_str!("../../../defaults/banpick.toml");
    const DEFAULT_ROLES: &str = include_str!("../../../defaults/roles.toml");

    fn write_config(main: &str, roles: Option<&str>) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let config_dir = tmp.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("banpick.toml"), main).unwrap();
        if let Some(roles) = roles {
            fs::write(config_dir.join("roles.toml"), roles).unwrap();
        }
        tmp
    }

    fn expect_validation_field(main: &str, expected: &str) {
        let tmp = write_config(main, None);
        match load_config_from(tmp.path()).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn load_shipped_defaults() {
        let tmp = write_config(DEFAULT_MAIN, Some(DEFAULT_ROLES));
        let config = load_config_from(tmp.path()).expect("defaults should load");

        assert_eq!(config.catalog.base_url, "https://ddragon.leagueoflegends.com");
        assert_eq!(config.catalog.locales, vec!["en_US", "zh_CN"]);
        assert_eq!(config.catalog.display_locale(), "en_US");
        assert_eq!(config.catalog.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.series.default_format, SeriesFormat::Bo3);
        assert!(config.series.fearless);
        assert_eq!(config.controller.scope, ControllerScope::Off);
        assert!(!config.controller.auto_apply);
        assert_eq!(config.controller.thinking_delay(), Duration::from_millis(1500));
        assert_eq!(config.database.path, "banpick.db");
        assert_eq!(config.database.series_key, "fearless_series");

        let monkey = config.roles.get("MonkeyKing").unwrap();
        assert!(monkey.contains(&Role::Top) && monkey.contains(&Role::Jungle));
        assert_eq!(config.roles.get("Thresh").unwrap().len(), 1);
    }

    #[test]
    fn missing_roles_toml_is_ok() {
        let tmp = write_config(DEFAULT_MAIN, None);
        let config = load_config_from(tmp.path()).unwrap();
        assert!(config.roles.is_empty());
    }

    #[test]
    fn missing_main_file_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        match load_config_from(tmp.path()).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("config/banpick.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }
    }

    #[test]
    fn unknown_role_is_a_parse_error() {
        let tmp = write_config(DEFAULT_MAIN, Some("[roles]\nAhri = [\"carry\"]\n"));
        assert!(matches!(
            load_config_from(tmp.path()).unwrap_err(),
            ConfigError::ParseError { .. }
        ));
    }

    #[test]
    fn bad_format_is_a_parse_error() {
        let main = DEFAULT_MAIN.replace("default_format = \"bo3\"", "default_format = \"bo7\"");
        let tmp = write_config(&main, None);
        assert!(matches!(
            load_config_from(tmp.path()).unwrap_err(),
            ConfigError::ParseError { .. }
        ));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let main = DEFAULT_MAIN.replace(
            "https://ddragon.leagueoflegends.com",
            "ftp://ddragon.leagueoflegends.com",
        );
        expect_validation_field(&main, "catalog.base_url");
    }

    #[test]
    fn rejects_empty_locales() {
        let main = DEFAULT_MAIN.replace("locales = [\"en_US\", \"zh_CN\"]", "locales = []");
        expect_validation_field(&main, "catalog.locales");
    }

    #[test]
    fn rejects_zero_timeout() {
        let main = DEFAULT_MAIN.replace("request_timeout_secs = 15", "request_timeout_secs = 0");
        expect_validation_field(&main, "catalog.request_timeout_secs");
    }

    #[test]
    fn rejects_huge_thinking_delay() {
        let main = DEFAULT_MAIN.replace("thinking_delay_ms = 1500", "thinking_delay_ms = 600000");
        expect_validation_field(&main, "controller.thinking_delay_ms");
    }

    #[test]
    fn rejects_blank_series_key() {
        let main = DEFAULT_MAIN.replace("series_key = \"fearless_series\"", "series_key = \"\"");
        expect_validation_field(&main, "database.series_key");
    }

    #[test]
    fn empty_db_path_uses_data_dir() {
        let db = DatabaseConfig {
            path: String::new(),
            series_key: "k".into(),
        };
        assert!(db.resolved_path().ends_with("banpick.db"));
        let explicit = DatabaseConfig {
            path: "custom.db".into(),
            series_key: "k".into(),
        };
        assert_eq!(explicit.resolved_path(), PathBuf::from("custom.db"));
    }

    #[test]
    fn ensure_config_files_copies_then_preserves() {
        let tmp = tempfile::tempdir().unwrap();
        let defaults = tmp.path().join("defaults");
        fs::create_dir_all(&defaults).unwrap();
        fs::write(defaults.join("banpick.toml"), DEFAULT_MAIN).unwrap();
        fs::write(defaults.join("roles.toml"), DEFAULT_ROLES).unwrap();
        fs::write(defaults.join("local.toml.example"), "# sample").unwrap();

        let copied = ensure_config_files(tmp.path()).unwrap();
        assert_eq!(copied.len(), 2);
        assert!(!tmp.path().join("config/local.toml.example").exists());

        // User edits survive a second run.
        let edited = DEFAULT_MAIN.replace("fearless = true", "fearless = false");
        fs::write(tmp.path().join("config/banpick.toml"), &edited).unwrap();
        assert!(ensure_config_files(tmp.path()).unwrap().is_empty());
        let config = load_config_from(tmp.path()).unwrap();
        assert!(!config.series.fearless);
    }

    #[test]
    fn ensure_config_files_fills_only_missing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let defaults = tmp.path().join("defaults");
        let config = tmp.path().join("config");
        fs::create_dir_all(&defaults).unwrap();
        fs::create_dir_all(&config).unwrap();
        fs::write(defaults.join("banpick.toml"), DEFAULT_MAIN).unwrap();
        fs::write(defaults.join("roles.toml"), DEFAULT_ROLES).unwrap();
        fs::write(config.join("banpick.toml"), DEFAULT_MAIN).unwrap();

        let copied = ensure_config_files(tmp.path()).unwrap();
        assert_eq!(copied, vec![config.join("roles.toml")]);
    }

    #[test]
    fn ensure_config_files_accepts_config_without_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = tmp.path().join("config");
        fs::create_dir_all(&config).unwrap();
        fs::write(config.join("banpick.toml"), DEFAULT_MAIN).unwrap();
        assert!(ensure_config_files(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn ensure_config_files_without_any_dirs_fails() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            ensure_config_files(tmp.path()).unwrap_err(),
            ConfigError::DefaultsCopyError { .. }
        ));
    }
}
