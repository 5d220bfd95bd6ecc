//! Layered application configuration.
//!
//! Sources are merged in order: built-in defaults, the YAML file (if any),
//! then `APP__`-prefixed environment variables (`APP__SERVER__PORT=9000`).
//! Library crates read their own settings from the `modules` bag through
//! [`AppConfig::module_config`].

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::home_dir::resolve_home_dir;

const ENV_PREFIX: &str = "APP__";
const HOME_SUBDIR: &str = ".apikit";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// `None` means "use [`default_logging_config`]".
    pub logging: Option<LoggingConfig>,
    /// Raw settings keyed by consumer name.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Absolute after loading; empty resolves to `$HOME/.apikit`.
    pub home_dir: String,
    pub host: String,
    pub port: u16,
    /// Per-request timeout; 0 disables it.
    #[serde(default)]
    pub timeout_sec: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            home_dir: String::new(),
            host: "127.0.0.1".to_owned(),
            port: 8087,
            timeout_sec: 0,
        }
    }
}

/// Subsystem name → log section. `default` catches every other target.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// `trace`..`error`, or `off`.
    pub console_level: String,
    /// Relative to `server.home_dir`; empty disables the file sink.
    pub file: String,
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

pub fn default_logging_config() -> LoggingConfig {
    HashMap::from([(
        "default".to_owned(),
        Section {
            console_level: "info".to_owned(),
            file: "logs/apikit.log".to_owned(),
            file_level: "debug".to_owned(),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    )])
}

/// Settings given on the command line; they win over every file and env source.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    /// 1 raises the default console level to debug, 2+ to trace.
    pub verbose: u8,
}

impl AppConfig {
    /// Merge all sources and resolve `server.home_dir` (creating it).
    ///
    /// Without a file, the logging section falls back to the built-in default.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: AppConfig = figment
            .extract()
            .context("Failed to extract config from figment")?;
        if config_path.is_none() && config.logging.is_none() {
            config.logging = Some(default_logging_config());
        }

        let configured = Some(config.server.home_dir.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        let home = resolve_home_dir(configured, HOME_SUBDIR, true)
            .context("Failed to resolve server.home_dir")?;
        config.server.home_dir = home.to_string_lossy().into_owned();

        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Typed view of `modules.<name>`; a missing entry yields `T::default()`.
    pub fn module_config<T>(&self, name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        self.modules.get(name).map_or_else(
            || Ok(T::default()),
            |raw| {
                T::deserialize(raw)
                    .with_context(|| format!("Invalid configuration for module '{name}'"))
            },
        )
    }

    pub fn apply_cli_overrides(&mut self, cli: CliOverrides) {
        if let Some(port) = cli.port {
            self.server.port = port;
        }

        let level = match cli.verbose {
            0 => return,
            1 => "debug",
            _ => "trace",
        };
        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(section) = logging.get_mut("default") {
            section.console_level = level.to_owned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{tempdir, TempDir};

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct LimitsConfig {
        max_body_bytes: usize,
        strict: bool,
    }

    fn write_yaml(dir: &TempDir, body: &str) -> PathBuf {
        let home = dir.path().join("home").to_string_lossy().replace('\\', "/");
        let path = dir.path().join("cfg.yaml");
        fs::write(&path, format!("server:\n  home_dir: \"{home}\"\n{body}")).unwrap();
        path
    }

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8087);
        assert_eq!(config.server.timeout_sec, 0);
        assert!(config.logging.is_none());
        assert!(config.modules.is_empty());

        let logging = default_logging_config();
        assert_eq!(logging["default"].file, "logs/apikit.log");
    }

    #[test]
    fn file_overrides_defaults_and_resolves_home() {
        let tmp = tempdir().unwrap();
        let path = write_yaml(
            &tmp,
            r#"  host: "0.0.0.0"
  port: 9090
  timeout_sec: 30
logging:
  default:
    console_level: debug
    file: "logs/default.log"
modules:
  apikit:
    max_body_bytes: 1024
    strict: true
"#,
        );

        let config = AppConfig::load(Some(&path)).unwrap();

        assert!(Path::new(&config.server.home_dir).is_absolute());
        assert!(tmp.path().join("home").is_dir());
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.timeout_sec, 30);
        assert_eq!(config.logging.as_ref().unwrap()["default"].console_level, "debug");

        let limits: LimitsConfig = config.module_config("apikit").unwrap();
        assert_eq!(
            limits,
            LimitsConfig {
                max_body_bytes: 1024,
                strict: true
            }
        );
    }

    #[test]
    fn partial_server_section_keeps_defaults() {
        let tmp = tempdir().unwrap();
        let path = write_yaml(&tmp, "  port: 8080\n");

        let config = AppConfig::load(Some(&path)).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert!(config.logging.is_none());
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        let tmp = tempdir().unwrap();
        let path = write_yaml(&tmp, "database:\n  url: sqlite://x\n");
        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn module_config_missing_and_invalid() {
        let mut config = AppConfig::default();

        let missing: LimitsConfig = config.module_config("apikit").unwrap();
        assert_eq!(missing, LimitsConfig::default());

        config.modules.insert(
            "apikit".into(),
            serde_json::json!({"max_body_bytes": "lots"}),
        );
        let err = config.module_config::<LimitsConfig>("apikit").unwrap_err();
        assert!(err.to_string().contains("apikit"));
    }

    #[test]
    fn verbose_levels() {
        for (verbose, expected) in [(0, "info"), (1, "debug"), (2, "trace"), (3, "trace")] {
            let mut config = AppConfig {
                logging: Some(default_logging_config()),
                ..Default::default()
            };
            config.apply_cli_overrides(CliOverrides {
                port: Some(3000),
                verbose,
            });
            assert_eq!(config.server.port, 3000);
            let section = &config.logging.as_ref().unwrap()["default"];
            assert_eq!(section.console_level, expected, "verbose={verbose}");
        }
    }

    #[test]
    fn verbose_without_logging_section_installs_default() {
        let mut config = AppConfig::default();
        config.apply_cli_overrides(CliOverrides {
            port: None,
            verbose: 1,
        });
        assert_eq!(config.logging.unwrap()["default"].console_level, "debug");
    }

    #[test]
    fn yaml_dump_reloads() {
        let config = AppConfig {
            logging: Some(default_logging_config()),
            ..Default::default()
        };
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("server:"));
        assert!(yaml.contains("logging:"));

        let back: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.server.port, config.server.port);
    }
}
