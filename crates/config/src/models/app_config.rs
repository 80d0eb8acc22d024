use std::path::Path;

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use fleet_core::LoggingConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{dispatcher::DispatcherConfig, fleet::FleetConfig};

/// 未指定配置文件时依次查找的路径
const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "config/fleet.toml",
    "fleet.toml",
    "/etc/fleet-dispatch/config.toml",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dispatcher: DispatcherConfig,
    pub logging: LoggingConfig,
    pub fleet: FleetConfig,
}

impl AppConfig {
    /// 加载配置：默认值 -> TOML文件 -> `FLEET_` 前缀的环境变量
    ///
    /// 环境变量使用 `__` 分隔层级，例如 `FLEET_DISPATCHER__MAX_CONCURRENCY=8`。
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else if let Some(path) = DEFAULT_CONFIG_PATHS
            .iter()
            .find(|path| Path::new(path).exists())
        {
            debug!("使用默认配置文件: {path}");
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("FLEET")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }

    pub fn validate(&self) -> Result<()> {
        self.dispatcher.validate().context("dispatcher配置无效")?;
        self.fleet.validate().context("fleet配置无效")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fleet::TruckKind;
    use fleet_core::{FailurePolicy, LogFormat, LogLevel};
    use std::io::Write;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.dispatcher.max_concurrency, 2);
        assert_eq!(config.fleet.trucks.len(), 4);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_config_from_toml() {
        let toml_str = r#"
[dispatcher]
max_concurrency = 3
failure_policy = "fail-fast"
processing_delay_ms = 0
task_timeout_ms = 500

[logging]
level = "debug"
format = "json"

[[fleet.trucks]]
id = "NT9"
kind = "normal"
cargo = 5

[[fleet.trucks]]
id = "ET9"
kind = "electric"
battery = 80.0
"#;

        let config = AppConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.dispatcher.max_concurrency, 3);
        assert_eq!(config.dispatcher.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.dispatcher.task_timeout_ms, Some(500));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.fleet.trucks.len(), 2);
        assert_eq!(config.fleet.trucks[0].cargo, 5);
        assert_eq!(config.fleet.trucks[1].kind, TruckKind::Electric);
        assert_eq!(config.fleet.trucks[1].cargo, 0);
    }

    #[test]
    fn test_app_config_from_invalid_toml() {
        let toml_str = r#"
[dispatcher]
max_concurrency = 0
"#;
        let err = AppConfig::from_toml(toml_str).unwrap_err();
        assert_eq!(err.to_string(), "dispatcher配置无效");
        assert_eq!(err.root_cause().to_string(), "最大并发数必须大于0");
    }

    #[test]
    fn test_toml_round_trip_keeps_fleet() {
        let config = AppConfig::default();
        let serialized = config.to_toml().unwrap();
        let parsed = AppConfig::from_toml(&serialized).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load(Some("/definitely/not/here/fleet.toml")).unwrap_err();
        assert!(err.to_string().contains("配置文件不存在"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[dispatcher]
max_concurrency = 6
processing_delay_ms = 10

[[fleet.trucks]]
id = "NT1"
kind = "normal"
"#
        )
        .unwrap();

        let config = AppConfig::load(path.to_str()).unwrap();
        assert_eq!(config.dispatcher.max_concurrency, 6);
        assert_eq!(config.dispatcher.processing_delay_ms, 10);
        assert_eq!(config.fleet.trucks.len(), 1);
        // 未出现在文件中的段使用默认值
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_environment_overrides() {
        std::env::set_var("FLEET_DISPATCHER__DEADLINE_MS", "1500");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.toml");
        std::fs::write(&path, "[dispatcher]\nmax_concurrency = 4\n").unwrap();

        let config = AppConfig::load(path.to_str()).unwrap();
        std::env::remove_var("FLEET_DISPATCHER__DEADLINE_MS");

        assert_eq!(config.dispatcher.deadline_ms, Some(1500));
        assert_eq!(config.dispatcher.max_concurrency, 4);
    }
}
