/// 统一配置系统
///
/// 提供TOML/JSON配置文件和环境变量覆盖。配置只读，不会写回磁盘。
use crate::settings::{Settings, SettingsPatch};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod camera;
pub mod graphics;
pub mod spawn;

pub use camera::CameraConfig;
pub use graphics::{GraphicsConfig, Resolution};
pub use spawn::SpawnConfig;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 主配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TendrilsConfig {
    /// 图形配置
    pub graphics: GraphicsConfig,

    /// 摄像头配置
    pub camera: CameraConfig,

    /// 重生来源配置
    pub spawn: SpawnConfig,

    /// 日志配置
    pub logging: LoggingConfig,

    /// 启动时合并到默认参数上的初始覆盖
    pub settings: SettingsPatch,
}

impl TendrilsConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// 从任意键值来源覆盖配置，键名与环境变量相同
    ///
    /// 无法解析的值被忽略。
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // 图形配置
        if let Some(width) = lookup("TENDRILS_GRAPHICS_WIDTH").and_then(|v| v.parse().ok()) {
            self.graphics.resolution.width = width;
        }
        if let Some(height) = lookup("TENDRILS_GRAPHICS_HEIGHT").and_then(|v| v.parse().ok()) {
            self.graphics.resolution.height = height;
        }
        if let Some(vsync) = lookup("TENDRILS_GRAPHICS_VSYNC").and_then(|v| v.parse().ok()) {
            self.graphics.vsync = vsync;
        }

        // 摄像头配置
        if let Some(enabled) = lookup("TENDRILS_CAMERA_ENABLED").and_then(|v| v.parse().ok()) {
            self.camera.enabled = enabled;
        }
        if let Some(source) = lookup("TENDRILS_CAMERA_SOURCE") {
            self.camera.source = (!source.is_empty()).then(|| PathBuf::from(source));
        }

        // 日志配置
        if let Some(level) = lookup("TENDRILS_LOG_LEVEL").and_then(|v| v.parse().ok()) {
            self.logging.level = level;
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.graphics.validate()?;
        self.camera.validate()?;
        self.spawn.validate()?;
        self.settings
            .merged_onto(&Settings::default())
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(())
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./tendrils.toml
    /// 2. ./tendrils.json
    /// 3. <用户配置目录>/tendrils/config.toml
    /// 4. 使用默认配置
    pub fn load_or_default() -> Self {
        if let Ok(config) = Self::from_toml_file("tendrils.toml") {
            tracing::info!(target: "tendrils", "Loaded config from tendrils.toml");
            return config;
        }

        if let Ok(config) = Self::from_json_file("tendrils.json") {
            tracing::info!(target: "tendrils", "Loaded config from tendrils.json");
            return config;
        }

        if let Some(config_path) = Self::user_config_path() {
            if let Ok(config) = Self::from_toml_file(&config_path) {
                tracing::info!(target: "tendrils", path = ?config_path, "Loaded user config");
                return config;
            }
        }

        tracing::info!(target: "tendrils", "Using default configuration");
        Self::default()
    }

    /// 用户配置文件路径
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tendrils").join("config.toml"))
    }
}

pub(crate) fn validate_scale(name: &str, scale: [f32; 2]) -> ConfigResult<()> {
    if scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
        return Err(ConfigError::ValidationError(format!(
            "{name} must have finite non-zero components, got {scale:?}"
        )));
    }
    Ok(())
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别（`RUST_LOG` 优先）
    pub level: LogLevel,

    /// 是否输出到控制台
    pub log_to_console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            log_to_console: true,
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(ConfigError::ParseError(format!("Unknown log level: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingKey;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = TendrilsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.camera.mirror, [-1.0, 1.0]);
        assert_eq!(config.spawn.flow_scale, [1.0, -1.0]);
        assert!(config.settings.is_empty());
    }

    #[test]
    fn test_toml_config() {
        let config = TendrilsConfig::from_toml_str(
            r#"
            [graphics]
            title = "demo"
            vsync = false

            [camera]
            source = "frame.png"
            resolution = [640, 480]

            [logging]
            level = "debug"

            [settings]
            rootNum = 256
            showFlow = true
            "#,
        )
        .unwrap();

        assert_eq!(config.graphics.title, "demo");
        assert!(!config.graphics.vsync);
        assert_eq!(config.graphics.resolution, Resolution::default());
        assert_eq!(config.camera.source, Some(PathBuf::from("frame.png")));
        assert_eq!(config.camera.constraints().resolution, Some([640, 480]));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.settings.get(SettingKey::RootNum), Some(256u32.into()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_serialization() {
        let mut config = TendrilsConfig::default();
        config.settings.insert(SettingKey::FlowDecay, 0.0005f32);
        let json_str = serde_json::to_string(&config).unwrap();
        let parsed = TendrilsConfig::from_json_str(&json_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = TendrilsConfig::default();
        config.graphics.resolution.width = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let mut config = TendrilsConfig::default();
        config.camera.mirror = [0.0, 1.0];
        assert!(config.validate().is_err());

        let config = TendrilsConfig::from_toml_str("[settings]\nrootNum = 0\n").unwrap();
        assert!(config.validate().is_err());

        assert!(TendrilsConfig::from_toml_str("[settings]\nbogus = 1\n").is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TENDRILS_GRAPHICS_WIDTH", "800"),
            ("TENDRILS_GRAPHICS_VSYNC", "nope"),
            ("TENDRILS_CAMERA_SOURCE", "cam.jpg"),
            ("TENDRILS_LOG_LEVEL", "WARN"),
        ]
        .into_iter()
        .collect();

        let mut config = TendrilsConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.graphics.resolution.width, 800);
        assert!(config.graphics.vsync);
        assert_eq!(config.camera.source, Some(PathBuf::from("cam.jpg")));
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tendrils.toml");
        fs::write(&path, "[spawn]\nflow_scale = [1.0, 1.0]\n").unwrap();

        let config = TendrilsConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.spawn.flow_scale, [1.0, 1.0]);

        assert!(matches!(
            TendrilsConfig::from_toml_file(dir.path().join("missing.toml")),
            Err(ConfigError::FileError(_))
        ));
    }
}
