//! 统一错误处理模块
//!
//! 提供编排层范围内的统一错误类型定义
//!
//! ## 错误类型分层
//!
//! - **子系统错误**：`SettingsError`、`CameraError`、`SimulationError`、`RenderError`
//!   以及配置层的 `ConfigError`
//! - **顶层错误**：`TendrilsError`，可以由任意子系统错误通过 `?` 转换得到
//!
//! 摄像头错误只对摄像头子系统致命（记录后继续运行），
//! 模拟缓冲区重新分配失败则对整个可视化致命。

use crate::config::ConfigError;
use crate::settings::ParamKind;
use thiserror::Error;

/// 编排层顶层错误类型
#[derive(Error, Debug)]
pub enum TendrilsError {
    #[error("Initialization error: {0}")]
    Init(String),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Window creation failed: {0}")]
    Window(String),

    #[error("Event loop error: {0}")]
    EventLoop(String),
}

/// 参数存储错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("Unknown setting: {0}")]
    UnknownKey(String),

    #[error("Type mismatch for {key}: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        key: &'static str,
        expected: ParamKind,
        found: ParamKind,
    },

    #[error("Value out of range for {key}: {reason}")]
    OutOfRange { key: &'static str, reason: String },
}

/// 摄像头子系统错误
///
/// 内容保存为字符串，可克隆后保存在 `CameraFeed` 中。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("No capture device available")]
    NoDevice,

    #[error("Capture request denied: {0}")]
    Denied(String),

    #[error("A capture request is already outstanding")]
    AlreadyRequested,

    #[error("Capture request was dropped before resolving")]
    RequestDropped,

    #[error("Failed to decode frame: {0}")]
    Decode(String),
}

/// 模拟引擎错误（外部协作者上报）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    #[error("Failed to allocate {what}: {reason}")]
    Allocation { what: String, reason: String },

    #[error("Invalid simulation state: {0}")]
    InvalidState(String),
}

/// 渲染系统错误
#[derive(Error, Debug, Clone)]
pub enum RenderError {
    #[error("Failed to create surface: {0}")]
    SurfaceCreation(String),

    #[error("Failed to request adapter: no compatible GPU found")]
    NoAdapter,

    #[error("Failed to request device: {0}")]
    DeviceRequest(String),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Invalid render state: {0}")]
    InvalidState(String),
}

/// 结果类型别名
pub type TendrilsResult<T> = Result<T, TendrilsError>;
pub type SettingsResult<T> = Result<T, SettingsError>;
pub type CameraResult<T> = Result<T, CameraError>;
pub type SimulationResult<T> = Result<T, SimulationError>;
pub type RenderResult<T> = Result<T, RenderError>;
