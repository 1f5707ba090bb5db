//! 核心模块
//!
//! 包含编排层的核心功能：
//! - `app` - 编排器和日志初始化
//! - `error` - 错误类型定义
//! - `scheduler` - 后台运行时和重生定时器
//! - `utils` - 时间工具

pub mod app;
pub mod error;
pub mod scheduler;
pub mod utils;

// 重新导出错误类型
pub use error::{
    CameraError, CameraResult, RenderError, RenderResult, SettingsError, SettingsResult,
    SimulationError, SimulationResult, TendrilsError, TendrilsResult,
};

// 重新导出主要类型
pub use app::{initialize_logging, AppOptions, AppParts, TendrilsApp};
pub use scheduler::{RespawnScheduler, RespawnTick, TaskRuntime};
pub use utils::current_timestamp_ms_f64;
