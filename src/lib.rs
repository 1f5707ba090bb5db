//! # Tendrils
//!
//! GPU 粒子/流场可视化的编排层。
//!
//! 模拟本身（缓冲区和着色器）是外部协作者，通过 [`simulation::Simulation`] 接入；
//! 本 crate 负责参数存储、预设、重生调度、摄像头采集、控制面板以及每帧的渲染顺序。
//!
//! ## Modules
//!
//! - [`settings`]: 参数存储和覆盖
//! - [`simulation`]: 模拟引擎契约和重生请求
//! - [`spawn`]: 球形和像素重生
//! - [`camera`]: 摄像头采集
//! - [`editor`]: 控制面板和预设
//! - [`render`]: 表面和帧循环
//! - [`core`]: 编排器、调度、错误类型
//! - [`config`]: 配置文件
//! - [`platform`]: 窗口和事件循环
//!
//! ### Example
//!
//! ```ignore
//! use tendrils::config::GraphicsConfig;
//! use tendrils::platform::{run, Canvas};
//! use tendrils::settings::SettingsPatch;
//!
//! let canvas = Canvas::new(&GraphicsConfig::default())?;
//! run(canvas, SettingsPatch::new(), true, MyScene::default())?;
//! ```

/// 摄像头采集
pub mod camera;
/// 配置系统
pub mod config;
/// 编排器、调度和错误类型
pub mod core;
/// 控制面板和预设
pub mod editor;
/// 窗口和事件循环
pub mod platform;
/// 绘制表面和帧循环
pub mod render;
/// 参数存储
pub mod settings;
/// 模拟引擎契约
pub mod simulation;
/// 重生
pub mod spawn;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::core::{AppOptions, AppParts, TendrilsApp, TendrilsError, TendrilsResult};
pub use crate::settings::{Settings, SettingsPatch};
