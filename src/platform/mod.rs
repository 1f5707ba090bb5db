//! 平台层
//!
//! 窗口、事件循环和键盘快捷键，基于 winit。

pub mod winit;

pub use self::winit::{
    run, run_with_config, shortcut, shortcut_for_char, Canvas, ResizeThrottle, Scene,
    SceneBuilder, Shortcut, RESIZE_THROTTLE,
};
