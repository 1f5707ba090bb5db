//! 面板颜色视图
//!
//! 面板以 0–255 的 RGB 加不透明度显示颜色，参数存储保存归一化 RGBA。
//! 每次变化都用 `to_normalized` 把视图换算回存储。

use serde::{Deserialize, Serialize};

/// 显示颜色：RGB（0–255）+ 不透明度（0–1）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayColor {
    pub rgb: [f32; 3],
    pub opacity: f32,
}

impl DisplayColor {
    pub const fn new(rgb: [f32; 3], opacity: f32) -> Self {
        Self { rgb, opacity }
    }

    /// 换算为存储使用的归一化 RGBA
    pub fn to_normalized(&self) -> [f32; 4] {
        [
            self.rgb[0] / 255.0,
            self.rgb[1] / 255.0,
            self.rgb[2] / 255.0,
            self.opacity,
        ]
    }

    /// 从存储的归一化 RGBA 得到显示颜色
    pub fn from_normalized(color: [f32; 4]) -> Self {
        Self {
            rgb: [color[0] * 255.0, color[1] * 255.0, color[2] * 255.0],
            opacity: color[3],
        }
    }

    /// 颜色循环动画在墙钟时间 `now_ms` 的取值
    ///
    /// 相位完全由墙钟时间决定，开关循环不会保留相位。
    /// 红色分量会短暂为负，交给着色器截断。
    pub fn cycling(now_ms: f64) -> Self {
        Self {
            rgb: [
                ((now_ms * 0.009).sin() * 200.0) as f32,
                (100.0 + (now_ms * 0.006).sin() * 155.0) as f32,
                (200.0 + (now_ms * 0.003).sin() * 55.0) as f32,
            ],
            opacity: 0.2,
        }
    }
}

impl Default for DisplayColor {
    fn default() -> Self {
        Self::from_normalized(super::Settings::default().color)
    }
}
