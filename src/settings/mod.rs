//! 参数存储
//!
//! 模拟的实时配置：一个键固定、类型固定的扁平参数表。
//!
//! - `Settings`：强类型的参数结构，所有字段都有默认值（即预设的基线）
//! - `SettingKey`：固定的键集合，带有名称和类型的模式信息
//! - `ParamValue`：反射给控制面板的值
//! - `SettingsPatch`：部分参数表，用于预设覆盖和启动时的初始覆盖
//! - `DisplayColor`：面板使用的 0–255 RGB + 不透明度颜色视图
//!
//! 写入只替换值，不改变类型；类型不匹配的写入会被拒绝。

pub mod color;
pub mod patch;

pub use color::DisplayColor;
pub use patch::SettingsPatch;

use crate::core::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 每帧的时间步长（毫秒），多个预设以它为参照
pub const FRAME_MS: f32 = 1000.0 / 60.0;

/// 参数值的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    /// 布尔开关
    Toggle,
    /// 非负整数
    Count,
    /// 浮点数
    Number,
    /// 0–255 的 RGB 三元组（仅用于面板颜色视图）
    Rgb,
    /// 归一化 RGBA
    Color,
    /// 两点路径
    Path,
}

impl ParamKind {
    /// 是否为标量（可被通用反射的叶子值）
    pub fn is_scalar(self) -> bool {
        matches!(self, Self::Toggle | Self::Count | Self::Number)
    }
}

/// 参数值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Toggle(bool),
    Count(u32),
    Number(f32),
    Rgb([f32; 3]),
    Color([f32; 4]),
    Path([[f32; 2]; 2]),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            Self::Toggle(_) => ParamKind::Toggle,
            Self::Count(_) => ParamKind::Count,
            Self::Number(_) => ParamKind::Number,
            Self::Rgb(_) => ParamKind::Rgb,
            Self::Color(_) => ParamKind::Color,
            Self::Path(_) => ParamKind::Path,
        }
    }

    pub fn as_toggle(&self) -> Option<bool> {
        match *self {
            Self::Toggle(v) => Some(v),
            _ => None,
        }
    }

    /// 整数值；整数值的浮点数也被接受
    pub fn as_count(&self) -> Option<u32> {
        match *self {
            Self::Count(v) => Some(v),
            Self::Number(v)
                if v >= 0.0 && v.fract() == 0.0 && f64::from(v) <= f64::from(u32::MAX) =>
            {
                Some(v as u32)
            }
            _ => None,
        }
    }

    /// 浮点值；整数被拓宽
    pub fn as_number(&self) -> Option<f32> {
        match *self {
            Self::Number(v) => Some(v),
            Self::Count(v) => Some(v as f32),
            _ => None,
        }
    }

    pub fn as_rgb(&self) -> Option<[f32; 3]> {
        match *self {
            Self::Rgb(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<[f32; 4]> {
        match *self {
            Self::Color(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<[[f32; 2]; 2]> {
        match *self {
            Self::Path(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Toggle(v)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        Self::Count(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        Self::Number(v)
    }
}

impl From<[f32; 3]> for ParamValue {
    fn from(v: [f32; 3]) -> Self {
        Self::Rgb(v)
    }
}

impl From<[f32; 4]> for ParamValue {
    fn from(v: [f32; 4]) -> Self {
        Self::Color(v)
    }
}

impl From<[[f32; 2]; 2]> for ParamValue {
    fn from(v: [[f32; 2]; 2]) -> Self {
        Self::Path(v)
    }
}

/// 参数键（固定集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingKey {
    RootNum,
    TimeStep,
    AutoClearView,
    ShowFlow,
    Damping,
    MinSpeed,
    MaxSpeed,
    ForceWeight,
    FlowWeight,
    WanderWeight,
    FlowDecay,
    FlowWidth,
    NoiseSpeed,
    NoiseScale,
    SpeedAlpha,
    FadeAlpha,
    LineWidth,
    RespawnAmount,
    RespawnTick,
    Color,
    LinePath,
}

/// 字段模式：名称、类型以及是否参与通用反射
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: ParamKind,
    pub reflected: bool,
}

impl SettingKey {
    /// 所有键，按面板中的显示顺序
    pub const ALL: [SettingKey; 21] = [
        SettingKey::RootNum,
        SettingKey::TimeStep,
        SettingKey::AutoClearView,
        SettingKey::ShowFlow,
        SettingKey::Damping,
        SettingKey::MinSpeed,
        SettingKey::MaxSpeed,
        SettingKey::ForceWeight,
        SettingKey::FlowWeight,
        SettingKey::WanderWeight,
        SettingKey::FlowDecay,
        SettingKey::FlowWidth,
        SettingKey::NoiseSpeed,
        SettingKey::NoiseScale,
        SettingKey::SpeedAlpha,
        SettingKey::FadeAlpha,
        SettingKey::LineWidth,
        SettingKey::RespawnAmount,
        SettingKey::RespawnTick,
        SettingKey::Color,
        SettingKey::LinePath,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::RootNum => "rootNum",
            Self::TimeStep => "timeStep",
            Self::AutoClearView => "autoClearView",
            Self::ShowFlow => "showFlow",
            Self::Damping => "damping",
            Self::MinSpeed => "minSpeed",
            Self::MaxSpeed => "maxSpeed",
            Self::ForceWeight => "forceWeight",
            Self::FlowWeight => "flowWeight",
            Self::WanderWeight => "wanderWeight",
            Self::FlowDecay => "flowDecay",
            Self::FlowWidth => "flowWidth",
            Self::NoiseSpeed => "noiseSpeed",
            Self::NoiseScale => "noiseScale",
            Self::SpeedAlpha => "speedAlpha",
            Self::FadeAlpha => "fadeAlpha",
            Self::LineWidth => "lineWidth",
            Self::RespawnAmount => "respawnAmount",
            Self::RespawnTick => "respawnTick",
            Self::Color => "color",
            Self::LinePath => "linePath",
        }
    }

    pub fn kind(self) -> ParamKind {
        match self {
            Self::RootNum | Self::RespawnTick => ParamKind::Count,
            Self::AutoClearView | Self::ShowFlow => ParamKind::Toggle,
            Self::Color => ParamKind::Color,
            Self::LinePath => ParamKind::Path,
            _ => ParamKind::Number,
        }
    }

    /// 组合值（颜色、路径）不参与通用反射，需要专门的适配视图
    pub fn schema(self) -> FieldSchema {
        let kind = self.kind();
        FieldSchema {
            name: self.name(),
            kind,
            reflected: kind.is_scalar(),
        }
    }

    /// 参与通用反射的键
    pub fn reflected() -> impl Iterator<Item = SettingKey> {
        Self::ALL.into_iter().filter(|key| key.schema().reflected)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SettingKey {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| SettingsError::UnknownKey(s.to_string()))
    }
}

/// 模拟的实时参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// 根粒子数，决定粒子/流场缓冲区大小
    pub root_num: u32,
    /// 模拟时间步长（毫秒）
    pub time_step: f32,
    /// 每帧自动清除视图
    pub auto_clear_view: bool,
    /// 显示流场
    pub show_flow: bool,
    pub damping: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub force_weight: f32,
    pub flow_weight: f32,
    pub wander_weight: f32,
    pub flow_decay: f32,
    pub flow_width: f32,
    pub noise_speed: f32,
    pub noise_scale: f32,
    pub speed_alpha: f32,
    /// 淡出系数，0 表示不淡出
    pub fade_alpha: f32,
    pub line_width: f32,
    /// 每次重生的粒子比例，决定重生缓存的大小
    pub respawn_amount: f32,
    /// 摄像头重生周期（毫秒），0 表示停用
    pub respawn_tick: u32,
    /// 归一化 RGBA
    pub color: [f32; 4],
    /// 叠加线条的路径
    pub line_path: [[f32; 2]; 2],
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_num: 512,
            time_step: FRAME_MS,
            auto_clear_view: false,
            show_flow: false,
            damping: 0.043,
            min_speed: 0.000001,
            max_speed: 0.01,
            force_weight: 0.016,
            flow_weight: 1.0,
            wander_weight: 0.001,
            flow_decay: 0.003,
            flow_width: 3.0,
            noise_speed: 0.00025,
            noise_scale: 2.125,
            speed_alpha: 0.000001,
            fade_alpha: 0.0,
            line_width: 1.0,
            respawn_amount: 0.007,
            respawn_tick: 0,
            color: [1.0, 1.0, 1.0, 0.1],
            line_path: [[-1.0, 0.5], [1.0, -0.5]],
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按键读取
    pub fn get(&self, key: SettingKey) -> ParamValue {
        match key {
            SettingKey::RootNum => self.root_num.into(),
            SettingKey::TimeStep => self.time_step.into(),
            SettingKey::AutoClearView => self.auto_clear_view.into(),
            SettingKey::ShowFlow => self.show_flow.into(),
            SettingKey::Damping => self.damping.into(),
            SettingKey::MinSpeed => self.min_speed.into(),
            SettingKey::MaxSpeed => self.max_speed.into(),
            SettingKey::ForceWeight => self.force_weight.into(),
            SettingKey::FlowWeight => self.flow_weight.into(),
            SettingKey::WanderWeight => self.wander_weight.into(),
            SettingKey::FlowDecay => self.flow_decay.into(),
            SettingKey::FlowWidth => self.flow_width.into(),
            SettingKey::NoiseSpeed => self.noise_speed.into(),
            SettingKey::NoiseScale => self.noise_scale.into(),
            SettingKey::SpeedAlpha => self.speed_alpha.into(),
            SettingKey::FadeAlpha => self.fade_alpha.into(),
            SettingKey::LineWidth => self.line_width.into(),
            SettingKey::RespawnAmount => self.respawn_amount.into(),
            SettingKey::RespawnTick => self.respawn_tick.into(),
            SettingKey::Color => self.color.into(),
            SettingKey::LinePath => self.line_path.into(),
        }
    }

    /// 按键写入
    ///
    /// 写入只替换值：类型不匹配时返回 `SettingsError::TypeMismatch`，
    /// 存储保持不变。
    pub fn set(&mut self, key: SettingKey, value: ParamValue) -> SettingsResult<()> {
        let mismatch = || SettingsError::TypeMismatch {
            key: key.name(),
            expected: key.kind(),
            found: value.kind(),
        };

        match key {
            SettingKey::RootNum => {
                let n = value.as_count().ok_or_else(mismatch)?;
                if n == 0 {
                    return Err(SettingsError::OutOfRange {
                        key: key.name(),
                        reason: "at least one root particle is required".to_string(),
                    });
                }
                self.root_num = n;
            }
            SettingKey::RespawnTick => self.respawn_tick = value.as_count().ok_or_else(mismatch)?,
            SettingKey::AutoClearView => {
                self.auto_clear_view = value.as_toggle().ok_or_else(mismatch)?
            }
            SettingKey::ShowFlow => self.show_flow = value.as_toggle().ok_or_else(mismatch)?,
            SettingKey::Color => self.color = value.as_color().ok_or_else(mismatch)?,
            SettingKey::LinePath => self.line_path = value.as_path().ok_or_else(mismatch)?,
            SettingKey::RespawnAmount => {
                let amount = value.as_number().ok_or_else(mismatch)?;
                if !(0.0..=1.0).contains(&amount) {
                    return Err(SettingsError::OutOfRange {
                        key: key.name(),
                        reason: format!("{amount} is not a fraction in 0..=1"),
                    });
                }
                self.respawn_amount = amount;
            }
            _ => {
                let v = value.as_number().ok_or_else(mismatch)?;
                *self.number_mut(key) = v;
            }
        }

        Ok(())
    }

    fn number_mut(&mut self, key: SettingKey) -> &mut f32 {
        match key {
            SettingKey::TimeStep => &mut self.time_step,
            SettingKey::Damping => &mut self.damping,
            SettingKey::MinSpeed => &mut self.min_speed,
            SettingKey::MaxSpeed => &mut self.max_speed,
            SettingKey::ForceWeight => &mut self.force_weight,
            SettingKey::FlowWeight => &mut self.flow_weight,
            SettingKey::WanderWeight => &mut self.wander_weight,
            SettingKey::FlowDecay => &mut self.flow_decay,
            SettingKey::FlowWidth => &mut self.flow_width,
            SettingKey::NoiseSpeed => &mut self.noise_speed,
            SettingKey::NoiseScale => &mut self.noise_scale,
            SettingKey::SpeedAlpha => &mut self.speed_alpha,
            SettingKey::FadeAlpha => &mut self.fade_alpha,
            SettingKey::LineWidth => &mut self.line_width,
            SettingKey::RespawnAmount => &mut self.respawn_amount,
            other => unreachable!("{other} is not a number field"),
        }
    }

    /// 通用反射视图：所有标量字段的（键, 当前值）
    pub fn reflected_values(&self) -> Vec<(SettingKey, ParamValue)> {
        SettingKey::reflected().map(|key| (key, self.get(key))).collect()
    }
}
