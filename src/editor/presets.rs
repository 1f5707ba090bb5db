//! 预设
//!
//! 封闭的一组命名配置变换。每个预设都以同一个默认基线为基础合并，
//! 预设之间不会叠加，所以应用顺序不影响结果。
//!
//! 应用一个预设的步骤：
//! 1. 基线 ⊕ 覆盖项，整体替换参数存储
//! 2. 设置颜色循环开关
//! 3. 结构调整（粒子数或重生比例变化时重新分配缓冲区），重置球形重生器参数
//! 4. 附带动作：结构性重启、重新扫描重生定时器、显示颜色
//! 5. 通知面板刷新显示

use crate::core::error::TendrilsResult;
use crate::settings::{DisplayColor, SettingKey, Settings, SettingsPatch, FRAME_MS};
use crate::spawn::BallUniforms;
use std::fmt;

/// 预设
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    Default,
    Flow,
    FluidKinda,
    FlowOnly,
    NoiseOnly,
    Sea,
    MadStyles,
    Ghostly,
    Turbulent,
    Roots,
    Hairy,
}

/// 预设的完整描述
#[derive(Debug, Clone, PartialEq)]
pub struct PresetPlan {
    /// 合并到基线上的覆盖项
    pub overrides: SettingsPatch,
    /// 球形重生器参数覆盖；`None` 时恢复默认值
    pub ball: Option<BallUniforms>,
    /// 清除并重新做球形重生
    pub restart: bool,
    /// 按新的 `respawnTick` 重新启动重生定时器
    pub resweep: bool,
    pub display_color: Option<DisplayColor>,
    pub cycling_color: bool,
}

impl Preset {
    /// 面板中的显示顺序
    pub const ALL: [Preset; 11] = [
        Preset::Default,
        Preset::Flow,
        Preset::FluidKinda,
        Preset::FlowOnly,
        Preset::NoiseOnly,
        Preset::Sea,
        Preset::MadStyles,
        Preset::Ghostly,
        Preset::Turbulent,
        Preset::Roots,
        Preset::Hairy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Default => "Default",
            Preset::Flow => "Flow",
            Preset::FluidKinda => "Fluid (kinda)",
            Preset::FlowOnly => "Flow only",
            Preset::NoiseOnly => "Noise only",
            Preset::Sea => "Sea",
            Preset::MadStyles => "Mad styles",
            Preset::Ghostly => "Ghostly",
            Preset::Turbulent => "Turbulent",
            Preset::Roots => "Roots",
            Preset::Hairy => "Hairy",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(name))
    }

    pub fn display_color(&self) -> Option<DisplayColor> {
        let (rgb, opacity) = match self {
            Preset::FluidKinda => ([255.0, 255.0, 255.0], 0.2),
            Preset::FlowOnly => ([100.0, 200.0, 255.0], 0.8),
            Preset::NoiseOnly => ([255.0, 150.0, 0.0], 0.01),
            Preset::Sea => ([55.0, 155.0, 255.0], 0.8),
            Preset::Ghostly => ([255.0, 255.0, 255.0], 0.006),
            Preset::Turbulent => ([255.0, 10.0, 10.0], 0.9),
            Preset::Roots => ([50.0, 255.0, 50.0], 0.03),
            Preset::Hairy => ([255.0, 150.0, 255.0], 0.9),
            Preset::Default | Preset::Flow | Preset::MadStyles => return None,
        };
        Some(DisplayColor::new(rgb, opacity))
    }

    /// 覆盖项（包含预设颜色换算后的存储颜色）
    pub fn overrides(&self) -> SettingsPatch {
        use SettingKey::*;

        let patch = match self {
            Preset::Default | Preset::MadStyles => SettingsPatch::new(),
            Preset::Flow => SettingsPatch::new().with(ShowFlow, true),
            Preset::FluidKinda => SettingsPatch::new()
                .with(AutoClearView, true)
                .with(ShowFlow, false)
                .with(RespawnTick, 500u32),
            Preset::FlowOnly => SettingsPatch::new()
                .with(AutoClearView, false)
                .with(FlowDecay, 0.0005f32)
                .with(ForceWeight, 0.015f32)
                .with(WanderWeight, 0.0f32)
                .with(SpeedAlpha, 0.0f32)
                .with(FadeAlpha, FRAME_MS - 0.000001)
                .with(RespawnAmount, 0.03f32)
                .with(RespawnTick, 0u32),
            Preset::NoiseOnly => SettingsPatch::new()
                .with(AutoClearView, false)
                .with(ShowFlow, false)
                .with(FlowWeight, 0.0f32)
                .with(WanderWeight, 0.002f32)
                .with(NoiseSpeed, 0.0f32)
                .with(SpeedAlpha, 0.0f32),
            Preset::Sea => SettingsPatch::new()
                .with(FlowWidth, 5.0f32)
                .with(ForceWeight, 0.015f32)
                .with(WanderWeight, 0.0014f32)
                .with(FlowDecay, 0.007f32)
                .with(FadeAlpha, FRAME_MS - 0.0001)
                .with(SpeedAlpha, 0.0f32),
            Preset::Ghostly => SettingsPatch::new()
                .with(AutoClearView, false)
                .with(FlowDecay, 0.0f32),
            Preset::Turbulent => SettingsPatch::new()
                .with(AutoClearView, false)
                .with(NoiseSpeed, 0.00001f32)
                .with(NoiseScale, 18.0f32)
                .with(ForceWeight, 0.014f32)
                .with(WanderWeight, 0.0021f32)
                .with(FadeAlpha, FRAME_MS - 0.001)
                .with(SpeedAlpha, 0.000002f32),
            Preset::Roots => SettingsPatch::new()
                .with(AutoClearView, false)
                .with(FlowDecay, 0.0f32)
                .with(NoiseSpeed, 0.0f32)
                .with(NoiseScale, 18.0f32)
                .with(ForceWeight, 0.015f32)
                .with(WanderWeight, 0.0023f32)
                .with(SpeedAlpha, 0.00005f32),
            Preset::Hairy => SettingsPatch::new()
                .with(AutoClearView, false)
                .with(TimeStep, FRAME_MS)
                .with(FlowDecay, 0.001f32)
                .with(WanderWeight, 0.002f32)
                .with(FadeAlpha, FRAME_MS - 0.000001)
                .with(SpeedAlpha, 0.0f32)
                .with(RespawnTick, 800u32),
        };

        match self.display_color() {
            Some(color) => patch.with(Color, color.to_normalized()),
            None => patch,
        }
    }

    pub fn plan(&self) -> PresetPlan {
        PresetPlan {
            overrides: self.overrides(),
            ball: match self {
                Preset::FlowOnly => Some(BallUniforms {
                    radius: 0.25,
                    speed: 0.015,
                }),
                _ => None,
            },
            restart: !matches!(self, Preset::Flow),
            resweep: matches!(self, Preset::FluidKinda | Preset::FlowOnly | Preset::Hairy),
            display_color: self.display_color(),
            cycling_color: matches!(self, Preset::MadStyles),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 预设的执行目标
///
/// 由编排器实现；预设管理器只决定调用顺序。
pub trait PresetHost {
    fn settings(&self) -> &Settings;

    /// 整体替换参数存储，返回之前的参数
    fn replace_settings(&mut self, next: Settings) -> Settings;

    fn set_color_cycling(&mut self, enabled: bool);

    /// 重新分配粒子缓冲区并重新开始模拟
    fn rebuild_particles(&mut self, root_num: u32) -> TendrilsResult<()>;

    /// 重新分配重生缓存
    fn rebuild_respawn(&mut self, root_num: u32, respawn_amount: f32) -> TendrilsResult<()>;

    fn set_ball_uniforms(&mut self, uniforms: BallUniforms);

    /// 清除并做一次球形重生
    fn restart(&mut self);

    /// 重生定时器当前的周期
    fn respawn_interval(&self) -> u32;

    /// 按参数存储中的 `respawnTick` 重新启动重生定时器
    fn resweep(&mut self);

    /// 设置显示颜色并换算到存储颜色
    fn set_display_color(&mut self, color: DisplayColor);

    /// 让面板刷新显示
    fn sync_display(&mut self);
}

/// 预设管理器
#[derive(Debug, Clone)]
pub struct PresetManager {
    baseline: Settings,
    ball_defaults: BallUniforms,
    active: Option<Preset>,
}

impl PresetManager {
    pub fn new(ball_defaults: BallUniforms) -> Self {
        Self {
            baseline: Settings::default(),
            ball_defaults,
            active: None,
        }
    }

    pub fn baseline(&self) -> &Settings {
        &self.baseline
    }

    /// 最近一次应用的预设
    pub fn active(&self) -> Option<Preset> {
        self.active
    }

    /// 应用预设
    ///
    /// 缓冲区重新分配失败时返回错误，此时参数存储已经是新值。
    pub fn apply<H: PresetHost + ?Sized>(&mut self, preset: Preset, host: &mut H) -> TendrilsResult<()> {
        let plan = preset.plan();
        let next = plan.overrides.merged_onto(&self.baseline)?;
        tracing::info!(target: "tendrils::presets", preset = preset.name(), "Applying preset");

        let previous = host.replace_settings(next);
        host.set_color_cycling(plan.cycling_color);

        if next.root_num != previous.root_num {
            host.rebuild_particles(next.root_num)?;
        }
        if next.respawn_amount != previous.respawn_amount {
            host.rebuild_respawn(next.root_num, next.respawn_amount)?;
        }
        host.set_ball_uniforms(plan.ball.unwrap_or(self.ball_defaults));

        if plan.restart {
            host.restart();
        }
        if plan.resweep || next.respawn_tick != host.respawn_interval() {
            host.resweep();
        }
        let color = plan
            .display_color
            .unwrap_or_else(|| DisplayColor::from_normalized(next.color));
        host.set_display_color(color);

        host.sync_display();
        self.active = Some(preset);
        Ok(())
    }
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new(BallUniforms::default())
    }
}
