//! 编排器
//!
//! `TendrilsApp` 持有参数存储、模拟、重生来源、摄像头、重生定时器、预设和面板，
//! 负责它们之间的连接。所有状态只在主线程上访问，后台任务通过通道交回结果。
//!
//! ```text
//! CameraFeed ──► camera PixelSpawner ─┐
//! flow buffer ─► flow PixelSpawner ───┼─► Simulation::respawn
//! BallSpawner ────────────────────────┘
//! Settings ⇄ RenderLoop / ControlPanel / PresetManager
//! ```

use crate::camera::{CameraDevice, CameraEvent, CameraFeed, CaptureConstraints};
use crate::config::{LoggingConfig, TendrilsConfig};
use crate::core::error::TendrilsResult;
use crate::core::scheduler::RespawnScheduler;
use crate::core::utils::current_timestamp_ms_f64;
use crate::editor::panel::{
    ControlAction, ControlPanel, PanelEvent, PanelField, PanelSection, ReflectingPanel,
};
use crate::editor::presets::{Preset, PresetHost, PresetManager};
use crate::render::{DrawSurface, LineOverlay, RenderLoop};
use crate::settings::{DisplayColor, ParamValue, SettingKey, Settings, SettingsPatch};
use crate::simulation::Simulation;
use crate::spawn::{
    BallParam, BallSpawner, BallUniforms, PixelBinding, PixelSpawner, CAMERA_MIRROR,
    FLOW_REFLECTION,
};
use glam::{UVec2, Vec2};
use std::sync::Arc;
use tokio::runtime::Handle;

/// 初始化日志系统
///
/// `RUST_LOG` 优先于配置的日志级别；重复初始化被忽略。
pub fn initialize_logging(config: &LoggingConfig) {
    if !config.log_to_console {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.level.as_str()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    tracing::info!(target: "tendrils", "Tendrils starting");
}

/// 外部协作者
pub struct AppParts<S, O> {
    pub simulation: S,
    pub overlay: O,
    pub camera: Arc<dyn CameraDevice>,
}

/// 编排器选项
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// 合并到默认参数上的初始覆盖
    pub overrides: SettingsPatch,
    /// 调试模式：构建控制面板
    pub debug: bool,
    pub constraints: CaptureConstraints,
    pub camera_mirror: Vec2,
    pub flow_scale: Vec2,
    pub ball: BallUniforms,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            overrides: SettingsPatch::new(),
            debug: false,
            constraints: CaptureConstraints::default(),
            camera_mirror: CAMERA_MIRROR,
            flow_scale: FLOW_REFLECTION,
            ball: BallUniforms::default(),
        }
    }
}

impl AppOptions {
    /// 从配置构建；`overrides` 会合并在配置文件中的覆盖之后
    pub fn from_config(config: &TendrilsConfig, overrides: &SettingsPatch, debug: bool) -> Self {
        let merged = config
            .settings
            .iter()
            .chain(overrides.iter())
            .collect::<SettingsPatch>();
        Self {
            overrides: merged,
            debug,
            constraints: config.camera.constraints(),
            camera_mirror: Vec2::from_array(config.camera.mirror),
            flow_scale: Vec2::from_array(config.spawn.flow_scale),
            ball: config.spawn.ball,
        }
    }
}

/// 编排器
pub struct TendrilsApp<S, O, P = ControlPanel> {
    settings: Settings,
    simulation: S,
    overlay: O,
    camera: CameraFeed,
    camera_spawner: PixelSpawner,
    flow_spawner: PixelSpawner,
    ball_spawner: BallSpawner,
    scheduler: RespawnScheduler,
    presets: PresetManager,
    panel: Option<P>,
    display_color: DisplayColor,
    cycling_color: bool,
    camera_mirror: Vec2,
    render_loop: RenderLoop,
}

impl<S, O, P> TendrilsApp<S, O, P>
where
    S: Simulation,
    P: ReflectingPanel + Default,
{
    /// 创建编排器
    ///
    /// 摄像头请求失败只会被记录；模拟缓冲区分配失败会返回错误。
    pub fn new(parts: AppParts<S, O>, options: AppOptions, runtime: Handle) -> TendrilsResult<Self> {
        let mut settings = Settings::default();
        options.overrides.apply_to(&mut settings)?;

        let mut simulation = parts.simulation;
        simulation.setup(settings.root_num)?;
        if settings.respawn_amount != Settings::default().respawn_amount {
            simulation.setup_respawn(settings.root_num, settings.respawn_amount)?;
            simulation.setup_spawn_cache()?;
        }
        simulation.reset_particles();

        let ball_spawner = BallSpawner::new(options.ball);
        ball_spawner.respawn(&mut simulation);

        let mut camera = CameraFeed::new(options.constraints);
        if let Err(e) = camera.acquire(parts.camera.as_ref(), &runtime) {
            tracing::error!(target: "tendrils::camera", error = %e, "Camera request failed");
        }

        let mut scheduler = RespawnScheduler::new(runtime);
        scheduler.set(settings.respawn_tick);

        let mut app = Self {
            settings,
            simulation,
            overlay: parts.overlay,
            camera,
            camera_spawner: PixelSpawner::new(),
            flow_spawner: PixelSpawner::flow_feedback(options.flow_scale),
            ball_spawner,
            scheduler,
            presets: PresetManager::new(options.ball),
            panel: None,
            display_color: DisplayColor::default(),
            cycling_color: false,
            camera_mirror: options.camera_mirror,
            render_loop: RenderLoop::new(),
        };

        app.set_display_color(DisplayColor::from_normalized(app.settings.color));

        if options.debug {
            app.build_panel();
        }

        tracing::info!(
            target: "tendrils",
            root_num = app.settings.root_num,
            debug = options.debug,
            "Tendrils initialized"
        );
        Ok(app)
    }

    fn build_panel(&mut self) {
        let mut panel = P::default();

        panel.add_section(PanelSection::Settings);
        for (key, value) in self.settings.reflected_values() {
            panel.add_control(PanelSection::Settings, PanelField::Setting(key), value);
        }
        panel.add_control(
            PanelSection::Settings,
            PanelField::Color,
            self.display_color.rgb.into(),
        );
        panel.add_control(
            PanelSection::Settings,
            PanelField::Opacity,
            self.display_color.opacity.into(),
        );

        panel.add_section(PanelSection::Respawn);
        for param in BallParam::ALL {
            panel.add_control(
                PanelSection::Respawn,
                PanelField::Ball(param),
                self.ball_spawner.uniforms.get(param).into(),
            );
        }

        panel.add_section(PanelSection::Controls);
        panel.add_control(
            PanelSection::Controls,
            PanelField::CyclingColor,
            self.cycling_color.into(),
        );
        for action in ControlAction::ALL {
            panel.add_action(PanelSection::Controls, PanelField::Action(action));
        }

        panel.add_section(PanelSection::Presets);
        for preset in Preset::ALL {
            panel.add_action(PanelSection::Presets, PanelField::Preset(preset));
        }

        panel.set_open(false);
        self.panel = Some(panel);
    }

    /// 以墙钟时间绘制一帧
    pub fn frame<D>(&mut self, surface: &mut D) -> TendrilsResult<()>
    where
        D: DrawSurface + ?Sized,
        O: LineOverlay<D>,
    {
        self.frame_at(current_timestamp_ms_f64(), surface)
    }

    /// 绘制一帧
    ///
    /// 处理面板事件，推进摄像头，执行到期的摄像头重生，颜色循环，然后渲染。
    pub fn frame_at<D>(&mut self, now_ms: f64, surface: &mut D) -> TendrilsResult<()>
    where
        D: DrawSurface + ?Sized,
        O: LineOverlay<D>,
    {
        self.process_panel_events()?;
        self.poll_camera();

        for _ in 0..self.scheduler.drain_due() {
            self.respawn_cam_pixels();
        }

        if self.cycling_color {
            self.set_display_color(DisplayColor::cycling(now_ms));
            self.sync_color_display();
        }

        self.render_loop
            .frame(&mut self.simulation, &self.settings, surface, &mut self.overlay)?;
        Ok(())
    }

    fn poll_camera(&mut self) {
        match self.camera.poll() {
            Some(CameraEvent::Ready { width, height }) => {
                self.camera_spawner.set_shape(UVec2::new(width, height));
                self.camera_spawner.set_spawn_scale(self.camera_mirror);
                self.respawn_cam_pixels();
            }
            // 已在摄像头子系统中记录
            Some(CameraEvent::Failed(_)) | None => {}
        }
    }

    /// 摄像头像素重生；摄像头未就绪时什么都不做
    pub fn respawn_cam_pixels(&mut self) -> bool {
        let Some(frame) = self.camera.frame() else {
            return false;
        };
        let scale = self.camera_spawner.spawn_scale();
        self.camera_spawner
            .configure(PixelBinding::Frame(Arc::clone(frame)), scale);
        self.camera_spawner.respawn(&mut self.simulation)
    }

    pub fn respawn_flow_pixels(&mut self) -> bool {
        self.flow_spawner.respawn(&mut self.simulation)
    }

    /// 执行控制动作
    pub fn run_action(&mut self, action: ControlAction) {
        tracing::debug!(target: "tendrils", action = action.name(), "Control action");
        match action {
            ControlAction::Clear => self.simulation.clear(),
            ControlAction::ClearView => self.simulation.clear_view(),
            ControlAction::ClearFlow => self.simulation.clear_flow(),
            ControlAction::Respawn => self.ball_spawner.respawn(&mut self.simulation),
            ControlAction::RespawnCamPixels => {
                self.respawn_cam_pixels();
            }
            ControlAction::RespawnFlowPixels => {
                self.respawn_flow_pixels();
            }
            ControlAction::Reset => self.simulation.reset(),
            ControlAction::Restart => {
                self.simulation.clear();
                self.ball_spawner.respawn(&mut self.simulation);
            }
        }
    }

    /// 应用预设
    pub fn apply_preset(&mut self, preset: Preset) -> TendrilsResult<()> {
        let mut presets = std::mem::take(&mut self.presets);
        let result = presets.apply(preset, self);
        self.presets = presets;
        result
    }

    fn process_panel_events(&mut self) -> TendrilsResult<()> {
        let events = match self.panel.as_mut() {
            Some(panel) => panel.take_events(),
            None => return Ok(()),
        };
        for event in events {
            self.handle_panel_event(event)?;
        }
        Ok(())
    }

    /// 处理一个面板事件
    ///
    /// 值变化立即写入；只有编辑完成才触发结构性动作。
    pub fn handle_panel_event(&mut self, event: PanelEvent) -> TendrilsResult<()> {
        match event {
            PanelEvent::Changed(field, value) => {
                if !self.apply_edit(field, value) {
                    self.resync_field(field);
                }
            }
            PanelEvent::Finished(field, value) => {
                if self.apply_edit(field, value) {
                    self.finish_edit(field)?;
                } else {
                    // 被拒绝的值不触发重新分配
                    self.resync_field(field);
                }
            }
            PanelEvent::Pressed(PanelField::Action(action)) => self.run_action(action),
            PanelEvent::Pressed(PanelField::Preset(preset)) => self.apply_preset(preset)?,
            PanelEvent::Pressed(field) => {
                tracing::debug!(target: "tendrils", %field, "Ignoring press on a non-action field");
            }
        }
        Ok(())
    }

    /// 写入一次编辑，返回值是否被接受
    fn apply_edit(&mut self, field: PanelField, value: ParamValue) -> bool {
        match field {
            PanelField::Setting(key) => {
                if let Err(e) = self.settings.set(key, value) {
                    tracing::warn!(target: "tendrils", error = %e, "Rejected setting edit");
                    return false;
                }
            }
            PanelField::Color => {
                if let Some(rgb) = value.as_rgb() {
                    self.set_display_color(DisplayColor::new(rgb, self.display_color.opacity));
                }
            }
            PanelField::Opacity => {
                if let Some(opacity) = value.as_number() {
                    self.set_display_color(DisplayColor::new(self.display_color.rgb, opacity));
                }
            }
            PanelField::Ball(param) => {
                if let Some(v) = value.as_number() {
                    self.ball_spawner.uniforms.set(param, v);
                }
            }
            PanelField::CyclingColor => {
                if let Some(enabled) = value.as_toggle() {
                    self.cycling_color = enabled;
                }
            }
            PanelField::Action(_) | PanelField::Preset(_) => {}
        }
        true
    }

    /// 把面板上的控件恢复为当前存储的值
    fn resync_field(&mut self, field: PanelField) {
        let PanelField::Setting(key) = field else {
            return;
        };
        let value = self.settings.get(key);
        if let Some(panel) = self.panel.as_mut() {
            panel.update_display(&[(field, value)]);
        }
    }

    fn finish_edit(&mut self, field: PanelField) -> TendrilsResult<()> {
        match field {
            PanelField::Setting(SettingKey::RootNum) => {
                self.simulation.setup(self.settings.root_num)?;
                self.simulation.restart();
            }
            PanelField::Setting(SettingKey::RespawnAmount) => {
                self.simulation
                    .setup_respawn(self.settings.root_num, self.settings.respawn_amount)?;
                self.simulation.setup_spawn_cache()?;
            }
            PanelField::Setting(SettingKey::RespawnTick) => {
                self.scheduler.set(self.settings.respawn_tick);
            }
            _ => {}
        }
        Ok(())
    }

    fn set_display_color(&mut self, color: DisplayColor) {
        self.display_color = color;
        self.settings.color = color.to_normalized();
    }

    /// 面板上所有控件的当前值
    pub fn panel_values(&self) -> Vec<(PanelField, ParamValue)> {
        let mut values: Vec<_> = self
            .settings
            .reflected_values()
            .into_iter()
            .map(|(key, value)| (PanelField::Setting(key), value))
            .collect();
        values.push((PanelField::Color, self.display_color.rgb.into()));
        values.push((PanelField::Opacity, self.display_color.opacity.into()));
        values.extend(
            BallParam::ALL
                .into_iter()
                .map(|param| (PanelField::Ball(param), self.ball_spawner.uniforms.get(param).into())),
        );
        values.push((PanelField::CyclingColor, self.cycling_color.into()));
        values
    }

    fn sync_color_display(&mut self) {
        if let Some(panel) = self.panel.as_mut() {
            panel.update_display(&[
                (PanelField::Color, self.display_color.rgb.into()),
                (PanelField::Opacity, self.display_color.opacity.into()),
            ]);
        }
    }

    /// 绘制表面尺寸变化
    pub fn resize(&mut self, width: u32, height: u32) {
        self.simulation.resize(width, height);
    }

    /// 释放摄像头并停止定时器
    pub fn shutdown(&mut self) {
        self.scheduler.set(0);
        self.camera.release();
        tracing::info!(target: "tendrils", "Tendrils shut down");
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn simulation(&self) -> &S {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut S {
        &mut self.simulation
    }

    pub fn overlay_mut(&mut self) -> &mut O {
        &mut self.overlay
    }

    pub fn panel(&self) -> Option<&P> {
        self.panel.as_ref()
    }

    pub fn panel_mut(&mut self) -> Option<&mut P> {
        self.panel.as_mut()
    }

    pub fn camera(&self) -> &CameraFeed {
        &self.camera
    }

    pub fn scheduler(&self) -> &RespawnScheduler {
        &self.scheduler
    }

    pub fn display_color(&self) -> DisplayColor {
        self.display_color
    }

    pub fn is_color_cycling(&self) -> bool {
        self.cycling_color
    }

    pub fn ball_uniforms(&self) -> BallUniforms {
        self.ball_spawner.uniforms
    }

    pub fn active_preset(&self) -> Option<Preset> {
        self.presets.active()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.render_loop.frames()
    }
}

impl<S, O, P> PresetHost for TendrilsApp<S, O, P>
where
    S: Simulation,
    P: ReflectingPanel + Default,
{
    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn replace_settings(&mut self, next: Settings) -> Settings {
        std::mem::replace(&mut self.settings, next)
    }

    fn set_color_cycling(&mut self, enabled: bool) {
        self.cycling_color = enabled;
    }

    fn rebuild_particles(&mut self, root_num: u32) -> TendrilsResult<()> {
        self.simulation.setup(root_num)?;
        self.simulation.restart();
        Ok(())
    }

    fn rebuild_respawn(&mut self, root_num: u32, respawn_amount: f32) -> TendrilsResult<()> {
        self.simulation.setup_respawn(root_num, respawn_amount)?;
        self.simulation.setup_spawn_cache()?;
        Ok(())
    }

    fn set_ball_uniforms(&mut self, uniforms: BallUniforms) {
        self.ball_spawner.uniforms = uniforms;
    }

    fn restart(&mut self) {
        self.run_action(ControlAction::Restart);
    }

    fn respawn_interval(&self) -> u32 {
        self.scheduler.interval_ms()
    }

    fn resweep(&mut self) {
        self.scheduler.set(self.settings.respawn_tick);
    }

    fn set_display_color(&mut self, color: DisplayColor) {
        TendrilsApp::set_display_color(self, color);
    }

    fn sync_display(&mut self) {
        let values = self.panel_values();
        if let Some(panel) = self.panel.as_mut() {
            panel.update_display(&values);
        }
    }
}

impl<S, O, P> Drop for TendrilsApp<S, O, P> {
    fn drop(&mut self) {
        self.camera.release();
    }
}
