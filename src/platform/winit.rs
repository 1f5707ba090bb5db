//! winit 宿主
//!
//! 创建窗口和 wgpu 表面，构建外部协作者，然后运行事件循环直到窗口关闭。
//! 尺寸变化经过 200 ms 节流（首尾都触发）再通知模拟；
//! 调试模式下显示控制面板并启用键盘快捷键。

use crate::camera::CameraDevice;
use crate::config::{CameraConfig, GraphicsConfig, TendrilsConfig};
use crate::core::app::{initialize_logging, AppOptions, AppParts, TendrilsApp};
use crate::core::error::{RenderError, TendrilsError, TendrilsResult};
use crate::core::scheduler::TaskRuntime;
use crate::editor::context::PanelContext;
use crate::editor::panel::{ControlAction, ControlPanel, PanelField};
use crate::editor::presets::Preset;
use crate::render::{LineOverlay, LineOverlayDesc, SurfaceContext};
use crate::settings::SettingsPatch;
use crate::simulation::Simulation;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

/// 尺寸变化的节流间隔
pub const RESIZE_THROTTLE: Duration = Duration::from_millis(200);

/// 绘制表面句柄：事件循环 + 窗口
pub struct Canvas {
    event_loop: EventLoop<()>,
    window: Arc<Window>,
}

impl Canvas {
    pub fn new(config: &GraphicsConfig) -> TendrilsResult<Self> {
        let event_loop = EventLoop::new()
            .map_err(|e| TendrilsError::EventLoop(format!("Failed to create event loop: {}", e)))?;
        let window = WindowBuilder::new()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize::new(
                config.resolution.width,
                config.resolution.height,
            ))
            .build(&event_loop)
            .map_err(|e| TendrilsError::Window(e.to_string()))?;

        Ok(Self {
            event_loop,
            window: Arc::new(window),
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }
}

/// 外部协作者：模拟和叠加线条渲染器
pub struct Scene<S, O> {
    pub simulation: S,
    pub overlay: O,
}

/// 由宿主调用，用已经创建好的 GPU 表面构建外部协作者
pub trait SceneBuilder {
    type Simulation: Simulation;
    type Overlay: LineOverlay<SurfaceContext>;

    fn build(
        &mut self,
        surface: &SurfaceContext,
        overlay: LineOverlayDesc,
    ) -> TendrilsResult<Scene<Self::Simulation, Self::Overlay>>;

    /// 采集设备，默认按配置选择
    fn camera(&mut self, config: &CameraConfig) -> Arc<dyn CameraDevice> {
        config.device()
    }
}

/// 尺寸变化节流：间隔内的第一次立即生效，最后一次在间隔结束后生效
#[derive(Debug, Clone)]
pub struct ResizeThrottle {
    interval: Duration,
    last_emit: Option<Instant>,
    pending: Option<(u32, u32)>,
}

impl ResizeThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
            pending: None,
        }
    }

    /// 记录一次尺寸变化，返回需要立即生效的尺寸
    pub fn push(&mut self, size: (u32, u32), now: Instant) -> Option<(u32, u32)> {
        match self.last_emit {
            Some(last) if now.duration_since(last) < self.interval => {
                self.pending = Some(size);
                None
            }
            _ => {
                self.last_emit = Some(now);
                self.pending = None;
                Some(size)
            }
        }
    }

    /// 间隔结束后返回最后一次被推迟的尺寸
    pub fn poll(&mut self, now: Instant) -> Option<(u32, u32)> {
        let last = self.last_emit?;
        if self.pending.is_some() && now.duration_since(last) >= self.interval {
            self.last_emit = Some(now);
            return self.pending.take();
        }
        None
    }
}

impl Default for ResizeThrottle {
    fn default() -> Self {
        Self::new(RESIZE_THROTTLE)
    }
}

/// 调试模式的键盘快捷键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// 按下面板条目（动作或预设）
    Press(PanelField),
    /// 切换面板上的开关
    Toggle(PanelField),
    /// 打开/关闭面板
    TogglePanel,
}

/// 字符键对应的快捷键
pub fn shortcut_for_char(c: &str) -> Option<Shortcut> {
    let preset = |i: usize| Some(Shortcut::Press(PanelField::Preset(Preset::ALL[i])));
    let action = |a: ControlAction| Some(Shortcut::Press(PanelField::Action(a)));

    match c {
        "1" => preset(0),
        "2" => preset(1),
        "3" => preset(2),
        "4" => preset(3),
        "5" => preset(4),
        "6" => preset(5),
        "7" => preset(6),
        "8" => preset(7),
        "9" => preset(8),
        "0" => preset(9),
        "-" => preset(10),
        "c" => action(ControlAction::Clear),
        "v" => action(ControlAction::ClearView),
        "f" => action(ControlAction::ClearFlow),
        "b" => action(ControlAction::Respawn),
        "p" => action(ControlAction::RespawnCamPixels),
        "o" => action(ControlAction::RespawnFlowPixels),
        "x" => action(ControlAction::Reset),
        "r" => action(ControlAction::Restart),
        "k" => Some(Shortcut::Toggle(PanelField::CyclingColor)),
        _ => None,
    }
}

pub fn shortcut(key: &Key) -> Option<Shortcut> {
    match key {
        Key::Character(c) => shortcut_for_char(&c.to_lowercase()),
        Key::Named(NamedKey::Tab) => Some(Shortcut::TogglePanel),
        _ => None,
    }
}

fn apply_shortcut(panel: &mut ControlPanel, shortcut: Shortcut) {
    match shortcut {
        Shortcut::Press(field) => panel.press(field),
        Shortcut::Toggle(field) => panel.toggle(field),
        Shortcut::TogglePanel => panel.toggle_open(),
    }
}

/// 入口：加载配置后运行
///
/// `overrides` 合并在配置文件的 `[settings]` 之后；`debug` 启用控制面板和快捷键。
pub fn run<B: SceneBuilder>(
    canvas: Canvas,
    overrides: SettingsPatch,
    debug: bool,
    builder: B,
) -> TendrilsResult<()> {
    let mut config = TendrilsConfig::load_or_default();
    config.apply_env_overrides();
    run_with_config(canvas, config, overrides, debug, builder)
}

pub fn run_with_config<B: SceneBuilder>(
    canvas: Canvas,
    config: TendrilsConfig,
    overrides: SettingsPatch,
    debug: bool,
    mut builder: B,
) -> TendrilsResult<()> {
    config.validate()?;
    initialize_logging(&config.logging);

    let runtime = TaskRuntime::new(1)?;
    let Canvas { event_loop, window } = canvas;

    let mut surface = pollster::block_on(SurfaceContext::new(
        window.clone(),
        config.graphics.vsync,
    ))?;
    let scene = builder.build(&surface, LineOverlayDesc::default())?;
    let camera = builder.camera(&config.camera);

    let options = AppOptions::from_config(&config, &overrides, debug);
    let mut app: TendrilsApp<B::Simulation, B::Overlay> = TendrilsApp::new(
        AppParts {
            simulation: scene.simulation,
            overlay: scene.overlay,
            camera,
        },
        options,
        runtime.handle(),
    )?;

    let size = window.inner_size();
    app.resize(size.width, size.height);

    let mut panel_ctx =
        debug.then(|| PanelContext::new(&window, surface.device(), surface.format()));
    let mut throttle = ResizeThrottle::default();
    let mut failure: Option<TendrilsError> = None;

    event_loop.set_control_flow(ControlFlow::Poll);
    let result = event_loop.run(|event, elwt| match event {
        Event::WindowEvent { event, .. } => {
            let consumed = panel_ctx
                .as_mut()
                .map(|ctx| ctx.handle_event(&window, &event))
                .unwrap_or(false);

            match event {
                WindowEvent::CloseRequested => {
                    app.shutdown();
                    elwt.exit();
                }
                WindowEvent::Resized(size) => {
                    surface.resize(size.width, size.height);
                    if let Some((w, h)) = throttle.push((size.width, size.height), Instant::now()) {
                        app.resize(w, h);
                    }
                }
                WindowEvent::KeyboardInput { event: key, .. }
                    if debug && !consumed && key.state == ElementState::Pressed && !key.repeat =>
                {
                    if let (Some(shortcut), Some(panel)) = (shortcut(&key.logical_key), app.panel_mut()) {
                        apply_shortcut(panel, shortcut);
                    }
                }
                WindowEvent::RedrawRequested => {
                    let drawn = app.frame(&mut surface).and_then(|()| {
                        if let (Some(ctx), Some(panel)) = (panel_ctx.as_mut(), app.panel_mut()) {
                            ctx.paint(&window, &surface, panel)?;
                        }
                        Ok(())
                    });
                    surface.present();

                    match drawn {
                        Ok(()) => {}
                        Err(TendrilsError::Render(RenderError::Surface(reason))) => {
                            tracing::warn!(target: "tendrils", %reason, "Skipped frame");
                        }
                        Err(e) => {
                            tracing::error!(target: "tendrils", error = %e, "Fatal error, exiting");
                            failure = Some(e);
                            app.shutdown();
                            elwt.exit();
                        }
                    }
                }
                _ => {}
            }
        }
        Event::AboutToWait => {
            if let Some((w, h)) = throttle.poll(Instant::now()) {
                app.resize(w, h);
            }
            window.request_redraw();
        }
        _ => {}
    });

    result.map_err(|e| TendrilsError::EventLoop(format!("Event loop error: {}", e)))?;
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
