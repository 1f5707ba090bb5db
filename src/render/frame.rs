//! 每帧渲染驱动
//!
//! 一帧的顺序：
//! 1. 模拟推进一步并绘制到自己的离屏目标
//! 2. 视口设为整个绘制缓冲区
//! 3. 绑定可见帧缓冲区
//! 4. 绘制叠加线条
//!
//! 呈现由宿主在绘制完面板之后完成。

use crate::core::error::RenderResult;
use crate::settings::Settings;
use crate::simulation::Simulation;

/// 视口
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// 覆盖整个绘制缓冲区的视口
    pub fn full(size: (u32, u32)) -> Self {
        Self {
            x: 0,
            y: 0,
            width: size.0,
            height: size.1,
        }
    }
}

/// 可见的绘制表面
pub trait DrawSurface {
    /// 绘制缓冲区的像素尺寸
    fn drawing_buffer_size(&self) -> (u32, u32);

    fn set_viewport(&mut self, viewport: Viewport);

    /// 绑定可见帧缓冲区（屏幕）作为后续绘制的目标
    fn bind_visible(&mut self) -> RenderResult<()>;
}

/// 叠加线条的构造参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineOverlayDesc {
    pub path: [[f32; 2]; 2],
    pub radius: f32,
}

impl LineOverlayDesc {
    pub fn new(path: [[f32; 2]; 2]) -> Self {
        Self { path, radius: 0.1 }
    }
}

impl Default for LineOverlayDesc {
    fn default() -> Self {
        Self::new(Settings::default().line_path)
    }
}

/// 叠加线条渲染器
pub trait LineOverlay<D: ?Sized> {
    fn draw(&mut self, surface: &mut D) -> RenderResult<()>;
}

/// 每帧渲染驱动
#[derive(Debug, Default)]
pub struct RenderLoop {
    frames: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已绘制的帧数
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn frame<S, D, O>(
        &mut self,
        simulation: &mut S,
        settings: &Settings,
        surface: &mut D,
        overlay: &mut O,
    ) -> RenderResult<()>
    where
        S: Simulation + ?Sized,
        D: DrawSurface + ?Sized,
        O: LineOverlay<D> + ?Sized,
    {
        simulation.step_and_draw(settings);

        let size = surface.drawing_buffer_size();
        surface.set_viewport(Viewport::full(size));
        surface.bind_visible()?;

        overlay.draw(surface)?;
        self.frames += 1;
        Ok(())
    }
}
