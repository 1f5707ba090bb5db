//! 像素重生器
//!
//! 把任意二维像素缓冲区（摄像头帧，或模拟自己的流场缓冲区）
//! 转换为模拟可以消费的重生请求。同一类型有两个独立实例。

use crate::simulation::{PixelSource, PixelSpawn, SpawnRequest, SpawnTransform, Simulation};
use glam::{UVec2, Vec2};
use image::RgbaImage;
use std::sync::Arc;

/// 像素重生器绑定的来源
#[derive(Debug, Clone, Default)]
pub enum PixelBinding {
    /// 尚无可用像素（例如摄像头未就绪）
    #[default]
    Unbound,
    /// 一帧 CPU 图像（与摄像头共享）
    Frame(Arc<RgbaImage>),
    /// 模拟的流场缓冲区
    FlowBuffer,
}

/// 像素重生器
#[derive(Debug, Clone)]
pub struct PixelSpawner {
    binding: PixelBinding,
    spawn_scale: Vec2,
    /// 来源缓冲区的形状；帧来源时由帧尺寸决定
    shape: Option<UVec2>,
}

impl Default for PixelSpawner {
    fn default() -> Self {
        Self {
            binding: PixelBinding::Unbound,
            spawn_scale: Vec2::ONE,
            shape: None,
        }
    }
}

impl PixelSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 永久绑定到模拟流场缓冲区的反馈重生器
    pub fn flow_feedback(spawn_scale: Vec2) -> Self {
        let mut spawner = Self::new();
        spawner.configure(PixelBinding::FlowBuffer, spawn_scale);
        spawner
    }

    /// 绑定像素来源和生成缩放；某个轴取负会翻转来源
    pub fn configure(&mut self, binding: PixelBinding, spawn_scale: Vec2) {
        if let PixelBinding::Frame(frame) = &binding {
            self.shape = Some(UVec2::new(frame.width(), frame.height()));
        }
        self.binding = binding;
        self.spawn_scale = spawn_scale;
    }

    /// 替换当前帧，保留生成缩放
    pub fn set_pixels(&mut self, frame: Arc<RgbaImage>) {
        self.shape = Some(UVec2::new(frame.width(), frame.height()));
        self.binding = PixelBinding::Frame(frame);
    }

    pub fn set_shape(&mut self, shape: UVec2) {
        self.shape = Some(shape);
    }

    pub fn set_spawn_scale(&mut self, spawn_scale: Vec2) {
        self.spawn_scale = spawn_scale;
    }

    pub fn spawn_scale(&self) -> Vec2 {
        self.spawn_scale
    }

    pub fn shape(&self) -> Option<UVec2> {
        self.shape
    }

    /// 向模拟发出一次像素重生
    ///
    /// 没有可用来源（或来源面积为 0）时什么都不做并返回 `false`。
    pub fn respawn<S: Simulation + ?Sized>(&self, simulation: &mut S) -> bool {
        let (source, shape) = match &self.binding {
            PixelBinding::Unbound => return false,
            PixelBinding::Frame(frame) => (
                PixelSource::Frame(frame.as_ref()),
                UVec2::new(frame.width(), frame.height()),
            ),
            PixelBinding::FlowBuffer => (
                PixelSource::FlowBuffer,
                self.shape.unwrap_or(simulation.flow_buffer().shape),
            ),
        };

        if shape.x == 0 || shape.y == 0 {
            return false;
        }

        let transform = SpawnTransform::new(self.spawn_scale, simulation.view_size(), shape);
        simulation.respawn(SpawnRequest::Pixels(PixelSpawn {
            source,
            shape,
            transform,
        }));
        true
    }
}
