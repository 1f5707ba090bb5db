//! 模拟引擎契约
//!
//! 粒子/流场模拟本身是外部协作者：GPU 缓冲区布局和着色器数学都不在本 crate 中。
//! 这里只定义编排层需要的接口，以及每次重生时交给模拟的请求类型。
//!
//! ```text
//! CameraFeed ─► PixelSpawner ─┐
//! flow buffer ─► PixelSpawner ─┼─► Simulation::respawn(SpawnRequest)
//! BallSpawner ────────────────┘
//! ```

use crate::core::error::SimulationResult;
use crate::settings::Settings;
use glam::{Mat3, UVec2, Vec2};
use image::RgbaImage;

/// 模拟流场缓冲区的只读描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowBuffer {
    /// 缓冲区像素尺寸
    pub shape: UVec2,
}

/// 像素来源
#[derive(Debug, Clone, Copy)]
pub enum PixelSource<'a> {
    /// CPU 端的一帧图像（摄像头）
    Frame(&'a RgbaImage),
    /// 模拟自己的流场缓冲区（反馈回路）
    FlowBuffer,
}

/// 像素空间到生成空间的变换
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnTransform {
    /// `spawn_scale / view_size`，用于查找时的宽高比修正
    pub spawn_size: Vec2,
    /// 把像素坐标映射到 [-1, 1] 生成空间（含缩放翻转）
    pub matrix: Mat3,
}

impl SpawnTransform {
    /// 由生成缩放、视图尺寸和像素尺寸计算变换
    pub fn new(spawn_scale: Vec2, view_size: Vec2, pixel_shape: UVec2) -> Self {
        let shape = pixel_shape.as_vec2().max(Vec2::ONE);
        let view = view_size.max(Vec2::ONE);
        Self {
            spawn_size: spawn_scale / view,
            matrix: Mat3::from_scale(spawn_scale)
                * Mat3::from_translation(Vec2::NEG_ONE)
                * Mat3::from_scale(Vec2::splat(2.0) / shape),
        }
    }

    /// 把像素坐标变换到生成空间
    pub fn apply(&self, pixel: Vec2) -> Vec2 {
        self.matrix.transform_point2(pixel)
    }
}

/// 像素重生请求（每次重生创建，被模拟消费后丢弃）
#[derive(Debug, Clone, Copy)]
pub struct PixelSpawn<'a> {
    pub source: PixelSource<'a>,
    pub shape: UVec2,
    pub transform: SpawnTransform,
}

/// 球形重生请求
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallSpawn {
    pub radius: f32,
    pub speed: f32,
    pub seed: f32,
}

/// 重生请求
#[derive(Debug, Clone, Copy)]
pub enum SpawnRequest<'a> {
    Ball(BallSpawn),
    Pixels(PixelSpawn<'a>),
}

/// 外部模拟引擎
///
/// 所有方法都在主线程上调用。`setup*` 会重新分配固定大小的 GPU 缓冲区，
/// 失败时对整个可视化是致命的。
pub trait Simulation {
    /// 当前视图尺寸（像素）
    fn view_size(&self) -> Vec2;

    /// 流场缓冲区
    fn flow_buffer(&self) -> FlowBuffer;

    /// 按根粒子数重新分配粒子/流场缓冲区
    fn setup(&mut self, root_num: u32) -> SimulationResult<()>;

    /// 按粒子数 × 重生比例重新计算重生缓存大小
    fn setup_respawn(&mut self, root_num: u32, respawn_amount: f32) -> SimulationResult<()>;

    /// 重新分配重生缓存
    fn setup_spawn_cache(&mut self) -> SimulationResult<()>;

    /// 重新开始模拟状态
    fn restart(&mut self);

    fn reset(&mut self);

    fn reset_particles(&mut self);

    /// 清除所有渲染和模拟状态
    fn clear(&mut self);

    fn clear_view(&mut self);

    fn clear_flow(&mut self);

    /// 覆盖下一次重生的粒子位置/速度，不推进模拟
    fn respawn(&mut self, request: SpawnRequest<'_>);

    /// 推进一步并绘制到离屏目标
    fn step_and_draw(&mut self, settings: &Settings);

    /// 绘制表面尺寸变化
    fn resize(&mut self, width: u32, height: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_maps_pixel_corners() {
        let transform = SpawnTransform::new(Vec2::ONE, Vec2::new(800.0, 600.0), UVec2::new(4, 2));

        assert!(transform.apply(Vec2::ZERO).abs_diff_eq(Vec2::new(-1.0, -1.0), 1e-6));
        assert!(transform.apply(Vec2::new(4.0, 2.0)).abs_diff_eq(Vec2::ONE, 1e-6));
        assert!(transform.apply(Vec2::new(2.0, 1.0)).abs_diff_eq(Vec2::ZERO, 1e-6));
        assert!(transform
            .spawn_size
            .abs_diff_eq(Vec2::new(1.0 / 800.0, 1.0 / 600.0), 1e-9));
    }

    #[test]
    fn test_negative_scale_mirrors_axis() {
        let mirrored =
            SpawnTransform::new(Vec2::new(-1.0, 1.0), Vec2::new(100.0, 100.0), UVec2::new(10, 10));

        assert!(mirrored.apply(Vec2::ZERO).abs_diff_eq(Vec2::new(1.0, -1.0), 1e-6));
        assert!(mirrored.spawn_size.x < 0.0);
        assert!(mirrored.spawn_size.y > 0.0);
    }
}
