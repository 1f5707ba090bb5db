//! 重生来源
//!
//! - `PixelSpawner`：像素缓冲区（摄像头帧或流场缓冲区）到重生请求的适配器
//! - `BallSpawner`：球形空闲重置

pub mod ball;
pub mod pixels;

pub use ball::{BallParam, BallSpawner, BallUniforms};
pub use pixels::{PixelBinding, PixelSpawner};

use glam::Vec2;

/// 流场反馈的默认生成缩放（纵向反射）
pub const FLOW_REFLECTION: Vec2 = Vec2::new(1.0, -1.0);

/// 摄像头的默认生成缩放（自拍镜像）
pub const CAMERA_MIRROR: Vec2 = Vec2::new(-1.0, 1.0);
