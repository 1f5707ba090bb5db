//! 渲染
//!
//! - `frame`：每帧渲染驱动和绘制表面、叠加线条的契约
//! - `surface`：wgpu 窗口表面

pub mod frame;
pub mod surface;

pub use frame::{DrawSurface, LineOverlay, LineOverlayDesc, RenderLoop, Viewport};
pub use surface::{FrameTarget, SurfaceContext};
