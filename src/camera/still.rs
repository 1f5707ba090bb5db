//! 内置的采集设备
//!
//! - `UnavailableCamera`：没有采集设备时使用，请求总是失败
//! - `StillImageCamera`：把一张 PNG/JPEG 图片当作恒定的视频流

use super::{CameraDevice, CaptureConstraints, VideoStream};
use crate::core::error::{CameraError, CameraResult};
use futures::future::{BoxFuture, FutureExt};
use image::imageops::FilterType;
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;

/// 不可用的采集设备
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableCamera;

impl CameraDevice for UnavailableCamera {
    fn request(
        &self,
        _constraints: &CaptureConstraints,
    ) -> BoxFuture<'static, CameraResult<Box<dyn VideoStream>>> {
        futures::future::ready(Err(CameraError::NoDevice)).boxed()
    }
}

/// 静态图片采集设备
#[derive(Debug, Clone)]
pub struct StillImageCamera {
    path: PathBuf,
}

impl StillImageCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(path: PathBuf, resolution: Option<[u32; 2]>) -> CameraResult<RgbaImage> {
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CameraError::NoDevice
            } else {
                CameraError::Denied(format!("{}: {e}", path.display()))
            }
        })?;

        // 在阻塞任务中解码图像
        tokio::task::spawn_blocking(move || {
            let image = image::load_from_memory(&bytes)
                .map_err(|e| CameraError::Decode(e.to_string()))?;
            Ok(match resolution {
                Some([w, h]) if w > 0 && h > 0 => {
                    image.resize_exact(w, h, FilterType::Triangle).to_rgba8()
                }
                _ => image.to_rgba8(),
            })
        })
        .await
        .map_err(|_| CameraError::RequestDropped)?
    }
}

impl CameraDevice for StillImageCamera {
    fn request(
        &self,
        constraints: &CaptureConstraints,
    ) -> BoxFuture<'static, CameraResult<Box<dyn VideoStream>>> {
        let path = self.path.clone();
        let resolution = constraints.resolution;
        async move {
            let frame = Self::load(path, resolution).await?;
            Ok(Box::new(ConstantStream::new(frame)) as Box<dyn VideoStream>)
        }
        .boxed()
    }
}

/// 每次都返回同一帧的视频流，帧只共享不复制
#[derive(Debug, Clone)]
pub struct ConstantStream {
    frame: Arc<RgbaImage>,
}

impl ConstantStream {
    pub fn new(frame: impl Into<Arc<RgbaImage>>) -> Self {
        Self {
            frame: frame.into(),
        }
    }
}

impl VideoStream for ConstantStream {
    fn next_frame(&mut self) -> Option<Arc<RgbaImage>> {
        Some(Arc::clone(&self.frame))
    }
}
