use super::{ConfigError, ConfigResult};
use crate::camera::{CameraDevice, CaptureConstraints, StillImageCamera, UnavailableCamera};
use crate::spawn::CAMERA_MIRROR;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// 摄像头配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// 是否请求摄像头
    pub enabled: bool,

    /// 用作视频源的静态图片（PNG/JPEG）
    pub source: Option<PathBuf>,

    /// 期望分辨率 [宽, 高]
    pub resolution: Option<[u32; 2]>,

    /// 摄像头像素的生成缩放，默认水平镜像
    pub mirror: [f32; 2],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            source: None,
            resolution: None,
            mirror: CAMERA_MIRROR.to_array(),
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some([w, h]) = self.resolution {
            if w == 0 || h == 0 {
                return Err(ConfigError::ValidationError(
                    "Camera resolution must be non-zero".to_string(),
                ));
            }
        }
        super::validate_scale("camera.mirror", self.mirror)
    }

    pub fn constraints(&self) -> CaptureConstraints {
        CaptureConstraints {
            resolution: self.resolution,
            ..CaptureConstraints::default()
        }
    }

    /// 按配置选择采集设备
    pub fn device(&self) -> Arc<dyn CameraDevice> {
        match (&self.source, self.enabled) {
            (Some(path), true) => Arc::new(StillImageCamera::new(path.clone())),
            _ => Arc::new(UnavailableCamera),
        }
    }
}
