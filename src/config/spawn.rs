use super::{ConfigError, ConfigResult};
use crate::spawn::{BallUniforms, FLOW_REFLECTION};
use serde::{Deserialize, Serialize};

/// 重生来源配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// 流场反馈的生成缩放，默认纵向反射
    pub flow_scale: [f32; 2],

    /// 球形重生器的默认参数
    pub ball: BallUniforms,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            flow_scale: FLOW_REFLECTION.to_array(),
            ball: BallUniforms::default(),
        }
    }
}

impl SpawnConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        super::validate_scale("spawn.flow_scale", self.flow_scale)?;
        let radius = self.ball.radius;
        if !radius.is_finite() || radius <= 0.0 || !self.ball.speed.is_finite() {
            return Err(ConfigError::ValidationError(format!(
                "Invalid ball spawner uniforms: {:?}",
                self.ball
            )));
        }
        Ok(())
    }
}
