//! 球形重生器
//!
//! 空闲重置用的重生来源：在半径为 `radius` 的球内重新播种粒子，
//! 初速度为 `speed`。启动、`respawn`/`restart` 控制动作以及预设的结构性重启都会用到。

use crate::simulation::{BallSpawn, Simulation, SpawnRequest};
use serde::{Deserialize, Serialize};

/// 球形重生器的 uniform 参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallUniforms {
    pub radius: f32,
    pub speed: f32,
}

impl Default for BallUniforms {
    fn default() -> Self {
        Self {
            radius: 0.3,
            speed: 0.005,
        }
    }
}

/// 面板上可编辑的球形重生器参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BallParam {
    Radius,
    Speed,
}

impl BallParam {
    pub const ALL: [BallParam; 2] = [BallParam::Radius, BallParam::Speed];

    pub fn name(self) -> &'static str {
        match self {
            Self::Radius => "radius",
            Self::Speed => "speed",
        }
    }
}

impl BallUniforms {
    pub fn get(&self, param: BallParam) -> f32 {
        match param {
            BallParam::Radius => self.radius,
            BallParam::Speed => self.speed,
        }
    }

    pub fn set(&mut self, param: BallParam, value: f32) {
        match param {
            BallParam::Radius => self.radius = value,
            BallParam::Speed => self.speed = value,
        }
    }
}

/// 球形重生器
#[derive(Debug, Clone, Default)]
pub struct BallSpawner {
    pub uniforms: BallUniforms,
}

impl BallSpawner {
    pub fn new(uniforms: BallUniforms) -> Self {
        Self { uniforms }
    }

    /// 以新的随机种子发出一次球形重生
    pub fn respawn<S: Simulation + ?Sized>(&self, simulation: &mut S) {
        simulation.respawn(SpawnRequest::Ball(BallSpawn {
            radius: self.uniforms.radius,
            speed: self.uniforms.speed,
            seed: rand::random::<f32>(),
        }));
    }
}
