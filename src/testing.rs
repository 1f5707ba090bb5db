//! 单元测试共用的记录型替身

use crate::core::error::{RenderError, RenderResult, SimulationError, SimulationResult};
use crate::render::{DrawSurface, LineOverlay, Viewport};
use crate::settings::Settings;
use crate::simulation::{BallSpawn, FlowBuffer, PixelSource, Simulation, SpawnRequest, SpawnTransform};
use glam::{UVec2, Vec2};

#[derive(Debug, Clone, PartialEq)]
pub enum SimCall {
    Setup(u32),
    SetupRespawn(u32, f32),
    SetupSpawnCache,
    Restart,
    Reset,
    ResetParticles,
    Clear,
    ClearView,
    ClearFlow,
    RespawnBall(BallSpawn),
    RespawnPixels {
        from_flow: bool,
        shape: UVec2,
        transform: SpawnTransform,
    },
    StepAndDraw,
    Resize(u32, u32),
}

/// 记录所有调用的模拟
#[derive(Debug, Clone)]
pub struct RecordingSimulation {
    pub calls: Vec<SimCall>,
    pub view_size: Vec2,
    pub flow_shape: UVec2,
    pub fail_setup: bool,
    pub last_settings: Option<Settings>,
}

impl RecordingSimulation {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            view_size: Vec2::new(800.0, 600.0),
            flow_shape: UVec2::new(200, 150),
            fail_setup: false,
            last_settings: None,
        }
    }

    pub fn count(&self, call: &SimCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn pixel_respawns(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, SimCall::RespawnPixels { .. }))
            .count()
    }
}

impl Simulation for RecordingSimulation {
    fn view_size(&self) -> Vec2 {
        self.view_size
    }

    fn flow_buffer(&self) -> FlowBuffer {
        FlowBuffer {
            shape: self.flow_shape,
        }
    }

    fn setup(&mut self, root_num: u32) -> SimulationResult<()> {
        self.calls.push(SimCall::Setup(root_num));
        if self.fail_setup {
            return Err(SimulationError::Allocation {
                what: "particle buffer".to_string(),
                reason: "out of memory".to_string(),
            });
        }
        Ok(())
    }

    fn setup_respawn(&mut self, root_num: u32, respawn_amount: f32) -> SimulationResult<()> {
        self.calls.push(SimCall::SetupRespawn(root_num, respawn_amount));
        Ok(())
    }

    fn setup_spawn_cache(&mut self) -> SimulationResult<()> {
        self.calls.push(SimCall::SetupSpawnCache);
        Ok(())
    }

    fn restart(&mut self) {
        self.calls.push(SimCall::Restart);
    }

    fn reset(&mut self) {
        self.calls.push(SimCall::Reset);
    }

    fn reset_particles(&mut self) {
        self.calls.push(SimCall::ResetParticles);
    }

    fn clear(&mut self) {
        self.calls.push(SimCall::Clear);
    }

    fn clear_view(&mut self) {
        self.calls.push(SimCall::ClearView);
    }

    fn clear_flow(&mut self) {
        self.calls.push(SimCall::ClearFlow);
    }

    fn respawn(&mut self, request: SpawnRequest<'_>) {
        self.calls.push(match request {
            SpawnRequest::Ball(ball) => SimCall::RespawnBall(ball),
            SpawnRequest::Pixels(pixels) => SimCall::RespawnPixels {
                from_flow: matches!(pixels.source, PixelSource::FlowBuffer),
                shape: pixels.shape,
                transform: pixels.transform,
            },
        });
    }

    fn step_and_draw(&mut self, settings: &Settings) {
        self.last_settings = Some(*settings);
        self.calls.push(SimCall::StepAndDraw);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.view_size = Vec2::new(width as f32, height as f32);
        self.calls.push(SimCall::Resize(width, height));
    }
}

/// 记录视口和绑定次数的绘制表面
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub size: (u32, u32),
    pub viewports: Vec<Viewport>,
    pub binds: usize,
    pub fail_bind: bool,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            ..Default::default()
        }
    }
}

impl DrawSurface for RecordingSurface {
    fn drawing_buffer_size(&self) -> (u32, u32) {
        self.size
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewports.push(viewport);
    }

    fn bind_visible(&mut self) -> RenderResult<()> {
        if self.fail_bind {
            return Err(RenderError::Surface("lost".to_string()));
        }
        self.binds += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingOverlay {
    pub draws: usize,
    /// 每次绘制时表面已绑定的次数
    pub binds_seen: Vec<usize>,
}

impl LineOverlay<RecordingSurface> for RecordingOverlay {
    fn draw(&mut self, surface: &mut RecordingSurface) -> RenderResult<()> {
        self.draws += 1;
        self.binds_seen.push(surface.binds);
        Ok(())
    }
}
