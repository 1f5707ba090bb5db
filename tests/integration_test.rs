use futures::future::{BoxFuture, FutureExt};
use glam::{UVec2, Vec2};
use image::RgbaImage;
use std::sync::Arc;
use tendrils::camera::{CameraDevice, CaptureConstraints, ConstantStream, UnavailableCamera, VideoStream};
use tendrils::config::TendrilsConfig;
use tendrils::core::error::{CameraResult, RenderResult, SimulationResult};
use tendrils::editor::{ControlAction, PanelEvent, PanelField, Preset};
use tendrils::render::{DrawSurface, LineOverlay, Viewport};
use tendrils::settings::{SettingKey, Settings, SettingsPatch};
use tendrils::simulation::{FlowBuffer, PixelSource, Simulation, SpawnRequest};
use tendrils::{AppOptions, AppParts, TendrilsApp};
use tokio::runtime::Handle;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Setup(u32),
    SetupRespawn(u32, f32),
    SetupSpawnCache,
    Restart,
    Reset,
    ResetParticles,
    Clear,
    ClearView,
    ClearFlow,
    Ball { radius: f32, speed: f32 },
    CameraPixels(UVec2),
    FlowPixels(UVec2),
    Step,
    Resize(u32, u32),
}

#[derive(Default)]
struct CountingSimulation {
    calls: Vec<Call>,
}

impl CountingSimulation {
    fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }
}

impl Simulation for CountingSimulation {
    fn view_size(&self) -> Vec2 {
        Vec2::new(640.0, 480.0)
    }

    fn flow_buffer(&self) -> FlowBuffer {
        FlowBuffer {
            shape: UVec2::new(160, 120),
        }
    }

    fn setup(&mut self, root_num: u32) -> SimulationResult<()> {
        self.calls.push(Call::Setup(root_num));
        Ok(())
    }

    fn setup_respawn(&mut self, root_num: u32, respawn_amount: f32) -> SimulationResult<()> {
        self.calls.push(Call::SetupRespawn(root_num, respawn_amount));
        Ok(())
    }

    fn setup_spawn_cache(&mut self) -> SimulationResult<()> {
        self.calls.push(Call::SetupSpawnCache);
        Ok(())
    }

    fn restart(&mut self) {
        self.calls.push(Call::Restart);
    }

    fn reset(&mut self) {
        self.calls.push(Call::Reset);
    }

    fn reset_particles(&mut self) {
        self.calls.push(Call::ResetParticles);
    }

    fn clear(&mut self) {
        self.calls.push(Call::Clear);
    }

    fn clear_view(&mut self) {
        self.calls.push(Call::ClearView);
    }

    fn clear_flow(&mut self) {
        self.calls.push(Call::ClearFlow);
    }

    fn respawn(&mut self, request: SpawnRequest<'_>) {
        self.calls.push(match request {
            SpawnRequest::Ball(ball) => Call::Ball {
                radius: ball.radius,
                speed: ball.speed,
            },
            SpawnRequest::Pixels(pixels) => match pixels.source {
                PixelSource::Frame(_) => Call::CameraPixels(pixels.shape),
                PixelSource::FlowBuffer => Call::FlowPixels(pixels.shape),
            },
        });
    }

    fn step_and_draw(&mut self, _settings: &Settings) {
        self.calls.push(Call::Step);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.calls.push(Call::Resize(width, height));
    }
}

#[derive(Default)]
struct Screen {
    viewports: Vec<Viewport>,
    binds: usize,
}

impl DrawSurface for Screen {
    fn drawing_buffer_size(&self) -> (u32, u32) {
        (640, 480)
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewports.push(viewport);
    }

    fn bind_visible(&mut self) -> RenderResult<()> {
        self.binds += 1;
        Ok(())
    }
}

#[derive(Default)]
struct Line {
    draws: usize,
}

impl LineOverlay<Screen> for Line {
    fn draw(&mut self, _surface: &mut Screen) -> RenderResult<()> {
        self.draws += 1;
        Ok(())
    }
}

struct StillCamera;

impl CameraDevice for StillCamera {
    fn request(
        &self,
        _constraints: &CaptureConstraints,
    ) -> BoxFuture<'static, CameraResult<Box<dyn VideoStream>>> {
        let stream = ConstantStream::new(RgbaImage::new(64, 48));
        futures::future::ready(Ok(Box::new(stream) as Box<dyn VideoStream>)).boxed()
    }
}

type App = TendrilsApp<CountingSimulation, Line>;

fn create_app(camera: Arc<dyn CameraDevice>, options: AppOptions) -> App {
    let parts = AppParts {
        simulation: CountingSimulation::default(),
        overlay: Line::default(),
        camera,
    };
    TendrilsApp::new(parts, options, Handle::current()).unwrap()
}

fn debug_options() -> AppOptions {
    AppOptions {
        debug: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_frame_draws_in_order() {
    let mut app = create_app(Arc::new(UnavailableCamera), AppOptions::default());
    let mut screen = Screen::default();

    app.frame_at(0.0, &mut screen).unwrap();
    app.frame_at(16.0, &mut screen).unwrap();

    assert_eq!(app.frames_drawn(), 2);
    assert_eq!(app.simulation().count(&Call::Step), 2);
    assert_eq!(screen.binds, 2);
    assert_eq!(screen.viewports[0], Viewport::full((640, 480)));
    assert_eq!(app.overlay_mut().draws, 2);
}

#[tokio::test(start_paused = true)]
async fn test_flow_only_preset() {
    let mut app = create_app(Arc::new(UnavailableCamera), debug_options());

    app.apply_preset(Preset::FlowOnly).unwrap();

    let settings = app.settings();
    assert!(!settings.auto_clear_view);
    assert_eq!(settings.respawn_amount, 0.03);
    assert_eq!(settings.respawn_tick, 0);
    assert_eq!(settings.wander_weight, 0.0);
    assert_eq!(app.ball_uniforms().radius, 0.25);
    assert_eq!(app.ball_uniforms().speed, 0.015);
    assert_eq!(app.active_preset(), Some(Preset::FlowOnly));
    assert_eq!(app.scheduler().active_timers(), 0);

    let calls = &app.simulation().calls;
    assert!(calls.contains(&Call::SetupRespawn(512, 0.03)));
    assert!(calls.contains(&Call::Ball {
        radius: 0.25,
        speed: 0.015
    }));
}

#[tokio::test(start_paused = true)]
async fn test_presets_start_from_defaults() {
    let mut app = create_app(Arc::new(UnavailableCamera), debug_options());

    app.apply_preset(Preset::Turbulent).unwrap();
    app.apply_preset(Preset::Ghostly).unwrap();

    let expected = Preset::Ghostly
        .overrides()
        .merged_onto(&Settings::default())
        .unwrap();
    assert_eq!(*app.settings(), expected);
    assert_eq!(app.settings().noise_scale, Settings::default().noise_scale);
}

#[tokio::test(start_paused = true)]
async fn test_root_num_reallocates_only_on_finish() {
    let mut app = create_app(Arc::new(UnavailableCamera), debug_options());
    let field = PanelField::Setting(SettingKey::RootNum);

    app.handle_panel_event(PanelEvent::Changed(field, 300u32.into())).unwrap();
    app.handle_panel_event(PanelEvent::Changed(field, 400u32.into())).unwrap();
    assert_eq!(app.simulation().count(&Call::Setup(400)), 0);

    app.handle_panel_event(PanelEvent::Finished(field, 400u32.into())).unwrap();
    assert_eq!(app.simulation().count(&Call::Setup(300)), 0);
    assert_eq!(app.simulation().count(&Call::Setup(400)), 1);
    assert_eq!(app.simulation().count(&Call::Restart), 1);
}

#[tokio::test(start_paused = true)]
async fn test_camera_never_ready() {
    let mut app = create_app(Arc::new(UnavailableCamera), debug_options());
    let mut screen = Screen::default();

    app.handle_panel_event(PanelEvent::Finished(
        PanelField::Setting(SettingKey::RespawnTick),
        100u32.into(),
    ))
    .unwrap();

    for i in 0..10 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        app.frame_at(i as f64 * 100.0, &mut screen).unwrap();
    }
    app.run_action(ControlAction::RespawnCamPixels);

    let camera_respawns = app
        .simulation()
        .calls
        .iter()
        .filter(|c| matches!(c, Call::CameraPixels(_)))
        .count();
    assert_eq!(camera_respawns, 0);
    assert_eq!(app.frames_drawn(), 10);
}

#[tokio::test]
async fn test_camera_ready_respawns_from_frame() {
    let mut app = create_app(Arc::new(StillCamera), debug_options());
    let mut screen = Screen::default();

    for _ in 0..50 {
        app.frame_at(0.0, &mut screen).unwrap();
        if app.camera().is_ready() {
            break;
        }
        tokio::task::yield_now().await;
    }

    assert!(app.camera().is_ready());
    assert!(app
        .simulation()
        .calls
        .contains(&Call::CameraPixels(UVec2::new(64, 48))));
}

#[tokio::test]
async fn test_flow_feedback_uses_flow_buffer_shape() {
    let mut app = create_app(Arc::new(UnavailableCamera), AppOptions::default());

    assert!(app.respawn_flow_pixels());
    assert!(app
        .simulation()
        .calls
        .contains(&Call::FlowPixels(UVec2::new(160, 120))));
}

#[tokio::test]
async fn test_control_actions() {
    let mut app = create_app(Arc::new(UnavailableCamera), debug_options());

    for action in [
        ControlAction::Clear,
        ControlAction::ClearView,
        ControlAction::ClearFlow,
        ControlAction::Reset,
    ] {
        app.run_action(action);
    }
    app.resize(320, 200);

    let calls = &app.simulation().calls;
    for call in [
        Call::Clear,
        Call::ClearView,
        Call::ClearFlow,
        Call::Reset,
        Call::Resize(320, 200),
    ] {
        assert!(calls.contains(&call), "missing {:?}", call);
    }
    assert_eq!(app.simulation().count(&Call::ResetParticles), 1);
}

#[tokio::test]
async fn test_panel_press_applies_preset() {
    let mut app = create_app(Arc::new(UnavailableCamera), debug_options());
    let mut screen = Screen::default();

    app.panel_mut()
        .unwrap()
        .press(PanelField::Preset(Preset::Flow));
    app.frame_at(0.0, &mut screen).unwrap();

    assert!(app.settings().show_flow);
    assert_eq!(app.simulation().count(&Call::Clear), 0);
    let panel = app.panel().unwrap();
    assert_eq!(
        panel.value(PanelField::Setting(SettingKey::ShowFlow)),
        Some(true.into())
    );
}

#[tokio::test]
async fn test_config_to_options() -> anyhow::Result<()> {
    let config = TendrilsConfig::from_toml_str(
        r#"
[camera]
mirror = [1.0, 1.0]

[spawn]
flow_scale = [1.0, 1.0]

[settings]
rootNum = 128
"#,
    )?;
    config.validate()?;
    let overrides = SettingsPatch::new().with(SettingKey::RootNum, 256u32);

    let options = AppOptions::from_config(&config, &overrides, true);
    assert!(options.debug);
    assert_eq!(options.camera_mirror, Vec2::ONE);
    assert_eq!(options.flow_scale, Vec2::ONE);
    assert_eq!(options.overrides.get(SettingKey::RootNum), Some(256u32.into()));

    let app = create_app(Arc::new(UnavailableCamera), options);
    assert_eq!(app.settings().root_num, 256);
    assert_eq!(app.simulation().calls[0], Call::Setup(256));
    Ok(())
}
