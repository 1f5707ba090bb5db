use super::panel::ControlPanel;
use crate::core::error::{RenderError, RenderResult};
use crate::render::SurfaceContext;
use egui_wgpu::{Renderer, ScreenDescriptor};
use egui_winit::State;
use winit::event::WindowEvent;
use winit::window::Window;

/// egui 集成：把控制面板画在叠加线条之上
// egui-winit 的 State 不是 Send，只能留在主线程
pub struct PanelContext {
    pub context: egui::Context,
    pub state: State,
    pub renderer: Renderer,
}

impl PanelContext {
    pub fn new(window: &Window, device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let context = egui::Context::default();
        let viewport_id = context.viewport_id();
        let state = State::new(
            context.clone(),
            viewport_id,
            window,
            Some(window.scale_factor() as f32),
            None,
        );
        let renderer = Renderer::new(device, format, None, 1);
        Self {
            context,
            state,
            renderer,
        }
    }

    /// 返回事件是否被面板消费
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.state.on_window_event(window, event);
        response.consumed
    }

    /// 绘制面板并提交到当前帧；当前帧尚未绑定时返回错误
    pub fn paint(
        &mut self,
        window: &Window,
        surface: &SurfaceContext,
        panel: &mut ControlPanel,
    ) -> RenderResult<()> {
        let raw_input = self.state.take_egui_input(window);
        self.context.begin_frame(raw_input);
        panel.show(&self.context);
        let output = self.context.end_frame();
        self.state
            .handle_platform_output(window, output.platform_output);

        let Some(target) = surface.target() else {
            return Err(RenderError::InvalidState(
                "panel painted before the visible frame was bound".to_string(),
            ));
        };

        let shapes = self
            .context
            .tessellate(output.shapes, output.pixels_per_point);
        let screen = ScreenDescriptor {
            size_in_pixels: [surface.config().width, surface.config().height],
            pixels_per_point: output.pixels_per_point,
        };

        for (id, delta) in &output.textures_delta.set {
            self.renderer
                .update_texture(target.device, target.queue, *id, delta);
        }

        let mut encoder = target
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("panel encoder"),
            });
        let mut commands = self.renderer.update_buffers(
            target.device,
            target.queue,
            &mut encoder,
            &shapes,
            &screen,
        );

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("panel pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.renderer.render(&mut rpass, &shapes, &screen);
        }

        commands.push(encoder.finish());
        target.queue.submit(commands);

        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
        Ok(())
    }
}
