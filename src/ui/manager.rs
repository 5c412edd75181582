// src/ui/manager.rs
//! ImGui UI manager
//!
//! Handles ImGui integration with wgpu and winit: frame timing, input
//! capture and drawing the debug panel on top of the rendered scene.

use imgui::{Context, DrawData, FontConfig, FontSource, Io, MouseCursor, Ui};
use imgui_wgpu::{Renderer, RendererConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use std::time::Instant;
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};
use winit::{
    event::{Event, WindowEvent},
    window::Window,
};

/// ImGui context that pairs every begun frame with exactly one end.
///
/// ImGui aborts when a new frame starts before the previous one was
/// rendered, which happens whenever a frame is built but the surface is
/// not available to draw it.
pub struct UiContext {
    context: Context,
    frame_open: bool,
}

impl UiContext {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            frame_open: false,
        }
    }

    pub fn io(&self) -> &Io {
        self.context.io()
    }

    pub fn io_mut(&mut self) -> &mut Io {
        self.context.io_mut()
    }

    pub fn is_frame_open(&self) -> bool {
        self.frame_open
    }

    /// Starts a frame, first closing one that was never rendered
    pub fn begin_frame(&mut self) -> &mut Ui {
        if self.frame_open {
            log::debug!("Discarding UI frame that was never drawn");
            self.context.render();
        }
        self.frame_open = true;
        self.context.frame()
    }

    /// Ends the open frame and hands back its draw data
    pub fn end_frame(&mut self) -> Option<&DrawData> {
        if !self.frame_open {
            return None;
        }
        self.frame_open = false;
        Some(self.context.render())
    }

    /// Ends the open frame without drawing it
    pub fn discard_frame(&mut self) {
        let _ = self.end_frame();
    }
}

/// ImGui UI manager
///
/// Owns the ImGui context, platform integration and renderer. Input the UI
/// captures is reported back so camera controls can ignore it.
pub struct UiManager {
    context: UiContext,
    platform: WinitPlatform,
    renderer: Renderer,
    last_frame: Instant,
    last_cursor: Option<MouseCursor>,
}

impl UiManager {
    /// Creates a new UI manager
    ///
    /// Uses locked DPI mode; the display size is managed through
    /// [`update_display_size`](Self::update_display_size).
    pub fn new(
        device: &Device,
        queue: &Queue,
        output_color_format: TextureFormat,
        window: &Window,
    ) -> Self {
        let mut context = Context::create();
        context.set_ini_filename(None);

        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(context.io_mut(), window, HiDpiMode::Locked(1.0));

        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: 16.0,
                ..Default::default()
            }),
        }]);

        let renderer_config = RendererConfig {
            texture_format: output_color_format,
            ..Default::default()
        };
        let renderer = Renderer::new(&mut context, device, queue, renderer_config);

        Self {
            context: UiContext::new(context),
            platform,
            renderer,
            last_frame: Instant::now(),
            last_cursor: None,
        }
    }

    /// Updates ImGui's display size to match the render target
    pub fn update_display_size(&mut self, width: u32, height: u32) {
        self.context.io_mut().display_size = [width as f32, height as f32];
    }

    /// Feeds a window event to ImGui and returns whether the UI captured it
    pub fn handle_input<T>(&mut self, window: &Window, event: &Event<T>) -> bool {
        match event {
            Event::WindowEvent {
                event: window_event,
                ..
            } => match window_event {
                WindowEvent::CursorMoved { .. }
                | WindowEvent::MouseInput { .. }
                | WindowEvent::MouseWheel { .. }
                | WindowEvent::KeyboardInput { .. }
                | WindowEvent::Focused(_) => {
                    self.platform
                        .handle_event(self.context.io_mut(), window, event);

                    let io = self.context.io();
                    io.want_capture_mouse || io.want_capture_keyboard
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Whether the UI currently wants the mouse
    pub fn wants_mouse(&self) -> bool {
        self.context.io().want_capture_mouse
    }

    /// Builds this frame's UI; call once per frame before rendering
    pub fn update_logic<F>(&mut self, window: &Window, run_ui: F)
    where
        F: FnOnce(&imgui::Ui),
    {
        let now = Instant::now();
        self.context
            .io_mut()
            .update_delta_time(now - self.last_frame);
        self.last_frame = now;

        if let Err(err) = self.platform.prepare_frame(self.context.io_mut(), window) {
            log::error!("Failed to prepare UI frame: {err}");
        }

        let ui = self.context.begin_frame();
        run_ui(ui);

        if self.last_cursor != ui.mouse_cursor() {
            self.last_cursor = ui.mouse_cursor();
            self.platform.prepare_render(ui, window);
        }
    }

    /// Ends a frame built by `update_logic()` that will not be drawn
    pub fn discard_frame(&mut self) {
        self.context.discard_frame();
    }

    /// Draws the UI built by the last `update_logic()` over `color_attachment`
    pub fn render_display_only(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        color_attachment: &TextureView,
    ) {
        let Some(draw_data) = self.context.end_frame() else {
            return;
        };

        if draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0 {
            return;
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("imgui_render_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_attachment,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load, // Preserve 3D scene
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Err(err) = self.renderer.render(draw_data, queue, device, &mut render_pass) {
            log::error!("Failed to render UI: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headless_context() -> UiContext {
        let mut context = Context::create();
        context.set_ini_filename(None);
        context.io_mut().display_size = [800.0, 600.0];
        context.fonts().build_rgba32_texture();
        UiContext::new(context)
    }

    // One test owns the global ImGui context; a second live context panics
    #[test]
    fn skipped_frames_are_closed_before_the_next_one() {
        let mut ui = headless_context();
        assert!(ui.end_frame().is_none());

        ui.begin_frame().text("built but never drawn");
        assert!(ui.is_frame_open());
        ui.discard_frame();
        assert!(!ui.is_frame_open());

        ui.begin_frame();
        // a frame left open is ended by the next begin
        ui.begin_frame().text("drawn");
        let draw_data = ui.end_frame().unwrap();
        assert_eq!(draw_data.display_size, [800.0, 600.0]);
        assert!(!ui.is_frame_open());
        assert!(ui.end_frame().is_none());
    }
}
