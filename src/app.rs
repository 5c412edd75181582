//! Windowed application: owns the event loop, the GPU renderer and the world

use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{DeviceEvent, DeviceId, ElementState, Event, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowAttributes, WindowId},
};

use crate::{
    config::WorldConfig,
    environment::{create_handler, EnvironmentKind},
    gfx::rendering::RenderEngine,
    ui::UiManager,
    world::{
        FrameContext, FrameOutcome, FrameRenderer, FrameScheduler, InputEvent, Key,
        SystemTimeSource, World, WorldAction,
    },
};

type UiPass = fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView);

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("no monitor available for fullscreen")]
    NoMonitor,
}

/// Enters borderless fullscreen on the current monitor, or leaves it
pub fn toggle_fullscreen(window: &Window) -> Result<(), DisplayError> {
    if window.fullscreen().is_some() {
        window.set_fullscreen(None);
        return Ok(());
    }
    let monitor = window.current_monitor().ok_or(DisplayError::NoMonitor)?;
    window.set_fullscreen(Some(Fullscreen::Borderless(Some(monitor))));
    Ok(())
}

/// Schedules frames by requesting a redraw of the window
pub struct WindowScheduler {
    window: Arc<Window>,
}

impl FrameScheduler for WindowScheduler {
    fn schedule_next(&mut self) {
        self.window.request_redraw();
    }
}

/// Draws frames with the wgpu engine and, in debug, the imgui overlay
pub struct GpuRenderer {
    window: Arc<Window>,
    engine: RenderEngine,
    ui: Option<UiManager>,
}

impl GpuRenderer {
    fn wants_mouse(&self) -> bool {
        self.ui.as_ref().is_some_and(UiManager::wants_mouse)
    }

    /// Keeps the surface at the viewport's render size, never above the window
    fn sync_size(&mut self, target: (u32, u32)) {
        let PhysicalSize { width, height } = self.window.inner_size();
        let size = (target.0.min(width), target.1.min(height));
        if size.0 == 0 || size.1 == 0 || self.engine.get_surface_size() == size {
            return;
        }
        log::debug!("Resizing surface to {}x{}", size.0, size.1);
        self.engine.resize(size.0, size.1);
        if let Some(ui) = self.ui.as_mut() {
            ui.update_display_size(size.0, size.1);
        }
    }
}

impl FrameRenderer for GpuRenderer {
    fn render(&mut self, frame: FrameContext<'_>) {
        let FrameContext {
            scene,
            camera,
            environment,
            viewport,
        } = frame;
        self.sync_size(viewport.render_size());

        let result = match self.ui.as_mut() {
            Some(ui) => {
                ui.update_logic(&self.window, |frame_ui| environment.draw_ui(frame_ui, scene));
                let mut drawn = false;
                let result = self.engine.render_frame(
                    scene,
                    camera,
                    Some(
                        |device: &wgpu::Device,
                         queue: &wgpu::Queue,
                         encoder: &mut wgpu::CommandEncoder,
                         view: &wgpu::TextureView| {
                            ui.render_display_only(device, queue, encoder, view);
                            drawn = true;
                        },
                    ),
                );
                // Skipped frames never reach the UI pass
                if !drawn {
                    ui.discard_frame();
                }
                result
            }
            None => self.engine.render_frame(scene, camera, None::<UiPass>),
        };

        if let Err(err) = result {
            log::error!("Frame failed: {err}");
        }
        let stats = self.engine.last_stats();
        environment.record_render_stats(stats.draw_calls, stats.vertex_count);
    }
}

struct Running {
    window: Arc<Window>,
    world: World,
    renderer: GpuRenderer,
}

pub struct HauntedApp {
    config: WorldConfig,
    kind: EnvironmentKind,
    running: Option<Running>,
    error: Option<anyhow::Error>,
}

impl HauntedApp {
    pub fn new(config: WorldConfig, kind: EnvironmentKind) -> Self {
        Self {
            config,
            kind,
            running: None,
            error: None,
        }
    }

    /// Runs the event loop until the window closes
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Wait);
        event_loop.run_app(&mut self)?;

        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Running> {
        let (width, height) = self.config.window_size;
        let window = Arc::new(
            event_loop.create_window(
                WindowAttributes::default()
                    .with_title(self.config.title.as_str())
                    .with_inner_size(LogicalSize::new(width, height)),
            )?,
        );

        let PhysicalSize {
            width: physical_width,
            height: physical_height,
        } = window.inner_size();
        let engine = pollster::block_on(RenderEngine::new(
            window.clone(),
            physical_width.max(1),
            physical_height.max(1),
            self.config.assets_root.clone(),
        ))?;

        let environment = create_handler(self.kind);
        let ui = environment.has_ui().then(|| {
            UiManager::new(
                engine.device(),
                engine.queue(),
                engine.surface_format(),
                &window,
            )
        });

        let mut world = World::new(
            self.config.clone(),
            environment,
            Box::new(SystemTimeSource::new()),
            Box::new(WindowScheduler {
                window: window.clone(),
            }),
        )?;
        resize_world(&mut world, &window, window.inner_size());
        world.start();

        Ok(Running {
            window: window.clone(),
            world,
            renderer: GpuRenderer { window, engine, ui },
        })
    }
}

fn resize_world(world: &mut World, window: &Window, size: PhysicalSize<u32>) {
    let scale_factor = window.scale_factor();
    let logical: LogicalSize<f64> = size.to_logical(scale_factor);
    world.resize(
        logical.width.round() as u32,
        logical.height.round() as u32,
        scale_factor,
    );
}

/// Window events the world sees even when the UI captures them
fn handle_before_ui(world: &mut World, event: &WindowEvent) {
    if let WindowEvent::Focused(false) = event {
        world.camera_mut().controller.release();
    }
}

fn key_of(code: KeyCode) -> Key {
    match code {
        KeyCode::KeyF => Key::F,
        KeyCode::Escape => Key::Escape,
        _ => Key::Other,
    }
}

impl Running {
    fn apply(&mut self, action: WorldAction, event_loop: &ActiveEventLoop) {
        match action {
            WorldAction::ToggleFullscreen => {
                if let Err(err) = toggle_fullscreen(&self.window) {
                    log::error!("Could not toggle fullscreen: {err}");
                }
            }
            WorldAction::Exit => {
                self.world.close();
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler for HauntedApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }

        match self.start(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(err) => {
                log::error!("Startup failed: {err:#}");
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        handle_before_ui(&mut running.world, &event);

        // Handle UI input first
        if let Some(ui) = running.renderer.ui.as_mut() {
            let ui_event: Event<()> = Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui.handle_input(&running.window, &ui_event) {
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                running.world.camera_mut().process_keyboard_event(&key_event);
                if let KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state: ElementState::Released,
                    ..
                } = key_event
                {
                    if let Some(action) = running.world.handle_input(InputEvent::KeyReleased(key_of(code))) {
                        running.apply(action, event_loop);
                    }
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(action) = running.world.handle_input(InputEvent::PrimaryPressed) {
                    running.apply(action, event_loop);
                }
            }
            WindowEvent::Resized(size) => {
                resize_world(&mut running.world, &running.window, size);
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                resize_world(&mut running.world, &running.window, running.window.inner_size());
            }
            WindowEvent::CloseRequested => {
                running.world.close();
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                if running.world.frame(&mut running.renderer) == FrameOutcome::Closed {
                    event_loop.exit();
                }
            }
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        // Don't process camera events when the UI has the mouse
        if running.renderer.wants_mouse() || running.world.is_closed() {
            return;
        }
        running.world.camera_mut().process_event(&event);
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = self.running.as_mut() {
            running.world.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoFrames;

    impl FrameScheduler for NoFrames {
        fn schedule_next(&mut self) {}
    }

    #[test]
    fn losing_focus_ends_a_camera_drag() {
        let mut world = World::new(
            WorldConfig::default(),
            create_handler(EnvironmentKind::Debug),
            Box::new(SystemTimeSource::new()),
            Box::new(NoFrames),
        )
        .unwrap();
        world.camera_mut().process_event(&DeviceEvent::Button {
            button: 0,
            state: ElementState::Pressed,
        });
        assert!(world.camera().controller.is_rotating());

        handle_before_ui(&mut world, &WindowEvent::Focused(true));
        assert!(world.camera().controller.is_rotating());
        handle_before_ui(&mut world, &WindowEvent::Focused(false));
        assert!(!world.camera().controller.is_rotating());
    }

    #[test]
    fn only_f_and_escape_are_bound_keys() {
        assert_eq!(key_of(KeyCode::KeyF), Key::F);
        assert_eq!(key_of(KeyCode::Escape), Key::Escape);
        assert_eq!(key_of(KeyCode::Space), Key::Other);
    }
}
