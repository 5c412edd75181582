//! # World
//!
//! Owns the scene, the house, the orbit camera and the environment handler,
//! and drives one frame at a time. Each frame re-arms the next one through a
//! [`FrameScheduler`]; once [`World::close`] has run, frames do nothing.
//!
//! Time, scheduling and rendering sit behind traits so the driver can run
//! without a window:
//!
//! ```rust
//! use hauntstead::{
//!     config::WorldConfig,
//!     environment::{create_handler, EnvironmentKind},
//!     world::{FrameContext, FrameOutcome, FrameRenderer, FrameScheduler, SystemTimeSource, World},
//! };
//!
//! struct Headless;
//! impl FrameScheduler for Headless {
//!     fn schedule_next(&mut self) {}
//! }
//! impl FrameRenderer for Headless {
//!     fn render(&mut self, _frame: FrameContext<'_>) {}
//! }
//!
//! let mut world = World::new(
//!     WorldConfig::default(),
//!     create_handler(EnvironmentKind::Production),
//!     Box::new(SystemTimeSource::new()),
//!     Box::new(Headless),
//! )
//! .unwrap();
//! world.start();
//! assert_eq!(world.frame(&mut Headless), FrameOutcome::Rendered);
//! world.close();
//! assert_eq!(world.frame(&mut Headless), FrameOutcome::Closed);
//! ```

use cgmath::{Deg, Vector3};
use rand::Rng;
use std::time::{Duration, Instant};

use crate::{
    config::WorldConfig,
    environment::{EnvironmentHandler, EnvironmentKind, Tunable},
    gfx::{
        camera::{CameraController, CameraManager, CameraUniform, OrbitCamera, OrbitCameraBounds},
        resources::hex_rgb,
        scene::{Fog, Light, LightShadow, NodeId, NodeProperty, Scene, SceneError, Transform},
    },
    house::House,
};

const TUNABLE_STEP: f32 = 0.01;

/// Monotonic time since an arbitrary fixed origin
pub trait TimeSource {
    fn now(&self) -> Duration;
}

pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Elapsed time since the world was created
pub struct FrameClock {
    source: Box<dyn TimeSource>,
    start: Duration,
}

impl FrameClock {
    pub fn start(source: Box<dyn TimeSource>) -> Self {
        let start = source.now();
        Self { source, start }
    }

    pub fn now(&self) -> Duration {
        self.source.now().saturating_sub(self.start)
    }

    /// Elapsed seconds
    pub fn elapsed(&self) -> f32 {
        self.now().as_secs_f32()
    }
}

/// Arms the next frame
pub trait FrameScheduler {
    fn schedule_next(&mut self);
}

/// Everything a renderer needs for one frame
pub struct FrameContext<'a> {
    pub scene: &'a mut Scene,
    pub camera: &'a CameraUniform,
    pub environment: &'a mut dyn EnvironmentHandler,
    pub viewport: Viewport,
}

pub trait FrameRenderer {
    fn render(&mut self, frame: FrameContext<'_>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    Closed,
}

/// Logical size of the drawing area plus the capped device pixel ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

impl Viewport {
    /// Size of the render target in physical pixels
    pub fn render_size(&self) -> (u32, u32) {
        (
            (self.width as f64 * self.pixel_ratio).round() as u32,
            (self.height as f64 * self.pixel_ratio).round() as u32,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    F,
    Escape,
    Other,
}

/// Window input the world reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyReleased(Key),
    /// Primary mouse button went down
    PrimaryPressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldAction {
    ToggleFullscreen,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    KeyReleased(Key),
    DoubleClick,
}

/// Triggers mapped to actions
#[derive(Debug, Default)]
pub struct InputBindings {
    bindings: Vec<(Trigger, WorldAction)>,
}

impl InputBindings {
    pub fn bind(&mut self, trigger: Trigger, action: WorldAction) {
        self.bindings.push((trigger, action));
    }

    pub fn action_for(&self, trigger: Trigger) -> Option<WorldAction> {
        self.bindings
            .iter()
            .find(|(bound, _)| *bound == trigger)
            .map(|(_, action)| *action)
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Two presses within `window` make a double-click
#[derive(Debug)]
pub struct DoubleClickDetector {
    window: Duration,
    last_press: Option<Duration>,
}

impl DoubleClickDetector {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_press: None,
        }
    }

    /// Records a press at `at`; true when it completes a double-click
    pub fn press(&mut self, at: Duration) -> bool {
        match self.last_press.take() {
            Some(previous) if at.saturating_sub(previous) <= self.window => true,
            _ => {
                self.last_press = Some(at);
                false
            }
        }
    }
}

pub struct World {
    scene: Scene,
    house: House,
    camera: CameraManager,
    environment: Box<dyn EnvironmentHandler>,
    clock: FrameClock,
    scheduler: Box<dyn FrameScheduler>,
    bindings: InputBindings,
    double_click: DoubleClickDetector,
    viewport: Viewport,
    max_pixel_ratio: f64,
    moon: NodeId,
    ambient: NodeId,
    frames: u64,
    closed: bool,
}

impl World {
    pub fn new(
        config: WorldConfig,
        environment: Box<dyn EnvironmentHandler>,
        time: Box<dyn TimeSource>,
        scheduler: Box<dyn FrameScheduler>,
    ) -> Result<Self, SceneError> {
        Self::with_rng(config, environment, time, scheduler, &mut rand::rng())
    }

    /// Like [`World::new`] with a caller-provided source of randomness
    pub fn with_rng<R: Rng + ?Sized>(
        config: WorldConfig,
        mut environment: Box<dyn EnvironmentHandler>,
        time: Box<dyn TimeSource>,
        scheduler: Box<dyn FrameScheduler>,
        rng: &mut R,
    ) -> Result<Self, SceneError> {
        let clock = FrameClock::start(time);

        let mut bindings = InputBindings::default();
        bindings.bind(Trigger::KeyReleased(Key::F), WorldAction::ToggleFullscreen);
        bindings.bind(Trigger::DoubleClick, WorldAction::ToggleFullscreen);
        bindings.bind(Trigger::KeyReleased(Key::Escape), WorldAction::Exit);

        let (width, height) = config.window_size;
        let viewport = Viewport {
            width,
            height,
            pixel_ratio: 1.0,
        };

        let mut scene = Scene::new();
        let fog_color = hex_rgb(&config.fog_color).unwrap_or_else(|| {
            log::warn!("Invalid fog color '{}'", config.fog_color);
            [0.0; 3]
        });
        scene.fog = Some(Fog {
            color: fog_color,
            density: config.fog_density,
        });
        scene.background = fog_color;

        environment.add_axis_helper(&mut scene);
        let camera = create_camera(&config, width, height);
        let (moon, ambient) = add_lights(&config, &mut scene, environment.as_mut());
        let house = House::build(&config.house, &mut scene, environment.as_mut(), rng)?;

        let stats = scene.get_statistics();
        log::info!(
            "World ready in {:?} mode: {} meshes, {} lights, {} materials, {} triangles",
            environment.kind(),
            stats.mesh_count,
            stats.light_count,
            stats.material_count,
            stats.total_triangles
        );

        Ok(Self {
            scene,
            house,
            camera,
            environment,
            clock,
            scheduler,
            bindings,
            double_click: DoubleClickDetector::new(Duration::from_millis(config.double_click_ms)),
            viewport,
            max_pixel_ratio: config.max_pixel_ratio,
            moon,
            ambient,
            frames: 0,
            closed: false,
        })
    }

    /// Arms the first frame
    pub fn start(&mut self) {
        if !self.closed {
            self.scheduler.schedule_next();
        }
    }

    /// Renders one frame, advances the animation and arms the next frame
    pub fn frame(&mut self, renderer: &mut dyn FrameRenderer) -> FrameOutcome {
        if self.closed {
            return FrameOutcome::Closed;
        }

        self.environment.begin_stats();
        self.camera.update();
        renderer.render(FrameContext {
            scene: &mut self.scene,
            camera: &self.camera.camera.uniform,
            environment: self.environment.as_mut(),
            viewport: self.viewport,
        });

        let elapsed = self.clock.elapsed();
        self.house.tick(elapsed, &mut self.scene);
        self.environment.end_stats();
        self.frames += 1;

        self.scheduler.schedule_next();
        FrameOutcome::Rendered
    }

    /// Stops the frame loop and releases the environment; idempotent
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.environment.close();
        self.bindings.clear();
        log::info!("World closed after {} frames", self.frames);
    }

    /// Applies a new logical window size; zero sizes are ignored
    pub fn resize(&mut self, width: u32, height: u32, scale_factor: f64) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera.resize(width, height);
        self.viewport = Viewport {
            width,
            height,
            pixel_ratio: scale_factor.min(self.max_pixel_ratio),
        };
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Option<WorldAction> {
        if self.closed {
            return None;
        }
        let trigger = match event {
            InputEvent::KeyReleased(key) => Trigger::KeyReleased(key),
            InputEvent::PrimaryPressed => {
                if !self.double_click.press(self.clock.now()) {
                    return None;
                }
                Trigger::DoubleClick
            }
        };
        self.bindings.action_for(trigger)
    }

    pub fn camera_mut(&mut self) -> &mut CameraManager {
        &mut self.camera
    }

    pub fn camera(&self) -> &CameraManager {
        &self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn house(&self) -> &House {
        &self.house
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn environment_kind(&self) -> EnvironmentKind {
        self.environment.kind()
    }

    pub fn bindings(&self) -> &InputBindings {
        &self.bindings
    }

    pub fn moon(&self) -> NodeId {
        self.moon
    }

    pub fn ambient(&self) -> NodeId {
        self.ambient
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

fn create_camera(config: &WorldConfig, width: u32, height: u32) -> CameraManager {
    let settings = &config.camera;
    let camera = OrbitCamera::looking_at(
        Vector3::from(settings.eye),
        Vector3::new(0.0, 0.0, 0.0),
        width as f32 / height.max(1) as f32,
    )
    .with_fovy(Deg(settings.fovy_degrees))
    .with_clip_planes(settings.znear, settings.zfar)
    .with_bounds(OrbitCameraBounds::above_ground(
        settings.max_distance,
        settings.max_polar_angle,
    ))
    .with_damping(settings.damping);

    let mut manager = CameraManager::new(camera, CameraController::new(0.005, 0.1));
    manager.update();
    manager
}

/// Moon and ambient light, plus their panel folders
fn add_lights(
    config: &WorldConfig,
    scene: &mut Scene,
    environment: &mut dyn EnvironmentHandler,
) -> (NodeId, NodeId) {
    let root = scene.root();
    let lights = environment.add_folder("Lights");

    let shadow = LightShadow::default()
        .with_map_size(config.moon_shadow_map_size)
        .with_far(config.moon_shadow_far);
    let moon = scene.add_light(
        root,
        "moon",
        Light::directional([1.0; 3], config.moon_intensity).with_shadow(shadow),
    );
    if let Some(node) = scene.node_mut(moon) {
        node.transform = Transform {
            position: Vector3::from(config.moon_position),
            ..Transform::default()
        };
    }
    environment.add_directional_light_helper(scene, moon);

    let directional = environment.add_subfolder(lights, "Directional Light");
    environment.add_param(
        directional,
        Tunable::new("intensity", moon, NodeProperty::Intensity, 0.0, 1.0).with_step(TUNABLE_STEP),
    );
    for (label, property) in [
        ("x", NodeProperty::PositionX),
        ("y", NodeProperty::PositionY),
        ("z", NodeProperty::PositionZ),
    ] {
        environment.add_param(
            directional,
            Tunable::new(label, moon, property, -5.0, 5.0).with_step(TUNABLE_STEP),
        );
    }
    for (label, property) in [
        ("rotation x", NodeProperty::RotationX),
        ("rotation y", NodeProperty::RotationY),
        ("rotation z", NodeProperty::RotationZ),
    ] {
        environment.add_param(
            directional,
            Tunable::new(label, moon, property, -std::f32::consts::PI, std::f32::consts::PI)
                .with_step(TUNABLE_STEP),
        );
    }

    let ambient = scene.add_light(root, "ambient", Light::ambient([1.0; 3], config.ambient_intensity));
    let ambient_folder = environment.add_subfolder(lights, "Ambient Light");
    environment.add_param(
        ambient_folder,
        Tunable::new("intensity", ambient, NodeProperty::Intensity, 0.0, 1.0)
            .with_step(TUNABLE_STEP),
    );

    (moon, ambient)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{create_handler, DebugHandler};
    use rand::{rngs::StdRng, SeedableRng};
    use std::{cell::Cell, rc::Rc};

    #[derive(Clone, Default)]
    struct FakeTime(Rc<Cell<Duration>>);

    impl FakeTime {
        fn advance(&self, by: Duration) {
            self.0.set(self.0.get() + by);
        }
    }

    impl TimeSource for FakeTime {
        fn now(&self) -> Duration {
            self.0.get()
        }
    }

    #[derive(Clone, Default)]
    struct CountingScheduler(Rc<Cell<usize>>);

    impl FrameScheduler for CountingScheduler {
        fn schedule_next(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[derive(Default)]
    struct CountingRenderer {
        frames: usize,
        last_viewport: Option<Viewport>,
    }

    impl FrameRenderer for CountingRenderer {
        fn render(&mut self, frame: FrameContext<'_>) {
            self.frames += 1;
            self.last_viewport = Some(frame.viewport);
        }
    }

    fn world_with(
        kind: EnvironmentKind,
        config: WorldConfig,
    ) -> (World, FakeTime, CountingScheduler) {
        let time = FakeTime::default();
        let scheduler = CountingScheduler::default();
        let world = World::with_rng(
            config,
            create_handler(kind),
            Box::new(time.clone()),
            Box::new(scheduler.clone()),
            &mut StdRng::seed_from_u64(99),
        )
        .unwrap();
        (world, time, scheduler)
    }

    fn world() -> (World, FakeTime, CountingScheduler) {
        world_with(EnvironmentKind::Production, WorldConfig::default())
    }

    #[test]
    fn each_frame_arms_the_next() {
        let (mut world, _time, scheduler) = world();
        let mut renderer = CountingRenderer::default();

        world.start();
        assert_eq!(scheduler.0.get(), 1);
        for _ in 0..3 {
            assert_eq!(world.frame(&mut renderer), FrameOutcome::Rendered);
        }
        assert_eq!(renderer.frames, 3);
        assert_eq!(scheduler.0.get(), 4);
    }

    #[test]
    fn no_frames_after_close() {
        for frames_before_close in [0, 1, 5] {
            let (mut world, _time, scheduler) = world();
            let mut renderer = CountingRenderer::default();
            world.start();
            for _ in 0..frames_before_close {
                world.frame(&mut renderer);
            }
            let scheduled = scheduler.0.get();

            world.close();
            world.close();
            for _ in 0..3 {
                assert_eq!(world.frame(&mut renderer), FrameOutcome::Closed);
            }
            world.start();

            assert_eq!(renderer.frames, frames_before_close);
            assert_eq!(scheduler.0.get(), scheduled);
            assert!(world.bindings().is_empty());
        }
    }

    #[test]
    fn frame_animates_ghosts_from_the_clock() {
        let (mut world, time, _scheduler) = world();
        let mut renderer = CountingRenderer::default();

        world.frame(&mut renderer);
        for ghost in world.house().ghosts().ghosts() {
            let position = world.scene().world_position(ghost.node().unwrap());
            assert!((position.y - 1.0).abs() < 1e-6);
        }

        time.advance(Duration::from_millis(1500));
        world.frame(&mut renderer);
        let ghost = &world.house().ghosts().ghosts()[0];
        let expected = crate::house::orbit_position(ghost.phase, 1.5, 5.0);
        assert!((ghost.position - expected).x.abs() < 1e-5);
        assert!((ghost.position - expected).y.abs() < 1e-5);
    }

    #[test]
    fn resize_sets_aspect_and_viewport() {
        let (mut world, _time, _scheduler) = world();
        let mut renderer = CountingRenderer::default();

        world.resize(1600, 900, 3.0);
        assert!((world.camera().camera.aspect - 1600.0 / 900.0).abs() < 1e-6);
        assert_eq!(world.viewport().width, 1600);
        assert_eq!(world.viewport().height, 900);
        assert_eq!(world.viewport().pixel_ratio, 2.0);
        assert_eq!(world.viewport().render_size(), (3200, 1800));

        world.resize(0, 500, 1.0);
        assert_eq!(world.viewport().width, 1600);

        world.frame(&mut renderer);
        assert_eq!(renderer.last_viewport, Some(world.viewport()));
    }

    #[test]
    fn key_f_and_double_click_toggle_fullscreen() {
        let (mut world, time, _scheduler) = world();

        assert_eq!(
            world.handle_input(InputEvent::KeyReleased(Key::F)),
            Some(WorldAction::ToggleFullscreen)
        );
        assert_eq!(world.handle_input(InputEvent::KeyReleased(Key::Other)), None);
        assert_eq!(
            world.handle_input(InputEvent::KeyReleased(Key::Escape)),
            Some(WorldAction::Exit)
        );

        assert_eq!(world.handle_input(InputEvent::PrimaryPressed), None);
        time.advance(Duration::from_millis(200));
        assert_eq!(
            world.handle_input(InputEvent::PrimaryPressed),
            Some(WorldAction::ToggleFullscreen)
        );

        time.advance(Duration::from_millis(100));
        assert_eq!(world.handle_input(InputEvent::PrimaryPressed), None);
        time.advance(Duration::from_millis(900));
        assert_eq!(world.handle_input(InputEvent::PrimaryPressed), None);

        world.close();
        assert_eq!(world.handle_input(InputEvent::KeyReleased(Key::F)), None);
    }

    #[test]
    fn double_click_window_is_inclusive() {
        let mut detector = DoubleClickDetector::new(Duration::from_millis(400));
        assert!(!detector.press(Duration::from_millis(1000)));
        assert!(detector.press(Duration::from_millis(1400)));
        assert!(!detector.press(Duration::from_millis(1500)));
        assert!(!detector.press(Duration::from_millis(2000)));
    }

    #[test]
    fn camera_starts_at_the_configured_eye() {
        let (world, _time, _scheduler) = world();
        let eye = world.camera().camera.eye;
        assert!((eye - Vector3::new(6.0, 3.0, 6.0)).x.abs() < 1e-4);
        assert!((eye - Vector3::new(6.0, 3.0, 6.0)).y.abs() < 1e-4);
        assert!((eye - Vector3::new(6.0, 3.0, 6.0)).z.abs() < 1e-4);
    }

    #[test]
    fn scene_has_fog_and_lights() {
        let (world, _time, _scheduler) = world();
        let scene = world.scene();
        let fog = scene.fog.unwrap();
        assert_eq!(fog.density, 0.05);
        assert_eq!(scene.background, fog.color);
        assert_eq!(
            scene.node(world.moon()).unwrap().property(NodeProperty::Intensity),
            Some(0.12)
        );
        assert_eq!(scene.world_position(world.moon()), Vector3::new(4.0, 4.0, 4.0));
        assert!(scene.node(world.ambient()).unwrap().as_light().is_some());

        let caster = scene.shadow_light().unwrap();
        assert_eq!(caster.node, world.moon());
        let shadow = caster.light.shadow.unwrap();
        assert_eq!((shadow.map_size, shadow.far), (256, 14.0));
    }

    #[test]
    fn debug_world_adds_helpers_only() {
        let (debug, _, _) = world_with(EnvironmentKind::Debug, WorldConfig::default());
        let (production, _, _) = world_with(EnvironmentKind::Production, WorldConfig::default());

        assert_eq!(debug.environment_kind(), EnvironmentKind::Debug);
        // axes, moon and door light helpers
        assert_eq!(debug.scene().helpers().len(), 3);
        assert!(production.scene().helpers().is_empty());
        assert_eq!(
            debug.scene().node_count() - 3,
            production.scene().node_count()
        );
        assert_eq!(
            debug.house().anchors(debug.scene()),
            production.house().anchors(production.scene())
        );
    }

    #[test]
    fn debug_panel_tracks_the_lights() {
        let mut handler = DebugHandler::new();
        let mut scene = Scene::new();
        add_lights(&WorldConfig::default(), &mut scene, &mut handler);
        assert_eq!(handler.panel().folder_count(), 3);
        assert_eq!(handler.panel().param_count(), 8);
    }
}
