//! Debug environment: live parameter panel, frame statistics and helpers

use cgmath::Vector3;

use super::{EnvironmentHandler, EnvironmentKind, FolderId, ParamPanel, Tunable};
use crate::{
    gfx::scene::{Helper, NodeId, Scene},
    performance::PerformanceMonitor,
};

pub const AXES_SIZE: f32 = 1.0;
pub const AXES_POSITION: [f32; 3] = [-8.0, 1.0, -8.0];
pub const LIGHT_HELPER_SIZE: f32 = 0.5;

pub struct DebugHandler {
    panel: ParamPanel,
    monitor: PerformanceMonitor,
    closed: bool,
}

impl DebugHandler {
    pub fn new() -> Self {
        Self {
            panel: ParamPanel::new("Debug"),
            monitor: PerformanceMonitor::new(),
            closed: false,
        }
    }

    pub fn panel(&self) -> &ParamPanel {
        &self.panel
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }
}

impl Default for DebugHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentHandler for DebugHandler {
    fn kind(&self) -> EnvironmentKind {
        EnvironmentKind::Debug
    }

    fn add_folder(&mut self, name: &str) -> FolderId {
        self.panel.add_folder(name)
    }

    fn add_subfolder(&mut self, parent: FolderId, name: &str) -> FolderId {
        self.panel.add_subfolder(parent, name)
    }

    fn add_param(&mut self, folder: FolderId, tunable: Tunable) {
        self.panel.add_param(folder, tunable);
    }

    fn begin_stats(&mut self) {
        if !self.closed {
            self.monitor.begin_frame();
        }
    }

    fn end_stats(&mut self) {
        if !self.closed {
            self.monitor.end_frame();
        }
    }

    fn record_render_stats(&mut self, draw_calls: u32, vertex_count: u32) {
        self.monitor.update_render_stats(draw_calls, vertex_count);
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.panel.clear();
        self.monitor.reset();
        log::debug!("Debug environment closed");
    }

    fn add_axis_helper(&mut self, scene: &mut Scene) -> Option<NodeId> {
        let root = scene.root();
        let axes = scene.add_helper(root, "axes helper", Helper::Axes { size: AXES_SIZE });
        if let Some(node) = scene.node_mut(axes) {
            node.transform.position = Vector3::from(AXES_POSITION);
        }
        Some(axes)
    }

    fn add_directional_light_helper(
        &mut self,
        scene: &mut Scene,
        light: NodeId,
    ) -> Option<NodeId> {
        let root = scene.root();
        Some(scene.add_helper(
            root,
            "directional light helper",
            Helper::DirectionalLight {
                light,
                size: LIGHT_HELPER_SIZE,
            },
        ))
    }

    fn add_point_light_helper(
        &mut self,
        scene: &mut Scene,
        group: NodeId,
        light: NodeId,
    ) -> Option<NodeId> {
        Some(scene.add_helper(
            group,
            "point light helper",
            Helper::PointLight {
                light,
                size: LIGHT_HELPER_SIZE,
            },
        ))
    }

    fn has_ui(&self) -> bool {
        true
    }

    fn draw_ui(&mut self, ui: &imgui::Ui, scene: &mut Scene) {
        if self.closed {
            return;
        }
        self.monitor.render_overlay(ui);
        self.panel.draw(ui, scene);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::{helper_lines, Light, NodeProperty};

    #[test]
    fn helpers_are_attached_to_the_scene() {
        let mut scene = Scene::new();
        let root = scene.root();
        let house = scene.add_group(root, "house");
        let lamp = scene.add_light(house, "lamp", Light::point([1.0; 3], 2.0, 7.0));
        let moon = scene.add_light(root, "moon", Light::directional([1.0; 3], 0.12));

        let mut handler = DebugHandler::new();
        let axes = handler.add_axis_helper(&mut scene).unwrap();
        let point = handler.add_point_light_helper(&mut scene, house, lamp).unwrap();
        handler.add_directional_light_helper(&mut scene, moon).unwrap();

        assert_eq!(scene.helpers().len(), 3);
        assert_eq!(scene.node(point).unwrap().parent(), Some(house));
        assert_eq!(scene.world_position(axes), Vector3::new(-8.0, 1.0, -8.0));
        assert!(!helper_lines(&scene).is_empty());
    }

    #[test]
    fn stats_bracket_counts_frames() {
        let mut handler = DebugHandler::new();
        for _ in 0..3 {
            handler.begin_stats();
            handler.end_stats();
        }
        assert_eq!(handler.monitor().frames_recorded(), 3);
    }

    #[test]
    fn close_is_idempotent_and_releases_panel() {
        let mut scene = Scene::new();
        let root = scene.root();
        let moon = scene.add_light(root, "moon", Light::directional([1.0; 3], 0.12));

        let mut handler = DebugHandler::new();
        let lights = handler.add_folder("Lights");
        handler.add_param(
            lights,
            Tunable::new("intensity", moon, NodeProperty::Intensity, 0.0, 1.0),
        );
        assert_eq!(handler.panel().param_count(), 1);

        handler.close();
        handler.close();
        assert_eq!(handler.panel().folder_count(), 0);

        handler.begin_stats();
        handler.end_stats();
        assert_eq!(handler.monitor().frames_recorded(), 0);
    }
}
