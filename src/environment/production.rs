//! Production environment: registrations are accepted and never shown

use super::{EnvironmentHandler, EnvironmentKind, FolderId, ParamPanel, Tunable};
use crate::gfx::scene::{NodeId, Scene};

pub struct ProductionHandler {
    panel: ParamPanel,
}

impl ProductionHandler {
    pub fn new() -> Self {
        Self {
            panel: ParamPanel::hidden("Debug"),
        }
    }
}

impl Default for ProductionHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentHandler for ProductionHandler {
    fn kind(&self) -> EnvironmentKind {
        EnvironmentKind::Production
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

    fn begin_stats(&mut self) {}

    fn end_stats(&mut self) {}

    fn close(&mut self) {
        self.panel.clear();
    }

    fn add_axis_helper(&mut self, _scene: &mut Scene) -> Option<NodeId> {
        None
    }

    fn add_directional_light_helper(
        &mut self,
        _scene: &mut Scene,
        _light: NodeId,
    ) -> Option<NodeId> {
        None
    }

    fn add_point_light_helper(
        &mut self,
        _scene: &mut Scene,
        _group: NodeId,
        _light: NodeId,
    ) -> Option<NodeId> {
        None
    }

    fn has_ui(&self) -> bool {
        false
    }

    fn draw_ui(&mut self, _ui: &imgui::Ui, _scene: &mut Scene) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_are_never_attached() {
        let mut scene = Scene::new();
        let root = scene.root();
        let before = scene.node_count();

        let mut handler = ProductionHandler::new();
        assert_eq!(handler.add_axis_helper(&mut scene), None);
        assert_eq!(handler.add_directional_light_helper(&mut scene, root), None);
        assert_eq!(handler.add_point_light_helper(&mut scene, root, root), None);
        assert_eq!(scene.node_count(), before);

        let folder = handler.add_folder("Lights");
        handler.add_subfolder(folder, "Ambient Light");
        handler.close();
        handler.close();
    }
}
