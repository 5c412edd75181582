// src/environment/panel.rs
//! Parameter panel for live tuning of scene nodes
//!
//! Folders group tunables; each tunable is a slider bound to one numeric
//! property of a scene node. A hidden panel accepts registrations but never
//! draws.

use crate::gfx::scene::{NodeId, NodeProperty, Scene};

/// Handle to a folder inside a [`ParamPanel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FolderId(usize);

/// A numeric field bound to a scene node property
#[derive(Debug, Clone, PartialEq)]
pub struct Tunable {
    pub label: String,
    pub node: NodeId,
    pub property: NodeProperty,
    pub min: f32,
    pub max: f32,
    /// Slider granularity; 0 means continuous
    pub step: f32,
}

impl Tunable {
    pub fn new(label: &str, node: NodeId, property: NodeProperty, min: f32, max: f32) -> Self {
        Self {
            label: label.to_string(),
            node,
            property,
            min,
            max,
            step: 0.0,
        }
    }

    pub fn with_step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    /// Clamps into range and snaps to the step grid
    pub fn quantize(&self, value: f32) -> f32 {
        let mut value = value.clamp(self.min, self.max);
        if self.step > 0.0 {
            value = self.min + ((value - self.min) / self.step).round() * self.step;
            value = value.min(self.max);
        }
        value
    }
}

#[derive(Debug, Clone)]
struct Folder {
    name: String,
    parent: Option<FolderId>,
    children: Vec<FolderId>,
    params: Vec<Tunable>,
}

/// Collapsible folders of sliders drawn in one imgui window
#[derive(Debug, Clone)]
pub struct ParamPanel {
    title: String,
    visible: bool,
    folders: Vec<Folder>,
}

impl ParamPanel {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            visible: true,
            folders: Vec::new(),
        }
    }

    /// A panel that keeps registrations but is never shown
    pub fn hidden(title: &str) -> Self {
        Self {
            visible: false,
            ..Self::new(title)
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn add_folder(&mut self, name: &str) -> FolderId {
        self.push_folder(name, None)
    }

    /// Adds a folder nested in `parent`; an unknown parent makes it top-level
    pub fn add_subfolder(&mut self, parent: FolderId, name: &str) -> FolderId {
        if parent.0 >= self.folders.len() {
            log::warn!("Unknown parent folder for '{}', adding at top level", name);
            return self.push_folder(name, None);
        }
        let id = self.push_folder(name, Some(parent));
        self.folders[parent.0].children.push(id);
        id
    }

    fn push_folder(&mut self, name: &str, parent: Option<FolderId>) -> FolderId {
        self.folders.push(Folder {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            params: Vec::new(),
        });
        FolderId(self.folders.len() - 1)
    }

    pub fn add_param(&mut self, folder: FolderId, tunable: Tunable) {
        match self.folders.get_mut(folder.0) {
            Some(folder) => folder.params.push(tunable),
            None => log::warn!("Dropping tunable '{}': unknown folder", tunable.label),
        }
    }

    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    pub fn param_count(&self) -> usize {
        self.folders.iter().map(|folder| folder.params.len()).sum()
    }

    pub fn folder_name(&self, id: FolderId) -> Option<&str> {
        self.folders.get(id.0).map(|folder| folder.name.as_str())
    }

    pub fn folder_parent(&self, id: FolderId) -> Option<FolderId> {
        self.folders.get(id.0).and_then(|folder| folder.parent)
    }

    pub fn params(&self, id: FolderId) -> &[Tunable] {
        self.folders
            .get(id.0)
            .map(|folder| folder.params.as_slice())
            .unwrap_or(&[])
    }

    /// Writes a value through a tunable into its node, clamped and snapped
    pub fn apply(tunable: &Tunable, scene: &mut Scene, value: f32) -> bool {
        let value = tunable.quantize(value);
        scene
            .node_mut(tunable.node)
            .map_or(false, |node| node.set_property(tunable.property, value))
    }

    /// Releases every registration
    pub fn clear(&mut self) {
        self.folders.clear();
    }

    pub fn draw(&self, ui: &imgui::Ui, scene: &mut Scene) {
        if !self.visible || self.folders.is_empty() {
            return;
        }

        let display_size = ui.io().display_size;
        if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
            return;
        }

        ui.window(&self.title)
            .size([320.0, 0.0], imgui::Condition::FirstUseEver)
            .position([display_size[0] - 330.0, 10.0], imgui::Condition::FirstUseEver)
            .collapsible(true)
            .build(|| {
                for (index, folder) in self.folders.iter().enumerate() {
                    if folder.parent.is_none() {
                        self.draw_folder(ui, scene, FolderId(index));
                    }
                }
            });
    }

    fn draw_folder(&self, ui: &imgui::Ui, scene: &mut Scene, id: FolderId) {
        let folder = &self.folders[id.0];
        let _id = ui.push_id_usize(id.0);
        let Some(_node) = ui
            .tree_node_config(&folder.name)
            .flags(imgui::TreeNodeFlags::DEFAULT_OPEN)
            .push()
        else {
            return;
        };

        for tunable in &folder.params {
            let Some(mut value) = scene
                .node(tunable.node)
                .and_then(|node| node.property(tunable.property))
            else {
                continue;
            };
            if ui.slider(&tunable.label, tunable.min, tunable.max, &mut value) {
                Self::apply(tunable, scene, value);
            }
        }

        for child in &folder.children {
            self.draw_folder(ui, scene, *child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::Light;

    #[test]
    fn folders_nest_and_hold_params() {
        let mut scene = Scene::new();
        let root = scene.root();
        let moon = scene.add_light(root, "moon", Light::directional([1.0; 3], 0.12));

        let mut panel = ParamPanel::new("Debug");
        let lights = panel.add_folder("Lights");
        let directional = panel.add_subfolder(lights, "Directional Light");
        panel.add_param(
            directional,
            Tunable::new("intensity", moon, NodeProperty::Intensity, 0.0, 1.0).with_step(0.01),
        );

        assert_eq!(panel.folder_count(), 2);
        assert_eq!(panel.param_count(), 1);
        assert_eq!(panel.folder_parent(directional), Some(lights));
        assert_eq!(panel.folder_name(directional), Some("Directional Light"));
        assert_eq!(panel.params(directional)[0].label, "intensity");
    }

    #[test]
    fn unknown_folders_are_tolerated() {
        let mut scene = Scene::new();
        let root = scene.root();
        let mut panel = ParamPanel::hidden("Debug");
        let stray = FolderId(7);

        panel.add_param(stray, Tunable::new("x", root, NodeProperty::PositionX, -5.0, 5.0));
        assert_eq!(panel.param_count(), 0);

        let orphan = panel.add_subfolder(stray, "orphan");
        assert_eq!(panel.folder_parent(orphan), None);
        assert!(!panel.is_visible());
    }

    #[test]
    fn apply_clamps_and_snaps() {
        let mut scene = Scene::new();
        let root = scene.root();
        let moon = scene.add_light(root, "moon", Light::directional([1.0; 3], 0.12));
        let tunable =
            Tunable::new("intensity", moon, NodeProperty::Intensity, 0.0, 1.0).with_step(0.25);

        assert!(ParamPanel::apply(&tunable, &mut scene, 0.6));
        assert_eq!(scene.node(moon).unwrap().property(NodeProperty::Intensity), Some(0.5));

        assert!(ParamPanel::apply(&tunable, &mut scene, 3.0));
        assert_eq!(scene.node(moon).unwrap().property(NodeProperty::Intensity), Some(1.0));
    }
}
