use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4};

use crate::gfx::{
    geometry::{Aabb, GeometryData},
    resources::material::{Material, MaterialId, MaterialManager},
};

use super::{
    helpers::Helper,
    light::{Light, LightKind},
    node::{GeometryId, MeshNode, Node, NodeId, NodeKind},
};

/// Errors raised by tree edits that would break the single-parent invariant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("node {0:?} does not belong to this scene")]
    UnknownNode(NodeId),
    #[error("node {0:?} already has a parent")]
    AlreadyAttached(NodeId),
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("the root node cannot be re-parented")]
    RootNode,
}

/// Exponential-squared fog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: [f32; 3],
    pub density: f32,
}

/// A mesh node resolved to its world matrix, ready to draw
#[derive(Debug, Clone)]
pub struct MeshInstance<'a> {
    pub node: NodeId,
    pub geometry: GeometryId,
    pub material: &'a MaterialId,
    pub world: Matrix4<f32>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

/// A light resolved to world space
#[derive(Debug, Clone, Copy)]
pub struct LightInstance {
    pub node: NodeId,
    pub light: Light,
    pub position: Vector3<f32>,
}

impl LightInstance {
    /// Direction the light travels; directional lights aim at the world origin
    pub fn direction(&self) -> Vector3<f32> {
        if self.position.magnitude2() > 0.0 {
            -self.position.normalize()
        } else {
            Vector3::new(0.0, -1.0, 0.0)
        }
    }
}

/// Scene graph: an arena-backed tree of nodes under a single root, plus the
/// shared geometry and materials those nodes reference.
///
/// Nodes are never removed, so every [`NodeId`] handed out stays valid for
/// the scene's lifetime.
pub struct Scene {
    nodes: Vec<Node>,
    root: NodeId,
    geometries: Vec<GeometryData>,
    pub material_manager: MaterialManager,
    pub fog: Option<Fog>,
    pub background: [f32; 3],
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new("root", NodeKind::Group)],
            root: NodeId(0),
            geometries: Vec::new(),
            material_manager: MaterialManager::new(),
            fog: None,
            background: [0.0, 0.0, 0.0],
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // Geometry and materials

    /// Registers geometry so several meshes can share it
    pub fn add_geometry(&mut self, geometry: GeometryData) -> GeometryId {
        self.geometries.push(geometry);
        GeometryId(self.geometries.len() - 1)
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&GeometryData> {
        self.geometries.get(id.0)
    }

    pub fn geometries(&self) -> &[GeometryData] {
        &self.geometries
    }

    pub fn bounding_box(&self, id: GeometryId) -> Option<Aabb> {
        self.geometry(id).map(GeometryData::bounding_box)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = material.name.clone();
        self.material_manager.add_material(material);
        id
    }

    // Node creation

    fn push_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn push_child(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> NodeId {
        let id = self.push_node(Node::new(name, kind));
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Creates a node with no parent; it is not rendered until attached
    pub fn create_detached(&mut self, name: &str, kind: NodeKind) -> NodeId {
        self.push_node(Node::new(name, kind))
    }

    /// Adds an empty group under `parent`
    pub fn add_group(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.push_child(parent, name, NodeKind::Group)
    }

    pub fn add_mesh(
        &mut self,
        parent: NodeId,
        name: &str,
        geometry: GeometryId,
        material: &str,
    ) -> NodeId {
        self.push_child(
            parent,
            name,
            NodeKind::Mesh(MeshNode {
                geometry,
                material: material.to_string(),
                cast_shadow: false,
                receive_shadow: false,
            }),
        )
    }

    /// Sets a mesh's shadow flags; returns false if `id` is not a mesh
    pub fn set_shadows(&mut self, id: NodeId, cast: bool, receive: bool) -> bool {
        match self.nodes.get_mut(id.0).map(|node| &mut node.kind) {
            Some(NodeKind::Mesh(mesh)) => {
                mesh.cast_shadow = cast;
                mesh.receive_shadow = receive;
                true
            }
            _ => false,
        }
    }

    pub fn add_light(&mut self, parent: NodeId, name: &str, light: Light) -> NodeId {
        self.push_child(parent, name, NodeKind::Light(light))
    }

    pub fn add_helper(&mut self, parent: NodeId, name: &str, helper: Helper) -> NodeId {
        self.push_child(parent, name, NodeKind::Helper(helper))
    }

    // Tree edits

    fn check(&self, id: NodeId) -> Result<(), SceneError> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(SceneError::UnknownNode(id))
        }
    }

    /// Attaches a parentless node under `parent`
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.check(parent)?;
        self.check(child)?;
        if child == self.root {
            return Err(SceneError::RootNode);
        }
        if self.nodes[child.0].parent.is_some() {
            return Err(SceneError::AlreadyAttached(child));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }

        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    /// Removes a node (and its subtree) from its parent
    pub fn detach(&mut self, child: NodeId) -> Result<(), SceneError> {
        self.check(child)?;
        if child == self.root {
            return Err(SceneError::RootNode);
        }
        if let Some(parent) = self.nodes[child.0].parent.take() {
            self.nodes[parent.0].children.retain(|id| *id != child);
        }
        Ok(())
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == candidate {
                return true;
            }
            match self.nodes[node.0].parent {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// Deep-copies the subtree rooted at `source` and attaches the copy under
    /// `parent`. Geometry and materials stay shared.
    pub fn clone_subtree(&mut self, source: NodeId, parent: NodeId) -> Result<NodeId, SceneError> {
        self.check(source)?;
        self.check(parent)?;
        let copy = self.copy_detached(source);
        self.attach(parent, copy)?;
        Ok(copy)
    }

    fn copy_detached(&mut self, source: NodeId) -> NodeId {
        let original = &self.nodes[source.0];
        let mut node = Node::new(&original.name, original.kind.clone());
        node.transform = original.transform;
        node.visible = original.visible;
        let children = original.children.clone();

        let copy = self.push_node(node);
        for child in children {
            let child_copy = self.copy_detached(child);
            self.nodes[child_copy.0].parent = Some(copy);
            self.nodes[copy.0].children.push(child_copy);
        }
        copy
    }

    // Queries

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(NodeId)
    }

    /// All nodes below `id`, depth first, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let Some(node) = self.node(id) else {
            return result;
        };
        let mut stack: Vec<NodeId> = node.children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            result.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev().copied());
        }
        result
    }

    /// Composes local transforms from the root down to `id`
    pub fn world_matrix(&self, id: NodeId) -> Matrix4<f32> {
        let mut matrix = Matrix4::identity();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.node(node_id) else {
                break;
            };
            matrix = node.transform.matrix() * matrix;
            current = node.parent;
        }
        matrix
    }

    pub fn world_position(&self, id: NodeId) -> Vector3<f32> {
        (self.world_matrix(id) * Vector4::new(0.0, 0.0, 0.0, 1.0)).truncate()
    }

    /// Visits every visible node reachable from the root with its world matrix
    pub fn walk<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(NodeId, &'a Node, &Matrix4<f32>),
    {
        let mut stack = vec![(self.root, Matrix4::<f32>::identity())];
        while let Some((id, parent_matrix)) = stack.pop() {
            let node = &self.nodes[id.0];
            if !node.visible {
                continue;
            }
            let world = parent_matrix * node.transform.matrix();
            visit(id, node, &world);
            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }
    }

    pub fn mesh_instances(&self) -> Vec<MeshInstance<'_>> {
        let mut instances = Vec::new();
        self.walk(|id, node, world| {
            if let NodeKind::Mesh(mesh) = &node.kind {
                instances.push(MeshInstance {
                    node: id,
                    geometry: mesh.geometry,
                    material: &mesh.material,
                    world: *world,
                    cast_shadow: mesh.cast_shadow,
                    receive_shadow: mesh.receive_shadow,
                });
            }
        });
        instances
    }

    pub fn light_instances(&self) -> Vec<LightInstance> {
        let mut lights = Vec::new();
        self.walk(|id, node, world| {
            if let NodeKind::Light(light) = &node.kind {
                lights.push(LightInstance {
                    node: id,
                    light: *light,
                    position: (world * Vector4::new(0.0, 0.0, 0.0, 1.0)).truncate(),
                });
            }
        });
        lights
    }

    /// The first reachable directional light with shadow settings
    pub fn shadow_light(&self) -> Option<LightInstance> {
        self.light_instances().into_iter().find(|instance| {
            instance.light.kind == LightKind::Directional && instance.light.shadow.is_some()
        })
    }

    pub fn point_lights(&self) -> Vec<LightInstance> {
        self.light_instances()
            .into_iter()
            .filter(|instance| matches!(instance.light.kind, LightKind::Point { .. }))
            .collect()
    }

    /// Reachable visible helpers with their world matrices
    pub fn helpers(&self) -> Vec<(Helper, Matrix4<f32>)> {
        let mut helpers = Vec::new();
        self.walk(|_, node, world| {
            if let NodeKind::Helper(helper) = &node.kind {
                helpers.push((*helper, *world));
            }
        });
        helpers
    }

    /// Gets statistics about the scene
    pub fn get_statistics(&self) -> SceneStatistics {
        let instances = self.mesh_instances();
        let total_triangles = instances
            .iter()
            .filter_map(|instance| self.geometry(instance.geometry))
            .map(|geometry| geometry.triangle_count())
            .sum();

        SceneStatistics {
            node_count: self.nodes.len(),
            mesh_count: instances.len(),
            light_count: self.light_instances().len(),
            material_count: self.material_manager.list_materials().len(),
            total_triangles,
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

/// Scene statistics for debugging and UI display
#[derive(Debug)]
pub struct SceneStatistics {
    pub node_count: usize,
    pub mesh_count: usize,
    pub light_count: usize,
    pub material_count: usize,
    pub total_triangles: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_box;
    use crate::gfx::scene::{light::LightShadow, node::Transform};

    #[test]
    fn children_have_exactly_one_parent() {
        let mut scene = Scene::new();
        let root = scene.root();
        let house = scene.add_group(root, "house");
        let lamp = scene.create_detached("lamp", NodeKind::Group);

        assert_eq!(scene.attach(house, lamp), Ok(()));
        assert_eq!(scene.attach(root, lamp), Err(SceneError::AlreadyAttached(lamp)));
        assert_eq!(scene.node(lamp).and_then(|n| n.parent()), Some(house));
        assert_eq!(scene.node(house).map(|n| n.children().len()), Some(1));
    }

    #[test]
    fn cycles_and_root_moves_are_rejected() {
        let mut scene = Scene::new();
        let root = scene.root();
        let outer = scene.add_group(root, "outer");
        let inner = scene.add_group(outer, "inner");

        scene.detach(outer).unwrap();
        assert_eq!(
            scene.attach(inner, outer),
            Err(SceneError::Cycle {
                parent: inner,
                child: outer
            })
        );
        assert_eq!(scene.attach(outer, root), Err(SceneError::RootNode));
        assert_eq!(scene.attach(outer, outer), Err(SceneError::Cycle { parent: outer, child: outer }));
    }

    #[test]
    fn world_matrix_composes_parents() {
        let mut scene = Scene::new();
        let root = scene.root();
        let group = scene.add_group(root, "group");
        scene.node_mut(group).unwrap().transform = Transform::from_position(1.0, 2.0, 3.0);
        let child = scene.add_group(group, "child");
        scene.node_mut(child).unwrap().transform = Transform::from_position(0.5, 0.0, 0.0);

        let position = scene.world_position(child);
        assert!((position - Vector3::new(1.5, 2.0, 3.0)).magnitude() < 1e-6);
    }

    #[test]
    fn clone_subtree_copies_structure_and_shares_geometry() {
        let mut scene = Scene::new();
        let root = scene.root();
        let geometry = scene.add_geometry(generate_box(1.0, 1.0, 1.0));
        let cluster = scene.add_group(root, "bushes");
        scene.add_mesh(cluster, "bush", geometry, "Default");
        scene.add_mesh(cluster, "bush", geometry, "Default");

        let copy = scene.clone_subtree(cluster, root).unwrap();
        assert_ne!(copy, cluster);
        assert_eq!(scene.descendants(copy).len(), 2);
        assert_eq!(scene.mesh_instances().len(), 4);
        assert_eq!(scene.geometries().len(), 1);
    }

    #[test]
    fn mesh_instances_borrow_materials_and_carry_shadow_flags() {
        let mut scene = Scene::new();
        let root = scene.root();
        let geometry = scene.add_geometry(generate_box(1.0, 1.0, 1.0));
        let walls = scene.add_mesh(root, "walls", geometry, "Bricks");
        let floor = scene.add_mesh(root, "floor", geometry, "Grass");
        let group = scene.add_group(root, "group");
        assert!(scene.set_shadows(walls, true, false));
        assert!(scene.set_shadows(floor, false, true));
        assert!(!scene.set_shadows(group, true, true));

        let instances = scene.mesh_instances();
        let materials: Vec<&str> = instances.iter().map(|i| i.material.as_str()).collect();
        assert_eq!(materials, ["Bricks", "Grass"]);
        assert!(instances[0].cast_shadow && !instances[0].receive_shadow);
        assert!(!instances[1].cast_shadow && instances[1].receive_shadow);
    }

    #[test]
    fn shadow_light_is_the_first_shadowed_directional() {
        let mut scene = Scene::new();
        let root = scene.root();
        scene.add_light(root, "plain", Light::directional([1.0; 3], 1.0));
        scene.add_light(root, "lamp", Light::point([1.0; 3], 1.0, 5.0).with_shadow(LightShadow::default()));
        assert!(scene.shadow_light().is_none());

        let moon = scene.add_light(
            root,
            "moon",
            Light::directional([1.0; 3], 0.12).with_shadow(LightShadow::default().with_far(14.0)),
        );
        assert_eq!(scene.shadow_light().map(|light| light.node), Some(moon));
        scene.node_mut(moon).unwrap().visible = false;
        assert!(scene.shadow_light().is_none());
    }

    #[test]
    fn hidden_and_detached_nodes_are_not_walked() {
        let mut scene = Scene::new();
        let root = scene.root();
        let geometry = scene.add_geometry(generate_box(1.0, 1.0, 1.0));
        let hidden = scene.add_group(root, "hidden");
        scene.add_mesh(hidden, "a", geometry, "Default");
        scene.node_mut(hidden).unwrap().visible = false;
        let loose = scene.create_detached("b", NodeKind::Group);
        scene.add_mesh(loose, "c", geometry, "Default");

        assert!(scene.mesh_instances().is_empty());
    }

    #[test]
    fn lights_resolve_to_world_positions() {
        let mut scene = Scene::new();
        let root = scene.root();
        let group = scene.add_group(root, "group");
        scene.node_mut(group).unwrap().transform = Transform::from_position(0.0, 1.0, 0.0);
        let lamp = scene.add_light(group, "lamp", Light::point([1.0; 3], 2.0, 7.0));
        scene.node_mut(lamp).unwrap().transform = Transform::from_position(0.0, 2.5, 2.2);

        let lights = scene.point_lights();
        assert_eq!(lights.len(), 1);
        assert!((lights[0].position - Vector3::new(0.0, 3.5, 2.2)).magnitude() < 1e-6);
    }
}
