//! Scene graph nodes
//!
//! A node is a named transform with an optional payload (mesh, light or debug
//! helper). Parent/child links are maintained by [`Scene`](super::Scene).

use cgmath::{Matrix4, Rad, Vector3};

use super::{helpers::Helper, light::Light};
use crate::gfx::resources::material::MaterialId;

/// Handle to a node inside one [`Scene`](super::Scene)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(super) usize);

/// Handle to shared geometry registered with a [`Scene`](super::Scene)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub(super) usize);

impl GeometryId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Local transform: translation, XYZ Euler rotation (radians) and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_position(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Vector3::new(x, y, z);
        self
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vector3::new(scale, scale, scale);
        self
    }

    /// Local matrix, T * Rx * Ry * Rz * S
    pub fn matrix(&self) -> Matrix4<f32> {
        let t = Matrix4::from_translation(self.position);
        let r = Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_z(Rad(self.rotation.z));
        let s = Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);
        t * r * s
    }
}

/// A drawable mesh: shared geometry plus a named material
#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    pub geometry: GeometryId,
    pub material: MaterialId,
    /// Drawn into shadow maps
    pub cast_shadow: bool,
    /// Darkened where a shadow map says it is occluded
    pub receive_shadow: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh(MeshNode),
    Light(Light),
    Helper(Helper),
}

pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    pub kind: NodeKind,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
}

impl Node {
    pub(super) fn new(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            transform: Transform::default(),
            visible: true,
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn as_light(&self) -> Option<&Light> {
        match &self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh(_))
    }

    pub fn is_helper(&self) -> bool {
        matches!(self.kind, NodeKind::Helper(_))
    }
}

/// Numeric node property that a tuning panel can bind to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeProperty {
    Intensity,
    PositionX,
    PositionY,
    PositionZ,
    RotationX,
    RotationY,
    RotationZ,
}

impl Node {
    pub fn property(&self, property: NodeProperty) -> Option<f32> {
        let t = &self.transform;
        match property {
            NodeProperty::Intensity => self.as_light().map(|light| light.intensity),
            NodeProperty::PositionX => Some(t.position.x),
            NodeProperty::PositionY => Some(t.position.y),
            NodeProperty::PositionZ => Some(t.position.z),
            NodeProperty::RotationX => Some(t.rotation.x),
            NodeProperty::RotationY => Some(t.rotation.y),
            NodeProperty::RotationZ => Some(t.rotation.z),
        }
    }

    /// Writes a property; returns false when the node has no such property
    pub fn set_property(&mut self, property: NodeProperty, value: f32) -> bool {
        let t = &mut self.transform;
        match property {
            NodeProperty::Intensity => match &mut self.kind {
                NodeKind::Light(light) => {
                    light.intensity = value;
                    true
                }
                _ => false,
            },
            NodeProperty::PositionX => {
                t.position.x = value;
                true
            }
            NodeProperty::PositionY => {
                t.position.y = value;
                true
            }
            NodeProperty::PositionZ => {
                t.position.z = value;
                true
            }
            NodeProperty::RotationX => {
                t.rotation.x = value;
                true
            }
            NodeProperty::RotationY => {
                t.rotation.y = value;
                true
            }
            NodeProperty::RotationZ => {
                t.rotation.z = value;
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector4};
    use std::f32::consts::PI;

    #[test]
    fn transform_applies_scale_then_rotation_then_translation() {
        let transform = Transform::from_position(1.0, 0.0, 0.0)
            .with_rotation(0.0, PI / 2.0, 0.0)
            .with_uniform_scale(2.0);

        let p = transform.matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        // scale to (2,0,0), rotate about Y to (0,0,-2), translate to (1,0,-2)
        assert!((p.truncate() - Vector3::new(1.0, 0.0, -2.0)).magnitude() < 1e-5);
    }

    #[test]
    fn intensity_only_on_lights() {
        let mut group = Node::new("group", NodeKind::Group);
        assert_eq!(group.property(NodeProperty::Intensity), None);
        assert!(!group.set_property(NodeProperty::Intensity, 1.0));
        assert!(group.set_property(NodeProperty::PositionY, 3.0));
        assert_eq!(group.property(NodeProperty::PositionY), Some(3.0));

        let mut light = Node::new("moon", NodeKind::Light(Light::ambient([1.0; 3], 0.12)));
        assert!(light.set_property(NodeProperty::Intensity, 0.5));
        assert_eq!(light.property(NodeProperty::Intensity), Some(0.5));
    }
}
