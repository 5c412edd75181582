//! Debug helpers: axes and light markers drawn as colored line lists

use cgmath::{InnerSpace, Matrix4, Point3, Transform as _, Vector3};
use std::f32::consts::PI;

use super::{node::NodeId, scene::Scene, vertex::LineVertex};

const CIRCLE_SEGMENTS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Helper {
    /// Red, green and blue lines along local X, Y and Z
    Axes { size: f32 },
    /// Wire sphere that follows a point light
    PointLight { light: NodeId, size: f32 },
    /// Square facing the origin plus a line toward it, following a directional light
    DirectionalLight { light: NodeId, size: f32 },
}

/// Builds the line list for every visible helper reachable from the root
pub fn helper_lines(scene: &Scene) -> Vec<LineVertex> {
    let mut lines = Vec::new();

    for (helper, world) in scene.helpers() {
        match helper {
            Helper::Axes { size } => axes_lines(&world, size, &mut lines),
            Helper::PointLight { light, size } => {
                if let Some(color) = light_color(scene, light) {
                    let center = scene.world_position(light);
                    sphere_lines(center, size, color, &mut lines);
                }
            }
            Helper::DirectionalLight { light, size } => {
                if let Some(color) = light_color(scene, light) {
                    let position = scene.world_position(light);
                    directional_lines(position, size, color, &mut lines);
                }
            }
        }
    }

    lines
}

fn light_color(scene: &Scene, light: NodeId) -> Option<[f32; 3]> {
    let node = scene.node(light)?;
    if !node.visible {
        return None;
    }
    node.as_light().map(|light| light.color)
}

fn push_line(lines: &mut Vec<LineVertex>, a: Vector3<f32>, b: Vector3<f32>, color: [f32; 3]) {
    lines.push(LineVertex {
        position: a.into(),
        color,
    });
    lines.push(LineVertex {
        position: b.into(),
        color,
    });
}

fn axes_lines(world: &Matrix4<f32>, size: f32, lines: &mut Vec<LineVertex>) {
    let origin = world.transform_point(Point3::new(0.0, 0.0, 0.0));
    let axes = [
        (Point3::new(size, 0.0, 0.0), [1.0, 0.0, 0.0]),
        (Point3::new(0.0, size, 0.0), [0.0, 1.0, 0.0]),
        (Point3::new(0.0, 0.0, size), [0.0, 0.0, 1.0]),
    ];
    for (tip, color) in axes {
        let tip = world.transform_point(tip);
        push_line(
            lines,
            Vector3::new(origin.x, origin.y, origin.z),
            Vector3::new(tip.x, tip.y, tip.z),
            color,
        );
    }
}

fn circle_lines(
    center: Vector3<f32>,
    u: Vector3<f32>,
    v: Vector3<f32>,
    radius: f32,
    color: [f32; 3],
    lines: &mut Vec<LineVertex>,
) {
    let point = |i: u32| {
        let angle = i as f32 * 2.0 * PI / CIRCLE_SEGMENTS as f32;
        center + (u * angle.cos() + v * angle.sin()) * radius
    };
    for i in 0..CIRCLE_SEGMENTS {
        push_line(lines, point(i), point(i + 1), color);
    }
}

fn sphere_lines(center: Vector3<f32>, radius: f32, color: [f32; 3], lines: &mut Vec<LineVertex>) {
    let (x, y, z) = (Vector3::unit_x(), Vector3::unit_y(), Vector3::unit_z());
    circle_lines(center, x, y, radius, color, lines);
    circle_lines(center, x, z, radius, color, lines);
    circle_lines(center, y, z, radius, color, lines);
}

fn directional_lines(position: Vector3<f32>, size: f32, color: [f32; 3], lines: &mut Vec<LineVertex>) {
    if position.magnitude2() == 0.0 {
        return;
    }
    let direction = -position.normalize();
    let reference = if direction.y.abs() > 0.99 {
        Vector3::unit_x()
    } else {
        Vector3::unit_y()
    };
    let right = direction.cross(reference).normalize() * size;
    let up = right.cross(direction).normalize() * size;

    let corners = [
        position - right - up,
        position + right - up,
        position + right + up,
        position - right + up,
    ];
    for i in 0..4 {
        push_line(lines, corners[i], corners[(i + 1) % 4], color);
    }
    push_line(lines, position, Vector3::new(0.0, 0.0, 0.0), color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::{light::Light, node::Transform};

    #[test]
    fn axes_start_at_node_origin() {
        let mut scene = Scene::new();
        let root = scene.root();
        let axes = scene.add_helper(root, "axes", Helper::Axes { size: 1.0 });
        scene.node_mut(axes).unwrap().transform = Transform::from_position(-8.0, 1.0, -8.0);

        let lines = helper_lines(&scene);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0].position, [-8.0, 1.0, -8.0]);
        assert_eq!(lines[1].position, [-7.0, 1.0, -8.0]);
        assert_eq!(lines[3].color, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn point_light_helper_follows_light() {
        let mut scene = Scene::new();
        let root = scene.root();
        let light = scene.add_light(root, "ghost", Light::point([1.0, 0.0, 1.0], 2.0, 3.0));
        scene.add_helper(root, "ghost helper", Helper::PointLight { light, size: 0.5 });

        scene.node_mut(light).unwrap().transform = Transform::from_position(5.0, 0.0, 0.0);
        let lines = helper_lines(&scene);
        assert_eq!(lines.len(), (3 * CIRCLE_SEGMENTS * 2) as usize);
        assert!(lines.iter().all(|v| v.color == [1.0, 0.0, 1.0]));
        assert!(lines
            .iter()
            .all(|v| (Vector3::from(v.position) - Vector3::new(5.0, 0.0, 0.0)).magnitude() < 0.5 + 1e-5));
    }

    #[test]
    fn directional_helper_points_to_origin() {
        let mut scene = Scene::new();
        let root = scene.root();
        let moon = scene.add_light(root, "moon", Light::directional([1.0; 3], 0.12));
        scene.node_mut(moon).unwrap().transform = Transform::from_position(4.0, 4.0, 4.0);
        scene.add_helper(root, "moon helper", Helper::DirectionalLight { light: moon, size: 0.5 });

        let lines = helper_lines(&scene);
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[8].position, [4.0, 4.0, 4.0]);
        assert_eq!(lines[9].position, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn hidden_light_hides_helper() {
        let mut scene = Scene::new();
        let root = scene.root();
        let light = scene.add_light(root, "lamp", Light::point([1.0; 3], 1.0, 0.0));
        scene.add_helper(root, "lamp helper", Helper::PointLight { light, size: 0.5 });
        scene.node_mut(light).unwrap().visible = false;

        assert!(helper_lines(&scene).is_empty());
    }
}
