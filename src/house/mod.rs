//! # Haunted House
//!
//! Builds the whole decorated scene under one group anchored at the origin:
//! floor, walls, roof, door, bushes, a ring of graves, the door light and the
//! circling ghosts. Everything is placed relative to the wall volume through
//! [`ReferenceBoundary`], which can only be derived once the walls exist.

pub mod bushes;
pub mod ghosts;
pub mod graves;

pub use bushes::{bush_layout, BushCluster, BushSpec};
pub use ghosts::{orbit_position, Ghost, Ghosts};
pub use graves::{generate_graves, GravePlacement};

use cgmath::Vector3;
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::{
    config::HouseConfig,
    environment::EnvironmentHandler,
    gfx::{
        geometry::{generate_box, generate_cone, generate_plane, generate_sphere, Aabb},
        resources::{hex_rgb, Material, TextureMaps},
        scene::{Light, NodeId, Scene, SceneError, Transform},
    },
};

/// Gap between the wall face and the door plane
const DOOR_GAP: f32 = 0.001;
/// How far the door's lowest edge sits below the ground
const DOOR_SINK: f32 = 0.1;
/// Door light distance in front of the wall face
const DOOR_LIGHT_OFFSET: f32 = 0.2;

/// Extents of the wall volume every anchor is computed from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceBoundary {
    /// Largest z of the wall geometry, i.e. the front face
    pub front_z: f32,
    pub wall_height: f32,
}

impl ReferenceBoundary {
    pub fn from_walls(bounds: &Aabb) -> Self {
        Self {
            front_z: bounds.max[2],
            wall_height: bounds.size()[1],
        }
    }
}

/// World positions of the placed pieces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchors {
    pub door: Vector3<f32>,
    pub roof: Vector3<f32>,
    pub door_light: Vector3<f32>,
    pub bushes: [Vector3<f32>; 2],
}

impl Anchors {
    pub fn is_finite(&self) -> bool {
        let finite = |v: &Vector3<f32>| v.x.is_finite() && v.y.is_finite() && v.z.is_finite();
        finite(&self.door)
            && finite(&self.roof)
            && finite(&self.door_light)
            && self.bushes.iter().all(finite)
    }
}

pub struct House {
    group: NodeId,
    graves: NodeId,
    door: NodeId,
    roof: NodeId,
    door_light: NodeId,
    bushes: [NodeId; 2],
    boundary: ReferenceBoundary,
    ghosts: Ghosts,
}

impl House {
    /// Builds the house under a new "house" group at the scene root
    pub fn build<R: Rng + ?Sized>(
        config: &HouseConfig,
        scene: &mut Scene,
        environment: &mut dyn EnvironmentHandler,
        rng: &mut R,
    ) -> Result<Self, SceneError> {
        let root = scene.root();
        let group = scene.add_group(root, "house");

        Self::add_floor(config, scene, group);
        let boundary = Self::add_walls(config, scene, group);
        let roof = Self::add_roof(config, scene, group, &boundary);
        let door = Self::add_door(config, scene, group, &boundary);
        let bushes = Self::add_bushes(config, scene, group, &boundary)?;
        let graves = Self::add_graves(config, scene, group, rng);
        let door_light = Self::add_door_light(config, scene, group, &boundary);
        environment.add_point_light_helper(scene, group, door_light);

        let mut ghosts = Ghosts::new(&config.ghosts, rng);
        ghosts.attach(scene, group);

        log::info!(
            "Built house: {} graves, {} ghosts, {} nodes",
            scene.node(graves).map_or(0, |node| node.children().len()),
            ghosts.len(),
            scene.node_count()
        );

        Ok(Self {
            group,
            graves,
            door,
            roof,
            door_light,
            bushes,
            boundary,
            ghosts,
        })
    }

    fn add_floor(config: &HouseConfig, scene: &mut Scene, group: NodeId) {
        let material = scene.add_material(
            Material::new("grass")
                .with_maps(TextureMaps {
                    color: Some("textures/grass/color.jpg".into()),
                    ambient_occlusion: Some("textures/grass/ambientOcclusion.jpg".into()),
                    roughness: Some("textures/grass/roughness.jpg".into()),
                    ..Default::default()
                })
                .with_uv_repeat(config.floor_uv_repeat),
        );
        let plane = scene.add_geometry(generate_plane(config.floor_size, config.floor_size, 1, 1));
        let floor = scene.add_mesh(group, "floor", plane, &material);
        scene.set_shadows(floor, false, true);
        set_transform(scene, floor, Transform::default().with_rotation(-FRAC_PI_2, 0.0, 0.0));
    }

    fn add_walls(config: &HouseConfig, scene: &mut Scene, group: NodeId) -> ReferenceBoundary {
        let material = scene.add_material(Material::new("bricks").with_maps(TextureMaps {
            color: Some("textures/bricks/color.jpg".into()),
            ambient_occlusion: Some("textures/bricks/ambientOcclusion.jpg".into()),
            roughness: Some("textures/bricks/roughness.jpg".into()),
            ..Default::default()
        }));
        let [width, height, depth] = config.wall_size;
        let geometry = generate_box(width, height, depth);
        let bounds = geometry.bounding_box();
        let walls_geometry = scene.add_geometry(geometry);

        let walls = scene.add_mesh(group, "walls", walls_geometry, &material);
        scene.set_shadows(walls, true, false);
        set_transform(scene, walls, Transform::from_position(0.0, -bounds.min[1], 0.0));

        ReferenceBoundary::from_walls(&bounds)
    }

    fn add_roof(
        config: &HouseConfig,
        scene: &mut Scene,
        group: NodeId,
        boundary: &ReferenceBoundary,
    ) -> NodeId {
        let material = scene.add_material(Material::new("roof").with_hex_color(&config.roof_color));
        let geometry = generate_cone(config.roof_radius, config.roof_height, config.roof_segments);
        let lowest = geometry.bounding_box().min[1];
        let cone = scene.add_geometry(geometry);

        let roof = scene.add_mesh(group, "roof", cone, &material);
        set_transform(
            scene,
            roof,
            Transform::from_position(0.0, boundary.wall_height - lowest, 0.0)
                .with_rotation(0.0, FRAC_PI_4, 0.0),
        );
        roof
    }

    fn add_door(
        config: &HouseConfig,
        scene: &mut Scene,
        group: NodeId,
        boundary: &ReferenceBoundary,
    ) -> NodeId {
        let material = scene.add_material(
            Material::new("door")
                .with_maps(TextureMaps {
                    color: Some("textures/door/color.jpg".into()),
                    alpha: Some("textures/door/alpha.jpg".into()),
                    ambient_occlusion: Some("textures/door/ambientOcclusion.jpg".into()),
                    roughness: Some("textures/door/roughness.jpg".into()),
                    metalness: Some("textures/door/metalness.jpg".into()),
                })
                .with_transparency(true),
        );
        let [width, height] = config.door_size;
        let mut geometry = generate_plane(width, height, 1, 1);
        let lowest = geometry.bounding_box().min[1];
        geometry.translate([0.0, -lowest - DOOR_SINK, 0.0]);
        let plane = scene.add_geometry(geometry);

        let door = scene.add_mesh(group, "door", plane, &material);
        set_transform(
            scene,
            door,
            Transform::from_position(0.0, 0.0, boundary.front_z + DOOR_GAP),
        );
        door
    }

    fn add_bushes(
        config: &HouseConfig,
        scene: &mut Scene,
        group: NodeId,
        boundary: &ReferenceBoundary,
    ) -> Result<[NodeId; 2], SceneError> {
        let material = scene.add_material(Material::new("bush").with_hex_color(&config.bush_color));
        let sphere = scene.add_geometry(generate_sphere(1.0, 16, 16));
        let [first, second] = bush_layout(boundary);

        let cluster = scene.add_group(group, "bushes");
        set_transform(scene, cluster, cluster_transform(&first));
        for bush in &first.bushes {
            let node = scene.add_mesh(cluster, "bush", sphere, &material);
            set_transform(
                scene,
                node,
                Transform {
                    position: bush.offset,
                    ..Transform::default().with_uniform_scale(bush.scale)
                },
            );
        }

        let mirrored = scene.clone_subtree(cluster, group)?;
        set_transform(scene, mirrored, cluster_transform(&second));

        Ok([cluster, mirrored])
    }

    fn add_graves<R: Rng + ?Sized>(
        config: &HouseConfig,
        scene: &mut Scene,
        group: NodeId,
        rng: &mut R,
    ) -> NodeId {
        let graves = &config.graves;
        let material = scene.add_material(Material::new("grave").with_hex_color(&graves.color));
        let [width, height, depth] = graves.size;
        let mut geometry = generate_box(width, height, depth);
        let lowest = geometry.bounding_box().min[1];
        geometry.translate([0.0, -lowest, 0.0]);
        let shared = scene.add_geometry(geometry);

        let graves_group = scene.add_group(group, "graves");
        for placement in generate_graves(graves.count, graves, rng) {
            let [x, y, z] = placement.position;
            let [rx, ry, rz] = placement.rotation;
            let grave = scene.add_mesh(graves_group, "grave", shared, &material);
            scene.set_shadows(grave, true, false);
            set_transform(scene, grave, Transform::from_position(x, y, z).with_rotation(rx, ry, rz));
        }
        graves_group
    }

    fn add_door_light(
        config: &HouseConfig,
        scene: &mut Scene,
        group: NodeId,
        boundary: &ReferenceBoundary,
    ) -> NodeId {
        let color = hex_rgb(&config.door_light_color).unwrap_or_else(|| {
            log::warn!("Invalid door light color '{}', using white", config.door_light_color);
            [1.0; 3]
        });
        let light = scene.add_light(
            group,
            "door light",
            Light::point(color, config.door_light_intensity, config.door_light_distance),
        );
        set_transform(
            scene,
            light,
            Transform::from_position(
                0.0,
                boundary.wall_height,
                boundary.front_z + DOOR_LIGHT_OFFSET,
            ),
        );
        light
    }

    /// Moves the ghosts to their positions at elapsed time `t` seconds
    pub fn tick(&mut self, t: f32, scene: &mut Scene) {
        self.ghosts.advance(t);
        self.ghosts.sync(scene);
    }

    pub fn anchors(&self, scene: &Scene) -> Anchors {
        Anchors {
            door: scene.world_position(self.door),
            roof: scene.world_position(self.roof),
            door_light: scene.world_position(self.door_light),
            bushes: [
                scene.world_position(self.bushes[0]),
                scene.world_position(self.bushes[1]),
            ],
        }
    }

    pub fn grave_count(&self, scene: &Scene) -> usize {
        scene
            .node(self.graves)
            .map_or(0, |graves| {
                graves
                    .children()
                    .iter()
                    .filter(|id| scene.node(**id).is_some_and(|node| node.is_mesh()))
                    .count()
            })
    }

    pub fn group(&self) -> NodeId {
        self.group
    }

    pub fn boundary(&self) -> ReferenceBoundary {
        self.boundary
    }

    pub fn ghosts(&self) -> &Ghosts {
        &self.ghosts
    }

    pub fn door_light(&self) -> NodeId {
        self.door_light
    }
}

fn cluster_transform(cluster: &BushCluster) -> Transform {
    Transform {
        position: cluster.position,
        ..Transform::default().with_rotation(0.0, cluster.rotation_y, 0.0)
    }
}

fn set_transform(scene: &mut Scene, id: NodeId, transform: Transform) {
    if let Some(node) = scene.node_mut(id) {
        node.transform = transform;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::GraveConfig,
        environment::{DebugHandler, ProductionHandler},
    };
    use rand::{rngs::StdRng, SeedableRng};

    fn build(config: &HouseConfig, environment: &mut dyn EnvironmentHandler) -> (Scene, House) {
        let mut scene = Scene::new();
        let mut rng = StdRng::seed_from_u64(2024);
        let house = House::build(config, &mut scene, environment, &mut rng).unwrap();
        (scene, house)
    }

    fn non_helper_count(scene: &Scene) -> usize {
        scene
            .descendants(scene.root())
            .into_iter()
            .filter(|id| !scene.node(*id).unwrap().is_helper())
            .count()
    }

    #[test]
    fn anchors_follow_the_walls() {
        let (scene, house) = build(&HouseConfig::default(), &mut ProductionHandler::new());
        let anchors = house.anchors(&scene);
        assert!(anchors.is_finite());

        let boundary = house.boundary();
        assert_eq!(boundary, ReferenceBoundary { front_z: 2.0, wall_height: 2.5 });
        assert!((anchors.door.z - 2.001).abs() < 1e-6);
        assert!((anchors.roof.y - 3.0).abs() < 1e-6);
        assert_eq!(anchors.door_light, Vector3::new(0.0, 2.5, 2.2));
        assert_eq!(anchors.bushes[0], Vector3::new(1.15, 0.0, 2.25));
        assert_eq!(anchors.bushes[1], Vector3::new(-2.0, 0.0, 2.25));
    }

    #[test]
    fn walls_and_door_rest_on_the_ground() {
        let (scene, _house) = build(&HouseConfig::default(), &mut ProductionHandler::new());
        let walls = scene.find_by_name("walls").unwrap();
        assert!((scene.world_position(walls).y - 1.25).abs() < 1e-6);

        let door = scene.find_by_name("door").unwrap();
        let geometry = match &scene.node(door).unwrap().kind {
            crate::gfx::scene::NodeKind::Mesh(mesh) => mesh.geometry,
            _ => panic!("door is not a mesh"),
        };
        let bounds = scene.bounding_box(geometry).unwrap();
        assert!((bounds.min[1] + 0.1).abs() < 1e-6);
    }

    #[test]
    fn default_scene_has_fifty_graves_and_three_ghosts() {
        let (scene, house) = build(&HouseConfig::default(), &mut ProductionHandler::new());
        assert_eq!(house.grave_count(&scene), 50);
        assert_eq!(house.ghosts().len(), 3);
        // door light plus ghosts
        assert_eq!(scene.point_lights().len(), 4);
    }

    #[test]
    fn walls_and_graves_cast_onto_the_floor() {
        let (scene, _house) = build(&HouseConfig::default(), &mut ProductionHandler::new());
        let instances = scene.mesh_instances();
        let named = |name: &str| {
            instances
                .iter()
                .filter(|instance| scene.node(instance.node).is_some_and(|node| node.name == name))
                .map(|instance| (instance.cast_shadow, instance.receive_shadow))
                .collect::<Vec<_>>()
        };

        assert_eq!(named("floor"), [(false, true)]);
        assert_eq!(named("walls"), [(true, false)]);
        assert_eq!(named("grave"), vec![(true, false); 50]);
        assert_eq!(named("roof"), [(false, false)]);
        assert_eq!(named("door"), [(false, false)]);
    }

    #[test]
    fn zero_graves_leaves_the_rest_unchanged() {
        let empty = HouseConfig::default().with_graves(GraveConfig::default().with_count(0));
        let (scene, house) = build(&empty, &mut ProductionHandler::new());
        let (full_scene, full_house) = build(&HouseConfig::default(), &mut ProductionHandler::new());

        assert_eq!(house.grave_count(&scene), 0);
        assert_eq!(scene.node_count() + 50, full_scene.node_count());
        assert_eq!(house.anchors(&scene), full_house.anchors(&full_scene));
        assert!(scene.find_by_name("graves").is_some());
    }

    #[test]
    fn debug_and_production_differ_only_in_helpers() {
        let config = HouseConfig::default();
        let (debug_scene, debug_house) = build(&config, &mut DebugHandler::new());
        let (prod_scene, prod_house) = build(&config, &mut ProductionHandler::new());

        assert_eq!(non_helper_count(&debug_scene), non_helper_count(&prod_scene));
        assert_eq!(debug_house.anchors(&debug_scene), prod_house.anchors(&prod_scene));
        assert_eq!(debug_house.grave_count(&debug_scene), prod_house.grave_count(&prod_scene));
        assert_eq!(debug_scene.helpers().len(), 1);
        assert!(prod_scene.helpers().is_empty());
    }

    #[test]
    fn tick_moves_only_the_ghosts() {
        let (mut scene, mut house) = build(&HouseConfig::default(), &mut ProductionHandler::new());
        let before = house.anchors(&scene);

        house.tick(0.0, &mut scene);
        for ghost in house.ghosts().ghosts() {
            let position = scene.world_position(ghost.node().unwrap());
            assert!((position.y - 1.0).abs() < 1e-6);
            assert!(position.x.abs() < 1e-6);
        }
        house.tick(4.2, &mut scene);
        assert_eq!(house.anchors(&scene), before);
    }
}
