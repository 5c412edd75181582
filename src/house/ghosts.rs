//! Colored point lights circling the house
//!
//! Each ghost gets a random phase at creation. Its position at time `t` is
//!
//! ```text
//! x = sin(t · phase) · R
//! y = sin(t · 3) + cos(t · 5)
//! z = cos(t · phase) · R
//! ```

use cgmath::Vector3;
use rand::Rng;

use crate::{
    config::GhostConfig,
    gfx::{
        resources::hex_rgb,
        scene::{Light, NodeId, Scene},
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct Ghost {
    pub color: [f32; 3],
    pub intensity: f32,
    pub distance: f32,
    /// Angular speed factor in `[0, 1)`, fixed at creation
    pub phase: f32,
    pub position: Vector3<f32>,
    node: Option<NodeId>,
}

impl Ghost {
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }
}

/// Orbit position of a ghost with `phase` at elapsed time `t`
pub fn orbit_position(phase: f32, t: f32, radius: f32) -> Vector3<f32> {
    Vector3::new(
        (t * phase).sin() * radius,
        (t * 3.0).sin() + (t * 5.0).cos(),
        (t * phase).cos() * radius,
    )
}

#[derive(Debug, Clone)]
pub struct Ghosts {
    ghosts: Vec<Ghost>,
    radius: f32,
    group: Option<NodeId>,
}

impl Ghosts {
    /// One ghost per configured color, each with a random phase
    pub fn new<R: Rng + ?Sized>(config: &GhostConfig, rng: &mut R) -> Self {
        let phases: Vec<f32> = config.colors.iter().map(|_| rng.random::<f32>()).collect();
        Self::with_phases(config, &phases)
    }

    /// Ghosts with fixed phases; extra colors or phases are ignored
    pub fn with_phases(config: &GhostConfig, phases: &[f32]) -> Self {
        let ghosts = config
            .colors
            .iter()
            .zip(phases)
            .map(|(hex, &phase)| Ghost {
                color: hex_rgb(hex).unwrap_or_else(|| {
                    log::warn!("Invalid ghost color '{}', using white", hex);
                    [1.0; 3]
                }),
                intensity: config.intensity,
                distance: config.distance,
                phase,
                position: orbit_position(phase, 0.0, config.radius),
                node: None,
            })
            .collect();

        Self {
            ghosts,
            radius: config.radius,
            group: None,
        }
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn len(&self) -> usize {
        self.ghosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ghosts.is_empty()
    }

    pub fn group(&self) -> Option<NodeId> {
        self.group
    }

    /// Recomputes every position for elapsed time `t` seconds
    pub fn advance(&mut self, t: f32) {
        for ghost in &mut self.ghosts {
            ghost.position = orbit_position(ghost.phase, t, self.radius);
        }
    }

    /// Adds the lights to `scene` under a new "ghosts" group in `parent`
    pub fn attach(&mut self, scene: &mut Scene, parent: NodeId) -> NodeId {
        let group = scene.add_group(parent, "ghosts");
        for (index, ghost) in self.ghosts.iter_mut().enumerate() {
            let light = Light::point(ghost.color, ghost.intensity, ghost.distance);
            let node = scene.add_light(group, &format!("ghost {}", index + 1), light);
            ghost.node = Some(node);
        }
        self.group = Some(group);
        self.sync(scene);
        group
    }

    /// Copies current positions into the attached scene nodes
    pub fn sync(&self, scene: &mut Scene) {
        for ghost in &self.ghosts {
            if let Some(node) = ghost.node.and_then(|id| scene.node_mut(id)) {
                node.transform.position = ghost.position;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn phases_are_drawn_per_ghost() {
        let mut rng = StdRng::seed_from_u64(3);
        let ghosts = Ghosts::new(&GhostConfig::default(), &mut rng);
        assert_eq!(ghosts.len(), 3);
        for ghost in ghosts.ghosts() {
            assert!((0.0..1.0).contains(&ghost.phase));
            assert_eq!(ghost.intensity, 2.0);
            assert_eq!(ghost.distance, 3.0);
        }
    }

    #[test]
    fn start_position_ignores_phase() {
        let mut ghosts = Ghosts::with_phases(&GhostConfig::default(), &[0.1, 0.5, 0.9]);
        ghosts.advance(0.0);
        for ghost in ghosts.ghosts() {
            assert_eq!(ghost.position.x, 0.0);
            assert_eq!(ghost.position.y, 1.0);
            assert_eq!(ghost.position.z, 5.0);
        }
    }

    #[test]
    fn advance_is_deterministic() {
        let config = GhostConfig::default();
        let mut a = Ghosts::with_phases(&config, &[0.3, 0.6, 0.8]);
        let mut b = a.clone();
        a.advance(12.5);
        b.advance(3.0);
        b.advance(12.5);
        assert_eq!(a.ghosts(), b.ghosts());

        let expected = orbit_position(0.3, 12.5, 5.0);
        assert_eq!(a.ghosts()[0].position, expected);
    }

    #[test]
    fn sync_moves_scene_lights() {
        let mut scene = Scene::new();
        let root = scene.root();
        let mut ghosts = Ghosts::with_phases(&GhostConfig::default(), &[0.25, 0.5, 0.75]);
        let group = ghosts.attach(&mut scene, root);
        assert_eq!(scene.node(group).unwrap().children().len(), 3);

        ghosts.advance(2.0);
        ghosts.sync(&mut scene);
        let node = ghosts.ghosts()[1].node().unwrap();
        let position = scene.world_position(node);
        let expected = orbit_position(0.5, 2.0, 5.0);
        assert!((position.x - expected.x).abs() < 1e-5);
        assert!((position.y - expected.y).abs() < 1e-5);
        assert!((position.z - expected.z).abs() < 1e-5);
    }
}
