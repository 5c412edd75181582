//! Grave markers scattered on a ring around the house

use rand::Rng;
use std::f32::consts::TAU;

use crate::config::GraveConfig;

/// Where one grave stands and how it leans
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravePlacement {
    /// Angle around the Y axis, in `[0, 2π)`
    pub angle: f32,
    /// Distance from the origin, in `[base, base + noise)`
    pub radius: f32,
    pub position: [f32; 3],
    /// Euler XYZ lean, each in `[-max_tilt / 2, max_tilt / 2)`
    pub rotation: [f32; 3],
}

/// Samples `count` independent placements
pub fn generate_graves<R: Rng + ?Sized>(
    count: usize,
    config: &GraveConfig,
    rng: &mut R,
) -> Vec<GravePlacement> {
    (0..count).map(|_| sample_grave(config, rng)).collect()
}

fn sample_grave<R: Rng + ?Sized>(config: &GraveConfig, rng: &mut R) -> GravePlacement {
    // Rounding can land a product on the open upper bound
    let angle = (rng.random::<f32>() * TAU) % TAU;
    let upper = config.base_radius + config.radius_noise;
    let mut radius = config.base_radius + rng.random::<f32>() * config.radius_noise;
    if radius >= upper {
        radius = config.base_radius;
    }

    let mut tilt = || config.max_tilt * (rng.random::<f32>() - 0.5);
    let rotation = [tilt(), tilt(), tilt()];

    GravePlacement {
        angle,
        radius,
        position: [angle.cos() * radius, -config.sink, angle.sin() * radius],
        rotation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn produces_exactly_the_requested_count() {
        let config = GraveConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        for count in [0, 1, 50, 200] {
            assert_eq!(generate_graves(count, &config, &mut rng).len(), count);
        }
    }

    #[test]
    fn placements_stay_in_range() {
        let config = GraveConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        let half_tilt = config.max_tilt / 2.0;

        for grave in generate_graves(500, &config, &mut rng) {
            assert!((0.0..TAU).contains(&grave.angle), "angle {}", grave.angle);
            assert!(grave.radius >= config.base_radius);
            assert!(grave.radius < config.base_radius + config.radius_noise);
            assert_eq!(grave.position[1], -0.1);
            let planar = (grave.position[0].powi(2) + grave.position[2].powi(2)).sqrt();
            assert!((planar - grave.radius).abs() < 1e-4);
            for axis in grave.rotation {
                assert!((-half_tilt..half_tilt).contains(&axis), "tilt {axis}");
            }
        }
    }

    #[test]
    fn zero_noise_pins_the_radius() {
        let config = GraveConfig {
            radius_noise: 0.0,
            ..GraveConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate_graves(20, &config, &mut rng)
            .iter()
            .all(|grave| grave.radius == config.base_radius));
    }
}
