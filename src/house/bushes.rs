//! Two bush clusters flanking the door

use cgmath::Vector3;
use std::f32::consts::PI;

use super::ReferenceBoundary;

/// Distance in front of the walls the clusters are planted
pub const BUSH_OFFSET: f32 = 0.25;

/// One sphere inside a cluster, relative to the cluster origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BushSpec {
    pub offset: Vector3<f32>,
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BushCluster {
    pub position: Vector3<f32>,
    pub rotation_y: f32,
    pub bushes: Vec<BushSpec>,
}

/// Cluster A right of the door and its mirror B, turned 3π/4, left of it
pub fn bush_layout(boundary: &ReferenceBoundary) -> [BushCluster; 2] {
    let z = boundary.front_z + BUSH_OFFSET;
    let bushes = vec![
        BushSpec {
            offset: Vector3::new(0.0, 0.0, 0.0),
            scale: 0.5,
        },
        BushSpec {
            offset: Vector3::new(0.5, 0.0, 0.0),
            scale: 0.25,
        },
    ];

    [
        BushCluster {
            position: Vector3::new(1.15, 0.0, z),
            rotation_y: 0.0,
            bushes: bushes.clone(),
        },
        BushCluster {
            position: Vector3::new(-2.0, 0.0, z),
            rotation_y: 3.0 * PI / 4.0,
            bushes,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clusters_sit_in_front_of_the_walls() {
        let boundary = ReferenceBoundary {
            front_z: 2.0,
            wall_height: 2.5,
        };
        let [a, b] = bush_layout(&boundary);
        assert_eq!(a.position, Vector3::new(1.15, 0.0, 2.25));
        assert_eq!(b.position, Vector3::new(-2.0, 0.0, 2.25));
        assert_eq!(a.bushes, b.bushes);
        assert_eq!(a.bushes[1].scale, 0.25);
        assert!((b.rotation_y - 3.0 * PI / 4.0).abs() < 1e-6);
    }
}
