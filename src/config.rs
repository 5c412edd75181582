//! Startup configuration
//!
//! Plain structs with defaults matching the shipped scene. Builder-style
//! `with_*` methods cover the values callers commonly override.

use std::{f32::consts::FRAC_PI_2, path::PathBuf};

/// Environment variable naming the asset root directory
pub const ASSETS_ENV: &str = "HAUNTED_ASSETS";

#[derive(Debug, Clone, PartialEq)]
pub struct GraveConfig {
    pub count: usize,
    /// Inner radius of the ring graves are scattered on
    pub base_radius: f32,
    /// Width of the ring; radii are drawn from `[base, base + noise)`
    pub radius_noise: f32,
    /// Full tilt range per axis, centred on zero
    pub max_tilt: f32,
    /// Box width, height and depth
    pub size: [f32; 3],
    /// How far each grave is sunk into the ground
    pub sink: f32,
    pub color: String,
}

impl Default for GraveConfig {
    fn default() -> Self {
        Self {
            count: 50,
            base_radius: 5.0,
            radius_noise: 5.0,
            max_tilt: 0.4,
            size: [0.6, 0.8, 0.2],
            sink: 0.1,
            color: "#b2b6b1".to_string(),
        }
    }
}

impl GraveConfig {
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GhostConfig {
    pub colors: Vec<String>,
    pub intensity: f32,
    pub distance: f32,
    /// Orbit radius
    pub radius: f32,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            colors: vec![
                "#ff00ff".to_string(),
                "#00ffff".to_string(),
                "#00ff00".to_string(),
            ],
            intensity: 2.0,
            distance: 3.0,
            radius: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HouseConfig {
    pub floor_size: f32,
    pub floor_uv_repeat: f32,
    pub wall_size: [f32; 3],
    pub roof_radius: f32,
    pub roof_height: f32,
    pub roof_segments: u32,
    pub roof_color: String,
    pub door_size: [f32; 2],
    pub bush_color: String,
    pub door_light_color: String,
    pub door_light_intensity: f32,
    pub door_light_distance: f32,
    pub graves: GraveConfig,
    pub ghosts: GhostConfig,
}

impl Default for HouseConfig {
    fn default() -> Self {
        Self {
            floor_size: 100.0,
            floor_uv_repeat: 8.0,
            wall_size: [4.0, 2.5, 4.0],
            roof_radius: 3.5,
            roof_height: 1.0,
            roof_segments: 4,
            roof_color: "#b35f45".to_string(),
            door_size: [1.8, 2.16],
            bush_color: "#89c854".to_string(),
            door_light_color: "#ff7d46".to_string(),
            door_light_intensity: 2.0,
            door_light_distance: 7.0,
            graves: GraveConfig::default(),
            ghosts: GhostConfig::default(),
        }
    }
}

impl HouseConfig {
    pub fn with_graves(mut self, graves: GraveConfig) -> Self {
        self.graves = graves;
        self
    }

    pub fn with_ghosts(mut self, ghosts: GhostConfig) -> Self {
        self.ghosts = ghosts;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    pub eye: [f32; 3],
    pub max_distance: f32,
    /// Largest angle from straight up the camera may reach
    pub max_polar_angle: f32,
    pub damping: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fovy_degrees: 75.0,
            znear: 0.1,
            zfar: 100.0,
            eye: [6.0, 3.0, 6.0],
            max_distance: 13.0,
            max_polar_angle: FRAC_PI_2 - 0.05,
            damping: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorldConfig {
    pub title: String,
    /// Initial logical window size
    pub window_size: (u32, u32),
    pub max_pixel_ratio: f64,
    /// Longest gap between two clicks that still counts as a double-click
    pub double_click_ms: u64,
    pub fog_color: String,
    pub fog_density: f32,
    pub ambient_intensity: f32,
    pub moon_intensity: f32,
    pub moon_position: [f32; 3],
    /// Side of the moon's square shadow map, in texels
    pub moon_shadow_map_size: u32,
    /// Far plane of the moon's shadow camera
    pub moon_shadow_far: f32,
    pub assets_root: PathBuf,
    pub camera: CameraConfig,
    pub house: HouseConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            title: "Haunted House".to_string(),
            window_size: (1200, 800),
            max_pixel_ratio: 2.0,
            double_click_ms: 400,
            fog_color: "#262837".to_string(),
            fog_density: 0.05,
            ambient_intensity: 0.12,
            moon_intensity: 0.12,
            moon_position: [4.0, 4.0, 4.0],
            moon_shadow_map_size: 256,
            moon_shadow_far: 14.0,
            assets_root: PathBuf::from("assets"),
            camera: CameraConfig::default(),
            house: HouseConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Defaults with the asset root taken from `HAUNTED_ASSETS` when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(root) = std::env::var_os(ASSETS_ENV).filter(|root| !root.is_empty()) {
            config.assets_root = PathBuf::from(root);
        }
        log::info!("Loading assets from {}", config.assets_root.display());
        config
    }

    pub fn with_assets_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.assets_root = root.into();
        self
    }

    pub fn with_house(mut self, house: HouseConfig) -> Self {
        self.house = house;
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_shipped_scene() {
        let config = WorldConfig::default();
        assert_eq!(config.window_size, (1200, 800));
        assert_eq!(config.house.graves.count, 50);
        assert_eq!(config.house.ghosts.colors.len(), 3);
        assert!((config.camera.max_polar_angle - (FRAC_PI_2 - 0.05)).abs() < 1e-6);
    }

    #[test]
    fn builders_override_fields() {
        let config = WorldConfig::default()
            .with_assets_root("/tmp/haunted")
            .with_house(HouseConfig::default().with_graves(GraveConfig::default().with_count(0)));
        assert_eq!(config.assets_root, PathBuf::from("/tmp/haunted"));
        assert_eq!(config.house.graves.count, 0);
    }
}
