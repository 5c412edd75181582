// src/lib.rs
//! Hauntstead
//!
//! An animated haunted house rendered with wgpu and winit: a textured house
//! on a lawn, a ring of leaning graves, bushes by the door and three colored
//! ghost lights circling through the fog. Launching with a route ending in
//! `/debug` adds a tuning panel, frame statistics and light helpers.

pub mod app;
pub mod config;
pub mod environment;
pub mod gfx;
pub mod house;
pub mod performance;
pub mod ui;
pub mod wgpu_utils;
pub mod world;

// Re-export main types for convenience
pub use app::HauntedApp;
pub use world::World;
