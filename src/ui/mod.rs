//! # User Interface Module
//!
//! Dear ImGui integration used by the debug environment. [`UiManager`] owns
//! the ImGui context and draws whatever the active environment builds each
//! frame; in production nothing is built and nothing is drawn.
//!
//! When the UI wants the mouse, orbit camera input is suppressed.

pub mod manager;

// Re-export main types
pub use manager::UiManager;
