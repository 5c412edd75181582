//! # Environment Handlers
//!
//! Debug-only affordances behind one trait: a parameter panel, frame
//! statistics and visual helpers. The debug variant provides them; the
//! production variant accepts the same calls and does nothing visible.
//!
//! The variant is chosen once at startup from the launch route:
//!
//! ```rust
//! use hauntstead::environment::{create_handler, EnvironmentKind};
//!
//! let kind = EnvironmentKind::from_route("/haunted/debug");
//! assert_eq!(kind, EnvironmentKind::Debug);
//!
//! let handler = create_handler(EnvironmentKind::from_route("/"));
//! assert_eq!(handler.kind(), EnvironmentKind::Production);
//! ```

pub mod debug;
pub mod panel;
pub mod production;

pub use debug::DebugHandler;
pub use panel::{FolderId, ParamPanel, Tunable};
pub use production::ProductionHandler;

use crate::gfx::scene::{NodeId, Scene};

/// Route segment that switches on the debug environment
pub const DEBUG_MARKER: &str = "/debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentKind {
    Debug,
    Production,
}

impl EnvironmentKind {
    /// Debug iff the route ends with `/debug` (a trailing slash is ignored)
    pub fn from_route(route: &str) -> Self {
        let trimmed = route.trim();
        let trimmed = if trimmed.len() > 1 {
            trimmed.trim_end_matches('/')
        } else {
            trimmed
        };
        if trimmed.ends_with(DEBUG_MARKER) {
            EnvironmentKind::Debug
        } else {
            EnvironmentKind::Production
        }
    }
}

/// Capability provider for debug tooling
///
/// None of the operations fail. Helper operations return the helper node when
/// one was attached.
pub trait EnvironmentHandler {
    fn kind(&self) -> EnvironmentKind;

    fn add_folder(&mut self, name: &str) -> FolderId;

    fn add_subfolder(&mut self, parent: FolderId, name: &str) -> FolderId;

    fn add_param(&mut self, folder: FolderId, tunable: Tunable);

    /// Marks the start of one frame's timing measurement
    fn begin_stats(&mut self);

    /// Marks the end of one frame's timing measurement
    fn end_stats(&mut self);

    /// Reports what the renderer did last frame
    fn record_render_stats(&mut self, _draw_calls: u32, _vertex_count: u32) {}

    /// Releases retained UI resources; safe to call more than once
    fn close(&mut self);

    fn add_axis_helper(&mut self, scene: &mut Scene) -> Option<NodeId>;

    fn add_directional_light_helper(&mut self, scene: &mut Scene, light: NodeId)
        -> Option<NodeId>;

    fn add_point_light_helper(
        &mut self,
        scene: &mut Scene,
        group: NodeId,
        light: NodeId,
    ) -> Option<NodeId>;

    /// Whether `draw_ui` ever draws anything
    fn has_ui(&self) -> bool;

    fn draw_ui(&mut self, ui: &imgui::Ui, scene: &mut Scene);
}

/// Builds the handler for `kind`
pub fn create_handler(kind: EnvironmentKind) -> Box<dyn EnvironmentHandler> {
    match kind {
        EnvironmentKind::Debug => Box::new(DebugHandler::new()),
        EnvironmentKind::Production => Box::new(ProductionHandler::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_marker_selects_debug() {
        assert_eq!(EnvironmentKind::from_route("/debug"), EnvironmentKind::Debug);
        assert_eq!(EnvironmentKind::from_route("/house/debug"), EnvironmentKind::Debug);
        assert_eq!(EnvironmentKind::from_route("/house/debug/"), EnvironmentKind::Debug);
    }

    #[test]
    fn other_routes_are_production() {
        for route in ["/", "", "/debugger", "/debug/house", "debugging"] {
            assert_eq!(
                EnvironmentKind::from_route(route),
                EnvironmentKind::Production,
                "route {route:?}"
            );
        }
    }

    #[test]
    fn handler_matches_kind() {
        assert_eq!(create_handler(EnvironmentKind::Debug).kind(), EnvironmentKind::Debug);
        assert!(create_handler(EnvironmentKind::Debug).has_ui());
        assert!(!create_handler(EnvironmentKind::Production).has_ui());
    }
}
