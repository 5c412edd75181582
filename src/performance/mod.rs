//! # Frame Statistics
//!
//! Tracks frame times and render counters for the debug environment and
//! draws them as a small imgui overlay, in the spirit of a stats.js panel.
//!
//! ## Usage
//!
//! ```rust
//! use hauntstead::performance::PerformanceMonitor;
//!
//! let mut monitor = PerformanceMonitor::new();
//!
//! // Bracket every frame
//! monitor.begin_frame();
//! // ... render frame ...
//! monitor.end_frame();
//!
//! assert_eq!(monitor.frames_recorded(), 1);
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Performance metrics derived from the recent frame window
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceMetrics {
    /// Current frames per second
    pub fps: f32,
    /// Average frame time in milliseconds
    pub frame_time_ms: f32,
    /// Minimum frame time in the current window
    pub min_frame_time_ms: f32,
    /// Maximum frame time in the current window
    pub max_frame_time_ms: f32,
    /// Number of draw calls in the last frame
    pub draw_calls: u32,
    /// Number of vertices rendered in the last frame
    pub vertex_count: u32,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            fps: 0.0,
            frame_time_ms: 0.0,
            min_frame_time_ms: f32::MAX,
            max_frame_time_ms: 0.0,
            draw_calls: 0,
            vertex_count: 0,
        }
    }
}

/// Performance monitoring system
pub struct PerformanceMonitor {
    /// Ring buffer of recent frame times for averaging
    frame_times: VecDeque<Duration>,
    max_samples: usize,
    /// Start time of the current frame
    frame_start: Option<Instant>,
    current_metrics: PerformanceMetrics,
    frames_recorded: u64,
}

impl PerformanceMonitor {
    /// Metrics are refreshed every this many frames
    const UPDATE_EVERY: u64 = 6;

    pub fn new() -> Self {
        Self::with_capacity(120) // ~2 seconds at 60fps
    }

    pub fn with_capacity(max_samples: usize) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            frame_start: None,
            current_metrics: PerformanceMetrics::default(),
            frames_recorded: 0,
        }
    }

    /// Mark the beginning of a frame
    pub fn begin_frame(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    /// Mark the end of a frame; ignored without a matching `begin_frame`
    pub fn end_frame(&mut self) {
        if let Some(start) = self.frame_start.take() {
            self.record_frame(start.elapsed());
        }
    }

    /// Records one frame that took `frame_time`
    pub fn record_frame(&mut self, frame_time: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(frame_time);
        self.frames_recorded += 1;

        if self.frames_recorded == 1 || self.frames_recorded % Self::UPDATE_EVERY == 0 {
            self.update_metrics();
        }
    }

    fn update_metrics(&mut self) {
        if self.frame_times.is_empty() {
            return;
        }

        let total_time: Duration = self.frame_times.iter().sum();
        let avg_frame_time_ms =
            total_time.as_secs_f32() * 1000.0 / self.frame_times.len() as f32;

        self.current_metrics.frame_time_ms = avg_frame_time_ms;
        self.current_metrics.fps = if avg_frame_time_ms > 0.0 {
            1000.0 / avg_frame_time_ms
        } else {
            0.0
        };

        if let (Some(min_time), Some(max_time)) =
            (self.frame_times.iter().min(), self.frame_times.iter().max())
        {
            self.current_metrics.min_frame_time_ms = min_time.as_secs_f32() * 1000.0;
            self.current_metrics.max_frame_time_ms = max_time.as_secs_f32() * 1000.0;
        }
    }

    /// Update render statistics
    pub fn update_render_stats(&mut self, draw_calls: u32, vertex_count: u32) {
        self.current_metrics.draw_calls = draw_calls;
        self.current_metrics.vertex_count = vertex_count;
    }

    pub fn get_metrics(&self) -> &PerformanceMetrics {
        &self.current_metrics
    }

    pub fn frames_recorded(&self) -> u64 {
        self.frames_recorded
    }

    /// Frame time history in milliseconds, oldest first
    pub fn get_frame_time_history(&self) -> Vec<f32> {
        self.frame_times
            .iter()
            .map(|duration| duration.as_secs_f32() * 1000.0)
            .collect()
    }

    /// Reset all metrics and history
    pub fn reset(&mut self) {
        self.frame_times.clear();
        self.current_metrics = PerformanceMetrics::default();
        self.frame_start = None;
        self.frames_recorded = 0;
    }

    /// Render a compact statistics overlay in the top-left corner
    pub fn render_overlay(&self, ui: &imgui::Ui) {
        let metrics = &self.current_metrics;

        ui.window("Stats")
            .size([180.0, 130.0], imgui::Condition::Always)
            .position([10.0, 10.0], imgui::Condition::Always)
            .no_decoration()
            .no_inputs()
            .bg_alpha(0.3)
            .build(|| {
                ui.text(format!("FPS: {:.0}", metrics.fps));
                ui.text(format!("{:.1}ms", metrics.frame_time_ms));
                ui.text(format!("Draw calls: {}", metrics.draw_calls));

                if !self.frame_times.is_empty() {
                    let frame_time_history = self.get_frame_time_history();
                    ui.plot_lines("##frame_times", &frame_time_history)
                        .graph_size([160.0, 40.0])
                        .scale_min(0.0)
                        .scale_max(50.0)
                        .build();
                }
            });
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_without_begin_is_ignored() {
        let mut monitor = PerformanceMonitor::new();
        monitor.end_frame();
        assert_eq!(monitor.frames_recorded(), 0);

        monitor.begin_frame();
        monitor.end_frame();
        monitor.end_frame();
        assert_eq!(monitor.frames_recorded(), 1);
    }

    #[test]
    fn metrics_average_the_window() {
        let mut monitor = PerformanceMonitor::with_capacity(4);
        for ms in [10, 20, 30, 40, 50, 60] {
            monitor.record_frame(Duration::from_millis(ms));
        }

        // 10 and 20 fell out of the window
        let metrics = monitor.get_metrics();
        assert!((metrics.frame_time_ms - 45.0).abs() < 1e-3);
        assert!((metrics.fps - 1000.0 / 45.0).abs() < 1e-2);
        assert!((metrics.min_frame_time_ms - 30.0).abs() < 1e-3);
        assert!((metrics.max_frame_time_ms - 60.0).abs() < 1e-3);
        assert_eq!(monitor.get_frame_time_history().len(), 4);
    }

    #[test]
    fn reset_clears_history() {
        let mut monitor = PerformanceMonitor::new();
        monitor.record_frame(Duration::from_millis(16));
        monitor.update_render_stats(12, 3000);
        monitor.reset();
        assert_eq!(monitor.frames_recorded(), 0);
        assert_eq!(monitor.get_metrics(), &PerformanceMetrics::default());
    }
}
