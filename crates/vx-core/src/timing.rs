//! Lightweight timing for assembly, scaling and reduction phases.
//!
//! Disabled by default; enable with `VX_TIMING` or [`enable_timing`].
//! Measurements are reported through `tracing::debug!`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable timing globally.
pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

/// Check if timing is enabled.
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var("VX_TIMING").is_ok()
}

/// A simple timer that measures elapsed time.
pub struct Timer {
    label: &'static str,
    start: Instant,
    enabled: bool,
}

impl Timer {
    /// Create and start a new timer with the given label.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
            enabled: is_enabled(),
        }
    }

    /// Stop the timer and return elapsed seconds, or `None` when disabled.
    pub fn stop(self) -> Option<f64> {
        if self.enabled {
            Some(self.start.elapsed().as_secs_f64())
        } else {
            None
        }
    }

    /// Stop the timer, log the result and return it (0.0 when disabled).
    pub fn stop_and_log(self) -> f64 {
        let label = self.label;
        match self.stop() {
            Some(elapsed) => {
                tracing::debug!(phase = label, elapsed_s = elapsed, "timing");
                elapsed
            }
            None => 0.0,
        }
    }
}

/// Seconds spent in the main model phases.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CpuSummary {
    pub assemble: f64,
    pub nondim: f64,
    pub dim: f64,
}

impl CpuSummary {
    pub fn total(&self) -> f64 {
        self.assemble + self.nondim + self.dim
    }

    /// Log a one-line summary if timing is enabled.
    pub fn log(&self, model: &'static str) {
        if !is_enabled() {
            return;
        }
        tracing::debug!(
            model,
            assemble_s = self.assemble,
            nondim_s = self.nondim,
            dim_s = self.dim,
            total_s = self.total(),
            "cpu summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_timer_reports_elapsed() {
        enable_timing();
        let t = Timer::start("unit");
        let elapsed = t.stop().unwrap();
        assert!(elapsed >= 0.0);
    }

    #[test]
    fn summary_total_adds_phases() {
        let s = CpuSummary {
            assemble: 1.0,
            nondim: 0.25,
            dim: 0.5,
        };
        assert_eq!(s.total(), 1.75);
    }
}
