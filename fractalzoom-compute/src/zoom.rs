//! Animated zoom, panning and iteration-budget control.
//!
//! A zoom gesture renders a short sequence of frames easing from the current
//! view to the target. The controller times each gesture and grows or shrinks
//! the frame count so gestures stay near interactive speed.

use fractalzoom_core::{lerp, EngineConfig, ViewBounds, ViewRequest, ViewState, ZoomConfig};
use std::time::{Duration, Instant};

/// Steepness of the logistic ease curve.
const EASE_STEEPNESS: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomPhase {
    Idle,
    Zooming,
}

/// Logistic ease-in/out on `[0, 1]`, rescaled so both endpoints are exact.
pub fn ease(t: f64) -> f64 {
    let sigmoid = |x: f64| 1.0 / (1.0 + (-EASE_STEEPNESS * (x - 0.5)).exp());
    let lo = sigmoid(0.0);
    let hi = sigmoid(1.0);
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else {
        (sigmoid(t) - lo) / (hi - lo)
    }
}

/// One zoom gesture: the two views and the number of frames between them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomSession {
    pub from: ViewBounds,
    pub to: ViewBounds,
    pub from_iterations: u32,
    pub to_iterations: u32,
    pub steps: u32,
}

impl ZoomSession {
    /// Request for frame `step` of `steps`. Step `steps` is the target view.
    pub fn request_at(&self, step: u32, state: &ViewState) -> ViewRequest {
        let t = ease(step as f64 / self.steps.max(1) as f64);
        let iterations = lerp(self.from_iterations as f64, self.to_iterations as f64, t).round();
        let mut params = state.params;
        params.max_iterations = iterations as u32;
        ViewRequest::new(self.from.interpolate(&self.to, t), &params)
    }
}

/// Zoom controller. Owns the adapted frame count between gestures.
#[derive(Clone, Debug)]
pub struct ZoomController {
    config: ZoomConfig,
    zoom_steps: u32,
    phase: ZoomPhase,
}

impl ZoomController {
    pub fn new(config: ZoomConfig) -> Self {
        Self {
            zoom_steps: config.zoom_steps.clamp(1, config.max_zoom_steps.max(1)),
            config,
            phase: ZoomPhase::Idle,
        }
    }

    pub fn config(&self) -> &ZoomConfig {
        &self.config
    }

    pub fn zoom_steps(&self) -> u32 {
        self.zoom_steps
    }

    pub fn phase(&self) -> ZoomPhase {
        self.phase
    }

    /// Map a cursor position in pixels to its point in the complex plane.
    pub fn cursor_point(state: &ViewState, cursor: (f64, f64)) -> (f64, f64) {
        let b = &state.bounds;
        (
            cursor.0 / state.params.resolution_x as f64 * b.width() + b.x_min,
            cursor.1 / state.params.resolution_y as f64 * b.height() + b.y_min,
        )
    }

    /// View and iteration budget after one gesture centred on `cursor`.
    pub fn target_view(
        &self,
        state: &ViewState,
        cursor: (f64, f64),
        direction: ZoomDirection,
    ) -> (ViewBounds, u32) {
        let (cx, cy) = Self::cursor_point(state, cursor);
        let scale = match direction {
            ZoomDirection::In => 1.0 / self.config.zoom_factor,
            ZoomDirection::Out => self.config.zoom_factor,
        };
        let half_w = state.bounds.width() / 2.0 * scale;
        let half_h = state.bounds.height() / 2.0 * scale;
        let bounds = ViewBounds {
            x_min: cx - half_w,
            x_max: cx + half_w,
            y_min: cy - half_h,
            y_max: cy + half_h,
        };

        let current = state.params.max_iterations as f64;
        let iterations = match direction {
            ZoomDirection::In => {
                let grown = (current * self.config.iters_factor) as u32;
                if self.config.iters_factor > 1.0 {
                    // Small budgets would otherwise truncate back to themselves
                    grown.max(state.params.max_iterations.saturating_add(1))
                } else {
                    grown
                }
            }
            ZoomDirection::Out => {
                ((current / self.config.iters_factor) as u32).max(self.config.min_iterations)
            }
        };
        (bounds, iterations)
    }

    /// Start a gesture from the current view.
    pub fn begin(
        &mut self,
        state: &ViewState,
        cursor: (f64, f64),
        direction: ZoomDirection,
    ) -> ZoomSession {
        let (to, to_iterations) = self.target_view(state, cursor, direction);
        self.phase = ZoomPhase::Zooming;
        ZoomSession {
            from: state.bounds,
            to,
            from_iterations: state.params.max_iterations,
            to_iterations,
            steps: self.zoom_steps,
        }
    }

    /// Run a full gesture, calling `render_frame` once per step.
    ///
    /// On success the target is committed into `state` and the frame count
    /// is adapted to the measured time. If a frame fails the view is left
    /// unchanged and the error is returned.
    pub fn zoom<F, E>(
        &mut self,
        state: &mut ViewState,
        cursor: (f64, f64),
        direction: ZoomDirection,
        mut render_frame: F,
    ) -> Result<Duration, E>
    where
        F: FnMut(&ViewRequest) -> Result<(), E>,
    {
        let session = self.begin(state, cursor, direction);
        let start = Instant::now();

        for step in 1..=session.steps {
            let request = session.request_at(step, state);
            if let Err(e) = render_frame(&request) {
                self.phase = ZoomPhase::Idle;
                return Err(e);
            }
        }

        let elapsed = start.elapsed();
        state.bounds = session.to;
        state.params.max_iterations = session.to_iterations;
        self.phase = ZoomPhase::Idle;

        log::info!(
            "Zoom {:?} over {} frames in {:.0}ms, {} iterations",
            direction,
            session.steps,
            elapsed.as_secs_f64() * 1000.0,
            state.params.max_iterations
        );
        self.adapt_steps(elapsed);
        Ok(elapsed)
    }

    /// Grow or shrink the frame count toward interactive gesture times.
    pub fn adapt_steps(&mut self, elapsed: Duration) {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let slow = self.config.slow_threshold_ms as f64;
        let fast = self.config.fast_threshold_ms as f64;
        let steps = self.zoom_steps as f64;

        let adapted = if elapsed_ms > slow {
            ((steps * slow / elapsed_ms).floor() as u32).max(1)
        } else if elapsed_ms < fast {
            let proportional = if elapsed_ms > 0.0 {
                (steps * fast / elapsed_ms).floor()
            } else {
                f64::INFINITY
            };
            let grown = proportional.min(self.config.max_zoom_steps as f64) as u32;
            grown
                .max(self.zoom_steps + 1)
                .min(self.config.max_zoom_steps)
        } else {
            self.zoom_steps
        };

        if adapted != self.zoom_steps {
            log::debug!("Zoom steps {} -> {}", self.zoom_steps, adapted);
        }
        self.zoom_steps = adapted.max(1);
    }

    /// Scale the iteration budget, floored at `min_iterations`.
    pub fn adjust_iterations(&self, state: &mut ViewState, factor: f64) {
        let scaled = (state.params.max_iterations as f64 * factor) as u32;
        state.params.max_iterations = scaled.max(self.config.min_iterations);
        log::info!("Iterations now {}", state.params.max_iterations);
    }

    /// Back to the whole-set view and the starting budget.
    pub fn reset(&mut self, state: &mut ViewState, config: &EngineConfig) {
        state.reset(config);
        self.phase = ZoomPhase::Idle;
    }
}

/// Click-and-drag panning with a small dead zone against jitter.
#[derive(Clone, Debug)]
pub struct PanTracker {
    dead_zone_px: f64,
    anchor: Option<(f64, f64)>,
    dragging: bool,
}

impl PanTracker {
    pub fn new(dead_zone_px: f64) -> Self {
        Self {
            dead_zone_px,
            anchor: None,
            dragging: false,
        }
    }

    pub fn press(&mut self, cursor: (f64, f64)) {
        self.anchor = Some(cursor);
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Follow the cursor. Returns true when the view moved.
    ///
    /// The content under the cursor stays under the cursor, so the bounds
    /// move opposite to the cursor delta.
    pub fn drag(&mut self, state: &mut ViewState, cursor: (f64, f64)) -> bool {
        let Some(anchor) = self.anchor else {
            return false;
        };
        let dx = cursor.0 - anchor.0;
        let dy = cursor.1 - anchor.1;
        if !self.dragging && dx.hypot(dy) <= self.dead_zone_px {
            return false;
        }
        self.dragging = true;

        let shift_x = dx / state.params.resolution_x as f64 * state.bounds.width();
        let shift_y = dy / state.params.resolution_y as f64 * state.bounds.height();
        let b = &mut state.bounds;
        b.x_min -= shift_x;
        b.x_max -= shift_x;
        b.y_min -= shift_y;
        b.y_max -= shift_y;

        self.anchor = Some(cursor);
        true
    }

    pub fn release(&mut self) {
        self.anchor = None;
        self.dragging = false;
    }
}
