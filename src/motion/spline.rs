//! Cyclic trajectory interpolator.
//!
//! Fits a piecewise-cubic Hermite curve through an ordered cyclic set of
//! (phase, value) control points, with tangents chosen by cyclic central
//! differences (Catmull-Rom). The result is continuous and
//! first-derivative-continuous at every control point, including the wrap
//! segment from the last point back to the first.
//!
//! `fit` runs once per pattern (O(n)); `evaluate` is a segment lookup plus
//! one cubic. The motion controller re-fits only when the active pattern's
//! identity changes, never per tick — the cached coefficients always
//! correspond to the most recently fitted pattern.

use crate::motion::patterns::PatternPoint;

/// Upper bound on control points per pattern; sized for the largest wave
/// table with headroom.
const MAX_POINTS: usize = 16;

/// One fitted Hermite segment spanning `[start, start + span)` in phase.
#[derive(Debug, Clone, Copy)]
struct Segment {
    start: f32,
    span: f32,
    y0: f32,
    y1: f32,
    m0: f32,
    m1: f32,
}

/// Phase distance from point `a` forward to point `b`, wrapping the cycle.
fn forward_span(a: f32, b: f32) -> f32 {
    let d = b - a;
    if d > 0.0 {
        d
    } else {
        d + 1.0
    }
}

#[derive(Debug)]
pub struct TrajectoryInterpolator {
    segments: heapless::Vec<Segment, MAX_POINTS>,
    /// Fallback for degenerate patterns (fewer than two points).
    flat_value: f32,
}

impl Default for TrajectoryInterpolator {
    fn default() -> Self {
        Self::new()
    }
}

impl TrajectoryInterpolator {
    pub fn new() -> Self {
        Self {
            segments: heapless::Vec::new(),
            flat_value: 0.0,
        }
    }

    /// Compute segment coefficients for `pattern`. Patterns longer than
    /// [`MAX_POINTS`] are truncated; degenerate patterns (0 or 1 points)
    /// evaluate as a constant.
    pub fn fit(&mut self, pattern: &[PatternPoint]) {
        self.segments.clear();
        let pattern = &pattern[..pattern.len().min(MAX_POINTS)];
        let n = pattern.len();

        if n < 2 {
            self.flat_value = pattern.first().map_or(0.0, |pt| pt.value);
            return;
        }

        for i in 0..n {
            let prev = pattern[(i + n - 1) % n];
            let here = pattern[i];
            let next = pattern[(i + 1) % n];
            let after = pattern[(i + 2) % n];

            let span = forward_span(here.phase, next.phase);

            // Central-difference tangents over the cyclic neighbours.
            let reach_here = forward_span(prev.phase, here.phase) + span;
            let reach_next = span + forward_span(next.phase, after.phase);
            let m0 = (next.value - prev.value) / reach_here;
            let m1 = (after.value - here.value) / reach_next;

            // Capacity bounded by MAX_POINTS above.
            let _ = self.segments.push(Segment {
                start: here.phase,
                span,
                y0: here.value,
                y1: next.value,
                m0,
                m1,
            });
        }
    }

    /// Interpolated value at `phase`; any real input is wrapped into [0, 1).
    pub fn evaluate(&self, phase: f32) -> f32 {
        if self.segments.is_empty() {
            return self.flat_value;
        }

        let phase = phase - phase.floor();

        // Segments are stored in ascending start order; the wrap segment is
        // last. Scan for the last start <= phase; phases before the first
        // control point fall into the wrap segment.
        let seg = self
            .segments
            .iter()
            .rev()
            .find(|s| s.start <= phase)
            .unwrap_or(&self.segments[self.segments.len() - 1]);

        let mut local = phase - seg.start;
        if local < 0.0 {
            local += 1.0;
        }
        let s = (local / seg.span).clamp(0.0, 1.0);

        // Cubic Hermite basis.
        let s2 = s * s;
        let s3 = s2 * s;
        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        h00 * seg.y0 + h10 * seg.span * seg.m0 + h01 * seg.y1 + h11 * seg.span * seg.m1
    }
}
