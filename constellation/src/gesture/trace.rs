use crate::assets::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceStep {
    /// Point `index` committed; more remain.
    Point(usize),
    /// The last point was committed.
    Complete(usize),
}

/// Which trace star is expected next.
#[derive(Debug, Clone, Default)]
pub struct TraceProgress {
    next: usize,
}

impl TraceProgress {
    pub fn expected(&self) -> usize {
        self.next
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }

    /// Tests a tap against the expected point. `points` are already in logical px.
    pub fn select(&mut self, points: &[Vec2], tap: Vec2, snap_radius: f32) -> Option<TraceStep> {
        let target = *points.get(self.next)?;
        if tap.distance(target) > snap_radius {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(if self.next == points.len() {
            TraceStep::Complete(index)
        } else {
            TraceStep::Point(index)
        })
    }
}

/// Small idle drift applied to trace stars, in logical px. Zero under reduced motion.
pub fn bob(index: usize, time_ms: f32, reduced_motion: bool) -> Vec2 {
    if reduced_motion {
        return Vec2::new(0.0, 0.0);
    }
    let i = index as f32;
    Vec2::new(
        (time_ms * 0.0011 + i * 1.7).sin() * 2.5,
        (time_ms * 0.0014 + i * 0.9).cos() * 2.5,
    )
}

/// Trace points mapped into the viewport, including the drift at `time_ms`.
pub fn trace_positions(
    points: &[Vec2],
    width: f32,
    height: f32,
    time_ms: f32,
    reduced_motion: bool,
) -> Vec<Vec2> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let drift = bob(i, time_ms, reduced_motion);
            let base = p.scaled(width, height);
            Vec2::new(base.x + drift.x, base.y + drift.y)
        })
        .collect()
}
