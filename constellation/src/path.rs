use std::time::Duration;

use crate::assets::Vec2;

/// A polyline with precomputed cumulative arc lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    points: Vec<Vec2>,
    cumulative: Vec<f32>,
}

impl Polyline {
    pub fn new(points: Vec<Vec2>) -> Self {
        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                total += points[i - 1].distance(*p);
            }
            cumulative.push(total);
        }
        Self { points, cumulative }
    }

    /// Normalized points mapped into a `width` x `height` area.
    pub fn scaled(points: &[Vec2], width: f32, height: f32) -> Self {
        Self::new(points.iter().map(|p| p.scaled(width, height)).collect())
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn total_length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// The prefix of the polyline covering `progress` (0..1) of its arc length, ending with an
    /// interpolated point inside the segment where the cut falls.
    pub fn truncated(&self, progress: f32) -> Vec<Vec2> {
        let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        if progress <= 0.0 || self.points.is_empty() {
            return Vec::new();
        }
        let target = self.total_length() * progress;

        let mut out = vec![self.points[0]];
        for i in 1..self.points.len() {
            if self.cumulative[i] <= target {
                out.push(self.points[i]);
                continue;
            }
            let seg = self.cumulative[i] - self.cumulative[i - 1];
            let remain = target - self.cumulative[i - 1];
            if remain > 0.0 && seg > 0.0 {
                out.push(self.points[i - 1].lerp(self.points[i], remain / seg));
            }
            break;
        }
        out
    }
}

/// `min(age * rate, 1)`; always 1 under reduced motion.
pub fn reveal_progress(scene_age: Duration, rate_per_sec: f32, reduced_motion: bool) -> f32 {
    if reduced_motion {
        return 1.0;
    }
    (scene_age.as_secs_f32() * rate_per_sec).clamp(0.0, 1.0)
}
