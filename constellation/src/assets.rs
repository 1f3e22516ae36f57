//! Static point sets and narrative copy.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn lerp(self, other: Vec2, t: f32) -> Vec2 {
        Vec2::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Maps a normalized (0..1) point into a `width` x `height` area.
    pub fn scaled(self, width: f32, height: f32) -> Vec2 {
        Vec2::new(self.x * width, self.y * height)
    }
}

/// Heart outline, closed (first == last).
pub const HEART_CONSTELLATION: [Vec2; 11] = [
    Vec2::new(0.5, 0.69),
    Vec2::new(0.38, 0.61),
    Vec2::new(0.3, 0.5),
    Vec2::new(0.34, 0.4),
    Vec2::new(0.43, 0.36),
    Vec2::new(0.5, 0.44),
    Vec2::new(0.57, 0.36),
    Vec2::new(0.66, 0.4),
    Vec2::new(0.7, 0.5),
    Vec2::new(0.62, 0.61),
    Vec2::new(0.5, 0.69),
];

/// Stars touched in order during the trace pre-stage.
pub const TRACE_CONSTELLATION: [Vec2; 5] = [
    Vec2::new(0.26, 0.36),
    Vec2::new(0.38, 0.27),
    Vec2::new(0.5, 0.33),
    Vec2::new(0.62, 0.26),
    Vec2::new(0.74, 0.35),
];

/// The two immutable coordinate sequences the experience draws and hit-tests against.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSets {
    pub reveal: Vec<Vec2>,
    pub trace: Vec<Vec2>,
}

impl Default for PointSets {
    fn default() -> Self {
        Self {
            reveal: HEART_CONSTELLATION.to_vec(),
            trace: TRACE_CONSTELLATION.to_vec(),
        }
    }
}

impl PointSets {
    /// Highlight dots: the reveal path without its closing duplicate vertex.
    pub fn reveal_dots(&self) -> &[Vec2] {
        match self.reveal.split_last() {
            Some((last, rest)) if rest.first() == Some(last) => rest,
            _ => &self.reveal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeText {
    pub trace_hint: String,
    pub intro: Vec<String>,
    pub glow: Vec<String>,
    pub memory: Vec<String>,
    pub question: Vec<String>,
    pub ask: String,
    pub hold_label: String,
    pub hold_button: String,
    pub resolved_heading: String,
    pub promises: Vec<String>,
    pub continue_label: String,
    pub replay_label: String,
    pub debug_label: String,
    /// Decorative line shown on the resolved scene when no provider has delivered one.
    pub fallback_quote: String,
}

fn lines(src: &[&str]) -> Vec<String> {
    src.iter().map(|s| s.to_string()).collect()
}

impl Default for NarrativeText {
    fn default() -> Self {
        Self {
            trace_hint: "Touch the stars in order.".into(),
            intro: lines(&["Before you\u{2026}", "\u{2026}the world felt bigger."]),
            glow: lines(&["Then I found my home."]),
            memory: lines(&[
                "The first time you smiled at me, something in me settled.",
                "The way you say my name feels like a promise.",
                "In your quiet presence, my whole life breathes easier.",
            ]),
            question: lines(&["With you\u{2026}", "\u{2026}everything feels right."]),
            ask: "Anusha, will you be my Valentine?".into(),
            hold_label: "Hold to make it ours.".into(),
            hold_button: "Hold".into(),
            resolved_heading: "Always.".into(),
            promises: lines(&[
                "My heart rests with you.",
                "I choose you.",
                "Today.",
                "Tomorrow.",
                "Every day.",
            ]),
            continue_label: "Continue".into(),
            replay_label: "Begin again".into(),
            debug_label: "Input Debug".into(),
            fallback_quote: "Love is composed of a single soul inhabiting two bodies.".into(),
        }
    }
}
