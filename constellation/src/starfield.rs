//! Procedural star field: generated once per mount from the star index alone, so every run and
//! every replay shows the same sky.

use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    /// Normalized position.
    pub x: f32,
    pub y: f32,
    /// Base radius in logical px.
    pub radius: f32,
    /// Parallax weight.
    pub depth: f32,
    pub phase: f32,
}

/// `fract(sin(seed) * 10000)`.
pub fn seeded(seed: f64) -> f32 {
    let value = seed.sin() * 10000.0;
    (value - value.floor()) as f32
}

#[derive(Debug, Clone, PartialEq)]
pub struct StarField {
    stars: Vec<Star>,
}

impl StarField {
    pub fn generate(count: usize) -> Self {
        let stars = (0..count)
            .map(|i| {
                let i = i as f64;
                Star {
                    x: seeded(i * 31.77),
                    y: seeded(i * 41.37),
                    radius: 0.45 + seeded(i * 71.3) * 1.7,
                    depth: 0.34 + seeded(i * 15.9) * 1.2,
                    phase: seeded(i * 91.1) * TAU,
                }
            })
            .collect();
        Self { stars }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }
}

/// Per-frame inputs for placing a star.
#[derive(Debug, Clone, Copy)]
pub struct SkyFrame {
    pub width: f32,
    pub height: f32,
    /// Frame time in ms since mount.
    pub time_ms: f32,
    pub scene_age_secs: f32,
    pub scene_ordinal: u32,
    /// Smoothed pointer offset, -0.5..0.5 on each axis.
    pub pointer: (f32, f32),
    pub intro_reveal_rate: f32,
    pub intro: bool,
    pub reduced_motion: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedStar {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub alpha: f32,
}

/// Twinkle factor applied to a star's radius.
pub fn twinkle(time_ms: f32, phase: f32, reduced_motion: bool) -> f32 {
    if reduced_motion {
        0.86
    } else {
        0.64 + (time_ms * 0.0012 + phase).sin() * 0.16
    }
}

/// Where (and whether) star `index` of `count` is drawn this frame.
pub fn place(star: &Star, index: usize, count: usize, frame: &SkyFrame) -> Option<PlacedStar> {
    let gate = if frame.intro {
        (frame.scene_age_secs * frame.intro_reveal_rate - index as f32 / count.max(1) as f32)
            .max(0.0)
            .min(1.0)
    } else {
        1.0
    };
    if gate <= 0.0 {
        return None;
    }

    let (px, py) = if frame.reduced_motion {
        (0.0, 0.0)
    } else {
        frame.pointer
    };
    let mut x = star.x * frame.width + px * star.depth * 10.0;
    let mut y = star.y * frame.height + py * star.depth * 7.0;

    if frame.scene_ordinal >= 2 && !frame.reduced_motion {
        let cx = frame.width * 0.5;
        let cy = frame.height * 0.42;
        let i = index as f32;
        x += (cx - x) * 0.00045 * ((frame.time_ms * 0.001 + i).sin() + 1.4);
        y += (cy - y) * 0.00045 * ((frame.time_ms * 0.0012 + i).cos() + 1.4);
    }

    let reveal = (frame.scene_ordinal as f32 / 4.0).min(1.0);
    Some(PlacedStar {
        x,
        y,
        radius: star.radius * twinkle(frame.time_ms, star.phase, frame.reduced_motion),
        alpha: (0.14 + reveal * 0.4) * gate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(intro: bool, age: f32) -> SkyFrame {
        SkyFrame {
            width: 800.0,
            height: 600.0,
            time_ms: 1000.0,
            scene_age_secs: age,
            scene_ordinal: 1,
            pointer: (0.2, -0.1),
            intro_reveal_rate: 0.22,
            intro,
            reduced_motion: false,
        }
    }

    #[test]
    fn generation_is_deterministic_and_in_range() {
        let a = StarField::generate(220);
        let b = StarField::generate(220);
        assert_eq!(a, b);
        for s in a.stars() {
            assert!((0.0..1.0).contains(&s.x));
            assert!((0.0..1.0).contains(&s.y));
            assert!((0.45..=2.15).contains(&s.radius));
            assert!((0.34..=1.54).contains(&s.depth));
        }
    }

    #[test]
    fn first_star_uses_seed_zero() {
        let s = StarField::generate(1).stars()[0];
        assert_eq!(s.x, 0.0);
        assert_eq!(s.radius, 0.45);
    }

    #[test]
    fn intro_gate_staggers_by_index() {
        let field = StarField::generate(100);
        let f = frame(true, 1.0);
        // age 1s * 0.22 = 0.22: stars past 22% of the list are still hidden.
        assert!(place(&field.stars()[10], 10, 100, &f).is_some());
        assert!(place(&field.stars()[50], 50, 100, &f).is_none());
        assert!(place(&field.stars()[50], 50, 100, &frame(false, 0.0)).is_some());
    }

    #[test]
    fn reduced_motion_disables_parallax_and_twinkle() {
        let star = Star {
            x: 0.5,
            y: 0.5,
            radius: 1.0,
            depth: 1.0,
            phase: 0.0,
        };
        let mut f = frame(false, 0.0);
        f.reduced_motion = true;
        let placed = place(&star, 0, 1, &f).unwrap();
        assert_eq!((placed.x, placed.y), (400.0, 300.0));
        assert_eq!(placed.radius, 0.86);
    }
}
