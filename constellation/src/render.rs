//! Per-frame painter for the sky.
//!
//! Layers, back to front: background gradient, moonlight beams, parallax stars, center light,
//! path reveal, highlight dots and wave, ripples and bursts, hold ring, trace stars, vignette and
//! warm grade. All geometry is computed in logical px and scaled to the backing store.
//! The only state kept here is per-frame presentation state (the smoothed pointer).

use std::f32::consts::{FRAC_PI_2, TAU};
use std::time::{Duration, Instant};

use engine::graphics::{Color, Renderer2d, alpha_u8};
use engine::ui::Rect;

use crate::assets::{PointSets, Vec2};
use crate::config::{AmbientEffects, MotionPolicy, Tunables};
use crate::effects::Effects;
use crate::layout::{HOLD_RING_RADIUS, SceneLayout};
use crate::path::{Polyline, reveal_progress};
use crate::scene::SceneKind;
use crate::starfield::{SkyFrame, StarField, place};

pub const BG_TOP: Color = [7, 9, 24, 255];
pub const BG_BOTTOM: Color = [22, 17, 42, 255];
const STAR: Color = [233, 228, 246, 255];
const PATH: Color = [228, 218, 246, 255];
const PATH_GLOW: Color = [180, 166, 235, 255];
const DOT: Color = [251, 244, 230, 255];
const DOT_HALO: Color = [224, 192, 144, 255];
const WAVE: Color = [251, 233, 198, 255];
const BEAM: Color = [236, 227, 200, 255];
const RIPPLE: Color = [214, 204, 248, 255];
const RING_TRACK: Color = [196, 186, 228, 255];
const RING_PROGRESS: Color = [251, 226, 180, 255];
const WARM: Color = [255, 184, 140, 255];
const SHADOW: Color = [0, 0, 0, 255];

const BACKGROUND_BANDS: u32 = 24;
const POINTER_SMOOTHING: f32 = 6.0;

/// Everything the painter reads from the rest of the experience for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub width: f32,
    pub height: f32,
    pub kind: SceneKind,
    pub scene_age: Duration,
    /// ms since mount; drives twinkle and drift.
    pub time_ms: f32,
    pub hold_progress: f32,
    pub light_on: bool,
    pub trace_points: &'a [Vec2],
    pub trace_next: usize,
    pub effects: &'a Effects,
    pub layout: &'a SceneLayout,
    pub now: Instant,
}

pub fn lerp_color(a: Color, b: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2]), 255]
}

#[derive(Debug)]
pub struct SceneRenderer {
    stars: StarField,
    points: PointSets,
    motion: MotionPolicy,
    tunables: Tunables,
    ambient: AmbientEffects,
    pointer_target: (f32, f32),
    pointer: (f32, f32),
    last_frame: Option<Instant>,
}

impl SceneRenderer {
    pub fn new(
        points: PointSets,
        motion: MotionPolicy,
        tunables: Tunables,
        ambient: AmbientEffects,
    ) -> Self {
        Self {
            stars: StarField::generate(motion.star_count(&tunables)),
            points,
            motion,
            tunables,
            ambient,
            pointer_target: (0.0, 0.0),
            pointer: (0.0, 0.0),
            last_frame: None,
        }
    }

    pub fn stars(&self) -> &StarField {
        &self.stars
    }

    pub fn points(&self) -> &PointSets {
        &self.points
    }

    /// Records the pointer as a -0.5..0.5 offset from the viewport centre.
    pub fn track_pointer(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if self.motion.reduced_motion || !(width >= 1.0 && height >= 1.0) {
            return;
        }
        self.pointer_target = (
            (x / width - 0.5).clamp(-0.5, 0.5),
            (y / height - 0.5).clamp(-0.5, 0.5),
        );
    }

    pub fn smoothed_pointer(&self) -> (f32, f32) {
        self.pointer
    }

    /// Forgets the per-frame presentation state.
    pub fn reset(&mut self) {
        self.pointer = (0.0, 0.0);
        self.pointer_target = (0.0, 0.0);
        self.last_frame = None;
    }

    pub fn path_reveal(&self, kind: SceneKind, scene_age: Duration) -> f32 {
        if !kind.reveals_path() {
            return 0.0;
        }
        reveal_progress(scene_age, self.tunables.path_reveal_rate, self.motion.reduced_motion)
    }

    pub fn draw(&mut self, gfx: &mut dyn Renderer2d, view: &FrameView<'_>) {
        self.smooth_pointer(view.now);

        let size = gfx.size();
        if size.is_empty() || !(view.width >= 1.0 && view.height >= 1.0) {
            return;
        }
        let s = size.width as f32 / view.width;

        self.draw_background(gfx, view);
        if self.ambient.moonlight_beams {
            self.draw_beams(gfx, view, s);
        }
        self.draw_stars(gfx, view, s);
        if view.kind == SceneKind::Glow && self.ambient.center_light {
            self.draw_center_light(gfx, view, s);
        }
        if view.kind.reveals_path() {
            self.draw_path_and_dots(gfx, view, s);
        }
        self.draw_effects(gfx, view, s);
        if view.kind == SceneKind::Hold {
            self.draw_hold_ring(gfx, view, s);
        }
        if view.kind == SceneKind::Trace {
            self.draw_trace(gfx, view, s);
        }
        self.draw_grade(gfx, view);
    }

    fn smooth_pointer(&mut self, now: Instant) {
        let dt = self
            .last_frame
            .map_or(0.0, |last| now.saturating_duration_since(last).as_secs_f32())
            .min(0.25);
        self.last_frame = Some(now);
        let k = 1.0 - (-dt * POINTER_SMOOTHING).exp();
        self.pointer.0 += (self.pointer_target.0 - self.pointer.0) * k;
        self.pointer.1 += (self.pointer_target.1 - self.pointer.1) * k;
    }

    fn draw_background(&self, gfx: &mut dyn Renderer2d, view: &FrameView<'_>) {
        let size = gfx.size();
        let warm = if view.kind.reveals_path() { 0.12 } else { 0.0 };
        let bottom = lerp_color(BG_BOTTOM, WARM, warm);
        for band in 0..BACKGROUND_BANDS {
            let y0 = size.height * band / BACKGROUND_BANDS;
            let y1 = size.height * (band + 1) / BACKGROUND_BANDS;
            let t = band as f32 / (BACKGROUND_BANDS - 1) as f32;
            gfx.fill_rect(
                Rect::new(0, y0, size.width, y1.saturating_sub(y0)),
                lerp_color(BG_TOP, bottom, t),
            );
        }
    }

    fn draw_beams(&self, gfx: &mut dyn Renderer2d, view: &FrameView<'_>, s: f32) {
        let size = gfx.size();
        let motion = if self.motion.reduced_motion {
            0.0
        } else {
            view.time_ms * 0.00005
        };
        let flash = view.effects.beam.level(view.now);
        let later = if view.kind.ordinal() >= SceneKind::Glow.ordinal() { 0.035 } else { 0.0 };
        let alpha = 0.08 + later + flash * 0.08;

        for i in 0..3 {
            let angle = (-0.8 + i as f32 * 0.35) + motion * (i + 1) as f32;
            let cx = view.width * (0.5 + angle.sin() * 0.28) * s;
            let beam_w = view.width * 0.24 * s;
            // Nested columns, widest first, fading towards the bottom.
            for layer in 0..4u32 {
                let w = beam_w * (1.0 - layer as f32 * 0.22);
                let x0 = (cx - w / 2.0).max(0.0);
                let x1 = (cx + w / 2.0).min(size.width as f32);
                if x1 <= x0 {
                    continue;
                }
                for seg in 0..4u32 {
                    let y0 = size.height * seg / 4;
                    let y1 = size.height * (seg + 1) / 4;
                    let a = alpha * 0.3 * (1.0 - seg as f32 * 0.24);
                    gfx.blend_rect(
                        Rect::new(x0 as u32, y0, (x1 - x0) as u32, y1 - y0),
                        BEAM,
                        alpha_u8(a),
                    );
                }
            }
        }
    }

    fn draw_stars(&self, gfx: &mut dyn Renderer2d, view: &FrameView<'_>, s: f32) {
        let sky = SkyFrame {
            width: view.width,
            height: view.height,
            time_ms: view.time_ms,
            scene_age_secs: view.scene_age.as_secs_f32(),
            scene_ordinal: view.kind.ordinal(),
            pointer: self.pointer,
            intro_reveal_rate: self.tunables.intro_star_reveal_rate,
            intro: view.kind == SceneKind::Intro,
            reduced_motion: self.motion.reduced_motion,
        };
        let count = self.stars.len();
        for (i, star) in self.stars.stars().iter().enumerate() {
            if let Some(p) = place(star, i, count, &sky) {
                gfx.blend_circle(p.x * s, p.y * s, p.radius * s, STAR, p.alpha);
            }
        }
    }

    fn draw_center_light(&self, gfx: &mut dyn Renderer2d, view: &FrameView<'_>, s: f32) {
        let (cx, cy) = view.layout.center_light.center();
        let breathe = if self.motion.reduced_motion {
            1.0
        } else {
            1.0 + (view.time_ms * 0.0018).sin() * 0.06
        };
        let (strength, radius) = if view.light_on { (1.0, 40.0) } else { (0.55, 26.0) };
        for ring in 0..4 {
            let r = radius * breathe * (1.0 + ring as f32 * 0.45);
            gfx.blend_circle(cx * s, cy * s, r * s, DOT_HALO, 0.09 * strength);
        }
        gfx.blend_circle(cx * s, cy * s, 7.0 * breathe * s, DOT, 0.85 * strength);
    }

    fn draw_path_and_dots(&self, gfx: &mut dyn Renderer2d, view: &FrameView<'_>, s: f32) {
        let line = Polyline::scaled(&self.points.reveal, view.width * s, view.height * s);
        let progress = self.path_reveal(view.kind, view.scene_age);
        let width = if self.motion.low_power { 1.45 } else { 1.8 } * s;
        draw_polyline(gfx, &line.truncated(progress), width * 4.0, PATH_GLOW, 0.12);
        draw_polyline(gfx, &line.truncated(progress), width, PATH, 0.92);

        let wave = view.effects.wave.level(view.now);
        if view.kind == SceneKind::Resolved && wave > 0.0 {
            draw_polyline(
                gfx,
                line.points(),
                (2.4 + wave * 1.8) * s,
                WAVE,
                0.74 + wave * 0.2,
            );
        }

        let pulse = if self.motion.reduced_motion {
            0.75
        } else {
            0.7 + (view.time_ms * 0.0022).sin() * 0.08
        };
        let shimmer = view.effects.shimmer.level(view.now);
        let r = 2.7 + pulse + shimmer * 1.2;
        for p in self.points.reveal_dots() {
            let c = p.scaled(view.width * s, view.height * s);
            gfx.blend_circle(c.x, c.y, (r + 5.0 + shimmer * 3.0) * s, DOT_HALO, 0.14);
            gfx.blend_circle(c.x, c.y, r * s, DOT, 0.75 + shimmer * 0.2);
        }
    }

    fn draw_effects(&self, gfx: &mut dyn Renderer2d, view: &FrameView<'_>, s: f32) {
        for ripple in view.effects.ripples() {
            let (radius, alpha) = view.effects.ripple_shape(ripple, view.now);
            gfx.blend_ring(
                ripple.x * s,
                ripple.y * s,
                radius * s,
                1.6 * s,
                0.0,
                TAU,
                RIPPLE,
                alpha,
            );
        }
        for burst in view.effects.bursts() {
            let t = view.effects.burst_progress(burst, view.now);
            let eased = 1.0 - (1.0 - t) * (1.0 - t);
            for p in &burst.particles {
                let x = burst.x + p.angle.cos() * p.reach * eased;
                let y = burst.y + p.angle.sin() * p.reach * eased;
                gfx.blend_circle(x * s, y * s, p.size * s, WAVE, 1.0 - t);
            }
        }
    }

    fn draw_hold_ring(&self, gfx: &mut dyn Renderer2d, view: &FrameView<'_>, s: f32) {
        let (cx, cy) = view.layout.hold_button.center();
        let (cx, cy, r) = (cx * s, cy * s, HOLD_RING_RADIUS * 2.0 * s);
        gfx.blend_circle(cx, cy, r + 6.0 * s, DOT_HALO, 0.06 + view.hold_progress * 0.12);
        gfx.blend_ring(cx, cy, r, 4.0 * s, 0.0, TAU, RING_TRACK, 0.28);
        if view.hold_progress > 0.0 {
            gfx.blend_ring(
                cx,
                cy,
                r,
                4.0 * s,
                -FRAC_PI_2,
                view.hold_progress.min(1.0) * TAU,
                RING_PROGRESS,
                0.95,
            );
        }
    }

    fn draw_trace(&self, gfx: &mut dyn Renderer2d, view: &FrameView<'_>, s: f32) {
        let scaled: Vec<Vec2> = view
            .trace_points
            .iter()
            .map(|p| Vec2::new(p.x * s, p.y * s))
            .collect();
        let done = view.trace_next.min(scaled.len());
        if done >= 2 {
            draw_polyline(gfx, &scaled[..done], 1.6 * s, PATH, 0.85);
        }
        let pulse = if self.motion.reduced_motion {
            1.0
        } else {
            0.5 + 0.5 * (view.time_ms * 0.004).sin()
        };
        for (i, p) in scaled.iter().enumerate() {
            if i < done {
                gfx.blend_circle(p.x, p.y, 4.2 * s, DOT, 0.95);
            } else if i == done {
                gfx.blend_ring(
                    p.x,
                    p.y,
                    (10.0 + pulse * 4.0) * s,
                    1.4 * s,
                    0.0,
                    TAU,
                    RIPPLE,
                    0.35 + pulse * 0.3,
                );
                gfx.blend_circle(p.x, p.y, 3.6 * s, DOT, 0.9);
            } else {
                gfx.blend_circle(p.x, p.y, 2.6 * s, STAR, 0.5);
            }
        }
    }

    fn draw_grade(&self, gfx: &mut dyn Renderer2d, view: &FrameView<'_>) {
        let size = gfx.size();
        if view.kind.reveals_path() {
            let warmth = if view.kind == SceneKind::Resolved { 0.07 } else { 0.035 };
            gfx.blend_rect(Rect::from_size(size.width, size.height), WARM, alpha_u8(warmth));
        }
        if !self.ambient.vignette {
            return;
        }
        let steps = 8u32;
        let band = (size.width.min(size.height) / 40).max(1);
        for k in 0..steps {
            let a = alpha_u8(0.08 * (1.0 - k as f32 / steps as f32));
            let off = k * band;
            if off * 2 >= size.width || off * 2 >= size.height {
                break;
            }
            let inner_w = size.width - off * 2;
            let inner_h = size.height - off * 2;
            gfx.blend_rect(Rect::new(off, off, inner_w, band), SHADOW, a);
            gfx.blend_rect(
                Rect::new(off, (off + inner_h).saturating_sub(band), inner_w, band),
                SHADOW,
                a,
            );
            let side_h = inner_h.saturating_sub(band * 2);
            gfx.blend_rect(Rect::new(off, off + band, band, side_h), SHADOW, a);
            gfx.blend_rect(
                Rect::new((off + inner_w).saturating_sub(band), off + band, band, side_h),
                SHADOW,
                a,
            );
        }
    }
}

fn draw_polyline(gfx: &mut dyn Renderer2d, points: &[Vec2], width: f32, color: Color, alpha: f32) {
    for pair in points.windows(2) {
        gfx.blend_segment(pair[0].x, pair[0].y, pair[1].x, pair[1].y, width, color, alpha);
    }
}
