use std::f32::consts::TAU;

use crate::{surface::SurfaceSize, ui::Rect};

pub type Color = [u8; 4];

// Tiny block font (3x5 cells); no font loading in the frame path.
pub const DEFAULT_TEXT_SCALE: u32 = 2;
const GLYPH_W: u32 = 3;
const GLYPH_H: u32 = 5;

pub fn glyph_advance_x(scale: u32) -> u32 {
    (GLYPH_W + 1) * scale.max(1)
}

pub fn line_advance_y(scale: u32) -> u32 {
    (GLYPH_H + 1) * scale.max(1)
}

/// Pixel width of a single line of `text` at `scale` (no trailing gap).
pub fn text_width(text: &str, scale: u32) -> u32 {
    let n = text.chars().count() as u32;
    if n == 0 {
        return 0;
    }
    glyph_advance_x(scale)
        .saturating_mul(n)
        .saturating_sub(scale.max(1))
}

/// Maps a 0..1 opacity to the 0..255 alpha `blend_rect` expects. NaN maps to 0.
pub fn alpha_u8(alpha: f32) -> u8 {
    if alpha.is_nan() {
        return 0;
    }
    (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Unified 2D rendering interface.
///
/// Everything above the rasterizer draws through this trait. The four required primitives are
/// axis-aligned; circles, rings and thick segments have default implementations that reduce to
/// one-pixel-high `blend_rect` spans, so every pixel of a shape is blended exactly once.
pub trait Renderer2d {
    fn begin_frame(&mut self, size: SurfaceSize);
    fn size(&self) -> SurfaceSize;

    /// Opaque fill.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Alpha-blended rect over existing content (alpha is applied to `color`'s RGB).
    fn blend_rect(&mut self, rect: Rect, color: Color, alpha: u8);

    fn draw_text_scaled(&mut self, x: u32, y: u32, text: &str, color: Color, scale: u32);

    fn draw_text(&mut self, x: u32, y: u32, text: &str, color: Color) {
        self.draw_text_scaled(x, y, text, color, DEFAULT_TEXT_SCALE);
    }

    fn clear(&mut self, color: Color) {
        let s = self.size();
        self.fill_rect(Rect::from_size(s.width, s.height), color);
    }

    fn rect_outline(&mut self, rect: Rect, color: Color) {
        if rect.w == 0 || rect.h == 0 {
            return;
        }
        self.fill_rect(Rect::new(rect.x, rect.y, rect.w, 1), color);
        self.fill_rect(
            Rect::new(rect.x, (rect.y + rect.h).saturating_sub(1), rect.w, 1),
            color,
        );
        self.fill_rect(Rect::new(rect.x, rect.y, 1, rect.h), color);
        self.fill_rect(
            Rect::new((rect.x + rect.w).saturating_sub(1), rect.y, 1, rect.h),
            color,
        );
    }

    /// Filled disc. Sub-pixel radii collapse to one pixel whose alpha is scaled by disc area.
    fn blend_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color, alpha: f32) {
        if !(radius > 0.0) || !cx.is_finite() || !cy.is_finite() {
            return;
        }
        if radius < 0.75 {
            let coverage = (std::f32::consts::PI * radius * radius).min(1.0);
            let a = alpha_u8(alpha * coverage);
            let size = self.size();
            if a == 0 || cx < 0.0 || cy < 0.0 {
                return;
            }
            let (x, y) = (cx.floor() as u32, cy.floor() as u32);
            if x < size.width && y < size.height {
                self.blend_rect(Rect::new(x, y, 1, 1), color, a);
            }
            return;
        }
        let r2 = radius * radius;
        blend_coverage(
            self,
            (cx - radius, cy - radius, cx + radius, cy + radius),
            color,
            alpha_u8(alpha),
            |px, py| {
                let dx = px - cx;
                let dy = py - cy;
                dx * dx + dy * dy <= r2
            },
        );
    }

    /// Ring arc of `thickness` around `radius`, starting at `start_angle` (radians, y-down) and
    /// sweeping clockwise by `sweep` radians. `sweep >= TAU` draws the full ring.
    fn blend_ring(
        &mut self,
        cx: f32,
        cy: f32,
        radius: f32,
        thickness: f32,
        start_angle: f32,
        sweep: f32,
        color: Color,
        alpha: f32,
    ) {
        if !(radius > 0.0) || !(thickness > 0.0) || !(sweep > 0.0) {
            return;
        }
        let half = thickness / 2.0;
        let outer = radius + half;
        let full = sweep >= TAU;
        blend_coverage(
            self,
            (cx - outer, cy - outer, cx + outer, cy + outer),
            color,
            alpha_u8(alpha),
            |px, py| {
                let dx = px - cx;
                let dy = py - cy;
                let d = (dx * dx + dy * dy).sqrt();
                if (d - radius).abs() > half {
                    return false;
                }
                full || (dy.atan2(dx) - start_angle).rem_euclid(TAU) <= sweep
            },
        );
    }

    /// Thick line segment with round caps.
    fn blend_segment(
        &mut self,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        width: f32,
        color: Color,
        alpha: f32,
    ) {
        if !(width > 0.0) {
            return;
        }
        let half = (width / 2.0).max(0.5);
        let (vx, vy) = (x1 - x0, y1 - y0);
        let len2 = vx * vx + vy * vy;
        blend_coverage(
            self,
            (
                x0.min(x1) - half,
                y0.min(y1) - half,
                x0.max(x1) + half,
                y0.max(y1) + half,
            ),
            color,
            alpha_u8(alpha),
            |px, py| {
                let t = if len2 > 0.0 {
                    (((px - x0) * vx + (py - y0) * vy) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let dx = px - (x0 + vx * t);
                let dy = py - (y0 + vy * t);
                dx * dx + dy * dy <= half * half
            },
        );
    }
}

/// Scans pixel centres inside `bounds` (clipped to the target) and blends each horizontal run
/// for which `inside` holds as a single span.
fn blend_coverage<R, F>(gfx: &mut R, bounds: (f32, f32, f32, f32), color: Color, alpha: u8, inside: F)
where
    R: Renderer2d + ?Sized,
    F: Fn(f32, f32) -> bool,
{
    if alpha == 0 {
        return;
    }
    let size = gfx.size();
    let (min_x, min_y, max_x, max_y) = bounds;
    if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
        return;
    }
    let x0 = min_x.floor().max(0.0) as u32;
    let y0 = min_y.floor().max(0.0) as u32;
    let x1 = (max_x.ceil().max(0.0) as u32).min(size.width);
    let y1 = (max_y.ceil().max(0.0) as u32).min(size.height);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    for y in y0..y1 {
        let py = y as f32 + 0.5;
        let mut run_start: Option<u32> = None;
        for x in x0..x1 {
            let hit = inside(x as f32 + 0.5, py);
            match (hit, run_start) {
                (true, None) => run_start = Some(x),
                (false, Some(start)) => {
                    gfx.blend_rect(Rect::new(start, y, x - start, 1), color, alpha);
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            gfx.blend_rect(Rect::new(start, y, x1 - start, 1), color, alpha);
        }
    }
}

/// CPU renderer that draws into an RGBA frame buffer.
pub struct CpuRenderer<'a> {
    frame: &'a mut [u8],
    size: SurfaceSize,
}

impl<'a> CpuRenderer<'a> {
    pub fn new(frame: &'a mut [u8], size: SurfaceSize) -> Self {
        Self { frame, size }
    }

    /// Clips `rect` to the surface; `None` when nothing is visible or the buffer is too short.
    fn clip(&self, rect: Rect) -> Option<(usize, usize, usize, usize)> {
        let max_x = rect.x.saturating_add(rect.w).min(self.size.width);
        let max_y = rect.y.saturating_add(rect.h).min(self.size.height);
        if rect.x >= max_x || rect.y >= max_y || self.frame.len() < self.size.rgba_len() {
            return None;
        }
        Some((rect.x as usize, rect.y as usize, max_x as usize, max_y as usize))
    }

    fn for_each_pixel(&mut self, rect: Rect, mut f: impl FnMut(&mut [u8])) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return;
        };
        let stride = self.size.width as usize * 4;
        for y in y0..y1 {
            let row = &mut self.frame[y * stride + x0 * 4..y * stride + x1 * 4];
            for px in row.chunks_exact_mut(4) {
                f(px);
            }
        }
    }
}

impl Renderer2d for CpuRenderer<'_> {
    fn begin_frame(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.for_each_pixel(rect, |px| px.copy_from_slice(&color));
    }

    fn blend_rect(&mut self, rect: Rect, color: Color, alpha: u8) {
        match alpha {
            0 => {}
            255 => self.fill_rect(rect, color),
            _ => {
                let a = alpha as u32;
                let inv = 255 - a;
                self.for_each_pixel(rect, |px| {
                    for c in 0..3 {
                        px[c] = ((px[c] as u32 * inv + color[c] as u32 * a + 127) / 255) as u8;
                    }
                    px[3] = 255;
                });
            }
        }
    }

    fn draw_text_scaled(&mut self, x: u32, y: u32, text: &str, color: Color, scale: u32) {
        let scale = scale.max(1);
        let adv_x = glyph_advance_x(scale);
        let adv_y = line_advance_y(scale);

        let mut cursor_x = x;
        let mut cursor_y = y;
        for ch in text.chars() {
            if cursor_y >= self.size.height {
                break;
            }
            match ch {
                '\n' => {
                    cursor_x = x;
                    cursor_y = cursor_y.saturating_add(adv_y);
                    continue;
                }
                ' ' => {}
                _ if cursor_x < self.size.width => {
                    for (row, bits) in glyph_rows(ch).into_iter().enumerate() {
                        for col in 0..GLYPH_W {
                            if bits & (1u8 << (GLYPH_W - 1 - col)) == 0 {
                                continue;
                            }
                            self.fill_rect(
                                Rect::new(
                                    cursor_x.saturating_add(col * scale),
                                    cursor_y.saturating_add(row as u32 * scale),
                                    scale,
                                    scale,
                                ),
                                color,
                            );
                        }
                    }
                }
                _ => {}
            }
            cursor_x = cursor_x.saturating_add(adv_x);
        }
    }
}

fn glyph_rows(ch: char) -> [u8; GLYPH_H as usize] {
    match ch.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],

        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b111, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b110, 0b100, 0b110, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b101, 0b111, 0b111, 0b111, 0b101],
        'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'R' => [0b111, 0b101, 0b111, 0b110, 0b101],
        'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],

        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        ';' => [0b000, 0b010, 0b000, 0b010, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '?' => [0b111, 0b001, 0b010, 0b000, 0b010],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        '"' => [0b101, 0b101, 0b000, 0b000, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],

        _ => [0b111, 0b001, 0b010, 0b000, 0b010],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(w: u32, h: u32) -> Vec<u8> {
        vec![0u8; (w * h * 4) as usize]
    }

    fn px(frame: &[u8], w: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * w + x) * 4) as usize;
        [frame[i], frame[i + 1], frame[i + 2], frame[i + 3]]
    }

    #[test]
    fn blend_rect_mixes_over_existing_pixels() {
        let mut buf = frame(2, 1);
        let mut gfx = CpuRenderer::new(&mut buf, SurfaceSize::new(2, 1));
        gfx.fill_rect(Rect::from_size(2, 1), [0, 0, 0, 255]);
        gfx.blend_rect(Rect::new(0, 0, 1, 1), [200, 100, 50, 255], 128);
        assert_eq!(px(&buf, 2, 0, 0), [100, 50, 25, 255]);
        assert_eq!(px(&buf, 2, 1, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn fill_rect_clips_to_surface() {
        let mut buf = frame(4, 4);
        let mut gfx = CpuRenderer::new(&mut buf, SurfaceSize::new(4, 4));
        gfx.fill_rect(Rect::new(2, 2, 100, 100), [9, 9, 9, 255]);
        assert_eq!(px(&buf, 4, 3, 3), [9, 9, 9, 255]);
        assert_eq!(px(&buf, 4, 1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn circle_covers_centre_not_corners() {
        let mut buf = frame(20, 20);
        let mut gfx = CpuRenderer::new(&mut buf, SurfaceSize::new(20, 20));
        gfx.blend_circle(10.0, 10.0, 5.0, [255, 255, 255, 255], 1.0);
        assert_eq!(px(&buf, 20, 10, 10), [255, 255, 255, 255]);
        assert_eq!(px(&buf, 20, 5, 5), [0, 0, 0, 0]);
        assert_eq!(px(&buf, 20, 0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn tiny_circle_still_touches_one_pixel() {
        let mut buf = frame(4, 4);
        let mut gfx = CpuRenderer::new(&mut buf, SurfaceSize::new(4, 4));
        gfx.clear([0, 0, 0, 255]);
        gfx.blend_circle(1.5, 1.5, 0.4, [255, 255, 255, 255], 1.0);
        assert!(px(&buf, 4, 1, 1)[0] > 0);
    }

    #[test]
    fn partial_ring_only_covers_swept_quadrant() {
        let mut buf = frame(40, 40);
        let mut gfx = CpuRenderer::new(&mut buf, SurfaceSize::new(40, 40));
        // Start at 12 o'clock, sweep a quarter turn clockwise (towards 3 o'clock).
        gfx.blend_ring(
            20.0,
            20.0,
            12.0,
            3.0,
            -std::f32::consts::FRAC_PI_2,
            std::f32::consts::FRAC_PI_2,
            [255, 0, 0, 255],
            1.0,
        );
        // Upper-right of the ring is painted, lower-left is not.
        assert_eq!(px(&buf, 40, 28, 11)[0], 255);
        assert_eq!(px(&buf, 40, 11, 28)[0], 0);
    }

    #[test]
    fn segment_paints_along_its_length() {
        let mut buf = frame(30, 10);
        let mut gfx = CpuRenderer::new(&mut buf, SurfaceSize::new(30, 10));
        gfx.blend_segment(2.0, 5.0, 27.0, 5.0, 2.0, [0, 255, 0, 255], 1.0);
        assert_eq!(px(&buf, 30, 15, 4)[1], 255);
        assert_eq!(px(&buf, 30, 15, 0)[1], 0);
    }

    #[test]
    fn shapes_outside_surface_are_ignored() {
        let mut buf = frame(8, 8);
        let mut gfx = CpuRenderer::new(&mut buf, SurfaceSize::new(8, 8));
        gfx.blend_circle(-50.0, -50.0, 5.0, [255, 255, 255, 255], 1.0);
        gfx.blend_segment(100.0, 100.0, 200.0, 200.0, 4.0, [255, 255, 255, 255], 1.0);
        gfx.blend_circle(f32::NAN, 4.0, 5.0, [255, 255, 255, 255], 1.0);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn text_width_accounts_for_scale() {
        assert_eq!(text_width("", 2), 0);
        assert_eq!(text_width("A", 2), 6);
        assert_eq!(text_width("AB", 2), 14);
    }

    #[test]
    fn distinct_glyphs_render_differently() {
        let render = |s: &str| {
            let mut buf = frame(16, 12);
            let mut gfx = CpuRenderer::new(&mut buf, SurfaceSize::new(16, 12));
            gfx.draw_text(0, 0, s, [255, 255, 255, 255]);
            buf
        };
        assert_ne!(render("A"), render("B"));
        assert_ne!(render(","), render("?"));
    }
}
