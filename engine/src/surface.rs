use std::convert::Infallible;

use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// Layout-space description of the drawable area.
///
/// `width`/`height` are logical pixels (what hit-testing and layout work in); the backing store
/// is that size multiplied by the device pixel ratio, capped so constrained devices don't pay for
/// full-density frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    /// Builds a viewport from a physical window size and the platform scale factor.
    pub fn from_physical(size: SurfaceSize, scale_factor: f64) -> Self {
        let dpr = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor as f32
        } else {
            1.0
        };
        Self {
            width: size.width as f32 / dpr,
            height: size.height as f32 / dpr,
            device_pixel_ratio: dpr,
        }
    }

    pub fn is_empty(self) -> bool {
        !(self.width >= 1.0 && self.height >= 1.0)
    }

    /// Logical-to-backing multiplier: `min(dpr, max_dpr)`, with non-positive ratios treated as 1.
    pub fn render_scale(self, max_dpr: f32) -> f32 {
        let dpr = if self.device_pixel_ratio > 0.0 && self.device_pixel_ratio.is_finite() {
            self.device_pixel_ratio
        } else {
            1.0
        };
        dpr.min(max_dpr.max(0.25))
    }

    pub fn backing_size(self, max_dpr: f32) -> SurfaceSize {
        if self.is_empty() {
            return SurfaceSize::new(0, 0);
        }
        let scale = self.render_scale(max_dpr);
        SurfaceSize::new(
            (self.width * scale).round().max(1.0) as u32,
            (self.height * scale).round().max(1.0) as u32,
        )
    }
}

/// A resizable RGBA surface.
///
/// Sits between rendering (writing RGBA pixels into `frame_mut()`) and presentation, so the same
/// frame procedure can run windowed or offscreen.
pub trait Surface {
    type Error;

    fn size(&self) -> SurfaceSize;
    fn frame_mut(&mut self) -> &mut [u8];

    fn resize(&mut self, size: SurfaceSize) -> Result<(), Self::Error>;
    fn present(&mut self) -> Result<(), Self::Error>;
}

/// In-memory RGBA surface for headless execution and tests.
#[derive(Debug, Clone)]
pub struct RgbaBufferSurface {
    size: SurfaceSize,
    buf: Vec<u8>,
    presented: usize,
}

impl RgbaBufferSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            buf: vec![0u8; size.rgba_len()],
            presented: 0,
        }
    }

    pub fn frame(&self) -> &[u8] {
        &self.buf
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let idx = ((y as usize) * (self.size.width as usize) + x as usize) * 4;
        self.buf
            .get(idx..idx + 4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }

    pub fn presented_frames(&self) -> usize {
        self.presented
    }

    pub fn digest(&self) -> String {
        rgba_sha256_hex(&self.buf)
    }
}

impl Surface for RgbaBufferSurface {
    type Error = Infallible;

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn frame_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<(), Self::Error> {
        self.size = size;
        self.buf.resize(size.rgba_len(), 0u8);
        Ok(())
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        self.presented += 1;
        Ok(())
    }
}

/// Hex SHA-256 of an RGBA frame; frames rendered from identical inputs must hash identically.
pub fn rgba_sha256_hex(rgba: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rgba);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backing_size_caps_device_pixel_ratio() {
        let vp = Viewport::new(400.0, 300.0, 3.0);
        assert_eq!(vp.backing_size(2.0), SurfaceSize::new(800, 600));
        assert_eq!(vp.backing_size(1.4), SurfaceSize::new(560, 420));
    }

    #[test]
    fn backing_size_keeps_low_density_screens_unscaled_up() {
        let vp = Viewport::new(400.0, 300.0, 1.0);
        assert_eq!(vp.backing_size(2.0), SurfaceSize::new(400, 300));
    }

    #[test]
    fn zero_sized_viewport_is_empty() {
        assert!(Viewport::new(0.0, 300.0, 1.0).is_empty());
        assert!(Viewport::new(f32::NAN, 300.0, 1.0).is_empty());
        assert_eq!(
            Viewport::new(0.0, 0.0, 2.0).backing_size(2.0),
            SurfaceSize::new(0, 0)
        );
    }

    #[test]
    fn from_physical_divides_by_scale_factor() {
        let vp = Viewport::from_physical(SurfaceSize::new(1600, 1200), 2.0);
        assert_eq!(vp.width, 800.0);
        assert_eq!(vp.height, 600.0);
        assert_eq!(vp.device_pixel_ratio, 2.0);
    }

    #[test]
    fn buffer_surface_resize_reallocates() {
        let mut s = RgbaBufferSurface::new(SurfaceSize::new(4, 4));
        assert_eq!(s.frame().len(), 64);
        s.resize(SurfaceSize::new(8, 2)).unwrap();
        assert_eq!(s.frame().len(), 64);
        assert_eq!(s.pixel(7, 1), Some([0, 0, 0, 0]));
        assert_eq!(s.pixel(8, 1), None);
    }
}
