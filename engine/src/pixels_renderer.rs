use crate::graphics::{CpuRenderer, Renderer2d};
use crate::surface::SurfaceSize;

use pixels::Pixels;

/// Headful presenter built on `pixels`.
///
/// The frame buffer (`buffer_size`) is the capped backing store the app draws into; `pixels`
/// scales it onto the window surface (`surface_size`), so a density cap only costs sharpness.
pub struct PixelsRenderer2d {
    pixels: Pixels,
    surface_size: SurfaceSize,
    buffer_size: SurfaceSize,
}

impl PixelsRenderer2d {
    pub fn new(mut pixels: Pixels, surface_size: SurfaceSize) -> Result<Self, pixels::Error> {
        pixels.resize_buffer(surface_size.width.max(1), surface_size.height.max(1))?;
        Ok(Self {
            pixels,
            surface_size,
            buffer_size: surface_size,
        })
    }

    pub fn surface_size(&self) -> SurfaceSize {
        self.surface_size
    }

    pub fn buffer_size(&self) -> SurfaceSize {
        self.buffer_size
    }

    /// Resizes the window surface and the drawing buffer. Empty sizes are ignored.
    pub fn resize(&mut self, surface: SurfaceSize, buffer: SurfaceSize) -> Result<(), pixels::Error> {
        if surface.is_empty() || buffer.is_empty() {
            return Ok(());
        }
        if surface != self.surface_size {
            self.pixels.resize_surface(surface.width, surface.height)?;
            self.surface_size = surface;
        }
        if buffer != self.buffer_size {
            self.pixels.resize_buffer(buffer.width, buffer.height)?;
            self.buffer_size = buffer;
        }
        Ok(())
    }

    pub fn draw_frame<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut dyn Renderer2d) -> R,
    {
        let mut cpu = CpuRenderer::new(self.pixels.frame_mut(), self.buffer_size);
        cpu.begin_frame(self.buffer_size);
        f(&mut cpu)
    }

    pub fn present(&mut self) -> Result<(), pixels::Error> {
        self.pixels.render()
    }
}
