//! Headless rendering on the CPU.
//!
//! [`CpuBackend`] implements [`FieldBackend`] without a GPU: positions are
//! transformed with the parallel [`transform_field_into`], projected with the
//! camera matrix, and each point is splatted as a glow sprite into a linear
//! RGB accumulation buffer with additive blending. Sprite sizing and sprite
//! coordinates follow the vertex stage exactly, so the output is a faithful
//! preview of what the GPU draws.

use std::convert::Infallible;

use glam::{Vec2, Vec3, Vec4};

use crate::field::ParticleField;
use crate::glow::{blend_additive, shade};
use crate::render_loop::{FieldBackend, FrameInput};
use crate::transform::{point_size, transform_field_into, Transformed};
use crate::viewport::Viewport;
use crate::visuals::BACKGROUND_COLOR;

/// Software rasterizer for particle fields.
#[derive(Debug)]
pub struct CpuBackend {
    width: u32,
    height: u32,
    background: Vec3,
    pixels: Vec<Vec3>,
    scratch: Vec<Transformed>,
    loaded: Option<usize>,
    uploads: u64,
    releases: u64,
    draws: u64,
}

impl CpuBackend {
    /// Backend with an empty image; the first resize allocates it.
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            background: BACKGROUND_COLOR,
            pixels: Vec::new(),
            scratch: Vec::new(),
            loaded: None,
            uploads: 0,
            releases: 0,
            draws: 0,
        }
    }

    /// Set the clear color.
    pub fn with_background(mut self, color: Vec3) -> Self {
        self.background = color;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Accumulated linear color, row-major from the top-left.
    pub fn pixels(&self) -> &[Vec3] {
        &self.pixels
    }

    /// Color at `(x, y)`, if inside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Vec3> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Image as 8-bit RGBA, saturating bright regions.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for p in &self.pixels {
            let c = p.clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
            out.extend_from_slice(&[c.x.round() as u8, c.y.round() as u8, c.z.round() as u8, 255]);
        }
        out
    }

    /// Particle count of the uploaded field, or `None` if nothing is loaded.
    pub fn loaded(&self) -> Option<usize> {
        self.loaded
    }

    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    pub fn releases(&self) -> u64 {
        self.releases
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }

    fn clear(&mut self) {
        self.pixels.clear();
        self.pixels
            .resize((self.width as usize) * (self.height as usize), self.background);
    }

    fn splat(&mut self, center: Vec2, diameter: f32, color: Vec3, intensity: f32, opacity: f32) {
        if diameter <= 0.0 {
            return;
        }
        let half = diameter * 0.5;
        let x0 = (center.x - half).floor().max(0.0) as u32;
        let y0 = (center.y - half).floor().max(0.0) as u32;
        let x1 = ((center.x + half).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((center.y + half).ceil().max(0.0) as u32).min(self.height);

        for y in y0..y1 {
            for x in x0..x1 {
                let sample = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let coord = (sample - center) / diameter;
                if let Some(fragment) = shade(color, intensity, coord, opacity) {
                    let idx = (y * self.width + x) as usize;
                    self.pixels[idx] = blend_additive(self.pixels[idx], &fragment);
                }
            }
        }
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldBackend for CpuBackend {
    type Error = Infallible;

    fn upload(&mut self, field: &ParticleField) -> Result<(), Infallible> {
        self.loaded = Some(field.len());
        self.scratch = Vec::with_capacity(field.len());
        self.uploads += 1;
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport) {
        self.width = viewport.width;
        self.height = viewport.height;
        self.clear();
    }

    fn draw(&mut self, frame: &FrameInput<'_>) -> Result<(), Infallible> {
        self.clear();
        if self.loaded.is_none() || self.width == 0 || self.height == 0 {
            return Ok(());
        }

        let mut scratch = std::mem::take(&mut self.scratch);
        transform_field_into(frame.field, frame.time, &frame.params, &mut scratch);

        let size = Vec2::new(self.width as f32, self.height as f32);
        let opacity = frame.params.particle_opacity;

        for (particle, t) in frame.field.particles().iter().zip(&scratch) {
            let clip = frame.view_proj * Vec4::new(t.position.x, t.position.y, t.position.z, 1.0);
            if clip.w <= 0.0 {
                continue;
            }
            let ndc = Vec2::new(clip.x, clip.y) / clip.w;
            let center = Vec2::new((ndc.x * 0.5 + 0.5) * size.x, (0.5 - ndc.y * 0.5) * size.y);
            let diameter = point_size(particle.size, clip.w, t.intensity);
            self.splat(center, diameter, particle.color, t.intensity, opacity);
        }

        self.scratch = scratch;
        self.draws += 1;
        Ok(())
    }

    fn release(&mut self) {
        if self.loaded.take().is_some() {
            self.scratch = Vec::new();
            self.releases += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MathConstant;
    use crate::field::FieldGenerator;
    use crate::gpu::camera::Camera;
    use crate::params::ContinuousParams;
    use crate::spawn::Jitter;

    fn frame<'a>(field: &'a ParticleField, viewport: Viewport, opacity: f32) -> FrameInput<'a> {
        FrameInput {
            field,
            time: 2.0,
            constant: field.constant(),
            params: ContinuousParams {
                particle_opacity: opacity,
                ..ContinuousParams::default()
            },
            view_proj: Camera::new().view_proj(viewport.aspect()),
            viewport,
        }
    }

    #[test]
    fn test_empty_field_is_background() {
        let field = FieldGenerator::new().generate(0, MathConstant::GoldenRatio);
        let viewport = Viewport::new(32, 24, 1.0);
        let mut cpu = CpuBackend::new().with_background(Vec3::new(0.1, 0.2, 0.3));
        cpu.upload(&field).ok();
        cpu.resize(viewport);
        cpu.draw(&frame(&field, viewport, 1.0)).ok();
        assert_eq!(cpu.pixels().len(), 32 * 24);
        assert!(cpu.pixels().iter().all(|p| *p == Vec3::new(0.1, 0.2, 0.3)));
    }

    #[test]
    fn test_particles_only_brighten() {
        let field = FieldGenerator::new()
            .with_jitter(Jitter::Seeded(5))
            .generate(3_000, MathConstant::GoldenRatio);
        let viewport = Viewport::new(64, 48, 1.0);
        let mut cpu = CpuBackend::new().with_background(Vec3::ZERO);
        cpu.upload(&field).ok();
        cpu.resize(viewport);
        cpu.draw(&frame(&field, viewport, 0.65)).ok();
        let lit = cpu.pixels().iter().filter(|p| p.max_element() > 0.0).count();
        assert!(lit > 0);
        assert!(cpu.pixels().iter().all(|p| p.min_element() >= 0.0));
    }

    #[test]
    fn test_release_is_idempotent() {
        let field = FieldGenerator::new().generate(10, MathConstant::Pi);
        let mut cpu = CpuBackend::new();
        cpu.upload(&field).ok();
        cpu.release();
        cpu.release();
        assert_eq!(cpu.releases(), 1);
        assert_eq!(cpu.loaded(), None);
    }

    #[test]
    fn test_rgba8_layout() {
        let mut cpu = CpuBackend::new().with_background(Vec3::new(1.0, 0.0, 2.0));
        cpu.resize(Viewport::new(2, 2, 1.0));
        assert_eq!(&cpu.to_rgba8()[..4], &[255, 0, 255, 255]);
        assert_eq!(cpu.pixel(1, 1), Some(Vec3::new(1.0, 0.0, 2.0)));
        assert_eq!(cpu.pixel(2, 0), None);
    }
}
