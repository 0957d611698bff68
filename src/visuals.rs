//! Visual configuration for the vortex window.
//!
//! ```ignore
//! Simulation::new()
//!     .with_visuals(|v| {
//!         v.blend_mode(BlendMode::Additive)
//!             .background(Vec3::new(0.0, 0.0, 0.0))
//!             .title("vortex");
//!     })
//!     .run()?;
//! ```

use std::time::Duration;

use glam::Vec3;

use crate::time::TARGET_FPS;
use crate::viewport::RESIZE_DEBOUNCE;

/// Default clear color, `#0A0A12`, as sRGB components.
pub const BACKGROUND_COLOR: Vec3 = Vec3::new(10.0 / 255.0, 10.0 / 255.0, 18.0 / 255.0);

/// Blend mode for particle rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Standard alpha blending.
    Alpha,

    /// Additive blending (default).
    ///
    /// Overlapping particles accumulate into a glow; draw order does not
    /// matter, so particles are never sorted.
    #[default]
    Additive,
}

impl BlendMode {
    /// The wgpu blend state for this mode.
    pub fn to_blend_state(self) -> wgpu::BlendState {
        match self {
            BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
            BlendMode::Additive => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
        }
    }
}

/// Window and rendering settings that are not animation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualConfig {
    /// Blend mode for particles.
    pub blend_mode: BlendMode,
    /// Clear color, sRGB components in `[0, 1]`.
    pub background_color: Vec3,
    /// Base window title; the FPS is appended at runtime.
    pub title: String,
    /// Initial inner window size in logical pixels.
    pub window_size: (u32, u32),
    /// Frame-rate cap.
    pub target_fps: u32,
    /// Quiet period before a resize is applied.
    pub resize_debounce: Duration,
    /// Show the FPS in the window title.
    pub show_fps: bool,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            blend_mode: BlendMode::Additive,
            background_color: BACKGROUND_COLOR,
            title: "Chromatic Vortex".to_string(),
            window_size: (1280, 720),
            target_fps: TARGET_FPS,
            resize_debounce: RESIZE_DEBOUNCE,
            show_fps: true,
        }
    }
}

impl VisualConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blend_mode(&mut self, mode: BlendMode) -> &mut Self {
        self.blend_mode = mode;
        self
    }

    /// Set the clear color (sRGB).
    pub fn background(&mut self, color: Vec3) -> &mut Self {
        self.background_color = color.clamp(Vec3::ZERO, Vec3::ONE);
        self
    }

    pub fn title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    pub fn window_size(&mut self, width: u32, height: u32) -> &mut Self {
        self.window_size = (width.max(1), height.max(1));
        self
    }

    /// Set the frame-rate cap. Zero is treated as one.
    pub fn target_fps(&mut self, fps: u32) -> &mut Self {
        self.target_fps = fps.max(1);
        self
    }

    pub fn resize_debounce(&mut self, debounce: Duration) -> &mut Self {
        self.resize_debounce = debounce;
        self
    }

    pub fn show_fps(&mut self, show: bool) -> &mut Self {
        self.show_fps = show;
        self
    }

    /// Clear color for a render target, linearized when the target format
    /// applies sRGB encoding on write.
    pub fn clear_color(&self, srgb_target: bool) -> wgpu::Color {
        let c = if srgb_target {
            Vec3::new(
                srgb_to_linear(self.background_color.x),
                srgb_to_linear(self.background_color.y),
                srgb_to_linear(self.background_color.z),
            )
        } else {
            self.background_color
        };
        wgpu::Color {
            r: c.x as f64,
            g: c.y as f64,
            b: c.z as f64,
            a: 1.0,
        }
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
