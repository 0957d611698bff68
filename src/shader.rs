use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::params::ContinuousParams;
use crate::transform::PhiTerms;

/// Particle render program: vortex vertex stage plus glow fragment stage.
pub const SHADER_SOURCE: &str = include_str!("vortex.wgsl");

/// Vertex stage entry point.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Fragment stage entry point.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Uniform block shared by both stages. Layout matches `Uniforms` in the
/// WGSL source.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    pub viewport: [f32; 2],
    pub time: f32,
    pub opacity: f32,
    pub phi: f32,
    pub phi_inv: f32,
    pub phi_squared: f32,
    pub rotation_speed: f32,
    pub breathe_speed: f32,
    pub spiral_tightness: f32,
    pub color_shift: f32,
    pub _pad: f32,
}

impl Uniforms {
    /// Assemble the block for one frame.
    pub fn new(view_proj: Mat4, viewport: [f32; 2], time: f32, constant: f32, params: &ContinuousParams) -> Self {
        let k = PhiTerms::new(constant);
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            viewport: [viewport[0].max(1.0), viewport[1].max(1.0)],
            time,
            opacity: params.particle_opacity,
            phi: k.phi,
            phi_inv: k.phi_inv,
            phi_squared: k.phi_squared,
            rotation_speed: params.rotation_speed,
            breathe_speed: params.breathe_speed,
            spiral_tightness: params.spiral_tightness,
            color_shift: params.color_shift,
            _pad: 0.0,
        }
    }
}
