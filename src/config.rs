//! Viewer tunables.

use cgmath::Deg;

/// Knobs for camera input, framing and clear/base colours.
///
/// `Default` gives the values the viewer ships with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewerConfig {
    /// Degrees of yaw/pitch per pixel of drag.
    pub orbit_sensitivity: f32,
    /// Pan distance per pixel of drag, as a fraction of the camera distance.
    pub pan_sensitivity: f32,
    /// Distance multiplier per wheel step towards the model.
    pub zoom_in_factor: f32,
    /// Distance multiplier per wheel step away from the model.
    pub zoom_out_factor: f32,
    /// Fraction of the bounding box height placed at the world origin on reset.
    /// 0.5 centres the model; lower values push it up in the viewport.
    pub vertical_bias: f32,
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub clear_colour: wgpu::Color,
    /// Colour of untextured models before lighting.
    pub base_colour: [f32; 3],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            orbit_sensitivity: 0.4,
            pan_sensitivity: 0.002,
            zoom_in_factor: 0.9,
            zoom_out_factor: 1.1,
            vertical_bias: 0.3,
            fovy: Deg(45.0),
            znear: 0.1,
            zfar: 100.0,
            clear_colour: wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 0.12,
                a: 1.0,
            },
            base_colour: [0.8, 0.8, 1.0],
        }
    }
}
