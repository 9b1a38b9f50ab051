//! Orbit camera, projection and the per-frame uniform.
//!
//! [`CameraState`] is a plain value: distance, yaw/pitch and a pan offset around
//! a model that has been translated so its anchor point sits at the world origin.
//! Input handlers mutate it; the load pipeline only ever reseeds it through
//! [`CameraState::reset`].

use cgmath::{Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, Vector2, Vector3, Zero};

use crate::data_structures::bounds::BoundingBox;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Pitch is kept inside +-85 degrees so the view never flips over the pole.
pub const PITCH_LIMIT: Deg<f32> = Deg(85.0);
/// Smallest radius used for framing; keeps a single-point model viewable.
pub const MIN_FRAMING_RADIUS: f32 = 1e-3;

const RESET_DISTANCE: f32 = 2.5;
const FRAME_DISTANCE: f32 = 2.0;
const RESET_YAW: Deg<f32> = Deg(45.0);
const RESET_PITCH: Deg<f32> = Deg(10.0);
const MIN_DISTANCE: f32 = 0.1;
const MAX_DISTANCE: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    pub distance: f32,
    pub yaw: Deg<f32>,
    pub pitch: Deg<f32>,
    /// Offset added to the model translation, in world units.
    pub pan: Vector2<f32>,
    radius: f32,
    anchor: Vector3<f32>,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            distance: 3.0,
            yaw: Deg(0.0),
            pitch: Deg(0.0),
            pan: Vector2::zero(),
            radius: 1.0,
            anchor: Vector3::zero(),
        }
    }
}

impl CameraState {
    /// Frame `bounds`: distance 2.5 radii, yaw 45 degrees, pitch 10 degrees, no
    /// pan, and the model translated so its anchor point (`vertical_bias` up the
    /// box) sits at the origin.
    pub fn reset(&mut self, bounds: &BoundingBox, vertical_bias: f32) {
        self.radius = bounds.radius().max(MIN_FRAMING_RADIUS);
        self.anchor = bounds.anchor(vertical_bias);
        self.distance = self.radius * RESET_DISTANCE;
        self.yaw = RESET_YAW;
        self.pitch = RESET_PITCH;
        self.pan = Vector2::zero();
    }

    /// Pull the camera to 2 radii without touching the orientation.
    pub fn frame(&mut self) {
        self.distance = self.radius * FRAME_DISTANCE;
    }

    pub fn orbit(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.yaw = Deg((self.yaw.0 + dx * sensitivity) % 360.0);
        self.pitch = Deg((self.pitch.0 + dy * sensitivity).clamp(-PITCH_LIMIT.0, PITCH_LIMIT.0));
    }

    /// Shift the model in the view plane; scaled by distance so a drag feels the
    /// same at every zoom level.
    pub fn pan(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        let scale = sensitivity * self.distance;
        self.pan += Vector2::new(dx, -dy) * scale;
    }

    /// Positive `delta` zooms in, negative zooms out, zero does nothing.
    pub fn zoom(&mut self, delta: f32, zoom_in_factor: f32, zoom_out_factor: f32) {
        let factor = if delta > 0.0 {
            zoom_in_factor
        } else if delta < 0.0 {
            zoom_out_factor
        } else {
            return;
        };
        let (min, max) = self.distance_limits();
        self.distance = (self.distance * factor).clamp(min, max);
    }

    /// `[radius * 0.1, radius * 10]`
    pub fn distance_limits(&self) -> (f32, f32) {
        (self.radius * MIN_DISTANCE, self.radius * MAX_DISTANCE)
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn anchor(&self) -> Vector3<f32> {
        self.anchor
    }

    /// Eye position on the sphere of radius `distance` around the origin.
    pub fn eye(&self) -> Point3<f32> {
        let (sin_yaw, cos_yaw) = Rad::from(self.yaw).0.sin_cos();
        let (sin_pitch, cos_pitch) = Rad::from(self.pitch).0.sin_cos();
        Point3::new(
            self.distance * cos_pitch * sin_yaw,
            self.distance * sin_pitch,
            self.distance * cos_pitch * cos_yaw,
        )
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye(), Point3::origin(), Vector3::unit_y())
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(Vector3::new(self.pan.x, self.pan.y, 0.0) - self.anchor)
    }
}

/// Perspective projection; only the aspect ratio changes at runtime.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: aspect_ratio(width, height),
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width as f32 / height.max(1) as f32
}

/// Uniform block shared by both shader stages.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub mvp: [[f32; 4]; 4],
    /// Direction towards the light, model space.
    pub light_dir: [f32; 3],
    pub has_texture: u32,
    pub base_colour: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            mvp: Matrix4::identity().into(),
            light_dir: [0.0, 1.0, 0.0],
            has_texture: 0,
            base_colour: [1.0, 1.0, 1.0],
            _padding: 0,
        }
    }

    /// projection x view x model, plus a headlight shining from the eye.
    pub fn update(
        &mut self,
        camera: &CameraState,
        projection: &Projection,
        has_texture: bool,
        base_colour: [f32; 3],
    ) {
        let mvp = projection.calc_matrix() * camera.view_matrix() * camera.model_matrix();
        self.mvp = mvp.into();
        let eye = camera.eye().to_vec();
        self.light_dir = if eye.magnitude2() > 0.0 {
            eye.normalize().into()
        } else {
            [0.0, 1.0, 0.0]
        };
        self.has_texture = has_texture as u32;
        self.base_colour = base_colour;
    }
}
