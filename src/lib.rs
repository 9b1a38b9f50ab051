//! flow-viewer
//!
//! An interactive viewer for a single 3D model. A file is imported into a flat
//! scene description, merged into one interleaved vertex/index buffer pair,
//! bounded, textured and drawn with an orbit camera.
//!
//! High-level modules
//! - `resources`: format importers (OBJ, glTF) and texture resolution
//! - `data_structures`: scene, vertex, bounding box and GPU texture types
//! - `processor`: turns an imported scene into GPU-ready geometry
//! - `camera`: orbit camera state, projection and the shader uniform
//! - `config`: viewer tunables
//! - `gpu`: the backend trait the viewer uploads and draws through
//! - `render`: per-frame draw description
//! - `context`: the wgpu backend (device, surface, pipeline)
//! - `pipelines`: render pipeline and shader definitions
//! - `viewer`: the render engine tying load, camera and drawing together
//! - `app`: winit window shell
//!

pub mod app;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod gpu;
pub mod pipelines;
pub mod processor;
pub mod render;
pub mod resources;
pub mod viewer;

pub use config::ViewerConfig;
pub use viewer::{LoadError, Viewer, ViewerEvent, ViewerState};
