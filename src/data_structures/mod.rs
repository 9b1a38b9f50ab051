//! Viewer data structures: imported scenes, GPU-ready geometry, bounds and textures.
//!
//! - `scene` is the flat importer output (meshes, materials, embedded textures)
//! - `model` holds the interleaved vertex type and merged geometry
//! - `bounds` is the axis-aligned bounding box used for camera framing
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod bounds;
pub mod model;
pub mod scene;
pub mod texture;
