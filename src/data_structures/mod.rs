//! Engine data structures: matrices, geometry, materials and the scene graph.
//!
//! - `matrix` is the column-major 4x4 transform used everywhere
//! - `geometry` holds named vertex attributes and the triangle index buffer
//! - `material` holds shader sources, uniform values and render-state flags
//! - `scene_graph` enables hierarchical scene organization

pub mod geometry;
pub mod material;
pub mod matrix;
pub mod scene_graph;
