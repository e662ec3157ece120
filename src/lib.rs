//! scene-ngin
//!
//! A minimal retained-mode 3D scene graph renderer on top of an immediate-mode
//! graphics context. Callers build a tree of transformable nodes, some of which
//! carry geometry and a material, register it once with a [`renderer::Renderer`]
//! and then render it every frame. World transforms are recomputed top-down and
//! every mesh is drawn in pre-order with its cached program and buffers.
//!
//! High-level modules
//! - `backends`: graphics context implementations (headless recorder, `glow`)
//! - `camera`: fixed camera configuration and viewport projection
//! - `context`: the immediate-mode graphics context and surface traits
//! - `data_structures`: matrices, geometry, materials and the scene graph
//! - `flow`: the application context and frame loop
//! - `pipelines`: per-draw render state switching (depth, blending, culling)
//! - `render`: cached per-mesh GPU resources and their draw sequence
//! - `renderer`: registration and per-frame rendering of a scene graph
//! - `resources`: shader source loading
//! - `web`: canvas surface and animation-frame scheduler (wasm32 + `glow`)
//!

pub mod backends;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod renderer;
pub mod resources;
#[cfg(all(target_arch = "wasm32", feature = "glow"))]
pub mod web;

// Re-exports commonly used types for convenience in downstream code.
pub use data_structures::{
    geometry::Geometry,
    material::{Material, MaterialConfig, Side, Uniform},
    matrix::Matrix4,
    scene_graph::{Mesh, NodeId, Object3D, SceneNode},
};
pub use renderer::{Renderer, RendererConfig};
