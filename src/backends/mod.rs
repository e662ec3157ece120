//! Implementations of [`crate::context::GraphicsContext`].
//!
//! - `headless` records calls instead of drawing; used by tests and native demos
//! - `glow` drives OpenGL / WebGL2 (cargo feature `glow`)

#[cfg(feature = "glow")]
pub mod glow;
pub mod headless;
