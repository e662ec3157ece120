//! The immediate-mode graphics context the renderer drives.
//!
//! [`GraphicsContext`] is shaped after GL/WebGL: programs, buffers and
//! locations are opaque handles, state is toggled globally and draws are
//! issued one by one. Backends live in [`crate::backends`].

use std::fmt::Debug;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Failures reported by a graphics context.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContextError {
    #[error("could not compile {stage} shader: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("program failed to link: {log}")]
    ProgramLink { log: String },

    #[error("could not create GPU resource: {0}")]
    ResourceCreation(String),

    #[error("graphics context is lost")]
    ContextLost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    DepthTest,
    Blend,
    CullFace,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthFunc {
    Less,
    LessEqual,
    Always,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

/// Winding order of front-facing triangles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Winding {
    Clockwise,
    CounterClockwise,
}

/// Immediate-mode 3D API consumed by the renderer.
///
/// Everything is synchronous. Handles are only meaningful to the context that
/// created them.
pub trait GraphicsContext {
    type Program: Copy + Debug;
    type Buffer: Copy + Debug;
    type UniformLocation: Clone + Debug;

    /// Compile both stages and link them into a program.
    ///
    /// Errors carry the compiler or linker info log.
    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self::Program, ContextError>;

    fn delete_program(&mut self, program: Self::Program);

    /// Upload `data` into a new static vertex buffer.
    fn create_vertex_buffer(&mut self, data: &[f32]) -> Result<Self::Buffer, ContextError>;

    /// Upload `data` into a new static index buffer.
    fn create_index_buffer(&mut self, data: &[u16]) -> Result<Self::Buffer, ContextError>;

    fn delete_buffer(&mut self, buffer: Self::Buffer);

    /// `None` when the program has no active attribute of that name.
    fn attribute_location(&self, program: Self::Program, name: &str) -> Option<u32>;

    /// `None` when the program has no active uniform of that name.
    fn uniform_location(&self, program: Self::Program, name: &str)
    -> Option<Self::UniformLocation>;

    fn use_program(&mut self, program: Self::Program);

    /// Enable `location` and source it from `buffer` as tightly packed floats
    /// with `stride` components per vertex.
    fn bind_vertex_attribute(&mut self, buffer: Self::Buffer, location: u32, stride: u32);

    fn bind_index_buffer(&mut self, buffer: Self::Buffer);

    fn uniform_matrix4(&mut self, location: &Self::UniformLocation, value: &[f32; 16]);

    fn uniform_f32(&mut self, location: &Self::UniformLocation, value: f32);

    fn uniform_vec3(&mut self, location: &Self::UniformLocation, value: [f32; 3]);

    fn uniform_vec4(&mut self, location: &Self::UniformLocation, value: [f32; 4]);

    fn enable(&mut self, capability: Capability);

    fn disable(&mut self, capability: Capability);

    fn depth_func(&mut self, func: DepthFunc);

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor);

    fn front_face(&mut self, winding: Winding);

    /// Clear colour and depth buffers.
    fn clear(&mut self, colour: [f32; 4], depth: f32);

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);

    /// Non-indexed triangle list draw.
    fn draw_arrays(&mut self, first: i32, count: i32);

    /// Indexed triangle list draw using the bound `u16` index buffer.
    fn draw_elements(&mut self, count: i32);

    fn flush(&mut self);
}

/// A drawable surface (canvas, window, offscreen target).
pub trait Surface {
    type Context: GraphicsContext;

    fn size(&self) -> (u32, u32);

    fn set_size(&mut self, width: u32, height: u32);

    /// Request the graphics context for this surface.
    fn create_context(&self) -> anyhow::Result<Self::Context>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_carry_the_diagnostic_log() {
        let err = ContextError::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: "0:3: 'vColor' : undeclared identifier".into(),
        };
        assert_eq!(
            err.to_string(),
            "could not compile fragment shader: 0:3: 'vColor' : undeclared identifier"
        );

        let err = ContextError::ProgramLink {
            log: "varyings mismatch".into(),
        };
        assert!(err.to_string().ends_with("varyings mismatch"));
    }
}
