//! OpenGL / WebGL2 backend on top of `glow`.

use glow::HasContext;

use crate::context::{
    BlendFactor, Capability, ContextError, DepthFunc, GraphicsContext, ShaderStage, Winding,
};

type GlShader = <glow::Context as HasContext>::Shader;
type GlVertexArray = <glow::Context as HasContext>::VertexArray;

/// A [`GraphicsContext`] issuing real GL calls.
///
/// A single vertex array object is created up front and stays bound, which is
/// what core profiles and WebGL2 require before any attribute is configured.
pub struct GlowContext {
    gl: glow::Context,
    vao: GlVertexArray,
}

impl GlowContext {
    pub fn new(gl: glow::Context) -> Result<Self, ContextError> {
        let vao = unsafe {
            let vao = gl
                .create_vertex_array()
                .map_err(ContextError::ResourceCreation)?;
            gl.bind_vertex_array(Some(vao));
            vao
        };
        Ok(Self { gl, vao })
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    fn compile(&self, stage: ShaderStage, source: &str) -> Result<GlShader, ContextError> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = self
                .gl
                .create_shader(kind)
                .map_err(ContextError::ResourceCreation)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(ContextError::ShaderCompile { stage, log });
            }
            Ok(shader)
        }
    }
}

impl Drop for GlowContext {
    fn drop(&mut self) {
        unsafe { self.gl.delete_vertex_array(self.vao) };
    }
}

impl std::fmt::Debug for GlowContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlowContext").field("vao", &self.vao).finish()
    }
}

fn capability(capability: Capability) -> u32 {
    match capability {
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::Blend => glow::BLEND,
        Capability::CullFace => glow::CULL_FACE,
    }
}

fn blend_factor(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
    }
}

impl GraphicsContext for GlowContext {
    type Program = <glow::Context as HasContext>::Program;
    type Buffer = <glow::Context as HasContext>::Buffer;
    type UniformLocation = <glow::Context as HasContext>::UniformLocation;

    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self::Program, ContextError> {
        let vertex = self.compile(ShaderStage::Vertex, vertex_source)?;
        let fragment = match self.compile(ShaderStage::Fragment, fragment_source) {
            Ok(fragment) => fragment,
            Err(e) => {
                unsafe { self.gl.delete_shader(vertex) };
                return Err(e);
            }
        };
        unsafe {
            let program = match self.gl.create_program() {
                Ok(program) => program,
                Err(e) => {
                    self.gl.delete_shader(vertex);
                    self.gl.delete_shader(fragment);
                    return Err(ContextError::ResourceCreation(e));
                }
            };
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            self.gl.link_program(program);
            let linked = self.gl.get_program_link_status(program);
            let log = self.gl.get_program_info_log(program);
            for shader in [vertex, fragment] {
                self.gl.detach_shader(program, shader);
                self.gl.delete_shader(shader);
            }
            if !linked {
                self.gl.delete_program(program);
                return Err(ContextError::ProgramLink { log });
            }
            Ok(program)
        }
    }

    fn delete_program(&mut self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) };
    }

    fn create_vertex_buffer(&mut self, data: &[f32]) -> Result<Self::Buffer, ContextError> {
        unsafe {
            let buffer = self
                .gl
                .create_buffer()
                .map_err(ContextError::ResourceCreation)?;
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(data),
                glow::STATIC_DRAW,
            );
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
            Ok(buffer)
        }
    }

    fn create_index_buffer(&mut self, data: &[u16]) -> Result<Self::Buffer, ContextError> {
        unsafe {
            let buffer = self
                .gl
                .create_buffer()
                .map_err(ContextError::ResourceCreation)?;
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer));
            self.gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(data),
                glow::STATIC_DRAW,
            );
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);
            Ok(buffer)
        }
    }

    fn delete_buffer(&mut self, buffer: Self::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) };
    }

    fn attribute_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn use_program(&mut self, program: Self::Program) {
        unsafe { self.gl.use_program(Some(program)) };
    }

    fn bind_vertex_attribute(&mut self, buffer: Self::Buffer, location: u32, stride: u32) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.gl.enable_vertex_attrib_array(location);
            self.gl
                .vertex_attrib_pointer_f32(location, stride as i32, glow::FLOAT, false, 0, 0);
        }
    }

    fn bind_index_buffer(&mut self, buffer: Self::Buffer) {
        unsafe { self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer)) };
    }

    fn uniform_matrix4(&mut self, location: &Self::UniformLocation, value: &[f32; 16]) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(location), false, value)
        };
    }

    fn uniform_f32(&mut self, location: &Self::UniformLocation, value: f32) {
        unsafe { self.gl.uniform_1_f32(Some(location), value) };
    }

    fn uniform_vec3(&mut self, location: &Self::UniformLocation, [x, y, z]: [f32; 3]) {
        unsafe { self.gl.uniform_3_f32(Some(location), x, y, z) };
    }

    fn uniform_vec4(&mut self, location: &Self::UniformLocation, [x, y, z, w]: [f32; 4]) {
        unsafe { self.gl.uniform_4_f32(Some(location), x, y, z, w) };
    }

    fn enable(&mut self, cap: Capability) {
        unsafe { self.gl.enable(capability(cap)) };
    }

    fn disable(&mut self, cap: Capability) {
        unsafe { self.gl.disable(capability(cap)) };
    }

    fn depth_func(&mut self, func: DepthFunc) {
        let func = match func {
            DepthFunc::Less => glow::LESS,
            DepthFunc::LessEqual => glow::LEQUAL,
            DepthFunc::Always => glow::ALWAYS,
        };
        unsafe { self.gl.depth_func(func) };
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        unsafe { self.gl.blend_func(blend_factor(src), blend_factor(dst)) };
    }

    fn front_face(&mut self, winding: Winding) {
        let mode = match winding {
            Winding::Clockwise => glow::CW,
            Winding::CounterClockwise => glow::CCW,
        };
        unsafe { self.gl.front_face(mode) };
    }

    fn clear(&mut self, [r, g, b, a]: [f32; 4], depth: f32) {
        unsafe {
            self.gl.clear_color(r, g, b, a);
            self.gl.clear_depth_f32(depth);
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) };
    }

    fn draw_arrays(&mut self, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(glow::TRIANGLES, first, count) };
    }

    fn draw_elements(&mut self, count: i32) {
        unsafe {
            self.gl
                .draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_SHORT, 0)
        };
    }

    fn flush(&mut self) {
        unsafe { self.gl.flush() };
    }
}
