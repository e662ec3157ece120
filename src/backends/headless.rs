//! A recording graphics context without a GPU.
//!
//! [`HeadlessContext`] hands out monotonically increasing handles and appends
//! every state-changing call to a command log. Attribute and uniform locations
//! are resolved from the declarations found in the shader sources, so the
//! renderer sees the same "unknown name" behaviour it would see on a real
//! driver. It is what the test-suite and the native demo render into.
//!
//! The command log grows with every frame. Long-running drivers should bound
//! it with [`HeadlessContext::set_command_limit`] or drain it with
//! [`HeadlessContext::take_commands`].

use std::collections::HashMap;

use crate::context::{
    BlendFactor, Capability, ContextError, DepthFunc, GraphicsContext, ShaderStage, Surface,
    Winding,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

/// Uniform location: the owning program plus the declared name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UniformHandle {
    pub program: ProgramId,
    pub name: String,
}

/// One recorded context call.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    CreateProgram(ProgramId),
    DeleteProgram(ProgramId),
    CreateVertexBuffer { buffer: BufferId, len: usize },
    CreateIndexBuffer { buffer: BufferId, len: usize },
    DeleteBuffer(BufferId),
    UseProgram(ProgramId),
    BindVertexAttribute { buffer: BufferId, location: u32, stride: u32 },
    BindIndexBuffer(BufferId),
    UniformMatrix4 { location: UniformHandle, value: [f32; 16] },
    UniformF32 { location: UniformHandle, value: f32 },
    UniformVec3 { location: UniformHandle, value: [f32; 3] },
    UniformVec4 { location: UniformHandle, value: [f32; 4] },
    Enable(Capability),
    Disable(Capability),
    DepthFunc(DepthFunc),
    BlendFunc(BlendFactor, BlendFactor),
    FrontFace(Winding),
    Clear { colour: [f32; 4], depth: f32 },
    Viewport { x: i32, y: i32, width: i32, height: i32 },
    DrawArrays { first: i32, count: i32 },
    DrawElements { count: i32 },
    Flush,
}

#[derive(Debug)]
struct ProgramInfo {
    attributes: Vec<String>,
    uniforms: Vec<String>,
}

#[derive(Debug, Default)]
pub struct HeadlessContext {
    next_handle: u32,
    programs: HashMap<ProgramId, ProgramInfo>,
    buffers: HashMap<BufferId, usize>,
    commands: Vec<Command>,
    command_limit: Option<usize>,
    lost: bool,
    buffer_limit: Option<usize>,
}

impl HeadlessContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call recorded since creation or the last [`HeadlessContext::take_commands`].
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Keep only the newest `limit` commands. `None` keeps everything.
    pub fn set_command_limit(&mut self, limit: Option<usize>) {
        self.command_limit = limit;
        self.trim_commands();
    }

    fn record(&mut self, command: Command) {
        self.commands.push(command);
        self.trim_commands();
    }

    fn trim_commands(&mut self) {
        if let Some(limit) = self.command_limit {
            let excess = self.commands.len().saturating_sub(limit);
            self.commands.drain(..excess);
        }
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Simulate losing the context: every subsequent resource creation fails
    /// with [`ContextError::ContextLost`].
    pub fn set_lost(&mut self, lost: bool) {
        self.lost = lost;
    }

    /// Make buffer creation fail once `limit` buffers are alive.
    pub fn set_buffer_limit(&mut self, limit: Option<usize>) {
        self.buffer_limit = limit;
    }

    fn next_handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn check_lost(&self) -> Result<(), ContextError> {
        if self.lost {
            return Err(ContextError::ContextLost);
        }
        Ok(())
    }

    fn allocate_buffer(&mut self, len: usize) -> Result<BufferId, ContextError> {
        self.check_lost()?;
        if self
            .buffer_limit
            .is_some_and(|limit| self.buffers.len() >= limit)
        {
            return Err(ContextError::ResourceCreation(
                "out of buffer memory".to_string(),
            ));
        }
        let buffer = BufferId(self.next_handle());
        self.buffers.insert(buffer, len);
        Ok(buffer)
    }
}

fn compile(stage: ShaderStage, source: &str) -> Result<(), ContextError> {
    if !source.contains("void main") {
        return Err(ContextError::ShaderCompile {
            stage,
            log: "ERROR: 0:1: 'main' : function not defined".to_string(),
        });
    }
    Ok(())
}

fn version(source: &str) -> Option<&str> {
    source
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("#version"))
        .map(str::trim)
}

/// Names declared with one of `qualifiers`, in declaration order.
fn declarations(source: &str, qualifiers: &[&str]) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let qualifier = tokens.next()?;
            if !qualifiers.contains(&qualifier) {
                return None;
            }
            let name = tokens
                .filter(|token| !matches!(*token, "lowp" | "mediump" | "highp"))
                .nth(1)?;
            Some(name.trim_end_matches(';').to_string())
        })
        .collect()
}

impl GraphicsContext for HeadlessContext {
    type Program = ProgramId;
    type Buffer = BufferId;
    type UniformLocation = UniformHandle;

    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, ContextError> {
        self.check_lost()?;
        compile(ShaderStage::Vertex, vertex_source)?;
        compile(ShaderStage::Fragment, fragment_source)?;
        if version(vertex_source) != version(fragment_source) {
            return Err(ContextError::ProgramLink {
                log: format!(
                    "ERROR: Shader versions differ: {:?} vs {:?}",
                    version(vertex_source),
                    version(fragment_source)
                ),
            });
        }

        let mut uniforms = declarations(vertex_source, &["uniform"]);
        for name in declarations(fragment_source, &["uniform"]) {
            if !uniforms.contains(&name) {
                uniforms.push(name);
            }
        }
        let info = ProgramInfo {
            attributes: declarations(vertex_source, &["attribute", "in"]),
            uniforms,
        };

        let program = ProgramId(self.next_handle());
        self.programs.insert(program, info);
        self.record(Command::CreateProgram(program));
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        self.record(Command::DeleteProgram(program));
    }

    fn create_vertex_buffer(&mut self, data: &[f32]) -> Result<BufferId, ContextError> {
        let buffer = self.allocate_buffer(data.len())?;
        self.record(Command::CreateVertexBuffer {
            buffer,
            len: data.len(),
        });
        Ok(buffer)
    }

    fn create_index_buffer(&mut self, data: &[u16]) -> Result<BufferId, ContextError> {
        let buffer = self.allocate_buffer(data.len())?;
        self.record(Command::CreateIndexBuffer {
            buffer,
            len: data.len(),
        });
        Ok(buffer)
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
        self.record(Command::DeleteBuffer(buffer));
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        let info = self.programs.get(&program)?;
        let index = info.attributes.iter().position(|a| a == name)?;
        u32::try_from(index).ok()
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformHandle> {
        let info = self.programs.get(&program)?;
        info.uniforms.iter().any(|u| u == name).then(|| UniformHandle {
            program,
            name: name.to_string(),
        })
    }

    fn use_program(&mut self, program: ProgramId) {
        self.record(Command::UseProgram(program));
    }

    fn bind_vertex_attribute(&mut self, buffer: BufferId, location: u32, stride: u32) {
        self.record(Command::BindVertexAttribute {
            buffer,
            location,
            stride,
        });
    }

    fn bind_index_buffer(&mut self, buffer: BufferId) {
        self.record(Command::BindIndexBuffer(buffer));
    }

    fn uniform_matrix4(&mut self, location: &UniformHandle, value: &[f32; 16]) {
        self.record(Command::UniformMatrix4 {
            location: location.clone(),
            value: *value,
        });
    }

    fn uniform_f32(&mut self, location: &UniformHandle, value: f32) {
        self.record(Command::UniformF32 {
            location: location.clone(),
            value,
        });
    }

    fn uniform_vec3(&mut self, location: &UniformHandle, value: [f32; 3]) {
        self.record(Command::UniformVec3 {
            location: location.clone(),
            value,
        });
    }

    fn uniform_vec4(&mut self, location: &UniformHandle, value: [f32; 4]) {
        self.record(Command::UniformVec4 {
            location: location.clone(),
            value,
        });
    }

    fn enable(&mut self, capability: Capability) {
        self.record(Command::Enable(capability));
    }

    fn disable(&mut self, capability: Capability) {
        self.record(Command::Disable(capability));
    }

    fn depth_func(&mut self, func: DepthFunc) {
        self.record(Command::DepthFunc(func));
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.record(Command::BlendFunc(src, dst));
    }

    fn front_face(&mut self, winding: Winding) {
        self.record(Command::FrontFace(winding));
    }

    fn clear(&mut self, colour: [f32; 4], depth: f32) {
        self.record(Command::Clear { colour, depth });
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.record(Command::Viewport {
            x,
            y,
            width,
            height,
        });
    }

    fn draw_arrays(&mut self, first: i32, count: i32) {
        self.record(Command::DrawArrays { first, count });
    }

    fn draw_elements(&mut self, count: i32) {
        self.record(Command::DrawElements { count });
    }

    fn flush(&mut self) {
        self.record(Command::Flush);
    }
}

/// An offscreen surface of a given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessSurface {
    width: u32,
    height: u32,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Surface for HeadlessSurface {
    type Context = HeadlessContext;

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn create_context(&self) -> anyhow::Result<HeadlessContext> {
        Ok(HeadlessContext::new())
    }
}
