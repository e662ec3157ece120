//! Per-mesh GPU resources and the draw sequence that replays them.
//!
//! A [`RenderItem`] is built once per mesh node when it is first registered
//! with the renderer. It owns the compiled program, one vertex buffer per
//! resolved attribute, the optional index buffer and the resolved uniform
//! locations. Every frame [`RenderItem::draw`] binds all of that, uploads the
//! material's current uniform values, applies the material's render state and
//! issues the draw call.
//!
//! # Key types
//!
//! - [`RenderItem<C>`] is the cached bundle of handles for one mesh
//! - [`AttributeBinding<C>`] is a vertex buffer plus its attribute location
//! - [`UniformBinding<C>`] is a uniform name plus its location
//!

use crate::{
    context::{ContextError, GraphicsContext},
    data_structures::{
        material::Uniform,
        scene_graph::{Mesh, NodeId, SceneNode},
    },
    pipelines::{basic::enable_depth_test, culling::switch_culling, transparent::switch_blending},
};

/// Vertex count of a non-indexed draw.
pub const NON_INDEXED_VERTEX_COUNT: i32 = 3;

#[derive(Debug)]
pub struct AttributeBinding<C: GraphicsContext> {
    pub name: String,
    pub buffer: C::Buffer,
    pub location: u32,
    pub stride: u32,
}

#[derive(Debug)]
pub struct UniformBinding<C: GraphicsContext> {
    pub name: String,
    pub location: C::UniformLocation,
}

/// GPU handles and binding locations cached for one mesh node.
#[derive(Debug)]
pub struct RenderItem<C: GraphicsContext> {
    pub node: NodeId,
    pub program: C::Program,
    pub attributes: Vec<AttributeBinding<C>>,
    pub uniforms: Vec<UniformBinding<C>>,
    /// Index buffer and its element count, `None` for non-indexed geometry.
    pub index: Option<(C::Buffer, i32)>,
}

impl<C: GraphicsContext> RenderItem<C> {
    /// Compile the mesh's program and upload its geometry.
    ///
    /// Attributes and uniforms the program does not declare are skipped with
    /// a warning. On failure every handle created so far is released again.
    pub fn register(ctx: &mut C, mesh: &Mesh) -> Result<Self, ContextError> {
        let node = mesh.id();
        let material = &mesh.material;
        let program = ctx.create_program(material.vertex_shader(), material.fragment_shader())?;
        let mut item = RenderItem {
            node,
            program,
            attributes: Vec::new(),
            uniforms: Vec::new(),
            index: None,
        };

        if let Err(e) = item.upload_geometry(ctx, mesh) {
            item.release(ctx);
            return Err(e);
        }

        for name in material.uniforms().keys() {
            match ctx.uniform_location(program, name) {
                Some(location) => item.uniforms.push(UniformBinding {
                    name: name.clone(),
                    location,
                }),
                None => log::warn!("{node}: program has no active uniform `{name}`"),
            }
        }

        log::debug!(
            "{node}: registered {} attribute(s), {} uniform(s), indexed: {}",
            item.attributes.len(),
            item.uniforms.len(),
            item.index.is_some()
        );
        Ok(item)
    }

    fn upload_geometry(&mut self, ctx: &mut C, mesh: &Mesh) -> Result<(), ContextError> {
        for (name, attribute) in mesh.geometry.attributes() {
            let Some(location) = ctx.attribute_location(self.program, name) else {
                log::warn!("{}: program has no active attribute `{name}`", self.node);
                continue;
            };
            let buffer = ctx.create_vertex_buffer(&attribute.vertices)?;
            self.attributes.push(AttributeBinding {
                name: name.clone(),
                buffer,
                location,
                stride: attribute.stride,
            });
        }

        let index = mesh.geometry.index();
        if !index.is_empty() {
            let count = i32::try_from(index.len()).map_err(|_| {
                ContextError::ResourceCreation(format!(
                    "index buffer of {} elements is too large",
                    index.len()
                ))
            })?;
            let buffer = ctx.create_index_buffer(index)?;
            self.index = Some((buffer, count));
        }
        Ok(())
    }

    /// Bind everything and draw `mesh` with its current uniform values.
    pub fn draw(&self, ctx: &mut C, mesh: &Mesh) {
        debug_assert_eq!(self.node, mesh.id(), "render item drawn with a foreign mesh");

        ctx.use_program(self.program);
        for attribute in &self.attributes {
            ctx.bind_vertex_attribute(attribute.buffer, attribute.location, attribute.stride);
        }
        for uniform in &self.uniforms {
            if let Some(value) = mesh.material.uniform(&uniform.name) {
                upload_uniform(ctx, &uniform.location, value);
            }
        }

        enable_depth_test(ctx);
        switch_blending(ctx, mesh.material.transparent);
        switch_culling(ctx, mesh.material.side);

        match self.index {
            Some((buffer, count)) => {
                ctx.bind_index_buffer(buffer);
                ctx.draw_elements(count);
            }
            None => ctx.draw_arrays(0, NON_INDEXED_VERTEX_COUNT),
        }
    }

    /// Delete every handle owned by this item.
    pub fn release(self, ctx: &mut C) {
        for attribute in self.attributes {
            ctx.delete_buffer(attribute.buffer);
        }
        if let Some((buffer, _)) = self.index {
            ctx.delete_buffer(buffer);
        }
        ctx.delete_program(self.program);
    }
}

pub fn upload_uniform<C: GraphicsContext + ?Sized>(
    ctx: &mut C,
    location: &C::UniformLocation,
    value: &Uniform,
) {
    match value {
        Uniform::Mat4(m) => ctx.uniform_matrix4(location, m.as_array()),
        Uniform::Float(v) => ctx.uniform_f32(location, *v),
        Uniform::Vec3(v) => ctx.uniform_vec3(location, *v),
        Uniform::Vec4(v) => ctx.uniform_vec4(location, *v),
    }
}
