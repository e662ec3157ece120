//! The retained-mode renderer.
//!
//! [`Renderer`] owns a [`GraphicsContext`] and a cache of [`RenderItem`]s keyed
//! by mesh [`NodeId`]. Registration ([`Renderer::add`]) compiles programs and
//! uploads geometry once per mesh; [`Renderer::render`] recomputes world
//! matrices and replays the cache in pre-order.
//!
//! The render list is derived from the tree on every frame, so meshes attached
//! after registration are picked up (and registered) lazily. The last list of
//! every root is kept; a mesh is released once it left the tree it was drawn
//! from and no other root still lists it.

use std::collections::{HashMap, HashSet};

use anyhow::Context as _;

use crate::{
    camera::{CameraConfig, Projection, ProjectionConfig},
    context::GraphicsContext,
    data_structures::{
        material::{MODEL_MATRIX, PROJECTION_MATRIX, Uniform, VIEW_MATRIX},
        matrix::Matrix4,
        scene_graph::{NodeId, SceneNode},
    },
    render::RenderItem,
};

/// Renderer settings. The defaults reproduce the stock camera and clear state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RendererConfig {
    pub camera: CameraConfig,
    pub projection: ProjectionConfig,
    pub clear_colour: [f32; 4],
    pub clear_depth: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            projection: ProjectionConfig::default(),
            clear_colour: [0.0, 0.0, 0.0, 1.0],
            clear_depth: 1.0,
        }
    }
}

pub struct Renderer<C: GraphicsContext> {
    ctx: C,
    config: RendererConfig,
    size: (u32, u32),
    projection: Projection,
    projection_matrix: Matrix4,
    projection_dirty: bool,
    items: HashMap<NodeId, RenderItem<C>>,
    roots: HashMap<NodeId, Vec<NodeId>>,
    render_list: Vec<NodeId>,
}

impl<C: GraphicsContext> Renderer<C> {
    pub fn new(ctx: C, config: RendererConfig) -> Self {
        let projection = Projection::new(1, 1, config.projection);
        Self {
            ctx,
            config,
            size: (0, 0),
            projection_matrix: projection.matrix(),
            projection,
            projection_dirty: false,
            items: HashMap::new(),
            roots: HashMap::new(),
            render_list: Vec::new(),
        }
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Mutable access to the settings; the projection is rebuilt before the
    /// next frame.
    pub fn config_mut(&mut self) -> &mut RendererConfig {
        self.projection_dirty = true;
        &mut self.config
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Mesh ids in draw order, as of the last `add` or `render`.
    pub fn render_list(&self) -> &[NodeId] {
        &self.render_list
    }

    pub fn render_item(&self, id: NodeId) -> Option<&RenderItem<C>> {
        self.items.get(&id)
    }

    pub fn projection_matrix(&self) -> &Matrix4 {
        &self.projection_matrix
    }

    /// Resize the viewport and recompute the projection aspect ratio.
    pub fn set_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("ignoring resize to {width}x{height}");
            return;
        }
        self.size = (width, height);
        self.ctx.viewport(0, 0, width as i32, height as i32);
        self.projection.resize(width, height);
        self.projection.config = self.config.projection;
        self.projection_matrix = self.projection.matrix();
        self.projection_dirty = false;
    }

    /// Register every mesh below (and including) `root`.
    ///
    /// Meshes that are already registered are skipped. If any mesh fails, the
    /// handles created by this call are released and the cache is unchanged.
    pub fn add(&mut self, root: &dyn SceneNode) -> anyhow::Result<()> {
        let list = self.register(root)?;
        self.track(root.id(), list);
        Ok(())
    }

    fn register(&mut self, root: &dyn SceneNode) -> anyhow::Result<Vec<NodeId>> {
        let meshes = root.meshes();
        let mut created: Vec<RenderItem<C>> = Vec::new();
        for mesh in &meshes {
            let id = mesh.id();
            if self.items.contains_key(&id) {
                continue;
            }
            match RenderItem::register(&mut self.ctx, mesh)
                .with_context(|| format!("failed to register mesh {id}"))
            {
                Ok(item) => created.push(item),
                Err(e) => {
                    for item in created {
                        item.release(&mut self.ctx);
                    }
                    return Err(e);
                }
            }
        }
        for item in created {
            self.items.insert(item.node, item);
        }
        Ok(meshes.into_iter().map(|mesh| mesh.id()).collect())
    }

    /// Record `list` as the current render list of `root` and release the
    /// meshes that dropped out of it and are not listed by any other root.
    fn track(&mut self, root: NodeId, list: Vec<NodeId>) {
        self.render_list = list.clone();
        let Some(previous) = self.roots.insert(root, list) else {
            return;
        };
        let live: HashSet<NodeId> = self.roots.values().flatten().copied().collect();
        for id in previous {
            if live.contains(&id) {
                continue;
            }
            if let Some(item) = self.items.remove(&id) {
                log::debug!("{id}: mesh left the scene, releasing its render item");
                item.release(&mut self.ctx);
            }
        }
    }

    /// Stop tracking the tree rooted at `root` and release its meshes that no
    /// other root lists.
    pub fn remove(&mut self, root: NodeId) {
        self.track(root, Vec::new());
        self.roots.remove(&root);
    }

    /// Draw one frame of the tree rooted at `root`.
    pub fn render(&mut self, root: &mut dyn SceneNode) -> anyhow::Result<()> {
        let list = self.register(root)?;
        self.track(root.id(), list);

        if self.projection_dirty {
            self.projection.config = self.config.projection;
            self.projection_matrix = self.projection.matrix();
            self.projection_dirty = false;
        }
        let view = self.config.camera.view_matrix();
        let projection = self.projection_matrix;

        self.ctx
            .clear(self.config.clear_colour, self.config.clear_depth);
        root.update_matrix_world(None);

        let (ctx, items) = (&mut self.ctx, &self.items);
        root.traverse_mut(&mut |node| {
            let Some(mesh) = node.as_mesh_mut() else {
                return;
            };
            let Some(item) = items.get(&mesh.id()) else {
                return;
            };
            let world = *mesh.object().matrix_world();
            mesh.material.set_uniform(MODEL_MATRIX, Uniform::Mat4(world));
            mesh.material.set_uniform(VIEW_MATRIX, Uniform::Mat4(view));
            mesh.material
                .set_uniform(PROJECTION_MATRIX, Uniform::Mat4(projection));
            item.draw(ctx, mesh);
        });

        self.ctx.flush();
        Ok(())
    }

    /// Release every cached GPU handle.
    pub fn dispose(&mut self) {
        for (_, item) in self.items.drain() {
            item.release(&mut self.ctx);
        }
        self.roots.clear();
        self.render_list.clear();
    }
}

impl<C: GraphicsContext + std::fmt::Debug> std::fmt::Debug for Renderer<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.config)
            .field("size", &self.size)
            .field("render_list", &self.render_list)
            .finish_non_exhaustive()
    }
}
