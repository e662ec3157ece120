//! An indexed octahedron bobbing up and down behind a translucent
//! double-sided quad, rendered headlessly for two seconds.
//!
//! `RUST_LOG=debug cargo run --example main_scene`

use instant::Duration;
use scene_ngin::{
    backends::headless::{Command, HeadlessSurface},
    flow::{run, App, FrameTimer, IntervalScheduler, Scene},
    resources::{load_shader_source, ShaderSource},
    Geometry, MaterialConfig, Mesh, NodeId, Object3D, SceneNode, Side,
};

const COMMAND_HISTORY: usize = 1024;

struct MainScene {
    root: Object3D,
    octahedron: NodeId,
    count: u32,
}

impl MainScene {
    fn new(shaders: &ShaderSource) -> Self {
        let mut root = Object3D::new();

        let geometry = Geometry::new()
            .with_attribute(
                "position",
                3,
                vec![
                    0.0, 1.5, 0.0, //
                    1.0, 0.0, 1.0, //
                    1.0, 0.0, -1.0, //
                    -1.0, 0.0, -1.0, //
                    -1.0, 0.0, 1.0, //
                    0.0, -1.5, 0.0,
                ],
            )
            .with_attribute(
                "color",
                4,
                vec![
                    1.0, 0.0, 0.0, 1.0, //
                    0.0, 1.0, 0.0, 1.0, //
                    0.0, 0.0, 1.0, 1.0, //
                    1.0, 0.0, 1.0, 1.0, //
                    0.0, 1.0, 1.0, 1.0, //
                    1.0, 1.0, 0.0, 1.0,
                ],
            )
            .with_index(vec![
                0, 1, 2, 0, 2, 3, 0, 3, 4, 0, 4, 1, //
                5, 2, 1, 5, 3, 2, 5, 4, 3, 5, 1, 4,
            ]);
        let octahedron = root.add(Mesh::new(geometry, shaders.material()));

        let geometry = Geometry::new()
            .with_attribute(
                "position",
                3,
                vec![
                    2.0, -2.0, 0.0, //
                    -2.0, -2.0, 0.0, //
                    -2.0, 2.0, 0.0, //
                    2.0, 2.0, 0.0,
                ],
            )
            .with_attribute("color", 4, [1.0, 1.0, 1.0, 0.5].repeat(4))
            .with_index(vec![0, 1, 2, 0, 2, 3]);
        let mut pane = Mesh::new(
            geometry,
            scene_ngin::Material::new(MaterialConfig {
                transparent: true,
                side: Side::Double,
                ..shaders.material_config()
            }),
        );
        pane.object_mut().position.z = -2.0;
        root.add(pane);

        Self {
            root,
            octahedron,
            count: 0,
        }
    }
}

impl SceneNode for MainScene {
    fn object(&self) -> &Object3D {
        &self.root
    }

    fn object_mut(&mut self) -> &mut Object3D {
        &mut self.root
    }
}

impl Scene for MainScene {
    fn on_update(&mut self, _dt: Duration) {
        self.count += 2;
        let rad = (self.count % 360) as f32 * std::f32::consts::PI / 180.0;

        if let Some(mesh) = self.root.find_mesh_mut(self.octahedron) {
            mesh.object_mut().rotation[0] = -rad * 2.0;
        }
        self.root.position.y = rad.sin() * 3.0;
        self.root.rotation[0] = rad;
    }
}

fn main() -> anyhow::Result<()> {
    let shaders = futures::executor::block_on(load_shader_source(
        "shaders/vertex.glsl",
        "shaders/fragment.glsl",
    ))?;

    let mut app = App::new(
        HeadlessSurface::new(800, 600),
        MainScene::new(&shaders),
        IntervalScheduler::default(),
    )?
    .with_stats(FrameTimer::new());
    app.renderer_mut()
        .context_mut()
        .set_command_limit(Some(COMMAND_HISTORY));

    let frames = run(&mut app, 120)?;

    let commands = app.renderer().context().commands();
    let draws = commands
        .iter()
        .filter(|c| matches!(c, Command::DrawElements { .. }))
        .count();
    log::info!(
        "rendered {frames} frames, {draws} indexed draws in the last {} commands, root at y = {:.3}",
        commands.len(),
        app.scene().root.position.y
    );

    app.dispose();
    Ok(())
}
