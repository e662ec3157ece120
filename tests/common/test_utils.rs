use scene_ngin::{
    backends::headless::Command,
    context::Capability,
    flow::Scene,
    Geometry, Material, MaterialConfig, Mesh, Object3D, SceneNode,
};
use instant::Duration;

pub const VERTEX_SHADER: &str = include_str!("../../assets/shaders/vertex.glsl");
pub const FRAGMENT_SHADER: &str = include_str!("../../assets/shaders/fragment.glsl");

pub fn material() -> Material {
    Material::from_sources(VERTEX_SHADER, FRAGMENT_SHADER)
}

/// Single non-indexed triangle.
pub fn triangle() -> Mesh {
    let geometry = Geometry::new()
        .with_attribute(
            "position",
            3,
            vec![0.0, 1.0, 0.0, 1.0, 0.0, 0.0, -1.0, 0.0, 0.0],
        )
        .with_attribute("color", 4, vec![1.0; 12]);
    Mesh::new(geometry, material())
}

/// Indexed quad made of two triangles.
pub fn quad(config: MaterialConfig) -> Mesh {
    let geometry = Geometry::new()
        .with_attribute(
            "position",
            3,
            vec![
                -1.0, 1.0, 0.0, 1.0, 1.0, 0.0, -1.0, -1.0, 0.0, 1.0, -1.0, 0.0,
            ],
        )
        .with_attribute("color", 4, vec![1.0; 16])
        .with_index(vec![0, 1, 2, 3, 2, 1]);
    Mesh::new(geometry, Material::new(config))
}

pub fn quad_config() -> MaterialConfig {
    MaterialConfig {
        vertex_shader: VERTEX_SHADER.to_string(),
        fragment_shader: FRAGMENT_SHADER.to_string(),
        ..Default::default()
    }
}

/// A scene wrapping a plain root node and counting its lifecycle calls.
pub struct CountingScene {
    pub root: Object3D,
    pub init_invocations: u32,
    pub update_invocations: u32,
    pub last_dt: Option<Duration>,
}

impl CountingScene {
    pub fn new(root: Object3D) -> Self {
        Self {
            root,
            init_invocations: 0,
            update_invocations: 0,
            last_dt: None,
        }
    }
}

impl SceneNode for CountingScene {
    fn object(&self) -> &Object3D {
        &self.root
    }

    fn object_mut(&mut self) -> &mut Object3D {
        &mut self.root
    }
}

impl Scene for CountingScene {
    fn on_init(&mut self, config: &mut scene_ngin::RendererConfig) {
        self.init_invocations += 1;
        config.clear_colour = [1.0, 1.0, 1.0, 1.0];
    }

    fn on_update(&mut self, dt: Duration) {
        self.update_invocations += 1;
        self.last_dt = Some(dt);
        self.root.rotation[0] += 0.1;
    }
}

/// Draw calls in submission order.
pub fn draws(commands: &[Command]) -> Vec<Command> {
    commands
        .iter()
        .filter(|c| matches!(c, Command::DrawArrays { .. } | Command::DrawElements { .. }))
        .cloned()
        .collect()
}

/// The blend enable state set before each draw.
pub fn blend_states(commands: &[Command]) -> Vec<bool> {
    commands
        .iter()
        .filter_map(|c| match c {
            Command::Enable(Capability::Blend) => Some(true),
            Command::Disable(Capability::Blend) => Some(false),
            _ => None,
        })
        .collect()
}

pub fn assert_approx(actual: [f32; 3], expected: [f32; 3]) {
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!((a - e).abs() < 1e-5, "{actual:?} != {expected:?}");
    }
}
