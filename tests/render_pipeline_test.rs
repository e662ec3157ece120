use scene_ngin::{
    backends::headless::{Command, HeadlessContext},
    context::{Capability, Winding},
    data_structures::material::{MODEL_MATRIX, PROJECTION_MATRIX, VIEW_MATRIX},
    Matrix4, Object3D, Renderer, RendererConfig, SceneNode, Side, Uniform,
};

use crate::common::test_utils::{blend_states, draws, quad, quad_config, triangle};
mod common;

fn renderer() -> Renderer<HeadlessContext> {
    let mut renderer = Renderer::new(HeadlessContext::new(), RendererConfig::default());
    renderer.set_size(800, 600);
    renderer
}

#[test]
fn render_list_is_pre_order_over_meshes() {
    let mut root = Object3D::new();
    let a = root.add(triangle());
    let mut group = Object3D::new();
    let b = group.add(triangle());
    let mut nested = triangle();
    let c = nested.add(quad(quad_config()));
    let d = group.add(nested);
    root.add(group);
    let e = root.add(triangle());

    let mut renderer = renderer();
    renderer.add(&root).unwrap();

    assert_eq!(renderer.render_list(), &[a, b, d, c, e]);
    for id in [a, b, c, d, e] {
        assert_eq!(renderer.render_item(id).unwrap().node, id);
    }
    assert_eq!(renderer.context().live_programs(), 5);
}

#[test]
fn draws_follow_the_render_list() {
    let mut root = Object3D::new();
    let a = root.add(triangle());
    let mut group = Object3D::new();
    let b = group.add(triangle());
    let mut nested = triangle();
    let c = nested.add(quad(quad_config()));
    let d = group.add(nested);
    root.add(group);
    let e = root.add(triangle());

    let mut renderer = renderer();
    renderer.add(&root).unwrap();
    renderer.context_mut().take_commands();
    renderer.render(&mut root).unwrap();

    let expected: Vec<Command> = [a, b, d, c, e]
        .into_iter()
        .map(|id| Command::UseProgram(renderer.render_item(id).unwrap().program))
        .collect();
    let used: Vec<Command> = renderer
        .context()
        .commands()
        .iter()
        .filter(|c| matches!(c, Command::UseProgram(_)))
        .cloned()
        .collect();
    assert_eq!(used, expected);
    assert_eq!(draws(renderer.context().commands()).len(), 5);
}

#[test]
fn empty_index_draws_three_vertices() {
    let mut root = Object3D::new();
    root.add(triangle());
    root.add(quad(quad_config()));

    let mut renderer = renderer();
    renderer.add(&root).unwrap();
    renderer.context_mut().take_commands();
    renderer.render(&mut root).unwrap();

    assert_eq!(
        draws(renderer.context().commands()),
        vec![
            Command::DrawArrays { first: 0, count: 3 },
            Command::DrawElements { count: 6 }
        ]
    );
}

#[test]
fn frame_starts_with_clear_and_ends_with_flush() {
    let mut root = Object3D::new();
    root.add(triangle());
    let mut renderer = renderer();
    renderer.add(&root).unwrap();
    renderer.context_mut().take_commands();

    renderer.render(&mut root).unwrap();
    let commands = renderer.context().commands();

    assert_eq!(
        commands.first(),
        Some(&Command::Clear {
            colour: [0.0, 0.0, 0.0, 1.0],
            depth: 1.0
        })
    );
    assert_eq!(commands.last(), Some(&Command::Flush));
}

#[test]
fn toggling_transparency_changes_blending_only() {
    let mut root = Object3D::new();
    let mesh = root.add(quad(quad_config()));
    let mut renderer = renderer();
    renderer.add(&root).unwrap();

    renderer.render(&mut root).unwrap();
    let item_before = format!("{:?}", renderer.render_item(mesh).unwrap());
    let first_frame = renderer.context_mut().take_commands();

    root.find_mesh_mut(mesh).unwrap().material.transparent = true;
    renderer.render(&mut root).unwrap();
    let second_frame = renderer.context_mut().take_commands();

    assert_eq!(blend_states(&first_frame), vec![false]);
    assert_eq!(blend_states(&second_frame), vec![true]);
    assert_eq!(
        format!("{:?}", renderer.render_item(mesh).unwrap()),
        item_before
    );
    assert!(
        !second_frame
            .iter()
            .any(|c| matches!(c, Command::CreateProgram(_) | Command::CreateVertexBuffer { .. }))
    );
}

#[test]
fn material_side_selects_culling() {
    let mut root = Object3D::new();
    for side in [Side::Front, Side::Back, Side::Double] {
        root.add(quad(scene_ngin::MaterialConfig {
            side,
            ..quad_config()
        }));
    }
    let mut renderer = renderer();
    renderer.add(&root).unwrap();
    renderer.context_mut().take_commands();
    renderer.render(&mut root).unwrap();

    let culling: Vec<&Command> = renderer
        .context()
        .commands()
        .iter()
        .filter(|c| {
            matches!(
                c,
                Command::Enable(Capability::CullFace)
                    | Command::Disable(Capability::CullFace)
                    | Command::FrontFace(_)
            )
        })
        .collect();
    assert_eq!(
        culling,
        vec![
            &Command::Enable(Capability::CullFace),
            &Command::FrontFace(Winding::CounterClockwise),
            &Command::Enable(Capability::CullFace),
            &Command::FrontFace(Winding::Clockwise),
            &Command::Disable(Capability::CullFace),
        ]
    );
}

#[test]
fn transform_uniforms_follow_the_hierarchy() {
    let mut root = Object3D::new();
    root.position = [1.0, 0.0, 0.0].into();
    let mut arm = Object3D::new();
    arm.position = [0.0, 1.0, 0.0].into();
    let hand = arm.add(triangle());
    root.add(arm);

    let mut renderer = renderer();
    renderer.add(&root).unwrap();
    renderer.render(&mut root).unwrap();

    let mesh = root.find(hand).unwrap().as_mesh().unwrap();
    let Some(Uniform::Mat4(model)) = mesh.material.uniform(MODEL_MATRIX) else {
        panic!("model matrix missing");
    };
    crate::common::test_utils::assert_approx(model.transform_point([0.0; 3]), [1.0, 1.0, 0.0]);

    let view = RendererConfig::default().camera.view_matrix();
    assert_eq!(mesh.material.uniform(VIEW_MATRIX), Some(&Uniform::Mat4(view)));
    assert_eq!(
        mesh.material.uniform(PROJECTION_MATRIX),
        Some(&Uniform::Mat4(*renderer.projection_matrix()))
    );
    assert_ne!(*renderer.projection_matrix(), Matrix4::IDENTITY);
}

#[test]
fn scalar_and_vector_uniforms_are_uploaded() {
    let vertex = "attribute vec3 position;\nuniform mat4 mMatrix;\nuniform float alpha;\nuniform vec3 offset;\nvoid main(void) {}\n";
    let fragment = "precision mediump float;\nuniform vec4 tint;\nvoid main(void) {}\n";
    let mut config = quad_config();
    config.vertex_shader = vertex.to_string();
    config.fragment_shader = fragment.to_string();
    config.uniforms.insert("alpha".into(), Uniform::Float(0.25));
    config.uniforms.insert("offset".into(), Uniform::Vec3([1.0, 2.0, 3.0]));
    config.uniforms.insert("tint".into(), Uniform::Vec4([0.5; 4]));

    let mut root = Object3D::new();
    root.add(quad(config));
    let mut renderer = renderer();
    renderer.add(&root).unwrap();
    renderer.render(&mut root).unwrap();

    let commands = renderer.context().commands();
    assert!(commands.iter().any(|c| matches!(
        c,
        Command::UniformF32 { location, value } if location.name == "alpha" && *value == 0.25
    )));
    assert!(commands.iter().any(|c| matches!(
        c,
        Command::UniformVec3 { location, value } if location.name == "offset" && *value == [1.0, 2.0, 3.0]
    )));
    assert!(commands.iter().any(|c| matches!(
        c,
        Command::UniformVec4 { location, value } if location.name == "tint" && *value == [0.5; 4]
    )));
}

#[test]
fn attributes_are_uploaded_in_insertion_order() {
    let mut root = Object3D::new();
    let mesh = root.add(triangle());
    let mut renderer = renderer();
    renderer.add(&root).unwrap();

    let uploads: Vec<usize> = renderer
        .context()
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::CreateVertexBuffer { len, .. } => Some(*len),
            _ => None,
        })
        .collect();
    assert_eq!(uploads, vec![9, 12]);

    let names: Vec<&str> = renderer
        .render_item(mesh)
        .unwrap()
        .attributes
        .iter()
        .map(|binding| binding.name.as_str())
        .collect();
    assert_eq!(names, ["position", "color"]);
}
