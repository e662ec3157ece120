//! Shader sources, uniform values and per-material render state.

use std::collections::BTreeMap;

use crate::data_structures::matrix::Matrix4;

/// Uniform receiving the node's world (model) matrix.
pub const MODEL_MATRIX: &str = "mMatrix";
/// Uniform receiving the camera view matrix.
pub const VIEW_MATRIX: &str = "vMatrix";
/// Uniform receiving the projection matrix.
pub const PROJECTION_MATRIX: &str = "pMatrix";

/// A uniform value tagged with its shader type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Uniform {
    Mat4(Matrix4),
    Float(f32),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
}

/// Which faces survive culling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Construction record for a [`Material`].
#[derive(Clone, Debug, Default)]
pub struct MaterialConfig {
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub uniforms: BTreeMap<String, Uniform>,
    pub transparent: bool,
    pub side: Side,
}

/// Shader program sources plus the state needed to draw with them.
///
/// The shader sources are opaque to the renderer and only passed to the
/// graphics context. Every material carries the three transform uniforms
/// ([`MODEL_MATRIX`], [`VIEW_MATRIX`], [`PROJECTION_MATRIX`]); the renderer
/// overwrites their values each frame.
#[derive(Clone, Debug)]
pub struct Material {
    vertex_shader: String,
    fragment_shader: String,
    uniforms: BTreeMap<String, Uniform>,
    pub transparent: bool,
    pub side: Side,
}

impl Material {
    pub fn new(config: MaterialConfig) -> Self {
        let MaterialConfig {
            vertex_shader,
            fragment_shader,
            mut uniforms,
            transparent,
            side,
        } = config;
        for name in [MODEL_MATRIX, VIEW_MATRIX, PROJECTION_MATRIX] {
            uniforms
                .entry(name.to_string())
                .or_insert(Uniform::Mat4(Matrix4::IDENTITY));
        }
        Self {
            vertex_shader,
            fragment_shader,
            uniforms,
            transparent,
            side,
        }
    }

    /// Opaque material with only the transform uniforms.
    pub fn from_sources(vertex_shader: impl Into<String>, fragment_shader: impl Into<String>) -> Self {
        Self::new(MaterialConfig {
            vertex_shader: vertex_shader.into(),
            fragment_shader: fragment_shader.into(),
            ..Default::default()
        })
    }

    pub fn vertex_shader(&self) -> &str {
        &self.vertex_shader
    }

    pub fn fragment_shader(&self) -> &str {
        &self.fragment_shader
    }

    pub fn uniforms(&self) -> &BTreeMap<String, Uniform> {
        &self.uniforms
    }

    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.uniforms.get(name)
    }

    /// Update the value of a declared uniform.
    ///
    /// Returns `false` (and leaves the material unchanged) when `name` was not
    /// declared at construction: the set of uniforms is fixed so that cached
    /// uniform locations stay valid.
    pub fn set_uniform(&mut self, name: &str, value: Uniform) -> bool {
        match self.uniforms.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_uniforms_are_always_declared() {
        let material = Material::from_sources("vs", "fs");
        for name in [MODEL_MATRIX, VIEW_MATRIX, PROJECTION_MATRIX] {
            assert_eq!(
                material.uniform(name),
                Some(&Uniform::Mat4(Matrix4::IDENTITY))
            );
        }
        assert!(!material.transparent);
        assert_eq!(material.side, Side::Front);
    }

    #[test]
    fn configured_uniforms_are_kept() {
        let mut uniforms = BTreeMap::new();
        uniforms.insert("alpha".to_string(), Uniform::Float(0.5));
        let material = Material::new(MaterialConfig {
            vertex_shader: "vs".into(),
            fragment_shader: "fs".into(),
            uniforms,
            transparent: true,
            side: Side::Double,
        });

        assert_eq!(material.uniforms().len(), 4);
        assert_eq!(material.uniform("alpha"), Some(&Uniform::Float(0.5)));
        assert_eq!(material.side, Side::Double);
    }

    #[test]
    fn set_uniform_only_updates_declared_names() {
        let mut material = Material::from_sources("vs", "fs");
        let mut m = Matrix4::new();
        m.translate([0.0, 0.0, -5.0]);

        assert!(material.set_uniform(VIEW_MATRIX, Uniform::Mat4(m)));
        assert!(!material.set_uniform("tint", Uniform::Vec4([1.0; 4])));
        assert_eq!(material.uniform(VIEW_MATRIX), Some(&Uniform::Mat4(m)));
        assert!(material.uniform("tint").is_none());
    }
}
