//! Fixed camera configuration and the projection derived from the viewport.
//!
//! The camera is not part of the scene graph: the renderer builds the view
//! matrix from a [`CameraConfig`] every frame and only recomputes the
//! projection when the surface is resized.

use crate::data_structures::matrix::Matrix4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub center: [f32; 3],
    pub up: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [0.0, 0.0, 10.0],
            center: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
        }
    }
}

impl CameraConfig {
    pub fn view_matrix(&self) -> Matrix4 {
        let mut view = Matrix4::new();
        view.look_at(self.eye, self.center, self.up);
        view
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 90.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// Perspective projection for a viewport aspect ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub config: ProjectionConfig,
    aspect: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, config: ProjectionConfig) -> Self {
        let mut projection = Self {
            config,
            aspect: 1.0,
        };
        projection.resize(width, height);
        projection
    }

    /// Recompute the aspect ratio. A zero height keeps the previous one.
    pub fn resize(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn matrix(&self) -> Matrix4 {
        let mut projection = Matrix4::new();
        projection.perspective(
            self.config.fov_y_degrees,
            self.aspect,
            self.config.near,
            self.config.far,
        );
        projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Point3, Vector3};

    #[test]
    fn default_view_looks_down_negative_z() {
        let view = CameraConfig::default().view_matrix();
        let expected = cgmath::Matrix4::look_at_rh(
            Point3::new(0.0, 0.0, 10.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_y(),
        );
        assert!(view.approx_eq(&expected.into(), 1e-5));
        assert_eq!(view.transform_point([0.0, 0.0, 0.0]), [0.0, 0.0, -10.0]);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut projection = Projection::new(800, 400, ProjectionConfig::default());
        assert_eq!(projection.aspect(), 2.0);

        projection.resize(300, 0);
        assert_eq!(projection.aspect(), 2.0);

        projection.resize(300, 600);
        let expected = cgmath::perspective(Deg(90.0), 0.5, 0.1, 100.0);
        assert!(projection.matrix().approx_eq(&expected.into(), 1e-5));
    }
}
