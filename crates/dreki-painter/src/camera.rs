//! Cameras supply the projection and view matrices a batch uploads before
//! drawing.

use crate::math::{Mat4, Vec2, Vec3};

/// Anything that can provide projection and view matrices for a frame.
pub trait Camera {
    fn projection_matrix(&self) -> Mat4;
    fn view_matrix(&self) -> Mat4;
}

/// An orthographic 2D camera.
///
/// The projection covers `0..viewport.x` horizontally and `0..viewport.y`
/// vertically with the origin at the bottom-left, so one world unit is one
/// pixel when the viewport matches the window. Moving the camera pans the view.
#[derive(Debug, Clone, Copy)]
pub struct Camera2d {
    pub position: Vec2,
    projection: Mat4,
}

impl Camera2d {
    const NEAR: f32 = 0.0;
    const FAR: f32 = 100.0;
    /// Height the camera looks down from; must sit between near and far.
    const EYE_Z: f32 = 20.0;

    /// Create a camera at `position` showing a `viewport`-sized area.
    pub fn new(position: Vec2, viewport: Vec2) -> Self {
        let mut camera = Self {
            position,
            projection: Mat4::IDENTITY,
        };
        camera.set_viewport(viewport);
        camera
    }

    /// Recompute the projection for a new visible area.
    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.projection =
            Mat4::orthographic_rh(0.0, viewport.x, 0.0, viewport.y, Self::NEAR, Self::FAR);
    }
}

impl Default for Camera2d {
    fn default() -> Self {
        Self::new(Vec2::ZERO, Vec2::new(32.0 * 40.0, 32.0 * 21.0))
    }
}

impl Camera for Camera2d {
    fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    fn view_matrix(&self) -> Mat4 {
        let eye = Vec3::new(self.position.x, self.position.y, Self::EYE_Z);
        let target = Vec3::new(self.position.x, self.position.y, -1.0);
        Mat4::look_at_rh(eye, target, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec4;

    fn to_clip(camera: &Camera2d, x: f32, y: f32) -> Vec4 {
        camera.projection_matrix() * camera.view_matrix() * Vec4::new(x, y, 0.0, 1.0)
    }

    #[test]
    fn viewport_corners_map_to_clip_corners() {
        let camera = Camera2d::new(Vec2::ZERO, Vec2::new(800.0, 600.0));

        let bottom_left = to_clip(&camera, 0.0, 0.0);
        assert!((bottom_left.x + 1.0).abs() < 1e-5);
        assert!((bottom_left.y + 1.0).abs() < 1e-5);

        let top_right = to_clip(&camera, 800.0, 600.0);
        assert!((top_right.x - 1.0).abs() < 1e-5);
        assert!((top_right.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn quads_on_the_plane_are_inside_the_depth_range() {
        let camera = Camera2d::default();
        let clip = to_clip(&camera, 100.0, 100.0);
        assert!(clip.z >= 0.0 && clip.z <= 1.0, "depth {} out of range", clip.z);
    }

    #[test]
    fn moving_the_camera_pans_the_view() {
        let mut camera = Camera2d::new(Vec2::ZERO, Vec2::new(800.0, 600.0));
        camera.position = Vec2::new(100.0, 50.0);

        let clip = to_clip(&camera, 100.0, 50.0);
        assert!((clip.x + 1.0).abs() < 1e-5);
        assert!((clip.y + 1.0).abs() < 1e-5);
    }
}
