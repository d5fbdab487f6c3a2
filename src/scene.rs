//! Quad geometry and the transforms for the two drawn objects

use glam::{Mat4, Vec3};

/// Interleaved `x, y, u, v` per vertex, in pixels
#[rustfmt::skip]
pub const QUAD_VERTICES: [f32; 16] = [
    100.0, 100.0, 0.0, 0.0,
    100.0, 200.0, 0.0, 1.0,
    200.0, 100.0, 1.0, 0.0,
    200.5, 200.5, 1.0, 1.0,
];

#[rustfmt::skip]
pub const QUAD_INDICES: [u32; 6] = [
    0, 1, 2,
    1, 2, 3,
];

/// Per-object translations edited by the overlay sliders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Translations {
    pub a: Vec3,
    pub b: Vec3,
}

impl Default for Translations {
    fn default() -> Self {
        Self {
            a: Vec3::ZERO,
            b: Vec3::new(0.0, 200.0, 0.0),
        }
    }
}

/// Fixed projection and view for a window of a given size
#[derive(Debug, Clone, Copy)]
pub struct Scene {
    height: f32,
    projection: Mat4,
    view: Mat4,
}

impl Scene {
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width as f32, height as f32);
        Self {
            height,
            projection: Mat4::orthographic_rh_gl(0.0, width, 0.0, height, -1.0, 1.0),
            view: Mat4::from_translation(Vec3::new(-100.0, -100.0, 0.0)),
        }
    }

    /// Model-view-projection for an object moved by `translation`
    pub fn mvp(&self, translation: Vec3) -> Mat4 {
        self.projection * self.view * Mat4::from_translation(translation)
    }

    /// Upper bound for every slider component
    pub fn slider_max(&self) -> f32 {
        self.height - 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    const EPS: f32 = 1e-5;

    fn corner(index: usize) -> Vec3 {
        Vec3::new(QUAD_VERTICES[index * 4], QUAD_VERTICES[index * 4 + 1], 0.0)
    }

    fn ndc(mvp: Mat4, point: Vec3) -> Vec3 {
        let clip = mvp * Vec4::new(point.x, point.y, point.z, 1.0);
        clip.truncate() / clip.w
    }

    #[test]
    fn test_projection_maps_window_edges_to_ndc() {
        let scene = Scene::new(1024, 600);
        let projection = scene.projection;

        assert!(ndc(projection, Vec3::ZERO).abs_diff_eq(Vec3::new(-1.0, -1.0, 0.0), EPS));
        assert!(ndc(projection, Vec3::new(1024.0, 600.0, 0.0)).abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), EPS));
        assert!(ndc(projection, Vec3::new(512.0, 300.0, 0.0)).abs_diff_eq(Vec3::ZERO, EPS));
    }

    #[test]
    fn test_untranslated_quad_corners() {
        let scene = Scene::new(1024, 600);
        let mvp = scene.mvp(Vec3::ZERO);

        // The view shifts the quad's (100, 100) corner onto the window origin
        assert!(ndc(mvp, corner(0)).abs_diff_eq(Vec3::new(-1.0, -1.0, 0.0), EPS));
        assert!(ndc(mvp, corner(1)).abs_diff_eq(Vec3::new(-1.0, -1.0 + 200.0 / 600.0, 0.0), EPS));
        assert!(ndc(mvp, corner(2)).abs_diff_eq(Vec3::new(-1.0 + 200.0 / 1024.0, -1.0, 0.0), EPS));
        assert!(ndc(mvp, corner(3)).abs_diff_eq(
            Vec3::new(-1.0 + 201.0 / 1024.0, -1.0 + 201.0 / 600.0, 0.0),
            EPS
        ));
    }

    #[test]
    fn test_translation_moves_by_same_amount() {
        let scene = Scene::new(1024, 600);
        let start = Vec3::new(30.0, 40.0, 0.0);
        let delta = Vec3::new(12.0, -7.0, 0.0);

        let before = ndc(scene.mvp(start), corner(0));
        let after = ndc(scene.mvp(start + delta), corner(0));
        let expected = Vec3::new(2.0 * delta.x / 1024.0, 2.0 * delta.y / 600.0, 0.0);
        assert!((after - before).abs_diff_eq(expected, EPS));

        // Same thing stated on the matrices
        let moved = scene.mvp(start) * Mat4::from_translation(delta);
        assert!(scene.mvp(start + delta).abs_diff_eq(moved, EPS));
    }

    #[test]
    fn test_moving_a_leaves_b_untouched() {
        let scene = Scene::new(1024, 600);
        let mut translations = Translations::default();
        let mvp_b = scene.mvp(translations.b);
        let mvp_a = scene.mvp(translations.a);

        translations.a += Vec3::new(50.0, 25.0, 0.0);

        assert_eq!(scene.mvp(translations.b), mvp_b);
        assert_ne!(scene.mvp(translations.a), mvp_a);
    }

    #[test]
    fn test_default_translations() {
        let translations = Translations::default();
        assert_eq!(translations.a, Vec3::ZERO);
        assert_eq!(translations.b, Vec3::new(0.0, 200.0, 0.0));
    }

    #[test]
    fn test_slider_range_follows_height() {
        assert_eq!(Scene::new(1024, 600).slider_max(), 500.0);
        assert_eq!(Scene::new(800, 400).slider_max(), 300.0);
    }
}
