//! Oblique multi-floor projection.
//!
//! A world point is translated to the plan centre, rotated about the
//! vertical axis, foreshortened on y by `tilt`, then lifted by
//! `z * separation`. [`Projection::floor_transform`] is the same map written
//! as an affine matrix so a whole floor image can be placed at once.

use crate::geometry::{Affine2, Vec2};
use floorgraph_core::{Floor, floor_extent};
use serde::{Deserialize, Serialize};

pub const ANGLE_RANGE: (f64, f64) = (0.0, 360.0);
pub const TILT_RANGE: (f64, f64) = (0.1, 1.0);
pub const ZOOM_RANGE: (f64, f64) = (0.1, 2.0);
pub const SEPARATION_RANGE: (f64, f64) = (0.0, 5.0);

/// View parameters of the 3D overview. Values are clamped on every set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Rotation about the vertical axis, in degrees.
    angle: f64,
    tilt: f64,
    zoom: f64,
    separation: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            angle: 45.0,
            tilt: 0.6,
            zoom: 0.8,
            separation: 1.0,
        }
    }
}

impl Camera {
    pub fn new(angle: f64, tilt: f64, zoom: f64, separation: f64) -> Self {
        let mut camera = Self::default();
        camera.set_angle(angle);
        camera.set_tilt(tilt);
        camera.set_zoom(zoom);
        camera.set_separation(separation);
        camera
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn tilt(&self) -> f64 {
        self.tilt
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn separation(&self) -> f64 {
        self.separation
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.angle = clamp_to(angle, ANGLE_RANGE, self.angle);
    }

    pub fn set_tilt(&mut self, tilt: f64) {
        self.tilt = clamp_to(tilt, TILT_RANGE, self.tilt);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = clamp_to(zoom, ZOOM_RANGE, self.zoom);
    }

    pub fn set_separation(&mut self, separation: f64) {
        self.separation = clamp_to(separation, SEPARATION_RANGE, self.separation);
    }

    /// Re-clamp every field, e.g. after deserializing an untrusted file.
    pub fn clamped(self) -> Self {
        Self::new(self.angle, self.tilt, self.zoom, self.separation)
    }

    /// Zoom applied around `viewport_center`, mapping projected coordinates
    /// to screen pixels.
    pub fn screen_transform(&self, viewport_center: Vec2) -> Affine2 {
        Affine2 {
            a: self.zoom,
            b: 0.0,
            c: 0.0,
            d: self.zoom,
            e: viewport_center.x,
            f: viewport_center.y,
        }
    }
}

// NaN keeps the previous value.
fn clamp_to(value: f64, (lo, hi): (f64, f64), fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(lo, hi)
    }
}

/// Rotation centre shared by every floor: half the largest floor extent.
pub fn plan_center<'a, I>(floors: I) -> Vec2
where
    I: IntoIterator<Item = &'a Floor>,
{
    let (w, h) = floors
        .into_iter()
        .fold((0u32, 0u32), |(w, h), f| (w.max(f.width), h.max(f.height)));
    Vec2::new(w as f64 / 2.0, h as f64 / 2.0)
}

/// A camera bound to a plan centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub center: Vec2,
    pub camera: Camera,
}

impl Projection {
    pub fn new(center: Vec2, camera: Camera) -> Self {
        Self { center, camera }
    }

    fn sin_cos(&self) -> (f64, f64) {
        self.camera.angle.to_radians().sin_cos()
    }

    pub fn project(&self, x: f64, y: f64, z: f64) -> Vec2 {
        let (sin, cos) = self.sin_cos();
        let tx = x - self.center.x;
        let ty = y - self.center.y;
        let rx = tx * cos - ty * sin;
        let ry = tx * sin + ty * cos;
        Vec2::new(rx, ry * self.camera.tilt - z * self.camera.separation)
    }

    /// Affine placement of a plane at height `z`.
    pub fn plane_transform(&self, z: f64) -> Affine2 {
        let (sin, cos) = self.sin_cos();
        let tilt = self.camera.tilt;
        let (cx, cy) = (self.center.x, self.center.y);
        Affine2 {
            a: cos,
            b: sin * tilt,
            c: -sin,
            d: cos * tilt,
            e: -cx * cos + cy * sin,
            f: (-cx * sin - cy * cos) * tilt - z * self.camera.separation,
        }
    }

    /// Placement of floor `level`'s image, whose plane sits at the floor's base.
    pub fn floor_transform(&self, level: i32) -> Affine2 {
        self.plane_transform(floor_extent(level).0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorgraph_core::FloorId;

    fn floor(level: i32, width: u32, height: u32) -> Floor {
        Floor {
            id: FloorId::new(format!("f{level}")),
            level,
            name: format!("Level {level}"),
            image_url: String::new(),
            width,
            height,
        }
    }

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-9
    }

    #[test]
    fn test_camera_clamps_on_set() {
        let mut camera = Camera::new(400.0, 0.0, 5.0, -1.0);
        assert_eq!(camera.angle(), 360.0);
        assert_eq!(camera.tilt(), 0.1);
        assert_eq!(camera.zoom(), 2.0);
        assert_eq!(camera.separation(), 0.0);

        camera.set_zoom(f64::NAN);
        assert_eq!(camera.zoom(), 2.0);
        camera.set_angle(-10.0);
        assert_eq!(camera.angle(), 0.0);
    }

    #[test]
    fn test_deserialized_camera_can_be_clamped() {
        let camera: Camera = serde_json::from_str(r#"{"angle": 90.0, "tilt": 9.0}"#).unwrap();
        let camera = camera.clamped();
        assert_eq!(camera.angle(), 90.0);
        assert_eq!(camera.tilt(), 1.0);
        assert_eq!(camera.zoom(), 0.8);
    }

    #[test]
    fn test_plan_center_uses_largest_floor() {
        let floors = [floor(0, 800, 600), floor(1, 1000, 400)];
        assert_eq!(plan_center(&floors), Vec2::new(500.0, 300.0));
        assert_eq!(plan_center(&[] as &[Floor]), Vec2::ZERO);
    }

    #[test]
    fn test_identity_camera_is_pure_translation() {
        let projection = Projection::new(Vec2::new(400.0, 300.0), Camera::new(0.0, 1.0, 1.0, 0.0));
        assert!(close(projection.project(500.0, 350.0, 900.0), Vec2::new(100.0, 50.0)));
    }

    #[test]
    fn test_quarter_turn_rotates_then_tilts() {
        let projection = Projection::new(Vec2::ZERO, Camera::new(90.0, 0.5, 1.0, 2.0));
        // (10, 0) rotates to (0, 10), tilts to (0, 5), then lifts by z * 2.
        assert!(close(projection.project(10.0, 0.0, 1.0), Vec2::new(0.0, 3.0)));
    }

    #[test]
    fn test_floor_transform_matches_project_at_image_corners() {
        let floors = [floor(0, 800, 600), floor(2, 600, 400)];
        let projection = Projection::new(plan_center(&floors), Camera::new(30.0, 0.7, 1.0, 1.5));
        for f in &floors {
            let affine = projection.floor_transform(f.level);
            let (w, h) = (f.width as f64, f.height as f64);
            for (x, y) in [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)] {
                let expected = projection.project(x, y, f.base_z());
                assert!(close(affine.apply(Vec2::new(x, y)), expected));
            }
        }
    }

    #[test]
    fn test_screen_transform_scales_about_viewport() {
        let camera = Camera::new(0.0, 1.0, 2.0, 0.0);
        let screen = camera.screen_transform(Vec2::new(640.0, 360.0));
        assert_eq!(screen.apply(Vec2::new(10.0, -5.0)), Vec2::new(660.0, 350.0));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The floor-plane matrix and per-point projection agree everywhere.
        #[test]
        fn prop_plane_transform_agrees_with_project(
            angle in 0.0f64..360.0,
            tilt in 0.1f64..1.0,
            separation in 0.0f64..5.0,
            cx in 0.0f64..2000.0, cy in 0.0f64..2000.0,
            x in -2000.0f64..2000.0, y in -2000.0f64..2000.0,
            level in -3i32..6
        ) {
            let projection = Projection::new(
                Vec2::new(cx, cy),
                Camera::new(angle, tilt, 1.0, separation),
            );
            let z = floor_extent(level).0;
            let via_matrix = projection.floor_transform(level).apply(Vec2::new(x, y));
            let via_point = projection.project(x, y, z);
            prop_assert!((via_matrix - via_point).length() < 1e-6);
        }

        /// With no rotation, full tilt and no separation only the centre shift remains.
        #[test]
        fn prop_neutral_camera_translates(
            cx in -500.0f64..500.0, cy in -500.0f64..500.0,
            x in -2000.0f64..2000.0, y in -2000.0f64..2000.0, z in -900.0f64..900.0
        ) {
            let projection = Projection::new(Vec2::new(cx, cy), Camera::new(0.0, 1.0, 1.0, 0.0));
            let p = projection.project(x, y, z);
            prop_assert!((p - Vec2::new(x - cx, y - cy)).length() < 1e-9);
        }
    }
}
