//! Calibrated-space to screen-space projection.
//!
//! Maps a 3D point in vehicle-relative calibrated space onto the display:
//! rotate into camera view space, apply the pinhole intrinsic matrix, then
//! pan/scale camera pixels into display pixels. Pure functions of their
//! inputs; no state is mutated anywhere in this module.

use nalgebra::{Matrix3, Point2, Vector3};

use crate::config::{
    CAM_FRAME_HEIGHT,
    CAM_FRAME_WIDTH,
    CLIP_MARGIN,
    FB_HEIGHT,
    FB_WIDTH,
    ROAD_CAM_FOCAL,
    ROAD_VIEW_Y_OFFSET,
    VIEW_ZOOM,
    WIDE_CAM_FOCAL,
};

/// A projected point in display pixel space.
pub type ScreenPoint = Point2<f32>;

/// Depths at or below this are degenerate; the vertex is dropped.
const MIN_DEPTH: f32 = 0.01;

// =============================================================================
// Cameras
// =============================================================================

/// Which road-facing camera the view is built from.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum CameraKind {
    #[default]
    Road,
    Wide,
}

impl CameraKind {
    #[inline]
    pub const fn focal(self) -> f32 {
        match self {
            Self::Road => ROAD_CAM_FOCAL,
            Self::Wide => WIDE_CAM_FOCAL,
        }
    }

    /// Pinhole intrinsic matrix for this camera.
    pub fn intrinsics(self) -> Matrix3<f32> {
        let f = self.focal();
        Matrix3::new(
            f, 0.0, CAM_FRAME_WIDTH / 2.0,
            0.0, f, CAM_FRAME_HEIGHT / 2.0,
            0.0, 0.0, 1.0,
        )
    }
}

// =============================================================================
// Calibration
// =============================================================================

/// Fixed axis permutation from device frame to camera view frame.
fn view_from_device() -> Matrix3<f32> {
    Matrix3::new(
        0.0, 1.0, 0.0,
        0.0, 0.0, 1.0,
        1.0, 0.0, 0.0,
    )
}

/// Rotation matrix from roll/pitch/yaw (intrinsic z-y-x composition).
fn euler_to_rot(roll: f32, pitch: f32, yaw: f32) -> Matrix3<f32> {
    let (sr, cr) = roll.sin_cos();
    let (sp, cp) = pitch.sin_cos();
    let (sy, cy) = yaw.sin_cos();
    let rx = Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, cr, -sr,
        0.0, sr, cr,
    );
    let ry = Matrix3::new(
        cp, 0.0, sp,
        0.0, 1.0, 0.0,
        -sp, 0.0, cp,
    );
    let rz = Matrix3::new(
        cy, -sy, 0.0,
        sy, cy, 0.0,
        0.0, 0.0, 1.0,
    );
    rz * ry * rx
}

/// Camera extrinsic calibration, replaced wholesale per calibration message
/// and read-only during projection.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Calibration {
    view_from_calib: Matrix3<f32>,
}

impl Calibration {
    /// Build from the calibration topic's roll/pitch/yaw.
    pub fn from_rpy(rpy: [f32; 3]) -> Self {
        Self {
            view_from_calib: view_from_device() * euler_to_rot(rpy[0], rpy[1], rpy[2]),
        }
    }

    #[inline]
    pub fn rotate(&self, pt: Vector3<f32>) -> Vector3<f32> {
        self.view_from_calib * pt
    }
}

impl Default for Calibration {
    /// Zero-rotation calibration. Overlays stay hidden until the first real
    /// calibration message arrives, so this value is never drawn from.
    fn default() -> Self {
        Self { view_from_calib: view_from_device() }
    }
}

// =============================================================================
// View Transform
// =============================================================================

/// Affine pan/scale mapping camera pixel coordinates to display pixels.
///
/// Rebuilt on every onroad transition since the wide-camera toggle (and with
/// it the intrinsic principal point) may have changed while offroad.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ViewTransform {
    zoom: f32,
    center_x: f32,
    center_y: f32,
    fb_w: f32,
    fb_h: f32,
}

impl ViewTransform {
    pub fn new(camera: CameraKind, fb_w: f32, fb_h: f32) -> Self {
        let mut zoom = VIEW_ZOOM / camera.focal();
        if camera == CameraKind::Wide {
            zoom *= 0.5;
        }
        let intrinsics = camera.intrinsics();
        Self {
            zoom,
            center_x: intrinsics[(0, 2)],
            center_y: intrinsics[(1, 2)],
            fb_w,
            fb_h,
        }
    }

    /// Map a camera-pixel coordinate to a display-pixel coordinate.
    #[inline]
    pub fn apply(&self, x: f32, y: f32) -> ScreenPoint {
        ScreenPoint::new(
            (x - self.center_x) * self.zoom + self.fb_w / 2.0,
            (y - self.center_y) * self.zoom + self.fb_h / 2.0 + ROAD_VIEW_Y_OFFSET,
        )
    }

    /// Whether a display point lies within the framebuffer plus clip margin.
    #[inline]
    pub fn on_screen(&self, p: &ScreenPoint) -> bool {
        p.x >= -CLIP_MARGIN
            && p.x <= self.fb_w + CLIP_MARGIN
            && p.y >= -CLIP_MARGIN
            && p.y <= self.fb_h + CLIP_MARGIN
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new(CameraKind::Road, FB_WIDTH, FB_HEIGHT)
    }
}

// =============================================================================
// Projection
// =============================================================================

/// Project a point in calibrated vehicle space to display pixel space.
///
/// Returns `None` when the depth after rotation is non-positive (degenerate
/// geometry, the vertex is silently dropped) or when the result falls
/// outside the viewport plus margin.
pub fn car_space_to_screen(
    pt: Vector3<f32>,
    calib: &Calibration,
    camera: CameraKind,
    view: &ViewTransform,
) -> Option<ScreenPoint> {
    let ep = calib.rotate(pt);
    let kep = camera.intrinsics() * ep;
    if kep.z <= MIN_DEPTH {
        return None;
    }
    let p = view.apply(kep.x / kep.z, kep.y / kep.z);
    view.on_screen(&p).then_some(p)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn level_calib() -> Calibration {
        Calibration::from_rpy([0.0, 0.0, 0.0])
    }

    #[test]
    fn test_projection_is_deterministic() {
        let calib = Calibration::from_rpy([0.01, -0.02, 0.005]);
        let view = ViewTransform::default();
        let pt = Vector3::new(40.0, -1.5, 0.8);
        let a = car_space_to_screen(pt, &calib, CameraKind::Road, &view).unwrap();
        let b = car_space_to_screen(pt, &calib, CameraKind::Road, &view).unwrap();
        // Bit-identical, not merely close.
        assert_eq!(a.x.to_bits(), b.x.to_bits());
        assert_eq!(a.y.to_bits(), b.y.to_bits());
    }

    #[test]
    fn test_point_ahead_projects_near_center() {
        let view = ViewTransform::default();
        // Far ahead, on the camera axis.
        let p = car_space_to_screen(
            Vector3::new(100.0, 0.0, 0.0),
            &level_calib(),
            CameraKind::Road,
            &view,
        )
        .unwrap();
        assert!((p.x - FB_WIDTH / 2.0).abs() < 1.0);
        assert!((p.y - (FB_HEIGHT / 2.0 + ROAD_VIEW_Y_OFFSET)).abs() < 1.0);
    }

    #[test]
    fn test_left_of_car_lands_left_of_center() {
        let view = ViewTransform::default();
        let p = car_space_to_screen(
            Vector3::new(20.0, -1.8, 0.0),
            &level_calib(),
            CameraKind::Road,
            &view,
        )
        .unwrap();
        assert!(p.x < FB_WIDTH / 2.0);
    }

    #[test]
    fn test_degenerate_depth_is_dropped() {
        let view = ViewTransform::default();
        // Zero-rotation view frame maps vehicle x to depth; a point at or
        // behind the camera plane must not produce a vertex.
        assert!(
            car_space_to_screen(
                Vector3::new(0.0, 0.5, 0.2),
                &level_calib(),
                CameraKind::Road,
                &view
            )
            .is_none()
        );
        assert!(
            car_space_to_screen(
                Vector3::new(-5.0, 0.5, 0.2),
                &level_calib(),
                CameraKind::Road,
                &view
            )
            .is_none()
        );
    }

    #[test]
    fn test_far_off_axis_point_is_clipped() {
        let view = ViewTransform::default();
        // Positive depth, but way outside the viewport plus margin.
        let clipped = car_space_to_screen(
            Vector3::new(1.0, 500.0, 0.0),
            &level_calib(),
            CameraKind::Road,
            &view,
        );
        assert!(clipped.is_none());
    }

    #[test]
    fn test_wide_camera_halves_the_zoom() {
        let road = ViewTransform::new(CameraKind::Road, FB_WIDTH, FB_HEIGHT);
        let wide = ViewTransform::new(CameraKind::Wide, FB_WIDTH, FB_HEIGHT);
        assert!((road.zoom - VIEW_ZOOM / ROAD_CAM_FOCAL).abs() < 1e-6);
        assert!((wide.zoom - 0.5 * VIEW_ZOOM / WIDE_CAM_FOCAL).abs() < 1e-6);
    }

    #[test]
    fn test_on_screen_margin() {
        let view = ViewTransform::default();
        assert!(view.on_screen(&ScreenPoint::new(-CLIP_MARGIN, 0.0)));
        assert!(view.on_screen(&ScreenPoint::new(FB_WIDTH + CLIP_MARGIN, FB_HEIGHT)));
        assert!(!view.on_screen(&ScreenPoint::new(-CLIP_MARGIN - 1.0, 0.0)));
        assert!(!view.on_screen(&ScreenPoint::new(0.0, FB_HEIGHT + CLIP_MARGIN + 1.0)));
    }

    #[test]
    fn test_pitch_moves_horizon_vertically() {
        let view = ViewTransform::default();
        let level = car_space_to_screen(
            Vector3::new(50.0, 0.0, 0.0),
            &level_calib(),
            CameraKind::Road,
            &view,
        )
        .unwrap();
        let pitched = car_space_to_screen(
            Vector3::new(50.0, 0.0, 0.0),
            &Calibration::from_rpy([0.0, 0.05, 0.0]),
            CameraKind::Road,
            &view,
        )
        .unwrap();
        assert!((pitched.y - level.y).abs() > 1.0);
    }
}
