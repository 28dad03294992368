//! Screen-space point picking

use crate::surface::PointPickEvent;
use nalgebra::{Matrix4, Point2, Point3};
use rayon::prelude::*;

/// Default pick radius in pixels
pub const DEFAULT_PICK_RADIUS: f32 = 8.0;

/// Project `point` to window pixel coordinates (origin top left) and
/// normalized depth. Points behind the eye project to `None`.
pub fn project_to_screen(
    view_proj: &Matrix4<f32>,
    point: &Point3<f32>,
    width: f32,
    height: f32,
) -> Option<(Point2<f32>, f32)> {
    let clip = view_proj * point.to_homogeneous();
    if clip.w <= f32::EPSILON {
        return None;
    }
    let ndc = clip.xyz() / clip.w;
    if !(0.0..=1.0).contains(&ndc.z) {
        return None;
    }
    let x = (ndc.x + 1.0) * 0.5 * width;
    let y = (1.0 - ndc.y) * 0.5 * height;
    Some((Point2::new(x, y), ndc.z))
}

/// Find the point whose projection lies closest to `cursor`, within
/// `radius` pixels. Equal screen distances go to the point nearer the eye.
pub fn pick_point(
    points: &[Point3<f32>],
    view_proj: &Matrix4<f32>,
    viewport: (u32, u32),
    cursor: Point2<f32>,
    radius: f32,
) -> Option<PointPickEvent> {
    let (width, height) = (viewport.0 as f32, viewport.1 as f32);
    let radius_sq = radius * radius;

    points
        .par_iter()
        .enumerate()
        .filter_map(|(index, point)| {
            let (screen, depth) = project_to_screen(view_proj, point, width, height)?;
            let dist_sq = (screen - cursor).norm_squared();
            (dist_sq <= radius_sq).then_some((index, dist_sq, depth))
        })
        .min_by(|a, b| {
            a.1.total_cmp(&b.1)
                .then(a.2.total_cmp(&b.2))
                .then(a.0.cmp(&b.0))
        })
        .map(|(index, _, _)| PointPickEvent {
            index,
            point: points[index],
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;

    fn camera() -> Camera {
        let mut camera = Camera::default();
        camera.aspect_ratio = 1.0;
        camera
    }

    #[test]
    fn test_target_projects_to_center() {
        let cam = camera();
        let (screen, depth) =
            project_to_screen(&cam.view_projection(), &cam.target, 200.0, 200.0).unwrap();
        assert!((screen.x - 100.0).abs() < 1e-3);
        assert!((screen.y - 100.0).abs() < 1e-3);
        assert!(depth > 0.0 && depth < 1.0);
    }

    #[test]
    fn test_point_behind_camera_is_skipped() {
        let cam = camera();
        let behind = Point3::new(0.0, 0.0, 10.0);
        assert!(project_to_screen(&cam.view_projection(), &behind, 200.0, 200.0).is_none());
    }

    #[test]
    fn test_pick_nearest_to_cursor() {
        let cam = camera();
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 1.0, 0.0),
        ];
        let view_proj = cam.view_projection();
        let (screen, _) = project_to_screen(&view_proj, &points[1], 400.0, 400.0).unwrap();

        let cursor = Point2::new(screen.x + 2.0, screen.y - 1.0);
        let picked = pick_point(&points, &view_proj, (400, 400), cursor, DEFAULT_PICK_RADIUS).unwrap();
        assert_eq!(picked.index, 1);
        assert_eq!(picked.point, points[1]);
    }

    #[test]
    fn test_pick_outside_radius() {
        let cam = camera();
        let points = vec![Point3::new(0.0, 0.0, 0.0)];
        let picked = pick_point(
            &points,
            &cam.view_projection(),
            (400, 400),
            Point2::new(10.0, 10.0),
            DEFAULT_PICK_RADIUS,
        );
        assert!(picked.is_none());
    }

    #[test]
    fn test_pick_tie_prefers_front_point() {
        let cam = camera();
        // Both on the view axis, so both land on the window center
        let points = vec![Point3::new(0.0, 0.0, -2.0), Point3::new(0.0, 0.0, 1.0)];
        let picked = pick_point(
            &points,
            &cam.view_projection(),
            (400, 400),
            Point2::new(200.0, 200.0),
            DEFAULT_PICK_RADIUS,
        )
        .unwrap();
        assert_eq!(picked.index, 1);
    }
}
