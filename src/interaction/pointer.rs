//! Pointer and resize handling: hover steers the camera, click picks.

use cgmath::{InnerSpace, Vector3};
use winit::dpi::PhysicalPosition;

use super::lighting::{handle_lamp_click, LightingState};
use crate::gfx::{
    picking::{Intersection, Ray, Raycaster},
    scene::Scene,
    PerspectiveCamera, Renderer, Viewport,
};

/// How far the camera target follows the pointer, in world units per NDC unit
pub const HOVER_GAIN: f32 = 0.1;

/// Depth used when unprojecting a click into a ray direction
const CLICK_DEPTH: f32 = 0.5;

/// Placement of the drawing area in window coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl CanvasBounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Bounds covering a whole window surface
    pub fn from_viewport(viewport: &Viewport) -> Self {
        Self::new(0.0, 0.0, viewport.width as f64, viewport.height as f64)
    }

    /// Maps a window position to normalized device coordinates, Y up
    ///
    /// Positions outside the canvas map outside `[-1, 1]`. Returns `None`
    /// while the canvas has no area.
    pub fn normalize(&self, position: PhysicalPosition<f64>) -> Option<(f32, f32)> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        let x = ((position.x - self.left) / self.width) * 2.0 - 1.0;
        let y = -((position.y - self.top) / self.height) * 2.0 + 1.0;
        Some((x as f32, y as f32))
    }
}

/// Aims the camera slightly towards the pointer
pub fn on_pointer_move(
    position: PhysicalPosition<f64>,
    bounds: &CanvasBounds,
    camera: &mut PerspectiveCamera,
) {
    if let Some((x, y)) = bounds.normalize(position) {
        camera.look_at(Vector3::new(x * HOVER_GAIN, y * HOVER_GAIN, 0.0));
    }
}

/// Ray from the camera through a point in normalized device coordinates
pub fn pointer_ray(camera: &PerspectiveCamera, x: f32, y: f32) -> Ray {
    let origin = camera.world_position();
    let through = camera.unproject(Vector3::new(x, y, CLICK_DEPTH));
    Ray::new(origin, (through - origin).normalize())
}

/// Nearest scene node under a point in normalized device coordinates
pub fn pick(scene: &Scene, camera: &PerspectiveCamera, x: f32, y: f32) -> Option<Intersection> {
    Raycaster::new(pointer_ray(camera, x, y))
        .intersect_scene(scene)
        .into_iter()
        .next()
}

/// Picks the node under the pointer and lets the lamp react to it
///
/// Returns whether the lighting theme changed. A click that hits nothing is
/// a no-op.
pub fn on_pointer_click(
    position: PhysicalPosition<f64>,
    bounds: &CanvasBounds,
    camera: &PerspectiveCamera,
    scene: &mut Scene,
    state: &mut LightingState,
) -> bool {
    let Some((x, y)) = bounds.normalize(position) else {
        return false;
    };
    let Some(hit) = pick(scene, camera, x, y) else {
        return false;
    };
    log::debug!("Click hit {:?} at distance {:.3}", hit.path, hit.distance);
    handle_lamp_click(&hit.path, scene, state)
}

/// Keeps the camera projection and renderer surface in step with the window
pub fn on_resize<R: Renderer + ?Sized>(
    camera: &mut PerspectiveCamera,
    renderer: &mut R,
    viewport: Viewport,
) {
    camera.resize_projection(viewport.width, viewport.height);
    renderer.resize(viewport);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        build_camera,
        scene::{build_scene, Mesh, MeshNode, NodeKind, NodeRole, SceneNode, Surface},
    };

    fn bounds() -> CanvasBounds {
        CanvasBounds::new(10.0, 20.0, 200.0, 100.0)
    }

    fn camera() -> PerspectiveCamera {
        build_camera(&Viewport::new(200, 100, 1.0))
    }

    #[test]
    fn test_normalize_corners() {
        let b = bounds();
        assert_eq!(b.normalize(PhysicalPosition::new(10.0, 20.0)), Some((-1.0, 1.0)));
        assert_eq!(b.normalize(PhysicalPosition::new(210.0, 120.0)), Some((1.0, -1.0)));
        assert_eq!(b.normalize(PhysicalPosition::new(110.0, 70.0)), Some((0.0, 0.0)));
    }

    #[test]
    fn test_zero_sized_canvas_is_ignored() {
        let mut camera = camera();
        let empty = CanvasBounds::new(0.0, 0.0, 0.0, 100.0);
        on_pointer_move(PhysicalPosition::new(5.0, 5.0), &empty, &mut camera);
        assert_eq!(camera.target, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_hover_targets_scaled_pointer() {
        let mut camera = camera();
        on_pointer_move(PhysicalPosition::new(210.0, 20.0), &bounds(), &mut camera);
        assert!((camera.target - Vector3::new(0.1, 0.1, 0.0)).magnitude() < 1e-6);
        assert_eq!(camera.eye, Vector3::new(0.0, 0.0, 1.1));
    }

    #[test]
    fn test_center_ray_points_down_the_view_axis() {
        let ray = pointer_ray(&camera(), 0.0, 0.0);
        assert_eq!(ray.origin, Vector3::new(0.0, 0.0, 1.1));
        assert!(ray.direction.x.abs() < 1e-5);
        assert!(ray.direction.y.abs() < 1e-5);
        assert!((ray.direction.z + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_click_on_empty_space_changes_nothing() {
        let mut scene = build_scene();
        let mut state = LightingState::default();
        let changed = on_pointer_click(
            PhysicalPosition::new(110.0, 70.0),
            &bounds(),
            &camera(),
            &mut scene,
            &mut state,
        );
        assert!(!changed);
        assert!(!state.light_is_on);
    }

    #[test]
    fn test_click_on_lamp_toggles() {
        let quad = Mesh::new(
            vec![-0.5, -0.5, 0.0, 0.5, -0.5, 0.0, 0.5, 0.5, 0.0, -0.5, 0.5, 0.0],
            Vec::new(),
            vec![0, 1, 2, 0, 2, 3],
        );
        let lamp = SceneNode::new(
            "lampe_1",
            NodeKind::Mesh(MeshNode::new(vec![Surface {
                mesh: quad,
                material: None,
            }])),
        )
        .with_role(NodeRole::Lamp);

        let mut scene = build_scene();
        scene.add(SceneNode::group("lampe").with_child(lamp));
        let mut state = LightingState::default();

        let changed = on_pointer_click(
            PhysicalPosition::new(110.0, 70.0),
            &bounds(),
            &camera(),
            &mut scene,
            &mut state,
        );
        assert!(changed);
        assert!(state.light_is_on);
    }
}
