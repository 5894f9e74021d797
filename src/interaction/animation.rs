//! Per-frame loop: render, then spin the rotating models.

use std::f32::consts::PI;

use cgmath::Rad;

use crate::gfx::{
    scene::{NodeRole, Scene},
    PerspectiveCamera, Renderer,
};

/// Fraction of π radians a rotating model turns per second
pub const ROTATION_SPEED: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
enum LoopState {
    Idle,
    Running { previous: Option<f64> },
}

/// Drives one render per frame and advances the spinning pivots
///
/// Starts idle; [`AnimationLoop::start`] moves it to running for good.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationLoop {
    state: LoopState,
}

impl Default for AnimationLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
        }
    }

    pub fn start(&mut self) {
        if self.state == LoopState::Idle {
            self.state = LoopState::Running { previous: None };
            log::debug!("Animation loop started");
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, LoopState::Running { .. })
    }

    /// Seconds since the previous tick
    ///
    /// The first tick after starting yields zero, and so does a timestamp
    /// earlier than the previous one.
    fn advance(&mut self, timestamp: f64) -> f32 {
        match &mut self.state {
            LoopState::Idle => 0.0,
            LoopState::Running { previous } => {
                let delta = previous.map_or(0.0, |last| (timestamp - last).max(0.0));
                *previous = Some(timestamp);
                delta as f32
            }
        }
    }

    /// Runs one frame at `timestamp` seconds
    ///
    /// Renders the scene, then rotates every rotating pivot by the elapsed
    /// time. Idle loops do nothing. The pivots advance even when the frame
    /// could not be presented; the render error is handed back afterwards.
    pub fn tick<R: Renderer + ?Sized>(
        &mut self,
        timestamp: f64,
        scene: &mut Scene,
        camera: &PerspectiveCamera,
        renderer: &mut R,
    ) -> Result<f32, wgpu::SurfaceError> {
        if !self.is_running() {
            return Ok(0.0);
        }

        let delta = self.advance(timestamp);
        let rendered = renderer.render(scene, camera);
        rotate_pivots(scene, delta);
        rendered.map(|()| delta)
    }
}

/// Turns every top-level pivot whose model is tagged [`NodeRole::Rotating`]
pub fn rotate_pivots(scene: &mut Scene, delta: f32) {
    if delta == 0.0 {
        return;
    }
    let step = Rad(PI * delta * ROTATION_SPEED);
    for pivot in &mut scene.nodes {
        let rotating = pivot
            .children
            .first()
            .is_some_and(|model| model.role == NodeRole::Rotating);
        if rotating {
            pivot.transform.rotation.y = pivot.transform.rotation.y + step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{build_camera, scene::SceneNode, Viewport};

    #[derive(Default)]
    struct CountingRenderer {
        frames: usize,
        fail: bool,
    }

    impl Renderer for CountingRenderer {
        fn render(
            &mut self,
            _scene: &mut Scene,
            _camera: &PerspectiveCamera,
        ) -> Result<(), wgpu::SurfaceError> {
            self.frames += 1;
            if self.fail {
                Err(wgpu::SurfaceError::Outdated)
            } else {
                Ok(())
            }
        }

        fn resize(&mut self, _viewport: Viewport) {}
    }

    fn scene_with(model_role: NodeRole) -> Scene {
        let mut scene = Scene::new();
        scene.add(
            SceneNode::group("pivot")
                .with_role(NodeRole::Pivot)
                .with_child(SceneNode::group("model").with_role(model_role)),
        );
        scene
    }

    fn yaw(scene: &Scene) -> f32 {
        scene.nodes[0].transform.rotation.y.0
    }

    #[test]
    fn test_idle_loop_does_not_render() {
        let mut scene = scene_with(NodeRole::Rotating);
        let camera = build_camera(&Viewport::new(800, 600, 1.0));
        let mut renderer = CountingRenderer::default();
        let mut animation = AnimationLoop::new();

        assert_eq!(animation.tick(1.0, &mut scene, &camera, &mut renderer), Ok(0.0));
        assert_eq!(renderer.frames, 0);
        assert!(!animation.is_running());
    }

    #[test]
    fn test_first_tick_contributes_nothing() {
        let mut scene = scene_with(NodeRole::Rotating);
        let camera = build_camera(&Viewport::new(800, 600, 1.0));
        let mut renderer = CountingRenderer::default();
        let mut animation = AnimationLoop::new();
        animation.start();

        assert_eq!(animation.tick(12.5, &mut scene, &camera, &mut renderer), Ok(0.0));
        assert_eq!(renderer.frames, 1);
        assert_eq!(yaw(&scene), 0.0);
    }

    #[test]
    fn test_full_turn_in_four_seconds() {
        let camera = build_camera(&Viewport::new(800, 600, 1.0));
        for steps in [1usize, 4, 240] {
            let mut scene = scene_with(NodeRole::Rotating);
            let mut renderer = CountingRenderer::default();
            let mut animation = AnimationLoop::new();
            animation.start();

            animation.tick(0.0, &mut scene, &camera, &mut renderer).unwrap();
            for i in 1..=steps {
                let t = 4.0 * i as f64 / steps as f64;
                animation.tick(t, &mut scene, &camera, &mut renderer).unwrap();
            }
            assert!((yaw(&scene) - 2.0 * PI).abs() < 1e-3, "{steps} steps");
        }
    }

    #[test]
    fn test_backwards_timestamp_is_clamped() {
        let mut scene = scene_with(NodeRole::Rotating);
        let camera = build_camera(&Viewport::new(800, 600, 1.0));
        let mut renderer = CountingRenderer::default();
        let mut animation = AnimationLoop::new();
        animation.start();

        animation.tick(5.0, &mut scene, &camera, &mut renderer).unwrap();
        assert_eq!(animation.tick(3.0, &mut scene, &camera, &mut renderer), Ok(0.0));
        assert_eq!(yaw(&scene), 0.0);
    }

    #[test]
    fn test_only_rotating_models_turn() {
        let mut scene = scene_with(NodeRole::Plain);
        rotate_pivots(&mut scene, 1.0);
        assert_eq!(yaw(&scene), 0.0);

        let mut scene = scene_with(NodeRole::Rotating);
        rotate_pivots(&mut scene, 1.0);
        assert!((yaw(&scene) - PI * 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_render_failure_still_advances() {
        let mut scene = scene_with(NodeRole::Rotating);
        let camera = build_camera(&Viewport::new(800, 600, 1.0));
        let mut renderer = CountingRenderer {
            fail: true,
            ..Default::default()
        };
        let mut animation = AnimationLoop::new();
        animation.start();

        assert!(animation.tick(0.0, &mut scene, &camera, &mut renderer).is_err());
        assert!(animation.tick(1.0, &mut scene, &camera, &mut renderer).is_err());
        assert!((yaw(&scene) - PI * 0.5).abs() < 1e-6);
    }
}
