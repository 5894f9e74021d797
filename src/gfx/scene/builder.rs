//! Initial scene construction
//!
//! The scene starts in the "off" lighting theme: white background, bright
//! white ambient light and two warm point lights, one of them casting shadows.

use cgmath::Vector3;

use super::{
    light::{Light, ShadowSettings},
    node::{NodeRole, SceneNode},
    scene::Scene,
};
use crate::gfx::resources::Color;

/// Warm point-light colour of the "off" theme
pub const WARM_AMBER: u32 = 0xf7e3c1;

/// Name given to the shadow-casting point light
pub const SHADOW_LIGHT_NAME: &str = "shadowLight";

/// Shadow blur radius before the first theme toggle
pub const INITIAL_SHADOW_RADIUS: f32 = 8.0;

/// Builds the scene every session starts from
///
/// Holds lights only; models are inserted later by the loader.
pub fn build_scene() -> Scene {
    let mut scene = Scene::new();
    scene.background = Color::from_hex(0xffffff);

    scene.add(SceneNode::light(
        "ambientLight",
        Light::ambient(Color::from_hex(0xffffff), 1.3),
    ));

    scene.add(
        SceneNode::light("pointLight", Light::point(Color::from_hex(WARM_AMBER), 2.0))
            .with_position(Vector3::new(-0.6, 0.2, 0.8)),
    );

    let shadow_light = Light::point(Color::from_hex(WARM_AMBER), 2.0).with_shadow(ShadowSettings {
        radius: INITIAL_SHADOW_RADIUS,
        ..Default::default()
    });
    scene.add(
        SceneNode::light(SHADOW_LIGHT_NAME, shadow_light)
            .with_role(NodeRole::ShadowLight)
            .with_position(Vector3::new(0.5, 0.6, -0.4)),
    );

    scene
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_has_three_lights_and_nothing_else() {
        let scene = build_scene();
        assert_eq!(scene.nodes.len(), 3);
        assert_eq!(scene.lights().count(), 3);
        assert_eq!(scene.background, Color::WHITE);
    }

    #[test]
    fn test_single_shadow_light() {
        let scene = build_scene();
        let shadow_casters: Vec<&SceneNode> = scene
            .lights()
            .filter(|node| node.as_light().and_then(|l| l.shadow()).is_some())
            .collect();
        assert_eq!(shadow_casters.len(), 1);
        assert_eq!(shadow_casters[0].role, NodeRole::ShadowLight);
        assert_eq!(shadow_casters[0].name, SHADOW_LIGHT_NAME);
        assert_eq!(
            shadow_casters[0].as_light().unwrap().shadow().unwrap().radius,
            INITIAL_SHADOW_RADIUS
        );
    }

    #[test]
    fn test_ambient_starts_bright() {
        let scene = build_scene();
        let ambient = scene
            .lights()
            .filter_map(SceneNode::as_light)
            .find(|light| light.is_ambient())
            .unwrap();
        assert_eq!(ambient.intensity, 1.3);
        assert_eq!(ambient.color, Color::WHITE);
    }
}
