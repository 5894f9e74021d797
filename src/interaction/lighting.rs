//! Day/night lighting theme and the lamp that switches it.
//!
//! Every decision in a toggle is taken from the flag as it was before the
//! click; the flag itself flips exactly once, last.

use crate::gfx::{
    resources::{Color, Material, MaterialId},
    scene::{LightKind, NodePath, NodeRole, Scene},
};

/// Cool light colour used while the lamp is the only warm source
pub const COOL_BLUE: u32 = 0xc1d5f7;
/// Warm light colour of the bright theme
pub const WARM_AMBER: u32 = crate::gfx::scene::builder::WARM_AMBER;
/// Near-black tint of the shadow light in the dark theme
pub const SHADOW_DARK: u32 = 0x252526;
/// Background of the dark theme
pub const NIGHT_BACKGROUND: u32 = 0x4e5257;
/// Background of the bright theme
pub const DAY_BACKGROUND: u32 = 0xffffff;

/// Whether the lamp is currently lit
///
/// Owned by the application and handed to the handlers by `&mut`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightingState {
    pub light_is_on: bool,
}

/// Switches lights and background to the other theme, then flips the flag
pub fn toggle_theme(scene: &mut Scene, state: &mut LightingState) {
    let on = state.light_is_on;

    for node in scene.lights_mut() {
        let shadow_light = node.role == NodeRole::ShadowLight;
        let Some(light) = node.as_light_mut() else {
            continue;
        };
        match light.kind {
            LightKind::Ambient => {
                light.intensity = if on { 0.1 } else { 1.3 };
                light.color = Color::from_hex(if on { COOL_BLUE } else { 0xffffff });
            }
            LightKind::Point { .. } => {
                light.intensity = if on { 0.1 } else { 2.0 };
                light.color = Color::from_hex(if on { COOL_BLUE } else { WARM_AMBER });
                if shadow_light {
                    if let Some(shadow) = light.shadow_mut() {
                        shadow.radius = if on { 20.0 } else { 10.0 };
                    }
                    light.color = Color::from_hex(if on { SHADOW_DARK } else { WARM_AMBER });
                }
            }
        }
    }

    scene.background = Color::from_hex(if on { NIGHT_BACKGROUND } else { DAY_BACKGROUND });
    state.light_is_on = !on;
    log::debug!("Lighting theme toggled, light_is_on = {}", state.light_is_on);
}

/// Sets the bulb glow for the pre-toggle flag `on`
///
/// A lit lamp is being switched off, so it dims to a faint ember; an unlit
/// one starts glowing orange.
pub fn update_bulb_material(material: &mut Material, on: bool) {
    if on {
        material.set_emission(Color::rgb(0.1, 0.05, 0.0), 1.0);
    } else {
        material.set_emission(Color::rgb(1.0, 0.573, 0.0), 17.0);
    }
}

/// Reacts to a click that hit the node at `hit`
///
/// Lamp parts update the bulb materials among their siblings and toggle the
/// theme; anything else is ignored. Returns whether the theme changed.
pub fn handle_lamp_click(hit: &NodePath, scene: &mut Scene, state: &mut LightingState) -> bool {
    let is_lamp = scene.node(hit).is_some_and(|node| node.role.is_lamp());
    if !is_lamp {
        return false;
    }

    let mut bulb_materials: Vec<MaterialId> = Vec::new();
    if let Some(siblings) = scene.siblings_mut(hit) {
        for sibling in siblings.iter().filter(|n| n.role == NodeRole::LampBulb) {
            for id in sibling.material_ids() {
                if !bulb_materials.iter().any(|known| known == id) {
                    bulb_materials.push(id.to_string());
                }
            }
        }
    }

    let on = state.light_is_on;
    for id in &bulb_materials {
        match scene.material_manager.get_material_mut(id) {
            Some(material) => update_bulb_material(material, on),
            None => log::warn!("Bulb material {} is not registered", id),
        }
    }

    toggle_theme(scene, state);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::{build_scene, Light, SceneNode, SHADOW_LIGHT_NAME};

    fn light<'a>(scene: &'a Scene, name: &str) -> &'a Light {
        scene
            .lights()
            .find(|node| node.name == name)
            .and_then(|node| node.as_light())
            .unwrap()
    }

    #[test]
    fn test_first_toggle_switches_lamp_on() {
        let mut scene = build_scene();
        let mut state = LightingState::default();

        toggle_theme(&mut scene, &mut state);

        assert!(state.light_is_on);
        assert_eq!(scene.background, Color::from_hex(0xffffff));
        assert_eq!(light(&scene, "ambientLight").intensity, 1.3);
        assert_eq!(light(&scene, "pointLight").color, Color::from_hex(WARM_AMBER));
        let shadow = light(&scene, SHADOW_LIGHT_NAME);
        assert_eq!(shadow.shadow().map(|s| s.radius), Some(10.0));
        assert_eq!(shadow.intensity, 2.0);
    }

    #[test]
    fn test_second_toggle_dims_everything() {
        let mut scene = build_scene();
        let mut state = LightingState::default();

        toggle_theme(&mut scene, &mut state);
        toggle_theme(&mut scene, &mut state);

        assert!(!state.light_is_on);
        assert_eq!(scene.background, Color::from_hex(NIGHT_BACKGROUND));
        let ambient = light(&scene, "ambientLight");
        assert_eq!((ambient.intensity, ambient.color), (0.1, Color::from_hex(COOL_BLUE)));
        assert_eq!(light(&scene, "pointLight").color, Color::from_hex(COOL_BLUE));
        let shadow = light(&scene, SHADOW_LIGHT_NAME);
        assert_eq!(shadow.color, Color::from_hex(SHADOW_DARK));
        assert_eq!(shadow.shadow().map(|s| s.radius), Some(20.0));
    }

    #[test]
    fn test_two_toggles_restore_state() {
        let mut scene = build_scene();
        let mut state = LightingState::default();
        toggle_theme(&mut scene, &mut state);

        let snapshot: Vec<Light> = scene.lights().filter_map(|n| n.as_light().copied()).collect();
        let background = scene.background;

        toggle_theme(&mut scene, &mut state);
        toggle_theme(&mut scene, &mut state);

        let after: Vec<Light> = scene.lights().filter_map(|n| n.as_light().copied()).collect();
        assert_eq!(after, snapshot);
        assert_eq!(scene.background, background);
        assert!(state.light_is_on);
    }

    #[test]
    fn test_bulb_material_follows_pre_toggle_flag() {
        let mut material = Material::default();
        update_bulb_material(&mut material, false);
        assert_eq!(material.emissive, Color::rgb(1.0, 0.573, 0.0));
        assert_eq!(material.emissive_intensity, 17.0);

        update_bulb_material(&mut material, true);
        assert_eq!(material.emissive, Color::rgb(0.1, 0.05, 0.0));
        assert_eq!(material.emissive_intensity, 1.0);
    }

    #[test]
    fn test_click_on_non_lamp_is_ignored() {
        let mut scene = build_scene();
        scene.add(SceneNode::group("table_pivot").with_child(SceneNode::group("table")));
        let mut state = LightingState::default();

        let hit = NodePath::new(vec![3, 0]);
        assert!(!handle_lamp_click(&hit, &mut scene, &mut state));
        assert!(!state.light_is_on);
        assert!(!handle_lamp_click(&NodePath::new(vec![9]), &mut scene, &mut state));
    }
}
