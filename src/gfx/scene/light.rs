//! Light sources living in the scene graph.

use crate::gfx::resources::Color;

/// Shadow parameters of a shadow-casting point light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    /// Blur radius applied when filtering the shadow map
    pub radius: f32,
    /// Shadow map resolution in texels per side
    pub map_size: u32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            radius: 1.0,
            map_size: 512,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Uniform light reaching every surface
    Ambient,
    /// Omnidirectional light at the node position
    Point { shadow: Option<ShadowSettings> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
}

impl Light {
    pub fn ambient(color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            color,
            intensity,
        }
    }

    pub fn point(color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Point { shadow: None },
            color,
            intensity,
        }
    }

    /// Enables shadow casting on a point light; no-op on ambient lights
    pub fn with_shadow(mut self, shadow: ShadowSettings) -> Self {
        if let LightKind::Point { shadow: slot } = &mut self.kind {
            *slot = Some(shadow);
        }
        self
    }

    pub fn is_ambient(&self) -> bool {
        matches!(self.kind, LightKind::Ambient)
    }

    pub fn shadow(&self) -> Option<&ShadowSettings> {
        match &self.kind {
            LightKind::Point { shadow } => shadow.as_ref(),
            LightKind::Ambient => None,
        }
    }

    pub fn shadow_mut(&mut self) -> Option<&mut ShadowSettings> {
        match &mut self.kind {
            LightKind::Point { shadow } => shadow.as_mut(),
            LightKind::Ambient => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambient_ignores_shadow() {
        let light = Light::ambient(Color::WHITE, 1.0).with_shadow(ShadowSettings::default());
        assert!(light.shadow().is_none());
    }

    #[test]
    fn test_point_keeps_shadow() {
        let light = Light::point(Color::WHITE, 2.0).with_shadow(ShadowSettings {
            radius: 8.0,
            ..Default::default()
        });
        assert_eq!(light.shadow().map(|s| s.radius), Some(8.0));
    }
}
