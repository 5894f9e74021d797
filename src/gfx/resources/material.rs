//! Material system
//!
//! Provides surface material definitions and centralized storage. Materials are
//! stored in a [`MaterialManager`] and mesh surfaces reference them by ID, so
//! changing a material (for example the emissive glow of a lamp bulb) is
//! visible on every surface that uses it on the next frame.

use std::collections::HashMap;

use super::color::Color;

/// Material ID for referencing materials
pub type MaterialId = String;

/// GPU uniform data for one drawn surface
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    /// Emissive colour premultiplied by emissive intensity
    pub emissive: [f32; 3],
    pub roughness: f32,
}

/// Material definition
///
/// Carries the surface colour plus an emissive term. The emissive intensity is
/// kept separate from the emissive colour so the colour can be swapped without
/// losing the brightness and vice versa.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: Color,
    pub emissive_intensity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            base_color: [0.8, 0.8, 0.8, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            emissive: Color::BLACK,
            emissive_intensity: 1.0,
        }
    }
}

impl Material {
    /// Creates a new material
    ///
    /// # Arguments
    /// * `name` - Unique name for this material
    /// * `base_color` - RGBA base color
    /// * `metallic` - Metallic factor (0.0 = dielectric, 1.0 = metallic)
    /// * `roughness` - Surface roughness (0.0 = mirror, 1.0 = rough)
    pub fn new(name: &str, base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            metallic: metallic.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// Builder pattern: Set emissive color
    pub fn with_emission(mut self, emissive: Color, intensity: f32) -> Self {
        self.emissive = emissive;
        self.emissive_intensity = intensity;
        self
    }

    pub fn set_emission(&mut self, emissive: Color, intensity: f32) {
        self.emissive = emissive;
        self.emissive_intensity = intensity;
    }

    pub fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            base_color: self.base_color,
            emissive: self.emissive.scaled(self.emissive_intensity),
            roughness: self.roughness,
        }
    }
}

/// Centralized material storage
pub struct MaterialManager {
    materials: HashMap<MaterialId, Material>,
    default_material: Material,
}

impl MaterialManager {
    pub fn new() -> Self {
        Self {
            materials: HashMap::new(),
            default_material: Material::default(),
        }
    }

    /// Adds a material, replacing any previous material with the same name
    pub fn add_material(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    pub fn get_material(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn get_material_mut(&mut self, id: &str) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    /// Returns the referenced material or the default one when missing
    pub fn get_material_for_object(&self, id: Option<&str>) -> &Material {
        id.and_then(|id| self.materials.get(id))
            .unwrap_or(&self.default_material)
    }

    pub fn list_materials(&self) -> Vec<&String> {
        self.materials.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_material_falls_back_to_default() {
        let manager = MaterialManager::new();
        assert_eq!(manager.get_material_for_object(Some("nope")).name, "Default");
        assert_eq!(manager.get_material_for_object(None).name, "Default");
    }

    #[test]
    fn test_uniform_premultiplies_emission() {
        let material = Material::new("bulb", [1.0; 4], 0.0, 0.5)
            .with_emission(Color::rgb(1.0, 0.5, 0.0), 4.0);
        assert_eq!(material.uniform().emissive, [4.0, 2.0, 0.0]);
    }

    #[test]
    fn test_new_clamps_factors() {
        let material = Material::new("m", [1.0; 4], 2.0, -1.0);
        assert_eq!(material.metallic, 1.0);
        assert_eq!(material.roughness, 0.0);
    }
}
