//! Scene graph nodes
//!
//! A [`SceneNode`] owns its children exclusively. Every node carries a
//! [`NodeRole`] tag assigned when the node is built (by the scene builder for
//! lights, by the asset loader for models and meshes); interaction code
//! dispatches on that tag and never inspects node names.

use cgmath::{Euler, Matrix4, Quaternion, Rad, SquareMatrix, Vector3, Zero};

use super::{light::Light, mesh::Mesh};
use crate::gfx::{picking::AABB, resources::MaterialId};

/// Local transform relative to the parent node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Euler<Rad<f32>>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::zero(),
            rotation: Euler::new(Rad(0.0), Rad(0.0), Rad(0.0)),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_translation(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Builds a transform from glTF-style translation, `[x, y, z, w]` quaternion and scale
    pub fn from_trs(translation: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        let quat = Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]);
        Self {
            position: translation.into(),
            rotation: Euler::from(quat),
            scale: scale.into(),
        }
    }

    /// Local matrix, composed as T * R * S
    pub fn matrix(&self) -> Matrix4<f32> {
        let t = Matrix4::from_translation(self.position);
        let r = Matrix4::from(Quaternion::from(self.rotation));
        let s = Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);
        t * r * s
    }
}

/// Behavioural tag of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    #[default]
    Plain,
    /// Wrapper created around every loaded model
    Pivot,
    /// Model that spins continuously
    Rotating,
    /// Clickable lamp part
    Lamp,
    /// Lamp part whose material glows; also clickable
    LampBulb,
    /// Mesh receiving shadows instead of casting them
    Ground,
    /// The point light whose shadow follows the lighting theme
    ShadowLight,
}

impl NodeRole {
    /// Tag for a model root, derived once from its asset name
    pub fn for_model(name: &str) -> Self {
        if contains_ignore_case(name, "vapeur") {
            NodeRole::Rotating
        } else {
            NodeRole::Plain
        }
    }

    /// Tag for a mesh node, derived once from its authored name
    pub fn for_mesh(name: &str) -> Self {
        if contains_ignore_case(name, "lampe_2") {
            NodeRole::LampBulb
        } else if contains_ignore_case(name, "lampe") {
            NodeRole::Lamp
        } else if contains_ignore_case(name, "sol") {
            NodeRole::Ground
        } else {
            NodeRole::Plain
        }
    }

    pub fn is_lamp(self) -> bool {
        matches!(self, NodeRole::Lamp | NodeRole::LampBulb)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// One drawable part of a mesh node
pub struct Surface {
    pub mesh: Mesh,
    pub material: Option<MaterialId>,
}

pub struct MeshNode {
    pub surfaces: Vec<Surface>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl MeshNode {
    pub fn new(surfaces: Vec<Surface>) -> Self {
        Self {
            surfaces,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

/// Metadata attached to the root node of a loaded asset
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Manifest path the asset was loaded from
    pub source: String,
    pub is_letter: bool,
}

pub enum NodeKind {
    Group,
    Model(ModelInfo),
    Mesh(MeshNode),
    Light(Light),
}

pub struct SceneNode {
    pub name: String,
    pub role: NodeRole,
    pub transform: Transform,
    pub kind: NodeKind,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            role: NodeRole::Plain,
            transform: Transform::default(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn light(name: impl Into<String>, light: Light) -> Self {
        Self::new(name, NodeKind::Light(light))
    }

    pub fn with_role(mut self, role: NodeRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    pub fn as_light(&self) -> Option<&Light> {
        match &self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn as_light_mut(&mut self) -> Option<&mut Light> {
        match &mut self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn as_mesh(&self) -> Option<&MeshNode> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut MeshNode> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn model_info(&self) -> Option<&ModelInfo> {
        match &self.kind {
            NodeKind::Model(info) => Some(info),
            _ => None,
        }
    }

    /// Material ids referenced by this node's surfaces
    pub fn material_ids(&self) -> impl Iterator<Item = &str> {
        self.as_mesh()
            .into_iter()
            .flat_map(|mesh| mesh.surfaces.iter())
            .filter_map(|surface| surface.material.as_deref())
    }

    /// Walks this subtree depth-first, handing every node its world matrix and path
    ///
    /// `parent_world` is the world matrix of this node's parent and `path` the
    /// index path of this node from the scene root.
    pub fn visit<'a, F>(&'a self, parent_world: Matrix4<f32>, path: &mut Vec<usize>, f: &mut F)
    where
        F: FnMut(&'a SceneNode, &Matrix4<f32>, &[usize]),
    {
        let world = parent_world * self.transform.matrix();
        f(self, &world, path);
        for (index, child) in self.children.iter().enumerate() {
            path.push(index);
            child.visit(world, path, f);
            path.pop();
        }
    }

    /// Applies `f` to this node and every descendant
    pub fn traverse_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut SceneNode),
    {
        f(self);
        for child in &mut self.children {
            child.traverse_mut(f);
        }
    }

    /// Bounding box of every mesh in the subtree, expressed in the parent's space
    ///
    /// Returns `None` when the subtree holds no geometry.
    pub fn bounds_in_parent(&self) -> Option<AABB> {
        let mut bounds: Option<AABB> = None;
        let mut path = Vec::new();
        self.visit(Matrix4::identity(), &mut path, &mut |node, world, _| {
            if let Some(mesh) = node.as_mesh() {
                for surface in &mesh.surfaces {
                    if surface.mesh.vertices().is_empty() {
                        continue;
                    }
                    let world_box = surface.mesh.bounds().transform(world);
                    bounds = Some(match bounds {
                        Some(existing) => existing.union(&world_box),
                        None => world_box,
                    });
                }
            }
        });
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Transform as _, Point3};

    fn triangle_mesh(offset: f32) -> Mesh {
        Mesh::new(
            vec![
                offset, 0.0, 0.0, //
                offset + 1.0, 0.0, 0.0, //
                offset, 2.0, 0.0,
            ],
            Vec::new(),
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_roles_come_from_names() {
        assert_eq!(NodeRole::for_mesh("lampe_base"), NodeRole::Lamp);
        assert_eq!(NodeRole::for_mesh("Lampe_2_bulb"), NodeRole::LampBulb);
        assert_eq!(NodeRole::for_mesh("SOL_bois"), NodeRole::Ground);
        assert_eq!(NodeRole::for_mesh("table"), NodeRole::Plain);
        assert_eq!(NodeRole::for_model("vapeur_stack"), NodeRole::Rotating);
        assert!(NodeRole::LampBulb.is_lamp());
        assert!(!NodeRole::Ground.is_lamp());
    }

    #[test]
    fn test_matrix_applies_scale_then_rotation_then_translation() {
        let mut transform = Transform::from_translation(Vector3::new(1.0, 0.0, 0.0));
        transform.rotation.y = Rad(std::f32::consts::FRAC_PI_2);
        transform.scale = Vector3::new(2.0, 2.0, 2.0);
        let moved = transform.matrix().transform_point(Point3::new(1.0, 0.0, 0.0));
        assert!((moved.x - 1.0).abs() < 1e-5);
        assert!((moved.z + 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_visit_reports_paths() {
        let root = SceneNode::group("root")
            .with_child(SceneNode::group("a"))
            .with_child(SceneNode::group("b").with_child(SceneNode::group("c")));
        let mut seen = Vec::new();
        let mut path = Vec::new();
        root.visit(Matrix4::identity(), &mut path, &mut |node, _, path| {
            seen.push((node.name.clone(), path.to_vec()));
        });
        assert_eq!(
            seen,
            vec![
                ("root".to_string(), vec![]),
                ("a".to_string(), vec![0]),
                ("b".to_string(), vec![1]),
                ("c".to_string(), vec![1, 0]),
            ]
        );
    }

    #[test]
    fn test_bounds_include_child_transforms() {
        let mesh_node = |name: &str, offset: f32| {
            SceneNode::new(
                name,
                NodeKind::Mesh(MeshNode::new(vec![Surface {
                    mesh: triangle_mesh(offset),
                    material: None,
                }])),
            )
        };
        let model = SceneNode::group("model")
            .with_child(mesh_node("left", 0.0))
            .with_child(mesh_node("right", 0.0).with_position(Vector3::new(3.0, 0.0, 0.0)));

        let bounds = model.bounds_in_parent().unwrap();
        assert_eq!(bounds.min, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vector3::new(4.0, 2.0, 0.0));
        assert_eq!(bounds.center(), Vector3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn test_bounds_of_empty_group_is_none() {
        assert!(SceneNode::group("empty").bounds_in_parent().is_none());
    }
}
