use cgmath::{Matrix4, SquareMatrix};
use wgpu::Device;

use super::node::{NodeKind, SceneNode};
use crate::gfx::resources::{Color, Material, MaterialManager};

/// Index path from the scene root down to a node
///
/// `[2, 0]` is the first child of the third top-level node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Path of the parent node; `None` for top-level nodes and the empty path
    pub fn parent(&self) -> Option<NodePath> {
        match self.0.len() {
            0 | 1 => None,
            len => Some(NodePath(self.0[..len - 1].to_vec())),
        }
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

/// Main scene containing the node tree, materials and background colour
pub struct Scene {
    pub background: Color,
    pub nodes: Vec<SceneNode>,
    pub material_manager: MaterialManager, // Centralized material storage
}

impl Scene {
    /// Creates an empty scene on a white background
    pub fn new() -> Self {
        Self {
            background: Color::WHITE,
            nodes: Vec::new(),
            material_manager: MaterialManager::new(),
        }
    }

    /// Appends a top-level node
    pub fn add(&mut self, node: SceneNode) {
        self.nodes.push(node);
    }

    pub fn add_materials(&mut self, materials: impl IntoIterator<Item = Material>) {
        for material in materials {
            self.material_manager.add_material(material);
        }
    }

    pub fn node(&self, path: &NodePath) -> Option<&SceneNode> {
        let (first, rest) = path.indices().split_first()?;
        let mut node = self.nodes.get(*first)?;
        for index in rest {
            node = node.children.get(*index)?;
        }
        Some(node)
    }

    pub fn node_mut(&mut self, path: &NodePath) -> Option<&mut SceneNode> {
        let (first, rest) = path.indices().split_first()?;
        let mut node = self.nodes.get_mut(*first)?;
        for index in rest {
            node = node.children.get_mut(*index)?;
        }
        Some(node)
    }

    /// The node at `path` together with its siblings, itself included
    ///
    /// Top-level nodes are siblings of each other.
    pub fn siblings_mut(&mut self, path: &NodePath) -> Option<&mut [SceneNode]> {
        match path.parent() {
            Some(parent) => self
                .node_mut(&parent)
                .map(|node| node.children.as_mut_slice()),
            None if path.depth() == 1 => Some(self.nodes.as_mut_slice()),
            None => None,
        }
    }

    /// Top-level light nodes
    pub fn lights_mut(&mut self) -> impl Iterator<Item = &mut SceneNode> {
        self.nodes
            .iter_mut()
            .filter(|node| matches!(node.kind, NodeKind::Light(_)))
    }

    pub fn lights(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes
            .iter()
            .filter(|node| matches!(node.kind, NodeKind::Light(_)))
    }

    /// Walks every node with its world matrix
    pub fn visit<'a, F>(&'a self, mut f: F)
    where
        F: FnMut(&'a SceneNode, &Matrix4<f32>, &[usize]),
    {
        let mut path = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            path.push(index);
            node.visit(Matrix4::identity(), &mut path, &mut f);
            path.pop();
        }
    }

    /// Uploads geometry of every mesh not yet on the GPU
    ///
    /// Cheap for meshes already uploaded, so it can run every frame and pick
    /// up pivots inserted since the last one.
    pub fn init_gpu_resources(&mut self, device: &Device) {
        for node in &mut self.nodes {
            node.traverse_mut(&mut |node| {
                if let Some(mesh) = node.as_mesh_mut() {
                    for surface in &mut mesh.surfaces {
                        surface.mesh.init_gpu_resources(device);
                    }
                }
            });
        }
    }

    /// Gets statistics about the scene
    pub fn get_statistics(&self) -> SceneStatistics {
        let mut stats = SceneStatistics {
            node_count: 0,
            light_count: 0,
            material_count: self.material_manager.len(),
            total_triangles: 0,
            total_vertices: 0,
        };
        self.visit(|node, _, _| {
            stats.node_count += 1;
            match &node.kind {
                NodeKind::Light(_) => stats.light_count += 1,
                NodeKind::Mesh(mesh) => {
                    for surface in &mesh.surfaces {
                        stats.total_triangles += surface.mesh.triangle_count();
                        stats.total_vertices += surface.mesh.vertices().len();
                    }
                }
                _ => {}
            }
        });
        stats
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

/// Scene statistics for debugging
#[derive(Debug, PartialEq)]
pub struct SceneStatistics {
    pub node_count: usize,
    pub light_count: usize,
    pub material_count: usize,
    pub total_triangles: usize,
    pub total_vertices: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_scene() -> Scene {
        let mut scene = Scene::new();
        scene.add(SceneNode::group("a").with_child(SceneNode::group("a0")));
        scene.add(
            SceneNode::group("b")
                .with_child(SceneNode::group("b0"))
                .with_child(SceneNode::group("b1")),
        );
        scene
    }

    #[test]
    fn test_node_lookup_by_path() {
        let scene = sample_scene();
        assert_eq!(scene.node(&NodePath::new(vec![1, 1])).unwrap().name, "b1");
        assert!(scene.node(&NodePath::new(vec![1, 2])).is_none());
        assert!(scene.node(&NodePath::new(vec![])).is_none());
    }

    #[test]
    fn test_siblings_of_nested_node() {
        let mut scene = sample_scene();
        let names: Vec<String> = scene
            .siblings_mut(&NodePath::new(vec![1, 0]))
            .unwrap()
            .iter()
            .map(|n| n.name.clone())
            .collect();
        assert_eq!(names, vec!["b0", "b1"]);
    }

    #[test]
    fn test_siblings_of_top_level_node() {
        let mut scene = sample_scene();
        assert_eq!(scene.siblings_mut(&NodePath::new(vec![0])).unwrap().len(), 2);
        assert!(scene.siblings_mut(&NodePath::new(vec![])).is_none());
    }

    #[test]
    fn test_statistics_count_every_node() {
        let stats = sample_scene().get_statistics();
        assert_eq!(stats.node_count, 5);
        assert_eq!(stats.light_count, 0);
    }
}
