//! # Object Picking System
//!
//! Ray-casting against the scene graph, used to find what the pointer clicked.
//!
//! ## How it works
//!
//! 1. **Pointer to Ray**: the pointer dispatcher builds a world-space [`Ray`]
//!    from the camera position through the unprojected pointer.
//! 2. **Ray-Node Intersection**: [`Raycaster::intersect_scene`] walks every node
//!    recursively, rejects meshes whose world bounding box the ray misses and
//!    tests the remaining triangles exactly.
//! 3. **Selection**: hits come back sorted by distance, nearest first.
//!
//! ## Usage
//!
//! ```no_run
//! use atelier::gfx::picking::{Ray, Raycaster};
//! # fn demo(scene: &atelier::gfx::scene::Scene, ray: Ray) {
//! if let Some(hit) = Raycaster::new(ray).intersect_scene(scene).first() {
//!     println!("hit node at {:?}", hit.path);
//! }
//! # }
//! ```

use cgmath::{
    ElementWise, EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Transform, Vector3,
    Vector4, Zero,
};

use crate::gfx::scene::{NodePath, Scene, SceneNode};

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin point in world space
    pub origin: Vector3<f32>,
    /// Ray direction (normalized)
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Create a new ray, normalizing the direction
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }

    /// Möller–Trumbore ray/triangle test, both faces
    ///
    /// Returns the distance along the ray to the hit point.
    pub fn intersect_triangle(&self, triangle: &[Vector3<f32>; 3]) -> Option<f32> {
        const EPSILON: f32 = 1e-7;

        let edge1 = triangle[1] - triangle[0];
        let edge2 = triangle[2] - triangle[0];
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = self.origin - triangle[0];
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(q) * inv_det;
        (t > EPSILON).then_some(t)
    }
}

/// Axis-aligned bounding box for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vector3<f32>,
    /// Maximum corner of the bounding box
    pub max: Vector3<f32>,
}

impl AABB {
    /// Create a new AABB
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Create AABB from a set of vertices
    pub fn from_vertices(vertices: &[[f32; 3]]) -> Self {
        if vertices.is_empty() {
            return Self::new(Vector3::zero(), Vector3::zero());
        }

        let mut min = Vector3::from(vertices[0]);
        let mut max = min;

        for vertex in vertices.iter().skip(1) {
            let v = Vector3::from(*vertex);
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            min.z = min.z.min(v.z);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
            max.z = max.z.max(v.z);
        }

        Self::new(min, max)
    }

    /// Centroid of the box
    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &AABB) -> AABB {
        AABB::new(
            Vector3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            Vector3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        )
    }

    /// Test ray-AABB intersection
    /// Returns the distance to intersection point, or None if no intersection
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vector3::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z,
        );

        let t_min = (self.min - ray.origin).mul_element_wise(inv_dir);
        let t_max = (self.max - ray.origin).mul_element_wise(inv_dir);

        let t1 = Vector3::new(
            t_min.x.min(t_max.x),
            t_min.y.min(t_max.y),
            t_min.z.min(t_max.z),
        );
        let t2 = Vector3::new(
            t_min.x.max(t_max.x),
            t_min.y.max(t_max.y),
            t_min.z.max(t_max.z),
        );

        let t_near = t1.x.max(t1.y.max(t1.z));
        let t_far = t2.x.min(t2.y.min(t2.z));

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    /// Apply a transformation matrix to the AABB
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        // Transform all 8 corners of the AABB and compute new bounds
        let corners = [
            Vector3::new(self.min.x, self.min.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.min.z),
            Vector3::new(self.min.x, self.max.y, self.min.z),
            Vector3::new(self.min.x, self.min.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.max.z),
            Vector3::new(self.min.x, self.max.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.max.z),
        ];

        let transformed_corners: Vec<[f32; 3]> = corners
            .iter()
            .map(|corner| {
                let transformed = matrix * Vector4::new(corner.x, corner.y, corner.z, 1.0);
                [
                    transformed.x / transformed.w,
                    transformed.y / transformed.w,
                    transformed.z / transformed.w,
                ]
            })
            .collect();

        Self::from_vertices(&transformed_corners)
    }
}

/// One node struck by a ray
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    /// Location of the node in the scene graph
    pub path: NodePath,
    /// Distance from the ray origin to the hit point
    pub distance: f32,
    /// World space intersection point
    pub point: Vector3<f32>,
}

/// Casts one ray through the scene graph
pub struct Raycaster {
    ray: Ray,
}

impl Raycaster {
    pub fn new(ray: Ray) -> Self {
        Self { ray }
    }

    /// Every mesh node hit by the ray, nearest first
    ///
    /// Descends into all children; nodes without geometry (groups, lights)
    /// are never reported themselves.
    pub fn intersect_scene(&self, scene: &Scene) -> Vec<Intersection> {
        let mut hits = Vec::new();
        let mut path = Vec::new();
        for (index, node) in scene.nodes.iter().enumerate() {
            path.push(index);
            self.intersect_node(node, &mut path, &mut hits);
            path.pop();
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn intersect_node(&self, root: &SceneNode, path: &mut Vec<usize>, hits: &mut Vec<Intersection>) {
        root.visit(Matrix4::identity(), path, &mut |node, world, node_path| {
            let Some(mesh) = node.as_mesh() else {
                return;
            };

            let nearest = mesh
                .surfaces
                .iter()
                .filter(|surface| {
                    surface
                        .mesh
                        .bounds()
                        .transform(world)
                        .intersect_ray(&self.ray)
                        .is_some()
                })
                .flat_map(|surface| surface.mesh.triangles())
                .filter_map(|triangle| {
                    let world_triangle = triangle.map(|corner| {
                        world.transform_point(Point3::from_vec(corner)).to_vec()
                    });
                    self.ray.intersect_triangle(&world_triangle)
                })
                .min_by(|a, b| a.total_cmp(b));

            if let Some(distance) = nearest {
                hits.push(Intersection {
                    path: NodePath::new(node_path.to_vec()),
                    distance,
                    point: self.ray.point_at(distance),
                });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::{Mesh, MeshNode, NodeKind, Surface};

    fn unit_quad_node(name: &str, z: f32) -> SceneNode {
        let mesh = Mesh::new(
            vec![
                -0.5, -0.5, 0.0, //
                0.5, -0.5, 0.0, //
                0.5, 0.5, 0.0, //
                -0.5, 0.5, 0.0,
            ],
            Vec::new(),
            vec![0, 1, 2, 0, 2, 3],
        );
        SceneNode::new(
            name,
            NodeKind::Mesh(MeshNode::new(vec![Surface {
                mesh,
                material: None,
            }])),
        )
        .with_position(Vector3::new(0.0, 0.0, z))
    }

    #[test]
    fn test_aabb_creation() {
        let vertices = vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [-1.0, -1.0, -1.0]];
        let aabb = AABB::from_vertices(&vertices);

        assert_eq!(aabb.min, Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_ray_aabb_intersection() {
        let aabb = AABB::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));

        let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray).is_some());

        let ray_miss = Ray::new(Vector3::new(5.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray_miss).is_none());
    }

    #[test]
    fn test_triangle_hit_distance() {
        let ray = Ray::new(Vector3::new(0.2, 0.2, 3.0), Vector3::new(0.0, 0.0, -1.0));
        let triangle = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        let t = ray.intersect_triangle(&triangle).unwrap();
        assert!((t - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_triangle_behind_origin_is_ignored() {
        let ray = Ray::new(Vector3::new(0.2, 0.2, -3.0), Vector3::new(0.0, 0.0, -1.0));
        let triangle = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        assert!(ray.intersect_triangle(&triangle).is_none());
    }

    #[test]
    fn test_scene_hits_are_sorted_nearest_first() {
        let mut scene = Scene::new();
        scene.add(unit_quad_node("far", -2.0));
        scene.add(SceneNode::group("holder").with_child(unit_quad_node("near", 0.5)));

        let ray = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        let hits = Raycaster::new(ray).intersect_scene(&scene);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].path, NodePath::new(vec![1, 0]));
        assert!((hits[0].distance - 4.5).abs() < 1e-5);
        assert_eq!(hits[1].path, NodePath::new(vec![0]));
        assert_eq!(scene.node(&hits[0].path).unwrap().name, "near");
    }

    #[test]
    fn test_miss_returns_nothing() {
        let mut scene = Scene::new();
        scene.add(unit_quad_node("quad", 0.0));
        let ray = Ray::new(Vector3::new(3.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(Raycaster::new(ray).intersect_scene(&scene).is_empty());
    }
}
