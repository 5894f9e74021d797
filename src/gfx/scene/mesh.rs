use cgmath::Vector3;
use wgpu::Device;

use super::vertex::Vertex3D;
use crate::gfx::picking::AABB;

/// GPU buffers for a mesh, created lazily by the renderer
pub struct MeshGpuBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
}

/// Indexed triangle mesh in the local space of its node
pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    bounds: AABB,
    gpu: Option<MeshGpuBuffers>,
}

impl Mesh {
    /// Builds a mesh from flat position/normal arrays
    ///
    /// Normals are computed from the faces when `normals` does not match
    /// `positions` in length.
    pub fn new(positions: Vec<f32>, normals: Vec<f32>, indices: Vec<u32>) -> Self {
        let normals = if normals.len() == positions.len() {
            normals
        } else {
            Self::calculate_face_normals(&positions, &indices)
        };

        let vertices: Vec<Vertex3D> = positions
            .chunks_exact(3)
            .zip(normals.chunks_exact(3))
            .map(|(p, n)| Vertex3D {
                position: [p[0], p[1], p[2]],
                normal: [n[0], n[1], n[2]],
            })
            .collect();

        Self::from_vertices(vertices, indices)
    }

    pub fn from_vertices(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        let corners: Vec<[f32; 3]> = vertices.iter().map(|v| v.position).collect();
        let bounds = AABB::from_vertices(&corners);
        Self {
            vertices,
            indices,
            bounds,
            gpu: None,
        }
    }

    /// Axis-aligned box around the vertices, in node-local space
    pub fn bounds(&self) -> AABB {
        self.bounds
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterates the triangles of the mesh as local-space corner triples
    ///
    /// Triangles referencing out-of-range vertices are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [Vector3<f32>; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(move |tri| {
            let corner = |i: u32| {
                self.vertices
                    .get(i as usize)
                    .map(|v| Vector3::new(v.position[0], v.position[1], v.position[2]))
            };
            Some([corner(tri[0])?, corner(tri[1])?, corner(tri[2])?])
        })
    }

    pub fn gpu_buffers(&self) -> Option<&MeshGpuBuffers> {
        self.gpu.as_ref()
    }

    /// Uploads vertex and index data once; later calls are no-ops
    pub fn init_gpu_resources(&mut self, device: &Device) {
        if self.gpu.is_some() || self.indices.is_empty() {
            return;
        }

        let vertex_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        );

        let index_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        );

        self.gpu = Some(MeshGpuBuffers {
            vertex_buffer,
            index_buffer,
        });
    }

    // Helper function to calculate smooth normals when the asset has none
    pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let vertex_count = positions.len() / 3;
        let mut normals = vec![0.0; positions.len()];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let v = |i: usize| {
                Vector3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2])
            };
            let face_normal = (v(i1) - v(i0)).cross(v(i2) - v(i0));

            for &vertex_idx in &[i0, i1, i2] {
                normals[vertex_idx * 3] += face_normal.x;
                normals[vertex_idx * 3 + 1] += face_normal.y;
                normals[vertex_idx * 3 + 2] += face_normal.z;
            }
        }

        for normal in normals.chunks_exact_mut(3) {
            let length = (normal[0].powi(2) + normal[1].powi(2) + normal[2].powi(2)).sqrt();
            if length > 0.0 {
                normal.iter_mut().for_each(|c| *c /= length);
            }
        }

        normals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        Mesh::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            Vec::new(),
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    #[test]
    fn test_missing_normals_are_computed() {
        let mesh = quad();
        for vertex in mesh.vertices() {
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_bounds_cover_all_vertices() {
        let bounds = quad().bounds();
        assert_eq!(bounds.min, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vector3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_triangles_skip_bad_indices() {
        let mesh = Mesh::new(vec![0.0; 9], vec![0.0; 9], vec![0, 1, 2, 0, 1, 7]);
        assert_eq!(mesh.triangles().count(), 1);
    }
}
