//! glTF / GLB decoding into scene nodes.

use std::path::Path;

use gltf::{buffer, mesh::Mode};

use super::{error::AssetLoadError, LoadedAsset};
use crate::gfx::{
    resources::{Color, Material, MaterialId},
    scene::{Mesh, MeshNode, ModelInfo, NodeKind, NodeRole, SceneNode, Surface, Transform},
};

/// Decodes a `.gltf` or `.glb` file, resolving external buffers next to it
pub fn load_gltf(path: &Path, name: &str, source: &str) -> Result<LoadedAsset, AssetLoadError> {
    let (document, buffers, _images) = gltf::import(path)?;
    convert_document(&document, &buffers, name, source)
}

/// Decodes an in-memory glTF document; buffers must be embedded
pub fn load_gltf_slice(
    bytes: &[u8],
    name: &str,
    source: &str,
) -> Result<LoadedAsset, AssetLoadError> {
    let (document, buffers, _images) = gltf::import_slice(bytes)?;
    convert_document(&document, &buffers, name, source)
}

fn convert_document(
    document: &gltf::Document,
    buffers: &[buffer::Data],
    name: &str,
    source: &str,
) -> Result<LoadedAsset, AssetLoadError> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| AssetLoadError::Empty(source.to_string()))?;

    let root_name = scene.name().unwrap_or(name).to_string();
    let mut root = SceneNode::new(
        root_name.clone(),
        NodeKind::Model(ModelInfo {
            source: source.to_string(),
            is_letter: false,
        }),
    )
    .with_role(NodeRole::for_model(&root_name));

    for node in scene.nodes() {
        root.add_child(convert_node(&node, buffers, name));
    }

    let materials = document
        .materials()
        .filter_map(|material| {
            let index = material.index()?;
            Some(convert_material(&material, material_id(name, &material, index)))
        })
        .collect();

    log::debug!(
        "Decoded glTF {} ({} nodes, {} meshes)",
        source,
        document.nodes().count(),
        document.meshes().count()
    );

    Ok(LoadedAsset { root, materials })
}

fn convert_node(node: &gltf::Node, buffers: &[buffer::Data], asset: &str) -> SceneNode {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));
    let (translation, rotation, scale) = node.transform().decomposed();

    let kind = match node.mesh() {
        Some(mesh) => NodeKind::Mesh(MeshNode::new(convert_mesh(&mesh, buffers, asset))),
        None => NodeKind::Group,
    };
    let mut converted = SceneNode::new(name.clone(), kind)
        .with_role(NodeRole::for_mesh(&name))
        .with_transform(Transform::from_trs(translation, rotation, scale));

    for child in node.children() {
        converted.add_child(convert_node(&child, buffers, asset));
    }
    converted
}

fn convert_mesh(mesh: &gltf::Mesh, buffers: &[buffer::Data], asset: &str) -> Vec<Surface> {
    let mut surfaces = Vec::new();
    for primitive in mesh.primitives() {
        if primitive.mode() != Mode::Triangles {
            log::warn!(
                "Skipping {:?} primitive in mesh {:?}",
                primitive.mode(),
                mesh.name()
            );
            continue;
        }

        let reader = primitive.reader(|b| buffers.get(b.index()).map(|bb| bb.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let positions: Vec<f32> = positions.flatten().collect();
        let normals: Vec<f32> = reader
            .read_normals()
            .map(|normals| normals.flatten().collect())
            .unwrap_or_default();
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..(positions.len() / 3) as u32).collect(),
        };

        let material = primitive.material();
        surfaces.push(Surface {
            mesh: Mesh::new(positions, normals, indices),
            material: material
                .index()
                .map(|index| material_id(asset, &material, index)),
        });
    }
    surfaces
}

fn material_id(asset: &str, material: &gltf::Material, index: usize) -> MaterialId {
    match material.name() {
        Some(name) => format!("{asset}/{name}"),
        None => format!("{asset}/material_{index}"),
    }
}

fn convert_material(material: &gltf::Material, id: MaterialId) -> Material {
    let pbr = material.pbr_metallic_roughness();
    Material::new(
        &id,
        pbr.base_color_factor(),
        pbr.metallic_factor(),
        pbr.roughness_factor(),
    )
    .with_emission(
        Color::from(material.emissive_factor()),
        material.emissive_strength().unwrap_or(1.0),
    )
}
