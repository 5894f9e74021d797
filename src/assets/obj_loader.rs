//! Wavefront OBJ decoding into scene nodes.

use std::path::Path;

use super::{error::AssetLoadError, LoadedAsset};
use crate::gfx::{
    resources::Material,
    scene::{Mesh, MeshNode, ModelInfo, NodeKind, NodeRole, SceneNode, Surface},
};

/// Loads an OBJ file and its MTL library
///
/// Every OBJ model becomes one mesh node under the asset root. A missing MTL
/// library is not an error; the meshes fall back to the default material.
pub fn load_obj(path: &Path, name: &str, source: &str) -> Result<LoadedAsset, AssetLoadError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )?;

    let materials = materials.unwrap_or_else(|err| {
        log::warn!("No usable MTL for {}: {}", source, err);
        Vec::new()
    });

    Ok(convert(models, &materials, name, source))
}

fn material_name(asset: &str, index: usize, mtl: &tobj::Material) -> String {
    if mtl.name.is_empty() {
        format!("{asset}/material_{index}")
    } else {
        format!("{asset}/{}", mtl.name)
    }
}

fn convert(
    models: Vec<tobj::Model>,
    mtls: &[tobj::Material],
    name: &str,
    source: &str,
) -> LoadedAsset {
    let materials = mtls
        .iter()
        .enumerate()
        .map(|(i, mtl)| {
            let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
            Material::new(
                &material_name(name, i, mtl),
                [
                    diffuse[0],
                    diffuse[1],
                    diffuse[2],
                    mtl.dissolve.unwrap_or(1.0), // Alpha from dissolve
                ],
                0.0, // MTL has no metallic term
                1.0 - (mtl.shininess.unwrap_or(32.0) / 128.0).clamp(0.0, 1.0),
            )
        })
        .collect();

    let mut root = SceneNode::new(
        name,
        NodeKind::Model(ModelInfo {
            source: source.to_string(),
            is_letter: false,
        }),
    )
    .with_role(NodeRole::for_model(name));

    for (i, model) in models.into_iter().enumerate() {
        let node_name = if model.name.is_empty() {
            format!("mesh_{i}")
        } else {
            model.name
        };
        let material = model
            .mesh
            .material_id
            .and_then(|id| mtls.get(id).map(|mtl| material_name(name, id, mtl)));
        let mesh = Mesh::new(model.mesh.positions, model.mesh.normals, model.mesh.indices);

        root.add_child(
            SceneNode::new(
                node_name.clone(),
                NodeKind::Mesh(MeshNode::new(vec![Surface { mesh, material }])),
            )
            .with_role(NodeRole::for_mesh(&node_name)),
        );
    }

    LoadedAsset { root, materials }
}
