use std::{f32::consts::FRAC_PI_2, sync::Arc};

use cgmath::{Rad, Vector3};
use futures::stream::{FuturesUnordered, StreamExt};

use super::queue::{LoadedModel, ModelSender};
use crate::{
    assets::{error::describe, AssetSource, LoadError, LoadedAsset, ManifestEntry, ModelRole},
    gfx::scene::{NodeKind, NodeRole, SceneNode},
};

/// Y rotation applied to every model that is not a letter
pub const MODEL_YAW_OFFSET: f32 = 0.15;

/// X shift applied to every manifest position when placing the pivot
pub const PIVOT_X_OFFSET: f32 = 0.2;

/// Outcome of one [`ModelLoader::load_all`] run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Manifest entries a load was attempted for
    pub attempted: usize,
    /// Entries that decoded and were queued for insertion
    pub loaded: usize,
    /// Manifest paths that failed
    pub failed: Vec<String>,
}

/// Loads every model named by the manifest and queues it for the scene
pub struct ModelLoader {
    source: Arc<dyn AssetSource>,
}

impl ModelLoader {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self { source }
    }

    /// Fetches the manifest, then loads all entries concurrently
    ///
    /// Each model is queued as soon as it is ready. A failing asset is logged
    /// and skipped; only a manifest failure fails the whole call.
    pub async fn load_all(&self, sender: &ModelSender) -> Result<LoadReport, LoadError> {
        let manifest = self
            .source
            .fetch_manifest()
            .await
            .map_err(LoadError::Manifest)?;
        log::info!(
            "Loading {} objects and {} letters",
            manifest.objects.len(),
            manifest.letters.len()
        );

        let mut pending: FuturesUnordered<_> = manifest
            .entries()
            .enumerate()
            .map(|(slot, (entry, is_letter))| async move {
                let result = self.source.load_asset(&entry.path).await;
                (slot, entry, is_letter, result)
            })
            .collect();

        let mut report = LoadReport {
            attempted: manifest.len(),
            ..Default::default()
        };

        while let Some((slot, entry, is_letter, result)) = pending.next().await {
            match result {
                Ok(asset) => {
                    let model = prepare_model(asset, entry, slot, is_letter);
                    log::info!("Loaded {} ({})", entry.path, model.pivot.name);
                    if !sender.send(model) {
                        log::warn!("Scene is gone, dropping {}", entry.path);
                    }
                    report.loaded += 1;
                }
                Err(source) => {
                    let err = LoadError::Asset {
                        path: entry.path.clone(),
                        source,
                    };
                    log::error!("{}", describe(&err));
                    report.failed.push(entry.path.clone());
                }
            }
        }

        Ok(report)
    }
}

/// Material id of `id` once loaded from manifest slot `slot`
pub fn slot_material_id(slot: usize, id: &str) -> String {
    format!("{slot}:{id}")
}

/// Centres a decoded asset, tags it and wraps it in its pivot
///
/// `slot` is the entry's position in [`Manifest::entries`] order; material ids
/// are prefixed with it so two entries naming the same file never share a
/// material. The model is moved so its bounding-box centre sits on the pivot
/// origin. Non-letter models are turned by [`MODEL_YAW_OFFSET`]. Ground meshes
/// receive shadows and every other mesh casts them. The pivot sits at the
/// manifest position shifted by [`PIVOT_X_OFFSET`] and faces −π/2 around Y.
///
/// [`Manifest::entries`]: crate::assets::Manifest::entries
pub fn prepare_model(
    asset: LoadedAsset,
    entry: &ManifestEntry,
    slot: usize,
    is_letter: bool,
) -> LoadedModel {
    let mut model = asset.root;
    let mut materials = asset.materials;

    if let NodeKind::Model(info) = &mut model.kind {
        info.is_letter = is_letter;
    }
    if let Some(role) = entry.role {
        apply_role(&mut model, role);
    }

    if let Some(bounds) = model.bounds_in_parent() {
        model.transform.position -= bounds.center();
    }
    if !is_letter {
        model.transform.rotation.y = model.transform.rotation.y - Rad(MODEL_YAW_OFFSET);
    }

    for material in &mut materials {
        material.name = slot_material_id(slot, &material.name);
    }
    model.traverse_mut(&mut |node| {
        let ground = node.role == NodeRole::Ground;
        if let Some(mesh) = node.as_mesh_mut() {
            if ground {
                mesh.receive_shadow = true;
            } else {
                mesh.cast_shadow = true;
            }
            for id in mesh.surfaces.iter_mut().filter_map(|s| s.material.as_mut()) {
                *id = slot_material_id(slot, id);
            }
        }
    });

    let [x, y, z] = entry.position;
    let mut pivot = SceneNode::group(format!("{}_pivot", model.name))
        .with_role(NodeRole::Pivot)
        .with_position(Vector3::new(x - PIVOT_X_OFFSET, y, z));
    pivot.transform.rotation.y = Rad(-FRAC_PI_2);
    pivot.add_child(model);

    LoadedModel { pivot, materials }
}

fn apply_role(model: &mut SceneNode, role: ModelRole) {
    match role {
        ModelRole::Plain => model.role = NodeRole::Plain,
        ModelRole::Rotating => model.role = NodeRole::Rotating,
        ModelRole::Ground => model.traverse_mut(&mut |node| {
            if node.as_mesh().is_some() {
                node.role = NodeRole::Ground;
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assets::{AssetLoadError, FetchError, Manifest},
        gfx::{
            resources::Material,
            scene::{Mesh, MeshNode, ModelInfo, Scene, Surface},
        },
        models::queue::scene_queue,
    };
    use futures::{executor::block_on, future::BoxFuture};
    use std::sync::Mutex;

    fn cube_mesh(min: [f32; 3], max: [f32; 3]) -> Mesh {
        let positions = vec![
            min[0], min[1], min[2], //
            max[0], min[1], min[2], //
            max[0], max[1], max[2], //
            min[0], max[1], max[2],
        ];
        Mesh::new(positions, vec![], vec![0, 1, 2, 0, 2, 3])
    }

    fn asset(name: &str, mesh_name: &str) -> LoadedAsset {
        let mesh = SceneNode::new(
            mesh_name,
            NodeKind::Mesh(MeshNode::new(vec![Surface {
                mesh: cube_mesh([1.0, 2.0, 3.0], [3.0, 4.0, 5.0]),
                material: Some(format!("{name}/paint")),
            }])),
        )
        .with_role(NodeRole::for_mesh(mesh_name));
        LoadedAsset {
            root: SceneNode::new(
                name,
                NodeKind::Model(ModelInfo {
                    source: format!("{name}.glb"),
                    is_letter: false,
                }),
            )
            .with_role(NodeRole::for_model(name))
            .with_child(mesh),
            materials: vec![Material::new(&format!("{name}/paint"), [1.0; 4], 0.0, 0.5)],
        }
    }

    fn entry(path: &str, position: [f32; 3]) -> ManifestEntry {
        ManifestEntry {
            path: path.to_string(),
            position,
            role: None,
        }
    }

    #[test]
    fn test_pivot_placement() {
        let model = prepare_model(asset("lampe", "lampe_1"), &entry("lampe.glb", [1.0, 2.0, 3.0]), 0, false);
        let pivot = &model.pivot;

        assert_eq!(pivot.role, NodeRole::Pivot);
        assert!((pivot.transform.position.x - 0.8).abs() < 1e-6);
        assert_eq!(pivot.transform.position.y, 2.0);
        assert_eq!(pivot.transform.position.z, 3.0);
        assert!((pivot.transform.rotation.y.0 + FRAC_PI_2).abs() < 1e-6);
        assert_eq!(pivot.children.len(), 1);
    }

    #[test]
    fn test_model_is_centred_and_turned() {
        let model = prepare_model(asset("table", "plateau"), &entry("table.glb", [0.0; 3]), 0, false);
        let root = &model.pivot.children[0];

        assert_eq!(root.transform.position, Vector3::new(-2.0, -3.0, -4.0));
        assert!((root.transform.rotation.y.0 + MODEL_YAW_OFFSET).abs() < 1e-6);
        assert_eq!(root.model_info().map(|info| info.is_letter), Some(false));
    }

    #[test]
    fn test_letters_keep_their_rotation() {
        let model = prepare_model(asset("a", "a"), &entry("a.glb", [0.0; 3]), 0, true);
        let root = &model.pivot.children[0];
        assert_eq!(root.transform.rotation.y.0, 0.0);
        assert_eq!(root.model_info().map(|info| info.is_letter), Some(true));
    }

    #[test]
    fn test_shadow_flags() {
        let ground = prepare_model(asset("piece", "sol"), &entry("piece.glb", [0.0; 3]), 0, false);
        let mesh = ground.pivot.children[0].children[0].as_mesh().unwrap();
        assert!(mesh.receive_shadow && !mesh.cast_shadow);

        let other = prepare_model(asset("piece", "mur"), &entry("piece.glb", [0.0; 3]), 0, false);
        let mesh = other.pivot.children[0].children[0].as_mesh().unwrap();
        assert!(mesh.cast_shadow && !mesh.receive_shadow);
    }

    fn with_role(path: &str, role: ModelRole) -> ManifestEntry {
        ManifestEntry {
            role: Some(role),
            ..entry(path, [0.0; 3])
        }
    }

    #[test]
    fn test_rotating_override_spins_the_model() {
        let model = prepare_model(asset("fan", "blade"), &with_role("fan.glb", ModelRole::Rotating), 0, false);
        assert_eq!(model.pivot.children[0].role, NodeRole::Rotating);
    }

    #[test]
    fn test_plain_override_stops_a_vapeur_model() {
        let stack = asset("vapeur_stack", "tasse");
        assert_eq!(stack.root.role, NodeRole::Rotating);

        let model = prepare_model(stack, &with_role("vapeur_stack.glb", ModelRole::Plain), 0, false);
        assert_eq!(model.pivot.children[0].role, NodeRole::Plain);
    }

    #[test]
    fn test_ground_override_makes_meshes_receive_shadows() {
        let model = prepare_model(asset("tapis", "laine"), &with_role("tapis.glb", ModelRole::Ground), 0, false);
        let root = &model.pivot.children[0];
        assert_eq!(root.role, NodeRole::Plain);

        let mesh_node = &root.children[0];
        assert_eq!(mesh_node.role, NodeRole::Ground);
        let mesh = mesh_node.as_mesh().unwrap();
        assert!(mesh.receive_shadow && !mesh.cast_shadow);
    }

    #[test]
    fn test_material_ids_are_scoped_to_the_manifest_slot() {
        let first = prepare_model(asset("chaise", "pied"), &entry("chaise.glb", [0.0; 3]), 1, false);
        let second = prepare_model(asset("chaise", "pied"), &entry("chaise.glb", [1.0, 0.0, 0.0]), 4, false);

        assert_eq!(first.materials[0].name, "1:chaise/paint");
        assert_eq!(second.materials[0].name, "4:chaise/paint");
        let surface_id = |model: &LoadedModel| {
            model.pivot.children[0].children[0].as_mesh().unwrap().surfaces[0]
                .material
                .clone()
        };
        assert_eq!(surface_id(&first).as_deref(), Some("1:chaise/paint"));
        assert_eq!(surface_id(&second).as_deref(), Some("4:chaise/paint"));

        let mut scene = Scene::new();
        scene.add_materials(first.materials);
        scene.add_materials(second.materials);
        scene
            .material_manager
            .get_material_mut("4:chaise/paint")
            .unwrap()
            .emissive_intensity = 3.0;
        assert_eq!(
            scene.material_manager.get_material("1:chaise/paint").unwrap().emissive_intensity,
            1.0
        );
    }

    struct StubSource {
        manifest: Option<Manifest>,
        requested: Mutex<Vec<String>>,
    }

    impl AssetSource for StubSource {
        fn fetch_manifest(&self) -> BoxFuture<'_, Result<Manifest, FetchError>> {
            let manifest = self.manifest.clone();
            Box::pin(async move {
                manifest.ok_or_else(|| FetchError::NotFound("models.json".into()))
            })
        }

        fn load_asset<'a>(
            &'a self,
            path: &'a str,
        ) -> BoxFuture<'a, Result<LoadedAsset, AssetLoadError>> {
            self.requested.lock().unwrap().push(path.to_string());
            Box::pin(async move {
                if path.starts_with("broken") {
                    Err(AssetLoadError::UnsupportedFormat("fbx".to_string()))
                } else {
                    Ok(asset(&crate::assets::asset_name(path), "mesh"))
                }
            })
        }
    }

    #[test]
    fn test_load_all_attempts_each_entry_once() {
        let source = Arc::new(StubSource {
            manifest: Some(Manifest {
                objects: vec![
                    entry("vapeur_stack.glb", [0.0; 3]),
                    entry("broken.fbx", [0.0; 3]),
                ],
                letters: vec![entry("a.glb", [0.5, 0.0, 0.0])],
            }),
            requested: Mutex::new(Vec::new()),
        });
        let (sender, mut queue) = scene_queue();

        let report = block_on(ModelLoader::new(source.clone()).load_all(&sender)).unwrap();
        assert_eq!(report.attempted, 3);
        assert_eq!(report.loaded, 2);
        assert_eq!(report.failed, vec!["broken.fbx".to_string()]);

        let mut requested = source.requested.lock().unwrap().clone();
        requested.sort();
        assert_eq!(requested, vec!["a.glb", "broken.fbx", "vapeur_stack.glb"]);

        let mut scene = Scene::new();
        assert_eq!(queue.drain_into(&mut scene), 2);
    }

    #[test]
    fn test_manifest_failure_is_returned() {
        let source = Arc::new(StubSource {
            manifest: None,
            requested: Mutex::new(Vec::new()),
        });
        let (sender, _queue) = scene_queue();

        let result = block_on(ModelLoader::new(source.clone()).load_all(&sender));
        assert!(matches!(result, Err(LoadError::Manifest(FetchError::NotFound(_)))));
        assert!(source.requested.lock().unwrap().is_empty());
    }
}
