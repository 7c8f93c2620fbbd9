//! Node graph flattening into a prefab

use std::f32::consts::PI;

use glam::{Mat4, Quat, Vec3};
use gltf::scene::Transform;
use kiln_common::{PrefabInfo, PrefabNodeMesh};

/// Correction applied to every root transform: 180 degrees about X after a Y flip.
pub fn root_fixup() -> Mat4 {
    Mat4::from_rotation_x(PI) * Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0))
}

/// Local transform of a node: an explicit matrix verbatim, otherwise T * R * S.
pub fn local_transform(transform: &Transform) -> Mat4 {
    match transform {
        Transform::Matrix { matrix } => Mat4::from_cols_array_2d(matrix),
        Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => Mat4::from_scale_rotation_translation(
            Vec3::from_array(*scale),
            Quat::from_array(*rotation),
            Vec3::from_array(*translation),
        ),
    }
}

/// Flatten the document's nodes.
///
/// `primitive_refs[m]` holds one mesh reference per primitive of mesh `m`.
/// Original nodes keep their glTF indices; nodes whose mesh has several
/// primitives get one synthetic `<name>_PRIM_<p>` child per primitive,
/// appended after all original nodes.
pub(crate) fn flatten_nodes(
    document: &gltf::Document,
    primitive_refs: &[Vec<PrefabNodeMesh>],
) -> PrefabInfo {
    let mut prefab = PrefabInfo::new();
    let mut deferred = Vec::new();

    for node in document.nodes() {
        let id = prefab.add_node(local_transform(&node.transform()));
        debug_assert_eq!(id, node.index() as u64);

        if let Some(name) = node.name() {
            prefab.node_names.insert(id, name.to_string());
        }
        for child in node.children() {
            prefab.node_parents.insert(child.index() as u64, id);
        }

        let Some(mesh) = node.mesh() else { continue };
        match primitive_refs.get(mesh.index()).map(Vec::as_slice) {
            Some([single]) => {
                prefab.node_meshes.insert(id, single.clone());
            }
            Some([]) | None => {}
            Some(_) => deferred.push((id, mesh.index())),
        }
    }

    let fixup = root_fixup();
    for id in 0..prefab.node_count() {
        if !prefab.is_root(id) {
            continue;
        }
        if let Some(matrix) = prefab.matrix(id) {
            prefab.set_matrix(id, fixup * matrix);
        }
    }

    for (owner, mesh) in deferred {
        let owner_name = prefab.node_names.get(&owner).cloned().unwrap_or_default();
        for (p, mesh_ref) in primitive_refs[mesh].iter().enumerate() {
            let id = prefab.add_node(Mat4::IDENTITY);
            prefab
                .node_names
                .insert(id, format!("{owner_name}_PRIM_{p}"));
            prefab.node_parents.insert(id, owner);
            prefab.node_meshes.insert(id, mesh_ref.clone());
        }
    }

    prefab
}
