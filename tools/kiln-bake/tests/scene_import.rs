//! Scene import tests against GLBs generated in memory

mod scene_generator;

use glam::{Mat4, Quat, Vec3};
use glb_builder::{
    BufferBuilder, ComponentType, MeshBuilder, PrimitiveAccessors, mesh::MODE_LINES,
    mesh::MODE_TRIANGLES,
};
use kiln_bake::config::MissingAttributes;
use kiln_bake::scene::root_fixup;
use kiln_bake::{
    ImportError, ImportOptions, ImportedScene, ScenePaths, import_scene, load_scene_from_slice,
};
use kiln_common::{
    AssetContainer, MeshInfo, PrefabInfo, TransparencyMode, VertexFormat, VertexPncvF32,
    read_material_info, read_mesh_info, read_prefab_info, read_texture_info, slots, unpack_mesh,
};
use scene_generator::*;
use std::path::Path;

const SOURCE: &str = "props/test.glb";

fn import_with(glb: &[u8], options: ImportOptions) -> Result<ImportedScene, ImportError> {
    let loaded = load_scene_from_slice(glb).expect("generated GLB should load");
    import_scene(&loaded, &ScenePaths::new(Path::new(SOURCE)), &options)
}

fn import(glb: &[u8]) -> ImportedScene {
    import_with(glb, ImportOptions::default()).expect("import should succeed")
}

fn prefab(scene: &ImportedScene) -> PrefabInfo {
    read_prefab_info(&scene.prefab.container).expect("prefab metadata")
}

fn unpack(container: &AssetContainer) -> (MeshInfo, Vec<u8>, Vec<u8>) {
    let info = read_mesh_info(container).expect("mesh metadata");
    let mut vertices = vec![0u8; info.vertex_buffer_size as usize];
    let mut indices = vec![0u8; info.index_buffer_size as usize];
    unpack_mesh(&info, &container.payload, &mut vertices, &mut indices).expect("unpack mesh");
    (info, vertices, indices)
}

fn pncv_vertices(bytes: &[u8]) -> Vec<VertexPncvF32> {
    bytemuck::pod_collect_to_vec(bytes)
}

fn u16_indices(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect()
}

fn assert_matrix_eq(actual: Mat4, expected: Mat4) {
    assert!(
        actual.abs_diff_eq(expected, 1e-5),
        "matrices differ:\n  actual:   {actual:?}\n  expected: {expected:?}"
    );
}

// ============================================================================
// Node graph
// ============================================================================

#[test]
fn test_hierarchy_parents_and_transforms() {
    let scene = import(&hierarchy_glb());
    let prefab = prefab(&scene);

    assert_eq!(prefab.node_count(), 3);
    assert_eq!(prefab.matrices.len(), 3);
    assert_eq!(prefab.node_parents.get(&1), Some(&0));
    assert_eq!(prefab.node_parents.get(&2), Some(&1));
    assert!(prefab.is_root(0));
    assert_eq!(prefab.node_names[&0], "Root");
    assert_eq!(prefab.node_names[&2], "Leaf");

    let root_local = Mat4::from_rotation_translation(
        Quat::from_rotation_y(ROOT_ROTATION_Y),
        Vec3::from_array(ROOT_TRANSLATION),
    );
    assert_matrix_eq(prefab.matrix(0).unwrap(), root_fixup() * root_local);
    assert_matrix_eq(prefab.matrix(1).unwrap(), Mat4::from_cols_array(&MIDDLE_MATRIX));
    assert_matrix_eq(
        prefab.matrix(2).unwrap(),
        Mat4::from_scale_rotation_translation(
            Vec3::from_array(LEAF_SCALE),
            Quat::IDENTITY,
            Vec3::from_array(LEAF_TRANSLATION),
        ),
    );
}

#[test]
fn test_root_fixup_negates_z_only() {
    let scene = import(&hierarchy_glb());
    let prefab = prefab(&scene);

    // root translation (1, 2, 3) lands at (1, 2, -3)
    let root = prefab.matrix(0).unwrap();
    let translation = root.w_axis.truncate();
    assert!(translation.abs_diff_eq(Vec3::new(1.0, 2.0, -3.0), 1e-5));
}

#[test]
fn test_hierarchy_mesh_reference() {
    let scene = import(&hierarchy_glb());
    let prefab = prefab(&scene);

    assert_eq!(prefab.node_meshes.len(), 1);
    let mesh_ref = &prefab.node_meshes[&2];
    assert_eq!(mesh_ref.mesh_path, "props/test_GLTF/MESH_0_Quad.mesh");
    assert_eq!(mesh_ref.material_path, "props/test_GLTF/MAT_DEFAULT.mat");
    assert_eq!(scene.prefab.path, "props/test_GLTF/test.pfb");
}

#[test]
fn test_multi_primitive_expansion() {
    let scene = import(&multi_primitive_glb());
    let prefab = prefab(&scene);

    // two original nodes plus one synthetic child per primitive of "Body"
    assert_eq!(prefab.node_count(), 4);
    assert!(!prefab.node_meshes.contains_key(&0));
    assert_eq!(
        prefab.node_meshes[&1].mesh_path,
        "props/test_GLTF/MESH_1_Plate.mesh"
    );

    for (node, p) in [(2u64, 0usize), (3, 1)] {
        assert_eq!(prefab.node_names[&node], format!("Robot_PRIM_{p}"));
        assert_eq!(prefab.node_parents[&node], 0);
        assert_matrix_eq(prefab.matrix(node).unwrap(), Mat4::IDENTITY);
        assert_eq!(
            prefab.node_meshes[&node].mesh_path,
            format!("props/test_GLTF/MESH_0_Body_PRIM_{p}.mesh")
        );
    }
    assert_eq!(
        prefab.node_meshes[&2].material_path,
        "props/test_GLTF/MAT_0_Red.mat"
    );
    assert_eq!(
        prefab.node_meshes[&3].material_path,
        "props/test_GLTF/MAT_1_Blue.mat"
    );

    // both plain roots get the fixup, synthetic children do not
    assert_matrix_eq(
        prefab.matrix(0).unwrap(),
        root_fixup() * Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)),
    );
    assert_matrix_eq(prefab.matrix(1).unwrap(), root_fixup());
}

#[test]
fn test_multi_primitive_mesh_assets() {
    let scene = import(&multi_primitive_glb());
    let paths: Vec<&str> = scene.meshes.iter().map(|m| m.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "props/test_GLTF/MESH_0_Body_PRIM_0.mesh",
            "props/test_GLTF/MESH_0_Body_PRIM_1.mesh",
            "props/test_GLTF/MESH_1_Plate.mesh",
        ]
    );
    // every primitive has a material, so no default is created
    assert_eq!(scene.materials.len(), 2);
}

// ============================================================================
// Mesh data
// ============================================================================

#[test]
fn test_winding_is_flipped() {
    let scene = import(&six_vertex_glb(Some(&SIX_VERTEX_INDICES)));
    let (info, _, indices) = unpack(&scene.meshes[0].container);

    assert_eq!(info.index_size, 2);
    assert_eq!(u16_indices(&indices), vec![0, 2, 1, 3, 5, 4]);
}

#[test]
fn test_unindexed_primitive_gets_sequential_indices() {
    let scene = import(&six_vertex_glb(None));
    let (_, _, indices) = unpack(&scene.meshes[0].container);
    assert_eq!(u16_indices(&indices), vec![0, 2, 1, 3, 5, 4]);
}

#[test]
fn test_vertex_contents_and_bounds() {
    let scene = import(&six_vertex_glb(None));
    let (info, vertex_bytes, _) = unpack(&scene.meshes[0].container);

    assert_eq!(info.vertex_format, VertexFormat::PncvF32);
    assert_eq!(info.original_file, SOURCE);
    let vertices = pncv_vertices(&vertex_bytes);
    assert_eq!(vertices.len(), 6);
    assert_eq!(vertices[5].position, [5.0, 0.0, 0.0]);
    // color mirrors the normal
    assert_eq!(vertices[3].color, vertices[3].normal);

    assert_eq!(info.bounds.origin, [2.5, 0.0, 0.0]);
    assert_eq!(info.bounds.extents, [2.5, 0.0, 0.0]);
    assert!((info.bounds.radius - 2.5).abs() < 1e-6);
}

#[test]
fn test_interleaved_and_tight_layouts_match() {
    let tight = import(&single_primitive_glb(|buffer| quad().build(buffer)));
    let interleaved = import(&single_primitive_glb(|buffer| quad().interleaved().build(buffer)));

    let (_, tight_vertices, tight_indices) = unpack(&tight.meshes[0].container);
    let (_, strided_vertices, strided_indices) = unpack(&interleaved.meshes[0].container);
    assert_eq!(tight_vertices, strided_vertices);
    assert_eq!(tight_indices, strided_indices);
}

#[test]
fn test_u8_i16_and_u32_indices() {
    for component_type in [ComponentType::U8, ComponentType::I16, ComponentType::U32] {
        let glb = single_primitive_glb(|buffer| quad().index_type(component_type).build(buffer));
        let scene = import(&glb);
        let (_, _, indices) = unpack(&scene.meshes[0].container);
        // stored narrow regardless of the source width
        assert_eq!(u16_indices(&indices), vec![0, 2, 1, 0, 3, 2]);
    }
}

#[test]
fn test_normalized_u16_uvs() {
    let glb = single_primitive_glb(|buffer: &mut BufferBuilder| {
        let positions = buffer.pack_positions(&[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let normals = buffer.pack_vec3(&[[0.0, 0.0, 1.0]; 3]);
        let uvs = buffer.pack_uv_unorm16(&[[0, 65535], [65535, 0], [65535, 65535]]);
        PrimitiveAccessors {
            positions,
            normals: Some(normals),
            uvs: Some(uvs),
            indices: None,
            material: None,
            mode: MODE_TRIANGLES,
        }
    });
    let scene = import(&glb);
    let (_, vertex_bytes, _) = unpack(&scene.meshes[0].container);
    let uvs: Vec<[f32; 2]> = pncv_vertices(&vertex_bytes).iter().map(|v| v.uv).collect();
    assert_eq!(uvs, vec![[0.0, 1.0], [1.0, 0.0], [1.0, 1.0]]);
}

#[test]
fn test_compact_vertex_format() {
    let options = ImportOptions {
        vertex_format: VertexFormat::P32N8C8V16,
        ..ImportOptions::default()
    };
    let scene = import_with(&hierarchy_glb(), options).unwrap();
    let (info, vertex_bytes, _) = unpack(&scene.meshes[0].container);

    assert_eq!(info.vertex_format, VertexFormat::P32N8C8V16);
    assert_eq!(vertex_bytes.len(), QUAD_POSITIONS.len() * 28);
}

#[test]
fn test_missing_normals_rejected_by_default() {
    let glb = single_primitive_glb(|buffer| {
        MeshBuilder::new()
            .positions(&QUAD_POSITIONS)
            .uvs(&QUAD_UVS)
            .indices(&QUAD_INDICES)
            .build(buffer)
    });
    let err = import_with(&glb, ImportOptions::default()).unwrap_err();
    assert!(
        matches!(err, ImportError::MissingAttribute { attribute: "NORMAL", .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn test_missing_attributes_defaulted_on_request() {
    let glb = single_primitive_glb(|buffer| {
        MeshBuilder::new()
            .positions(&QUAD_POSITIONS)
            .indices(&QUAD_INDICES)
            .build(buffer)
    });
    let options = ImportOptions {
        missing_attributes: MissingAttributes::Default,
        ..ImportOptions::default()
    };
    let scene = import_with(&glb, options).unwrap();
    let (_, vertex_bytes, _) = unpack(&scene.meshes[0].container);
    for vertex in pncv_vertices(&vertex_bytes) {
        assert_eq!(vertex.normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertex.color, [0.0, 1.0, 0.0]);
        assert_eq!(vertex.uv, [0.0, 0.0]);
    }
}

#[test]
fn test_non_triangle_mode_rejected() {
    let glb = single_primitive_glb(|buffer| {
        MeshBuilder::new()
            .positions(&QUAD_POSITIONS)
            .normals(&QUAD_NORMALS)
            .uvs(&QUAD_UVS)
            .mode(MODE_LINES)
            .build(buffer)
    });
    let err = import_with(&glb, ImportOptions::default()).unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedMode { .. }), "unexpected error: {err}");
}

#[test]
fn test_incomplete_triangle_rejected() {
    let glb = single_primitive_glb(|buffer| quad().indices(&[0, 1, 2, 3]).build(buffer));
    let err = import_with(&glb, ImportOptions::default()).unwrap_err();
    assert!(matches!(err, ImportError::IncompleteTriangle { count: 4, .. }));
}

#[test]
fn test_out_of_range_index_rejected() {
    let glb = single_primitive_glb(|buffer| quad().indices(&[0, 1, 9]).build(buffer));
    let err = import_with(&glb, ImportOptions::default()).unwrap_err();
    assert!(matches!(err, ImportError::IndexOutOfRange { index: 9, vertex_count: 4, .. }));
}

#[test]
fn test_oversized_accessor_count_rejected() {
    let glb = single_primitive_glb(|buffer: &mut BufferBuilder| {
        let mut primitive = quad().build(buffer);
        let view = buffer.push_view(bytemuck::cast_slice(&QUAD_POSITIONS), None, None);
        // count large enough that the byte span overflows usize
        primitive.positions = buffer.push_accessor(
            view,
            0,
            ComponentType::F32,
            "VEC3",
            (1usize << 62) + 1,
            false,
            Some((vec![-1.0; 3], vec![1.0; 3])),
        );
        primitive
    });
    let err = import_with(&glb, ImportOptions::default()).unwrap_err();
    assert!(
        matches!(err, ImportError::AccessorOutOfBounds { needed: usize::MAX, .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn test_accessor_past_view_end_rejected() {
    let glb = single_primitive_glb(|buffer: &mut BufferBuilder| {
        let mut primitive = quad().build(buffer);
        let view = buffer.push_view(bytemuck::cast_slice(&QUAD_NORMALS), None, None);
        primitive.normals = Some(buffer.push_accessor(
            view,
            12,
            ComponentType::F32,
            "VEC3",
            QUAD_NORMALS.len(),
            false,
            None,
        ));
        primitive
    });
    let err = import_with(&glb, ImportOptions::default()).unwrap_err();
    assert!(
        matches!(err, ImportError::AccessorOutOfBounds { needed: 60, available: 48, .. }),
        "unexpected error: {err}"
    );
}

// ============================================================================
// Materials and textures
// ============================================================================

#[test]
fn test_material_texture_slots() {
    let scene = import(&textured_glb());
    assert_eq!(scene.materials.len(), 3);

    let wood = read_material_info(&scene.materials[0].container).unwrap();
    assert_eq!(scene.materials[0].path, "props/test_GLTF/MAT_0_Wood.mat");
    assert_eq!(wood.base_effect, "defaultPBR");
    assert_eq!(wood.textures[slots::BASE_COLOR], "props/textures/wood.tx");
    assert_eq!(
        wood.textures[slots::NORMALS],
        "props/test_GLTF/TEX_1_wood_normal.tx"
    );
    assert_eq!(wood.textures[slots::OCCLUSION], wood.textures[slots::NORMALS]);
    assert!(!wood.textures.contains_key(slots::EMISSIVE));
    assert_eq!(wood.transparency, TransparencyMode::Opaque);
    assert_eq!(wood.custom_properties["alpha_cutoff"], "0.25");
    assert_eq!(wood.custom_properties["metallic_factor"], "0");
}

#[test]
fn test_blend_material_and_data_uri() {
    let scene = import(&textured_glb());
    let glass = read_material_info(&scene.materials[1].container).unwrap();

    assert_eq!(glass.transparency, TransparencyMode::Transparent);
    // data URIs are not baked, the slot stays empty
    assert!(glass.textures.is_empty());
    assert_eq!(glass.custom_properties["double_sided"], "true");
    assert!(!glass.custom_properties.contains_key("alpha_cutoff"));
}

#[test]
fn test_default_material_created_on_demand() {
    let scene = import(&textured_glb());
    assert_eq!(scene.materials[2].path, "props/test_GLTF/MAT_DEFAULT.mat");

    let prefab = prefab(&scene);
    let mesh_for = |p: u64| prefab.node_meshes[&(1 + p)].material_path.clone();
    assert_eq!(mesh_for(0), "props/test_GLTF/MAT_0_Wood.mat");
    assert_eq!(mesh_for(2), "props/test_GLTF/MAT_DEFAULT.mat");
}

#[test]
fn test_embedded_image_baked_once() {
    let scene = import(&textured_glb());
    assert_eq!(scene.textures.len(), 1);

    let texture = &scene.textures[0];
    assert_eq!(texture.path, "props/test_GLTF/TEX_1_wood_normal.tx");
    let info = read_texture_info(&texture.container).unwrap();
    assert_eq!((info.width, info.height), (4, 4));
    assert_eq!(info.original_file, "props/test.glb#image1");
}

#[test]
fn test_write_creates_scene_directory() {
    let dir = tempfile::tempdir().unwrap();
    let scene = import(&textured_glb());
    scene.write(dir.path()).unwrap();

    let scene_dir = dir.path().join("props/test_GLTF");
    for name in [
        "test.pfb",
        "MAT_0_Wood.mat",
        "MAT_1_Glass.mat",
        "MAT_DEFAULT.mat",
        "TEX_1_wood_normal.tx",
        "MESH_0_Panels_PRIM_0.mesh",
        "MESH_0_Panels_PRIM_2.mesh",
    ] {
        assert!(scene_dir.join(name).is_file(), "missing {name}");
    }
    let container = kiln_common::read_container(&scene_dir.join("test.pfb")).unwrap();
    assert_eq!(container, scene.prefab.container);
}
