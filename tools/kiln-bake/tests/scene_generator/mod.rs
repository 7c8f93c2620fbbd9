//! Programmatic scene generation for integration tests.
//!
//! Every generator returns GLB bytes built with `glb-builder`.

#![allow(dead_code)]

use glb_builder::{BufferBuilder, GltfBuilder, Material, MeshBuilder, Node, PrimitiveAccessors};

pub const QUAD_POSITIONS: [[f32; 3]; 4] = [
    [-1.0, -1.0, 0.0],
    [1.0, -1.0, 0.0],
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
];
pub const QUAD_NORMALS: [[f32; 3]; 4] = [[0.0, 0.0, 1.0]; 4];
pub const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

pub const SIX_VERTEX_INDICES: [u32; 6] = [0, 1, 2, 3, 4, 5];

/// Translation and rotation used for the hierarchy root.
pub const ROOT_TRANSLATION: [f32; 3] = [1.0, 2.0, 3.0];
pub const ROOT_ROTATION_Y: f32 = 0.5;

/// Explicit matrix on the middle node: translate (0, 5, 0), column-major.
pub const MIDDLE_MATRIX: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 5.0, 0.0, 1.0,
];

pub const LEAF_TRANSLATION: [f32; 3] = [0.0, 0.0, -2.0];
pub const LEAF_SCALE: [f32; 3] = [2.0, 2.0, 2.0];

pub fn quad() -> MeshBuilder {
    MeshBuilder::new()
        .positions(&QUAD_POSITIONS)
        .normals(&QUAD_NORMALS)
        .uvs(&QUAD_UVS)
        .indices(&QUAD_INDICES)
}

pub fn quad_primitive(buffer: &mut BufferBuilder, material: Option<u32>) -> PrimitiveAccessors {
    let mut builder = quad();
    if let Some(material) = material {
        builder = builder.material(material);
    }
    builder.build(buffer)
}

/// Quaternion `[x, y, z, w]` for a rotation of `angle` radians about Y.
pub fn rotation_y(angle: f32) -> [f32; 4] {
    let half = angle * 0.5;
    [0.0, half.sin(), 0.0, half.cos()]
}

/// Three-node chain: Root (TRS) -> Middle (matrix) -> Leaf (TRS, with mesh).
pub fn hierarchy_glb() -> Vec<u8> {
    let mut buffer = BufferBuilder::new();
    let primitive = quad_primitive(&mut buffer, None);

    let mut gltf = GltfBuilder::new();
    let mesh = gltf.add_mesh("Quad", &[primitive]);
    let root = gltf.add_node(
        Node::new()
            .name("Root")
            .translation(ROOT_TRANSLATION)
            .rotation(rotation_y(ROOT_ROTATION_Y))
            .children(&[1]),
    );
    gltf.add_node(Node::new().name("Middle").matrix(MIDDLE_MATRIX).children(&[2]));
    gltf.add_node(
        Node::new()
            .name("Leaf")
            .translation(LEAF_TRANSLATION)
            .scale(LEAF_SCALE)
            .mesh(mesh),
    );
    gltf.scene(&[root]);
    gltf.build_glb(&buffer)
}

/// One mesh with two primitives on a named root node, plus an unrelated root.
///
/// Primitive 0 uses material 0 ("Red"), primitive 1 uses material 1 ("Blue").
pub fn multi_primitive_glb() -> Vec<u8> {
    let mut buffer = BufferBuilder::new();
    let first = quad_primitive(&mut buffer, Some(0));
    let second = quad_primitive(&mut buffer, Some(1));
    let single = quad_primitive(&mut buffer, Some(0));

    let mut gltf = GltfBuilder::new();
    gltf.add_material(&Material {
        base_color_factor: Some([1.0, 0.0, 0.0, 1.0]),
        ..Material::named("Red")
    });
    gltf.add_material(&Material {
        base_color_factor: Some([0.0, 0.0, 1.0, 1.0]),
        ..Material::named("Blue")
    });
    let split = gltf.add_mesh("Body", &[first, second]);
    let plain = gltf.add_mesh("Plate", &[single]);

    let body = gltf.add_node(
        Node::new()
            .name("Robot")
            .translation([0.0, 1.0, 0.0])
            .mesh(split),
    );
    let plate = gltf.add_node(Node::new().name("Plate").mesh(plain));
    gltf.scene(&[body, plate]);
    gltf.build_glb(&buffer)
}

/// A single un-indexed primitive with six vertices (two triangles) and explicit indices.
pub fn six_vertex_glb(indices: Option<&[u32]>) -> Vec<u8> {
    let positions: Vec<[f32; 3]> = (0..6).map(|i| [i as f32, 0.0, 0.0]).collect();
    let mut buffer = BufferBuilder::new();
    let mut builder = MeshBuilder::new()
        .positions(&positions)
        .normals(&[[0.0, 1.0, 0.0]; 6])
        .uvs(&[[0.0, 0.0]; 6]);
    if let Some(indices) = indices {
        builder = builder.indices(indices);
    }
    let primitive = builder.build(&mut buffer);

    let mut gltf = GltfBuilder::new();
    let mesh = gltf.add_mesh("Strip", &[primitive]);
    gltf.add_node(Node::new().name("Strip").mesh(mesh));
    gltf.build_glb(&buffer)
}

/// Wrap a single primitive in a one-node scene.
pub fn single_primitive_glb(
    build: impl FnOnce(&mut BufferBuilder) -> PrimitiveAccessors,
) -> Vec<u8> {
    let mut buffer = BufferBuilder::new();
    let primitive = build(&mut buffer);
    let mut gltf = GltfBuilder::new();
    let mesh = gltf.add_mesh("Mesh", &[primitive]);
    gltf.add_node(Node::new().name("Node").mesh(mesh));
    gltf.build_glb(&buffer)
}

/// Encode a small RGBA gradient as PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x * 16) as u8, (y * 16) as u8, 200, 255])
    });
    let mut cursor = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, image::ImageFormat::Png)
        .expect("Failed to encode PNG");
    cursor.into_inner()
}

/// Encode a flat RGB color as JPEG.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([90, 120, 30]));
    let mut cursor = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, image::ImageFormat::Jpeg)
        .expect("Failed to encode JPEG");
    cursor.into_inner()
}

/// Materials exercising every texture source kind.
///
/// - material 0 "Wood": external base color (`textures/wood.png`), embedded normal map, MASK
/// - material 1 "Glass": data-URI base color, BLEND, double sided
/// - a third primitive has no material
pub fn textured_glb() -> Vec<u8> {
    let mut buffer = BufferBuilder::new();
    let wood_prim = quad_primitive(&mut buffer, Some(0));
    let glass_prim = quad_primitive(&mut buffer, Some(1));
    let bare_prim = quad_primitive(&mut buffer, None);
    let embedded_view = buffer.pack_image(&png_bytes(4, 4));

    let mut gltf = GltfBuilder::new();
    let external = gltf.add_image_uri("textures/wood.png");
    let embedded = gltf.add_image_view("wood_normal", embedded_view, "image/png");
    let data_uri = gltf.add_image_uri("data:image/png;base64,iVBORw0KGgo=");
    let external_tex = gltf.add_texture(external);
    let embedded_tex = gltf.add_texture(embedded);
    let data_tex = gltf.add_texture(data_uri);
    // second texture on the same embedded image; must not be baked twice
    let embedded_again = gltf.add_texture(embedded);

    gltf.add_material(&Material {
        base_color_texture: Some(external_tex),
        normal_texture: Some(embedded_tex),
        occlusion_texture: Some(embedded_again),
        alpha_mode: Some("MASK"),
        alpha_cutoff: Some(0.25),
        metallic_factor: Some(0.0),
        ..Material::named("Wood")
    });
    gltf.add_material(&Material {
        base_color_texture: Some(data_tex),
        alpha_mode: Some("BLEND"),
        double_sided: true,
        ..Material::named("Glass")
    });

    let mesh = gltf.add_mesh("Panels", &[wood_prim, glass_prim, bare_prim]);
    gltf.add_node(Node::new().name("Panels").mesh(mesh));
    gltf.build_glb(&buffer)
}

/// One quad with a material whose base color is the external image `uri`, written as given.
pub fn external_texture_glb(uri: &str) -> Vec<u8> {
    let mut buffer = BufferBuilder::new();
    let primitive = quad_primitive(&mut buffer, Some(0));

    let mut gltf = GltfBuilder::new();
    let image = gltf.add_image_uri(uri);
    let texture = gltf.add_texture(image);
    gltf.add_material(&Material {
        base_color_texture: Some(texture),
        ..Material::named("Painted")
    });
    let mesh = gltf.add_mesh("Panel", &[primitive]);
    gltf.add_node(Node::new().name("Panel").mesh(mesh));
    gltf.build_glb(&buffer)
}
