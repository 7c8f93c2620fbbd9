//! Utility functions for GLB construction

use serde_json::Value;

/// Compute bounding box for positions
pub fn compute_bounds(positions: &[[f32; 3]]) -> (Vec<f32>, Vec<f32>) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];

    for pos in positions {
        for i in 0..3 {
            min[i] = min[i].min(pos[i]);
            max[i] = max[i].max(pos[i]);
        }
    }

    (min.to_vec(), max.to_vec())
}

/// Align buffer to 4-byte boundary
pub fn align_buffer(buffer: &mut Vec<u8>) {
    while buffer.len() % 4 != 0 {
        buffer.push(0);
    }
}

/// Assemble GLB binary from JSON and buffer data
pub fn assemble_glb(root: &Value, buffer_data: &[u8]) -> Vec<u8> {
    let json_string = root.to_string();
    let json_bytes = json_string.as_bytes();

    // Pad JSON to 4-byte alignment
    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let json_chunk_length = json_bytes.len() + json_padding;

    // Pad buffer to 4-byte alignment
    let buffer_padding = (4 - (buffer_data.len() % 4)) % 4;
    let buffer_chunk_length = buffer_data.len() + buffer_padding;

    let has_binary = !buffer_data.is_empty();
    let binary_chunk_length = if has_binary { 8 + buffer_chunk_length } else { 0 };
    let total_length = 12 + 8 + json_chunk_length + binary_chunk_length;

    let mut glb = Vec::with_capacity(total_length);

    // GLB header
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes()); // version
    glb.extend_from_slice(&(total_length as u32).to_le_bytes());

    // JSON chunk
    glb.extend_from_slice(&(json_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&0x4E4F534Au32.to_le_bytes()); // "JSON"
    glb.extend_from_slice(json_bytes);
    glb.extend(std::iter::repeat_n(0x20, json_padding)); // Space for JSON padding

    // Binary chunk
    if has_binary {
        glb.extend_from_slice(&(buffer_chunk_length as u32).to_le_bytes());
        glb.extend_from_slice(&0x004E4942u32.to_le_bytes()); // "BIN\0"
        glb.extend_from_slice(buffer_data);
        glb.extend(std::iter::repeat_n(0, buffer_padding));
    }

    glb
}
