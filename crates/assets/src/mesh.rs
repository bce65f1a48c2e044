use fbscene_math::{Transform, Vec3};

use crate::AssetError;

/// Uniform scale given to every mesh's model transform.
pub const DEFAULT_MODEL_SCALE: f32 = 3.0;

/// Triangle mesh ready for upload: separate attribute streams plus `u32` indices.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Option<Vec<[f32; 2]>>,
    pub indices: Vec<u32>,
    pub transform: Transform,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Check that every index references an existing vertex.
    pub fn validate(&self) -> Result<(), AssetError> {
        let vertices = self.positions.len();
        match self.indices.iter().find(|&&i| i as usize >= vertices) {
            Some(&index) => Err(AssetError::IndexOutOfRange { index, vertices }),
            None => Ok(()),
        }
    }

    /// Axis-aligned bounds as `(min, max)`. `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = self.positions.first()?;
        let init = (Vec3::new(first[0], first[1], first[2]), Vec3::new(first[0], first[1], first[2]));
        Some(self.positions.iter().fold(init, |(lo, hi), p| {
            (
                Vec3::new(lo.x.min(p[0]), lo.y.min(p[1]), lo.z.min(p[2])),
                Vec3::new(hi.x.max(p[0]), hi.y.max(p[1]), hi.z.max(p[2])),
            )
        }))
    }
}

/// Unit cube centred at the origin with per-face normals: 24 vertices, 36 indices.
pub fn debug_cuboid() -> MeshData {
    let p = 0.5_f32;
    #[rustfmt::skip]
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        // +Z face
        ([0.0, 0.0, 1.0],  [[-p, -p,  p], [ p, -p,  p], [ p,  p,  p], [-p,  p,  p]]),
        // -Z face
        ([0.0, 0.0, -1.0], [[ p, -p, -p], [-p, -p, -p], [-p,  p, -p], [ p,  p, -p]]),
        // +X face
        ([1.0, 0.0, 0.0],  [[ p, -p,  p], [ p, -p, -p], [ p,  p, -p], [ p,  p,  p]]),
        // -X face
        ([-1.0, 0.0, 0.0], [[-p, -p, -p], [-p, -p,  p], [-p,  p,  p], [-p,  p, -p]]),
        // +Y face
        ([0.0, 1.0, 0.0],  [[-p,  p,  p], [ p,  p,  p], [ p,  p, -p], [-p,  p, -p]]),
        // -Y face
        ([0.0, -1.0, 0.0], [[-p, -p, -p], [ p, -p, -p], [ p, -p,  p], [-p, -p,  p]]),
    ];

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut texcoords = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, corners) in faces {
        let base = positions.len() as u32;
        positions.extend_from_slice(&corners);
        normals.extend_from_slice(&[normal; 4]);
        texcoords.extend_from_slice(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    MeshData {
        positions,
        normals,
        texcoords: Some(texcoords),
        indices,
        transform: Transform::uniform(DEFAULT_MODEL_SCALE),
    }
}
