use std::path::Path;

use fbscene_math::Transform;

use crate::AssetError;
use crate::mesh::{DEFAULT_MODEL_SCALE, MeshData};

/// Normal assigned to every vertex of a model that ships without normals.
const FALLBACK_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];

/// Load a Wavefront OBJ file as a single triangulated mesh.
///
/// All objects in the file are merged into one index space. Models without
/// normals get [`FALLBACK_NORMAL`]; texture coordinates are kept only when
/// every model provides them. Files with no vertices or no faces are rejected.
pub fn load_obj(path: impl AsRef<Path>) -> Result<MeshData, AssetError> {
    let path = path.as_ref();
    let _span = tracing::info_span!("load_obj", path = %path.display()).entered();

    let options = tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };
    let (models, materials) = tobj::load_obj(path, &options).map_err(|source| AssetError::Obj {
        path: path.to_path_buf(),
        source,
    })?;
    if let Err(e) = materials {
        tracing::debug!(error = %e, "ignoring materials");
    }

    let vertices: usize = models.iter().map(|m| m.mesh.positions.len() / 3).sum();
    let faces: usize = models.iter().map(|m| m.mesh.indices.len() / 3).sum();
    if vertices == 0 || faces == 0 {
        return Err(AssetError::Empty {
            path: path.to_path_buf(),
            vertices,
            faces,
        });
    }

    let keep_texcoords = models
        .iter()
        .all(|m| m.mesh.texcoords.len() / 2 == m.mesh.positions.len() / 3);

    let mut mesh = MeshData {
        positions: Vec::with_capacity(vertices),
        normals: Vec::with_capacity(vertices),
        texcoords: keep_texcoords.then(|| Vec::with_capacity(vertices)),
        indices: Vec::with_capacity(faces * 3),
        transform: Transform::uniform(DEFAULT_MODEL_SCALE),
    };

    for model in &models {
        let m = &model.mesh;
        let base = mesh.positions.len() as u32;
        let count = m.positions.len() / 3;

        mesh.positions
            .extend(m.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]));

        if m.normals.len() == m.positions.len() {
            mesh.normals
                .extend(m.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]));
        } else {
            tracing::warn!(model = %model.name, "model has no normals, using +Y");
            mesh.normals.extend(std::iter::repeat_n(FALLBACK_NORMAL, count));
        }

        if let Some(texcoords) = mesh.texcoords.as_mut() {
            texcoords.extend(m.texcoords.chunks_exact(2).map(|t| [t[0], t[1]]));
        }

        mesh.indices.extend(m.indices.iter().map(|i| i + base));
    }

    if mesh.texcoords.is_none() {
        tracing::warn!("mesh has no complete texture coordinates");
    }
    mesh.validate()?;

    tracing::info!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        models = models.len(),
        texcoords = mesh.texcoords.is_some(),
        "loaded OBJ mesh"
    );
    Ok(mesh)
}
