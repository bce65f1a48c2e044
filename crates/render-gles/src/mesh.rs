use fbscene_assets::MeshData;
use glow::HasContext;

use crate::RenderError;
use crate::program::{ATTRIB_NORMAL, ATTRIB_POSITION, ATTRIB_TEXCOORD};

/// The buffer-object calls a mesh needs. Implemented for [`glow::Context`];
/// kept narrow so mesh bookkeeping can be checked without a GPU.
pub trait BufferApi {
    type Buffer: Copy + std::fmt::Debug + PartialEq;

    fn alloc_buffer(&self) -> Result<Self::Buffer, RenderError>;
    /// Fill `buffer` as a static vertex attribute stream.
    fn upload_array(&self, buffer: Self::Buffer, bytes: &[u8]);
    /// Fill `buffer` as a static index stream.
    fn upload_elements(&self, buffer: Self::Buffer, bytes: &[u8]);
    /// Source attribute `index` from tightly packed floats in `buffer`.
    fn bind_attribute(&self, buffer: Self::Buffer, index: u32, components: i32);
    fn disable_attribute(&self, index: u32);
    fn bind_elements(&self, buffer: Self::Buffer);
    /// Draw `count` `u32` indices from the bound element buffer as triangles.
    fn draw_triangles_u32(&self, count: i32);
    fn free_buffer(&self, buffer: Self::Buffer);
}

impl BufferApi for glow::Context {
    type Buffer = glow::Buffer;

    fn alloc_buffer(&self) -> Result<glow::Buffer, RenderError> {
        // SAFETY: object creation on the current context.
        unsafe { self.create_buffer() }.map_err(RenderError::Gl)
    }

    fn upload_array(&self, buffer: glow::Buffer, bytes: &[u8]) {
        // SAFETY: `buffer` belongs to the current context; `bytes` outlives the call.
        unsafe {
            self.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytes, glow::STATIC_DRAW);
            self.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    fn upload_elements(&self, buffer: glow::Buffer, bytes: &[u8]) {
        // SAFETY: as above.
        unsafe {
            self.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer));
            self.buffer_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, bytes, glow::STATIC_DRAW);
            self.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);
        }
    }

    fn bind_attribute(&self, buffer: glow::Buffer, index: u32, components: i32) {
        // SAFETY: offset 0 into a buffer holding `components` floats per vertex.
        unsafe {
            self.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, 0, 0);
            self.enable_vertex_attrib_array(index);
        }
    }

    fn disable_attribute(&self, index: u32) {
        // SAFETY: plain state change.
        unsafe { self.disable_vertex_attrib_array(index) };
    }

    fn bind_elements(&self, buffer: glow::Buffer) {
        // SAFETY: `buffer` belongs to the current context.
        unsafe { self.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer)) };
    }

    fn draw_triangles_u32(&self, count: i32) {
        // SAFETY: the bound element buffer holds at least `count` in-range indices.
        unsafe { self.draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_INT, 0) };
    }

    fn free_buffer(&self, buffer: glow::Buffer) {
        // SAFETY: the buffer is not used again.
        unsafe { self.delete_buffer(buffer) };
    }
}

/// A mesh resident in GPU buffers. Release it with [`GpuMesh::release`]
/// while the context that created it is still current.
#[derive(Debug)]
pub struct GpuMesh<A: BufferApi> {
    positions: A::Buffer,
    normals: A::Buffer,
    texcoords: Option<A::Buffer>,
    indices: A::Buffer,
    index_count: i32,
    vertex_count: usize,
}

impl<A: BufferApi> GpuMesh<A> {
    /// Upload every stream of `mesh`. Fails before touching the GPU when the
    /// mesh has nothing to draw; on a later failure the buffers created so
    /// far are freed.
    pub fn upload(api: &A, mesh: &MeshData) -> Result<Self, RenderError> {
        if mesh.positions.is_empty() || mesh.indices.is_empty() {
            return Err(RenderError::EmptyMesh);
        }
        let index_count = i32::try_from(mesh.indices.len())
            .map_err(|_| RenderError::Gl(format!("{} indices exceed a single draw", mesh.indices.len())))?;

        let mut created = Vec::with_capacity(4);
        match Self::upload_streams(api, mesh, index_count, &mut created) {
            Ok(gpu) => {
                tracing::debug!(
                    vertices = gpu.vertex_count,
                    indices = index_count,
                    texcoords = gpu.texcoords.is_some(),
                    "mesh uploaded"
                );
                Ok(gpu)
            }
            Err(e) => {
                for buffer in created.into_iter().rev() {
                    api.free_buffer(buffer);
                }
                Err(e)
            }
        }
    }

    fn upload_streams(
        api: &A,
        mesh: &MeshData,
        index_count: i32,
        created: &mut Vec<A::Buffer>,
    ) -> Result<Self, RenderError> {
        let mut stream = |bytes: &[u8], elements: bool| -> Result<A::Buffer, RenderError> {
            let buffer = api.alloc_buffer()?;
            created.push(buffer);
            if elements {
                api.upload_elements(buffer, bytes);
            } else {
                api.upload_array(buffer, bytes);
            }
            Ok(buffer)
        };

        let positions = stream(bytemuck::cast_slice(mesh.positions.as_slice()), false)?;
        let normals = stream(bytemuck::cast_slice(mesh.normals.as_slice()), false)?;
        let texcoords = match &mesh.texcoords {
            Some(tc) => Some(stream(bytemuck::cast_slice(tc.as_slice()), false)?),
            None => None,
        };
        let indices = stream(bytemuck::cast_slice(mesh.indices.as_slice()), true)?;

        Ok(Self {
            positions,
            normals,
            texcoords,
            indices,
            index_count,
            vertex_count: mesh.positions.len(),
        })
    }

    pub fn index_count(&self) -> usize {
        self.index_count as usize
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn has_texcoords(&self) -> bool {
        self.texcoords.is_some()
    }

    /// Bind the streams to the fixed attribute locations and draw.
    pub fn draw(&self, api: &A) {
        api.bind_attribute(self.positions, ATTRIB_POSITION, 3);
        api.bind_attribute(self.normals, ATTRIB_NORMAL, 3);
        match self.texcoords {
            Some(tc) => api.bind_attribute(tc, ATTRIB_TEXCOORD, 2),
            None => api.disable_attribute(ATTRIB_TEXCOORD),
        }
        api.bind_elements(self.indices);
        api.draw_triangles_u32(self.index_count);
    }

    pub fn release(self, api: &A) {
        for index in [ATTRIB_POSITION, ATTRIB_NORMAL, ATTRIB_TEXCOORD] {
            api.disable_attribute(index);
        }
        api.free_buffer(self.indices);
        if let Some(tc) = self.texcoords {
            api.free_buffer(tc);
        }
        api.free_buffer(self.normals);
        api.free_buffer(self.positions);
    }
}
