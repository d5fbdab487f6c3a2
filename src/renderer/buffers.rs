//! GPU buffer objects: vertex buffer, index buffer and vertex array

use tracing::debug;

use super::layout::VertexBufferLayout;

/// Vertex data uploaded once with `STATIC_DRAW`
pub struct VertexBuffer {
    id: u32,
    size: usize,
}

impl VertexBuffer {
    pub fn new<T: bytemuck::Pod>(data: &[T]) -> Self {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let mut id = 0;
        unsafe {
            gl::GenBuffers(1, &mut id);
            gl::BindBuffer(gl::ARRAY_BUFFER, id);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                bytes.len() as isize,
                bytes.as_ptr() as *const _,
                gl::STATIC_DRAW,
            );
        }
        debug!("Created vertex buffer {} ({} bytes)", id, bytes.len());

        Self { id, size: bytes.len() }
    }

    pub fn bind(&self) {
        unsafe { gl::BindBuffer(gl::ARRAY_BUFFER, self.id) };
    }

    pub fn unbind(&self) {
        unsafe { gl::BindBuffer(gl::ARRAY_BUFFER, 0) };
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl Drop for VertexBuffer {
    fn drop(&mut self) {
        debug!("Deleting vertex buffer {}", self.id);
        unsafe { gl::DeleteBuffers(1, &self.id) };
    }
}

/// `u32` index data for `glDrawElements`
pub struct IndexBuffer {
    id: u32,
    count: usize,
}

impl IndexBuffer {
    pub fn new(indices: &[u32]) -> Self {
        let mut id = 0;
        unsafe {
            gl::GenBuffers(1, &mut id);
            gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, id);
            gl::BufferData(
                gl::ELEMENT_ARRAY_BUFFER,
                std::mem::size_of_val(indices) as isize,
                indices.as_ptr() as *const _,
                gl::STATIC_DRAW,
            );
        }
        debug!("Created index buffer {} ({} indices)", id, indices.len());

        Self { id, count: indices.len() }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn bind(&self) {
        unsafe { gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, self.id) };
    }

    pub fn unbind(&self) {
        unsafe { gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, 0) };
    }
}

impl Drop for IndexBuffer {
    fn drop(&mut self) {
        debug!("Deleting index buffer {}", self.id);
        unsafe { gl::DeleteBuffers(1, &self.id) };
    }
}

/// Vertex array object tying vertex buffers to their layouts
pub struct VertexArray {
    id: u32,
}

impl VertexArray {
    pub fn new() -> Self {
        let mut id = 0;
        unsafe { gl::GenVertexArrays(1, &mut id) };
        debug!("Created vertex array {}", id);
        Self { id }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Record `layout` as the attribute format of `buffer` in this VAO
    pub fn add_buffer(&self, buffer: &VertexBuffer, layout: &VertexBufferLayout) {
        self.bind();
        buffer.bind();
        debug!(
            "Vertex array {}: {} attributes over {} bytes, stride {}",
            self.id,
            layout.elements().len(),
            buffer.size(),
            layout.stride()
        );

        let stride = layout.stride() as i32;
        for (index, element) in layout.elements().iter().enumerate() {
            let index = index as u32;
            let normalized = if element.normalized { gl::TRUE } else { gl::FALSE };
            unsafe {
                gl::EnableVertexAttribArray(index);
                gl::VertexAttribPointer(
                    index,
                    element.count as i32,
                    element.gl_type,
                    normalized,
                    stride,
                    element.offset as usize as *const _,
                );
            }
        }
    }

    pub fn bind(&self) {
        unsafe { gl::BindVertexArray(self.id) };
    }

    pub fn unbind(&self) {
        unsafe { gl::BindVertexArray(0) };
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        debug!("Deleting vertex array {}", self.id);
        unsafe { gl::DeleteVertexArrays(1, &self.id) };
    }
}
