//! Vertex buffer layout description
//!
//! A layout is an ordered list of attributes. Attribute `i` in the list is bound
//! to shader location `i`, and its byte offset is the sum of the sizes of the
//! attributes pushed before it.

/// Scalar types that can be used as vertex attribute components
pub trait VertexAttribType {
    /// GL enum for the component type (`gl::FLOAT`, ...)
    const GL_TYPE: u32;
    /// Whether integer data is normalized to `[0, 1]` when fetched as float
    const NORMALIZED: bool;
}

impl VertexAttribType for f32 {
    const GL_TYPE: u32 = gl::FLOAT;
    const NORMALIZED: bool = false;
}

impl VertexAttribType for u32 {
    const GL_TYPE: u32 = gl::UNSIGNED_INT;
    const NORMALIZED: bool = false;
}

impl VertexAttribType for u8 {
    const GL_TYPE: u32 = gl::UNSIGNED_BYTE;
    const NORMALIZED: bool = true;
}

/// One attribute of a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBufferElement {
    pub gl_type: u32,
    pub count: u32,
    pub normalized: bool,
    /// Byte offset from the start of the vertex
    pub offset: u32,
}

impl VertexBufferElement {
    /// Size in bytes of one component of the given GL type
    pub fn size_of_type(gl_type: u32) -> u32 {
        match gl_type {
            gl::FLOAT | gl::UNSIGNED_INT => 4,
            gl::UNSIGNED_BYTE => 1,
            _ => 0,
        }
    }

    /// Size in bytes of the whole attribute
    pub fn size(&self) -> u32 {
        self.count * Self::size_of_type(self.gl_type)
    }
}

/// Interleaved vertex layout built with [`VertexBufferLayout::push`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexBufferLayout {
    elements: Vec<VertexBufferElement>,
    stride: u32,
}

impl VertexBufferLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute of `count` components of type `T`
    pub fn push<T: VertexAttribType>(&mut self, count: u32) -> &mut Self {
        let element = VertexBufferElement {
            gl_type: T::GL_TYPE,
            count,
            normalized: T::NORMALIZED,
            offset: self.stride,
        };
        self.stride += element.size();
        self.elements.push(element);
        self
    }

    pub fn elements(&self) -> &[VertexBufferElement] {
        &self.elements
    }

    /// Bytes between the starts of two consecutive vertices
    pub fn stride(&self) -> u32 {
        self.stride
    }
}
