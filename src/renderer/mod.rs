//! OpenGL rendering backend
//!
//! Thin owners of GL objects plus a renderer that clears and issues indexed
//! draws.

pub mod buffers;
pub mod gl_context;
pub mod layout;
pub mod shader;
pub mod texture;

use std::ptr;
use tracing::{info, trace, warn};

use buffers::{IndexBuffer, VertexArray};
use shader::Shader;

/// One GL call on the draw path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCommand {
    UseProgram(u32),
    BindVertexArray(u32),
    BindIndexBuffer(u32),
    DrawElements { count: i32 },
}

impl DrawCommand {
    fn execute(self) {
        unsafe {
            match self {
                Self::UseProgram(program) => gl::UseProgram(program),
                Self::BindVertexArray(vao) => gl::BindVertexArray(vao),
                Self::BindIndexBuffer(ibo) => gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, ibo),
                Self::DrawElements { count } => {
                    gl::DrawElements(gl::TRIANGLES, count, gl::UNSIGNED_INT, ptr::null())
                }
            }
        }
    }
}

/// Clears the frame and draws indexed geometry
pub struct Renderer {
    clear_color: [f32; 4],
}

impl Renderer {
    pub fn new(clear_color: [f32; 4]) -> Self {
        Self::apply_blend();
        info!("OpenGL renderer initialized");

        Self { clear_color }
    }

    fn apply_blend() {
        unsafe {
            // Enable blending for transparency
            gl::Enable(gl::BLEND);
            gl::BlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA);
        }
    }

    /// Start a frame. Restores our blend state, since the overlay painter
    /// leaves its own behind.
    pub fn clear(&self) {
        Self::apply_blend();
        let [r, g, b, a] = self.clear_color;
        unsafe {
            gl::ClearColor(r, g, b, a);
            gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);
        }
    }

    pub fn draw(&self, vertex_array: &VertexArray, index_buffer: &IndexBuffer, shader: &Shader) {
        let commands = Self::draw_commands(
            vertex_array.id(),
            index_buffer.id(),
            index_buffer.count(),
            shader.id(),
        );
        trace!("Draw: {:?}", commands);
        for command in commands {
            command.execute();
        }
    }

    /// GL calls issued by [`Renderer::draw`] for the given object names
    pub fn draw_commands(vao: u32, ibo: u32, index_count: usize, program: u32) -> [DrawCommand; 4] {
        [
            DrawCommand::UseProgram(program),
            DrawCommand::BindVertexArray(vao),
            DrawCommand::BindIndexBuffer(ibo),
            DrawCommand::DrawElements { count: index_count as i32 },
        ]
    }
}

/// Drain and log pending GL errors; returns how many there were
pub fn gl_check(label: &str) -> usize {
    let mut count = 0;
    loop {
        let err = unsafe { gl::GetError() };
        if err == gl::NO_ERROR {
            break;
        }
        warn!("OpenGL error after {}: 0x{:x}", label, err);
        count += 1;
        // A lost context can report errors indefinitely
        if count >= 32 {
            break;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_commands_bind_then_draw() {
        let commands = Renderer::draw_commands(1, 2, 6, 3);
        assert_eq!(
            commands,
            [
                DrawCommand::UseProgram(3),
                DrawCommand::BindVertexArray(1),
                DrawCommand::BindIndexBuffer(2),
                DrawCommand::DrawElements { count: 6 },
            ]
        );
    }

    #[test]
    fn test_repeated_draw_is_identical() {
        let first = Renderer::draw_commands(7, 8, 6, 9);
        let second = Renderer::draw_commands(7, 8, 6, 9);
        assert_eq!(first, second);
    }

    #[test]
    fn test_draw_uses_full_index_count() {
        let commands = Renderer::draw_commands(1, 1, 36, 1);
        assert_eq!(commands.last(), Some(&DrawCommand::DrawElements { count: 36 }));
    }
}
