//! Application loop
//!
//! Builds every GPU resource once on the first `resumed`, then draws the quad
//! twice per redraw (objects A and B) under the debug overlay.

use anyhow::{Context, Result};
use tracing::{debug, error, info, trace};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowId;

use crate::config::{Config, ResourceConfig};
use crate::overlay::Overlay;
use crate::renderer::buffers::{IndexBuffer, VertexArray, VertexBuffer};
use crate::renderer::gl_context::GlContext;
use crate::renderer::layout::VertexBufferLayout;
use crate::renderer::shader::Shader;
use crate::renderer::texture::Texture;
use crate::renderer::{gl_check, Renderer};
use crate::scene::{Scene, Translations, QUAD_INDICES, QUAD_VERTICES};

/// Lifecycle of the application; transitions only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Initializing,
    Running,
    ShuttingDown,
}

impl AppState {
    /// Enter `Running`; only valid from `Initializing`
    pub fn start(&mut self) -> bool {
        if *self == Self::Initializing {
            *self = Self::Running;
            true
        } else {
            false
        }
    }

    /// Enter `ShuttingDown`; returns true only the first time
    pub fn begin_shutdown(&mut self) -> bool {
        if *self == Self::ShuttingDown {
            false
        } else {
            *self = Self::ShuttingDown;
            true
        }
    }
}

/// Everything that lives on the GL context
///
/// Fields drop top to bottom: GL objects first, the context last.
struct Graphics {
    overlay: Overlay,
    renderer: Renderer,
    shader: Shader,
    texture: Texture,
    index_buffer: IndexBuffer,
    vertex_array: VertexArray,
    /// Held for the VAO; never bound again after setup
    _vertex_buffer: VertexBuffer,
    context: GlContext,
}

impl Graphics {
    fn new(event_loop: &ActiveEventLoop, config: &Config) -> Result<Self> {
        let context = GlContext::new(event_loop, &config.window, &config.gl)?;

        let vertex_array = VertexArray::new();
        let vertex_buffer = VertexBuffer::new(&QUAD_VERTICES);

        let mut layout = VertexBufferLayout::new();
        layout.push::<f32>(2).push::<f32>(2);
        vertex_array.add_buffer(&vertex_buffer, &layout);

        let index_buffer = IndexBuffer::new(&QUAD_INDICES);

        let shader_path = ResourceConfig::resolve(&config.resources.shader);
        let mut shader = Shader::new(&shader_path)
            .with_context(|| format!("Failed to build shader from {:?}", shader_path))?;
        shader.bind();
        info!("Shader program ready from {:?}", shader.path());

        let texture_path = ResourceConfig::resolve(&config.resources.texture);
        let texture = Texture::new(&texture_path)
            .with_context(|| format!("Failed to load texture {:?}", texture_path))?;
        texture.bind(0);
        shader.set_uniform_1i("uTexture", 0);
        info!(
            "Texture ready from {:?} ({}x{}, {} bpp)",
            texture.path(),
            texture.width(),
            texture.height(),
            texture.bpp()
        );

        // VAO first so unbinding the index buffer does not detach it
        vertex_array.unbind();
        vertex_buffer.unbind();
        index_buffer.unbind();
        shader.unbind();
        texture.unbind();
        gl_check("resource creation");

        let renderer = Renderer::new(config.overlay.clear_color);
        let overlay = Overlay::new(event_loop, context.glow.clone());

        Ok(Self {
            overlay,
            renderer,
            shader,
            texture,
            index_buffer,
            vertex_array,
            _vertex_buffer: vertex_buffer,
            context,
        })
    }
}

pub struct App {
    config: Config,
    state: AppState,
    scene: Scene,
    translations: Translations,
    graphics: Option<Graphics>,
    error: Option<anyhow::Error>,
    frames: u64,
}

impl App {
    pub fn new(config: Config) -> Self {
        let scene = Scene::new(config.window.width, config.window.height);
        Self {
            config,
            state: AppState::Initializing,
            scene,
            translations: Translations::default(),
            graphics: None,
            error: None,
            frames: 0,
        }
    }

    /// Outcome of the run: the error that stopped the loop, if any
    pub fn finish(self) -> Result<()> {
        info!("Rendered {} frames", self.frames);
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        error!("{:#}", e);
        if self.error.is_none() {
            self.error = Some(e);
        }
        event_loop.exit();
    }

    fn render_frame(&mut self) -> Result<()> {
        let Some(gfx) = self.graphics.as_mut() else {
            return Ok(());
        };

        gfx.renderer.clear();

        gfx.shader.bind();
        gfx.texture.bind(0);

        let mvp_a = self.scene.mvp(self.translations.a);
        gfx.shader.set_uniform_mat4f("uMVP", &mvp_a);
        gfx.renderer.draw(&gfx.vertex_array, &gfx.index_buffer, &gfx.shader);

        let mvp_b = self.scene.mvp(self.translations.b);
        gfx.shader.set_uniform_mat4f("uMVP", &mvp_b);

        gfx.overlay.run(&gfx.context.window, &mut self.translations, self.scene.slider_max());

        gfx.renderer.draw(&gfx.vertex_array, &gfx.index_buffer, &gfx.shader);

        gfx.overlay.paint(&gfx.context.window);

        gfx.context.swap_buffers()?;
        gfx.context.window.request_redraw();

        self.frames += 1;
        trace!("Frame {} presented", self.frames);
        Ok(())
    }

    /// Tear down overlay, GPU resources and context; runs at most once
    fn shutdown(&mut self) {
        if !self.state.begin_shutdown() {
            return;
        }
        info!("Shutting down");
        if let Some(mut gfx) = self.graphics.take() {
            gfx.overlay.destroy();
            gfx.vertex_array.unbind();
            gfx.shader.unbind();
            gfx.index_buffer.unbind();
            drop(gfx);
            debug!("GPU resources released");
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state != AppState::Initializing {
            return;
        }

        match Graphics::new(event_loop, &self.config) {
            Ok(gfx) => {
                self.state.start();
                gfx.context.window.request_redraw();
                self.graphics = Some(gfx);
                info!("Running");
            }
            Err(e) => self.fail(event_loop, e.context("Startup failed")),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let consumed = match self.graphics.as_mut() {
            Some(gfx) => gfx.overlay.on_window_event(&gfx.context.window, &event),
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                info!("Window close requested");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } if !consumed => {
                info!("Escape pressed");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(gfx) = self.graphics.as_ref() {
                    gfx.context.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render_frame() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_moves_forward() {
        let mut state = AppState::Initializing;
        assert!(state.start());
        assert_eq!(state, AppState::Running);
        assert!(!state.start());
        assert!(state.begin_shutdown());
        assert_eq!(state, AppState::ShuttingDown);
    }

    #[test]
    fn test_shutdown_happens_once() {
        let mut state = AppState::Running;
        assert!(state.begin_shutdown());
        assert!(!state.begin_shutdown());
        assert!(!state.start());
        assert_eq!(state, AppState::ShuttingDown);
    }

    #[test]
    fn test_shutdown_without_window() {
        let mut app = App::new(Config::default());
        app.shutdown();
        assert_eq!(app.state, AppState::ShuttingDown);
        app.shutdown();
        assert!(app.graphics.is_none());
        assert!(app.finish().is_ok());
    }

    #[test]
    fn test_new_app_uses_configured_window_height() {
        let mut config = Config::default();
        config.window.height = 400;
        let app = App::new(config);
        assert_eq!(app.scene.slider_max(), 300.0);
        assert_eq!(app.translations, Translations::default());
    }
}
