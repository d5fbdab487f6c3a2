//! Window and OpenGL 3.3 core context creation via winit + glutin

use anyhow::{Context, Result};
use glutin::config::ConfigTemplateBuilder;
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version,
};
use glutin::display::{Display, DisplayApiPreference};
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::{c_void, CStr, CString};
use std::num::NonZeroU32;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

use crate::config::{ContextConfig, WindowConfig};

/// Exit the process on any driver debug message
static STRICT_DEBUG: AtomicBool = AtomicBool::new(false);

extern "system" fn debug_message_callback(
    source: u32,
    gltype: u32,
    id: u32,
    severity: u32,
    _length: i32,
    message: *const std::os::raw::c_char,
    _user_param: *mut c_void,
) {
    let text = if message.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(message) }.to_string_lossy().into_owned()
    };

    if STRICT_DEBUG.load(Ordering::Relaxed) {
        error!(
            "Message from OpenGL: source=0x{:x} type=0x{:x} id=0x{:x} severity=0x{:x}: {}",
            source, gltype, id, severity, text
        );
        std::process::exit(-1);
    }

    match severity {
        gl::DEBUG_SEVERITY_HIGH => error!(
            "Message from OpenGL: source=0x{:x} type=0x{:x} id=0x{:x}: {}",
            source, gltype, id, text
        ),
        gl::DEBUG_SEVERITY_MEDIUM | gl::DEBUG_SEVERITY_LOW => warn!(
            "Message from OpenGL: source=0x{:x} type=0x{:x} id=0x{:x}: {}",
            source, gltype, id, text
        ),
        _ => debug!(
            "Message from OpenGL: source=0x{:x} type=0x{:x} id=0x{:x}: {}",
            source, gltype, id, text
        ),
    }
}

/// Window plus a current GL context and its surface
///
/// Fields drop in order, so the surface and context go before the window.
pub struct GlContext {
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    /// `glow` bindings for the overlay painter; our own wrappers use `gl`
    pub glow: Arc<glow::Context>,
    pub window: Window,
}

impl GlContext {
    pub fn new(event_loop: &ActiveEventLoop, window_config: &WindowConfig, gl_config: &ContextConfig) -> Result<Self> {
        let attributes = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height))
            .with_resizable(false);
        let window = event_loop
            .create_window(attributes)
            .context("Failed to create window")?;

        let raw_display = window.display_handle().context("No display handle")?.as_raw();
        let raw_window = window.window_handle().context("No window handle")?.as_raw();

        #[cfg(target_os = "windows")]
        let preference = DisplayApiPreference::Wgl(Some(raw_window));
        #[cfg(target_os = "macos")]
        let preference = DisplayApiPreference::Cgl;
        #[cfg(all(unix, not(target_os = "macos")))]
        let preference = DisplayApiPreference::Egl;

        let display = unsafe { Display::new(raw_display, preference) }
            .context("Failed to open GL display")?;

        let template = ConfigTemplateBuilder::new()
            .with_alpha_size(8)
            .with_depth_size(24)
            .build();
        let config = unsafe { display.find_configs(template) }
            .context("Failed to query GL configs")?
            .next()
            .context("No suitable GL config")?;

        let size = window.inner_size();
        let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window,
            NonZeroU32::new(size.width).context("Window has zero width")?,
            NonZeroU32::new(size.height).context("Window has zero height")?,
        );
        let surface = unsafe { display.create_window_surface(&config, &surface_attributes) }
            .context("Failed to create window surface")?;

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
            .with_debug(gl_config.debug_context)
            .build(Some(raw_window));
        let context = unsafe { display.create_context(&config, &context_attributes) }
            .context("Failed to create OpenGL 3.3 core context")?
            .make_current(&surface)
            .context("Failed to make GL context current")?;

        if window_config.vsync {
            if let Err(e) = surface.set_swap_interval(&context, SwapInterval::Wait(NonZeroU32::MIN)) {
                warn!("Failed to enable vsync: {:?}", e);
            }
        }

        gl::load_with(|symbol| match CString::new(symbol) {
            Ok(symbol) => display.get_proc_address(&symbol),
            Err(_) => ptr::null(),
        });
        let glow = unsafe { glow::Context::from_loader_function_cstr(|s| display.get_proc_address(s)) };

        Self::log_driver_info();
        if gl_config.debug_output {
            Self::enable_debug_output(gl_config.strict);
        }

        Ok(Self {
            surface,
            context,
            glow: Arc::new(glow),
            window,
        })
    }

    fn log_driver_info() {
        let get = |name: u32| unsafe {
            let value = gl::GetString(name);
            if value.is_null() {
                "<unknown>".to_string()
            } else {
                CStr::from_ptr(value as *const _).to_string_lossy().into_owned()
            }
        };
        info!("GL Vendor: {}", get(gl::VENDOR));
        info!("GL Renderer: {}", get(gl::RENDERER));
        info!("GL Version: {}", get(gl::VERSION));
    }

    fn enable_debug_output(strict: bool) {
        if !gl::DebugMessageCallback::is_loaded() {
            warn!("glDebugMessageCallback unavailable, GL debug output disabled");
            return;
        }
        STRICT_DEBUG.store(strict, Ordering::Relaxed);
        unsafe {
            gl::Enable(gl::DEBUG_OUTPUT);
            gl::Enable(gl::DEBUG_OUTPUT_SYNCHRONOUS);
            gl::DebugMessageCallback(Some(debug_message_callback), ptr::null());
        }
        info!("GL debug output enabled (strict: {})", strict);
    }

    pub fn swap_buffers(&self) -> Result<()> {
        self.surface
            .swap_buffers(&self.context)
            .context("Failed to swap buffers")
    }

    pub fn resize(&self, width: u32, height: u32) {
        let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) else {
            return;
        };
        self.surface.resize(&self.context, w, h);
        unsafe { gl::Viewport(0, 0, width as i32, height as i32) };
    }
}
