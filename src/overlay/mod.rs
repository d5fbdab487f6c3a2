//! Debug overlay
//!
//! egui on top of the scene, painted with `egui_glow` through the same GL
//! context. Holds the translation sliders and the frame time readout.

pub mod fps;

use egui::Context;
use egui_glow::EguiGlow;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

use crate::scene::Translations;
use fps::FrameTimer;

pub struct Overlay {
    egui: Option<EguiGlow>,
    timer: FrameTimer,
}

impl Overlay {
    pub fn new(event_loop: &ActiveEventLoop, gl: Arc<glow::Context>) -> Self {
        let egui = EguiGlow::new(event_loop, gl, None, None, true);
        egui.egui_ctx.set_visuals(egui::Visuals::dark());
        info!("Debug overlay initialized");

        Self {
            egui: Some(egui),
            timer: FrameTimer::new(),
        }
    }

    /// Forward a window event; returns true if the overlay consumed it
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        match self.egui.as_mut() {
            Some(egui) => egui.on_window_event(window, event).consumed,
            None => false,
        }
    }

    /// Run the overlay UI for this frame, editing `translations` in place
    pub fn run(&mut self, window: &Window, translations: &mut Translations, slider_max: f32) {
        self.timer.tick(Instant::now());
        let (ms, fps) = (self.timer.average_ms(), self.timer.fps());

        if let Some(egui) = self.egui.as_mut() {
            egui.run(window, |ctx| Self::ui(ctx, translations, slider_max, ms, fps));
        }
    }

    fn ui(ctx: &Context, translations: &mut Translations, slider_max: f32, ms: f32, fps: f32) {
        egui::Window::new("Debug").resizable(false).show(ctx, |ui| {
            for (label, translation) in [
                ("Translation A", &mut translations.a),
                ("Translation B", &mut translations.b),
            ] {
                ui.label(label);
                ui.horizontal(|ui| {
                    for component in [&mut translation.x, &mut translation.y, &mut translation.z] {
                        ui.add(egui::Slider::new(component, 0.0..=slider_max).show_value(true));
                    }
                });
            }
            ui.label(format!("Application average {:.3} ms/frame ({:.1} FPS)", ms, fps));
        });
    }

    /// Paint the shapes produced by the last [`Overlay::run`]
    pub fn paint(&mut self, window: &Window) {
        if let Some(egui) = self.egui.as_mut() {
            egui.paint(window);
        }
    }

    /// Release painter resources; later calls do nothing
    pub fn destroy(&mut self) {
        if let Some(mut egui) = self.egui.take() {
            egui.destroy();
            debug!("Debug overlay destroyed");
        }
    }
}
