//! Tab
//!
//! A small OpenGL sandbox: one textured quad drawn twice per frame, with a
//! debug overlay to move both copies around.

mod app;
mod config;
mod overlay;
mod renderer;
mod scene;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use winit::event_loop::EventLoop;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tab=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tab");

    let config = config::Config::load().context("Failed to load configuration")?;

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = app::App::new(config);
    event_loop.run_app(&mut app).context("Event loop failed")?;

    app.finish()?;
    info!("Tab exited cleanly");
    Ok(())
}
