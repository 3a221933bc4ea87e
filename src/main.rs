#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod capture;
mod config;
mod device;
mod joints;
mod pipeline;
mod types;
mod ui;

use anyhow::Result;
use capture::{CaptureController, CaptureError};
use config::AppConfig;
use gpui::Application;

fn main() -> Result<()> {
    env_logger::init();

    let config = AppConfig::from_env();
    let mut capture = CaptureController::new(config.build_driver(), config.color_format());

    // The window still opens on failure so the notice reaches the user.
    match capture.launch() {
        Ok(()) => {}
        Err(CaptureError::DeviceBusy) => {
            log::error!("sensor is busy; close the other program and restart");
        }
        Err(err) => log::error!("sensor setup failed: {err}"),
    }

    Application::new()
        .with_assets(gpui_component_assets::Assets)
        .run(move |app| {
            gpui_component::init(app);

            if let Err(err) = ui::launch_ui(app, capture) {
                log::error!("failed to launch ui: {err:?}");
            }
        });

    Ok(())
}
