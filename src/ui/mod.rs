use std::sync::Arc;

use gpui::{
    AnyElement, App, AppContext, Context, IntoElement, ObjectFit, ParentElement, Render,
    RenderImage, SharedString, Styled, StyledImage, TitlebarOptions, Window, WindowOptions, div,
    img, px,
};
use gpui_component::{
    ActiveTheme, Root, Selectable,
    button::{Button, ButtonVariants},
    h_flex,
    tag::Tag,
    v_flex,
};
use image::{Frame as ImageFrame, ImageBuffer, Rgba};

use crate::capture::{CaptureController, CaptureState};

mod main_view;
mod render_util;

const SKELETON_LINE_THICKNESS: i32 = 5;
const JOINT_RADIUS: i32 = 6;
const SELECTED_JOINT_RADIUS: i32 = 11;

const CAMERA_MIN_SIZE: (f32, f32) = (320.0, 240.0);
const CAMERA_MAX_SIZE: (f32, f32) = (960.0, 720.0);
const DEFAULT_CAMERA_RATIO: f32 = 4.0 / 3.0;
const CONTROL_PANEL_WIDTH: f32 = 360.0;

pub fn launch_ui(app: &mut App, capture: CaptureController) -> gpui::Result<()> {
    let window_options = WindowOptions {
        titlebar: Some(TitlebarOptions {
            title: Some("Limb Position Snapshot".into()),
            ..Default::default()
        }),
        ..Default::default()
    };

    app.open_window(window_options, move |window, app| {
        let view = app.new(|cx| {
            // Quitting exits without dropping entities.
            cx.on_app_quit(|this: &mut AppView, _| {
                this.stop_capture();
                async {}
            })
            .detach();
            AppView::new(capture)
        });

        let weak_view = view.downgrade();
        window.on_window_should_close(app, move |_, cx| {
            if let Err(err) = weak_view.update(cx, |this, _| this.stop_capture()) {
                log::debug!("view already released on close: {err}");
            }
            true
        });

        app.new(|cx| Root::new(view, window, cx))
    })?;

    Ok(())
}

struct AppView {
    capture: CaptureController,
    /// Picker row the user clicked. Two rows share the hip center, so the
    /// joint alone cannot tell which one to highlight.
    selected_label: usize,
    latest_image: Option<Arc<RenderImage>>,
    image_dirty: bool,
}

impl AppView {
    fn new(capture: CaptureController) -> Self {
        Self {
            capture,
            selected_label: 0,
            latest_image: None,
            image_dirty: false,
        }
    }

    fn stop_capture(&mut self) {
        if self.capture.state() != CaptureState::Stopped {
            self.capture.shutdown();
        }
    }
}

impl Render for AppView {
    fn render(
        &mut self,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) -> impl gpui::IntoElement {
        if self.capture.state() == CaptureState::Streaming {
            cx.defer_in(window, |_, _, cx| {
                cx.notify();
            });
        }

        self.render_main(window, cx)
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::bounded;

    use super::*;
    use crate::device::{ColorFormat, SensorDriver, SimulatedDriver};

    #[test]
    fn stopping_the_view_releases_the_sensor() {
        let driver = SimulatedDriver::default();
        let mut other_program = driver.clone();
        let mut capture = CaptureController::new(Box::new(driver), ColorFormat::RGB_640X480_FPS30);
        capture.launch().unwrap();

        let mut view = AppView::new(capture);
        view.stop_capture();
        view.stop_capture();
        assert_eq!(view.capture.state(), CaptureState::Stopped);

        let device = other_program.enumerate_devices().unwrap().remove(0);
        let (tx, _rx) = bounded(1);
        other_program.start(&device, tx).unwrap().stop();
    }
}
