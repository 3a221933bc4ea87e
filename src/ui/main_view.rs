use super::render_util::frame_to_image;
use super::{
    ActiveTheme, AnyElement, AppView, Button, ButtonVariants, CAMERA_MAX_SIZE, CAMERA_MIN_SIZE,
    CONTROL_PANEL_WIDTH, CaptureState, Context, DEFAULT_CAMERA_RATIO, IntoElement, ObjectFit,
    ParentElement, Selectable, SharedString, Styled, StyledImage, Tag, Window, div, h_flex, img,
    px, v_flex,
};
use crate::{joints, types::SnapshotDisplay};
use std::sync::Arc;

impl AppView {
    pub(super) fn render_main(
        &mut self,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) -> AnyElement {
        if self.capture.pump() > 0 {
            self.image_dirty = true;
        }
        if self.image_dirty {
            self.refresh_image(window, cx);
        }

        let theme = cx.theme();
        let (status_color, muted_color, foreground) =
            (theme.success, theme.muted_foreground, theme.foreground);

        let (status_icon, status_text) = match (self.capture.state(), self.capture.current_skeleton()) {
            (CaptureState::Uninitialized, _) => ("○", "No sensor".to_string()),
            (CaptureState::DeviceReady, _) => ("○", "Sensor ready, not streaming".to_string()),
            (CaptureState::Streaming, Some(skeleton)) => (
                "●",
                format!(
                    "Tracking player #{} at {:.2} m",
                    skeleton.tracking_id, skeleton.position.z
                ),
            ),
            (CaptureState::Streaming, None) => ("●", "Streaming, no player tracked".to_string()),
            (CaptureState::Stopped, _) => ("○", "Stopped".to_string()),
        };

        let device_label = self
            .capture
            .device()
            .map(|d| d.label.clone())
            .unwrap_or_else(|| "--".to_string());

        let frame_status = self
            .capture
            .latest_color()
            .map(|f| {
                format!(
                    "{device_label} {}x{} · {} ms",
                    f.width,
                    f.height,
                    f.timestamp.elapsed().as_millis()
                )
            })
            .unwrap_or_else(|| format!("{device_label}, waiting for frames..."));

        let ratio = self.camera_aspect_ratio();
        let camera_width = CAMERA_MAX_SIZE.0.min(CAMERA_MAX_SIZE.1 * ratio);
        let camera_height = (camera_width / ratio).clamp(CAMERA_MIN_SIZE.1, CAMERA_MAX_SIZE.1);

        let frame_view: AnyElement = if let Some(image) = &self.latest_image {
            img(image.clone())
                .size_full()
                .object_fit(ObjectFit::Contain)
                .rounded_lg()
                .into_any_element()
        } else {
            div()
                .size_full()
                .flex()
                .items_center()
                .justify_center()
                .text_sm()
                .text_color(gpui::rgb(0x8b95a5))
                .child("Waiting for the sensor...")
                .into_any_element()
        };

        let camera_card = v_flex()
            .gap_2()
            .child(
                div()
                    .w(px(camera_width))
                    .h(px(camera_height))
                    .overflow_hidden()
                    .rounded_lg()
                    .bg(gpui::rgb(0x000000))
                    .child(frame_view),
            )
            .child(
                h_flex()
                    .justify_between()
                    .child(
                        div()
                            .text_xs()
                            .text_color(status_color)
                            .child(format!("{status_icon} {status_text}")),
                    )
                    .child(div().text_xs().text_color(muted_color).child(frame_status)),
            );

        let joint_picker = joints::labels().enumerate().fold(
            h_flex().flex_wrap().gap_1(),
            |picker, (idx, label)| {
                picker.child(
                    Button::new(SharedString::from(format!("joint-{idx}")))
                        .label(label)
                        .selected(self.selected_label == idx)
                        .outline()
                        .on_click(cx.listener(move |this, _, _, cx| {
                            this.select_label(idx, label);
                            cx.notify();
                        })),
                )
            },
        );

        let relative = self.capture.relative_mode();
        let relative_toggle = Button::new(SharedString::from("relative-toggle"))
            .label(if relative {
                "☑ From Hip Center"
            } else {
                "☐ From Hip Center"
            })
            .selected(relative)
            .outline()
            .on_click(cx.listener(|this, _, _, cx| {
                let relative = !this.capture.relative_mode();
                this.capture.set_relative_mode(relative);
                cx.notify();
            }));

        let snapshot_button = Button::new(SharedString::from("snapshot"))
            .primary()
            .label("Snapshot")
            .w_full()
            .on_click(cx.listener(|this, _, _, cx| {
                this.take_snapshot();
                cx.notify();
            }));

        let display = self.capture.display();
        let readout = axis_rows(&display, muted_color, foreground);
        let readout_hint = display.is_blank().then(|| {
            div()
                .text_xs()
                .text_color(muted_color)
                .child("Snapshot while a player is tracked to fill X, Y and Z")
        });

        let mut panel = v_flex()
            .w(px(CONTROL_PANEL_WIDTH))
            .gap_3()
            .p_3()
            .rounded_lg()
            .bg(gpui::rgb(0x0f1419));

        if let Some(notice) = self.capture.notice() {
            panel = panel.child(Tag::danger().rounded_full().child(notice.to_string()));
        }

        panel = panel
            .child(
                div()
                    .text_sm()
                    .text_color(foreground)
                    .child("Joint"),
            )
            .child(joint_picker)
            .child(relative_toggle)
            .child(snapshot_button)
            .child(readout)
            .children(readout_hint);

        h_flex()
            .size_full()
            .items_start()
            .gap_4()
            .p_4()
            .bg(gpui::rgb(0x1a2332))
            .child(camera_card)
            .child(panel)
            .into_any_element()
    }

    fn select_label(&mut self, idx: usize, label: &'static str) {
        self.selected_label = idx;
        self.capture.select_joint_label(label);
        self.image_dirty = true;
        log::debug!("selected joint {label:?}");
    }

    fn take_snapshot(&mut self) {
        match self.capture.snapshot() {
            Some(position) => log::info!(
                "{} ({}) at {position:?}",
                joints::label_for(self.capture.selected_joint()),
                if self.capture.relative_mode() {
                    "from hip center"
                } else {
                    "absolute"
                }
            ),
            None => log::info!("snapshot requested with no tracked player"),
        }
    }

    fn camera_aspect_ratio(&self) -> f32 {
        if let Some(frame) = self.capture.latest_color() {
            if frame.height > 0 {
                return frame.width as f32 / frame.height as f32;
            }
        }
        DEFAULT_CAMERA_RATIO
    }

    fn refresh_image(&mut self, window: &mut Window, cx: &mut Context<'_, Self>) {
        self.image_dirty = false;
        let Some(frame) = self.capture.latest_color() else {
            return;
        };
        let image = frame_to_image(
            frame,
            self.capture.current_skeleton(),
            self.capture.selected_joint(),
        );
        if let Some(image) = image {
            self.replace_latest_image(image, window, cx);
        }
    }

    fn replace_latest_image(
        &mut self,
        new_image: Arc<super::RenderImage>,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) {
        if let Some(old_image) = self.latest_image.replace(new_image) {
            // Explicitly drop the previous GPU texture; otherwise the sprite atlas keeps
            // every frame and memory will climb rapidly while the sensor is running.
            cx.drop_image(old_image, Some(window));
        }
    }
}

fn axis_rows(display: &SnapshotDisplay, label_color: gpui::Hsla, value_color: gpui::Hsla) -> AnyElement {
    [("X", &display.x), ("Y", &display.y), ("Z", &display.z)]
        .into_iter()
        .fold(v_flex().gap_1(), |rows, (axis, value)| {
            rows.child(
                h_flex()
                    .gap_2()
                    .items_center()
                    .child(div().w(px(16.0)).text_sm().text_color(label_color).child(axis))
                    .child(
                        div()
                            .flex_1()
                            .min_h(px(28.0))
                            .px_2()
                            .py_1()
                            .rounded_md()
                            .bg(gpui::rgb(0x1e293b))
                            .text_sm()
                            .text_color(value_color)
                            .child(value.clone()),
                    ),
            )
        })
        .into_any_element()
}
