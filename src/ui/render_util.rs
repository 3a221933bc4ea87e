use super::{
    Arc, ImageBuffer, ImageFrame, JOINT_RADIUS, RenderImage, Rgba, SELECTED_JOINT_RADIUS,
    SKELETON_LINE_THICKNESS,
};
use crate::{
    pipeline::skeleton::{BONES, overlay_points},
    types::{ColorFrame, JointId, Skeleton},
};

const BONE_COLOR: [u8; 4] = [96, 165, 250, 255];
const JOINT_COLOR: [u8; 4] = [59, 130, 246, 255];
const SELECTED_COLOR: [u8; 4] = [250, 204, 21, 255];

/// Converts a color frame into a GPUI image, drawing `overlay` on top with
/// `selected` highlighted.
pub(super) fn frame_to_image(
    frame: &ColorFrame,
    overlay: Option<&Skeleton>,
    selected: JointId,
) -> Option<Arc<RenderImage>> {
    let mut rgba = frame.rgba.clone();
    if let Some(skeleton) = overlay {
        draw_skeleton(&mut rgba, frame.width, frame.height, skeleton, selected);
    }

    // GPUI expects BGRA; convert in place to avoid the async asset pipeline and flicker.
    for px in rgba.chunks_exact_mut(4) {
        px.swap(0, 2);
    }

    let buffer = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(frame.width, frame.height, rgba)?;
    let frame = ImageFrame::new(buffer);

    Some(Arc::new(RenderImage::new(vec![frame])))
}

fn draw_skeleton(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    skeleton: &Skeleton,
    selected: JointId,
) {
    let points = overlay_points(skeleton, width, height);
    let mut canvas = Canvas {
        buffer,
        width,
        height,
    };

    for &(a, b) in BONES {
        if let (Some(pa), Some(pb)) = (points[a.index()], points[b.index()]) {
            canvas.line(pa, pb, BONE_COLOR, SKELETON_LINE_THICKNESS);
        }
    }

    for joint in JointId::ALL {
        let Some((x, y)) = points[joint.index()] else {
            continue;
        };
        let center = (x as i32, y as i32);
        if joint == selected {
            canvas.circle(center, SELECTED_JOINT_RADIUS, SELECTED_COLOR);
        } else {
            canvas.circle(center, JOINT_RADIUS, JOINT_COLOR);
        }
    }
}

struct Canvas<'a> {
    buffer: &'a mut [u8],
    width: u32,
    height: u32,
}

impl Canvas<'_> {
    fn line(&mut self, p0: (f32, f32), p1: (f32, f32), color: [u8; 4], thickness: i32) {
        let (mut x0, mut y0) = (p0.0 as i32, p0.1 as i32);
        let (x1, y1) = (p1.0 as i32, p1.1 as i32);
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let radius = (thickness.max(1) - 1) / 2;

        loop {
            self.circle((x0, y0), radius, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn circle(&mut self, center: (i32, i32), radius: i32, color: [u8; 4]) {
        let (cx, cy) = center;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.put(cx + dx, cy + dy, color);
                }
            }
        }
    }

    fn put(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if x < 0 || y < 0 {
            return;
        }
        let (ux, uy) = (x as u32, y as u32);
        if ux >= self.width || uy >= self.height {
            return;
        }
        let idx = ((uy * self.width + ux) as usize) * 4;
        if idx + 3 < self.buffer.len() {
            self.buffer[idx..idx + 4].copy_from_slice(&color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JointTrackingState, Position3D};

    fn pixel(buffer: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * width + x) * 4) as usize;
        [buffer[idx], buffer[idx + 1], buffer[idx + 2], buffer[idx + 3]]
    }

    #[test]
    fn selected_joint_is_highlighted() {
        let (width, height) = (640, 480);
        let mut buffer = vec![0u8; (width * height * 4) as usize];
        let mut skeleton = Skeleton::default();
        skeleton[JointId::Head].position = Position3D::new(0.0, 0.0, 2.0);
        skeleton[JointId::Head].tracking = JointTrackingState::Tracked;

        draw_skeleton(&mut buffer, width, height, &skeleton, JointId::Head);
        assert_eq!(pixel(&buffer, width, 320, 240), SELECTED_COLOR);
        assert_eq!(pixel(&buffer, width, 0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn drawing_off_canvas_is_clipped() {
        let mut buffer = vec![0u8; 4 * 4 * 4];
        let mut canvas = Canvas {
            buffer: &mut buffer,
            width: 4,
            height: 4,
        };
        canvas.line((-10.0, -10.0), (20.0, 20.0), BONE_COLOR, 3);
        assert_eq!(pixel(&buffer, 4, 2, 2), BONE_COLOR);
    }
}
