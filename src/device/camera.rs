use std::{sync::atomic::Ordering, time::Instant};

use anyhow::{Context, anyhow};
use crossbeam_channel::{Sender, TrySendError};
use nokhwa::{
    Camera, NokhwaError,
    pixel_format::RgbFormat,
    query,
    utils::{
        ApiBackend, CameraFormat, CameraIndex, CameraInfo, FrameFormat, RequestedFormat,
        RequestedFormatType, Resolution,
    },
};
use rayon::prelude::*;

use super::{ColorFormat, DeviceInfo, DeviceStatus, DriverError, SensorDriver, SensorStream};
use crate::types::{ColorFrame, FrameSample};

fn requested_formats(format: ColorFormat) -> [RequestedFormat<'static>; 3] {
    let wanted = CameraFormat::new(
        Resolution::new(format.width, format.height),
        FrameFormat::MJPEG,
        format.fps,
    );
    [
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(wanted)),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
    ]
}

/// Color-only driver for ordinary webcams. Webcams have no body tracker, so
/// every sample it delivers lacks a skeleton sub-frame.
#[derive(Debug, Default)]
pub struct CameraDriver {
    cameras: Vec<CameraInfo>,
    color_format: Option<ColorFormat>,
}

impl CameraDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn camera_index(&self, device: &DeviceInfo) -> Result<CameraIndex, DriverError> {
        self.cameras
            .get(device.index)
            .map(|info| info.index().clone())
            .ok_or(DriverError::UnknownDevice(device.index))
    }
}

impl SensorDriver for CameraDriver {
    fn label(&self) -> &'static str {
        "camera"
    }

    fn enumerate_devices(&mut self) -> Result<Vec<DeviceInfo>, DriverError> {
        self.cameras = query(ApiBackend::Auto).context("failed to enumerate cameras")?;
        Ok(self
            .cameras
            .iter()
            .enumerate()
            .map(|(index, info)| DeviceInfo {
                index,
                label: info.human_name(),
            })
            .collect())
    }

    fn device_status(&self, device: &DeviceInfo) -> DeviceStatus {
        if device.index < self.cameras.len() {
            DeviceStatus::Connected
        } else {
            DeviceStatus::Disconnected
        }
    }

    fn enable_color_stream(
        &mut self,
        device: &DeviceInfo,
        format: ColorFormat,
    ) -> Result<(), DriverError> {
        self.camera_index(device)?;
        self.color_format = Some(format);
        Ok(())
    }

    fn enable_skeleton_stream(&mut self, device: &DeviceInfo) -> Result<(), DriverError> {
        self.camera_index(device)?;
        log::warn!(
            "{} has no skeleton tracker; snapshots will stay blank",
            device.label
        );
        Ok(())
    }

    fn start(
        &mut self,
        device: &DeviceInfo,
        frame_tx: Sender<FrameSample>,
    ) -> Result<SensorStream, DriverError> {
        let index = self.camera_index(device)?;
        let format = self.color_format.unwrap_or_default();

        // Fail fast before spawning the capture thread.
        drop(build_camera(index.clone(), format)?);

        Ok(SensorStream::spawn(None, move |stop| {
            let mut camera = match build_camera(index, format) {
                Ok(cam) => cam,
                Err(err) => {
                    // Returning ends the stream; the controller sees it finished.
                    log::error!("failed to reopen camera: {err:?}");
                    return;
                }
            };

            while !stop.load(Ordering::Relaxed) {
                let frame_start = Instant::now();
                let buffer = match camera.frame() {
                    Ok(buffer) => buffer,
                    Err(err) => {
                        log::warn!(
                            "camera frame read failed (after {:?}): {err:?}",
                            frame_start.elapsed()
                        );
                        continue;
                    }
                };

                let color = match buffer.decode_image::<RgbFormat>() {
                    Ok(decoded) => {
                        let (width, height) = decoded.dimensions();
                        ColorFrame {
                            rgba: rgb_to_rgba(decoded.as_raw()),
                            width,
                            height,
                            timestamp: Instant::now(),
                        }
                    }
                    Err(err) => {
                        log::warn!("failed to decode camera frame {err:?}");
                        continue;
                    }
                };

                let sample = FrameSample {
                    color: Some(color),
                    skeletons: None,
                };
                if let Err(TrySendError::Disconnected(_)) = frame_tx.try_send(sample) {
                    break;
                }
            }

            if let Err(err) = camera.stop_stream() {
                log::warn!("failed to stop camera stream: {err:?}");
            }
        }))
    }
}

fn build_camera(index: CameraIndex, format: ColorFormat) -> Result<Camera, DriverError> {
    let mut last_err = None;

    for requested in requested_formats(format) {
        let opened = Camera::new(index.clone(), requested).and_then(|mut camera| {
            camera.open_stream()?;
            Ok(camera)
        });
        match opened {
            Ok(camera) => return Ok(camera),
            // Another owner blocks every format, so stop trying.
            Err(err) if is_device_busy(&err) => {
                log::debug!("camera busy: {err}");
                return Err(DriverError::Busy);
            }
            Err(err) => {
                log::debug!("camera rejected requested format: {err}");
                last_err = Some(err);
            }
        }
    }

    Err(DriverError::Backend(match last_err {
        Some(err) => anyhow::Error::new(err).context("failed to open camera"),
        None => anyhow!("failed to open camera with any supported format"),
    }))
}

// Backends only report "in use" through the OS error text.
const BUSY_MARKERS: [&str; 5] = [
    "busy",
    "os error 16",
    "in use",
    "0xc00d3704",
    "0xc00d3ea3",
];

/// Whether `err` means another program holds the device, as opposed to the
/// device rejecting a format.
fn is_device_busy(err: &NokhwaError) -> bool {
    match err {
        NokhwaError::OpenDeviceError(_, _) | NokhwaError::OpenStreamError(_) => {
            let text = err.to_string().to_ascii_lowercase();
            BUSY_MARKERS.iter().any(|marker| text.contains(marker))
        }
        _ => false,
    }
}

fn rgb_to_rgba(rgb: &[u8]) -> Vec<u8> {
    let mut rgba = vec![0u8; rgb.len() / 3 * 4];
    rgba.par_chunks_mut(4)
        .zip(rgb.par_chunks_exact(3))
        .for_each(|(dst, src)| {
            dst[..3].copy_from_slice(src);
            dst[3] = 255;
        });
    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_expands_with_opaque_alpha() {
        let rgba = rgb_to_rgba(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(rgba, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn busy_device_is_recognized() {
        assert!(is_device_busy(&NokhwaError::OpenStreamError(
            "Device or resource busy (os error 16)".to_string()
        )));
        assert!(is_device_busy(&NokhwaError::OpenDeviceError(
            "0".to_string(),
            "MF_E_HW_MFT_FAILED_START_STREAMING 0xC00D3704".to_string()
        )));
    }

    #[test]
    fn rejected_formats_are_not_busy() {
        assert!(!is_device_busy(&NokhwaError::OpenStreamError(
            "Invalid argument (os error 22)".to_string()
        )));
        assert!(!is_device_busy(&NokhwaError::OpenStreamError(
            "format MJPEG 1280x960@12 not supported".to_string()
        )));
        assert!(!is_device_busy(&NokhwaError::ReadFrameError(
            "device busy".to_string()
        )));
    }

    #[test]
    fn unknown_camera_is_disconnected() {
        let driver = CameraDriver::new();
        let device = DeviceInfo {
            index: 0,
            label: "missing".to_string(),
        };
        assert_eq!(driver.device_status(&device), DeviceStatus::Disconnected);
    }
}
