//! Sensor drivers.
//!
//! A driver owns the device lifecycle: enumeration, enabling the color and
//! skeleton streams, and starting a capture thread that pushes
//! [`FrameSample`]s into a channel. The returned [`SensorStream`] stops the
//! thread and releases the device when it is stopped or dropped.

#[cfg(feature = "camera-nokhwa")]
pub mod camera;
pub mod simulated;

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use crossbeam_channel::Sender;
use serde::Deserialize;
use thiserror::Error;

use crate::types::FrameSample;

#[cfg(feature = "camera-nokhwa")]
pub use camera::CameraDriver;
pub use simulated::{SimulatedDriver, SimulatedSettings};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    pub index: usize,
    pub label: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceStatus {
    Connected,
    Disconnected,
    Initializing,
    NotPowered,
    Error,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DeviceStatus::Connected => "connected",
            DeviceStatus::Disconnected => "disconnected",
            DeviceStatus::Initializing => "initializing",
            DeviceStatus::NotPowered => "not powered",
            DeviceStatus::Error => "in an error state",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorFormat {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl ColorFormat {
    pub const RGB_1280X960_FPS12: ColorFormat = ColorFormat {
        width: 1280,
        height: 960,
        fps: 12,
    };

    pub const RGB_640X480_FPS30: ColorFormat = ColorFormat {
        width: 640,
        height: 480,
        fps: 30,
    };
}

impl Default for ColorFormat {
    fn default() -> Self {
        ColorFormat::RGB_1280X960_FPS12
    }
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("the sensor is already in use by another program")]
    Busy,
    #[error("no sensor at index {0}")]
    UnknownDevice(usize),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub trait SensorDriver {
    fn label(&self) -> &'static str;

    fn enumerate_devices(&mut self) -> Result<Vec<DeviceInfo>, DriverError>;

    fn device_status(&self, device: &DeviceInfo) -> DeviceStatus;

    fn enable_color_stream(
        &mut self,
        device: &DeviceInfo,
        format: ColorFormat,
    ) -> Result<(), DriverError>;

    fn enable_skeleton_stream(&mut self, device: &DeviceInfo) -> Result<(), DriverError>;

    /// Starts capturing. Every tick is offered to `frame_tx` with `try_send`;
    /// ticks that do not fit are dropped.
    fn start(
        &mut self,
        device: &DeviceInfo,
        frame_tx: Sender<FrameSample>,
    ) -> Result<SensorStream, DriverError>;
}

/// Exclusive hold on a device. Released on drop.
#[derive(Debug)]
pub struct DeviceClaim {
    held: Arc<AtomicBool>,
}

impl DeviceClaim {
    /// Takes the claim, or returns `None` if someone else holds it.
    pub fn acquire(held: &Arc<AtomicBool>) -> Option<Self> {
        if held.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(DeviceClaim { held: held.clone() })
        }
    }
}

impl Drop for DeviceClaim {
    fn drop(&mut self) {
        self.held.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct SensorStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    claim: Option<DeviceClaim>,
}

impl SensorStream {
    /// Runs `capture` on a new thread. The closure should return once the
    /// stop flag it is handed becomes true.
    pub fn spawn<F>(claim: Option<DeviceClaim>, capture: F) -> Self
    where
        F: FnOnce(Arc<AtomicBool>) + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let handle = thread::spawn(move || capture(stop_flag));

        SensorStream {
            stop,
            handle: Some(handle),
            claim,
        }
    }

    /// True once the capture thread has returned, whether or not it was asked
    /// to stop.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|handle| handle.is_finished())
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("sensor capture thread panicked");
            }
        }
        self.claim.take();
    }
}

impl Drop for SensorStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_is_exclusive_until_dropped() {
        let held = Arc::new(AtomicBool::new(false));
        let first = DeviceClaim::acquire(&held);
        assert!(first.is_some());
        assert!(DeviceClaim::acquire(&held).is_none());

        drop(first);
        assert!(DeviceClaim::acquire(&held).is_some());
    }

    #[test]
    fn stopping_a_stream_joins_the_thread() {
        let held = Arc::new(AtomicBool::new(false));
        let claim = DeviceClaim::acquire(&held);
        let stream = SensorStream::spawn(claim, |stop| {
            while !stop.load(Ordering::Relaxed) {
                thread::yield_now();
            }
        });

        assert!(!stream.is_finished());
        stream.stop();
        assert!(!held.load(Ordering::SeqCst));
    }

    #[test]
    fn stream_reports_a_thread_that_returned_early() {
        let stream = SensorStream::spawn(None, |_| {});
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
        while !stream.is_finished() && std::time::Instant::now() < deadline {
            thread::yield_now();
        }
        assert!(stream.is_finished());
    }
}
