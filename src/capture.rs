//! Capture session: owns the sensor stream and everything derived from it.
//!
//! All methods run on the UI thread. The driver's capture thread only talks
//! to the controller through the frame channel, which [`CaptureController::pump`]
//! drains.

use crossbeam_channel::{Receiver, Sender, bounded};
use thiserror::Error;

use crate::{
    device::{ColorFormat, DeviceInfo, DeviceStatus, DriverError, SensorDriver, SensorStream},
    joints,
    pipeline::{resolve_position, select_tracked},
    types::{ColorFrame, FrameSample, JointId, Position3D, Skeleton, SkeletonSet, SnapshotDisplay},
};

const FRAME_QUEUE_DEPTH: usize = 2;

const NO_SENSOR_NOTICE: &str = "No sensor connected :(";
const BUSY_NOTICE: &str = "One program at a time, please";
const STREAM_LOST_NOTICE: &str = "The sensor stopped sending frames";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    Uninitialized,
    DeviceReady,
    Streaming,
    Stopped,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no sensor found")]
    DeviceAbsent,
    #[error("sensor is {0}")]
    DeviceDisconnected(DeviceStatus),
    #[error("sensor is in use by another program")]
    DeviceBusy,
    #[error("{0} is not possible while {1:?}")]
    InvalidState(&'static str, CaptureState),
    #[error("sensor driver failed: {0}")]
    Driver(#[source] DriverError),
}

pub struct CaptureController {
    driver: Box<dyn SensorDriver>,
    color_format: ColorFormat,
    state: CaptureState,
    device: Option<DeviceInfo>,
    stream: Option<SensorStream>,
    frame_tx: Sender<FrameSample>,
    frame_rx: Receiver<FrameSample>,
    skeletons: SkeletonSet,
    latest_color: Option<ColorFrame>,
    current_skeleton: Option<Skeleton>,
    selected_joint: JointId,
    relative_mode: bool,
    last_result: Option<Position3D>,
    notice: Option<String>,
}

impl CaptureController {
    pub fn new(driver: Box<dyn SensorDriver>, color_format: ColorFormat) -> Self {
        let (frame_tx, frame_rx) = bounded(FRAME_QUEUE_DEPTH);

        CaptureController {
            driver,
            color_format,
            state: CaptureState::Uninitialized,
            device: None,
            stream: None,
            frame_tx,
            frame_rx,
            skeletons: SkeletonSet::default(),
            latest_color: None,
            current_skeleton: None,
            selected_joint: JointId::HipCenter,
            relative_mode: false,
            last_result: None,
            notice: None,
        }
    }

    /// Finds the first sensor and enables its color and skeleton streams.
    pub fn setup(&mut self) -> Result<(), CaptureError> {
        if self.state != CaptureState::Uninitialized {
            return Err(CaptureError::InvalidState("setup", self.state));
        }

        let devices = match self.driver.enumerate_devices() {
            Ok(devices) => devices,
            Err(err) => return Err(self.report_driver_error(err)),
        };
        let Some(device) = devices.into_iter().next() else {
            log::warn!("no sensor found by the {} driver", self.driver.label());
            self.notice = Some(NO_SENSOR_NOTICE.to_string());
            return Err(CaptureError::DeviceAbsent);
        };

        let status = self.driver.device_status(&device);
        if status != DeviceStatus::Connected {
            log::warn!("{} is {status}", device.label);
            self.notice = Some(match status {
                DeviceStatus::Disconnected => NO_SENSOR_NOTICE.to_string(),
                other => format!("{} is {other}", device.label),
            });
            return Err(CaptureError::DeviceDisconnected(status));
        }

        if let Err(err) = self.enable_streams(&device) {
            return Err(self.report_driver_error(err));
        }

        log::info!("{} ready", device.label);
        self.device = Some(device);
        self.state = CaptureState::DeviceReady;
        Ok(())
    }

    fn enable_streams(&mut self, device: &DeviceInfo) -> Result<(), DriverError> {
        self.driver.enable_color_stream(device, self.color_format)?;
        self.driver.enable_skeleton_stream(device)
    }

    /// Starts streaming from the device found by [`setup`](Self::setup).
    ///
    /// A busy sensor leaves the controller in `DeviceReady` and is returned to
    /// the caller after the notice is raised.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        let device = match (&self.state, &self.device) {
            (CaptureState::DeviceReady, Some(device)) => device.clone(),
            _ => return Err(CaptureError::InvalidState("start", self.state)),
        };

        match self.driver.start(&device, self.frame_tx.clone()) {
            Ok(stream) => {
                log::info!("streaming from {}", device.label);
                self.stream = Some(stream);
                self.state = CaptureState::Streaming;
                Ok(())
            }
            Err(DriverError::Busy) => {
                log::error!("{} is held by another program", device.label);
                self.notice = Some(BUSY_NOTICE.to_string());
                Err(CaptureError::DeviceBusy)
            }
            Err(err) => Err(self.report_driver_error(err)),
        }
    }

    /// Setup followed by start.
    pub fn launch(&mut self) -> Result<(), CaptureError> {
        self.setup()?;
        self.start()
    }

    fn report_driver_error(&mut self, err: DriverError) -> CaptureError {
        log::error!("sensor driver failed: {err:#}");
        self.notice = Some(format!("Sensor error: {err}"));
        CaptureError::Driver(err)
    }

    /// Handles every sample queued since the last call, oldest first, then
    /// stops the session if the capture thread has quit on its own.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(sample) = self.frame_rx.try_recv() {
            self.handle_frame(sample);
            handled += 1;
        }
        self.check_stream();
        handled
    }

    fn check_stream(&mut self) {
        if self.state != CaptureState::Streaming {
            return;
        }
        if self.stream.as_ref().is_some_and(SensorStream::is_finished) {
            log::error!("sensor capture thread exited while streaming");
            self.notice = Some(STREAM_LOST_NOTICE.to_string());
            self.shutdown();
        }
    }

    pub fn handle_frame(&mut self, sample: FrameSample) {
        if self.state != CaptureState::Streaming {
            log::debug!("dropping frame received while {:?}", self.state);
            return;
        }

        if let Some(color) = sample.color {
            self.latest_color = Some(color);
        }

        if let Some(skeletons) = sample.skeletons {
            self.skeletons.clone_from(&skeletons);
            self.current_skeleton = select_tracked(&self.skeletons);
        }
    }

    /// Resolves the selected joint on the retained skeleton. Without a
    /// tracked skeleton the result is cleared, which displays as blank.
    pub fn snapshot(&mut self) -> Option<Position3D> {
        self.last_result = self
            .current_skeleton
            .as_ref()
            .map(|skeleton| resolve_position(skeleton, self.selected_joint, self.relative_mode));
        self.last_result
    }

    pub fn select_joint(&mut self, joint: JointId) {
        self.selected_joint = joint;
    }

    /// Selects by picker label.
    ///
    /// # Panics
    ///
    /// Panics on a label that is not in [`joints::labels`].
    pub fn select_joint_label(&mut self, label: &str) {
        self.select_joint(joints::resolve(label));
    }

    pub fn set_relative_mode(&mut self, relative: bool) {
        self.relative_mode = relative;
    }

    pub fn shutdown(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop();
            log::info!("sensor stream stopped");
        }
        self.state = CaptureState::Stopped;
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn device(&self) -> Option<&DeviceInfo> {
        self.device.as_ref()
    }

    pub fn latest_color(&self) -> Option<&ColorFrame> {
        self.latest_color.as_ref()
    }

    pub fn current_skeleton(&self) -> Option<&Skeleton> {
        self.current_skeleton.as_ref()
    }

    pub fn selected_joint(&self) -> JointId {
        self.selected_joint
    }

    pub fn relative_mode(&self) -> bool {
        self.relative_mode
    }

    pub fn display(&self) -> SnapshotDisplay {
        SnapshotDisplay::from_result(self.last_result)
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        if self.stream.is_some() {
            self.shutdown();
        }
    }
}
