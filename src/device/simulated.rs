use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Sender, TrySendError};
use rayon::prelude::*;
use serde::Deserialize;

use super::{
    ColorFormat, DeviceClaim, DeviceInfo, DeviceStatus, DriverError, SensorDriver, SensorStream,
};
use crate::types::{
    ColorFrame, FrameSample, JointId, JointTrackingState, Position3D, SKELETON_SLOT_COUNT,
    Skeleton, SkeletonSet, SkeletonTrackingState,
};

// Standing pose, meters from the hip center.
const REFERENCE_POSE: [(JointId, Position3D); JointId::COUNT] = [
    (JointId::HipCenter, Position3D::new(0.0, 0.0, 0.0)),
    (JointId::Spine, Position3D::new(0.0, 0.25, -0.02)),
    (JointId::ShoulderCenter, Position3D::new(0.0, 0.5, -0.03)),
    (JointId::Head, Position3D::new(0.0, 0.68, -0.03)),
    (JointId::ShoulderLeft, Position3D::new(-0.18, 0.45, -0.02)),
    (JointId::ElbowLeft, Position3D::new(-0.26, 0.2, -0.02)),
    (JointId::WristLeft, Position3D::new(-0.3, -0.02, -0.05)),
    (JointId::HandLeft, Position3D::new(-0.31, -0.1, -0.06)),
    (JointId::ShoulderRight, Position3D::new(0.18, 0.45, -0.02)),
    (JointId::ElbowRight, Position3D::new(0.26, 0.2, -0.02)),
    (JointId::WristRight, Position3D::new(0.3, -0.02, -0.05)),
    (JointId::HandRight, Position3D::new(0.31, -0.1, -0.06)),
    (JointId::HipLeft, Position3D::new(-0.09, -0.06, 0.0)),
    (JointId::KneeLeft, Position3D::new(-0.1, -0.48, -0.02)),
    (JointId::AnkleLeft, Position3D::new(-0.11, -0.88, 0.02)),
    (JointId::FootLeft, Position3D::new(-0.11, -0.93, -0.06)),
    (JointId::HipRight, Position3D::new(0.09, -0.06, 0.0)),
    (JointId::KneeRight, Position3D::new(0.1, -0.48, -0.02)),
    (JointId::AnkleRight, Position3D::new(0.11, -0.88, 0.02)),
    (JointId::FootRight, Position3D::new(0.11, -0.93, -0.06)),
];

const PLAYER_DISTANCE: f32 = 2.2;
const PLAYER_HIP_HEIGHT: f32 = -0.1;
const BYSTANDER_POSITION: Position3D = Position3D::new(-1.1, 0.0, 3.4);

#[derive(Clone, Debug, Deserialize)]
pub struct SimulatedSettings {
    #[serde(default = "default_device_count")]
    pub device_count: usize,
    /// Status every virtual device reports.
    #[serde(default = "default_status")]
    pub status: DeviceStatus,
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Slot the swaying player is reported in.
    #[serde(default = "default_tracked_slot")]
    pub tracked_slot: usize,
}

fn default_device_count() -> usize { 1 }
fn default_status() -> DeviceStatus { DeviceStatus::Connected }
fn default_fps() -> u32 { 30 }
fn default_tracked_slot() -> usize { 2 }

impl Default for SimulatedSettings {
    fn default() -> Self {
        SimulatedSettings {
            device_count: default_device_count(),
            status: default_status(),
            fps: default_fps(),
            tracked_slot: default_tracked_slot(),
        }
    }
}

fn frame_interval(fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(fps.max(1)))
}

/// A virtual sensor with one person swaying in front of it.
///
/// Clones share the device, so a clone can observe that the device is busy.
#[derive(Clone, Debug)]
pub struct SimulatedDriver {
    settings: SimulatedSettings,
    in_use: Arc<AtomicBool>,
    color_format: Option<ColorFormat>,
    skeletons_enabled: bool,
}

impl SimulatedDriver {
    pub fn new(settings: SimulatedSettings) -> Self {
        SimulatedDriver {
            settings,
            in_use: Arc::new(AtomicBool::new(false)),
            color_format: None,
            skeletons_enabled: false,
        }
    }

    fn check_device(&self, device: &DeviceInfo) -> Result<(), DriverError> {
        if device.index < self.settings.device_count {
            Ok(())
        } else {
            Err(DriverError::UnknownDevice(device.index))
        }
    }
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        SimulatedDriver::new(SimulatedSettings::default())
    }
}

impl SensorDriver for SimulatedDriver {
    fn label(&self) -> &'static str {
        "simulated"
    }

    fn enumerate_devices(&mut self) -> Result<Vec<DeviceInfo>, DriverError> {
        Ok((0..self.settings.device_count)
            .map(|index| DeviceInfo {
                index,
                label: format!("Simulated sensor #{}", index + 1),
            })
            .collect())
    }

    fn device_status(&self, _device: &DeviceInfo) -> DeviceStatus {
        self.settings.status
    }

    fn enable_color_stream(
        &mut self,
        device: &DeviceInfo,
        format: ColorFormat,
    ) -> Result<(), DriverError> {
        self.check_device(device)?;
        self.color_format = Some(format);
        Ok(())
    }

    fn enable_skeleton_stream(&mut self, device: &DeviceInfo) -> Result<(), DriverError> {
        self.check_device(device)?;
        self.skeletons_enabled = true;
        Ok(())
    }

    fn start(
        &mut self,
        device: &DeviceInfo,
        frame_tx: Sender<FrameSample>,
    ) -> Result<SensorStream, DriverError> {
        self.check_device(device)?;
        let claim = DeviceClaim::acquire(&self.in_use).ok_or(DriverError::Busy)?;

        let color_format = self.color_format;
        let skeletons_enabled = self.skeletons_enabled;
        let tracked_slot = self.settings.tracked_slot;
        let interval = frame_interval(self.settings.fps);

        log::info!(
            "starting {} (color: {:?}, skeletons: {skeletons_enabled})",
            device.label,
            color_format
        );

        Ok(SensorStream::spawn(Some(claim), move |stop| {
            let started = Instant::now();
            let mut tick: u64 = 0;

            while !stop.load(Ordering::Relaxed) {
                let elapsed = started.elapsed().as_secs_f32();
                let sample = FrameSample {
                    color: color_format.map(|format| paint_color_frame(format, tick)),
                    skeletons: skeletons_enabled
                        .then(|| simulated_skeletons(elapsed, tracked_slot)),
                };

                match frame_tx.try_send(sample) {
                    Ok(()) | Err(TrySendError::Full(_)) => {}
                    Err(TrySendError::Disconnected(_)) => {
                        log::debug!("frame receiver dropped, stopping simulated sensor");
                        break;
                    }
                }

                tick = tick.wrapping_add(1);
                thread::sleep(interval);
            }
        }))
    }
}

/// Skeleton slots at `elapsed` seconds: a bystander seen only as a position in
/// slot 0 and the fully tracked player in `tracked_slot`.
pub fn simulated_skeletons(elapsed: f32, tracked_slot: usize) -> SkeletonSet {
    let mut set = SkeletonSet::default();

    if tracked_slot != 0 {
        set.slots[0] = Skeleton {
            tracking_id: 1,
            tracking_state: SkeletonTrackingState::PositionOnly,
            position: BYSTANDER_POSITION,
            ..Default::default()
        };
    }

    if tracked_slot < SKELETON_SLOT_COUNT {
        set.slots[tracked_slot] = swaying_player(elapsed);
    }

    set
}

fn swaying_player(elapsed: f32) -> Skeleton {
    let hip = Position3D::new(
        0.25 * (elapsed * 0.8).sin(),
        PLAYER_HIP_HEIGHT,
        PLAYER_DISTANCE + 0.15 * (elapsed * 0.5).cos(),
    );
    let wave = (elapsed * 2.0).sin();

    let mut skeleton = Skeleton {
        tracking_id: 2,
        tracking_state: SkeletonTrackingState::Tracked,
        position: hip,
        ..Default::default()
    };

    for (joint, offset) in REFERENCE_POSE {
        let mut offset = offset;
        // The right arm waves.
        match joint {
            JointId::WristRight | JointId::HandRight => {
                offset.x += 0.12 * wave;
                offset.y += 0.45 + 0.15 * wave;
            }
            JointId::ElbowRight => offset.y += 0.15 + 0.05 * wave,
            _ => {}
        }

        skeleton[joint].position = Position3D::new(
            hip.x + offset.x,
            hip.y + offset.y,
            hip.z + offset.z,
        );
        skeleton[joint].tracking = match joint {
            JointId::FootLeft | JointId::FootRight => JointTrackingState::Inferred,
            _ => JointTrackingState::Tracked,
        };
    }

    skeleton
}

fn paint_color_frame(format: ColorFormat, tick: u64) -> ColorFrame {
    let width = format.width.max(1);
    let height = format.height.max(1);
    let shift = (tick % 256) as u32;

    let mut rgba = vec![0u8; width as usize * height as usize * 4];
    rgba.par_chunks_mut(4).enumerate().for_each(|(idx, px)| {
        let x = idx as u32 % width;
        let y = idx as u32 / width;
        px[0] = (24 + (x * 64 / width)) as u8;
        px[1] = (32 + (y * 64 / height)) as u8;
        px[2] = (64 + ((x + y + shift) % 128)) as u8;
        px[3] = 255;
    });

    ColorFrame {
        rgba,
        width,
        height,
        timestamp: Instant::now(),
    }
}
