use std::{env, fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    device::{ColorFormat, SensorDriver, SimulatedDriver, SimulatedSettings},
    types::SKELETON_SLOT_COUNT,
};

const CONFIG_PATH: &str = "limb-snapshot.toml";
const CONFIG_PATH_VAR: &str = "LIMB_SNAPSHOT_CONFIG";

const MAX_SIMULATED_FPS: u32 = 120;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorBackend {
    #[default]
    #[serde(alias = "sim")]
    Simulated,
    #[cfg(feature = "camera-nokhwa")]
    #[serde(alias = "webcam")]
    Camera,
}

/// Color stream modes the sensor offers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum ColorMode {
    #[default]
    #[serde(rename = "rgb-1280x960-12fps")]
    Rgb1280x960Fps12,
    #[serde(rename = "rgb-640x480-30fps")]
    Rgb640x480Fps30,
}

impl ColorMode {
    pub fn format(self) -> ColorFormat {
        match self {
            ColorMode::Rgb1280x960Fps12 => ColorFormat::RGB_1280X960_FPS12,
            ColorMode::Rgb640x480Fps30 => ColorFormat::RGB_640X480_FPS30,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: SensorBackend,
    #[serde(default)]
    pub color_mode: ColorMode,
    #[serde(default)]
    pub simulated: SimulatedSettings,
}

impl AppConfig {
    /// Loads the file named by `LIMB_SNAPSHOT_CONFIG`, or `limb-snapshot.toml`.
    pub fn from_env() -> Self {
        let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| CONFIG_PATH.to_string());
        Self::load_or_default(path)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    /// A missing file yields the defaults; an unreadable one is logged and
    /// also yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("{} not found, using default config", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("{err:#}; using default config");
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config.validated())
    }

    /// Replaces out-of-range simulation values with their defaults.
    fn validated(mut self) -> Self {
        let defaults = SimulatedSettings::default();
        let fps = self.simulated.fps;
        if !(1..=MAX_SIMULATED_FPS).contains(&fps) {
            log::warn!("ignoring simulated fps {fps}, expected 1..={MAX_SIMULATED_FPS}");
            self.simulated.fps = defaults.fps;
        }
        let slot = self.simulated.tracked_slot;
        if slot >= SKELETON_SLOT_COUNT {
            log::warn!("ignoring tracked slot {slot}, expected 0..{SKELETON_SLOT_COUNT}");
            self.simulated.tracked_slot = defaults.tracked_slot;
        }
        self
    }

    pub fn color_format(&self) -> ColorFormat {
        self.color_mode.format()
    }

    pub fn build_driver(&self) -> Box<dyn SensorDriver> {
        log::info!("using {:?} sensor backend", self.backend);
        match self.backend {
            SensorBackend::Simulated => Box::new(SimulatedDriver::new(self.simulated.clone())),
            #[cfg(feature = "camera-nokhwa")]
            SensorBackend::Camera => Box::new(crate::device::CameraDriver::new()),
        }
    }
}
