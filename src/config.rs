// SPDX-License-Identifier: GPL-3.0-only

//! Booth configuration with JSON persistence

use crate::constants::{compositing, pipeline};
use crate::errors::{BoothError, BoothResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Kiosk configuration
///
/// Loaded from a JSON file; a missing file falls back to defaults so a
/// fresh install boots without any setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoothConfig {
    /// Camera device index (/dev/video{N})
    pub camera_port: usize,
    /// Manual shutter countdown in ticks (seconds)
    pub countdown_time: u32,
    /// Idle auto-countdown in ticks (seconds)
    pub default_countdown: u32,
    /// Shots taken per session
    pub total_photos: usize,
    /// Shots the guest picks for the collage
    pub selected_photos: usize,
    /// Final print canvas width
    pub output_width: u32,
    /// Final print canvas height
    pub output_height: u32,
    /// Frames retained for shutter capture
    pub frame_buffer_depth: usize,
    /// Printer queue name passed to lpr -P
    pub printer_name: String,
    /// Public host for download QR links
    pub download_domain: String,
    /// Root directory for per-session photo folders
    pub photos_dir: PathBuf,
    /// Directory for composed final images
    pub output_dir: PathBuf,
    /// Directory holding frame template images (+ JSON sidecars)
    pub frames_dir: PathBuf,
    /// Default frame template
    pub frame_path: PathBuf,
    /// QR code edge length on the final canvas
    pub qr_size: u32,
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            camera_port: 0,
            countdown_time: 5,
            default_countdown: 10,
            total_photos: 6,
            selected_photos: 4,
            output_width: 1200,
            output_height: 1800,
            frame_buffer_depth: pipeline::DEFAULT_FRAME_BUFFER_DEPTH,
            printer_name: "Kodak305".to_string(),
            download_domain: "localhost".to_string(),
            photos_dir: PathBuf::from("photos"),
            output_dir: PathBuf::from("output"),
            frames_dir: PathBuf::from("frames"),
            frame_path: PathBuf::from("frames/black_frame.png"),
            qr_size: compositing::DEFAULT_QR_SIZE,
        }
    }
}

impl BoothConfig {
    /// Load configuration from a JSON file
    ///
    /// A missing file is not an error; defaults are returned so the kiosk
    /// still comes up. A malformed file is an error so typos do not
    /// silently reset the booth.
    pub fn load(path: &Path) -> BoothResult<Self> {
        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let data = fs::read_to_string(path)
            .map_err(|e| BoothError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| BoothError::Config(format!("{}: {}", path.display(), e)))?;

        if config.selected_photos > config.total_photos {
            warn!(
                selected = config.selected_photos,
                total = config.total_photos,
                "selected_photos exceeds total_photos, clamping"
            );
            return Ok(Self {
                selected_photos: config.total_photos,
                ..config
            });
        }

        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> BoothResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|e| BoothError::Config(e.to_string()))?;
        fs::write(path, data)?;
        Ok(())
    }
}
