// SPDX-License-Identifier: GPL-3.0-only

//! Deterministic frame generator for tests and hardware-free runs

use crate::backends::CaptureSource;
use crate::errors::{BoothResult, CameraError};
use crate::pipeline::frame::Frame;
use image::{Rgb, RgbImage};
use std::time::Instant;

/// Capture source producing a moving gradient
///
/// Frames are landscape like the real sensor and carry the frame counter
/// in their pixels, so tests can tell consecutive frames apart. An
/// optional read limit makes the source go dark after N frames to
/// exercise the no-frame error paths.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    counter: u64,
    read_limit: Option<u64>,
    open: bool,
}

impl SyntheticSource {
    /// Landscape gradient source at the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            counter: 0,
            read_limit: None,
            open: false,
        }
    }

    /// Default booth-like size
    pub fn default_size() -> Self {
        Self::new(640, 480)
    }

    /// Stop producing frames after `limit` successful reads
    ///
    /// The probe read during `open` counts against the limit.
    pub fn with_read_limit(mut self, limit: u64) -> Self {
        self.read_limit = Some(limit);
        self
    }

    fn generate(&mut self) -> Frame {
        let t = self.counter;
        let image = RgbImage::from_fn(self.width, self.height, move |x, y| {
            Rgb([
                ((x as u64 + t) % 256) as u8,
                (y % 256) as u8,
                ((x as u64 + y as u64 + t) % 256) as u8,
            ])
        });
        self.counter += 1;
        Frame {
            image,
            captured_at: Instant::now(),
        }
    }
}

impl CaptureSource for SyntheticSource {
    fn open(&mut self) -> BoothResult<()> {
        if self.open {
            return Ok(());
        }
        // Probe read, mirroring the real open protocol (no settle delay,
        // there is no sensor to converge)
        if let Some(limit) = self.read_limit {
            if self.counter >= limit {
                return Err(CameraError::ProbeFailed { port: 0 }.into());
            }
        }
        let _probe = self.generate();
        self.open = true;
        Ok(())
    }

    fn read(&mut self) -> BoothResult<Frame> {
        if !self.open {
            return Err(CameraError::NotOpen.into());
        }
        if let Some(limit) = self.read_limit {
            if self.counter >= limit {
                return Err(CameraError::ReadFailed("synthetic source exhausted".to_string()).into());
            }
        }
        Ok(self.generate())
    }

    fn release(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn name(&self) -> String {
        format!("synthetic:{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_differ_between_reads() {
        let mut source = SyntheticSource::new(32, 16);
        source.open().unwrap();
        let a = source.read().unwrap();
        let b = source.read().unwrap();
        assert_ne!(a.image, b.image);
    }

    #[test]
    fn test_read_requires_open() {
        let mut source = SyntheticSource::new(32, 16);
        assert!(source.read().is_err());
    }

    #[test]
    fn test_read_limit_exhausts() {
        // Limit of 2: one probe + one read
        let mut source = SyntheticSource::new(32, 16).with_read_limit(2);
        source.open().unwrap();
        assert!(source.read().is_ok());
        assert!(source.read().is_err());
        // Still open; only reads fail
        assert!(source.is_open());
    }

    #[test]
    fn test_zero_limit_fails_probe() {
        let mut source = SyntheticSource::new(32, 16).with_read_limit(0);
        assert!(source.open().is_err());
        assert!(!source.is_open());
    }
}
