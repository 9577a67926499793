// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 capture source
//!
//! Opens /dev/video{port}, requests YUYV at the booth capture resolution
//! and converts to RGB on read. The open protocol gives the sensor a
//! settle delay before the probe read so auto-exposure has converged by
//! the time frames reach the guest-facing preview.

use std::thread;
use std::time::Instant;

use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

use crate::backends::CaptureSource;
use crate::constants::camera;
use crate::errors::{BoothResult, CameraError};
use crate::pipeline::frame::Frame;
use image::RgbImage;

/// Open device state, created on `open` and dropped on `release`
struct OpenDevice {
    // Held for the lifetime of the stream; the mmap buffers belong to it
    _device: Device,
    stream: Stream<'static>,
    width: u32,
    height: u32,
}

/// Capture source backed by a V4L2 kernel device
pub struct V4l2Source {
    port: usize,
    state: Option<OpenDevice>,
}

impl V4l2Source {
    /// Create an unopened source for /dev/video{port}
    pub fn new(port: usize) -> Self {
        Self { port, state: None }
    }

    fn open_device(&self) -> Result<OpenDevice, CameraError> {
        let port = self.port;
        let dev = Device::new(port).map_err(|e| CameraError::OpenFailed {
            port,
            reason: e.to_string(),
        })?;

        let fourcc_yuyv = FourCC::new(b"YUYV");
        let format = Format::new(camera::CAPTURE_WIDTH, camera::CAPTURE_HEIGHT, fourcc_yuyv);
        let actual = dev.set_format(&format).map_err(|e| CameraError::OpenFailed {
            port,
            reason: format!("set_format: {}", e),
        })?;

        if actual.fourcc != fourcc_yuyv {
            return Err(CameraError::OpenFailed {
                port,
                reason: format!("device refused YUYV, offered {:?}", actual.fourcc),
            });
        }

        info!(
            port,
            width = actual.width,
            height = actual.height,
            "V4L2 format configured"
        );

        let stream = Stream::with_buffers(&dev, Type::VideoCapture, camera::STREAM_BUFFERS)
            .map_err(|e| CameraError::OpenFailed {
                port,
                reason: format!("stream: {}", e),
            })?;

        Ok(OpenDevice {
            _device: dev,
            stream,
            width: actual.width,
            height: actual.height,
        })
    }
}

impl CaptureSource for V4l2Source {
    fn open(&mut self) -> BoothResult<()> {
        if self.state.is_some() {
            return Ok(());
        }

        let mut state = self.open_device()?;

        // Let auto-exposure settle before judging the device usable
        thread::sleep(camera::SETTLE_DELAY);

        // One-frame probe; a device that enumerates but cannot deliver a
        // frame is treated as absent
        match read_frame(&mut state) {
            Ok(_) => {
                info!(port = self.port, "Camera probe succeeded");
                self.state = Some(state);
                Ok(())
            }
            Err(e) => {
                warn!(port = self.port, error = %e, "Camera probe failed");
                drop(state);
                thread::sleep(camera::RELEASE_DELAY);
                Err(CameraError::ProbeFailed { port: self.port }.into())
            }
        }
    }

    fn read(&mut self) -> BoothResult<Frame> {
        let state = self.state.as_mut().ok_or(CameraError::NotOpen)?;
        Ok(read_frame(state)?)
    }

    fn release(&mut self) {
        if self.state.take().is_some() {
            debug!(port = self.port, "Releasing camera");
            // Give the kernel time to tear the stream down before a reopen
            thread::sleep(camera::RELEASE_DELAY);
        }
    }

    fn is_open(&self) -> bool {
        self.state.is_some()
    }

    fn name(&self) -> String {
        format!("v4l2:/dev/video{}", self.port)
    }
}

impl Drop for V4l2Source {
    fn drop(&mut self) {
        self.release();
    }
}

fn read_frame(state: &mut OpenDevice) -> Result<Frame, CameraError> {
    let (buf, _meta) = state
        .stream
        .next()
        .map_err(|e| CameraError::ReadFailed(e.to_string()))?;

    let expected = (state.width * state.height * 2) as usize;
    if buf.len() < expected {
        return Err(CameraError::ReadFailed(format!(
            "short YUYV buffer: {} < {}",
            buf.len(),
            expected
        )));
    }

    let rgb = yuyv_to_rgb(buf, state.width, state.height);
    let image = RgbImage::from_raw(state.width, state.height, rgb)
        .ok_or_else(|| CameraError::ReadFailed("converted buffer size mismatch".to_string()))?;

    Ok(Frame {
        image,
        captured_at: Instant::now(),
    })
}

/// Convert YUYV (YUV 4:2:2) to packed RGB
///
/// YUYV format: Y0 U0 Y1 V0 - each 4-byte group encodes 2 pixels.
/// Uses BT.601 coefficients for YUV to RGB conversion.
pub fn yuyv_to_rgb(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);

    for chunk in data.chunks_exact(4) {
        let y0 = chunk[0] as f32;
        let u = chunk[1] as f32 - 128.0;
        let y1 = chunk[2] as f32;
        let v = chunk[3] as f32 - 128.0;

        // Convert YUV to RGB (BT.601)
        for y in [y0, y1] {
            let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
            let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
            let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

            rgb.push(r);
            rgb.push(g);
            rgb.push(b);

            if rgb.len() >= pixel_count * 3 {
                break;
            }
        }

        if rgb.len() >= pixel_count * 3 {
            break;
        }
    }

    rgb
}
