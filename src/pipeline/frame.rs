// SPDX-License-Identifier: GPL-3.0-only

//! Frame type and the fixed sensor-to-kiosk orientation transforms
//!
//! The camera is mounted sideways in the booth, so the raw landscape
//! stream needs a different transform for each consumer: saved shots keep
//! the full sensor area, the live preview is first cropped to 16:9 so it
//! fills the portrait screen without letterboxing.

use crate::constants::compositing::PREVIEW_ASPECT;
use image::RgbImage;
use image::imageops;
use std::time::Instant;

/// A single captured frame, owned exclusively and passed by value
#[derive(Debug, Clone)]
pub struct Frame {
    /// Pixel data, RGB8
    pub image: RgbImage,
    /// When the frame left the sensor
    pub captured_at: Instant,
}

impl Frame {
    /// Wrap a decoded image, stamping it with the current time
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            captured_at: Instant::now(),
        }
    }

    /// Frame dimensions (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Orient a raw sensor frame for saving: vertical flip, then rotate 90°
/// counter-clockwise. Landscape input becomes portrait output.
pub fn orient_capture(frame: Frame) -> Frame {
    let flipped = imageops::flip_vertical(&frame.image);
    Frame {
        image: imageops::rotate270(&flipped),
        captured_at: frame.captured_at,
    }
}

/// Undo `orient_capture`: rotate 90° clockwise, then vertical flip
pub fn orient_capture_inverse(frame: Frame) -> Frame {
    let rotated = imageops::rotate90(&frame.image);
    Frame {
        image: imageops::flip_vertical(&rotated),
        captured_at: frame.captured_at,
    }
}

/// Orient a raw sensor frame for the live preview: center-crop to 16:9,
/// rotate 90° clockwise, then vertical flip. The result is 9:16 portrait.
pub fn orient_preview(frame: Frame) -> Frame {
    let (aw, ah) = PREVIEW_ASPECT;
    let cropped = crop_to_aspect(&frame.image, aw, ah);
    let rotated = imageops::rotate90(&cropped);
    Frame {
        image: imageops::flip_vertical(&rotated),
        captured_at: frame.captured_at,
    }
}

/// Center-crop an image to the given aspect ratio
///
/// Trims left/right symmetrically when the image is wider than the target,
/// top/bottom when it is taller. Opposing margins differ by at most one
/// pixel (integer division remainder).
pub fn crop_to_aspect(image: &RgbImage, aspect_w: u32, aspect_h: u32) -> RgbImage {
    let (w, h) = image.dimensions();

    // Compare w/h against aspect_w/aspect_h without going through floats
    if w as u64 * aspect_h as u64 > h as u64 * aspect_w as u64 {
        // Too wide: trim the sides
        let new_w = (h as u64 * aspect_w as u64 / aspect_h as u64) as u32;
        let x = (w - new_w) / 2;
        imageops::crop_imm(image, x, 0, new_w, h).to_image()
    } else {
        // Too tall (or exact): trim top and bottom
        let new_h = (w as u64 * aspect_h as u64 / aspect_w as u64) as u32;
        let y = (h - new_h) / 2;
        imageops::crop_imm(image, 0, y, w, new_h).to_image()
    }
}
