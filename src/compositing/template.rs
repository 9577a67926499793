// SPDX-License-Identifier: GPL-3.0-only

//! Frame templates: the decorative background plus slot geometry
//!
//! A template is a PNG plus an optional JSON sidecar (`{stem}.json` next
//! to the image) describing where photos and the QR code land on the
//! final canvas. Templates without a sidecar get the built-in 2x2 grid.

use crate::constants::compositing as consts;
use crate::errors::{BoothResult, CompositingError};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A rectangle on the final output canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SlotRect {
    /// Scale to a different canvas size (preview rendering)
    pub fn scaled(&self, sx: f64, sy: f64) -> SlotRect {
        SlotRect {
            x: (self.x as f64 * sx) as u32,
            y: (self.y as f64 * sy) as u32,
            width: ((self.width as f64 * sx) as u32).max(1),
            height: ((self.height as f64 * sy) as u32).max(1),
        }
    }
}

/// Sidecar file schema
#[derive(Debug, Deserialize)]
struct TemplateSidecar {
    photo_positions: Vec<SlotRect>,
    qr_position: QrPosition,
}

#[derive(Debug, Deserialize)]
struct QrPosition {
    x: u32,
    y: u32,
}

/// A loaded frame template
#[derive(Debug, Clone)]
pub struct FrameTemplate {
    /// Template image path
    pub path: PathBuf,
    /// Photo slots in final-canvas coordinates, fill order
    pub slots: Vec<SlotRect>,
    /// QR code placement in final-canvas coordinates
    pub qr_slot: SlotRect,
}

impl FrameTemplate {
    /// Load a template, reading slot geometry from the JSON sidecar
    ///
    /// A missing or unreadable sidecar falls back to the built-in 2x2
    /// layout; a missing template image is the caller's problem at
    /// compose time, not here.
    pub fn load(path: &Path) -> BoothResult<Self> {
        let sidecar_path = path.with_extension("json");

        match fs::read_to_string(&sidecar_path) {
            Ok(data) => {
                let sidecar: TemplateSidecar = serde_json::from_str(&data).map_err(|e| {
                    CompositingError::WriteFailed(format!(
                        "malformed sidecar {}: {}",
                        sidecar_path.display(),
                        e
                    ))
                })?;

                debug!(
                    template = %path.display(),
                    slots = sidecar.photo_positions.len(),
                    "Loaded template sidecar"
                );

                // The sidecar places the QR code; its size is booth
                // configuration, filled in at compose time
                Ok(Self {
                    path: path.to_path_buf(),
                    slots: sidecar.photo_positions,
                    qr_slot: SlotRect {
                        x: sidecar.qr_position.x,
                        y: sidecar.qr_position.y,
                        width: consts::DEFAULT_QR_SIZE,
                        height: consts::DEFAULT_QR_SIZE,
                    },
                })
            }
            Err(_) => {
                debug!(template = %path.display(), "No sidecar, using built-in layout");
                Ok(Self::with_builtin_layout(path))
            }
        }
    }

    /// Template using the built-in 2x2 grid
    pub fn with_builtin_layout(path: &Path) -> Self {
        let slots = consts::FALLBACK_SLOTS
            .iter()
            .map(|&(x, y, width, height)| SlotRect {
                x,
                y,
                width,
                height,
            })
            .collect();
        let (qx, qy) = consts::FALLBACK_QR_POSITION;

        Self {
            path: path.to_path_buf(),
            slots,
            qr_slot: SlotRect {
                x: qx,
                y: qy,
                width: consts::DEFAULT_QR_SIZE,
                height: consts::DEFAULT_QR_SIZE,
            },
        }
    }
}

/// Generate solid-color fallback templates into `frames_dir`
///
/// Runs when the frames directory has no usable template so the booth can
/// print something on day one. Each frame is a full-canvas solid color
/// with the photo slots outlined.
pub fn generate_color_templates(
    frames_dir: &Path,
    canvas_width: u32,
    canvas_height: u32,
) -> BoothResult<Vec<PathBuf>> {
    const COLORS: [(&str, [u8; 4]); 3] = [
        ("black", [20, 20, 20, 255]),
        ("white", [245, 245, 245, 255]),
        ("gray", [128, 128, 128, 255]),
    ];

    fs::create_dir_all(frames_dir).map_err(CompositingError::from)?;
    let mut generated = Vec::new();

    for (name, rgba) in COLORS {
        let path = frames_dir.join(format!("{}_frame.png", name));
        if path.exists() {
            continue;
        }

        let mut canvas = RgbaImage::from_pixel(canvas_width, canvas_height, Rgba(rgba));

        // Slot outlines so the template is legible before photos land
        let outline = if name == "black" {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([30, 30, 30, 255])
        };
        for &(x, y, w, h) in &consts::FALLBACK_SLOTS {
            draw_rect_outline(&mut canvas, x, y, w, h, outline);
        }

        if let Err(e) = canvas.save(&path) {
            warn!(path = %path.display(), error = %e, "Failed to write fallback template");
            return Err(CompositingError::WriteFailed(e.to_string()).into());
        }
        info!(path = %path.display(), "Generated fallback template");
        generated.push(path);
    }

    Ok(generated)
}

fn draw_rect_outline(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    let (cw, ch) = canvas.dimensions();
    const THICKNESS: u32 = 3;

    for dy in 0..h {
        for dx in 0..w {
            let on_edge =
                dx < THICKNESS || dy < THICKNESS || dx >= w - THICKNESS || dy >= h - THICKNESS;
            if !on_edge {
                continue;
            }
            let (px, py) = (x + dx, y + dy);
            if px < cw && py < ch {
                canvas.put_pixel(px, py, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sidecar_uses_builtin_layout() {
        let dir = tempfile::tempdir().unwrap();
        let template = FrameTemplate::load(&dir.path().join("plain.png")).unwrap();

        assert_eq!(template.slots.len(), 4);
        assert_eq!(
            template.slots[0],
            SlotRect {
                x: 120,
                y: 220,
                width: 410,
                height: 710
            }
        );
        assert_eq!((template.qr_slot.x, template.qr_slot.y), (1000, 50));
    }

    #[test]
    fn test_sidecar_overrides_layout() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("strip.png");
        fs::write(
            dir.path().join("strip.json"),
            r#"{
                "photo_positions": [
                    {"x": 50, "y": 50, "width": 300, "height": 400},
                    {"x": 50, "y": 500, "width": 300, "height": 400}
                ],
                "qr_position": {"x": 900, "y": 40}
            }"#,
        )
        .unwrap();

        let template = FrameTemplate::load(&image_path).unwrap();
        assert_eq!(template.slots.len(), 2);
        assert_eq!(template.slots[1].y, 500);
        assert_eq!((template.qr_slot.x, template.qr_slot.y), (900, 40));
    }

    #[test]
    fn test_malformed_sidecar_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{oops").unwrap();
        assert!(FrameTemplate::load(&dir.path().join("bad.png")).is_err());
    }

    #[test]
    fn test_slot_scaling() {
        let slot = SlotRect {
            x: 120,
            y: 220,
            width: 410,
            height: 710,
        };
        let scaled = slot.scaled(0.5, 0.5);
        assert_eq!(scaled, SlotRect {
            x: 60,
            y: 110,
            width: 205,
            height: 355
        });
    }

    #[test]
    fn test_generate_color_templates() {
        let dir = tempfile::tempdir().unwrap();
        let generated = generate_color_templates(dir.path(), 1200, 1800).unwrap();
        assert_eq!(generated.len(), 3);
        for path in &generated {
            assert!(path.exists());
        }

        // Second run generates nothing new
        let again = generate_color_templates(dir.path(), 1200, 1800).unwrap();
        assert!(again.is_empty());
    }
}
