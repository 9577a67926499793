// SPDX-License-Identifier: GPL-3.0-only

//! Collage compositing
//!
//! Renders the selected photos into a frame template, at full print size
//! (default 1200x1800, 4x6" at 300dpi) or at preview size. Both renders
//! share the same slot math, scaled, so the preview is geometrically
//! faithful to the print.

pub mod cache;
pub mod filters;
pub mod template;

pub use cache::FilterCache;
pub use filters::FilterType;
pub use template::{FrameTemplate, SlotRect, generate_color_templates};

use crate::config::BoothConfig;
use crate::constants::compositing as consts;
use crate::errors::{BoothResult, CompositingError};
use image::imageops::{self, FilterType as Resize};
use image::{Rgba, RgbaImage, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// External QR bitmap encoder
///
/// Encoding is a pure function of the URL and size; the booth only places
/// the returned bitmap.
pub trait QrEncoder {
    fn encode(&self, url: &str, size: u32) -> BoothResult<RgbaImage>;
}

/// Renders collages from saved session photos
pub struct CompositingEngine {
    cache: FilterCache,
    output_dir: PathBuf,
    /// Final print canvas; slot coordinates are defined against this
    canvas: (u32, u32),
    download_domain: String,
    qr_size: u32,
}

impl CompositingEngine {
    pub fn new(config: &BoothConfig) -> Self {
        Self {
            cache: FilterCache::new(consts::FILTER_CACHE_CAPACITY),
            output_dir: config.output_dir.clone(),
            canvas: (config.output_width, config.output_height),
            download_domain: config.download_domain.clone(),
            qr_size: config.qr_size,
        }
    }

    /// Load a saved photo and apply a filter, through the cache
    pub fn filtered_photo(&mut self, path: &Path, filter: FilterType) -> BoothResult<RgbImage> {
        let key = path.to_path_buf();
        if let Some(hit) = self.cache.get(&key, filter) {
            return Ok(hit);
        }

        let photo = image::open(path)
            .map_err(|_| CompositingError::PhotoUnreadable(path.to_path_buf()))?
            .to_rgb8();
        let filtered = filter.apply(&photo);
        self.cache.insert(key, filter, filtered.clone());
        Ok(filtered)
    }

    /// Render the collage at an arbitrary target size
    ///
    /// `selected` are the chosen photo paths in slot order; extra slots
    /// keep the template background. The QR code is placed last so it is
    /// never covered by a photo.
    pub fn compose(
        &mut self,
        selected: &[PathBuf],
        filter: FilterType,
        template: &FrameTemplate,
        width: u32,
        height: u32,
        qr_url: &str,
        qr: &dyn QrEncoder,
    ) -> BoothResult<RgbaImage> {
        let background = image::open(&template.path)
            .map_err(|_| CompositingError::TemplateMissing(template.path.clone()))?
            .to_rgba8();

        let mut canvas = if background.dimensions() == (width, height) {
            background
        } else {
            imageops::resize(&background, width, height, Resize::Lanczos3)
        };

        let sx = width as f64 / self.canvas.0 as f64;
        let sy = height as f64 / self.canvas.1 as f64;

        for (slot, path) in template.slots.iter().zip(selected.iter()) {
            let photo = self.filtered_photo(path, filter)?;
            let scaled = slot.scaled(sx, sy);
            let resized = imageops::resize(&photo, scaled.width, scaled.height, Resize::Lanczos3);
            paste_rgb(&mut canvas, &resized, scaled.x, scaled.y);
        }

        // QR size comes from config, scaled like everything else
        let qr_slot = SlotRect {
            width: self.qr_size,
            height: self.qr_size,
            ..template.qr_slot
        }
        .scaled(sx, sy);

        let qr_image = qr
            .encode(qr_url, qr_slot.width)
            .map_err(|e| CompositingError::QrFailed(e.to_string()))?;
        let qr_image = if qr_image.dimensions() == (qr_slot.width, qr_slot.height) {
            qr_image
        } else {
            imageops::resize(&qr_image, qr_slot.width, qr_slot.height, Resize::Lanczos3)
        };
        imageops::replace(&mut canvas, &qr_image, qr_slot.x as i64, qr_slot.y as i64);

        Ok(canvas)
    }

    /// Render, then atomically write the final print image
    ///
    /// Writes to a temp name and renames, so a failed render or a full
    /// disk never leaves a partial final image behind.
    pub fn generate_final_image(
        &mut self,
        session_id: u64,
        selected: &[PathBuf],
        filter: FilterType,
        template: &FrameTemplate,
        qr: &dyn QrEncoder,
    ) -> BoothResult<PathBuf> {
        let (width, height) = self.canvas;
        let url = self.download_url(session_id);
        let canvas = self.compose(selected, filter, template, width, height, &url, qr)?;

        fs::create_dir_all(&self.output_dir).map_err(CompositingError::from)?;
        let final_path = self.final_image_path(session_id);
        let tmp_path = final_path.with_extension("png.tmp");

        canvas
            .save_with_format(&tmp_path, image::ImageFormat::Png)
            .map_err(|e| CompositingError::WriteFailed(e.to_string()))?;
        if let Err(e) = fs::rename(&tmp_path, &final_path) {
            let _ = fs::remove_file(&tmp_path);
            warn!(path = %final_path.display(), error = %e, "Final image rename failed");
            return Err(CompositingError::WriteFailed(e.to_string()).into());
        }

        info!(path = %final_path.display(), session_id, "Final image written");
        Ok(final_path)
    }

    /// Render the selection-screen preview (same geometry, smaller canvas)
    pub fn compose_preview(
        &mut self,
        session_id: u64,
        selected: &[PathBuf],
        filter: FilterType,
        template: &FrameTemplate,
        qr: &dyn QrEncoder,
    ) -> BoothResult<RgbaImage> {
        let url = self.download_url(session_id);
        let preview = self.compose(
            selected,
            filter,
            template,
            consts::PREVIEW_WIDTH,
            consts::PREVIEW_HEIGHT,
            &url,
            qr,
        )?;
        debug!(session_id, "Preview composed");
        Ok(preview)
    }

    /// Where the final image for a session lands
    pub fn final_image_path(&self, session_id: u64) -> PathBuf {
        self.output_dir
            .join(format!("session_{}_final.png", session_id))
    }

    /// Public download URL encoded into the QR code
    pub fn download_url(&self, session_id: u64) -> String {
        format!(
            "https://{}/download?img=output/session_{}_final.png",
            self.download_domain, session_id
        )
    }

    /// Drop cached filter results (session teardown)
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

/// Paste an opaque RGB image onto an RGBA canvas
fn paste_rgb(canvas: &mut RgbaImage, photo: &RgbImage, x: u32, y: u32) {
    let (cw, ch) = canvas.dimensions();
    for (px, py, pixel) in photo.enumerate_pixels() {
        let (tx, ty) = (x + px, y + py);
        if tx < cw && ty < ch {
            canvas.put_pixel(tx, ty, Rgba([pixel[0], pixel[1], pixel[2], 255]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Stub encoder producing a solid black square
    pub(crate) struct SolidQr;

    impl QrEncoder for SolidQr {
        fn encode(&self, _url: &str, size: u32) -> BoothResult<RgbaImage> {
            Ok(RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 255])))
        }
    }

    fn engine_with_dirs(output_dir: &Path) -> CompositingEngine {
        let mut config = BoothConfig::default();
        config.output_dir = output_dir.to_path_buf();
        config.download_domain = "booth.test".to_string();
        CompositingEngine::new(&config)
    }

    fn write_solid_png(path: &Path, color: [u8; 3], w: u32, h: u32) {
        RgbImage::from_pixel(w, h, Rgb(color)).save(path).unwrap();
    }

    #[test]
    fn test_download_url_format() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_dirs(dir.path());
        assert_eq!(
            engine.download_url(20260823_120000),
            "https://booth.test/download?img=output/session_20260823120000_final.png"
        );
    }

    #[test]
    fn test_filtered_photo_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let photo_path = dir.path().join("p.png");
        write_solid_png(&photo_path, [200, 50, 50], 8, 8);

        let mut engine = engine_with_dirs(dir.path());
        let first = engine.filtered_photo(&photo_path, FilterType::Sepia).unwrap();

        // Delete the source: a second call must come from the cache
        fs::remove_file(&photo_path).unwrap();
        let second = engine.filtered_photo(&photo_path, FilterType::Sepia).unwrap();
        assert_eq!(first, second);

        // But a different filter misses and fails on the missing file
        assert!(engine.filtered_photo(&photo_path, FilterType::Warm).is_err());
    }

    #[test]
    fn test_missing_template_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_with_dirs(dir.path());
        let template = FrameTemplate::with_builtin_layout(&dir.path().join("gone.png"));

        let err = engine.compose(
            &[],
            FilterType::None,
            &template,
            1200,
            1800,
            "https://x/y",
            &SolidQr,
        );
        assert!(matches!(
            err,
            Err(crate::errors::BoothError::Compositing(
                CompositingError::TemplateMissing(_)
            ))
        ));
    }

    #[test]
    fn test_unreadable_photo_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("frame.png");
        RgbaImage::from_pixel(1200, 1800, Rgba([10, 10, 10, 255]))
            .save(&template_path)
            .unwrap();

        let mut engine = engine_with_dirs(dir.path());
        let template = FrameTemplate::with_builtin_layout(&template_path);

        let err = engine.compose(
            &[dir.path().join("missing.jpg")],
            FilterType::None,
            &template,
            600,
            900,
            "https://x/y",
            &SolidQr,
        );
        assert!(matches!(
            err,
            Err(crate::errors::BoothError::Compositing(
                CompositingError::PhotoUnreadable(_)
            ))
        ));
    }

    #[test]
    fn test_generate_final_image_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("frame.png");
        RgbaImage::from_pixel(1200, 1800, Rgba([10, 10, 10, 255]))
            .save(&template_path)
            .unwrap();
        let photo_path = dir.path().join("photo.png");
        write_solid_png(&photo_path, [0, 150, 0], 410, 710);

        let mut engine = engine_with_dirs(&dir.path().join("out"));
        let template = FrameTemplate::with_builtin_layout(&template_path);

        let path = engine
            .generate_final_image(
                42,
                &[photo_path],
                FilterType::None,
                &template,
                &SolidQr,
            )
            .unwrap();

        assert!(path.ends_with("session_42_final.png"));
        let written = image::open(&path).unwrap();
        assert_eq!(written.width(), 1200);
        assert_eq!(written.height(), 1800);
        // No temp file left behind
        assert!(!path.with_extension("png.tmp").exists());
    }

    #[test]
    fn test_failed_render_leaves_no_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");
        let mut engine = engine_with_dirs(&out_dir);
        let template = FrameTemplate::with_builtin_layout(&dir.path().join("gone.png"));

        let result = engine.generate_final_image(7, &[], FilterType::None, &template, &SolidQr);
        assert!(result.is_err());
        assert!(!engine.final_image_path(7).exists());
    }
}
