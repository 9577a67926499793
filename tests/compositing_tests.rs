// SPDX-License-Identifier: GPL-3.0-only

//! Compositing geometry and pixel-fidelity tests

use image::imageops::{self, FilterType as Resize};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use photobooth::compositing::{CompositingEngine, FilterType, FrameTemplate, QrEncoder};
use photobooth::config::BoothConfig;
use photobooth::errors::BoothResult;
use std::path::{Path, PathBuf};

struct SolidQr;

impl QrEncoder for SolidQr {
    fn encode(&self, _url: &str, size: u32) -> BoothResult<RgbaImage> {
        Ok(RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 255])))
    }
}

const SLOT_COLORS: [[u8; 3]; 4] = [
    [220, 40, 40],
    [40, 220, 40],
    [40, 40, 220],
    [220, 220, 40],
];

fn setup(dir: &Path) -> (CompositingEngine, FrameTemplate, Vec<PathBuf>) {
    let mut config = BoothConfig::default();
    config.output_dir = dir.join("output");
    config.download_domain = "booth.test".to_string();

    let template_path = dir.join("frame.png");
    RgbaImage::from_pixel(1200, 1800, Rgba([10, 10, 10, 255]))
        .save(&template_path)
        .unwrap();
    let template = FrameTemplate::with_builtin_layout(&template_path);

    // Portrait source photos, solid colors so placement is checkable
    let photos: Vec<PathBuf> = SLOT_COLORS
        .iter()
        .enumerate()
        .map(|(i, &color)| {
            let path = dir.join(format!("photo_{}.png", i));
            RgbImage::from_pixel(480, 640, Rgb(color)).save(&path).unwrap();
            path
        })
        .collect();

    (CompositingEngine::new(&config), template, photos)
}

#[test]
fn test_final_compose_fills_slots_with_resized_sources() {
    let dir = tempfile::tempdir().unwrap();
    let (mut engine, template, photos) = setup(dir.path());

    let canvas = engine
        .compose(
            &photos,
            FilterType::None,
            &template,
            1200,
            1800,
            "https://booth.test/download?img=x",
            &SolidQr,
        )
        .unwrap();

    assert_eq!(canvas.dimensions(), (1200, 1800));

    for (slot, (path, &color)) in template.slots.iter().zip(photos.iter().zip(&SLOT_COLORS)) {
        // The slot region must match the same resize the engine performs
        let source = image::open(path).unwrap().to_rgb8();
        let expected = imageops::resize(&source, slot.width, slot.height, Resize::Lanczos3);

        for (dx, dy) in [(0, 0), (slot.width - 1, slot.height - 1), (slot.width / 2, slot.height / 2)] {
            let got = canvas.get_pixel(slot.x + dx, slot.y + dy);
            let want = expected.get_pixel(dx, dy);
            assert_eq!(
                [got[0], got[1], got[2]],
                [want[0], want[1], want[2]],
                "slot pixel mismatch at ({}, {}) for color {:?}",
                dx,
                dy,
                color
            );
        }
    }

    // Background survives between slots
    let gap = canvas.get_pixel(600, 100);
    assert_eq!([gap[0], gap[1], gap[2]], [10, 10, 10]);

    // QR landed at its slot (solid black stub)
    let qr = template.qr_slot;
    let qr_pixel = canvas.get_pixel(qr.x + 10, qr.y + 10);
    assert_eq!([qr_pixel[0], qr_pixel[1], qr_pixel[2]], [0, 0, 0]);
}

#[test]
fn test_preview_geometry_matches_final() {
    let dir = tempfile::tempdir().unwrap();
    let (mut engine, template, photos) = setup(dir.path());

    let preview = engine
        .compose_preview(77, &photos, FilterType::None, &template, &SolidQr)
        .unwrap();
    assert_eq!(preview.dimensions(), (600, 900));

    // Preview is half the final canvas; every slot center must carry the
    // same solid source color in both renders
    for (slot, &color) in template.slots.iter().zip(&SLOT_COLORS) {
        let scaled = slot.scaled(0.5, 0.5);
        let center = preview.get_pixel(
            scaled.x + scaled.width / 2,
            scaled.y + scaled.height / 2,
        );
        // Resampling a solid color may round by one
        for c in 0..3 {
            assert!(
                center[c].abs_diff(color[c]) <= 1,
                "slot center {:?} vs {:?}",
                center,
                color
            );
        }
    }
}

#[test]
fn test_spare_slots_keep_template_background() {
    let dir = tempfile::tempdir().unwrap();
    let (mut engine, template, photos) = setup(dir.path());

    // Only two photos for four slots
    let canvas = engine
        .compose(
            &photos[..2],
            FilterType::None,
            &template,
            1200,
            1800,
            "https://booth.test/download?img=x",
            &SolidQr,
        )
        .unwrap();

    for slot in &template.slots[2..] {
        let pixel = canvas.get_pixel(slot.x + slot.width / 2, slot.y + slot.height / 2);
        assert_eq!([pixel[0], pixel[1], pixel[2]], [10, 10, 10]);
    }
}

#[test]
fn test_filter_applies_to_every_selected_photo() {
    let dir = tempfile::tempdir().unwrap();
    let (mut engine, template, photos) = setup(dir.path());

    let canvas = engine
        .compose(
            &photos,
            FilterType::Grayscale,
            &template,
            1200,
            1800,
            "https://booth.test/download?img=x",
            &SolidQr,
        )
        .unwrap();

    for slot in &template.slots {
        let pixel = canvas.get_pixel(slot.x + slot.width / 2, slot.y + slot.height / 2);
        assert_eq!(pixel[0], pixel[1], "grayscale channels differ: {:?}", pixel);
        assert_eq!(pixel[1], pixel[2], "grayscale channels differ: {:?}", pixel);
    }
}

#[test]
fn test_repeat_compose_hits_cache_and_matches() {
    let dir = tempfile::tempdir().unwrap();
    let (mut engine, template, photos) = setup(dir.path());

    let url = "https://booth.test/download?img=x";
    let first = engine
        .compose(&photos, FilterType::Sepia, &template, 600, 900, url, &SolidQr)
        .unwrap();
    let second = engine
        .compose(&photos, FilterType::Sepia, &template, 600, 900, url, &SolidQr)
        .unwrap();

    assert_eq!(first, second);
}
