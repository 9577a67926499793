// SPDX-License-Identifier: GPL-3.0-only

//! Photo filters applied before compositing
//!
//! All filters are deterministic per-pixel math on normalized RGB, so a
//! cached result is always identical to a recomputed one.

use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Filter applied to every selected photo in the collage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// No filter (default)
    #[default]
    None,
    /// BT.601 luminance grayscale
    Grayscale,
    /// Luminance-keyed warm duotone
    Sepia,
    /// Warm channel balance
    Warm,
    /// Cool channel balance
    Cool,
    /// Faded warm tint with lowered contrast
    Vintage,
    /// Raised contrast and saturation
    Boost,
    /// Lowered contrast and saturation
    Soft,
}

impl FilterType {
    /// All filter variants for UI iteration
    pub const ALL: [FilterType; 8] = [
        FilterType::None,
        FilterType::Grayscale,
        FilterType::Sepia,
        FilterType::Warm,
        FilterType::Cool,
        FilterType::Vintage,
        FilterType::Boost,
        FilterType::Soft,
    ];

    /// Stable identifier used in cache keys and saved session data
    pub fn id(&self) -> &'static str {
        match self {
            FilterType::None => "none",
            FilterType::Grayscale => "grayscale",
            FilterType::Sepia => "sepia",
            FilterType::Warm => "warm",
            FilterType::Cool => "cool",
            FilterType::Vintage => "vintage",
            FilterType::Boost => "boost",
            FilterType::Soft => "soft",
        }
    }

    /// Parse a stable identifier back into a filter
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.id() == id)
    }

    /// Display name for the selection screen
    pub fn display_name(&self) -> &'static str {
        match self {
            FilterType::None => "Original",
            FilterType::Grayscale => "Grayscale",
            FilterType::Sepia => "Sepia",
            FilterType::Warm => "Warm",
            FilterType::Cool => "Cool",
            FilterType::Vintage => "Vintage",
            FilterType::Boost => "Boost",
            FilterType::Soft => "Soft",
        }
    }

    /// Apply the filter, returning a new image
    pub fn apply(&self, image: &RgbImage) -> RgbImage {
        if *self == FilterType::None {
            return image.clone();
        }

        let mut out = image.clone();
        for pixel in out.pixels_mut() {
            let mut r = pixel[0] as f32 / 255.0;
            let mut g = pixel[1] as f32 / 255.0;
            let mut b = pixel[2] as f32 / 255.0;

            apply_filter_rgb(*self, &mut r, &mut g, &mut b);

            pixel[0] = (r * 255.0).round() as u8;
            pixel[1] = (g * 255.0).round() as u8;
            pixel[2] = (b * 255.0).round() as u8;
        }
        out
    }
}

/// Per-pixel filter math on normalized 0.0-1.0 RGB
fn apply_filter_rgb(filter: FilterType, r: &mut f32, g: &mut f32, b: &mut f32) {
    match filter {
        FilterType::None => {}

        FilterType::Grayscale => {
            let luminance = 0.299 * *r + 0.587 * *g + 0.114 * *b;
            *r = luminance;
            *g = luminance;
            *b = luminance;
        }

        FilterType::Sepia => {
            let luminance = 0.299 * *r + 0.587 * *g + 0.114 * *b;
            // Duotone toward cream (255, 240, 192)
            *r = (luminance * 1.2 + 0.1).clamp(0.0, 1.0);
            *g = (luminance * (240.0 / 255.0) + 0.05).clamp(0.0, 1.0);
            *b = (luminance * (192.0 / 255.0)).clamp(0.0, 1.0);
        }

        FilterType::Warm => {
            *r = (*r * 1.1).clamp(0.0, 1.0);
            *g = (*g * 0.9).clamp(0.0, 1.0);
            *b = (*b * 0.8).clamp(0.0, 1.0);
        }

        FilterType::Cool => {
            *r = (*r * 0.8).clamp(0.0, 1.0);
            *g = (*g * 0.9).clamp(0.0, 1.0);
            *b = (*b * 1.1).clamp(0.0, 1.0);
        }

        FilterType::Vintage => {
            *r = (*r * 1.2).clamp(0.0, 1.0);
            *g = (*g * 0.8).clamp(0.0, 1.0);
            *b = (*b * 0.8).clamp(0.0, 1.0);
            adjust_contrast(r, g, b, 0.8);
        }

        FilterType::Boost => {
            adjust_contrast(r, g, b, 1.2);
            adjust_saturation(r, g, b, 1.2);
        }

        FilterType::Soft => {
            adjust_contrast(r, g, b, 0.9);
            adjust_saturation(r, g, b, 0.8);
        }
    }
}

/// Scale distance from mid-gray
fn adjust_contrast(r: &mut f32, g: &mut f32, b: &mut f32, factor: f32) {
    *r = ((*r - 0.5) * factor + 0.5).clamp(0.0, 1.0);
    *g = ((*g - 0.5) * factor + 0.5).clamp(0.0, 1.0);
    *b = ((*b - 0.5) * factor + 0.5).clamp(0.0, 1.0);
}

/// Scale distance from the pixel's own luminance
fn adjust_saturation(r: &mut f32, g: &mut f32, b: &mut f32, factor: f32) {
    let luminance = 0.299 * *r + 0.587 * *g + 0.114 * *b;
    *r = (luminance + (*r - luminance) * factor).clamp(0.0, 1.0);
    *g = (luminance + (*g - luminance) * factor).clamp(0.0, 1.0);
    *b = (luminance + (*b - luminance) * factor).clamp(0.0, 1.0);
}
