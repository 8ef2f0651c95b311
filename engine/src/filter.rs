//! Named color filters.
//!
//! Every filter resolves to one [`TransformSpec`]: an ordered list of color
//! operations. The preview (a CSS `filter` value, or [`render_preview`] for
//! hosts that draw pixels themselves) and the export both read that same list,
//! so what is shown is what gets baked.
//!
//! The operations follow the matrices of the W3C Filter Effects shorthand
//! functions and work on non-linear sRGB values in `0.0..=1.0`. Results are
//! clamped after every operation and quantized once at the end.

use std::fmt;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

#[derive(
    Debug,
    Clone,
    Copy,
    Display,
    clap::ValueEnum,
    Serialize,
    Deserialize,
    Hash,
    PartialEq,
    Eq,
    EnumIter,
    Default,
)]
pub enum FilterSelection {
    #[default]
    None,
    Grayscale,
    Sepia,
    Cool,
    Warm,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    Grayscale(f32),
    Sepia(f32),
    Saturate(f32),
    /// degrees
    HueRotate(f32),
    Contrast(f32),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformSpec {
    ops: Vec<FilterOp>,
}

/// The single source of truth for what each filter does.
pub fn preview_transform(filter: FilterSelection) -> TransformSpec {
    use FilterOp::*;
    let ops = match filter {
        FilterSelection::None => vec![],
        FilterSelection::Grayscale => vec![Grayscale(1.0), Contrast(1.1)],
        FilterSelection::Sepia => vec![Sepia(0.8), Contrast(1.1)],
        FilterSelection::Cool => vec![Sepia(1.0), HueRotate(180.0), Saturate(1.5), Contrast(1.1)],
        FilterSelection::Warm => vec![Sepia(0.4), Saturate(1.4), Contrast(1.05)],
    };
    TransformSpec { ops }
}

impl TransformSpec {
    pub fn ops(&self) -> &[FilterOp] {
        &self.ops
    }

    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }

    /// Display-time form, usable as a CSS or canvas `filter` value
    pub fn to_css(&self) -> String {
        if self.ops.is_empty() {
            return "none".into();
        }
        self.ops
            .iter()
            .map(FilterOp::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn apply_to_pixel(&self, px: Rgba<u8>) -> Rgba<u8> {
        if self.ops.is_empty() {
            return px;
        }
        let Rgba([r, g, b, a]) = px;
        let mut rgb = [r, g, b].map(|c| c as f32 / 255.0);
        for op in &self.ops {
            rgb = op.apply(rgb).map(|c| c.clamp(0.0, 1.0));
        }
        let [r, g, b] = rgb.map(|c| (c * 255.0).round() as u8);
        Rgba([r, g, b, a])
    }

    /// Bakes the transform into `buffer`.
    pub fn apply_in_place(&self, buffer: &mut RgbaImage) {
        if self.ops.is_empty() {
            return;
        }
        for px in buffer.pixels_mut() {
            *px = self.apply_to_pixel(*px);
        }
    }
}

/// Renders the preview into a fresh buffer and leaves `image` alone.
pub fn render_preview(image: &RgbaImage, filter: FilterSelection) -> RgbaImage {
    let mut preview = image.clone();
    preview_transform(filter).apply_in_place(&mut preview);
    preview
}

type Matrix = [[f32; 3]; 3];

impl FilterOp {
    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        match *self {
            FilterOp::Grayscale(amount) => mul(&grayscale(amount), rgb),
            FilterOp::Sepia(amount) => mul(&sepia(amount), rgb),
            FilterOp::Saturate(amount) => mul(&saturate(amount), rgb),
            FilterOp::HueRotate(degrees) => mul(&hue_rotate(degrees), rgb),
            FilterOp::Contrast(amount) => {
                let amount = amount.max(0.0);
                rgb.map(|c| (c - 0.5) * amount + 0.5)
            }
        }
    }
}

fn grayscale(amount: f32) -> Matrix {
    let s = 1.0 - amount.clamp(0.0, 1.0);
    [
        [
            0.2126 + 0.7874 * s,
            0.7152 - 0.7152 * s,
            0.0722 - 0.0722 * s,
        ],
        [
            0.2126 - 0.2126 * s,
            0.7152 + 0.2848 * s,
            0.0722 - 0.0722 * s,
        ],
        [
            0.2126 - 0.2126 * s,
            0.7152 - 0.7152 * s,
            0.0722 + 0.9278 * s,
        ],
    ]
}

fn sepia(amount: f32) -> Matrix {
    let s = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.393 + 0.607 * s, 0.769 - 0.769 * s, 0.189 - 0.189 * s],
        [0.349 - 0.349 * s, 0.686 + 0.314 * s, 0.168 - 0.168 * s],
        [0.272 - 0.272 * s, 0.534 - 0.534 * s, 0.131 + 0.869 * s],
    ]
}

fn saturate(amount: f32) -> Matrix {
    let s = amount.max(0.0);
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn hue_rotate(degrees: f32) -> Matrix {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

fn mul(m: &Matrix, [r, g, b]: [f32; 3]) -> [f32; 3] {
    m.map(|row| row[0] * r + row[1] * g + row[2] * b)
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterOp::Grayscale(a) => write!(f, "grayscale({a})"),
            FilterOp::Sepia(a) => write!(f, "sepia({a})"),
            FilterOp::Saturate(a) => write!(f, "saturate({a})"),
            FilterOp::HueRotate(deg) => write!(f, "hue-rotate({deg}deg)"),
            FilterOp::Contrast(a) => write!(f, "contrast({a})"),
        }
    }
}
