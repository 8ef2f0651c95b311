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
pub enum SketchStyle {
    #[default]
    #[strum(to_string = "Realistic Pencil")]
    Pencil,
    #[strum(to_string = "Rough Charcoal")]
    Charcoal,
    #[strum(to_string = "Soft Crayon")]
    Crayon,
    #[strum(to_string = "Ink Outline")]
    Ink,
    #[strum(to_string = "Marker Sketch")]
    Marker,
}

impl SketchStyle {
    /// Styles the model may render with soft color accents. Every other
    /// style is asked for a monochrome result.
    pub fn allows_color_accents(&self) -> bool {
        matches!(self, SketchStyle::Crayon)
    }
}

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
pub enum StrokeWidth {
    Fine,
    #[default]
    Medium,
    Bold,
}

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
pub enum DetailLevel {
    Minimalist,
    #[default]
    Standard,
    Detailed,
}

/// Artistic intent of a single generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleParams {
    pub style: SketchStyle,
    pub stroke_width: StrokeWidth,
    pub detail_level: DetailLevel,
    /// Appended verbatim to the instruction.
    #[serde(default)]
    pub prompt_enhancement: String,
}

impl StyleParams {
    pub fn new(style: SketchStyle, stroke_width: StrokeWidth, detail_level: DetailLevel) -> Self {
        Self {
            style,
            stroke_width,
            detail_level,
            prompt_enhancement: String::new(),
        }
    }

    pub fn with_enhancement(mut self, enhancement: impl Into<String>) -> Self {
        self.prompt_enhancement = enhancement.into();
        self
    }
}
