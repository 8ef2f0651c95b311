use crate::style::{DetailLevel, StyleParams};

pub const MINIMALIST_CLAUSE: &str = "Focus on main contours and shapes only. Ignore minor textures and small details. Minimalist approach.";
pub const STANDARD_CLAUSE: &str =
    "Maintain a balanced level of detail, capturing key features without overcrowding the image.";
pub const DETAILED_CLAUSE: &str =
    "Capture every texture, shadow, and fine detail. High fidelity to the original textures.";

pub const COLOR_ACCENTS_CLAUSE: &str =
    "Soft color accents are allowed, but the sketch lines must stay dominant.";
pub const MONOCHROME_CLAUSE: &str = "Keep it monochromatic, black and white only.";

impl DetailLevel {
    pub fn clause(&self) -> &'static str {
        match self {
            DetailLevel::Minimalist => MINIMALIST_CLAUSE,
            DetailLevel::Standard => STANDARD_CLAUSE,
            DetailLevel::Detailed => DETAILED_CLAUSE,
        }
    }
}

/// Builds the instruction sent alongside the source image.
///
/// The output only depends on `params`, so identical parameters always yield
/// byte-identical instructions.
pub fn compose(params: &StyleParams) -> String {
    let StyleParams {
        style,
        stroke_width,
        detail_level,
        prompt_enhancement,
    } = params;

    let detail_clause = detail_level.clause();
    let color_clause = if style.allows_color_accents() {
        COLOR_ACCENTS_CLAUSE
    } else {
        MONOCHROME_CLAUSE
    };

    let mut prompt = indoc::formatdoc! {"
        Task: Transform the attached image into a high-quality artistic sketch.

        Style Requirement: {style}
        Line Weight: {stroke_width}
        Detail Level: {detail_level}

        Instructions:
        - Maintain the original composition, perspective, and main subject details accurately.
        - {detail_clause}
        - {color_clause}
        - Ensure high contrast between the lines and the background.
        - Background should be mostly white or paper-textured appropriate for the style.
    "};

    if !prompt_enhancement.trim().is_empty() {
        prompt.push_str("- ");
        prompt.push_str(prompt_enhancement);
        prompt.push('\n');
    }

    prompt
}
