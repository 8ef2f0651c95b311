use std::path::PathBuf;

use engine::{
    filter::FilterSelection,
    sketch_model::Model,
    style::{DetailLevel, SketchStyle, StrokeWidth, StyleParams},
};

#[derive(Debug, clap::Parser)]
#[command(version, about = "Turn photos into sketches")]
pub struct Cli {
    /// Overrides the stored key for this run
    #[arg(short, long)]
    pub api_key: Option<String>,

    #[arg(short, long)]
    pub model: Option<Model>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Sketch a photo and export the result
    Generate(Generate),
    /// Bake a filter into an existing image
    Filter(ApplyFilter),
    /// Print the instruction that would be sent to the model
    Prompt(StyleArgs),
    /// Print the display form of a filter
    Css {
        #[arg(short, long)]
        filter: FilterSelection,
    },
    /// Select the API key to use
    Key,
}

#[derive(Debug, clap::Args)]
pub struct Generate {
    /// Path to the photo, or a `data:` URL
    pub image: String,

    #[command(flatten)]
    pub style: StyleArgs,

    #[arg(short, long, default_value = "none")]
    pub filter: FilterSelection,

    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct ApplyFilter {
    pub image: PathBuf,

    #[arg(short, long)]
    pub filter: FilterSelection,

    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,
}

/// Unset values fall back to the configured defaults.
#[derive(Debug, Default, clap::Args)]
pub struct StyleArgs {
    #[arg(short, long)]
    pub style: Option<SketchStyle>,

    #[arg(long)]
    pub stroke_width: Option<StrokeWidth>,

    #[arg(short, long)]
    pub detail_level: Option<DetailLevel>,

    /// Extra instruction appended to the prompt
    #[arg(short, long)]
    pub prompt: Option<String>,
}

impl StyleArgs {
    pub fn resolve(&self, defaults: &StyleParams) -> StyleParams {
        StyleParams {
            style: self.style.unwrap_or(defaults.style),
            stroke_width: self.stroke_width.unwrap_or(defaults.stroke_width),
            detail_level: self.detail_level.unwrap_or(defaults.detail_level),
            prompt_enhancement: self
                .prompt
                .clone()
                .unwrap_or_else(|| defaults.prompt_enhancement.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn style_args_fall_back_to_defaults() {
        let defaults = StyleParams::new(
            SketchStyle::Charcoal,
            StrokeWidth::Bold,
            DetailLevel::Detailed,
        )
        .with_enhancement("moody");
        let args = StyleArgs {
            style: Some(SketchStyle::Ink),
            ..Default::default()
        };
        let params = args.resolve(&defaults);
        assert_eq!(params.style, SketchStyle::Ink);
        assert_eq!(params.stroke_width, StrokeWidth::Bold);
        assert_eq!(params.detail_level, DetailLevel::Detailed);
        assert_eq!(params.prompt_enhancement, "moody");
    }

    #[test]
    fn parses_generate() {
        let cli = Cli::parse_from([
            "sketchify",
            "generate",
            "cat.jpg",
            "--style",
            "crayon",
            "--filter",
            "sepia",
            "--prompt",
            "add a hat",
        ]);
        let Command::Generate(generate) = &cli.command else {
            panic!("expected generate, got {:?}", cli.command);
        };
        assert_eq!(generate.image, "cat.jpg");
        assert_eq!(generate.style.style, Some(SketchStyle::Crayon));
        assert_eq!(generate.filter, FilterSelection::Sepia);
        assert_eq!(generate.style.prompt.as_deref(), Some("add a hat"));
    }
}
