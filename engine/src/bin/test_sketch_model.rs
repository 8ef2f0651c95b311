use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use engine::{
    payload::SourceImage,
    sketch_model::Model,
    style::{DetailLevel, SketchStyle, StrokeWidth, StyleParams},
};

#[derive(clap::Parser)]
struct Arg {
    model: Model,
    key: String,
    input: PathBuf,
    #[arg(long, default_value = "pencil")]
    style: SketchStyle,
    #[arg(long, default_value = "medium")]
    stroke: StrokeWidth,
    #[arg(long, default_value = "standard")]
    detail: DetailLevel,
    #[arg(short, long, default_value = "output.png")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();
    let Arg {
        model,
        key,
        input,
        style,
        stroke,
        detail,
        output,
    } = Arg::parse();
    let sketcher = model.make(key);

    let source = SourceImage::from_path(&input)?;
    let params = StyleParams::new(style, stroke, detail);
    let image = sketcher.generate(&source, &params).await?;
    std::fs::write(&output, image.bytes())?;
    println!("Saved sketch, {} bytes", image.bytes().len());

    Ok(())
}
