use std::pin::Pin;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

pub mod gemini;
pub use gemini::Gemini;

use crate::{
    SketchModBox,
    error::GenerationError,
    payload::{GeneratedImage, SourceImage},
    style::StyleParams,
};

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
pub enum Model {
    #[default]
    #[strum(to_string = "Gemini 2.5 Flash Image")]
    Gemini25FlashImage,
    #[strum(to_string = "Gemini 3 Pro Image")]
    Gemini3ProImage,
}

impl Model {
    pub fn make(&self, key: String) -> SketchModBox {
        Box::new(Gemini::new(*self, key))
    }

    pub fn id(&self) -> &'static str {
        match self {
            Model::Gemini25FlashImage => "gemini-2.5-flash-image",
            Model::Gemini3ProImage => "gemini-3-pro-image-preview",
        }
    }
}

pub type GenerationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<GeneratedImage, GenerationError>> + Send + 'a>>;

/// A remote model that turns a photo into a sketch.
///
/// Implementations are stateless between calls. Each call makes exactly one
/// attempt, retrying is up to the caller.
pub trait SketchModel {
    fn generate<'a>(
        &'a self,
        image: &'a SourceImage,
        params: &'a StyleParams,
    ) -> GenerationFuture<'a>;

    fn clone(&self) -> Box<dyn SketchModel + Send + Sync + 'static>;
    fn model(&self) -> Model;
}
