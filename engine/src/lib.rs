use crate::sketch_model::SketchModel;

pub mod credential;
pub mod error;
pub mod export;
pub mod filter;
pub mod payload;
pub mod prompt;
pub mod session;
pub mod sketch_model;
pub mod style;

pub type SketchModBox = Box<dyn SketchModel + Send + Sync>;
