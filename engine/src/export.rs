use std::{
    fs::OpenOptions,
    io::{Cursor, Write},
    path::{Path, PathBuf},
};

use chrono::Utc;
use image::{ImageFormat, RgbaImage};
use log::{debug, info};
use strum::Display;

use crate::{
    error::ExportError,
    filter::{FilterSelection, TransformSpec, preview_transform},
    payload::GeneratedImage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ExportState {
    Idle,
    Decoding,
    Compositing,
    Serialized,
    Delivered,
    Failed,
}

/// A finished export, ready to be handed to the host for saving.
#[derive(Debug, Clone)]
pub struct FileArtifact {
    pub file_name: String,
    pub png_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// The transform that was baked into `png_bytes`
    pub transform: TransformSpec,
}

/// Hands out file names that don't repeat within one session, even for
/// exports started within the same millisecond.
#[derive(Debug, Default)]
pub struct ExportNamer {
    last_stamp: i64,
}

impl ExportNamer {
    pub fn next_name(&mut self) -> String {
        let stamp = Utc::now().timestamp_millis().max(self.last_stamp + 1);
        self.last_stamp = stamp;
        format!("sketch-{stamp}.png")
    }
}

/// One run of the export state machine.
///
/// The image and the transform are captured on construction, so changing
/// the filter afterwards has no effect on this export.
#[derive(Debug)]
pub struct ExportJob {
    image: GeneratedImage,
    filter: FilterSelection,
    transform: TransformSpec,
    state: ExportState,
}

impl ExportJob {
    pub fn new(image: GeneratedImage, filter: FilterSelection) -> Self {
        Self {
            image,
            filter,
            transform: preview_transform(filter),
            state: ExportState::Idle,
        }
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    pub fn filter(&self) -> FilterSelection {
        self.filter
    }

    fn expect_state(&self, expected: ExportState) -> Result<(), ExportError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ExportError::InvalidState {
                state: self.state,
                expected,
            })
        }
    }

    fn transition(&mut self, state: ExportState) {
        debug!("export: {} -> {state}", self.state);
        self.state = state;
    }

    /// Decodes, composites and serializes. Either the whole export succeeds
    /// or nothing is produced.
    pub async fn run(&mut self, file_name: String) -> Result<FileArtifact, ExportError> {
        self.expect_state(ExportState::Idle)?;

        match self.composite(file_name).await {
            Ok(artifact) => {
                self.transition(ExportState::Serialized);
                Ok(artifact)
            }
            Err(e) => {
                self.transition(ExportState::Failed);
                Err(e)
            }
        }
    }

    async fn composite(&mut self, file_name: String) -> Result<FileArtifact, ExportError> {
        self.transition(ExportState::Decoding);
        let payload = self.image.clone();
        let source = tokio::task::spawn_blocking(move || image::load_from_memory(payload.bytes()))
            .await?
            .map_err(ExportError::DecodeFailure)?
            .into_rgba8();

        self.transition(ExportState::Compositing);
        let transform = self.transform.clone();
        let (width, height) = source.dimensions();
        let png_bytes = tokio::task::spawn_blocking(move || {
            let target = RgbaImage::from_fn(width, height, |x, y| {
                transform.apply_to_pixel(*source.get_pixel(x, y))
            });
            encode_png(&target)
        })
        .await??;

        Ok(FileArtifact {
            file_name,
            png_bytes,
            width,
            height,
            transform: self.transform.clone(),
        })
    }

    /// Writes the artifact into `dir`. Existing files are never overwritten.
    pub fn deliver(&mut self, artifact: &FileArtifact, dir: &Path) -> Result<PathBuf, ExportError> {
        self.expect_state(ExportState::Serialized)?;

        let path = dir.join(&artifact.file_name);
        let write = || -> std::io::Result<()> {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)?;
            file.write_all(&artifact.png_bytes)
        };

        match write() {
            Ok(()) => {
                self.transition(ExportState::Delivered);
                info!("Exported {}", path.display());
                Ok(path)
            }
            Err(source) => {
                self.transition(ExportState::Failed);
                Err(ExportError::Delivery { path, source })
            }
        }
    }
}

fn encode_png(buffer: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut out = Cursor::new(Vec::new());
    buffer
        .write_to(&mut out, ImageFormat::Png)
        .map_err(ExportError::Encode)?;
    Ok(out.into_inner())
}

/// Bakes filters into downloadable PNGs.
#[derive(Debug, Default)]
pub struct ExportEncoder {
    namer: ExportNamer,
}

impl ExportEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn export(
        &mut self,
        image: &GeneratedImage,
        filter: FilterSelection,
    ) -> Result<FileArtifact, ExportError> {
        let mut job = ExportJob::new(image.clone(), filter);
        self.run(&mut job).await
    }

    pub async fn run(&mut self, job: &mut ExportJob) -> Result<FileArtifact, ExportError> {
        let name = self.namer.next_name();
        job.run(name).await
    }
}
