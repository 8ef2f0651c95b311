//! Encoded image payloads handed between the host, the model and the exporter.
//!
//! Both payload types are immutable. Cloning one only bumps a reference count,
//! so every call works on its own handle and nothing is updated in place.

use std::{fs, path::Path, sync::Arc};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use color_eyre::{Result, eyre::WrapErr as _};
use image::ImageFormat;

pub const PNG_MEDIA_TYPE: &str = "image/png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Arc<[u8]>,
    media_type: Arc<str>,
}

impl EncodedImage {
    pub fn new(bytes: impl Into<Arc<[u8]>>, media_type: impl Into<Arc<str>>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.to_base64())
    }
}

/// Splits `data:<media type>;base64,<data>` into its media type and data.
/// Anything else is returned unchanged as data without a media type.
pub fn split_data_url(src: &str) -> (Option<&str>, &str) {
    let Some(rest) = src.strip_prefix("data:") else {
        return (None, src);
    };
    match rest.split_once(";base64,") {
        Some((params, data)) => {
            let media_type = params.split_once(';').map_or(params, |(m, _)| m);
            (Some(media_type), data)
        }
        None => (None, src),
    }
}

/// The photo supplied by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage(EncodedImage);

impl SourceImage {
    pub fn new(bytes: impl Into<Arc<[u8]>>, media_type: impl Into<Arc<str>>) -> Self {
        Self(EncodedImage::new(bytes, media_type))
    }

    /// Accepts base64 data with or without a data-URL prefix. Without a
    /// prefix the media type is sniffed from the decoded bytes.
    pub fn from_base64(src: &str) -> Result<Self> {
        let (media_type, data) = split_data_url(src.trim());
        let bytes = BASE64
            .decode(data.trim())
            .wrap_err("source image is not valid base64")?;
        let media_type = match media_type {
            Some(m) => m.to_string(),
            None => sniff_media_type(&bytes).to_string(),
        };
        Ok(Self::new(bytes, media_type))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .wrap_err_with(|| format!("couldn't read {}", path.display()))?;
        let media_type = image::guess_format(&bytes)
            .or_else(|_| ImageFormat::from_path(path))
            .map(|f| f.to_mime_type())
            .unwrap_or(PNG_MEDIA_TYPE);
        Ok(Self::new(bytes, media_type))
    }

    pub fn encoded(&self) -> &EncodedImage {
        &self.0
    }
}

/// The result of one successful generation. The model's output is always
/// treated as PNG, whatever the source was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage(EncodedImage);

impl GeneratedImage {
    pub fn from_png_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(EncodedImage::new(bytes, PNG_MEDIA_TYPE))
    }

    pub fn encoded(&self) -> &EncodedImage {
        &self.0
    }

    pub fn bytes(&self) -> &[u8] {
        self.0.bytes()
    }

    pub fn to_data_url(&self) -> String {
        self.0.to_data_url()
    }
}

fn sniff_media_type(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or(PNG_MEDIA_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_strips_prefix() {
        assert_eq!(
            split_data_url("data:image/jpeg;base64,AAAA"),
            (Some("image/jpeg"), "AAAA")
        );
        assert_eq!(
            split_data_url("data:image/png;name=x.png;base64,AAAA"),
            (Some("image/png"), "AAAA")
        );
        assert_eq!(split_data_url("AAAA"), (None, "AAAA"));
        assert_eq!(
            split_data_url("data:text/plain,hi"),
            (None, "data:text/plain,hi")
        );
    }

    #[test]
    fn source_from_data_url_keeps_declared_type() -> Result<()> {
        let src = SourceImage::from_base64("data:image/webp;base64,AAECAw==")?;
        assert_eq!(src.encoded().media_type(), "image/webp");
        assert_eq!(src.encoded().bytes(), &[0, 1, 2, 3]);
        assert_eq!(src.encoded().to_base64(), "AAECAw==");
        Ok(())
    }

    #[test]
    fn invalid_base64_is_rejected() {
        assert!(SourceImage::from_base64("data:image/png;base64,***").is_err());
    }

    #[test]
    fn generated_image_is_always_png() {
        let img = GeneratedImage::from_png_bytes(vec![1u8, 2, 3]);
        assert_eq!(img.to_data_url(), "data:image/png;base64,AQID");
    }
}
