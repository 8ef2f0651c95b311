use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use log::{debug, info, warn};

use crate::{
    error::GenerationError,
    payload::{GeneratedImage, SourceImage},
    prompt,
    sketch_model::{GenerationFuture, Model, SketchModel},
    style::StyleParams,
};

pub mod gemini_api;
use gemini_api::{GeminiApiError, GenerateContentResponse};

/// Wording the API uses when the selected key's project can't be resolved.
const ENTITY_NOT_FOUND: &str = "Requested entity was not found";

#[derive(Clone)]
pub struct Gemini {
    model: Model,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl Gemini {
    pub fn new(model: Model, api_key: String) -> Self {
        Self {
            model,
            api_key,
            base_url: gemini_api::DEFAULT_BASE_URL.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Points the model at another endpoint, e.g. a proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl SketchModel for Gemini {
    fn generate<'a>(
        &'a self,
        image: &'a SourceImage,
        params: &'a StyleParams,
    ) -> GenerationFuture<'a> {
        Box::pin(async move {
            let prompt = prompt::compose(params);
            debug!("Composed prompt:\n{prompt}");
            let request = gemini_api::build_request(image, prompt);

            let response = gemini_api::query(
                &request,
                self.model.id(),
                &self.api_key,
                &self.base_url,
                &self.client,
            )
            .await
            .map_err(classify)?;

            let image = first_image(&response)?;
            info!("Received sketch, {} bytes", image.bytes().len());
            Ok(image)
        })
    }

    fn clone(&self) -> Box<dyn SketchModel + Send + Sync + 'static> {
        Box::new(Clone::clone(self))
    }

    fn model(&self) -> Model {
        self.model
    }
}

/// Decides whether a remote failure means the key itself is unusable.
///
/// The "entity not found" case has no dedicated status, so it can only be
/// recognized by its wording. Keep all such matching in here.
pub fn indicates_invalid_credential(err: &GeminiApiError) -> bool {
    match err {
        GeminiApiError::ApiKeyInvalid { .. }
        | GeminiApiError::Unauthenticated { .. }
        | GeminiApiError::PermissionDenied { .. } => true,
        GeminiApiError::Transport(_) | GeminiApiError::Decode(_) => false,
        other => other.message().contains(ENTITY_NOT_FOUND),
    }
}

fn classify(err: GeminiApiError) -> GenerationError {
    if indicates_invalid_credential(&err) {
        GenerationError::InvalidCredential {
            message: err.message(),
        }
    } else {
        GenerationError::remote(err.to_string())
    }
}

/// Returns the first part that carries inline image bytes.
fn first_image(response: &GenerateContentResponse) -> Result<GeneratedImage, GenerationError> {
    let inline = response
        .parts()
        .iter()
        .filter_map(|p| p.inline_data.as_ref())
        .find(|d| !d.data.is_empty());

    let Some(inline) = inline else {
        let text: Vec<&str> = response
            .parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        warn!(
            "No image in response. block reason: {:?}, text: {text:?}",
            response.block_reason()
        );
        return Err(GenerationError::NoImageInResponse);
    };

    if inline.mime_type != crate::payload::PNG_MEDIA_TYPE {
        debug!(
            "Model answered with {}, treating it as png",
            inline.mime_type
        );
    }

    let bytes = BASE64
        .decode(inline.data.as_bytes())
        .map_err(|e| GenerationError::remote(format!("invalid image data in response: {e}")))?;
    Ok(GeneratedImage::from_png_bytes(bytes))
}
