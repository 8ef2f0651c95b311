//! State of one working session: the photo, the last sketch and the active
//! filter, plus the two small state machines guarding generation and the
//! API key.

use log::{debug, info, warn};
use strum::Display;

use crate::{
    credential::CredentialStore,
    error::{GenerationError, SessionError},
    export::ExportJob,
    filter::{FilterSelection, TransformSpec, preview_transform},
    payload::{GeneratedImage, SourceImage},
    sketch_model::SketchModel,
    style::StyleParams,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum GenerationState {
    #[default]
    Idle,
    InFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum CredentialState {
    #[default]
    Missing,
    /// A selection dialog finished, but nobody checked the result yet
    Unconfirmed,
    Confirmed,
}

/// Everything a single generation call needs, copied out of the session.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub image: SourceImage,
    pub params: StyleParams,
}

#[derive(Debug, Default)]
pub struct Session {
    source: Option<SourceImage>,
    generated: Option<GeneratedImage>,
    filter: FilterSelection,
    params: StyleParams,
    generation: GenerationState,
    credential: CredentialState,
}

impl Session {
    pub fn new(params: StyleParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn set_source(&mut self, image: SourceImage) {
        self.source = Some(image);
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn generated(&self) -> Option<&GeneratedImage> {
        self.generated.as_ref()
    }

    pub fn params(&self) -> &StyleParams {
        &self.params
    }

    pub fn set_params(&mut self, params: StyleParams) {
        self.params = params;
    }

    pub fn filter(&self) -> FilterSelection {
        self.filter
    }

    /// Only changes what is displayed, the generated image stays as it is.
    pub fn select_filter(&mut self, filter: FilterSelection) {
        debug!("filter: {} -> {filter}", self.filter);
        self.filter = filter;
    }

    pub fn preview(&self) -> TransformSpec {
        preview_transform(self.filter)
    }

    pub fn generation_state(&self) -> GenerationState {
        self.generation
    }

    pub fn credential_state(&self) -> CredentialState {
        self.credential
    }

    pub fn refresh_credential(&mut self, store: &dyn CredentialStore) -> CredentialState {
        self.credential = if store.has_credential() {
            CredentialState::Confirmed
        } else {
            CredentialState::Missing
        };
        self.credential
    }

    pub async fn request_credential_selection(&mut self, store: &dyn CredentialStore) {
        store.request_credential_selection().await;
        self.credential = CredentialState::Unconfirmed;
    }

    /// Moves generation from `Idle` to `InFlight`. A credential that isn't
    /// confirmed is checked again first.
    pub fn begin_generation(
        &mut self,
        store: &dyn CredentialStore,
    ) -> Result<GenerationRequest, SessionError> {
        if self.generation == GenerationState::InFlight {
            return Err(SessionError::GenerationInFlight);
        }
        let image = self.source.clone().ok_or(SessionError::NoSourceImage)?;

        if self.credential != CredentialState::Confirmed
            && self.refresh_credential(store) != CredentialState::Confirmed
        {
            return Err(SessionError::MissingCredential);
        }

        self.generation = GenerationState::InFlight;
        Ok(GenerationRequest {
            image,
            params: self.params.clone(),
        })
    }

    /// Moves generation back to `Idle`. A failure leaves the previous sketch
    /// in place.
    pub fn complete_generation(
        &mut self,
        result: Result<GeneratedImage, GenerationError>,
    ) -> Result<(), SessionError> {
        if self.generation != GenerationState::InFlight {
            return Err(SessionError::NoGenerationInFlight);
        }
        self.generation = GenerationState::Idle;

        match result {
            Ok(image) => {
                self.generated = Some(image);
                self.filter = FilterSelection::None;
                Ok(())
            }
            Err(e) => {
                if e.is_invalid_credential() {
                    warn!("Credential rejected by the remote: {e}");
                    self.credential = CredentialState::Missing;
                }
                Err(e.into())
            }
        }
    }

    pub async fn generate(
        &mut self,
        model: &(dyn SketchModel + Send + Sync),
        store: &dyn CredentialStore,
    ) -> Result<GeneratedImage, SessionError> {
        let GenerationRequest { image, params } = self.begin_generation(store)?;
        info!("Generating with {} ({})", model.model(), params.style);
        let result = model.generate(&image, &params).await;
        self.complete_generation(result)?;
        self.generated.clone().ok_or(SessionError::NothingToExport)
    }

    /// Captures the current sketch and filter for an export.
    pub fn begin_export(&self) -> Result<ExportJob, SessionError> {
        match &self.generated {
            Some(image) => Ok(ExportJob::new(image.clone(), self.filter)),
            None => Err(SessionError::NothingToExport),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{
        credential::SelectionFuture,
        export::ExportState,
        sketch_model::{GenerationFuture, Model},
        style::{DetailLevel, SketchStyle, StrokeWidth},
    };

    #[derive(Default)]
    struct FakeStore {
        has_key: AtomicBool,
        selections: AtomicUsize,
    }

    impl FakeStore {
        fn with_key() -> Self {
            let store = Self::default();
            store.has_key.store(true, Ordering::SeqCst);
            store
        }
    }

    impl CredentialStore for FakeStore {
        fn has_credential(&self) -> bool {
            self.has_key.load(Ordering::SeqCst)
        }

        fn request_credential_selection(&self) -> SelectionFuture<'_> {
            Box::pin(async move {
                self.selections.fetch_add(1, Ordering::SeqCst);
            })
        }

        fn api_key(&self) -> Option<String> {
            self.has_credential().then(|| "key".to_string())
        }
    }

    #[derive(Clone)]
    struct FakeModel {
        answer: fn() -> Result<GeneratedImage, GenerationError>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeModel {
        fn new(answer: fn() -> Result<GeneratedImage, GenerationError>) -> Self {
            Self {
                answer,
                calls: Arc::default(),
            }
        }
    }

    impl SketchModel for FakeModel {
        fn generate<'a>(
            &'a self,
            _image: &'a SourceImage,
            _params: &'a StyleParams,
        ) -> GenerationFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { (self.answer)() })
        }

        fn clone(&self) -> Box<dyn SketchModel + Send + Sync + 'static> {
            Box::new(Clone::clone(self))
        }

        fn model(&self) -> Model {
            Model::default()
        }
    }

    fn sketch(byte: u8) -> GeneratedImage {
        GeneratedImage::from_png_bytes(vec![byte])
    }

    fn session_with_source() -> Session {
        let mut session = Session::new(StyleParams::new(
            SketchStyle::Ink,
            StrokeWidth::Fine,
            DetailLevel::Minimalist,
        ));
        session.set_source(SourceImage::new(vec![9u8], "image/jpeg"));
        session
    }

    #[test]
    fn needs_a_source() {
        let mut session = Session::default();
        assert!(matches!(
            session.begin_generation(&FakeStore::with_key()),
            Err(SessionError::NoSourceImage)
        ));
    }

    #[test]
    fn one_generation_at_a_time() {
        let store = FakeStore::with_key();
        let mut session = session_with_source();
        let request = session.begin_generation(&store).unwrap();
        assert_eq!(request.params.style, SketchStyle::Ink);
        assert_eq!(session.generation_state(), GenerationState::InFlight);

        assert!(matches!(
            session.begin_generation(&store),
            Err(SessionError::GenerationInFlight)
        ));

        session.complete_generation(Ok(sketch(1))).unwrap();
        assert_eq!(session.generation_state(), GenerationState::Idle);
        assert!(matches!(
            session.complete_generation(Ok(sketch(2))),
            Err(SessionError::NoGenerationInFlight)
        ));
    }

    #[tokio::test]
    async fn success_replaces_image_and_resets_filter() {
        let store = FakeStore::with_key();
        let mut session = session_with_source();
        let first = FakeModel::new(|| Ok(sketch(1)));
        session.generate(&first, &store).await.unwrap();
        session.select_filter(FilterSelection::Sepia);

        let image = session
            .generate(&FakeModel::new(|| Ok(sketch(2))), &store)
            .await
            .unwrap();
        assert_eq!(image, sketch(2));
        assert_eq!(session.generated(), Some(&sketch(2)));
        assert_eq!(session.filter(), FilterSelection::None);
    }

    #[tokio::test]
    async fn failure_keeps_previous_image() {
        let store = FakeStore::with_key();
        let mut session = session_with_source();
        let first = FakeModel::new(|| Ok(sketch(1)));
        session.generate(&first, &store).await.unwrap();
        session.select_filter(FilterSelection::Warm);

        let failing = FakeModel::new(|| Err(GenerationError::NoImageInResponse));
        let err = session.generate(&failing, &store).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Generation(GenerationError::NoImageInResponse)
        ));
        assert_eq!(session.generated(), Some(&sketch(1)));
        assert_eq!(session.filter(), FilterSelection::Warm);
        assert_eq!(session.generation_state(), GenerationState::Idle);
        assert_eq!(session.credential_state(), CredentialState::Confirmed);
    }

    #[tokio::test]
    async fn rejected_key_needs_new_selection() {
        let store = FakeStore::with_key();
        let mut session = session_with_source();
        let rejecting = FakeModel::new(|| {
            Err(GenerationError::InvalidCredential {
                message: "Requested entity was not found.".into(),
            })
        });

        let err = session.generate(&rejecting, &store).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Generation(GenerationError::InvalidCredential { .. })
        ));
        assert_eq!(session.credential_state(), CredentialState::Missing);
    }

    #[tokio::test]
    async fn selection_is_verified_before_the_next_call() {
        let store = FakeStore::default();
        let mut session = session_with_source();
        let model = FakeModel::new(|| Ok(sketch(1)));

        session.request_credential_selection(&store).await;
        assert_eq!(store.selections.load(Ordering::SeqCst), 1);
        assert_eq!(session.credential_state(), CredentialState::Unconfirmed);

        // the dialog closed without a key
        let err = session.generate(&model, &store).await.unwrap_err();
        assert!(matches!(err, SessionError::MissingCredential));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.generation_state(), GenerationState::Idle);

        store.has_key.store(true, Ordering::SeqCst);
        session.generate(&model, &store).await.unwrap();
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.credential_state(), CredentialState::Confirmed);
    }

    #[tokio::test]
    async fn export_captures_filter_at_start() {
        let store = FakeStore::with_key();
        let mut session = session_with_source();
        assert!(matches!(
            session.begin_export(),
            Err(SessionError::NothingToExport)
        ));

        let first = FakeModel::new(|| Ok(sketch(1)));
        session.generate(&first, &store).await.unwrap();
        session.select_filter(FilterSelection::Sepia);
        let job = session.begin_export().unwrap();
        session.select_filter(FilterSelection::Cool);

        assert_eq!(job.filter(), FilterSelection::Sepia);
        assert_eq!(job.state(), ExportState::Idle);
        assert_eq!(session.generated(), Some(&sketch(1)));
        assert_eq!(session.preview(), preview_transform(FilterSelection::Cool));
    }
}
