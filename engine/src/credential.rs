use std::pin::Pin;

pub type SelectionFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Access to the API key, owned by the host.
pub trait CredentialStore {
    fn has_credential(&self) -> bool;

    /// Runs the host's key selection flow. Finishing it says nothing about
    /// whether a usable key was actually picked.
    fn request_credential_selection(&self) -> SelectionFuture<'_>;

    fn api_key(&self) -> Option<String>;
}
