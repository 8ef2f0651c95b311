use std::{
    io::{self, BufRead as _, Write as _},
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use engine::credential::{CredentialStore, SelectionFuture};
use log::{info, warn};

use crate::{Config, save_ron_file};

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Keys live in the config file. A key given on the command line or through
/// [`API_KEY_VAR`] wins over the stored one until a new key is selected.
pub struct ConfigCredentials {
    config: Mutex<Config>,
    path: PathBuf,
    override_key: Mutex<Option<String>>,
    ask: fn() -> io::Result<String>,
}

impl ConfigCredentials {
    pub fn new(config: Config, path: PathBuf, override_key: Option<String>) -> Self {
        Self {
            config: Mutex::new(config),
            path,
            override_key: Mutex::new(override_key.filter(|k| !k.trim().is_empty())),
            ask: ask_on_terminal,
        }
    }

    /// Replaces the terminal prompt, for hosts that collect the key elsewhere.
    pub fn with_prompt(mut self, ask: fn() -> io::Result<String>) -> Self {
        self.ask = ask;
        self
    }

    pub fn config(&self) -> Config {
        self.config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store_key(&self, key: String) {
        *self
            .override_key
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        let mut config = self.config.lock().unwrap_or_else(PoisonError::into_inner);
        config.api_key = key;
        match save_ron_file(&self.path, &*config) {
            Ok(()) => info!("Saved key to {}", self.path.display()),
            Err(e) => warn!("Couldn't save config: {e:?}"),
        }
    }
}

impl CredentialStore for ConfigCredentials {
    fn has_credential(&self) -> bool {
        self.api_key().is_some()
    }

    fn request_credential_selection(&self) -> SelectionFuture<'_> {
        let ask = self.ask;
        Box::pin(async move {
            match tokio::task::spawn_blocking(ask).await {
                Ok(Ok(key)) if !key.trim().is_empty() => self.store_key(key.trim().to_string()),
                Ok(Ok(_)) => warn!("No key entered"),
                Ok(Err(e)) => warn!("Couldn't read key: {e}"),
                Err(e) => warn!("Key prompt was aborted: {e}"),
            }
        })
    }

    fn api_key(&self) -> Option<String> {
        let override_key = self
            .override_key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        override_key.or_else(|| {
            let config = self.config.lock().unwrap_or_else(PoisonError::into_inner);
            (!config.api_key.trim().is_empty()).then(|| config.api_key.clone())
        })
    }
}

fn ask_on_terminal() -> io::Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "Gemini API key: ")?;
    stderr.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
