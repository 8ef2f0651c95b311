use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::{
    Result,
    eyre::{WrapErr as _, bail, eyre},
};
use engine::{
    credential::CredentialStore as _,
    error::SessionError,
    export::{ExportEncoder, ExportJob},
    filter::preview_transform,
    payload::{GeneratedImage, SourceImage},
    prompt,
    session::{CredentialState, Session},
    sketch_model::Model,
    style::StyleParams,
};
use log::{info, warn};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    cli::{ApplyFilter, Command, Generate},
    credentials::ConfigCredentials,
};

pub mod cli;
pub mod credentials;

/// How often a rejected key may be replaced before giving up on a generation.
const MAX_KEY_SELECTIONS: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: String,
    pub model: Model,
    /// Exports land in the working directory when unset
    pub output_dir: Option<PathBuf>,
    pub defaults: StyleParams,
}

pub fn load_ron_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let src = fs::read_to_string(path)?;
    Ok(ron::from_str(&src)?)
}

pub fn save_ron_file<T: Serialize>(path: &Path, x: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    Ok(fs::write(path, ron::ser::to_string_pretty(x, Default::default())?)?)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(dirs::config_local_dir()
        .ok_or(eyre!("Couldn't get config dir"))?
        .join("sketchify.ron"))
}

pub fn load_config() -> Result<Option<Config>> {
    load_config_at(&config_path()?)
}

pub fn load_config_at(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        Ok(None)
    } else {
        load_ron_file(path)
            .map(Some)
            .wrap_err_with(|| format!("Couldn't load config from {}", path.display()))
    }
}

pub fn save_config(cfg: &Config) -> Result<()> {
    save_ron_file(&config_path()?, cfg)
}

/// Reads the photo to sketch, either inline as a `data:` URL or from a file.
pub fn load_source(src: &str) -> Result<SourceImage> {
    if src.starts_with("data:") {
        SourceImage::from_base64(src)
    } else {
        SourceImage::from_path(Path::new(src))
    }
}

pub struct App {
    creds: ConfigCredentials,
    model: Model,
    encoder: ExportEncoder,
}

impl App {
    pub fn new(creds: ConfigCredentials, model_override: Option<Model>) -> Self {
        let model = model_override.unwrap_or(creds.config().model);
        Self {
            creds,
            model,
            encoder: ExportEncoder::new(),
        }
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        let config = self.creds.config();
        match command {
            Command::Generate(args) => {
                let path = self.generate(args, &config).await?;
                println!("{}", path.display());
            }
            Command::Filter(args) => {
                let path = self.apply_filter(args, &config).await?;
                println!("{}", path.display());
            }
            Command::Prompt(style) => {
                print!("{}", prompt::compose(&style.resolve(&config.defaults)))
            }
            Command::Css { filter } => println!("{}", preview_transform(filter).to_css()),
            Command::Key => self.select_key().await?,
        }
        Ok(())
    }

    async fn select_key(&self) -> Result<()> {
        let mut session = Session::default();
        session.request_credential_selection(&self.creds).await;
        if session.refresh_credential(&self.creds) != CredentialState::Confirmed {
            bail!("No API key selected");
        }
        info!("API key selected");
        Ok(())
    }

    async fn generate(&mut self, args: Generate, config: &Config) -> Result<PathBuf> {
        let Generate {
            image,
            style,
            filter,
            out_dir,
        } = args;
        let mut session = Session::new(style.resolve(&config.defaults));
        session.set_source(load_source(&image)?);

        let mut selections = 0;
        loop {
            let sketcher = self.model.make(self.creds.api_key().unwrap_or_default());
            match session.generate(&*sketcher, &self.creds).await {
                Ok(_) => break,
                Err(SessionError::MissingCredential) => {}
                Err(SessionError::Generation(e)) if e.is_invalid_credential() => warn!("{e}"),
                Err(e) => return Err(e.into()),
            }
            if selections == MAX_KEY_SELECTIONS {
                bail!("No usable API key, run `sketchify key` to select one");
            }
            selections += 1;
            session.request_credential_selection(&self.creds).await;
        }

        session.select_filter(filter);
        let job = session.begin_export()?;
        self.export(job, out_dir.as_deref().or(config.output_dir.as_deref()))
            .await
    }

    async fn apply_filter(&mut self, args: ApplyFilter, config: &Config) -> Result<PathBuf> {
        let bytes = fs::read(&args.image)
            .wrap_err_with(|| format!("Couldn't read {}", args.image.display()))?;
        let job = ExportJob::new(GeneratedImage::from_png_bytes(bytes), args.filter);
        self.export(job, args.out_dir.as_deref().or(config.output_dir.as_deref()))
            .await
    }

    async fn export(&mut self, mut job: ExportJob, dir: Option<&Path>) -> Result<PathBuf> {
        let dir = dir.unwrap_or(Path::new("."));
        fs::create_dir_all(dir)?;
        let artifact = self.encoder.run(&mut job).await?;
        info!(
            "Exporting {}x{} with {}",
            artifact.width,
            artifact.height,
            artifact.transform.to_css()
        );
        Ok(job.deliver(&artifact, dir)?)
    }
}
