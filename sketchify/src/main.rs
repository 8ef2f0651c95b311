use clap::Parser;
use color_eyre::Result;
use sketchify::{
    App, Config,
    cli::Cli,
    config_path,
    credentials::{API_KEY_VAR, ConfigCredentials},
    load_config, save_config,
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();
    let cli = Cli::parse();

    let cfg = match load_config()? {
        Some(cfg) => cfg,
        None => {
            save_config(&Config::default())?;
            indoc::eprintdoc! {"
                Created a default config at {}.
                Set an API key with `sketchify key`, or through the {} environment variable.
                ",
                config_path()?.display(),
                API_KEY_VAR,
            };
            Config::default()
        }
    };

    let override_key = cli.api_key.or_else(|| std::env::var(API_KEY_VAR).ok());
    let creds = ConfigCredentials::new(cfg, config_path()?, override_key);
    App::new(creds, cli.model).run(cli.command).await
}
