use std::error::Error;
use std::time::Instant;

use engine::app::{AppConfig, AppError, run_app};
use tracing_subscriber::EnvFilter;

use constellation::Experience;
use constellation::assets::PointSets;
use constellation::config::{ConfigStore, ExperienceConfig, env_bool};
use constellation::overlay::static_content;
use constellation::quote::HttpQuoteProvider;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match ConfigStore::from_env().load() {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("config rejected, using defaults: {err}");
            ExperienceConfig::default().with_env_overrides()
        }
    };
    let fallback_text = static_content(&config);

    let mut experience = Experience::mount(config, PointSets::default(), Instant::now())?;
    if let Some(url) = experience.config().quote_url.clone() {
        tracing::info!(%url, "fetching decorative quote");
        experience = experience.with_quote_provider(&HttpQuoteProvider::new(url));
    }

    let app_config = AppConfig {
        title: "Constellation".into(),
        vsync: env_bool("CONSTELLATION_VSYNC").or(Some(true)),
        ..AppConfig::default()
    };

    match run_app(app_config, experience) {
        Ok(()) => Ok(()),
        Err(err @ (AppError::Window(_) | AppError::RenderContext(_))) => {
            // No drawing surface: show the story as text instead.
            tracing::warn!("no drawing surface ({err}); printing static content");
            print!("{fallback_text}");
            Ok(())
        }
    }
}
