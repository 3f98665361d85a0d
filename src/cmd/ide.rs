//! `che-dash ide prefetch`.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use console::style;

use che_dash::api::ApiClient;
use che_dash::branding::BrandingLoader;
use che_dash::config::DashConfig;
use che_dash::ide_fetcher::{IdePrefetcher, detect_user_agent};
use che_dash::ui::LoadingSpinner;
use che_dash::ui::icons::{CHECK, GLOBE};

/// Firefox-style identity used when neither the flag nor the config names one.
const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0";

pub async fn cmd_ide_prefetch(
    config: &DashConfig,
    user_agent: Option<String>,
    document_mode: Option<u32>,
) -> Result<()> {
    let user_agent = user_agent
        .or_else(|| config.toml.ide.user_agent.clone())
        .unwrap_or_else(|| FALLBACK_USER_AGENT.to_string());
    let document_mode = document_mode.or(config.toml.ide.document_mode);
    let agent = detect_user_agent(&user_agent, document_mode);
    println!("{}Browser permutation: {}", GLOBE, style(agent).cyan());

    let client = ApiClient::new(config.api_url()).context("Failed to build API client")?;
    let loader = Arc::new(BrandingLoader::new(client.clone()));
    let prefetcher = Arc::new(IdePrefetcher::new(client, agent));

    let spinner = LoadingSpinner::start("Prefetching IDE script...");
    let task = prefetcher.clone().when_branding_ready(&loader);
    loader.load().await;
    let url = task.await.context("Prefetch task failed")?;
    spinner.finish();

    match url {
        Some(url) => {
            let size = prefetcher.cached(&url).map(|body| body.len()).unwrap_or(0);
            println!("{}Cached {} ({} bytes)", CHECK, style(&url).green(), size);
            Ok(())
        }
        None => bail!("No IDE script was prefetched for '{}'", agent),
    }
}
