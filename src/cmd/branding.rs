//! `che-dash branding show`.

use anyhow::{Context, Result};
use console::style;

use che_dash::api::ApiClient;
use che_dash::branding::BrandingLoader;
use che_dash::config::DashConfig;

pub async fn cmd_branding_show(config: &DashConfig, json: bool) -> Result<()> {
    let client = ApiClient::new(config.api_url()).context("Failed to build API client")?;
    let loader = BrandingLoader::new(client);
    let branding = loader.load().await;

    if json {
        let out = serde_json::to_string_pretty(&branding).context("Failed to serialize branding")?;
        println!("{}", out);
        return Ok(());
    }

    let version = loader.product_version();
    println!();
    println!("{}", style(&branding.title).bold());
    println!("{}", "=".repeat(branding.title.chars().count()));
    println!();
    println!("  name             = \"{}\"", branding.name);
    println!(
        "  version          = \"{}\"",
        if version.is_empty() { "unknown" } else { &version }
    );
    println!("  logo             = \"{}\"", branding.logo_url);
    println!("  logo_text        = \"{}\"", branding.logo_text);
    println!("  favicon          = \"{}\"", branding.favicon);
    println!("  loader           = \"{}\"", branding.loader_url);
    println!("  ide_resources    = \"{}\"", branding.ide_resources_path);
    println!("  help             = \"{}\" ({})", branding.help_path, branding.help_title);
    println!("  support_email    = \"{}\"", branding.support_email);
    println!("  cli              = {} ({})", branding.cli.name, branding.cli.config_name);
    println!("  docs.stack       = \"{}\"", branding.docs.stack);
    println!("  docs.workspace   = \"{}\"", branding.docs.workspace);
    println!();
    Ok(())
}
