//! Configuration view and validation commands — `che-dash config`.

use anyhow::Result;

use che_dash::config::{CONFIG_FILE, DashConfig, DashToml};

use super::super::ConfigCommands;

pub fn cmd_config(config: &DashConfig, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = config.config_path();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("che-dash Configuration");
            println!("======================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No {} found at {}", CONFIG_FILE, config_path.display());
                println!("Using default configuration.");
            }
            println!();

            let toml = &config.toml;
            println!("[api]");
            match &toml.api.url {
                Some(url) => println!("  url = \"{}\"", url),
                None => println!("  # url unset"),
            }
            println!();
            println!("[list]");
            println!("  page_size = {}", toml.list.page_size);
            println!();
            if toml.ide.user_agent.is_some() || toml.ide.document_mode.is_some() {
                println!("[ide]");
                if let Some(ua) = &toml.ide.user_agent {
                    println!("  user_agent = \"{}\"", ua);
                }
                if let Some(mode) = toml.ide.document_mode {
                    println!("  document_mode = {}", mode);
                }
                println!();
            }
            println!("[logging]");
            println!("  level = \"{}\"", toml.logging.level);
            println!("  format = \"{}\"", toml.logging.format);
            if let Some(dir) = &toml.logging.dir {
                println!("  dir = \"{}\"", dir.display());
            }
            println!();

            println!("Effective values (with env/CLI overrides):");
            println!("  api_url = \"{}\"", config.api_url());
            println!("  page_size = {}", config.page_size());
            println!();

            if !config_path.exists() {
                println!("Run 'che-dash config init' to create a {} file.", CONFIG_FILE);
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No {} found. Using defaults (valid).", CONFIG_FILE);
            }

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("{} already exists at {}", CONFIG_FILE, config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            DashToml::default().save(&config_path)?;

            println!("Created {} at {}", CONFIG_FILE, config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [api] url");
            println!("  - [list] page_size");
            println!("  - [ide] user_agent, document_mode");
            println!("  - [logging] level, format, dir");
            println!();
        }
    }

    Ok(())
}
