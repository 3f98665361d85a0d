//! Layered configuration: `.che-dash/dash.toml` → environment → CLI flags.
//!
//! Example `.che-dash/dash.toml`:
//!
//! ```toml
//! [api]
//! url = "http://localhost:8080"
//!
//! [list]
//! page_size = 15
//!
//! [ide]
//! user_agent = "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0"
//!
//! [logging]
//! level = "warn"
//! format = "text"
//! dir = ".che-dash/logs"
//! ```

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DASH_DIR: &str = ".che-dash";
pub const CONFIG_FILE: &str = "dash.toml";
pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_PAGE_SIZE: u32 = 15;

pub const API_URL_ENV: &str = "CHE_API_URL";
pub const PAGE_SIZE_ENV: &str = "CHE_DASH_PAGE_SIZE";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApiSection {
    /// Base URL of the workspace server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListSection {
    /// Items requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for ListSection {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

/// Browser identity used to pick the IDE permutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IdeSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_mode: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => bail!("Invalid log format '{}'. Valid values: text, json", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    /// Directory for daily rolling log files; stderr only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            dir: None,
        }
    }
}

/// Contents of `dash.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashToml {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub list: ListSection,
    #[serde(default)]
    pub ide: IdeSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl DashToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse dash.toml")
    }

    /// Load `<dash_dir>/dash.toml`, or defaults when the file is absent.
    pub fn load_or_default(dash_dir: &Path) -> Result<Self> {
        let config_path = dash_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize dash.toml")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Return warnings for values that parse but cannot work.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.list.page_size == 0 {
            warnings.push("Invalid list.page_size '0': must be greater than zero".to_string());
        }

        if let Some(ref url) = self.api.url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            warnings.push(format!(
                "Invalid api.url '{}': should start with http:// or https://",
                url
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            warnings.push(format!(
                "Unknown logging.level '{}': expected one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }

        if let Some(mode) = self.ide.document_mode
            && !(8..=10).contains(&mode)
        {
            warnings.push(format!(
                "ide.document_mode {} is ignored: only 8, 9 and 10 select an IE permutation",
                mode
            ));
        }

        warnings
    }
}

/// Resolved configuration for one invocation.
#[derive(Debug, Clone)]
pub struct DashConfig {
    pub project_dir: PathBuf,
    /// Path to the `.che-dash` directory
    pub dash_dir: PathBuf,
    pub toml: DashToml,
    pub verbose: bool,
    /// Skip confirmation prompts
    pub yes: bool,
    pub cli_api_url: Option<String>,
    pub cli_page_size: Option<u32>,
}

impl DashConfig {
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let dash_dir = project_dir.join(DASH_DIR);
        let toml = DashToml::load_or_default(&dash_dir)?;

        Ok(Self {
            project_dir,
            dash_dir,
            toml,
            verbose: false,
            yes: false,
            cli_api_url: None,
            cli_page_size: None,
        })
    }

    pub fn with_cli_args(
        project_dir: PathBuf,
        verbose: bool,
        yes: bool,
        api_url: Option<String>,
        page_size: Option<u32>,
    ) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.verbose = verbose;
        config.yes = yes;
        config.cli_api_url = api_url;
        config.cli_page_size = page_size;
        Ok(config)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dash_dir.join(CONFIG_FILE)
    }

    /// API base URL (CLI → env → file → default).
    pub fn api_url(&self) -> String {
        self.cli_api_url
            .clone()
            .or_else(|| std::env::var(API_URL_ENV).ok().filter(|v| !v.is_empty()))
            .or_else(|| self.toml.api.url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    /// Items per page (CLI → env → file). Unparseable env values are ignored.
    pub fn page_size(&self) -> u32 {
        self.cli_page_size
            .or_else(|| {
                std::env::var(PAGE_SIZE_ENV)
                    .ok()
                    .and_then(|v| v.trim().parse().ok())
            })
            .unwrap_or(self.toml.list.page_size)
    }

    /// Log directory, relative paths resolved against the project directory.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.toml.logging.dir.as_ref().map(|dir| {
            if dir.is_absolute() {
                dir.clone()
            } else {
                self.project_dir.join(dir)
            }
        })
    }

    /// File warnings plus checks on the resolved values.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.toml.validate();
        if self.page_size() == 0 && self.toml.list.page_size != 0 {
            warnings.push("Resolved page size is 0: check --page-size or CHE_DASH_PAGE_SIZE".to_string());
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        unsafe {
            std::env::remove_var(API_URL_ENV);
            std::env::remove_var(PAGE_SIZE_ENV);
        }
    }

    #[test]
    fn test_dash_toml_defaults() {
        let toml = DashToml::default();
        assert_eq!(toml.api.url, None);
        assert_eq!(toml.list.page_size, 15);
        assert_eq!(toml.logging.level, "warn");
        assert_eq!(toml.logging.format, LogFormat::Text);
        assert!(toml.validate().is_empty());
    }

    #[test]
    fn test_dash_toml_parse_partial() {
        let content = r#"
[api]
url = "https://che.example.com"

[logging]
format = "json"
"#;
        let toml = DashToml::parse(content).unwrap();
        assert_eq!(toml.api.url.as_deref(), Some("https://che.example.com"));
        assert_eq!(toml.list.page_size, 15);
        assert_eq!(toml.logging.format, LogFormat::Json);
        assert_eq!(toml.logging.level, "warn");
    }

    #[test]
    fn test_dash_toml_parse_invalid() {
        assert!(DashToml::parse("[list]\npage_size = \"many\"").is_err());
        assert!(DashToml::parse("[logging]\nformat = \"xml\"").is_err());
    }

    #[test]
    fn test_dash_toml_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DASH_DIR).join(CONFIG_FILE);
        let mut toml = DashToml::default();
        toml.api.url = Some("http://che:9090".to_string());
        toml.list.page_size = 30;
        toml.save(&path).unwrap();

        let loaded = DashToml::load(&path).unwrap();
        assert_eq!(loaded, toml);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempdir().unwrap();
        let toml = DashToml::load_or_default(dir.path()).unwrap();
        assert_eq!(toml, DashToml::default());
    }

    #[test]
    fn test_validate_reports_warnings() {
        let content = r#"
[api]
url = "che.example.com"

[list]
page_size = 0

[ide]
document_mode = 7

[logging]
level = "loud"
"#;
        let warnings = DashToml::parse(content).unwrap().validate();
        assert_eq!(warnings.len(), 4);
        assert!(warnings[0].contains("page_size"));
        assert!(warnings[1].contains("api.url"));
        assert!(warnings[2].contains("logging.level"));
        assert!(warnings[3].contains("document_mode"));
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_api_url_priority() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let dir = tempdir().unwrap();
        let mut config = DashConfig::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(config.api_url(), DEFAULT_API_URL);

        config.toml.api.url = Some("http://file:1/".to_string());
        assert_eq!(config.api_url(), "http://file:1");

        unsafe { std::env::set_var(API_URL_ENV, "http://env:2") };
        assert_eq!(config.api_url(), "http://env:2");

        config.cli_api_url = Some("http://cli:3".to_string());
        assert_eq!(config.api_url(), "http://cli:3");

        clear_env();
    }

    #[test]
    fn test_page_size_priority() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let dir = tempdir().unwrap();
        let dash_dir = dir.path().join(DASH_DIR);
        std::fs::create_dir_all(&dash_dir).unwrap();
        std::fs::write(dash_dir.join(CONFIG_FILE), "[list]\npage_size = 25\n").unwrap();

        let config = DashConfig::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(config.page_size(), 25);

        unsafe { std::env::set_var(PAGE_SIZE_ENV, "not-a-number") };
        assert_eq!(config.page_size(), 25);

        unsafe { std::env::set_var(PAGE_SIZE_ENV, "40") };
        assert_eq!(config.page_size(), 40);

        let config =
            DashConfig::with_cli_args(dir.path().to_path_buf(), true, true, None, Some(5)).unwrap();
        assert_eq!(config.page_size(), 5);
        assert!(config.verbose);
        assert!(config.yes);

        clear_env();
    }

    #[test]
    fn test_log_dir_resolution() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = tempdir().unwrap();
        let mut config = DashConfig::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(config.log_dir(), None);

        config.toml.logging.dir = Some(PathBuf::from("logs"));
        assert_eq!(config.log_dir(), Some(config.project_dir.join("logs")));
    }

    #[test]
    fn test_new_with_missing_project_dir_fails() {
        let dir = tempdir().unwrap();
        assert!(DashConfig::new(dir.path().join("missing")).is_err());
    }
}
