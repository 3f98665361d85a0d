//! Product branding loaded once from `assets/branding/product.json`.
//!
//! The resolved [`Branding`] is published on a `watch` channel and every
//! registered callback runs after the load attempt, whether it succeeded or
//! not. A failed fetch publishes the built-in defaults.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::errors::ApiError;

pub const ASSET_PREFIX: &str = "assets/branding/";
pub const PRODUCT_JSON: &str = "product.json";

const DEFAULT_TITLE: &str = "Eclipse Che";
const DEFAULT_NAME: &str = "Eclipse Che";
const DEFAULT_LOGO_FILE: &str = "che-logo.svg";
const DEFAULT_LOGO_TEXT_FILE: &str = "che-logo-text.svg";
const DEFAULT_FAVICON: &str = "favicon.ico";
const DEFAULT_LOADER: &str = "loader.svg";
const DEFAULT_IDE_RESOURCES: &str = "/_app/";
const DEFAULT_HELP_PATH: &str = "https://www.eclipse.org/che/";
const DEFAULT_HELP_TITLE: &str = "Community";
const DEFAULT_SUPPORT_EMAIL: &str = "wish@codenvy.com";
const DEFAULT_OAUTH_DOCS: &str = "Configure OAuth in the che.properties file.";
const DEFAULT_CLI_CONFIG_NAME: &str = "che.env";
const DEFAULT_CLI_NAME: &str = "CHE";
const DEFAULT_DOCS_STACK: &str = "/docs/getting-started/runtime-stacks/index.html";
const DEFAULT_DOCS_WORKSPACE: &str = "/docs/getting-started/intro/index.html";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CliInfo {
    pub config_name: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocsInfo {
    pub stack: String,
    pub workspace: String,
}

/// Resolved branding. File fields already carry the asset prefix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    pub title: String,
    pub name: String,
    pub logo_url: String,
    pub logo_text: String,
    pub favicon: String,
    pub loader_url: String,
    pub ide_resources_path: String,
    pub help_path: String,
    pub help_title: String,
    pub support_email: String,
    pub oauth_docs: String,
    pub cli: CliInfo,
    pub docs: DocsInfo,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.into(),
            name: DEFAULT_NAME.into(),
            logo_url: asset(DEFAULT_LOGO_FILE),
            logo_text: asset(DEFAULT_LOGO_TEXT_FILE),
            favicon: asset(DEFAULT_FAVICON),
            loader_url: asset(DEFAULT_LOADER),
            ide_resources_path: DEFAULT_IDE_RESOURCES.into(),
            help_path: DEFAULT_HELP_PATH.into(),
            help_title: DEFAULT_HELP_TITLE.into(),
            support_email: DEFAULT_SUPPORT_EMAIL.into(),
            oauth_docs: DEFAULT_OAUTH_DOCS.into(),
            cli: CliInfo {
                config_name: DEFAULT_CLI_CONFIG_NAME.into(),
                name: DEFAULT_CLI_NAME.into(),
            },
            docs: DocsInfo {
                stack: DEFAULT_DOCS_STACK.into(),
                workspace: DEFAULT_DOCS_WORKSPACE.into(),
            },
        }
    }
}

fn asset(file: &str) -> String {
    format!("{}{}", ASSET_PREFIX, file)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialDocs {
    stack: Option<String>,
    workspace: Option<String>,
}

/// `product.json` as served; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductJson {
    title: Option<String>,
    name: Option<String>,
    logo_file: Option<String>,
    logo_text_file: Option<String>,
    favicon: Option<String>,
    loader: Option<String>,
    ide_resources: Option<String>,
    help_path: Option<String>,
    help_title: Option<String>,
    support_email: Option<String>,
    oauth_docs: Option<String>,
    cli: Option<CliInfo>,
    docs: Option<PartialDocs>,
}

impl Branding {
    /// Merge a product file over the defaults.
    ///
    /// A `cli` block is taken as-is. Without one the CLI naming is derived
    /// from the product name: `"<name> env file"` and `PRODUCT_`.
    pub fn from_product(product: ProductJson) -> Self {
        let defaults = Branding::default();
        let name = product.name.unwrap_or(defaults.name);
        let cli = product.cli.unwrap_or_else(|| CliInfo {
            config_name: format!("{} env file", name),
            name: "PRODUCT_".to_string(),
        });
        let docs = product.docs.unwrap_or_default();

        Self {
            title: product.title.unwrap_or(defaults.title),
            logo_url: product.logo_file.map(|f| asset(&f)).unwrap_or(defaults.logo_url),
            logo_text: product.logo_text_file.map(|f| asset(&f)).unwrap_or(defaults.logo_text),
            favicon: product.favicon.map(|f| asset(&f)).unwrap_or(defaults.favicon),
            loader_url: product.loader.map(|f| asset(&f)).unwrap_or(defaults.loader_url),
            ide_resources_path: product.ide_resources.unwrap_or(defaults.ide_resources_path),
            help_path: product.help_path.unwrap_or(defaults.help_path),
            help_title: product.help_title.unwrap_or(defaults.help_title),
            support_email: product.support_email.unwrap_or(defaults.support_email),
            oauth_docs: product.oauth_docs.unwrap_or(defaults.oauth_docs),
            cli,
            docs: DocsInfo {
                stack: docs.stack.filter(|s| !s.is_empty()).unwrap_or(defaults.docs.stack),
                workspace: docs
                    .workspace
                    .filter(|s| !s.is_empty())
                    .unwrap_or(defaults.docs.workspace),
            },
            name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServicesInfo {
    implementation_version: Option<String>,
}

type BrandingCallback = Arc<dyn Fn(&Branding) + Send + Sync>;

pub struct BrandingLoader {
    client: ApiClient,
    tx: watch::Sender<Branding>,
    ready: AtomicBool,
    callbacks: Mutex<HashMap<String, BrandingCallback>>,
    version: Mutex<String>,
}

impl BrandingLoader {
    pub fn new(client: ApiClient) -> Self {
        let (tx, _rx) = watch::channel(Branding::default());
        Self {
            client,
            tx,
            ready: AtomicBool::new(false),
            callbacks: Mutex::new(HashMap::new()),
            version: Mutex::new(String::new()),
        }
    }

    fn callbacks(&self) -> MutexGuard<'_, HashMap<String, BrandingCallback>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn current(&self) -> Branding {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Branding> {
        self.tx.subscribe()
    }

    /// True once a load attempt has finished.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn product_version(&self) -> String {
        self.version.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Register a callback run after each load attempt.
    ///
    /// Registering under an existing id replaces it. When a load already
    /// finished the callback runs right away with the current branding.
    pub fn register_callback<F>(&self, id: impl Into<String>, callback: F)
    where
        F: Fn(&Branding) + Send + Sync + 'static,
    {
        let callback: BrandingCallback = Arc::new(callback);
        self.callbacks().insert(id.into(), callback.clone());
        if self.is_ready() {
            callback(&self.current());
        }
    }

    /// Unknown ids are ignored.
    pub fn unregister_callback(&self, id: &str) {
        if self.callbacks().remove(id).is_some() {
            debug!(id, "Unregistered branding callback");
        }
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks().len()
    }

    /// Fetch branding and product version, publish them, then run callbacks.
    pub async fn load(&self) -> Branding {
        let (branding, version) = tokio::join!(self.fetch_branding(), self.fetch_version());
        *self.version.lock().unwrap_or_else(PoisonError::into_inner) = version;

        let branding = branding.unwrap_or_else(|e| {
            warn!(error = %e, "Unable to load product branding, using defaults");
            Branding::default()
        });
        self.tx.send_replace(branding.clone());
        self.ready.store(true, Ordering::SeqCst);
        info!(title = %branding.title, "Branding loaded");

        // Snapshot first: callbacks may unregister themselves.
        let callbacks: Vec<BrandingCallback> = self.callbacks().values().cloned().collect();
        for callback in callbacks {
            callback(&branding);
        }
        branding
    }

    async fn fetch_branding(&self) -> Result<Branding, ApiError> {
        let path = format!("{}{}", ASSET_PREFIX, PRODUCT_JSON);
        let product: ProductJson = self.client.get_json(&path).await?;
        Ok(Branding::from_product(product))
    }

    async fn fetch_version(&self) -> String {
        match self.client.options_json::<ServicesInfo>("/api/").await {
            Ok(info) => info.implementation_version.unwrap_or_default(),
            Err(e) => {
                debug!(error = %e, "Services info unavailable");
                String::new()
            }
        }
    }
}
