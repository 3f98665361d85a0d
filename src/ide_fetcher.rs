//! Warm the IDE script for the detected browser once branding is known.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::branding::{Branding, BrandingLoader};

pub const PREFETCH_CALLBACK_ID: &str = "ide-prefetcher";
pub const MAPPING_FILE: &str = "compilation-mappings.txt";

/// Browser permutation names used by the IDE compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAgent {
    Safari,
    Ie10,
    Ie9,
    Ie8,
    Gecko1_8,
    Unknown,
}

impl UserAgent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safari => "safari",
            Self::Ie10 => "ie10",
            Self::Ie9 => "ie9",
            Self::Ie8 => "ie8",
            Self::Gecko1_8 => "gecko1_8",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a user-agent string (and IE document mode) to a permutation name.
pub fn detect_user_agent(user_agent: &str, document_mode: Option<u32>) -> UserAgent {
    let ua = user_agent.to_lowercase();
    if ua.contains("webkit") {
        UserAgent::Safari
    } else if ua.contains("msie") {
        match document_mode {
            Some(10) => UserAgent::Ie10,
            Some(9) => UserAgent::Ie9,
            Some(8) => UserAgent::Ie8,
            _ => UserAgent::Unknown,
        }
    } else if ua.contains("gecko") {
        UserAgent::Gecko1_8
    } else {
        UserAgent::Unknown
    }
}

/// Find the `.cache.js` file of the block whose `user.agent` matches.
///
/// Blocks are separated by blank lines. A block without a `user.agent`
/// line or without a script line never matches.
pub fn find_script(mapping: &str, agent: UserAgent) -> Option<String> {
    let mut blocks: Vec<Vec<&str>> = vec![Vec::new()];
    for line in mapping.lines() {
        if line.trim().is_empty() {
            blocks.push(Vec::new());
        } else if let Some(block) = blocks.last_mut() {
            block.push(line.trim());
        }
    }

    blocks.iter().find_map(|block| {
        let block_agent = block
            .iter()
            .find_map(|line| line.strip_prefix("user.agent "))?;
        let script = block.iter().find(|line| line.ends_with(".cache.js"))?;
        (block_agent.trim() == agent.as_str()).then(|| script.to_string())
    })
}

pub struct IdePrefetcher {
    client: ApiClient,
    user_agent: UserAgent,
    cache: Mutex<HashMap<String, String>>,
}

impl IdePrefetcher {
    pub fn new(client: ApiClient, user_agent: UserAgent) -> Self {
        Self {
            client,
            user_agent,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn user_agent(&self) -> UserAgent {
        self.user_agent
    }

    pub fn cached(&self, url: &str) -> Option<String> {
        self.cache().get(url).cloned()
    }

    pub fn cached_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.cache().keys().cloned().collect();
        urls.sort();
        urls
    }

    /// Resolve and cache the IDE script. Returns its URL, or `None` when
    /// nothing could be prefetched; failures are logged, never raised.
    pub async fn prefetch(&self, branding: &Branding) -> Option<String> {
        let resources = branding.ide_resources_path.as_str();
        if resources.is_empty() {
            warn!("Unable to get IDE resources path");
            return None;
        }

        let uid = uuid::Uuid::new_v4().as_u128() % 1_000_000 + 1;
        let mapping_url = format!("{}{}?uid={}", resources, MAPPING_FILE, uid);
        let mapping = match self.client.get_text(&mapping_url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Unable to find compilation mapping file");
                return None;
            }
        };

        let Some(script) = find_script(&mapping, self.user_agent) else {
            error!(user_agent = %self.user_agent, "Unable to find the IDE javascript file to cache");
            return None;
        };
        let url = format!("{}{}", resources, script);
        if self.cache().contains_key(&url) {
            return Some(url);
        }

        info!(%url, "Preloading IDE javascript");
        match self.client.get_text(&url).await {
            Ok(body) => {
                self.cache().insert(url.clone(), body);
                Some(url)
            }
            Err(e) => {
                warn!(%url, error = %e, "Unable to preload IDE javascript");
                None
            }
        }
    }

    /// Prefetch once branding is ready. The callback unregisters itself.
    pub fn when_branding_ready(self: Arc<Self>, loader: &Arc<BrandingLoader>) -> JoinHandle<Option<String>> {
        let (tx, rx) = oneshot::channel::<Branding>();
        let slot = Mutex::new(Some(tx));
        let weak = Arc::downgrade(loader);

        loader.register_callback(PREFETCH_CALLBACK_ID, move |branding: &Branding| {
            if let Some(tx) = slot.lock().unwrap_or_else(PoisonError::into_inner).take() {
                let _ = tx.send(branding.clone());
            }
            if let Some(loader) = weak.upgrade() {
                loader.unregister_callback(PREFETCH_CALLBACK_ID);
            }
        });

        tokio::spawn(async move {
            let branding = rx.await.ok()?;
            self.prefetch(&branding).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FakeBackend, spawn_local};

    const MAPPING: &str = "\
AAAA.cache.js
user.agent safari

BBBB.cache.js
user.agent gecko1_8

user.agent ie10
";

    #[test]
    fn test_detect_user_agent() {
        let chrome = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0";
        assert_eq!(detect_user_agent(chrome, None), UserAgent::Safari);
        let firefox = "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0";
        assert_eq!(detect_user_agent(firefox, None), UserAgent::Gecko1_8);
        let ie = "Mozilla/5.0 (compatible; MSIE 10.0; Windows NT 6.1)";
        assert_eq!(detect_user_agent(ie, Some(10)), UserAgent::Ie10);
        assert_eq!(detect_user_agent(ie, Some(9)), UserAgent::Ie9);
        assert_eq!(detect_user_agent(ie, Some(8)), UserAgent::Ie8);
        assert_eq!(detect_user_agent(ie, None), UserAgent::Unknown);
        assert_eq!(detect_user_agent("curl/8.0", None), UserAgent::Unknown);
    }

    #[test]
    fn test_find_script() {
        assert_eq!(find_script(MAPPING, UserAgent::Safari).as_deref(), Some("AAAA.cache.js"));
        assert_eq!(find_script(MAPPING, UserAgent::Gecko1_8).as_deref(), Some("BBBB.cache.js"));
        // block without a script line
        assert_eq!(find_script(MAPPING, UserAgent::Ie10), None);
        assert_eq!(find_script(MAPPING, UserAgent::Unknown), None);
        assert_eq!(find_script("", UserAgent::Safari), None);
    }

    #[test]
    fn test_find_script_skips_block_without_agent() {
        let mapping = "CCCC.cache.js\n\nDDDD.cache.js\nuser.agent safari\n";
        assert_eq!(find_script(mapping, UserAgent::Safari).as_deref(), Some("DDDD.cache.js"));
    }

    async fn asset_server() -> (String, JoinHandle<()>) {
        let mut backend = FakeBackend::new();
        backend
            .add_ide_asset(MAPPING_FILE, MAPPING)
            .add_ide_asset("AAAA.cache.js", "/* safari */");
        let (addr, handle) = spawn_local(backend).await.unwrap();
        (format!("http://{}", addr), handle)
    }

    #[tokio::test]
    async fn test_prefetch_caches_matching_script() {
        let (base, handle) = asset_server().await;
        let prefetcher = IdePrefetcher::new(ApiClient::new(&base).unwrap(), UserAgent::Safari);
        let url = prefetcher.prefetch(&Branding::default()).await.unwrap();
        assert_eq!(url, "/_app/AAAA.cache.js");
        assert_eq!(prefetcher.cached(&url).as_deref(), Some("/* safari */"));
        handle.abort();
    }

    #[tokio::test]
    async fn test_prefetch_without_match_or_path_is_none() {
        let (base, handle) = asset_server().await;
        let prefetcher = IdePrefetcher::new(ApiClient::new(&base).unwrap(), UserAgent::Ie9);
        assert_eq!(prefetcher.prefetch(&Branding::default()).await, None);

        let branding = Branding {
            ide_resources_path: String::new(),
            ..Branding::default()
        };
        assert_eq!(prefetcher.prefetch(&branding).await, None);
        assert!(prefetcher.cached_urls().is_empty());
        handle.abort();
    }

    #[tokio::test]
    async fn test_runs_once_after_branding_ready() {
        let (base, handle) = asset_server().await;
        let client = ApiClient::new(&base).unwrap();
        let loader = Arc::new(BrandingLoader::new(client.clone()));
        let prefetcher = Arc::new(IdePrefetcher::new(client, UserAgent::Safari));

        let task = prefetcher.clone().when_branding_ready(&loader);
        assert_eq!(loader.callback_count(), 1);
        loader.load().await;

        assert_eq!(task.await.unwrap().as_deref(), Some("/_app/AAAA.cache.js"));
        assert_eq!(loader.callback_count(), 0);
        assert_eq!(prefetcher.cached_urls(), vec!["/_app/AAAA.cache.js".to_string()]);
        handle.abort();
    }
}
