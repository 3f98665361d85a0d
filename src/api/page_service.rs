//! [`PageService`] over the platform REST API.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::client::ApiClient;
use super::links::{max_items_of, pages_info, parse_link_header, skip_count_of};
use crate::errors::ApiError;
use crate::list::{PageKey, PageService};
use crate::models::{Entity, Factory, PagesInfo, User, Workspace};

/// Where a collection lives on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    /// Paged listing endpoint.
    pub list_path: String,
    /// Prefix for single-entity endpoints; deletes go to `{item_path}/{id}`.
    pub item_path: String,
    /// Fixed query parameters sent with every listing request.
    pub query: Vec<(String, String)>,
}

impl Collection {
    pub fn factories_of(user_id: &str) -> Self {
        Self {
            list_path: "/api/factory/find".into(),
            item_path: "/api/factory".into(),
            query: vec![("creator.userId".into(), user_id.into())],
        }
    }

    pub fn workspaces() -> Self {
        Self {
            list_path: "/api/workspace".into(),
            item_path: "/api/workspace".into(),
            query: Vec::new(),
        }
    }
}

struct CachedPage<T> {
    etag: String,
    items: Vec<T>,
    links: HashMap<String, String>,
}

struct PageState<T> {
    items: Vec<T>,
    pages: PagesInfo,
    links: HashMap<String, String>,
    window: Option<(u32, u32)>,
    cache: HashMap<String, CachedPage<T>>,
}

/// Request target for one page load.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PageRequest {
    Window { max_items: u32, skip_count: u32 },
    Link(String),
}

pub struct RemotePageService<T> {
    client: ApiClient,
    collection: Collection,
    generation: AtomicU64,
    state: Mutex<PageState<T>>,
    _entity: PhantomData<fn() -> T>,
}

impl RemotePageService<Factory> {
    /// Factories created by the current user, resolved through `GET /api/user`.
    pub async fn factories(client: ApiClient) -> Result<Self, ApiError> {
        let user: User = client.get_json("/api/user").await?;
        debug!(user_id = %user.id, "Resolved factory creator");
        Ok(Self::new(client, Collection::factories_of(&user.id)))
    }
}

impl RemotePageService<Workspace> {
    pub fn workspaces(client: ApiClient) -> Self {
        Self::new(client, Collection::workspaces())
    }
}

impl<T: Entity + DeserializeOwned> RemotePageService<T> {
    pub fn new(client: ApiClient, collection: Collection) -> Self {
        Self {
            client,
            collection,
            generation: AtomicU64::new(0),
            state: Mutex::new(PageState {
                items: Vec::new(),
                pages: PagesInfo::default(),
                links: HashMap::new(),
                window: None,
                cache: HashMap::new(),
            }),
            _entity: PhantomData,
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    fn state(&self) -> MutexGuard<'_, PageState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, key: PageKey) -> Result<PageRequest, ApiError> {
        let state = self.state();
        if let Some(url) = state.links.get(key.as_str()) {
            return Ok(PageRequest::Link(url.clone()));
        }
        // With a Link header, an absent rel means there is no such page.
        let synthesized = if state.links.is_empty() {
            synthesize_window(key, state.window, state.items.len())
        } else {
            None
        };
        synthesized.ok_or_else(|| ApiError::MissingPageLink {
            key: key.to_string(),
        })
    }

    async fn load(&self, request: PageRequest) -> Result<(), ApiError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let (path, query, window) = match &request {
            PageRequest::Window {
                max_items,
                skip_count,
            } => {
                let mut query = self.collection.query.clone();
                query.push(("maxItems".into(), max_items.to_string()));
                query.push(("skipCount".into(), skip_count.to_string()));
                (self.collection.list_path.clone(), query, (*max_items, *skip_count))
            }
            PageRequest::Link(url) => {
                let max = max_items_of(url)
                    .or_else(|| self.state().window.map(|w| w.0))
                    .unwrap_or(0);
                let skip = skip_count_of(url).unwrap_or(0);
                (url.clone(), Vec::new(), (max, skip))
            }
        };
        let cache_key = cache_key(&self.client.url(&path), &query);
        let etag = self.state().cache.get(&cache_key).map(|c| c.etag.clone());

        let result = self.client.get_page(&path, &query, etag.as_deref()).await;

        let mut state = self.state();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "Dropping superseded page response");
            return result.map(|_| ());
        }

        match result {
            Ok(page) => {
                let items: Vec<T> = serde_json::from_str(&page.body)
                    .map_err(|e| ApiError::Decode(e.to_string()))?;
                let links = page.link.as_deref().map(parse_link_header).unwrap_or_default();
                if let Some(etag) = page.etag {
                    state.cache.insert(
                        cache_key,
                        CachedPage {
                            etag,
                            items: items.clone(),
                            links: links.clone(),
                        },
                    );
                }
                state.pages = pages_info(window.0, window.1, &links);
                state.items = items;
                state.links = links;
                state.window = Some(window);
                Ok(())
            }
            Err(ApiError::NotModified) => {
                if let Some(cached) = state.cache.get(&cache_key) {
                    let items = cached.items.clone();
                    let links = cached.links.clone();
                    state.pages = pages_info(window.0, window.1, &links);
                    state.items = items;
                    state.links = links;
                    state.window = Some(window);
                }
                Err(ApiError::NotModified)
            }
            Err(e) => Err(e),
        }
    }
}

fn cache_key(url: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let params: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{}?{}", url, params.join("&"))
}

/// Navigate by window arithmetic when the server sent no `Link` header.
fn synthesize_window(key: PageKey, window: Option<(u32, u32)>, page_len: usize) -> Option<PageRequest> {
    let (max_items, skip_count) = window?;
    let skip_count = match key {
        PageKey::First => 0,
        PageKey::Prev if skip_count > 0 => skip_count.saturating_sub(max_items),
        PageKey::Next if page_len == max_items as usize => skip_count + max_items,
        _ => return None,
    };
    Some(PageRequest::Window {
        max_items,
        skip_count,
    })
}

#[async_trait]
impl<T: Entity + DeserializeOwned> PageService for RemotePageService<T> {
    type Item = T;

    async fn fetch_page(&self, max_items: u32, skip_count: u32) -> Result<(), ApiError> {
        if max_items == 0 {
            return Err(ApiError::BadRequest("maxItems must be greater than 0".into()));
        }
        self.load(PageRequest::Window {
            max_items,
            skip_count,
        })
        .await
    }

    async fn fetch_page_by_key(&self, key: PageKey) -> Result<(), ApiError> {
        let request = self.resolve(key)?;
        self.load(request).await
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("{}/{}", self.collection.item_path, id);
        self.client.delete(&path).await
    }

    fn page_items(&self) -> Vec<T> {
        self.state().items.clone()
    }

    fn pages_info(&self) -> PagesInfo {
        self.state().pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factories_collection_filters_by_creator() {
        let c = Collection::factories_of("user1");
        assert_eq!(c.list_path, "/api/factory/find");
        assert_eq!(c.query, vec![("creator.userId".to_string(), "user1".to_string())]);
    }

    #[test]
    fn test_cache_key_includes_query() {
        let q = vec![("maxItems".to_string(), "5".to_string())];
        assert_eq!(cache_key("http://h/api/workspace", &q), "http://h/api/workspace?maxItems=5");
        assert_eq!(cache_key("http://h/x?a=1", &[]), "http://h/x?a=1");
    }

    #[test]
    fn test_synthesize_window() {
        let window = Some((5, 10));
        assert_eq!(
            synthesize_window(PageKey::First, window, 5),
            Some(PageRequest::Window { max_items: 5, skip_count: 0 })
        );
        assert_eq!(
            synthesize_window(PageKey::Prev, window, 5),
            Some(PageRequest::Window { max_items: 5, skip_count: 5 })
        );
        assert_eq!(
            synthesize_window(PageKey::Next, window, 5),
            Some(PageRequest::Window { max_items: 5, skip_count: 15 })
        );
        // short page: nothing after it
        assert_eq!(synthesize_window(PageKey::Next, window, 3), None);
        // total unknown without links
        assert_eq!(synthesize_window(PageKey::Last, window, 5), None);
        assert_eq!(synthesize_window(PageKey::Prev, Some((5, 0)), 5), None);
        assert_eq!(synthesize_window(PageKey::First, None, 0), None);
    }

    #[tokio::test]
    async fn test_page_by_key_before_any_load_is_missing_link() {
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        let service: RemotePageService<Workspace> = RemotePageService::workspaces(client);
        let err = service.fetch_page_by_key(PageKey::Next).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingPageLink { ref key } if key == "next"));
    }
}
