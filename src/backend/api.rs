use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, options, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::data::{FakeBackend, page_slice};
use crate::api::links::build_link_header;
use crate::models::{DeleteResult, User};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    backend: Mutex<FakeBackend>,
}

impl AppState {
    pub fn new(backend: FakeBackend) -> Self {
        Self {
            backend: Mutex::new(backend),
        }
    }

    pub fn backend(&self) -> MutexGuard<'_, FakeBackend> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(rename = "maxItems")]
    pub max_items: Option<u32>,
    #[serde(rename = "skipCount")]
    pub skip_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct FactoryQuery {
    #[serde(rename = "creator.userId")]
    pub creator_user_id: Option<String>,
    #[serde(rename = "maxItems")]
    pub max_items: Option<u32>,
    #[serde(rename = "skipCount")]
    pub skip_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameQuery {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ProjectPathQuery {
    #[serde(rename = "projectPath")]
    pub project_path: String,
}

#[derive(Debug, Deserialize)]
pub struct SvnInfoQuery {
    #[serde(rename = "workspaceId")]
    pub workspace_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SvnInfoRequest {
    pub project_path: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ServerError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServerError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(json!({"message": message}))).into_response()
    }
}

fn success() -> Json<DeleteResult> {
    Json(DeleteResult {
        success: true,
        errors: Vec::new(),
    })
}

// ── Router ────────────────────────────────────────────────────────────

/// `OPTIONS /api/`. Kept apart from [`api_router`] because a CORS layer
/// answers every `OPTIONS` request as a preflight.
pub fn services_router() -> Router<SharedState> {
    Router::new().route("/api/", options(services_info))
}

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/workspace", get(list_workspaces))
        .route("/api/workspace/settings", get(workspace_settings))
        .route("/api/workspace/{id}", get(get_workspace).delete(delete_workspace))
        .route("/api/workspace/{namespace}/{name}", get(get_workspace_by_name))
        .route("/api/stack", get(list_stacks))
        .route("/api/project-template/all", get(list_project_templates))
        .route("/api/profile", get(get_default_profile))
        .route("/api/profile/attributes", put(update_profile_attributes))
        .route("/api/profile/{id}", get(get_profile))
        .route(
            "/api/preferences",
            get(get_preferences)
                .post(update_preferences)
                .delete(delete_preferences),
        )
        .route("/api/user", get(get_current_user).post(create_user))
        .route("/api/user/password", post(change_password))
        .route("/api/user/find", get(find_user_by_email))
        .route("/api/user/{id}", get(get_user))
        .route("/api/factory/find", get(find_factories))
        .route("/api/factory/{id}", get(get_factory).delete(delete_factory))
        .route("/wsagent/{workspace_id}/project", get(list_projects))
        .route(
            "/wsagent/{workspace_id}/project/{name}",
            get(get_project_details).put(import_project),
        )
        .route("/wsagent/{workspace_id}/project/resolve/{name}", get(resolve_project))
        .route("/wsagent/{workspace_id}/project-type", get(list_project_types))
        .route("/wsagent/{workspace_id}/git/read-only-url", get(local_git_url))
        .route("/wsagent/{workspace_id}/git/remote-list", post(remote_git_urls))
        .route("/wsagent/{workspace_id}/svn/info", post(svn_info))
        .route("/project/rename/{name}", post(rename_project))
        .route("/project/{workspace_id}/{name}", put(update_project_details))
        .route("/project/{name}", get(fetch_project_details))
        .route("/api/analytics/log/session-usage", post(log_session_usage))
        .route("/assets/branding/product.json", get(get_branding))
        .route("/_app/{file}", get(get_ide_asset))
        .route("/health", get(health_check))
}

// ── Helpers ───────────────────────────────────────────────────────────

fn etag_of(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    format!("\"{:x}\"", hasher.finalize())
}

fn header_value(value: &str) -> Result<HeaderValue, ServerError> {
    HeaderValue::from_str(value).map_err(|e| ServerError::Internal(e.to_string()))
}

/// Serialize one page with an ETag. A matching `If-None-Match` answers 304.
fn paged_response<T: Serialize>(
    page: &[T],
    request_headers: &HeaderMap,
    link: Option<String>,
) -> Result<Response, ServerError> {
    let body = serde_json::to_vec(page).map_err(|e| ServerError::Internal(e.to_string()))?;
    let etag = etag_of(&body);

    let not_modified = request_headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|tag| tag == etag);

    let mut response = if not_modified {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    };
    let headers = response.headers_mut();
    headers.insert(header::ETAG, header_value(&etag)?);
    if let Some(link) = link {
        headers.insert(header::LINK, header_value(&link)?);
    }
    Ok(response)
}

fn content_type_of(file: &str) -> &'static str {
    match file.rsplit_once('.').map(|(_, ext)| ext) {
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("html") => "text/html",
        Some("svg") => "image/svg+xml",
        _ => "text/plain",
    }
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn services_info(State(state): State<SharedState>) -> Json<Value> {
    let backend = state.backend();
    Json(json!({
        "implementationVersion": backend.implementation_version,
        "rootResources": [],
    }))
}

async fn list_workspaces(
    State(state): State<SharedState>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let backend = state.backend();
    let all = &backend.workspaces;

    if query.max_items.is_none() && query.skip_count.is_none() {
        return paged_response(all, &headers, None);
    }

    let max = query.max_items.unwrap_or(backend.page_max_items).max(1);
    let skip = query.skip_count.unwrap_or(0);
    let link = backend
        .link_headers
        .then(|| build_link_header("/api/workspace", all.len(), max, skip));
    paged_response(&page_slice(all, max, skip), &headers, link)
}

async fn workspace_settings(State(state): State<SharedState>) -> Json<Value> {
    Json(state.backend().workspace_settings())
}

async fn get_workspace(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let backend = state.backend();
    backend
        .workspaces
        .iter()
        .find(|w| w.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("Workspace with id '{}' not found", id)))
}

async fn get_workspace_by_name(
    State(state): State<SharedState>,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServerError> {
    let backend = state.backend();
    backend
        .workspaces
        .iter()
        .find(|w| w.namespace == namespace && w.config.name == name)
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            ServerError::NotFound(format!("Workspace '{}/{}' not found", namespace, name))
        })
}

async fn delete_workspace(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    let mut backend = state.backend();
    if backend.failing_deletes.contains(&id) {
        return Err(ServerError::Internal(format!("Unable to delete workspace '{}'", id)));
    }
    let before = backend.workspaces.len();
    backend.workspaces.retain(|w| w.id != id);
    if backend.workspaces.len() == before {
        return Err(ServerError::NotFound(format!("Workspace with id '{}' not found", id)));
    }
    backend.projects_per_workspace.remove(&id);
    debug!(%id, "Deleted workspace");
    Ok(StatusCode::OK)
}

async fn list_stacks(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.backend().stacks.clone())
}

async fn list_project_templates(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.backend().project_templates.clone())
}

async fn get_default_profile(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.backend().default_profile.clone())
}

async fn get_profile(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    state
        .backend()
        .profiles
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("Profile '{}' not found", id)))
}

async fn update_profile_attributes(
    State(state): State<SharedState>,
    Json(attributes): Json<HashMap<String, String>>,
) -> impl IntoResponse {
    state.backend().default_profile.attributes = attributes.clone();
    Json(attributes)
}

async fn get_preferences(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.backend().preferences.clone())
}

async fn update_preferences(
    State(state): State<SharedState>,
    Json(update): Json<Map<String, Value>>,
) -> impl IntoResponse {
    let mut backend = state.backend();
    backend.preferences.extend(update);
    Json(backend.preferences.clone())
}

/// Body is an optional JSON list of keys; without it the defaults come back.
async fn delete_preferences(
    State(state): State<SharedState>,
    body: String,
) -> Result<impl IntoResponse, ServerError> {
    let mut backend = state.backend();
    if body.trim().is_empty() {
        backend.preferences = backend.default_preferences.clone();
    } else {
        let keys: Vec<String> = serde_json::from_str(&body)
            .map_err(|e| ServerError::BadRequest(format!("Invalid preference keys: {}", e)))?;
        for key in keys {
            backend.preferences.remove(&key);
        }
    }
    Ok(Json(json!({})))
}

async fn get_current_user(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.backend().default_user.clone())
}

async fn create_user(
    State(state): State<SharedState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ServerError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(ServerError::BadRequest("User name and email are required".into()));
    }
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name: req.name,
        email: req.email,
        aliases: Vec::new(),
    };
    debug!(id = %user.id, has_password = req.password.is_some(), "Created user");
    let mut backend = state.backend();
    backend.add_user_by_id(user.clone()).add_user_email(user);
    Ok(success())
}

async fn change_password(body: String) -> Result<impl IntoResponse, ServerError> {
    if body.trim().is_empty() {
        return Err(ServerError::BadRequest("Password must not be empty".into()));
    }
    Ok(success())
}

async fn find_user_by_email(
    State(state): State<SharedState>,
    Query(query): Query<EmailQuery>,
) -> Result<impl IntoResponse, ServerError> {
    state
        .backend()
        .users_by_email
        .get(&query.email)
        .cloned()
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("User with email '{}' not found", query.email)))
}

async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    state
        .backend()
        .users_by_id
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("User with id '{}' not found", id)))
}

async fn find_factories(
    State(state): State<SharedState>,
    Query(query): Query<FactoryQuery>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let user_id = query
        .creator_user_id
        .ok_or_else(|| ServerError::BadRequest("Query parameter 'creator.userId' is required".into()))?;

    let backend = state.backend();
    let max = query.max_items.unwrap_or(backend.page_max_items);
    if max == 0 {
        return Err(ServerError::BadRequest("maxItems must be greater than 0".into()));
    }
    let skip = query.skip_count.unwrap_or(backend.page_skip_count);

    let all = backend.factories_of(&user_id);
    let base = format!("/api/factory/find?creator.userId={}", user_id);
    let link = backend
        .link_headers
        .then(|| build_link_header(&base, all.len(), max, skip));
    paged_response(&page_slice(&all, max, skip), &headers, link)
}

async fn get_factory(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    state
        .backend()
        .factories
        .iter()
        .find(|f| f.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("Factory with id '{}' not found", id)))
}

async fn delete_factory(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let mut backend = state.backend();
    if backend.failing_deletes.contains(&id) {
        return Err(ServerError::Internal(format!("Unable to delete factory '{}'", id)));
    }
    let before = backend.factories.len();
    backend.factories.retain(|f| f.id != id);
    if backend.factories.len() == before {
        return Err(ServerError::NotFound(format!("Factory with id '{}' not found", id)));
    }
    debug!(%id, "Deleted factory");
    Ok(success())
}

async fn list_projects(
    State(state): State<SharedState>,
    Path(workspace_id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    state
        .backend()
        .projects_per_workspace
        .get(&workspace_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("Workspace with id '{}' not found", workspace_id)))
}

async fn get_project_details(
    State(state): State<SharedState>,
    Path((workspace_id, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServerError> {
    let key = format!("{}/{}", workspace_id, name);
    state
        .backend()
        .project_details
        .get(&key)
        .cloned()
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("Project '{}' not found", key)))
}

fn project_of<'a>(
    backend: &'a FakeBackend,
    workspace_id: &str,
    name: &str,
) -> Result<&'a crate::models::Project, ServerError> {
    backend
        .projects_per_workspace
        .get(workspace_id)
        .and_then(|projects| projects.iter().find(|p| p.name == name))
        .ok_or_else(|| ServerError::NotFound(format!("Project '{}/{}' not found", workspace_id, name)))
}

async fn import_project(
    State(state): State<SharedState>,
    Path((workspace_id, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServerError> {
    project_of(&state.backend(), &workspace_id, &name)?;
    Ok(Json(json!({})))
}

async fn resolve_project(
    State(state): State<SharedState>,
    Path((workspace_id, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServerError> {
    project_of(&state.backend(), &workspace_id, &name)?;
    Ok(Json(json!([])))
}

/// The new details also replace what the agent serves afterwards.
async fn update_project_details(
    State(state): State<SharedState>,
    Path((workspace_id, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServerError> {
    let key = format!("{}/{}", workspace_id, name);
    let mut backend = state.backend();
    let details = backend
        .updated_project_details
        .get(&key)
        .cloned()
        .ok_or_else(|| ServerError::NotFound(format!("No update registered for project '{}'", key)))?;
    backend.project_details.insert(key, details.clone());
    Ok(Json(details))
}

async fn fetch_project_details(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let backend = state.backend();
    backend
        .fetchable_projects
        .get(&name)
        .and_then(|workspace_id| backend.project_details.get(&format!("{}/{}", workspace_id, name)))
        .cloned()
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("Project '{}' not found", name)))
}

async fn rename_project(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Query(query): Query<RenameQuery>,
) -> Result<String, ServerError> {
    match state.backend().project_renames.get(&name) {
        Some(new_name) if *new_name == query.name => Ok(new_name.clone()),
        _ => Err(ServerError::BadRequest(format!(
            "Unable to rename project '{}' to '{}'",
            name, query.name
        ))),
    }
}

fn require_agent(backend: &FakeBackend, workspace_id: &str) -> Result<(), ServerError> {
    match backend.workspace_agent(workspace_id) {
        Some(_) => Ok(()),
        None => Err(ServerError::NotFound(format!(
            "No agent running for workspace '{}'",
            workspace_id
        ))),
    }
}

async fn local_git_url(
    State(state): State<SharedState>,
    Path(workspace_id): Path<String>,
    Query(query): Query<ProjectPathQuery>,
) -> Result<String, ServerError> {
    let backend = state.backend();
    require_agent(&backend, &workspace_id)?;
    backend
        .local_git_urls
        .get(&format!("{}{}", workspace_id, query.project_path))
        .cloned()
        .ok_or_else(|| ServerError::NotFound(format!("Not a git repository: {}", query.project_path)))
}

async fn remote_git_urls(
    State(state): State<SharedState>,
    Path(workspace_id): Path<String>,
    Query(query): Query<ProjectPathQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let backend = state.backend();
    require_agent(&backend, &workspace_id)?;
    backend
        .remote_git_urls
        .get(&format!("{}{}", workspace_id, query.project_path))
        .cloned()
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("Not a git repository: {}", query.project_path)))
}

async fn svn_info(
    State(state): State<SharedState>,
    Path(workspace_id): Path<String>,
    Query(query): Query<SvnInfoQuery>,
    Json(request): Json<SvnInfoRequest>,
) -> Result<impl IntoResponse, ServerError> {
    if query.workspace_id != workspace_id {
        return Err(ServerError::BadRequest(format!(
            "Workspace '{}' does not match agent of '{}'",
            query.workspace_id, workspace_id
        )));
    }
    let backend = state.backend();
    require_agent(&backend, &workspace_id)?;
    let url = backend
        .remote_svn_urls
        .get(&format!("{}{}", workspace_id, request.project_path))
        .cloned()
        .ok_or_else(|| ServerError::NotFound(format!("Not a svn working copy: {}", request.project_path)))?;
    Ok(Json(json!({"items": [{"uRL": url}]})))
}

async fn log_session_usage(body: String) -> impl IntoResponse {
    debug!(bytes = body.len(), "Session usage reported");
    Json(json!({}))
}

async fn list_project_types(
    State(state): State<SharedState>,
    Path(workspace_id): Path<String>,
) -> impl IntoResponse {
    let types = state
        .backend()
        .project_types
        .get(&workspace_id)
        .cloned()
        .unwrap_or_else(|| json!([]));
    Json(types)
}

async fn get_branding(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.backend().branding.clone())
}

async fn get_ide_asset(
    State(state): State<SharedState>,
    Path(file): Path<String>,
) -> Result<Response, ServerError> {
    let body = state
        .backend()
        .ide_assets
        .get(&file)
        .cloned()
        .ok_or_else(|| ServerError::NotFound(format!("Resource '{}' not found", file)))?;
    Ok(([(header::CONTENT_TYPE, content_type_of(&file))], body).into_response())
}
