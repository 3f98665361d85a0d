//! In-memory data behind the fake platform API.

use std::collections::{HashMap, HashSet};

use anyhow::{Result, bail};
use serde_json::{Map, Value, json};

use crate::mock::{build_workspaces_data, mock_factories};
use crate::models::{Factory, Profile, Project, Stack, User, Workspace, WorkspaceRuntime};

pub const DEFAULT_PAGE_MAX_ITEMS: u32 = 5;
pub const DEFAULT_PAGE_SKIP_COUNT: u32 = 0;
pub const DEFAULT_IMPLEMENTATION_VERSION: &str = "5.0.0";

/// Seedable store for every collection the fake API serves.
///
/// Builder methods mutate in place; the store is then moved into the
/// router state. Deletes served over HTTP really remove records.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    pub(crate) workspaces: Vec<Workspace>,
    pub(crate) projects_per_workspace: HashMap<String, Vec<Project>>,
    pub(crate) project_details: HashMap<String, Value>,
    pub(crate) project_types: HashMap<String, Value>,
    pub(crate) updated_project_details: HashMap<String, Value>,
    pub(crate) fetchable_projects: HashMap<String, String>,
    pub(crate) project_renames: HashMap<String, String>,
    pub(crate) workspace_agents: HashMap<String, String>,
    pub(crate) remote_git_urls: HashMap<String, Vec<Value>>,
    pub(crate) local_git_urls: HashMap<String, String>,
    pub(crate) remote_svn_urls: HashMap<String, String>,
    pub(crate) profiles: HashMap<String, Profile>,
    pub(crate) default_profile: Profile,
    pub(crate) preferences: Map<String, Value>,
    pub(crate) default_preferences: Map<String, Value>,
    pub(crate) branding: Value,
    pub(crate) stacks: Vec<Stack>,
    pub(crate) project_templates: Vec<Value>,
    pub(crate) auto_snapshot: bool,
    pub(crate) auto_restore: bool,
    pub(crate) default_user: User,
    pub(crate) users_by_id: HashMap<String, User>,
    pub(crate) users_by_email: HashMap<String, User>,
    pub(crate) factories: Vec<Factory>,
    pub(crate) page_max_items: u32,
    pub(crate) page_skip_count: u32,
    pub(crate) failing_deletes: HashSet<String>,
    pub(crate) link_headers: bool,
    pub(crate) implementation_version: String,
    pub(crate) ide_assets: HashMap<String, String>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        let mut attributes = HashMap::new();
        attributes.insert("firstName".to_string(), "FirstName".to_string());
        attributes.insert("lastName".to_string(), "LastName".to_string());

        Self {
            workspaces: Vec::new(),
            projects_per_workspace: HashMap::new(),
            project_details: HashMap::new(),
            project_types: HashMap::new(),
            updated_project_details: HashMap::new(),
            fetchable_projects: HashMap::new(),
            project_renames: HashMap::new(),
            workspace_agents: HashMap::new(),
            remote_git_urls: HashMap::new(),
            local_git_urls: HashMap::new(),
            remote_svn_urls: HashMap::new(),
            profiles: HashMap::new(),
            default_profile: Profile {
                id: "idDefaultUser".into(),
                email: "eclipseChe@eclipse.org".into(),
                attributes,
            },
            preferences: Map::new(),
            default_preferences: Map::new(),
            branding: json!({}),
            stacks: Vec::new(),
            project_templates: Vec::new(),
            auto_snapshot: false,
            auto_restore: false,
            default_user: User::default(),
            users_by_id: HashMap::new(),
            users_by_email: HashMap::new(),
            factories: Vec::new(),
            page_max_items: DEFAULT_PAGE_MAX_ITEMS,
            page_skip_count: DEFAULT_PAGE_SKIP_COUNT,
            failing_deletes: HashSet::new(),
            link_headers: false,
            implementation_version: DEFAULT_IMPLEMENTATION_VERSION.into(),
            ide_assets: HashMap::new(),
        }
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the demo data set used by `mock-server`.
    pub fn demo(factory_count: usize) -> Self {
        let user = User {
            id: "user1".into(),
            name: "che".into(),
            email: "che@eclipse.org".into(),
            aliases: Vec::new(),
        };
        let mut backend = Self::new();
        backend
            .set_default_user(user.clone())
            .add_user_by_id(user.clone())
            .add_user_email(user.clone())
            .add_workspaces(build_workspaces_data())
            .add_stacks(vec![
                Stack {
                    id: "java-default".into(),
                    name: "Java".into(),
                },
                Stack {
                    id: "node-default".into(),
                    name: "Node".into(),
                },
            ])
            .add_ide_asset("compilation-mappings.txt", DEMO_COMPILATION_MAPPINGS)
            .add_ide_asset("0A1B2C3D.cache.js", "/* safari permutation */")
            .add_ide_asset("4E5F6A7B.cache.js", "/* gecko1_8 permutation */");
        for factory in mock_factories(factory_count, &user.id) {
            backend.add_user_factory(factory);
        }
        backend
    }

    pub fn add_workspaces(&mut self, workspaces: Vec<Workspace>) -> &mut Self {
        for workspace in workspaces {
            self.projects_per_workspace
                .entry(workspace.id.clone())
                .or_default();
            if let Some(runtime) = &workspace.runtime {
                self.add_workspace_agent(&workspace.id, runtime);
            }
            self.upsert_workspace(workspace);
        }
        self
    }

    fn upsert_workspace(&mut self, workspace: Workspace) {
        match self.workspaces.iter_mut().find(|w| w.id == workspace.id) {
            Some(existing) => *existing = workspace,
            None => self.workspaces.push(workspace),
        }
    }

    /// Attach projects to a workspace, registering the workspace if it is new.
    pub fn add_projects(&mut self, workspace: &Workspace, projects: Vec<Project>) -> Result<&mut Self> {
        if workspace.id.is_empty() {
            bail!("no workspace id set");
        }
        if !self.workspaces.iter().any(|w| w.id == workspace.id) {
            self.workspaces.push(workspace.clone());
        }
        if let Some(found) = self.workspaces.iter_mut().find(|w| w.id == workspace.id) {
            found.config.projects.extend(projects.iter().cloned());
        }
        self.projects_per_workspace
            .entry(workspace.id.clone())
            .or_default()
            .extend(projects);
        Ok(self)
    }

    pub fn add_project_types(&mut self, workspace_id: &str, project_types: Value) -> &mut Self {
        self.project_types.insert(workspace_id.to_string(), project_types);
        self
    }

    /// Details are keyed by the `workspaceId` and `name` fields of the value.
    pub fn add_project_details(&mut self, details: Value) -> Result<&mut Self> {
        let workspace_id = details.get("workspaceId").and_then(Value::as_str);
        let name = details.get("name").and_then(Value::as_str);
        let (Some(workspace_id), Some(name)) = (workspace_id, name) else {
            bail!("project details need 'workspaceId' and 'name'");
        };
        let key = format!("{}/{}", workspace_id, name);
        self.project_details.insert(key, details);
        Ok(self)
    }

    /// Answer `PUT /project/{workspace}/{name}` with `details`.
    pub fn add_updated_project_details(&mut self, workspace_id: &str, name: &str, details: Value) -> &mut Self {
        self.updated_project_details
            .insert(format!("{}/{}", workspace_id, name), details);
        self
    }

    /// Serve the stored details of `workspace_id/name` on `GET /project/{name}`.
    pub fn add_fetch_project_details(&mut self, workspace_id: &str, name: &str) -> &mut Self {
        self.fetchable_projects
            .insert(name.to_string(), workspace_id.to_string());
        self
    }

    pub fn add_updated_project_name(&mut self, name: &str, new_name: &str) -> &mut Self {
        self.project_renames.insert(name.to_string(), new_name.to_string());
        self
    }

    /// Record the agent a running workspace advertises. Runtimes without a
    /// `wsagent` link leave the workspace agentless.
    pub fn add_workspace_agent(&mut self, workspace_id: &str, runtime: &WorkspaceRuntime) -> &mut Self {
        if let Some(url) = runtime.agent_url() {
            self.workspace_agents
                .insert(workspace_id.to_string(), url.to_string());
        }
        self
    }

    pub fn add_remote_git_url_array(&mut self, workspace_id: &str, project_path: &str, remotes: Vec<Value>) -> &mut Self {
        self.remote_git_urls
            .insert(format!("{}{}", workspace_id, project_path), remotes);
        self
    }

    pub fn add_local_git_url(&mut self, workspace_id: &str, project_path: &str, url: impl Into<String>) -> &mut Self {
        self.local_git_urls
            .insert(format!("{}{}", workspace_id, project_path), url.into());
        self
    }

    pub fn add_remote_svn_url(&mut self, workspace_id: &str, project_path: &str, url: impl Into<String>) -> &mut Self {
        self.remote_svn_urls
            .insert(format!("{}{}", workspace_id, project_path), url.into());
        self
    }

    pub fn add_stacks(&mut self, stacks: Vec<Stack>) -> &mut Self {
        self.stacks.extend(stacks);
        self
    }

    pub fn add_project_templates(&mut self, templates: Vec<Value>) -> &mut Self {
        self.project_templates.extend(templates);
        self
    }

    pub fn add_profile_id(&mut self, profile: Profile) -> &mut Self {
        self.profiles.insert(profile.id.clone(), profile);
        self
    }

    pub fn set_default_profile(&mut self, profile: Profile) -> &mut Self {
        self.default_profile = profile;
        self
    }

    pub fn set_attributes(&mut self, attributes: HashMap<String, String>) -> &mut Self {
        self.default_profile.attributes = attributes;
        self
    }

    pub fn set_preferences(&mut self, preferences: Map<String, Value>) -> &mut Self {
        self.preferences = preferences;
        self
    }

    /// Preferences served until overwritten, and restored by a bare `DELETE`.
    pub fn add_default_preferences(&mut self, preferences: Map<String, Value>) -> &mut Self {
        self.preferences = preferences.clone();
        self.default_preferences = preferences;
        self
    }

    pub fn set_branding(&mut self, branding: Value) -> &mut Self {
        self.branding = branding;
        self
    }

    pub fn set_default_user(&mut self, user: User) -> &mut Self {
        self.default_user = user;
        self
    }

    pub fn add_user_by_id(&mut self, user: User) -> &mut Self {
        self.users_by_id.insert(user.id.clone(), user);
        self
    }

    pub fn add_user_email(&mut self, user: User) -> &mut Self {
        self.users_by_email.insert(user.email.clone(), user);
        self
    }

    pub fn add_user_factory(&mut self, factory: Factory) -> &mut Self {
        match self.factories.iter_mut().find(|f| f.id == factory.id) {
            Some(existing) => *existing = factory,
            None => self.factories.push(factory),
        }
        self
    }

    pub fn set_page_max_item(&mut self, max_items: u32) -> &mut Self {
        self.page_max_items = max_items;
        self
    }

    pub fn set_page_skip_count(&mut self, skip_count: u32) -> &mut Self {
        self.page_skip_count = skip_count;
        self
    }

    pub fn set_workspace_auto_snapshot(&mut self, enabled: bool) -> &mut Self {
        self.auto_snapshot = enabled;
        self
    }

    pub fn set_workspace_auto_restore(&mut self, enabled: bool) -> &mut Self {
        self.auto_restore = enabled;
        self
    }

    /// Make `DELETE` of this id answer 500.
    pub fn fail_delete_of(&mut self, id: impl Into<String>) -> &mut Self {
        self.failing_deletes.insert(id.into());
        self
    }

    pub fn with_link_headers(&mut self, enabled: bool) -> &mut Self {
        self.link_headers = enabled;
        self
    }

    pub fn set_implementation_version(&mut self, version: impl Into<String>) -> &mut Self {
        self.implementation_version = version.into();
        self
    }

    /// Static file served under `/_app/`.
    pub fn add_ide_asset(&mut self, file: impl Into<String>, body: impl Into<String>) -> &mut Self {
        self.ide_assets.insert(file.into(), body.into());
        self
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn factories(&self) -> &[Factory] {
        &self.factories
    }

    pub fn workspace_agent(&self, workspace_id: &str) -> Option<&str> {
        self.workspace_agents.get(workspace_id).map(String::as_str)
    }

    pub(crate) fn factories_of(&self, user_id: &str) -> Vec<Factory> {
        self.factories
            .iter()
            .filter(|f| f.creator.as_ref().is_some_and(|c| c.user_id == user_id))
            .cloned()
            .collect()
    }

    pub(crate) fn workspace_settings(&self) -> Value {
        json!({
            "che.workspace.auto_snapshot": self.auto_snapshot,
            "che.workspace.auto_restore": self.auto_restore,
        })
    }
}

/// Slice one page out of `items`.
pub fn page_slice<T: Clone>(items: &[T], max_items: u32, skip_count: u32) -> Vec<T> {
    let skip = skip_count as usize;
    if skip >= items.len() {
        return Vec::new();
    }
    let end = (skip + max_items as usize).min(items.len());
    items[skip..end].to_vec()
}

const DEMO_COMPILATION_MAPPINGS: &str = "\
0A1B2C3D.cache.js
user.agent safari

4E5F6A7B.cache.js
user.agent gecko1_8
";
