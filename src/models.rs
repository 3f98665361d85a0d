use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A server-owned record the dashboard lists and deletes.
///
/// The client only ever holds read-only copies fetched over the network.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;

    /// Display name used by the client-side name filter.
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FactoryCreator {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Factory {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<FactoryCreator>,
    /// Fields the dashboard does not interpret are carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Factory {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            creator: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_creator(mut self, user_id: impl Into<String>) -> Self {
        self.creator = Some(FactoryCreator {
            user_id: user_id.into(),
            created: None,
        });
        self
    }
}

impl Entity for Factory {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkspaceStatus {
    Running,
    Starting,
    Stopping,
    #[default]
    Stopped,
    Snapshotting,
}

impl WorkspaceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Starting => "STARTING",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
            Self::Snapshotting => "SNAPSHOTTING",
        }
    }
}

impl FromStr for WorkspaceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RUNNING" => Ok(Self::Running),
            "STARTING" => Ok(Self::Starting),
            "STOPPING" => Ok(Self::Stopping),
            "STOPPED" => Ok(Self::Stopped),
            "SNAPSHOTTING" => Ok(Self::Snapshotting),
            _ => Err(format!("Invalid workspace status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, rename = "type")]
    pub project_type: String,
    #[serde(default)]
    pub description: String,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: format!("/{}", name),
            name,
            project_type: "blank".to_string(),
            description: String::new(),
        }
    }
}

impl Entity for Project {
    fn id(&self) -> &str {
        &self.path
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    pub name: String,
    #[serde(default)]
    pub default_env: String,
    #[serde(default)]
    pub environments: serde_json::Value,
    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceRuntime {
    #[serde(default)]
    pub links: Vec<Link>,
}

impl WorkspaceRuntime {
    /// URL of the in-workspace agent, advertised under `rel = "wsagent"`.
    pub fn agent_url(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel == "wsagent")
            .map(|l| l.href.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub status: WorkspaceStatus,
    #[serde(default)]
    pub config: WorkspaceConfig,
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<WorkspaceRuntime>,
}

impl Workspace {
    pub fn new(id: impl Into<String>, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            namespace: namespace.into(),
            status: WorkspaceStatus::Stopped,
            config: WorkspaceConfig {
                name: name.into(),
                ..WorkspaceConfig::default()
            },
            attributes: HashMap::new(),
            runtime: None,
        }
    }

    /// Memory limit of the default environment's dev machine, in bytes.
    pub fn dev_machine_memory(&self) -> Option<u64> {
        let env = self.config.environments.get(&self.config.default_env)?;
        let machines = env.get("machines")?.as_object()?;
        machines.values().find_map(|m| {
            let raw = m.get("attributes")?.get("memoryLimitBytes")?;
            match raw {
                serde_json::Value::String(s) => s.parse().ok(),
                serde_json::Value::Number(n) => n.as_u64(),
                _ => None,
            }
        })
    }
}

impl Entity for Workspace {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Entity for User {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(alias = "userId")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stack {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Body returned by entity DELETE endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeleteResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Server-reported pagination metadata.
///
/// `count_of_pages` is absent for collections whose total size is unknown.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PagesInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_of_pages: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_preserves_unknown_fields() {
        let json = r#"{"id":"f1","name":"demo","v":"4.0","creator":{"userId":"u1"}}"#;
        let factory: Factory = serde_json::from_str(json).unwrap();
        assert_eq!(factory.id(), "f1");
        assert_eq!(factory.creator.as_ref().unwrap().user_id, "u1");
        assert_eq!(factory.extra["v"], "4.0");

        let back = serde_json::to_value(&factory).unwrap();
        assert_eq!(back["v"], "4.0");
    }

    #[test]
    fn workspace_status_roundtrips_through_str() {
        for status in [
            WorkspaceStatus::Running,
            WorkspaceStatus::Stopped,
            WorkspaceStatus::Snapshotting,
        ] {
            assert_eq!(status.as_str().parse::<WorkspaceStatus>().unwrap(), status);
        }
        assert!("sleeping".parse::<WorkspaceStatus>().is_err());
    }

    #[test]
    fn workspace_name_comes_from_config() {
        let ws = Workspace::new("ws1", "che", "my-ws");
        assert_eq!(Entity::name(&ws), "my-ws");
        assert_eq!(ws.status, WorkspaceStatus::Stopped);
    }

    #[test]
    fn dev_machine_memory_reads_string_attribute() {
        let mut ws = Workspace::new("ws1", "che", "my-ws");
        ws.config.default_env = "default".into();
        ws.config.environments = serde_json::json!({
            "default": {"machines": {"dev-machine": {"attributes": {"memoryLimitBytes": "2147483648"}}}}
        });
        assert_eq!(ws.dev_machine_memory(), Some(2_147_483_648));
    }

    #[test]
    fn runtime_agent_url_uses_wsagent_link() {
        let runtime = WorkspaceRuntime {
            links: vec![
                Link { rel: "ide".into(), href: "/ide".into() },
                Link { rel: "wsagent".into(), href: "/wsagent/ws1".into() },
            ],
        };
        assert_eq!(runtime.agent_url(), Some("/wsagent/ws1"));
    }

    #[test]
    fn profile_accepts_user_id_alias() {
        let profile: Profile = serde_json::from_str(r#"{"userId":"u1","email":"a@b.c"}"#).unwrap();
        assert_eq!(profile.id, "u1");
    }

    #[test]
    fn pages_info_omits_absent_fields() {
        let info = PagesInfo {
            current_page_number: Some(1),
            count_of_pages: None,
        };
        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json, serde_json::json!({"currentPageNumber": 1}));
    }
}
