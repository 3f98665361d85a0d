//! Mock data sets for tests and the `mock-server` command.

use serde::{Deserialize, Serialize};

use crate::list::NameFilter;
use crate::models::{Entity, Factory, Workspace, WorkspaceStatus};

pub const MOCK_ID_KEY: &str = "id";

/// Minimal entity used to exercise list bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MockItem {
    pub id: String,
    pub name: String,
}

impl Entity for MockItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub fn mock_items(count: usize) -> Vec<MockItem> {
    (0..count)
        .map(|i| MockItem {
            id: format!("item-{}-{}", MOCK_ID_KEY, i),
            name: format!("item-name-{}", i),
        })
        .collect()
}

pub fn filter_by_name(name: &str) -> NameFilter {
    NameFilter::new(name)
}

pub fn mock_factories(count: usize, creator_id: &str) -> Vec<Factory> {
    (0..count)
        .map(|i| Factory::new(format!("factoryId{}", i), format!("factoryName{}", i)).with_creator(creator_id))
        .collect()
}

const WORKSPACE_COUNT: usize = 15;
const DEV_MACHINE_MEMORY: &str = "2147483648";
const DEV_MACHINE_AGENTS: [&str; 4] = [
    "org.eclipse.che.terminal",
    "org.eclipse.che.ws-agent",
    "org.eclipse.che.ssh",
    "org.eclipse.che.exec",
];

/// Fifteen stopped workspaces in the `che` namespace, each with a 2 GiB dev machine.
pub fn build_workspaces_data() -> Vec<Workspace> {
    let now = chrono::Utc::now().timestamp();
    let environments = serde_json::json!({
        "default": {
            "machines": {
                "dev-machine": {
                    "attributes": {"memoryLimitBytes": DEV_MACHINE_MEMORY},
                    "servers": {},
                    "agents": DEV_MACHINE_AGENTS,
                    "recipe": {"location": "eclipse/ubuntu_jdk8", "type": "dockerimage"}
                }
            }
        }
    });

    (0..WORKSPACE_COUNT)
        .map(|i| {
            let mut ws = Workspace::new(format!("workspaceId{}", i), "che", format!("workspaceName{}", i));
            ws.status = WorkspaceStatus::Stopped;
            ws.config.default_env = "default".to_string();
            ws.config.environments = environments.clone();
            ws.attributes.insert("created".into(), now.into());
            ws.attributes.insert("updated".into(), now.into());
            ws.attributes.insert("stackId".into(), "stackId".into());
            ws
        })
        .collect()
}
