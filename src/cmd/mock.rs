//! `che-dash mock-server`.

use anyhow::Result;
use console::style;

use che_dash::backend::{FakeBackend, ServerConfig, start_server};
use che_dash::ui::icons::PACKAGE;

pub async fn cmd_mock_server(host: String, port: u16, links: bool, factories: usize) -> Result<()> {
    let backend = FakeBackend::demo(factories);
    println!(
        "{}Seeded {} factories and {} workspaces{}",
        PACKAGE,
        backend.factories().len(),
        backend.workspaces().len(),
        if links {
            style(" (Link headers on)").dim().to_string()
        } else {
            String::new()
        }
    );
    println!("Press Ctrl+C to stop.");

    start_server(ServerConfig { host, port, links }, backend).await
}
