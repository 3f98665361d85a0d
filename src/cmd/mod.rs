//! CLI command implementations.
//!
//! | Module      | Commands handled            |
//! |-------------|-----------------------------|
//! | `entities`  | `Factories`, `Workspaces`   |
//! | `branding`  | `Branding`                  |
//! | `ide`       | `Ide`                       |
//! | `mock`      | `MockServer`                |
//! | `config`    | `Config`                    |

pub mod branding;
pub mod config;
pub mod entities;
pub mod ide;
pub mod mock;

pub use branding::cmd_branding_show;
pub use config::cmd_config;
pub use entities::{cmd_factories, cmd_workspaces};
pub use ide::cmd_ide_prefetch;
pub use mock::cmd_mock_server;
