//! Fake platform API for tests and local demos.
//!
//! ```text
//! ┌──────────────┐  HTTP  ┌──────────────────────────────────────────┐
//! │ ApiClient /  │ ─────> │ server.rs  (build_router, start_server)  │
//! │ test harness │ <───── │   └─ api.rs  (handlers, AppState)        │
//! └──────────────┘        │         └─ data.rs  (FakeBackend store)  │
//!                         └──────────────────────────────────────────┘
//! ```
//!
//! Paged listings carry an ETag and answer `If-None-Match` with 304.
//! Deletes remove records for real; [`FakeBackend::fail_delete_of`] forces
//! a 500 for one id.

pub mod api;
pub mod data;
pub mod server;

pub use data::FakeBackend;
pub use server::{ServerConfig, build_router, spawn_local, start_server};
