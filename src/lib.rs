pub mod api;
pub mod backend;
pub mod branding;
pub mod config;
pub mod errors;
pub mod filters;
pub mod ide_fetcher;
pub mod list;
pub mod logging;
pub mod mock;
pub mod models;
pub mod ui;
