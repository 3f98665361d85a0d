//! REST access to the platform API.
//!
//! | Module         | Responsibility                                        |
//! |----------------|-------------------------------------------------------|
//! | `client`       | `ApiClient`: status mapping, `{message}` bodies, 304  |
//! | `links`        | `Link` header parsing and page arithmetic             |
//! | `page_service` | `RemotePageService`: ETag cache, generation guard     |

pub mod client;
pub mod links;
pub mod page_service;

pub use client::{ApiClient, PageResponse};
pub use page_service::{Collection, RemotePageService};
