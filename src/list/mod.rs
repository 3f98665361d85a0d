//! Paginated list with client-side filtering, selection and bulk delete.

pub mod controller;
pub mod helper;
pub mod labels;
pub mod pagination;
pub mod service;

pub use controller::{DeleteSummary, ListController, LoadOutcome, LoadPhase};
pub use helper::{ListHelper, NameFilter};
pub use labels::{ConfirmPrompt, EntityLabels, FACTORY_LABELS, WORKSPACE_LABELS};
pub use pagination::{PageWindow, PaginationInfo};
pub use service::{AutoConfirm, Confirmer, Notifier, PageKey, PageService};
