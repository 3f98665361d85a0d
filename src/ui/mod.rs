pub mod icons;
pub mod notify;
pub mod spinner;
pub mod table;

pub use notify::{ConsoleNotifier, DialoguerConfirmer};
pub use spinner::LoadingSpinner;
pub use table::{factories_table, pagination_footer, workspaces_table};
