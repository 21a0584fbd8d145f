//! Client-side state core for a desktop database browser.
//!
//! Four cooperating state managers own the client state:
//!
//! - [`state::ConnectionRegistry`] - saved connections, live status,
//!   display order, per-connection schema selection
//! - [`services::ConnectionLifecycle`] - drives connect/disconnect/delete/
//!   duplicate against the backend and writes outcomes into the registry
//! - [`state::QueryHistoryStore`] - paginated, searchable query history
//! - [`state::SavedQueryCatalog`] - folder-organized saved queries
//!
//! Backend calls go through the capability traits in [`services::backend`];
//! [`services::AppStore`] implements the persistence half over SQLite, while
//! the live-database half is injected by the application.

pub mod services;
pub mod state;
