//! cronview-cron: Read-only access to scheduled cron jobs.
//!
//! Jobs come from exactly one [`JobSource`] per deployment: the local
//! store file ([`store::StoreJobSource`]) or a remote registry (see the
//! `cronview-gateway` crate). Nothing here schedules, runs, or writes jobs.

pub mod source;
pub mod store;

pub use source::{JobSource, SourceError};
pub use store::{CronStoreFile, StoreJobSource, resolve_store_path};
