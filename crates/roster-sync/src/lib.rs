//! Directory reconciliation for Roster.
//!
//! Pulls the external system's unified person list through a
//! [`DirectorySource`], normalizes each record, and upserts it into a
//! [`roster_core::store::DirectoryStore`] keyed by reference id and type.
//!
//! ```rust,ignore
//! let source = HttpDirectorySource::new(source_config)?;
//! let summary = Reconciler::new(store, source).reconcile().await?;
//! ```

pub mod error;
pub mod reconcile;
pub mod report;
pub mod source;

pub use error::{FetchError, SyncError};
pub use reconcile::Reconciler;
pub use report::{Reporter, TracingReporter};
pub use source::{DirectorySource, HttpDirectorySource, SourceConfig};

#[cfg(test)]
mod tests;
