//! Ingestion stage of the package pipeline.
//!
//! For each selected package the hosting service is asked (concurrently) for
//! repository metadata, the license and the rendered readme. The results are
//! combined into the package's [`Repository`](pkgindex_models::Repository)
//! record, with the parent of a fork resolved against the tracked packages
//! ([`resolve_fork`]) and the readme copied to the object store whenever its
//! etag changes ([`ReadmeCache`]).
//!
//! The primary entry point is [`Ingestion::ingest`].

mod engine;
pub mod error;
mod fork;
mod readme;

pub use crate::engine::{Ingestion, IngestionReport, Selector};
pub use crate::error::PackageFailure;
pub use crate::fork::resolve_fork;
pub use crate::readme::{FetchedReadme, ReadmeCache};
