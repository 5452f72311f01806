//! Domain types shared across the package index pipeline.
//!
//! The pipeline tracks [`Package`]s discovered on a hosting service, ingests
//! their [`Repository`] metadata, and records [`Build`]s of their
//! [`Version`]s across a compatibility matrix of [`Platform`]s and
//! [`CompilerVersion`]s.

mod build;
mod compiler;
pub mod error;
mod license;
mod package;
mod repository;
mod url;
mod version;

pub use crate::build::{Build, BuildStatus, Platform};
pub use crate::compiler::{CompilerVersion, DroppingZeroes};
pub use crate::license::{License, LicenseKind};
pub use crate::package::{Package, Stage, Status};
pub use crate::repository::{Fork, FundingLink, FundingPlatform, Release, Repository, S3Readme};
pub use crate::url::{normalize_url, owner_repository};
pub use crate::version::{DocArchive, Reference, Version, VersionKind};

/// Identifiers are random UUIDs for every entity.
pub type Id = uuid::Uuid;
