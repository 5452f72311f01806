//! Client for the hosting service that package repositories live on.
//!
//! [`HostingClient`] is the seam the ingestion engine fetches through; the
//! live implementation talks to the GitHub REST and GraphQL APIs.

mod client;
mod consts;
pub mod error;
mod github;
#[cfg(feature = "mock")]
mod mock;
mod models;
mod readme;

pub use crate::client::HostingClient;
pub use crate::github::GithubClient;
#[cfg(feature = "mock")]
pub use crate::mock::MockHosting;
pub use crate::models::{Asset, ImageToCache, LicenseInfo, Metadata, Readme};
pub use crate::readme::private_images;
use std::sync::Arc;

pub type HostingHandle = Arc<dyn HostingClient + Send + Sync>;
