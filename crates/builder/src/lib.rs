//! Compatibility builds on the external build farm.
//!
//! - [`BuildTrigger`] submits one build (platform × compiler version of a
//!   package version) as a pipeline of the builder project.
//! - [`get_status_count`] counts builder pipelines by status through the
//!   [`PipelineApi`] seam.
//! - [`BuildReports`] records builds around that round trip.
//! - [`BuildMatrix`] lays a package's builds out as a grid of outcomes.

pub mod error;
mod matrix;
mod pipelines;
mod report;
mod trigger;

pub use crate::matrix::{BuildGroup, BuildMatrix, Cell, Column, Row, RowIndex, completed_build_count};
pub use crate::pipelines::{
    DEFAULT_MAX_PAGE_COUNT, DEFAULT_PAGE_SIZE, GitlabPipelines, Pipeline, PipelineApi, PipelineStatus,
    get_status_count,
};
pub use crate::report::{BuildReports, BuildRequest};
pub use crate::trigger::{BuildJob, BuildTrigger, TriggerRequest, TriggerResponse, parse_trigger_response, trigger_request};
