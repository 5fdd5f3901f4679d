#![warn(clippy::pedantic)]
#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

//! Buildpack install planning and execution for bpi
//!
//! Installing a buildpack happens in two phases. [`InstallPlanner`] decides,
//! without side effects, whether an artifact creates a new buildpack or
//! upgrades an existing one. [`InstallExecutor`] then performs the decision:
//! it re-resolves the target row, creates it under the buildpacks lock if
//! needed, uploads the artifact and applies the requested attributes.

mod batch;
mod executor;
mod job;
mod planner;
mod uploader;

pub use batch::{BatchPlanner, InstallRequest};
pub use executor::{InstallExecutor, InstallOutcome};
pub use job::{InstallJob, JOB_NAME};
pub use planner::{decide, Decision, InstallPlan, InstallPlanner, PlanSet};
pub use uploader::{ArtifactUploader, BlobstoreUploader};

// Re-exported so callers can wire events without depending on bpi-events
pub use bpi_events::EventSender;
