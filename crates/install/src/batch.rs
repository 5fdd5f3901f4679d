//! Planning several artifacts as one batch

use crate::planner::{InstallPlan, InstallPlanner, PlanSet};
use bpi_errors::Error;
use bpi_types::{InstallAction, InstallOptions};
use std::path::PathBuf;

/// One artifact the caller wants installed
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub name: String,
    pub artifact: PathBuf,
    pub options: InstallOptions,
}

impl InstallRequest {
    pub fn new(name: impl Into<String>, artifact: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            artifact: artifact.into(),
            options: InstallOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: InstallOptions) -> Self {
        self.options = options;
        self
    }
}

/// Threads a [`PlanSet`] through successive plans
#[derive(Debug)]
pub struct BatchPlanner<'a> {
    planner: &'a InstallPlanner,
    claimed: PlanSet,
}

impl<'a> BatchPlanner<'a> {
    #[must_use]
    pub fn new(planner: &'a InstallPlanner) -> Self {
        Self {
            planner,
            claimed: PlanSet::new(),
        }
    }

    /// Rows claimed by upgrades planned so far
    #[must_use]
    pub fn plan_set(&self) -> &PlanSet {
        &self.claimed
    }

    /// Plan one request against everything planned before it
    ///
    /// # Errors
    ///
    /// Returns the planner's rejection or a storage error.
    pub async fn plan(&mut self, request: &InstallRequest) -> Result<InstallPlan, Error> {
        let plan = self
            .planner
            .plan(
                &request.name,
                &request.artifact,
                request.options.clone(),
                &self.claimed,
            )
            .await?;

        if plan.action == InstallAction::Upgrade {
            if let Some(target) = &plan.target {
                self.claimed.insert(target.clone());
            }
        }
        Ok(plan)
    }

    /// Plan all requests in order, stopping at the first rejection
    ///
    /// # Errors
    ///
    /// Returns the first planning error; no plans are returned in that case.
    pub async fn plan_all(&mut self, requests: &[InstallRequest]) -> Result<Vec<InstallPlan>, Error> {
        let mut plans = Vec::with_capacity(requests.len());
        for request in requests {
            plans.push(self.plan(request).await?);
        }
        Ok(plans)
    }
}
