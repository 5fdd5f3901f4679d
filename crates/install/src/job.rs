//! Job wrapper around a single install plan

use crate::executor::{InstallExecutor, InstallOutcome};
use crate::planner::InstallPlan;
use bpi_errors::Error;
use bpi_events::{AppEvent, EventEmitter, EventSender, InstallEvent};

/// Name under which the job layer configures installs
pub const JOB_NAME: &str = "buildpack_installer";

/// One queued install
#[derive(Debug, Clone)]
pub struct InstallJob {
    plan: InstallPlan,
    executor: InstallExecutor,
    max_attempts: u32,
}

impl EventEmitter for InstallJob {
    fn event_sender(&self) -> Option<&EventSender> {
        self.executor.event_sender()
    }

    fn correlation_id(&self) -> Option<&str> {
        Some(&self.plan.name)
    }
}

impl InstallJob {
    #[must_use]
    pub fn new(plan: InstallPlan, executor: InstallExecutor) -> Self {
        Self {
            plan,
            executor,
            max_attempts: 1,
        }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn job_name(&self) -> &'static str {
        JOB_NAME
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn plan(&self) -> &InstallPlan {
        &self.plan
    }

    /// Execute the plan once, reporting progress as install events.
    ///
    /// # Errors
    ///
    /// Propagates any execution error after emitting a failure event.
    pub async fn perform(&self) -> Result<InstallOutcome, Error> {
        let name = self.plan.name.as_str();
        self.emit_install_started(name, self.plan.action);

        match self.executor.execute(&self.plan).await {
            Ok(outcome) => {
                let event = match &outcome {
                    InstallOutcome::Installed { guid, created, .. } => InstallEvent::Completed {
                        name: name.to_string(),
                        guid: guid.clone(),
                        created: *created,
                    },
                    InstallOutcome::LockedSkip { guid } => InstallEvent::Skipped {
                        name: name.to_string(),
                        guid: guid.clone(),
                        reason: "buildpack is locked".to_string(),
                    },
                };
                self.emit(AppEvent::Install(event));
                Ok(outcome)
            }
            Err(err) => {
                self.emit_install_failed(name, &err);
                Err(err)
            }
        }
    }
}
