//! Install execution

use crate::planner::InstallPlan;
use crate::uploader::ArtifactUploader;
use bpi_errors::{Error, InstallError, StateError};
use bpi_events::{AppEvent, EventEmitter, EventSender, InstallEvent};
use bpi_stack::StackExtractor;
use bpi_state::{Buildpack, StateManager};
use serde::Serialize;
use std::sync::Arc;

/// Result of executing a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InstallOutcome {
    Installed {
        guid: String,
        /// The row was created by this execution
        created: bool,
        /// False when the stored artifact was already identical
        uploaded: bool,
    },
    /// The matching row is locked; nothing was written
    LockedSkip { guid: String },
}

impl InstallOutcome {
    #[must_use]
    pub fn guid(&self) -> &str {
        match self {
            Self::Installed { guid, .. } | Self::LockedSkip { guid } => guid,
        }
    }
}

/// Events for one plan, stamped with the plan name as correlation id
struct PlanScope<'a> {
    tx: Option<&'a EventSender>,
    name: &'a str,
}

impl EventEmitter for PlanScope<'_> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx
    }

    fn correlation_id(&self) -> Option<&str> {
        Some(self.name)
    }
}

/// Performs install plans against storage and the artifact store
#[derive(Clone)]
pub struct InstallExecutor {
    state: StateManager,
    extractor: Arc<dyn StackExtractor>,
    uploader: Arc<dyn ArtifactUploader>,
    tx: Option<EventSender>,
}

impl std::fmt::Debug for InstallExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallExecutor").finish_non_exhaustive()
    }
}

impl InstallExecutor {
    #[must_use]
    pub fn new(
        state: StateManager,
        extractor: Arc<dyn StackExtractor>,
        uploader: Arc<dyn ArtifactUploader>,
    ) -> Self {
        Self {
            state,
            extractor,
            uploader,
            tx: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    pub(crate) fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }

    /// Rows the plan applies to, narrowed by the artifact's stack
    async fn resolve(&self, plan: &InstallPlan) -> Result<Vec<Buildpack>, Error> {
        match self.extractor.extract(&plan.artifact).await {
            Some(stack) => {
                let by_stack = self.state.find_by_name_and_stack(&plan.name, &stack).await?;
                if by_stack.is_empty() {
                    self.state.find_by_name_without_stack(&plan.name).await
                } else {
                    Ok(by_stack)
                }
            }
            None => self.state.find_by_name(&plan.name).await,
        }
    }

    /// Execute a plan.
    ///
    /// Executing the same plan twice leaves the same single row behind.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::AmbiguousTarget`] if several rows match, the
    /// uploader's error if the upload fails (after deleting a row created by
    /// this call), or any storage error.
    pub async fn execute(&self, plan: &InstallPlan) -> Result<InstallOutcome, Error> {
        let scope = PlanScope {
            tx: self.tx.as_ref(),
            name: &plan.name,
        };

        let mut rows = self.resolve(plan).await?;
        if rows.len() > 1 {
            return Err(InstallError::AmbiguousTarget {
                name: plan.name.clone(),
                count: rows.len(),
            }
            .into());
        }

        let (buildpack, created) = match rows.pop() {
            Some(row) if row.locked => {
                return Ok(InstallOutcome::LockedSkip { guid: row.guid });
            }
            Some(row) => (row, false),
            None => {
                let row = self.state.create_locked(&plan.name).await?;
                scope.emit(AppEvent::Install(InstallEvent::Created {
                    name: plan.name.clone(),
                    guid: row.guid.clone(),
                }));
                (row, true)
            }
        };

        let filename = plan.filename();
        let uploaded = match self
            .uploader
            .upload(&buildpack, &plan.artifact, &filename)
            .await
        {
            Ok(changed) => changed,
            Err(err) => {
                if created {
                    self.roll_back(&scope, &buildpack).await;
                }
                return Err(err);
            }
        };

        if !plan.options.is_empty() {
            self.state
                .update_attributes(&buildpack.guid, &plan.options)
                .await?;
        }

        let current = self
            .state
            .get(&buildpack.guid)
            .await?
            .ok_or_else(|| StateError::BuildpackNotFound {
                guid: buildpack.guid.clone(),
            })?;
        scope.emit(AppEvent::Install(InstallEvent::Uploaded {
            name: plan.name.clone(),
            guid: current.guid.clone(),
            filename,
            stack: current.stack,
            changed: uploaded,
        }));

        Ok(InstallOutcome::Installed {
            guid: current.guid,
            created,
            uploaded,
        })
    }

    async fn roll_back(&self, scope: &PlanScope<'_>, buildpack: &Buildpack) {
        match self.state.delete(buildpack).await {
            Ok(_) => scope.emit(AppEvent::Install(InstallEvent::RolledBack {
                name: buildpack.name.clone(),
                guid: buildpack.guid.clone(),
            })),
            Err(e) => scope.emit_warning_with_context(
                format!("failed to remove buildpack {} after upload error", buildpack.guid),
                e.to_string(),
            ),
        }
    }
}
