//! Install planning
//!
//! Planning reads storage and the artifact but never writes. The decision
//! itself is the pure function [`decide`]; [`InstallPlanner`] gathers its
//! inputs.

use bpi_errors::{Error, InstallError};
use bpi_events::{AppEvent, EventEmitter, EventSender, InstallEvent};
use bpi_stack::StackExtractor;
use bpi_state::{Buildpack, StateManager};
use bpi_types::{InstallAction, InstallOptions};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Buildpacks already claimed by earlier plans of the same batch
///
/// Membership is by guid, so a row read before and after an attribute
/// change still counts as the same member.
#[derive(Debug, Clone, Default)]
pub struct PlanSet {
    entries: Vec<Buildpack>,
}

impl PlanSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a buildpack; returns false if it was already present
    pub fn insert(&mut self, buildpack: Buildpack) -> bool {
        if self.contains(&buildpack) {
            return false;
        }
        self.entries.push(buildpack);
        true
    }

    #[must_use]
    pub fn contains(&self, buildpack: &Buildpack) -> bool {
        self.entries.iter().any(|entry| entry.same_row(buildpack))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Buildpack> {
        self.entries.iter()
    }
}

/// A decided, not yet executed, install
#[derive(Debug, Clone, Serialize)]
pub struct InstallPlan {
    pub name: String,
    /// Always `None` at planning time; the stack is taken from the artifact
    /// during upload
    pub target_stack: Option<String>,
    pub artifact: PathBuf,
    pub options: InstallOptions,
    pub action: InstallAction,
    /// The stored row an upgrade was planned against
    pub target: Option<Buildpack>,
}

impl InstallPlan {
    fn new(
        name: &str,
        artifact: &Path,
        options: InstallOptions,
        action: InstallAction,
        target: Option<Buildpack>,
    ) -> Self {
        Self {
            name: name.to_string(),
            target_stack: None,
            artifact: artifact.to_path_buf(),
            options,
            action,
            target,
        }
    }

    /// Display name recorded for the uploaded artifact
    #[must_use]
    pub fn filename(&self) -> String {
        self.artifact.file_name().map_or_else(
            || self.artifact.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }
}

/// Outcome of the planning decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Create,
    Upgrade,
    Duplicate,
    StacklessIncompatible,
}

/// Decide what to do given the first stored row with the requested name.
///
/// `found_stack` is that row's stack, `detected` the artifact's stack and
/// `in_set` whether the row was already claimed earlier in the batch. A
/// stackless row that was already claimed can still be joined by a stacked
/// sibling, so that check runs before the duplicate check.
#[must_use]
pub fn decide(found_stack: Option<&str>, detected: Option<&str>, in_set: bool) -> Decision {
    if found_stack.is_none() && detected.is_some() && in_set {
        return Decision::Create;
    }
    if in_set && found_stack == detected {
        return Decision::Duplicate;
    }
    if detected.is_none() && found_stack.is_some() {
        return Decision::StacklessIncompatible;
    }
    Decision::Upgrade
}

/// Produces install plans from stored state and artifact contents
#[derive(Clone)]
pub struct InstallPlanner {
    state: StateManager,
    extractor: Arc<dyn StackExtractor>,
    tx: Option<EventSender>,
}

impl std::fmt::Debug for InstallPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallPlanner").finish_non_exhaustive()
    }
}

impl EventEmitter for InstallPlanner {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl InstallPlanner {
    #[must_use]
    pub fn new(state: StateManager, extractor: Arc<dyn StackExtractor>) -> Self {
        Self {
            state,
            extractor,
            tx: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Plan the install of `artifact` as buildpack `name`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::DuplicateInstall`] when the batch already
    /// planned the same row for the same stack,
    /// [`InstallError::StacklessIncompatible`] when a stackless artifact
    /// would replace a stacked buildpack, or a storage error.
    pub async fn plan(
        &self,
        name: &str,
        artifact: &Path,
        options: InstallOptions,
        existing: &PlanSet,
    ) -> Result<InstallPlan, Error> {
        let found = self.state.find_by_name(name).await?;
        let Some(found) = found.into_iter().next() else {
            let plan = InstallPlan::new(name, artifact, options, InstallAction::Create, None);
            self.emit_planned(&plan, None);
            return Ok(plan);
        };

        let detected = self.extractor.extract(artifact).await;
        let decision = decide(
            found.stack.as_deref(),
            detected.as_deref(),
            existing.contains(&found),
        );

        let plan = match decision {
            Decision::Create => {
                InstallPlan::new(name, artifact, options, InstallAction::Create, None)
            }
            Decision::Upgrade => InstallPlan::new(
                name,
                artifact,
                options,
                InstallAction::Upgrade,
                Some(found),
            ),
            Decision::Duplicate => {
                return Err(InstallError::DuplicateInstall {
                    name: name.to_string(),
                    stack: detected,
                }
                .into());
            }
            Decision::StacklessIncompatible => {
                return Err(InstallError::StacklessIncompatible {
                    name: name.to_string(),
                    stack: found.stack.unwrap_or_default(),
                }
                .into());
            }
        };

        self.emit_planned(&plan, detected);
        Ok(plan)
    }

    fn emit_planned(&self, plan: &InstallPlan, detected_stack: Option<String>) {
        self.emit(AppEvent::Install(InstallEvent::Planned {
            name: plan.name.clone(),
            action: plan.action,
            filename: plan.filename(),
            detected_stack,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stack() -> impl Strategy<Value = Option<String>> {
        prop::option::of(prop::sample::select(vec![
            "cflinuxfs3".to_string(),
            "cflinuxfs4".to_string(),
            "windows".to_string(),
        ]))
    }

    #[test]
    fn fresh_stack_joins_claimed_stackless_row() {
        assert_eq!(decide(None, Some("cflinuxfs4"), true), Decision::Create);
    }

    #[test]
    fn unclaimed_rows_upgrade() {
        assert_eq!(decide(None, None, false), Decision::Upgrade);
        assert_eq!(decide(None, Some("cflinuxfs4"), false), Decision::Upgrade);
        assert_eq!(
            decide(Some("cflinuxfs4"), Some("cflinuxfs3"), false),
            Decision::Upgrade
        );
    }

    #[test]
    fn stacked_row_rejects_stackless_artifact() {
        assert_eq!(
            decide(Some("cflinuxfs4"), None, false),
            Decision::StacklessIncompatible
        );
        assert_eq!(
            decide(Some("cflinuxfs4"), None, true),
            Decision::StacklessIncompatible
        );
    }

    #[test]
    fn claimed_row_with_same_stack_is_duplicate() {
        assert_eq!(decide(None, None, true), Decision::Duplicate);
        assert_eq!(
            decide(Some("cflinuxfs4"), Some("cflinuxfs4"), true),
            Decision::Duplicate
        );
    }

    #[test]
    fn plan_filename_is_basename() {
        let plan = InstallPlan::new(
            "ruby",
            Path::new("/tmp/builds/ruby-1.2.zip"),
            InstallOptions::default(),
            InstallAction::Create,
            None,
        );
        assert_eq!(plan.filename(), "ruby-1.2.zip");
        assert_eq!(plan.target_stack, None);
    }

    proptest! {
        #[test]
        fn unclaimed_rows_never_create_or_duplicate(found in stack(), detected in stack()) {
            let decision = decide(found.as_deref(), detected.as_deref(), false);
            prop_assert!(matches!(
                decision,
                Decision::Upgrade | Decision::StacklessIncompatible
            ));
        }

        #[test]
        fn stackless_artifact_never_reaches_stacked_row(found in "[a-z0-9]{1,12}", in_set: bool) {
            let decision = decide(Some(&found), None, in_set);
            prop_assert_eq!(decision, Decision::StacklessIncompatible);
        }

        #[test]
        fn duplicate_iff_claimed_with_equal_stack(found in stack(), detected in stack(), in_set: bool) {
            let decision = decide(found.as_deref(), detected.as_deref(), in_set);
            prop_assert_eq!(
                decision == Decision::Duplicate,
                in_set && found == detected
            );
        }

        #[test]
        fn create_only_for_claimed_stackless_row(found in stack(), detected in stack(), in_set: bool) {
            let decision = decide(found.as_deref(), detected.as_deref(), in_set);
            prop_assert_eq!(
                decision == Decision::Create,
                in_set && found.is_none() && detected.is_some()
            );
        }
    }
}
