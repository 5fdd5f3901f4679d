use serde::{Deserialize, Serialize};
use bpi_types::InstallAction;

use super::FailureContext;

/// Buildpack install events, emitted by the planner, the executor and the job wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InstallEvent {
    /// A plan was produced for one candidate artifact
    Planned {
        name: String,
        action: InstallAction,
        filename: String,
        detected_stack: Option<String>,
    },

    /// Execution of a plan started
    Started {
        name: String,
        action: InstallAction,
    },

    /// A bare row was created under the buildpacks lock
    Created {
        name: String,
        guid: String,
    },

    /// The artifact was attached to the row
    Uploaded {
        name: String,
        guid: String,
        filename: String,
        stack: Option<String>,
        /// False when the stored artifact already had the same checksum
        changed: bool,
    },

    /// A freshly created row was removed after a failed upload
    RolledBack {
        name: String,
        guid: String,
    },

    /// Install finished and options were applied
    Completed {
        name: String,
        guid: String,
        created: bool,
    },

    /// The matching buildpack is locked and was left untouched
    Skipped {
        name: String,
        guid: String,
        reason: String,
    },

    Failed {
        name: String,
        failure: FailureContext,
    },
}
