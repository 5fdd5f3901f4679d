use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Storage events for named locks and buildpack rows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StateEvent {
    LockAcquired {
        lock: String,
        waited: Duration,
    },

    LockReleased {
        lock: String,
    },

    BuildpackInserted {
        guid: String,
        name: String,
    },

    BuildpackDeleted {
        guid: String,
        name: String,
    },
}
