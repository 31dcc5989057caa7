//! Mission types.
//!
//! A [`Mission`] is one Double XP mission as shown to users. Missions are
//! built by the filter step from raw endpoint records and never mutated
//! afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single mission carrying the target mutator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    /// Biome the mission takes place in.
    pub biome: String,

    /// Mission code name, e.g. "Hidden Lode".
    pub code_name: String,

    /// Cave complexity rating.
    pub complexity: String,

    /// Mission length rating.
    pub length: String,

    /// Primary objective.
    pub primary_objective: String,

    /// Secondary objective.
    pub secondary_objective: String,

    /// Warnings (possibly empty).
    #[serde(default)]
    pub warnings: Vec<String>,

    /// Mutator name.
    pub mutator: String,

    /// Season markers the mission belongs to.
    #[serde(default)]
    pub included_in: BTreeSet<String>,
}

impl Mission {
    /// Returns true if the mission belongs to the given season.
    pub fn in_season(&self, season: &str) -> bool {
        self.included_in.contains(season)
    }

    /// Returns true if the mission has any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Missions returned for one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionBatch {
    /// Missions in payload order (biome order, then record order).
    pub missions: Vec<Mission>,

    /// Start of the current window, or start of the next one.
    pub timestamp: DateTime<Utc>,
}

impl MissionBatch {
    /// Creates a batch.
    pub fn new(missions: Vec<Mission>, timestamp: DateTime<Utc>) -> Self {
        Self {
            missions,
            timestamp,
        }
    }

    /// Returns true if no mission matched.
    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
    }

    /// Number of missions in the batch.
    pub fn len(&self) -> usize {
        self.missions.len()
    }
}
