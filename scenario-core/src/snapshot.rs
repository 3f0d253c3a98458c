use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fate-state occupancy across all cells at a recorded step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The demo-loop step at which the snapshot was taken.
    pub step: u32,
    /// The total number of cells in the scenario.
    pub cell_count: u32,
    /// State name -> number of cells whose death driver currently sits
    /// in that state. Cells without a death driver are not counted.
    pub state_occupancy: BTreeMap<String, u32>,
}
