//! Run Summary
//!
//! Machine-readable digest of a finished (or aborted) run, written next to
//! the text log as JSON.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use uuid::Uuid;

use belief_events::{ChangeType, RunSettings};

use crate::catalog::BeliefCatalog;
use crate::error::Result;
use crate::topology::Topology;

/// Iteration counts per change type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeTally {
    pub unchanged: u32,
    pub similar: u32,
    pub changed: u32,
}

impl ChangeTally {
    pub fn record(&mut self, change: ChangeType) {
        match change {
            ChangeType::Unchanged => self.unchanged += 1,
            ChangeType::Similar => self.similar += 1,
            ChangeType::Changed => self.changed += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.unchanged + self.similar + self.changed
    }
}

/// One agent's belief at the end of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalBelief {
    pub agent_id: usize,
    pub position: String,
    pub belief: String,
    /// True while the belief is still verbatim one of the seed beliefs
    pub original: bool,
    pub catalog_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub layout: String,
    pub agents: usize,
    pub seed: Option<u64>,
    pub backend: String,
    pub total_iterations: u32,
    pub completed_iterations: u32,
    pub belief_changes: u32,
    /// Percentage of completed iterations classified as changed
    pub change_rate: f64,
    pub outcomes: ChangeTally,
    pub final_beliefs: Vec<FinalBelief>,
}

impl RunSummary {
    pub fn new(
        run_id: Uuid,
        settings: &RunSettings,
        completed_iterations: u32,
        belief_changes: u32,
        outcomes: ChangeTally,
        topology: &Topology,
        catalog: &BeliefCatalog,
    ) -> Self {
        let change_rate = if completed_iterations == 0 {
            0.0
        } else {
            f64::from(belief_changes) / f64::from(completed_iterations) * 100.0
        };

        let final_beliefs = topology
            .snapshot()
            .into_iter()
            .map(|agent| {
                let catalog_index = catalog.index_of(&agent.belief);
                FinalBelief {
                    agent_id: agent.agent_id,
                    position: agent.position,
                    belief: agent.belief,
                    original: catalog_index.is_some(),
                    catalog_index,
                }
            })
            .collect();

        Self {
            run_id,
            layout: settings.layout.clone(),
            agents: settings.agents,
            seed: settings.seed,
            backend: settings.model.clone(),
            total_iterations: settings.iterations,
            completed_iterations,
            belief_changes,
            change_rate,
            outcomes,
            final_beliefs,
        }
    }

    /// Number of agents whose belief is no longer a seed belief.
    pub fn drifted_agents(&self) -> usize {
        self.final_beliefs
            .iter()
            .filter(|b| !b.original)
            .count()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| io::Error::from(e).into())
    }

    /// Writes the summary as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self).map_err(io::Error::from)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
