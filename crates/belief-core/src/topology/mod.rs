//! Topology
//!
//! A layout plus per-agent belief storage. `set_belief` is the only way
//! belief state changes after initialization.

pub mod layout;

pub use layout::{Layout, LayoutKind, HUB};

use belief_events::AgentState;

use crate::error::{Result, SimError};
use crate::rng::SimRng;

/// The interaction network and the current belief of every agent.
#[derive(Debug, Clone)]
pub struct Topology {
    layout: Layout,
    beliefs: Vec<String>,
}

impl Topology {
    /// Creates an uninitialized topology. Call [`Topology::initialize`] before
    /// reading beliefs.
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            beliefs: Vec::new(),
        }
    }

    /// Assigns every agent a belief sampled uniformly, with replacement, from
    /// `beliefs`. Draws one value per agent in id order.
    pub fn initialize(&mut self, beliefs: &[String], rng: &mut SimRng) -> Result<&[String]> {
        if beliefs.is_empty() {
            return Err(SimError::InvalidConfig(
                "cannot initialize agents from an empty belief list".to_string(),
            ));
        }

        self.beliefs = (0..self.layout.agent_count())
            .map(|_| beliefs[rng.index(beliefs.len())].clone())
            .collect();
        Ok(&self.beliefs)
    }

    pub fn is_initialized(&self) -> bool {
        !self.beliefs.is_empty()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn agent_count(&self) -> usize {
        self.layout.agent_count()
    }

    pub fn neighbors(&self, agent_id: usize) -> Result<Vec<usize>> {
        self.layout.neighbors(agent_id)
    }

    pub fn position_label(&self, agent_id: usize) -> Result<String> {
        self.layout.position_label(agent_id)
    }

    pub fn belief(&self, agent_id: usize) -> Result<&str> {
        self.layout.check(agent_id)?;
        self.beliefs
            .get(agent_id)
            .map(String::as_str)
            .ok_or_else(not_initialized)
    }

    pub fn set_belief(&mut self, agent_id: usize, belief: impl Into<String>) -> Result<()> {
        self.layout.check(agent_id)?;
        let slot = self.beliefs.get_mut(agent_id).ok_or_else(not_initialized)?;
        *slot = belief.into();
        Ok(())
    }

    /// All current beliefs, indexed by agent id.
    pub fn beliefs(&self) -> &[String] {
        &self.beliefs
    }

    /// Point-in-time copy of every agent, for logging and presentation.
    pub fn snapshot(&self) -> Vec<AgentState> {
        self.beliefs
            .iter()
            .enumerate()
            .map(|(agent_id, belief)| AgentState {
                agent_id,
                position: self.layout.position_label(agent_id).unwrap_or_default(),
                belief: belief.clone(),
            })
            .collect()
    }

    /// Every undirected edge once, as `(lower id, higher id)`.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        (0..self.agent_count())
            .flat_map(|a| {
                self.layout
                    .neighbors(a)
                    .unwrap_or_default()
                    .into_iter()
                    .filter(move |&b| a < b)
                    .map(move |b| (a, b))
            })
            .collect()
    }

    /// Connectivity report: one line per agent with its label and neighbors.
    pub fn describe(&self) -> String {
        let mut out = format!("Layout: {}\nAgents: {}\n", self.layout, self.agent_count());
        out.push_str(&"-".repeat(40));
        out.push('\n');
        for id in 0..self.agent_count() {
            let label = self.layout.position_label(id).unwrap_or_default();
            let neighbors = self.layout.neighbors(id).unwrap_or_default();
            out.push_str(&format!("Agent {} {}: neighbors = {:?}\n", id, label, neighbors));
        }
        out
    }
}

fn not_initialized() -> SimError {
    SimError::InvalidConfig("topology has not been initialized".to_string())
}
