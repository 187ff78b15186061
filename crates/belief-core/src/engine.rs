//! Simulation Engine
//!
//! Drives a run: pair selection, conversation, classification, belief update
//! and logging, strictly one iteration at a time.
//!
//! Random draws per iteration, in this order, all from the run's [`SimRng`]:
//! 1. initiator id, uniform over all agents
//! 2. neighbor, uniform over the initiator's neighbors
//! 3. one coin: heads means the initiator persuades
//!
//! Identical seeds therefore give identical pairings across runs.

use chrono::Local;
use std::io::Write;
use tracing::{debug, info, warn};
use uuid::Uuid;

use belief_events::{
    ChangeType, Decision, IterationRecord, LogWriter, Pairing, Participant, RunSettings,
    TranscriptEntry,
};

use crate::catalog::BeliefCatalog;
use crate::classifier::classify;
use crate::config::SimConfig;
use crate::dialogue::ConversationCollaborator;
use crate::error::{Result, SimError};
use crate::rng::SimRng;
use crate::summary::{ChangeTally, RunSummary};
use crate::topology::{Layout, Topology};

/// Hooks for presentation layers. All methods default to no-ops.
///
/// Called synchronously from the engine; the topology passed to
/// `on_iteration_end` is a consistent snapshot between iterations.
pub trait RunObserver {
    fn on_iteration_start(&mut self, _iteration: u32, _persuader: &Participant, _defender: &Participant) {}

    fn on_message(&mut self, _entry: &TranscriptEntry) {}

    fn on_iteration_end(&mut self, _record: &IterationRecord, _topology: &Topology) {}
}

impl RunObserver for () {}

/// Run parameters that stay fixed for the engine's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParams {
    pub rounds: u32,
    pub iterations: u32,
}

/// Owns all mutable run state: topology, random source and counters.
pub struct SimulationEngine<C> {
    run_id: Uuid,
    topology: Topology,
    catalog: BeliefCatalog,
    rng: SimRng,
    collaborator: C,
    params: RunParams,
    /// Completed iterations
    iteration: u32,
    change_count: u32,
    tally: ChangeTally,
}

impl<C: ConversationCollaborator> SimulationEngine<C> {
    /// Builds the layout from `config`, seeds the random source and assigns
    /// starting beliefs.
    pub fn new(config: &SimConfig, catalog: BeliefCatalog, collaborator: C) -> Result<Self> {
        config.validate()?;
        let layout = config.build_layout()?;
        let params = RunParams {
            rounds: config.rounds,
            iterations: config.iterations,
        };
        Self::with_layout(
            layout,
            catalog,
            params,
            SimRng::from_seed_option(config.seed),
            collaborator,
        )
    }

    pub fn with_layout(
        layout: Layout,
        catalog: BeliefCatalog,
        params: RunParams,
        mut rng: SimRng,
        collaborator: C,
    ) -> Result<Self> {
        let mut topology = Topology::new(layout);
        topology.initialize(catalog.beliefs(), &mut rng)?;

        Ok(Self {
            run_id: Uuid::new_v4(),
            topology,
            catalog,
            rng,
            collaborator,
            params,
            iteration: 0,
            change_count: 0,
            tally: ChangeTally::default(),
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn catalog(&self) -> &BeliefCatalog {
        &self.catalog
    }

    pub fn collaborator(&self) -> &C {
        &self.collaborator
    }

    pub fn params(&self) -> RunParams {
        self.params
    }

    pub fn seed(&self) -> Option<u64> {
        self.rng.seed()
    }

    /// Number of completed iterations.
    pub fn iterations_completed(&self) -> u32 {
        self.iteration
    }

    /// Iterations classified as `Changed` so far.
    pub fn change_count(&self) -> u32 {
        self.change_count
    }

    pub fn is_finished(&self) -> bool {
        self.iteration >= self.params.iterations
    }

    /// Run settings as echoed into the log's configuration block.
    pub fn settings(&self) -> RunSettings {
        let layout = self.topology.layout();
        RunSettings {
            layout: layout.kind().to_string(),
            grid_side: layout.grid_side(),
            agents: layout.agent_count(),
            rounds: self.params.rounds,
            iterations: self.params.iterations,
            model: self.collaborator.backend_id().to_string(),
            seed: self.rng.seed(),
        }
    }

    /// Draws the next initiator, neighbor and role assignment.
    pub fn select_pair(&mut self) -> Result<Pairing> {
        let initiator = self.rng.index(self.topology.agent_count());
        let neighbors = self.topology.neighbors(initiator)?;
        let neighbor = *self
            .rng
            .choose(&neighbors)
            .ok_or(SimError::EmptyNeighborhood {
                agent_id: initiator,
            })?;
        let initiator_persuades = self.rng.coin();

        Ok(Pairing {
            initiator,
            neighbor,
            initiator_persuades,
        })
    }

    /// Runs one full iteration and returns its record.
    ///
    /// If the conversation fails nothing is applied and the error is returned.
    pub fn step(&mut self, observer: &mut dyn RunObserver) -> Result<IterationRecord> {
        if self.is_finished() {
            return Err(SimError::InvalidConfig(format!(
                "all {} iterations have already run",
                self.params.iterations
            )));
        }

        let number = self.iteration + 1;
        let started_at = Local::now();
        let pairing = self.select_pair()?;
        let (persuader_id, defender_id) = pairing.roles();
        let persuader = self.participant(persuader_id)?;
        let defender = self.participant(defender_id)?;

        debug!(
            iteration = number,
            persuader = persuader_id,
            defender = defender_id,
            "pair selected"
        );
        observer.on_iteration_start(number, &persuader, &defender);

        let conversation = self.collaborator.converse(
            &persuader.belief,
            &defender.belief,
            self.params.rounds,
            &mut |entry| {
                debug!(round = entry.round, speaker = %entry.speaker, "message");
                observer.on_message(entry);
            },
        )?;

        let change = classify(&defender.belief, &conversation.new_belief);
        self.topology
            .set_belief(defender_id, conversation.new_belief.clone())?;
        if change == ChangeType::Changed {
            self.change_count += 1;
        }
        self.tally.record(change);
        self.iteration = number;

        debug!(iteration = number, change = %change, "decision applied");

        let record = IterationRecord {
            iteration: number,
            total_iterations: self.params.iterations,
            started_at,
            pairing,
            decision: Decision {
                old_belief: defender.belief.clone(),
                new_belief: conversation.new_belief,
                change,
            },
            persuader,
            defender,
            transcript: conversation.transcript,
        };
        observer.on_iteration_end(&record, &self.topology);
        Ok(record)
    }

    /// Writes the configuration, catalog, prompt and starting-belief blocks.
    pub fn write_preamble<W: Write>(&self, log: &mut LogWriter<W>) -> Result<()> {
        let (persuader_prompt, defender_prompt) = self.collaborator.system_prompts();
        log.write_config(&self.settings())?;
        log.write_catalog(self.catalog.beliefs())?;
        log.write_system_prompts(&persuader_prompt, &defender_prompt)?;
        log.write_starting_beliefs(&self.topology.snapshot())?;
        Ok(())
    }

    /// Drives the remaining iterations, appending each to `log`.
    ///
    /// On a conversation failure an abort block is written in place of the
    /// summary and the error is returned; iterations already written stay.
    pub fn run<W: Write>(
        &mut self,
        log: &mut LogWriter<W>,
        observer: &mut dyn RunObserver,
    ) -> Result<RunSummary> {
        if self.iteration == 0 {
            self.write_preamble(log)?;
        }

        info!(
            run_id = %self.run_id,
            layout = %self.topology.layout(),
            iterations = self.params.iterations,
            rounds = self.params.rounds,
            "simulation started"
        );

        while !self.is_finished() {
            match self.step(observer) {
                Ok(record) => log.write_iteration(&record)?,
                Err(e) => {
                    warn!(iteration = self.iteration + 1, error = %e, "simulation aborted");
                    if let Err(log_err) =
                        log.write_aborted(&Local::now(), self.iteration + 1, &e.to_string())
                    {
                        warn!("could not record abort: {}", log_err);
                    }
                    return Err(e);
                }
            }
        }

        log.write_final_beliefs(&self.topology.snapshot())?;
        log.write_summary(&Local::now(), self.iteration, self.change_count)?;

        info!(
            iterations = self.iteration,
            changes = self.change_count,
            "simulation complete"
        );
        Ok(self.summary())
    }

    /// Summary of the run so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary::new(
            self.run_id,
            &self.settings(),
            self.iteration,
            self.change_count,
            self.tally,
            &self.topology,
            &self.catalog,
        )
    }

    fn participant(&self, agent_id: usize) -> Result<Participant> {
        Ok(Participant::new(
            agent_id,
            self.topology.position_label(agent_id)?,
            self.topology.belief(agent_id)?,
        ))
    }
}
