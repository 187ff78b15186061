//! Iteration Records
//!
//! One record per persuader/defender interaction. Records are built by the
//! engine, handed to the log writer, then dropped.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which side of a conversation produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Persuader,
    Defender,
}

impl Speaker {
    /// Upper-case label used in the persisted log.
    pub fn label(self) -> &'static str {
        match self {
            Speaker::Persuader => "PERSUADER",
            Speaker::Defender => "DEFENDER",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Persuader => write!(f, "persuader"),
            Speaker::Defender => write!(f, "defender"),
        }
    }
}

impl FromStr for Speaker {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "persuader" => Ok(Speaker::Persuader),
            "defender" => Ok(Speaker::Defender),
            _ => Err(UnknownLabel(s.to_string())),
        }
    }
}

/// How far the defender's belief moved during one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Unchanged,
    Similar,
    Changed,
}

impl ChangeType {
    /// Upper-case label used in the persisted log.
    pub fn label(self) -> &'static str {
        match self {
            ChangeType::Unchanged => "UNCHANGED",
            ChangeType::Similar => "SIMILAR",
            ChangeType::Changed => "CHANGED",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Unchanged => write!(f, "unchanged"),
            ChangeType::Similar => write!(f, "similar"),
            ChangeType::Changed => write!(f, "changed"),
        }
    }
}

impl FromStr for ChangeType {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unchanged" => Ok(ChangeType::Unchanged),
            "similar" => Ok(ChangeType::Similar),
            "changed" => Ok(ChangeType::Changed),
            _ => Err(UnknownLabel(s.to_string())),
        }
    }
}

/// A label that is not a known speaker or change type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown label: '{0}'")]
pub struct UnknownLabel(pub String);

/// One message of a conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// 1-based round number
    pub round: u32,
    pub speaker: Speaker,
    pub text: String,
}

impl TranscriptEntry {
    pub fn new(round: u32, speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            round,
            speaker,
            text: text.into(),
        }
    }
}

/// An agent taking part in an iteration, as it was when the iteration began.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub agent_id: usize,
    pub position: String,
    pub belief: String,
}

impl Participant {
    pub fn new(agent_id: usize, position: impl Into<String>, belief: impl Into<String>) -> Self {
        Self {
            agent_id,
            position: position.into(),
            belief: belief.into(),
        }
    }
}

/// The defender's decision at the end of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub old_belief: String,
    pub new_belief: String,
    pub change: ChangeType,
}

/// The random draws that produced an iteration's pairing.
///
/// `initiator` is the uniformly drawn agent, `neighbor` the neighbor drawn
/// from its neighborhood. When `initiator_persuades` is false the roles are
/// reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pairing {
    pub initiator: usize,
    pub neighbor: usize,
    pub initiator_persuades: bool,
}

impl Pairing {
    /// Returns `(persuader, defender)`.
    pub fn roles(&self) -> (usize, usize) {
        if self.initiator_persuades {
            (self.initiator, self.neighbor)
        } else {
            (self.neighbor, self.initiator)
        }
    }
}

/// A fully populated iteration, ready to be appended to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 1-based iteration index
    pub iteration: u32,
    pub total_iterations: u32,
    pub started_at: DateTime<Local>,
    pub pairing: Pairing,
    pub persuader: Participant,
    pub defender: Participant,
    pub transcript: Vec<TranscriptEntry>,
    pub decision: Decision,
}

/// Final state of one agent, written at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    pub agent_id: usize,
    pub position: String,
    pub belief: String,
}
