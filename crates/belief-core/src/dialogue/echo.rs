//! Offline collaborator that never changes anyone's mind.
//!
//! Used for dry runs and tests: both sides restate their beliefs and the
//! defender keeps its belief verbatim.

use belief_events::{Speaker, TranscriptEntry};

use super::{Conversation, ConversationCollaborator};
use crate::error::CollaboratorError;

/// Backend identifier recorded for echo runs.
pub const ECHO_BACKEND_ID: &str = "echo (offline)";

#[derive(Debug, Default, Clone)]
pub struct EchoCollaborator {
    conversations: u64,
}

impl EchoCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of conversations held so far.
    pub fn conversations(&self) -> u64 {
        self.conversations
    }
}

impl ConversationCollaborator for EchoCollaborator {
    fn converse(
        &mut self,
        persuader_belief: &str,
        defender_belief: &str,
        rounds: u32,
        on_message: &mut dyn FnMut(&TranscriptEntry),
    ) -> Result<Conversation, CollaboratorError> {
        let mut transcript = Vec::with_capacity(rounds as usize * 2);
        for round in 1..=rounds {
            for (speaker, belief) in [
                (Speaker::Persuader, persuader_belief),
                (Speaker::Defender, defender_belief),
            ] {
                let entry = TranscriptEntry::new(round, speaker, belief);
                on_message(&entry);
                transcript.push(entry);
            }
        }

        self.conversations += 1;
        Ok(Conversation {
            transcript,
            new_belief: defender_belief.to_string(),
        })
    }

    fn backend_id(&self) -> &str {
        ECHO_BACKEND_ID
    }
}
