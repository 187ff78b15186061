//! Dialogue
//!
//! The conversation collaborator contract and the driver that turns a chat
//! backend into persuader/defender exchanges.
//!
//! The engine only sees [`ConversationCollaborator`]. [`Dialogue`] implements
//! it on top of any [`ChatBackend`], and [`OllamaBackend`] is the production
//! backend.

pub mod echo;
pub mod ollama;

pub use echo::EchoCollaborator;
pub use ollama::OllamaBackend;

use belief_events::{Speaker, TranscriptEntry};
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;

/// First user turn given to the persuader.
pub const OPENING_REQUEST: &str =
    "Start the conversation by presenting your belief and why the other person should adopt it.";

/// Final user turn given to the defender.
pub const DECISION_REQUEST: &str = "Based on this conversation, decide if you want to update your belief or keep it. \
Output ONLY your final belief as a single statement starting with 'I'. Nothing else.\
Keep it short and core.";

/// Placeholder belief used when logging the prompt templates.
pub const PROMPT_PLACEHOLDER: &str = "...";

/// System prompt for the persuader.
pub fn persuader_prompt(belief: &str) -> String {
    format!(
        "This is your belief: \"{}\". You are the persuader. Try to convince the other person of your belief. Be concise.",
        belief
    )
}

/// System prompt for the defender.
pub fn defender_prompt(belief: &str) -> String {
    format!(
        "This is your belief: \"{}\". You are the defender. Listen to the other person and critically analyze their arguments based on your belief. Be concise.",
        belief
    )
}

/// Result of one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    /// Messages in the order they were streamed
    pub transcript: Vec<TranscriptEntry>,
    /// The defender's final belief; not part of the transcript
    pub new_belief: String,
}

/// Produces a conversation between two beliefs.
///
/// Implementations call `on_message` once per message, in order, before
/// returning, and return the same messages in the transcript.
pub trait ConversationCollaborator {
    fn converse(
        &mut self,
        persuader_belief: &str,
        defender_belief: &str,
        rounds: u32,
        on_message: &mut dyn FnMut(&TranscriptEntry),
    ) -> Result<Conversation, CollaboratorError>;

    /// Identifier of the backend, recorded in the run configuration.
    fn backend_id(&self) -> &str;

    /// The persuader and defender prompt templates, for the log.
    fn system_prompts(&self) -> (String, String) {
        (
            persuader_prompt(PROMPT_PLACEHOLDER),
            defender_prompt(PROMPT_PLACEHOLDER),
        )
    }
}

/// Chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One entry in a chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A text generator: given a chat history, returns the next reply.
pub trait ChatBackend {
    fn chat(&mut self, messages: &[ChatMessage]) -> Result<String, CollaboratorError>;

    /// Model name.
    fn model(&self) -> &str;
}

/// Runs persuader/defender exchanges against a [`ChatBackend`].
///
/// Each side keeps its own history: its own messages are `assistant` turns,
/// the other side's are `user` turns.
#[derive(Debug)]
pub struct Dialogue<B> {
    backend: B,
}

impl<B: ChatBackend> Dialogue<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: ChatBackend> ConversationCollaborator for Dialogue<B> {
    fn converse(
        &mut self,
        persuader_belief: &str,
        defender_belief: &str,
        rounds: u32,
        on_message: &mut dyn FnMut(&TranscriptEntry),
    ) -> Result<Conversation, CollaboratorError> {
        let mut persuader_history = vec![
            ChatMessage::system(persuader_prompt(persuader_belief)),
            ChatMessage::user(OPENING_REQUEST),
        ];
        let mut defender_history = vec![ChatMessage::system(defender_prompt(defender_belief))];
        let mut transcript = Vec::with_capacity(rounds as usize * 2);

        for round in 1..=rounds {
            let argument = self.backend.chat(&persuader_history)?;
            let entry = TranscriptEntry::new(round, Speaker::Persuader, argument.clone());
            on_message(&entry);
            transcript.push(entry);
            persuader_history.push(ChatMessage::assistant(argument.clone()));
            defender_history.push(ChatMessage::user(argument));

            let reply = self.backend.chat(&defender_history)?;
            let entry = TranscriptEntry::new(round, Speaker::Defender, reply.clone());
            on_message(&entry);
            transcript.push(entry);
            defender_history.push(ChatMessage::assistant(reply.clone()));
            persuader_history.push(ChatMessage::user(reply));
        }

        defender_history.push(ChatMessage::user(DECISION_REQUEST));
        let new_belief = self.backend.chat(&defender_history)?.trim().to_string();
        if new_belief.is_empty() {
            return Err(CollaboratorError::Malformed(
                "defender returned an empty decision".to_string(),
            ));
        }

        Ok(Conversation {
            transcript,
            new_belief,
        })
    }

    fn backend_id(&self) -> &str {
        self.backend.model()
    }
}
