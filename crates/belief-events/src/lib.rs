//! Shared record types and the persisted log format for the belief simulation.
//!
//! This crate contains pure data structures and the text log codec, with no
//! simulation logic. The engine writes logs through [`LogWriter`]; the replay
//! tool reads them back through [`LogReader`].

pub mod reader;
pub mod record;
pub mod writer;

pub use record::{
    AgentState, ChangeType, Decision, IterationRecord, Pairing, Participant, Speaker,
    TranscriptEntry, UnknownLabel,
};

pub use reader::{parse_log, LogParseError, LogReader, ParsedLog, ReplayIteration, SummaryCounts};

pub use writer::{
    format_timestamp, log_file_name, LogWriter, RunSettings, ABORTED_TITLE, BLOCK_RULE,
    FINAL_BELIEFS_TITLE, LOG_TITLE, SECTION_RULE, SUMMARY_TITLE,
};
