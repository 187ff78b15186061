//! Conversation Replay
//!
//! Picks one iteration out of a simulation log and plays its conversation
//! back as text, pausing between messages.

use std::io::{self, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use belief_events::{LogParseError, LogReader, ParsedLog, ReplayIteration, SECTION_RULE};

/// Pause between messages when none is given.
pub const DEFAULT_DELAY_SECS: f64 = 0.8;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("could not read log: {0}")]
    Parse(#[from] LogParseError),

    #[error("no conversations found in log file")]
    Empty,

    #[error("conversation {requested} not found (available: {first}-{last})")]
    NotFound { requested: u32, first: u32, last: u32 },

    #[error("invalid delay: {0}")]
    InvalidDelay(f64),

    #[error("output error: {0}")]
    Io(#[from] io::Error),
}

/// Parses `path` and returns the whole log.
pub fn load(path: &Path) -> Result<ParsedLog, ReplayError> {
    let log = LogReader::new(path).read_all()?;
    if log.iterations.is_empty() {
        return Err(ReplayError::Empty);
    }
    tracing::debug!(
        iterations = log.iterations.len(),
        skipped = log.skipped,
        complete = log.is_complete(),
        "log parsed"
    );
    Ok(log)
}

/// Looks up iteration `number`, reporting the available range when absent.
pub fn select(log: &ParsedLog, number: u32) -> Result<&ReplayIteration, ReplayError> {
    if let Some(iteration) = log.iteration(number) {
        return Ok(iteration);
    }
    match log.range() {
        Some((first, last)) => Err(ReplayError::NotFound {
            requested: number,
            first,
            last,
        }),
        None => Err(ReplayError::Empty),
    }
}

/// Converts a delay in seconds, rejecting negative and non-finite values.
pub fn delay_from_secs(secs: f64) -> Result<Duration, ReplayError> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(ReplayError::InvalidDelay(secs));
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Plays one iteration to `out`: header, every message with `delay` before
/// it, then the decision.
pub fn replay<W: Write>(
    out: &mut W,
    iteration: &ReplayIteration,
    delay: Duration,
) -> io::Result<()> {
    write_header(out, iteration)?;

    for entry in &iteration.transcript {
        out.flush()?;
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        writeln!(out, "[Round {}] {}:", entry.round, entry.speaker.label())?;
        writeln!(out, "{}\n", entry.text)?;
    }

    let decision = &iteration.decision;
    writeln!(out, "{}", SECTION_RULE)?;
    writeln!(out, "DECISION")?;
    writeln!(out, "{}", SECTION_RULE)?;
    writeln!(out, "Old belief: {}", decision.old_belief)?;
    writeln!(out, "New belief: {}", decision.new_belief)?;
    writeln!(out, "Change type: {}", decision.change.label())?;
    out.flush()
}

fn write_header<W: Write>(out: &mut W, iteration: &ReplayIteration) -> io::Result<()> {
    writeln!(
        out,
        "Replaying conversation {}/{}",
        iteration.iteration, iteration.total_iterations
    )?;
    for (role, agent) in [
        ("Persuader", &iteration.persuader),
        ("Defender", &iteration.defender),
    ] {
        writeln!(out, "  {}: Agent {} @ {}", role, agent.agent_id, agent.position)?;
        writeln!(out, "    {}", agent.belief)?;
    }
    writeln!(out, "  Messages: {}", iteration.transcript.len())?;
    writeln!(out, "{}\n", SECTION_RULE)
}
