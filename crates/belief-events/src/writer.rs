//! Log Writer
//!
//! Append-only, human-readable simulation log. The layout is a contract with
//! [`LogReader`](crate::reader::LogReader): labels, rule lines and blank lines
//! must stay exactly as written here.

use chrono::{DateTime, Local};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::record::{AgentState, IterationRecord};

/// Rule line framing top-level blocks.
pub const BLOCK_RULE: &str = "================================================================================";

/// Rule line framing sub-sections.
pub const SECTION_RULE: &str = "----------------------------------------";

/// Title line of the log header.
pub const LOG_TITLE: &str = "AGENTIC BELIEF PROPAGATION SIMULATION LOG";

pub const FINAL_BELIEFS_TITLE: &str = "FINAL GRID BELIEFS";
pub const SUMMARY_TITLE: &str = "SIMULATION SUMMARY";
pub const ABORTED_TITLE: &str = "SIMULATION ABORTED";

/// Formats a timestamp the way the log has always carried them
/// (`2026-01-03T00:12:56.123456`).
pub fn format_timestamp(ts: &DateTime<Local>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// File name used for a log started at `ts`.
pub fn log_file_name(ts: &DateTime<Local>) -> String {
    format!("simulation_{}.log", ts.format("%Y%m%d_%H%M%S"))
}

/// Run parameters echoed into the configuration block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Layout name, e.g. "grid4"
    pub layout: String,
    /// Side length for grid layouts
    pub grid_side: Option<usize>,
    pub agents: usize,
    pub rounds: u32,
    pub iterations: u32,
    /// Conversation backend identifier (model name)
    pub model: String,
    /// `None` for a non-reproducible run
    pub seed: Option<u64>,
}

/// Writes a simulation log block by block, flushing after every block so a
/// crashed or aborted run keeps everything recorded so far.
#[derive(Debug)]
pub struct LogWriter<W: Write> {
    out: W,
    path: Option<PathBuf>,
    iterations_written: u32,
}

impl LogWriter<BufWriter<File>> {
    /// Creates `simulation_<timestamp>.log` inside `log_dir` and writes the header.
    ///
    /// The directory is created if it doesn't exist.
    pub fn create(log_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(log_dir)?;
        let now = Local::now();
        let path = log_dir.join(log_file_name(&now));
        let file = File::create(&path)?;

        let mut writer = Self::new(BufWriter::new(file));
        writer.path = Some(path);
        writer.write_header(&now)?;
        Ok(writer)
    }
}

impl<W: Write> LogWriter<W> {
    /// Wraps an arbitrary sink. No header is written.
    pub fn new(out: W) -> Self {
        Self {
            out,
            path: None,
            iterations_written: 0,
        }
    }

    /// Path of the log file, if the writer owns one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Number of iteration blocks written so far.
    pub fn iterations_written(&self) -> u32 {
        self.iterations_written
    }

    pub fn write_header(&mut self, started: &DateTime<Local>) -> io::Result<()> {
        writeln!(self.out, "{}", BLOCK_RULE)?;
        writeln!(self.out, "{}", LOG_TITLE)?;
        writeln!(self.out, "Started: {}", format_timestamp(started))?;
        writeln!(self.out, "{}", BLOCK_RULE)?;
        writeln!(self.out)?;
        self.flush()
    }

    pub fn write_config(&mut self, settings: &RunSettings) -> io::Result<()> {
        writeln!(self.out, "CONFIGURATION")?;
        writeln!(self.out, "{}", SECTION_RULE)?;
        writeln!(self.out, "Layout: {}", settings.layout)?;
        match settings.grid_side {
            Some(side) => writeln!(
                self.out,
                "Grid size: {}x{} ({} agents)",
                side, side, settings.agents
            )?,
            None => writeln!(self.out, "Agents: {}", settings.agents)?,
        }
        writeln!(self.out, "Conversation rounds: {}", settings.rounds)?;
        writeln!(self.out, "Simulation iterations: {}", settings.iterations)?;
        writeln!(self.out, "Model: {}", settings.model)?;
        match settings.seed {
            Some(seed) => writeln!(self.out, "Random seed: {}", seed)?,
            None => writeln!(self.out, "Random seed: None (non-reproducible)")?,
        }
        writeln!(self.out)?;
        self.flush()
    }

    pub fn write_catalog(&mut self, beliefs: &[String]) -> io::Result<()> {
        writeln!(self.out, "AVAILABLE BELIEFS")?;
        writeln!(self.out, "{}", SECTION_RULE)?;
        for (i, belief) in beliefs.iter().enumerate() {
            writeln!(self.out, "[{}] {}", i, belief)?;
        }
        writeln!(self.out)?;
        self.flush()
    }

    pub fn write_system_prompts(&mut self, persuader: &str, defender: &str) -> io::Result<()> {
        writeln!(self.out, "SYSTEM PROMPTS")?;
        writeln!(self.out, "{}", SECTION_RULE)?;
        writeln!(self.out, "PERSUADER PROMPT:")?;
        writeln!(self.out, "{}\n", persuader)?;
        writeln!(self.out, "DEFENDER PROMPT:")?;
        writeln!(self.out, "{}\n", defender)?;
        writeln!(self.out, "{}\n", SECTION_RULE)?;
        self.flush()
    }

    pub fn write_starting_beliefs(&mut self, agents: &[AgentState]) -> io::Result<()> {
        writeln!(self.out, "STARTING GRID BELIEFS")?;
        writeln!(self.out, "{}", SECTION_RULE)?;
        self.write_agent_states(agents)?;
        writeln!(self.out)?;
        self.flush()
    }

    /// Appends one complete iteration block.
    pub fn write_iteration(&mut self, record: &IterationRecord) -> io::Result<()> {
        writeln!(self.out, "{}", BLOCK_RULE)?;
        writeln!(
            self.out,
            "ITERATION {}/{}",
            record.iteration, record.total_iterations
        )?;
        writeln!(self.out, "Time: {}", format_timestamp(&record.started_at))?;
        writeln!(self.out, "{}\n", BLOCK_RULE)?;

        writeln!(
            self.out,
            "PERSUADER: Agent {} @ {}",
            record.persuader.agent_id, record.persuader.position
        )?;
        writeln!(self.out, "Belief: {}\n", record.persuader.belief)?;

        writeln!(
            self.out,
            "DEFENDER: Agent {} @ {}",
            record.defender.agent_id, record.defender.position
        )?;
        writeln!(self.out, "Belief: {}\n", record.defender.belief)?;

        writeln!(self.out, "{}", SECTION_RULE)?;
        writeln!(self.out, "CONVERSATION")?;
        writeln!(self.out, "{}\n", SECTION_RULE)?;

        for entry in &record.transcript {
            writeln!(self.out, "[Round {}] {}:", entry.round, entry.speaker.label())?;
            writeln!(self.out, "{}\n", entry.text)?;
        }

        writeln!(self.out, "{}", SECTION_RULE)?;
        writeln!(self.out, "DECISION")?;
        writeln!(self.out, "{}", SECTION_RULE)?;
        writeln!(self.out, "Old belief: {}\n", record.decision.old_belief)?;
        writeln!(self.out, "New belief: {}\n", record.decision.new_belief)?;
        writeln!(self.out, "Change type: {}\n", record.decision.change.label())?;

        self.iterations_written += 1;
        self.flush()
    }

    pub fn write_final_beliefs(&mut self, agents: &[AgentState]) -> io::Result<()> {
        writeln!(self.out, "{}", BLOCK_RULE)?;
        writeln!(self.out, "{}", FINAL_BELIEFS_TITLE)?;
        writeln!(self.out, "{}\n", BLOCK_RULE)?;
        self.write_agent_states(agents)?;
        self.flush()
    }

    pub fn write_summary(
        &mut self,
        completed: &DateTime<Local>,
        total_iterations: u32,
        belief_changes: u32,
    ) -> io::Result<()> {
        let rate = if total_iterations == 0 {
            0.0
        } else {
            f64::from(belief_changes) / f64::from(total_iterations) * 100.0
        };

        writeln!(self.out, "{}", BLOCK_RULE)?;
        writeln!(self.out, "{}", SUMMARY_TITLE)?;
        writeln!(self.out, "{}", BLOCK_RULE)?;
        writeln!(self.out, "Completed: {}", format_timestamp(completed))?;
        writeln!(self.out, "Total iterations: {}", total_iterations)?;
        writeln!(self.out, "Belief changes detected: {}", belief_changes)?;
        writeln!(self.out, "Change rate: {:.1}%", rate)?;
        self.flush()
    }

    /// Marks the run as aborted. Written instead of the summary block.
    pub fn write_aborted(
        &mut self,
        at: &DateTime<Local>,
        iteration: u32,
        reason: &str,
    ) -> io::Result<()> {
        writeln!(self.out, "{}", BLOCK_RULE)?;
        writeln!(self.out, "{}", ABORTED_TITLE)?;
        writeln!(self.out, "{}", BLOCK_RULE)?;
        writeln!(self.out, "Aborted: {}", format_timestamp(at))?;
        writeln!(self.out, "Failed iteration: {}", iteration)?;
        writeln!(self.out, "Completed iterations: {}", self.iterations_written)?;
        writeln!(self.out, "Error: {}", reason)?;
        self.flush()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn write_agent_states(&mut self, agents: &[AgentState]) -> io::Result<()> {
        for agent in agents {
            writeln!(self.out, "Agent {} @ {}:", agent.agent_id, agent.position)?;
            writeln!(self.out, "  {}\n", agent.belief)?;
        }
        Ok(())
    }
}

impl<W: Write> Drop for LogWriter<W> {
    fn drop(&mut self) {
        if let Err(e) = self.out.flush() {
            eprintln!("Warning: Failed to flush simulation log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ChangeType, Decision, Pairing, Participant, Speaker, TranscriptEntry};
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 3, 0, 12, 56).unwrap()
    }

    fn as_text(writer: &LogWriter<Vec<u8>>) -> String {
        String::from_utf8(writer.get_ref().clone()).unwrap()
    }

    fn sample_record() -> IterationRecord {
        IterationRecord {
            iteration: 2,
            total_iterations: 5,
            started_at: fixed_time(),
            pairing: Pairing {
                initiator: 1,
                neighbor: 0,
                initiator_persuades: false,
            },
            persuader: Participant::new(0, "[ring pos 0]", "I save money."),
            defender: Participant::new(1, "[ring pos 1]", "I spend money."),
            transcript: vec![
                TranscriptEntry::new(1, Speaker::Persuader, "Saving buys freedom."),
                TranscriptEntry::new(1, Speaker::Defender, "Spending buys joy."),
            ],
            decision: Decision {
                old_belief: "I spend money.".to_string(),
                new_belief: "I save some money.".to_string(),
                change: ChangeType::Changed,
            },
        }
    }

    #[test]
    fn test_iteration_block_layout() {
        let mut writer = LogWriter::new(Vec::new());
        writer.write_iteration(&sample_record()).unwrap();

        let expected = format!(
            "{rule}\nITERATION 2/5\nTime: 2026-01-03T00:12:56.000000\n{rule}\n\n\
             PERSUADER: Agent 0 @ [ring pos 0]\nBelief: I save money.\n\n\
             DEFENDER: Agent 1 @ [ring pos 1]\nBelief: I spend money.\n\n\
             {dash}\nCONVERSATION\n{dash}\n\n\
             [Round 1] PERSUADER:\nSaving buys freedom.\n\n\
             [Round 1] DEFENDER:\nSpending buys joy.\n\n\
             {dash}\nDECISION\n{dash}\n\
             Old belief: I spend money.\n\n\
             New belief: I save some money.\n\n\
             Change type: CHANGED\n\n",
            rule = BLOCK_RULE,
            dash = SECTION_RULE,
        );
        assert_eq!(as_text(&writer), expected);
        assert_eq!(writer.iterations_written(), 1);
    }

    #[test]
    fn test_config_block() {
        let mut writer = LogWriter::new(Vec::new());
        writer
            .write_config(&RunSettings {
                layout: "grid4".to_string(),
                grid_side: Some(3),
                agents: 9,
                rounds: 5,
                iterations: 40,
                model: "gemma3".to_string(),
                seed: None,
            })
            .unwrap();

        let text = as_text(&writer);
        assert!(text.starts_with("CONFIGURATION\n"));
        assert!(text.contains("Grid size: 3x3 (9 agents)\n"));
        assert!(text.contains("Conversation rounds: 5\n"));
        assert!(text.contains("Random seed: None (non-reproducible)\n"));
    }

    #[test]
    fn test_summary_change_rate() {
        let mut writer = LogWriter::new(Vec::new());
        writer.write_summary(&fixed_time(), 40, 7).unwrap();
        let text = as_text(&writer);
        assert!(text.contains("Total iterations: 40\n"));
        assert!(text.contains("Belief changes detected: 7\n"));
        assert!(text.ends_with("Change rate: 17.5%\n"));

        let mut empty = LogWriter::new(Vec::new());
        empty.write_summary(&fixed_time(), 0, 0).unwrap();
        assert!(as_text(&empty).ends_with("Change rate: 0.0%\n"));
    }

    #[test]
    fn test_agent_state_block() {
        let mut writer = LogWriter::new(Vec::new());
        writer
            .write_final_beliefs(&[AgentState {
                agent_id: 4,
                position: "(1, 1)".to_string(),
                belief: "I invest.".to_string(),
            }])
            .unwrap();
        assert!(as_text(&writer).ends_with("Agent 4 @ (1, 1):\n  I invest.\n\n"));
    }

    #[test]
    fn test_create_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let writer = LogWriter::create(&dir.path().join("logs")).unwrap();
            writer.path().unwrap().to_path_buf()
        };

        let content = fs::read_to_string(&path).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("simulation_") && name.ends_with(".log"));
        assert!(content.starts_with(&format!("{}\n{}\nStarted: ", BLOCK_RULE, LOG_TITLE)));
    }
}
