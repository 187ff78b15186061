//! Log Reader
//!
//! Recovers iterations from a log produced by [`LogWriter`](crate::writer::LogWriter).
//! Parsing is line oriented: block boundaries are rule lines followed by a
//! known title, message boundaries are `[Round n] SPEAKER:` lines.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::record::{ChangeType, Decision, Participant, Speaker, TranscriptEntry};
use crate::writer::{ABORTED_TITLE, BLOCK_RULE, FINAL_BELIEFS_TITLE, SECTION_RULE, SUMMARY_TITLE};

/// Errors that can occur while reading a log.
#[derive(Debug, thiserror::Error)]
pub enum LogParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("iteration block is missing '{0}'")]
    MissingField(&'static str),
    #[error("invalid number in '{0}'")]
    InvalidNumber(String),
}

/// One iteration as recovered from the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayIteration {
    pub iteration: u32,
    pub total_iterations: u32,
    pub persuader: Participant,
    pub defender: Participant,
    pub transcript: Vec<TranscriptEntry>,
    pub decision: Decision,
}

/// Counters from the closing summary block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryCounts {
    pub total_iterations: u32,
    pub belief_changes: u32,
}

/// Everything recoverable from one log file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLog {
    /// Iterations keyed by their 1-based index
    pub iterations: BTreeMap<u32, ReplayIteration>,
    /// Present only when the run completed normally
    pub summary: Option<SummaryCounts>,
    /// Iteration blocks that could not be parsed
    pub skipped: usize,
}

impl ParsedLog {
    pub fn iteration(&self, number: u32) -> Option<&ReplayIteration> {
        self.iterations.get(&number)
    }

    /// Lowest and highest iteration numbers present.
    pub fn range(&self) -> Option<(u32, u32)> {
        let first = *self.iterations.keys().next()?;
        let last = *self.iterations.keys().next_back()?;
        Some((first, last))
    }

    /// Total iteration count announced in the iteration headers.
    pub fn announced_total(&self) -> Option<u32> {
        self.iterations.values().map(|it| it.total_iterations).max()
    }

    /// True when the log ends with an abort block instead of a summary.
    pub fn is_complete(&self) -> bool {
        self.summary.is_some()
    }
}

/// Reads simulation logs from disk.
#[derive(Debug)]
pub struct LogReader {
    path: PathBuf,
}

impl LogReader {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Parses the whole log.
    pub fn read_all(&self) -> Result<ParsedLog, LogParseError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(parse_log(&content))
    }

    /// Reads a single iteration (1-based).
    pub fn read_iteration(&self, number: u32) -> Result<Option<ReplayIteration>, LogParseError> {
        let mut log = self.read_all()?;
        Ok(log.iterations.remove(&number))
    }
}

/// Parses log text. Malformed iteration blocks are counted in
/// [`ParsedLog::skipped`] rather than failing the whole log.
pub fn parse_log(content: &str) -> ParsedLog {
    let lines: Vec<&str> = content.lines().collect();
    let mut log = ParsedLog::default();

    let starts: Vec<usize> = (0..lines.len())
        .filter(|&i| is_block_start(&lines, i))
        .collect();

    for (n, &start) in starts.iter().enumerate() {
        let end = starts.get(n + 1).copied().unwrap_or(lines.len());
        let title = lines[start + 1];

        if title.starts_with("ITERATION ") {
            match parse_iteration(&lines[start + 1..end]) {
                Ok(iteration) => {
                    log.iterations.insert(iteration.iteration, iteration);
                }
                Err(_) => log.skipped += 1,
            }
        } else if title == SUMMARY_TITLE {
            log.summary = parse_summary(&lines[start + 1..end]);
        }
    }

    log
}

fn is_block_start(lines: &[&str], i: usize) -> bool {
    if lines[i] != BLOCK_RULE {
        return false;
    }
    match lines.get(i + 1) {
        Some(title) => {
            title.starts_with("ITERATION ")
                || *title == FINAL_BELIEFS_TITLE
                || *title == SUMMARY_TITLE
                || *title == ABORTED_TITLE
        }
        None => false,
    }
}

/// Walks the lines of one block.
struct Cursor<'a> {
    lines: &'a [&'a str],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(lines: &'a [&'a str]) -> Self {
        Self { lines, pos: 0 }
    }

    /// Advances to the first line with `prefix` and returns the rest of it.
    fn seek_prefix(&mut self, prefix: &str) -> Option<&'a str> {
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            self.pos += 1;
            if let Some(rest) = line.strip_prefix(prefix) {
                return Some(rest);
            }
        }
        None
    }

    /// Advances past the line equal to `title` preceded by a section rule.
    fn seek_section(&mut self, title: &str) -> bool {
        while self.pos < self.lines.len() {
            if self.at_section(title) {
                self.pos += 2;
                return true;
            }
            self.pos += 1;
        }
        false
    }

    fn at_section(&self, title: &str) -> bool {
        self.lines.get(self.pos) == Some(&SECTION_RULE)
            && self.lines.get(self.pos + 1) == Some(&title)
    }

    /// Collects `first` plus following lines until `stop` matches, trimmed.
    fn take_text(&mut self, first: &str, stop: impl Fn(&Self) -> bool) -> String {
        let mut text = String::from(first);
        while self.pos < self.lines.len() && !stop(&*self) {
            text.push('\n');
            text.push_str(self.lines[self.pos]);
            self.pos += 1;
        }
        text.trim().to_string()
    }

    fn current(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }
}

fn parse_number(s: &str) -> Result<u32, LogParseError> {
    s.trim()
        .parse()
        .map_err(|_| LogParseError::InvalidNumber(s.to_string()))
}

fn parse_agent_line(rest: &str) -> Result<(usize, String), LogParseError> {
    let (id, position) = rest
        .split_once(" @ ")
        .ok_or(LogParseError::MissingField("Agent <id> @ <position>"))?;
    let id = id
        .trim()
        .parse()
        .map_err(|_| LogParseError::InvalidNumber(id.to_string()))?;
    Ok((id, position.to_string()))
}

/// Parses `[Round n] SPEAKER:` message headers.
fn parse_round_header(line: &str) -> Option<(u32, Speaker)> {
    let rest = line.strip_prefix("[Round ")?;
    let (round, speaker) = rest.split_once("] ")?;
    let speaker = match speaker.strip_suffix(':')? {
        "PERSUADER" => Speaker::Persuader,
        "DEFENDER" => Speaker::Defender,
        _ => return None,
    };
    Some((round.parse().ok()?, speaker))
}

fn parse_iteration(lines: &[&str]) -> Result<ReplayIteration, LogParseError> {
    let mut cursor = Cursor::new(lines);

    let header = cursor
        .seek_prefix("ITERATION ")
        .ok_or(LogParseError::MissingField("ITERATION"))?;
    let (current, total) = header
        .split_once('/')
        .ok_or_else(|| LogParseError::InvalidNumber(header.to_string()))?;
    let iteration = parse_number(current)?;
    let total_iterations = parse_number(total)?;

    let persuader_line = cursor
        .seek_prefix("PERSUADER: Agent ")
        .ok_or(LogParseError::MissingField("PERSUADER"))?;
    let (persuader_id, persuader_position) = parse_agent_line(persuader_line)?;
    let first = cursor
        .seek_prefix("Belief: ")
        .ok_or(LogParseError::MissingField("Belief"))?;
    let persuader_belief = cursor.take_text(first, |c| {
        c.current()
            .is_some_and(|line| line.starts_with("DEFENDER: Agent "))
    });

    let defender_line = cursor
        .seek_prefix("DEFENDER: Agent ")
        .ok_or(LogParseError::MissingField("DEFENDER"))?;
    let (defender_id, defender_position) = parse_agent_line(defender_line)?;
    let first = cursor
        .seek_prefix("Belief: ")
        .ok_or(LogParseError::MissingField("Belief"))?;
    let defender_belief = cursor.take_text(first, |c| c.current() == Some(SECTION_RULE));

    let mut transcript = Vec::new();
    if cursor.seek_section("CONVERSATION") {
        // Skip the closing rule of the section header.
        if cursor.current() == Some(SECTION_RULE) {
            cursor.pos += 1;
        }
        while let Some(line) = cursor.current() {
            if cursor.at_section("DECISION") {
                break;
            }
            cursor.pos += 1;
            if let Some((round, speaker)) = parse_round_header(line) {
                let text = cursor.take_text("", |c| {
                    c.at_section("DECISION")
                        || c.current().and_then(parse_round_header).is_some()
                });
                transcript.push(TranscriptEntry::new(round, speaker, text));
            }
        }
    }

    let decision = if cursor.seek_section("DECISION") {
        let first = cursor
            .seek_prefix("Old belief: ")
            .ok_or(LogParseError::MissingField("Old belief"))?;
        let old_belief = cursor.take_text(first, |c| {
            c.current().is_some_and(|line| line.starts_with("New belief: "))
        });
        let first = cursor
            .seek_prefix("New belief: ")
            .ok_or(LogParseError::MissingField("New belief"))?;
        let new_belief = cursor.take_text(first, |c| {
            c.current()
                .is_some_and(|line| line.starts_with("Change type: "))
        });
        let change = cursor
            .seek_prefix("Change type: ")
            .ok_or(LogParseError::MissingField("Change type"))?
            .trim()
            .parse::<ChangeType>()
            .map_err(|_| LogParseError::MissingField("Change type"))?;
        Decision {
            old_belief,
            new_belief,
            change,
        }
    } else {
        // Interrupted before a decision was recorded.
        Decision {
            old_belief: defender_belief.clone(),
            new_belief: defender_belief.clone(),
            change: ChangeType::Unchanged,
        }
    };

    Ok(ReplayIteration {
        iteration,
        total_iterations,
        persuader: Participant::new(persuader_id, persuader_position, persuader_belief),
        defender: Participant::new(defender_id, defender_position, defender_belief),
        transcript,
        decision,
    })
}

fn parse_summary(lines: &[&str]) -> Option<SummaryCounts> {
    let mut cursor = Cursor::new(lines);
    let total_iterations = parse_number(cursor.seek_prefix("Total iterations: ")?).ok()?;
    let belief_changes = parse_number(cursor.seek_prefix("Belief changes detected: ")?).ok()?;
    Some(SummaryCounts {
        total_iterations,
        belief_changes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{IterationRecord, Pairing};
    use crate::writer::LogWriter;
    use chrono::Local;

    fn record(iteration: u32, transcript: Vec<TranscriptEntry>) -> IterationRecord {
        IterationRecord {
            iteration,
            total_iterations: 3,
            started_at: Local::now(),
            pairing: Pairing {
                initiator: 2,
                neighbor: 5,
                initiator_persuades: true,
            },
            persuader: Participant::new(2, "(0, 2)", "I save aggressively for freedom."),
            defender: Participant::new(5, "(1, 2)", "I spend on experiences."),
            transcript,
            decision: Decision {
                old_belief: "I spend on experiences.".to_string(),
                new_belief: "I spend on experiences, but save a little.".to_string(),
                change: ChangeType::Similar,
            },
        }
    }

    fn written(records: &[IterationRecord], summary: bool) -> String {
        let mut writer = LogWriter::new(Vec::new());
        writer.write_header(&Local::now()).unwrap();
        writer
            .write_starting_beliefs(&[crate::AgentState {
                agent_id: 0,
                position: "(0, 0)".to_string(),
                belief: "I budget.".to_string(),
            }])
            .unwrap();
        for r in records {
            writer.write_iteration(r).unwrap();
        }
        if summary {
            writer.write_final_beliefs(&[]).unwrap();
            writer.write_summary(&Local::now(), 3, 1).unwrap();
        } else {
            writer.write_aborted(&Local::now(), 3, "backend unavailable").unwrap();
        }
        String::from_utf8(writer.get_ref().clone()).unwrap()
    }

    #[test]
    fn test_round_trip_iteration() {
        let transcript = vec![
            TranscriptEntry::new(1, Speaker::Persuader, "Saving gives you options."),
            TranscriptEntry::new(1, Speaker::Defender, "Memories last longer.\n\nAnd they compound too."),
            TranscriptEntry::new(2, Speaker::Persuader, "Options create memories."),
            TranscriptEntry::new(2, Speaker::Defender, "Fair point."),
        ];
        let original = record(1, transcript.clone());
        let log = parse_log(&written(&[original.clone()], true));

        let parsed = log.iteration(1).unwrap();
        assert_eq!(parsed.total_iterations, 3);
        assert_eq!(parsed.persuader, original.persuader);
        assert_eq!(parsed.defender, original.defender);
        assert_eq!(parsed.transcript, transcript);
        assert_eq!(parsed.decision, original.decision);
        assert_eq!(log.skipped, 0);
    }

    #[test]
    fn test_multiple_iterations_and_summary() {
        let records = vec![
            record(1, vec![TranscriptEntry::new(1, Speaker::Persuader, "One.")]),
            record(2, vec![]),
            record(3, vec![TranscriptEntry::new(1, Speaker::Defender, "Three.")]),
        ];
        let log = parse_log(&written(&records, true));

        assert_eq!(log.iterations.len(), 3);
        assert_eq!(log.range(), Some((1, 3)));
        assert_eq!(log.announced_total(), Some(3));
        assert!(log.iteration(2).unwrap().transcript.is_empty());
        assert_eq!(
            log.summary,
            Some(SummaryCounts {
                total_iterations: 3,
                belief_changes: 1
            })
        );
        assert!(log.is_complete());
    }

    #[test]
    fn test_aborted_log_keeps_iterations() {
        let records = vec![record(1, vec![]), record(2, vec![])];
        let log = parse_log(&written(&records, false));

        assert_eq!(log.iterations.len(), 2);
        assert!(!log.is_complete());
    }

    #[test]
    fn test_missing_decision_defaults_to_unchanged() {
        let text = format!(
            "{rule}\nITERATION 4/10\nTime: x\n{rule}\n\n\
             PERSUADER: Agent 1 @ [hub]\nBelief: I invest.\n\n\
             DEFENDER: Agent 3 @ [spoke 3]\nBelief: I hoard cash.\n\n\
             {dash}\nCONVERSATION\n{dash}\n\n\
             [Round 1] PERSUADER:\nInvesting wins.\n\n",
            rule = BLOCK_RULE,
            dash = SECTION_RULE,
        );
        let log = parse_log(&text);
        let parsed = log.iteration(4).unwrap();

        assert_eq!(parsed.transcript.len(), 1);
        assert_eq!(parsed.decision.change, ChangeType::Unchanged);
        assert_eq!(parsed.decision.new_belief, "I hoard cash.");
        assert_eq!(parsed.defender.position, "[spoke 3]");
    }

    #[test]
    fn test_malformed_block_is_skipped() {
        let text = format!("{rule}\nITERATION 1/2\nTime: x\n{rule}\n\nnothing here\n", rule = BLOCK_RULE);
        let log = parse_log(&text);
        assert!(log.iterations.is_empty());
        assert_eq!(log.skipped, 1);
    }

    #[test]
    fn test_round_header_parsing() {
        assert_eq!(
            parse_round_header("[Round 12] DEFENDER:"),
            Some((12, Speaker::Defender))
        );
        assert_eq!(parse_round_header("[Round x] DEFENDER:"), None);
        assert_eq!(parse_round_header("[Round 1] MODERATOR:"), None);
        assert_eq!(parse_round_header("Round 1 PERSUADER"), None);
    }

    #[test]
    fn test_reader_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        fs::write(&path, written(&[record(1, vec![])], true)).unwrap();

        let reader = LogReader::new(&path);
        assert!(reader.read_iteration(1).unwrap().is_some());
        assert!(reader.read_iteration(9).unwrap().is_none());
    }
}
