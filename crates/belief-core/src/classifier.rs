//! Change Classifier
//!
//! Cheap textual proxy for "rephrased vs. substantively changed".

use belief_events::ChangeType;

/// Number of leading characters compared for the `Similar` outcome.
pub const SIMILAR_PREFIX_CHARS: usize = 20;

/// Classifies how a defender's belief moved.
///
/// 1. Equal after trimming and lowercasing: `Unchanged`.
/// 2. Equal first 20 characters of the *untrimmed* strings, lowercased: `Similar`.
/// 3. Otherwise `Changed`.
///
/// Step 2 deliberately works on the untrimmed text, so leading whitespace
/// in one belief can turn a rephrasing into `Changed`. Replayed logs depend on
/// this exact behavior.
pub fn classify(old_belief: &str, new_belief: &str) -> ChangeType {
    if normalize(old_belief) == normalize(new_belief) {
        ChangeType::Unchanged
    } else if prefix(new_belief) == prefix(old_belief) {
        ChangeType::Similar
    } else {
        ChangeType::Changed
    }
}

fn normalize(belief: &str) -> String {
    belief.to_lowercase().trim().to_string()
}

fn prefix(belief: &str) -> String {
    belief
        .chars()
        .take(SIMILAR_PREFIX_CHARS)
        .collect::<String>()
        .to_lowercase()
}
