//! Console rendering of the population.

use crate::catalog::BeliefCatalog;
use crate::topology::Topology;

/// Compact belief map: each cell shows the agent's catalog index, or `*` once
/// the belief has drifted from every seed belief.
///
/// Grid layouts render as `side` rows; the others as a single row in id order.
pub fn belief_map(topology: &Topology, catalog: &BeliefCatalog) -> String {
    let cells: Vec<String> = topology
        .beliefs()
        .iter()
        .map(|belief| match catalog.index_of(belief) {
            Some(index) => format!(" {} ", index),
            None => " * ".to_string(),
        })
        .collect();

    let width = topology
        .layout()
        .grid_side()
        .unwrap_or(cells.len())
        .max(1);
    let rule = "-".repeat(width * 4 + 1);

    let mut out = String::new();
    out.push_str(&rule);
    out.push('\n');
    for row in cells.chunks(width) {
        out.push('|');
        out.push_str(&row.join("|"));
        out.push_str("|\n");
        out.push_str(&rule);
        out.push('\n');
    }
    out
}

/// One line per agent with its position label and full belief text.
pub fn belief_listing(topology: &Topology) -> String {
    topology
        .snapshot()
        .iter()
        .map(|agent| format!("  Agent {} {}: {}\n", agent.agent_id, agent.position, agent.belief))
        .collect()
}
