//! Layouts
//!
//! The five interaction structures. Grid ids are laid out row-major on a
//! `side x side` grid; every other layout numbers agents `0..n`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SimError};

/// Names of the supported layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// 2D grid, orthogonal neighbors
    #[default]
    Grid4,
    /// 2D grid, orthogonal and diagonal neighbors
    Grid8,
    Ring,
    /// Fully connected
    Mesh,
    /// Agent 0 is the hub
    Star,
}

impl LayoutKind {
    pub const ALL: [LayoutKind; 5] = [
        LayoutKind::Grid4,
        LayoutKind::Grid8,
        LayoutKind::Ring,
        LayoutKind::Mesh,
        LayoutKind::Star,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LayoutKind::Grid4 => "grid4",
            LayoutKind::Grid8 => "grid8",
            LayoutKind::Ring => "ring",
            LayoutKind::Mesh => "mesh",
            LayoutKind::Star => "star",
        }
    }

    pub fn is_grid(self) -> bool {
        matches!(self, LayoutKind::Grid4 | LayoutKind::Grid8)
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayoutKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.to_lowercase();
        LayoutKind::ALL
            .into_iter()
            .find(|kind| kind.name() == lowered)
            .ok_or_else(|| {
                SimError::InvalidConfig(format!(
                    "unknown layout type: {}. Available: grid4, grid8, ring, mesh, star",
                    s
                ))
            })
    }
}

/// A validated layout with its size parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    Grid4 { side: usize },
    Grid8 { side: usize },
    Ring { agents: usize },
    Mesh { agents: usize },
    Star { agents: usize },
}

impl Layout {
    pub fn grid4(side: usize) -> Result<Self> {
        require_side(side)?;
        Ok(Layout::Grid4 { side })
    }

    pub fn grid8(side: usize) -> Result<Self> {
        require_side(side)?;
        Ok(Layout::Grid8 { side })
    }

    pub fn ring(agents: usize) -> Result<Self> {
        require_agents(agents)?;
        Ok(Layout::Ring { agents })
    }

    pub fn mesh(agents: usize) -> Result<Self> {
        require_agents(agents)?;
        Ok(Layout::Mesh { agents })
    }

    pub fn star(agents: usize) -> Result<Self> {
        if agents < 2 {
            return Err(SimError::InvalidConfig(format!(
                "star layout requires at least 2 agents, got {}",
                agents
            )));
        }
        Ok(Layout::Star { agents })
    }

    /// Builds a layout by kind. Grid kinds take `grid_size`, the rest `agents`.
    pub fn new(kind: LayoutKind, agents: usize, grid_size: usize) -> Result<Self> {
        match kind {
            LayoutKind::Grid4 => Self::grid4(grid_size),
            LayoutKind::Grid8 => Self::grid8(grid_size),
            LayoutKind::Ring => Self::ring(agents),
            LayoutKind::Mesh => Self::mesh(agents),
            LayoutKind::Star => Self::star(agents),
        }
    }

    /// Builds a layout from an agent count alone.
    ///
    /// Grid kinds need a perfect square.
    pub fn from_agent_count(kind: LayoutKind, agents: usize) -> Result<Self> {
        if !kind.is_grid() {
            return Self::new(kind, agents, 0);
        }
        let side = integer_sqrt(agents);
        if side * side != agents {
            return Err(SimError::InvalidConfig(format!(
                "{} layout needs a square agent count, got {}",
                kind, agents
            )));
        }
        Self::new(kind, agents, side)
    }

    pub fn kind(&self) -> LayoutKind {
        match self {
            Layout::Grid4 { .. } => LayoutKind::Grid4,
            Layout::Grid8 { .. } => LayoutKind::Grid8,
            Layout::Ring { .. } => LayoutKind::Ring,
            Layout::Mesh { .. } => LayoutKind::Mesh,
            Layout::Star { .. } => LayoutKind::Star,
        }
    }

    pub fn agent_count(&self) -> usize {
        match *self {
            Layout::Grid4 { side } | Layout::Grid8 { side } => side * side,
            Layout::Ring { agents } | Layout::Mesh { agents } | Layout::Star { agents } => agents,
        }
    }

    /// Side length for grid layouts.
    pub fn grid_side(&self) -> Option<usize> {
        match *self {
            Layout::Grid4 { side } | Layout::Grid8 { side } => Some(side),
            _ => None,
        }
    }

    /// Neighbor ids of `agent_id`, in a fixed order.
    pub fn neighbors(&self, agent_id: usize) -> Result<Vec<usize>> {
        self.check(agent_id)?;
        let neighbors = match *self {
            Layout::Grid4 { side } => {
                grid_neighbors(side, agent_id, &[(-1, 0), (1, 0), (0, -1), (0, 1)])
            }
            Layout::Grid8 { side } => grid_neighbors(
                side,
                agent_id,
                &[
                    (-1, -1),
                    (-1, 0),
                    (-1, 1),
                    (0, -1),
                    (0, 1),
                    (1, -1),
                    (1, 0),
                    (1, 1),
                ],
            ),
            Layout::Ring { agents } => {
                let prev = (agent_id + agents - 1) % agents;
                let next = (agent_id + 1) % agents;
                let mut ids = vec![prev];
                if next != prev {
                    ids.push(next);
                }
                ids.retain(|&id| id != agent_id);
                ids
            }
            Layout::Mesh { agents } => (0..agents).filter(|&id| id != agent_id).collect(),
            Layout::Star { agents } => {
                if agent_id == HUB {
                    (1..agents).collect()
                } else {
                    vec![HUB]
                }
            }
        };
        Ok(neighbors)
    }

    /// Descriptive label for an agent's position. Cosmetic only.
    pub fn position_label(&self, agent_id: usize) -> Result<String> {
        self.check(agent_id)?;
        let label = match *self {
            Layout::Grid4 { side } | Layout::Grid8 { side } => {
                format!("({}, {})", agent_id / side, agent_id % side)
            }
            Layout::Ring { .. } => format!("[ring pos {}]", agent_id),
            Layout::Mesh { .. } => format!("[mesh node {}]", agent_id),
            Layout::Star { .. } if agent_id == HUB => "[hub]".to_string(),
            Layout::Star { .. } => format!("[spoke {}]", agent_id),
        };
        Ok(label)
    }

    pub(crate) fn check(&self, agent_id: usize) -> Result<()> {
        let agent_count = self.agent_count();
        if agent_id >= agent_count {
            return Err(SimError::OutOfRange {
                agent_id,
                agent_count,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.grid_side() {
            Some(side) => write!(f, "{} {}x{}", self.kind(), side, side),
            None => write!(f, "{} ({} agents)", self.kind(), self.agent_count()),
        }
    }
}

/// Star hub id.
pub const HUB: usize = 0;

fn require_side(side: usize) -> Result<()> {
    if side == 0 {
        return Err(SimError::InvalidConfig(
            "grid size must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn require_agents(agents: usize) -> Result<()> {
    if agents == 0 {
        return Err(SimError::InvalidConfig(
            "agent count must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn grid_neighbors(side: usize, agent_id: usize, offsets: &[(isize, isize)]) -> Vec<usize> {
    let row = (agent_id / side) as isize;
    let col = (agent_id % side) as isize;
    let side = side as isize;

    offsets
        .iter()
        .map(|&(dr, dc)| (row + dr, col + dc))
        .filter(|&(r, c)| r >= 0 && r < side && c >= 0 && c < side)
        .map(|(r, c)| (r * side + c) as usize)
        .collect()
}

fn integer_sqrt(n: usize) -> usize {
    let mut root = (n as f64).sqrt() as usize;
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn set(ids: Vec<usize>) -> BTreeSet<usize> {
        ids.into_iter().collect()
    }

    fn all_layouts() -> Vec<Layout> {
        vec![
            Layout::grid4(1).unwrap(),
            Layout::grid4(3).unwrap(),
            Layout::grid4(5).unwrap(),
            Layout::grid8(3).unwrap(),
            Layout::grid8(4).unwrap(),
            Layout::ring(2).unwrap(),
            Layout::ring(6).unwrap(),
            Layout::mesh(4).unwrap(),
            Layout::mesh(7).unwrap(),
            Layout::star(2).unwrap(),
            Layout::star(5).unwrap(),
        ]
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        for layout in all_layouts() {
            let n = layout.agent_count();
            for a in 0..n {
                for b in layout.neighbors(a).unwrap() {
                    assert!(
                        layout.neighbors(b).unwrap().contains(&a),
                        "{}: {} -> {} has no reverse edge",
                        layout,
                        a,
                        b
                    );
                }
            }
        }
    }

    #[test]
    fn test_no_self_loops_or_duplicates() {
        for layout in all_layouts() {
            for a in 0..layout.agent_count() {
                let neighbors = layout.neighbors(a).unwrap();
                assert!(!neighbors.contains(&a), "{} has a self-loop at {}", layout, a);
                assert_eq!(set(neighbors.clone()).len(), neighbors.len());
            }
        }
    }

    #[test]
    fn test_grid4_counts_by_position() {
        let grid = Layout::grid4(3).unwrap();
        // Corners
        for id in [0, 2, 6, 8] {
            assert_eq!(grid.neighbors(id).unwrap().len(), 2);
        }
        // Edges
        for id in [1, 3, 5, 7] {
            assert_eq!(grid.neighbors(id).unwrap().len(), 3);
        }
        // Interior
        assert_eq!(set(grid.neighbors(4).unwrap()), set(vec![1, 3, 5, 7]));
    }

    #[test]
    fn test_grid8_counts_by_position() {
        let grid = Layout::grid8(3).unwrap();
        for id in [0, 2, 6, 8] {
            assert_eq!(grid.neighbors(id).unwrap().len(), 3);
        }
        for id in [1, 3, 5, 7] {
            assert_eq!(grid.neighbors(id).unwrap().len(), 5);
        }
        assert_eq!(grid.neighbors(4).unwrap().len(), 8);
        assert_eq!(set(grid.neighbors(0).unwrap()), set(vec![1, 3, 4]));
    }

    #[test]
    fn test_grid4_neighbor_order() {
        let grid = Layout::grid4(3).unwrap();
        // up, down, left, right
        assert_eq!(grid.neighbors(4).unwrap(), vec![1, 7, 3, 5]);
    }

    #[test]
    fn test_ring_neighbors() {
        let ring = Layout::ring(6).unwrap();
        assert_eq!(set(ring.neighbors(0).unwrap()), set(vec![1, 5]));
        assert_eq!(set(ring.neighbors(3).unwrap()), set(vec![2, 4]));
        for id in 0..6 {
            assert_eq!(ring.neighbors(id).unwrap().len(), 2);
        }
    }

    #[test]
    fn test_small_rings() {
        assert_eq!(Layout::ring(2).unwrap().neighbors(0).unwrap(), vec![1]);
        assert!(Layout::ring(1).unwrap().neighbors(0).unwrap().is_empty());
    }

    #[test]
    fn test_mesh_neighbors() {
        let mesh = Layout::mesh(4).unwrap();
        assert_eq!(set(mesh.neighbors(2).unwrap()), set(vec![0, 1, 3]));
    }

    #[test]
    fn test_star_neighbors() {
        let star = Layout::star(5).unwrap();
        assert_eq!(set(star.neighbors(0).unwrap()), set(vec![1, 2, 3, 4]));
        assert_eq!(star.neighbors(3).unwrap(), vec![0]);
    }

    #[test]
    fn test_star_requires_two_agents() {
        assert!(matches!(Layout::star(1), Err(SimError::InvalidConfig(_))));
        assert!(matches!(Layout::star(0), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_sizes_rejected() {
        assert!(Layout::grid4(0).is_err());
        assert!(Layout::grid8(0).is_err());
        assert!(Layout::ring(0).is_err());
        assert!(Layout::mesh(0).is_err());
    }

    #[test]
    fn test_out_of_range() {
        let ring = Layout::ring(6).unwrap();
        assert!(matches!(
            ring.neighbors(6),
            Err(SimError::OutOfRange {
                agent_id: 6,
                agent_count: 6
            })
        ));
        assert!(ring.position_label(10).is_err());
    }

    #[test]
    fn test_from_agent_count() {
        assert_eq!(
            Layout::from_agent_count(LayoutKind::Grid4, 16).unwrap(),
            Layout::Grid4 { side: 4 }
        );
        assert!(matches!(
            Layout::from_agent_count(LayoutKind::Grid8, 10),
            Err(SimError::InvalidConfig(_))
        ));
        assert_eq!(
            Layout::from_agent_count(LayoutKind::Ring, 10).unwrap(),
            Layout::Ring { agents: 10 }
        );
    }

    #[test]
    fn test_position_labels() {
        assert_eq!(Layout::grid4(3).unwrap().position_label(5).unwrap(), "(1, 2)");
        assert_eq!(Layout::ring(4).unwrap().position_label(2).unwrap(), "[ring pos 2]");
        assert_eq!(Layout::mesh(4).unwrap().position_label(3).unwrap(), "[mesh node 3]");
        let star = Layout::star(4).unwrap();
        assert_eq!(star.position_label(0).unwrap(), "[hub]");
        assert_eq!(star.position_label(2).unwrap(), "[spoke 2]");
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("GRID8".parse::<LayoutKind>().unwrap(), LayoutKind::Grid8);
        assert_eq!("star".parse::<LayoutKind>().unwrap(), LayoutKind::Star);
        let err = "hexagon".parse::<LayoutKind>().unwrap_err();
        assert!(err.to_string().contains("Available: grid4, grid8, ring, mesh, star"));
    }

    #[test]
    fn test_grid_agent_count_derives_from_side() {
        let grid = Layout::new(LayoutKind::Grid4, 100, 3).unwrap();
        assert_eq!(grid.agent_count(), 9);
        assert_eq!(grid.grid_side(), Some(3));
    }
}
