use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::num::NonZero;

use itertools::Itertools;
use ndarray::Array2;
use petgraph::graphmap::UnGraphMap;
use thiserror::Error;

use crate::affiliation::{default_display, AffiliationID};
use crate::cell::{Cell, CellDescriptor, CellID};
use crate::location::Location;

/// Reasons a set of [`CellDescriptor`]s cannot form a [`Board`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum InvalidGraph {
    /// A neighbor index points past the end of the cell list.
    #[error("cell {cell} lists neighbor {neighbor}, which does not exist")]
    NeighborOutOfRange { cell: CellID, neighbor: CellID },
    /// A cell lists itself as its own neighbor.
    #[error("cell {cell} lists itself as a neighbor")]
    SelfLoop { cell: CellID },
    /// A cell lists the same neighbor twice.
    #[error("cell {cell} lists neighbor {neighbor} more than once")]
    DuplicateNeighbor { cell: CellID, neighbor: CellID },
    /// Adjacency is one-sided.
    #[error("cell {cell} lists neighbor {neighbor}, but not the other way around")]
    Asymmetric { cell: CellID, neighbor: CellID },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Direction {
    // follow next
    Forward,
    // follow prev
    Backward,
}

/// Walks a chain from `start`, yielding `start` first, then following `next` or `prev` links until they run out.
pub(crate) struct Chain<'b> {
    board: &'b Board,
    start: CellID,
    current: Option<CellID>,
    direction: Direction,
}

impl Iterator for Chain<'_> {
    type Item = CellID;

    fn next(&mut self) -> Option<Self::Item> {
        let here = self.current?;
        let cell = &self.board.cells[here];
        let following = match self.direction {
            Direction::Forward => cell.next,
            Direction::Backward => cell.prev,
        };
        // a chain that comes back around to where it started is a loop; stop rather than spin
        self.current = following.filter(|id| *id != self.start);
        Some(here)
    }
}

/// A flow from a source terminus, in traversal order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlowPath {
    /// Color of the flow.
    pub affiliation: AffiliationID,
    /// Cells visited, starting with the source.
    pub cells: Vec<CellID>,
}

impl FlowPath {
    /// Positions of the cells on this path, e.g. for replaying it as a drag from the first to the last.
    pub fn locations(&self, board: &Board) -> Vec<Location> {
        self.cells.iter().map(|id| board.cells[*id].location).collect_vec()
    }

    /// Whether the path runs all the way to a sink of its own color.
    pub fn is_complete(&self, board: &Board) -> bool {
        self.cells.last()
            .map(|id| &board.cells[*id])
            .is_some_and(|cell| cell.is_sink() && cell.affiliation == self.affiliation)
    }
}

/// A puzzle as a fixed set of cells with static adjacency, plus whatever connections have been made between them.
///
/// Build one directly from [`CellDescriptor`]s with [`Board::new`], from a graph with [`Board::from_graph`],
/// or for rectangular puzzles through a [`Builder`](crate::builder::Builder).
/// Then call [`solve()`](Board::solve).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Board {
    pub(crate) cells: Vec<Cell>,
    // affiliations missing here print with `default_display`
    pub(crate) affiliation_displays: HashMap<AffiliationID, char>,
}

impl Board {
    /// Validate `descriptors` and build a board from them. Cell IDs are positions in `descriptors`,
    /// and that order is the order the solver visits cells in.
    pub fn new(descriptors: Vec<CellDescriptor>) -> Result<Self, InvalidGraph> {
        Self::check_adjacency(&descriptors)?;

        Ok(Self {
            cells: descriptors.into_iter().map(Cell::from).collect_vec(),
            affiliation_displays: HashMap::new(),
        })
    }

    /// Build a board from an undirected graph of locations.
    ///
    /// Cells are ordered row by row, top to bottom; each cell's neighbors keep the graph's adjacency order.
    /// Locations present in `termini` become termini of the given color.
    pub fn from_graph<E>(
        graph: &UnGraphMap<Location, E>,
        termini: &HashMap<Location, NonZero<AffiliationID>>,
    ) -> Result<Self, InvalidGraph> {
        let locations = graph.nodes()
            .sorted_by_key(Location::as_index)
            .collect_vec();
        let ids: HashMap<Location, CellID> = locations.iter()
            .enumerate()
            .map(|(id, location)| (*location, id))
            .collect();

        Self::new(locations.iter()
            .map(|location| CellDescriptor {
                affiliation: termini.get(location).copied(),
                location: *location,
                neighbors: graph.neighbors(*location).map(|other| ids[&other]).collect_vec(),
            })
            .collect_vec())
    }

    fn check_adjacency(descriptors: &[CellDescriptor]) -> Result<(), InvalidGraph> {
        for (cell, desc) in descriptors.iter().enumerate() {
            let mut seen = HashSet::with_capacity(desc.neighbors.len());
            for &neighbor in &desc.neighbors {
                if neighbor >= descriptors.len() {
                    return Err(InvalidGraph::NeighborOutOfRange { cell, neighbor });
                }
                if neighbor == cell {
                    return Err(InvalidGraph::SelfLoop { cell });
                }
                if !seen.insert(neighbor) {
                    return Err(InvalidGraph::DuplicateNeighbor { cell, neighbor });
                }
                if !descriptors[neighbor].neighbors.contains(&cell) {
                    return Err(InvalidGraph::Asymmetric { cell, neighbor });
                }
            }
        }

        Ok(())
    }

    /// Replace the characters used to print each affiliation.
    pub(crate) fn with_displays(mut self, affiliation_displays: HashMap<AffiliationID, char>) -> Self {
        self.affiliation_displays = affiliation_displays;
        self
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if there are no cells at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells, in the order the solver visits them.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// The cell with index `id`.
    ///
    /// # Panics
    /// If `id` is out of range.
    #[inline]
    pub fn cell(&self, id: CellID) -> &Cell {
        &self.cells[id]
    }

    /// Static neighbors of cell `id`.
    #[inline]
    pub fn neighbors(&self, id: CellID) -> &[CellID] {
        &self.cells[id].neighbors
    }

    pub(crate) fn chain(&self, start: CellID, direction: Direction) -> Chain<'_> {
        Chain {
            board: self,
            start,
            current: Some(start),
            direction,
        }
    }

    /// The last cell reached by walking from `start` in `direction`.
    pub(crate) fn chain_end(&self, start: CellID, direction: Direction) -> CellID {
        self.chain(start, direction).last().unwrap_or(start)
    }

    /// One [`FlowPath`] per source terminus, in cell order, following `next` from the source as far as it goes.
    ///
    /// On a solved board every path ends at the sink of its color.
    pub fn paths(&self) -> Vec<FlowPath> {
        self.cells.iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_source())
            .map(|(id, cell)| FlowPath {
                affiliation: cell.affiliation,
                cells: self.chain(id, Direction::Forward).collect_vec(),
            })
            .collect_vec()
    }

    fn display_of(&self, cell: &Cell) -> char {
        let display = self.affiliation_displays.get(&cell.affiliation)
            .copied()
            .unwrap_or_else(|| default_display(cell.affiliation));

        if cell.is_terminus() {
            display.to_ascii_uppercase()
        } else {
            display.to_ascii_lowercase()
        }
    }
}

fn print(board: Array2<char>) -> String {
    let mut out = String::with_capacity(board.nrows() * (board.ncols() + 1));

    for row in board.rows() {
        for col in row {
            out.push(*col);
        }
        out.push('\n');
    }

    out
}

/// Lays cells out by [`Location`], one character per grid position.
/// Termini print uppercase, colored path cells lowercase, and neutral cells and unused positions as `.`.
///
/// The grid spans every position up to the largest [`Location`], so this is meant for boards in grid coordinates.
/// Fails with [`std::fmt::Error`] if that grid has more positions than can be addressed.
impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (width, height) = self.cells.iter()
            .fold((0usize, 0usize), |(w, h), cell| {
                (w.max(cell.location.0.saturating_add(1)), h.max(cell.location.1.saturating_add(1)))
            });
        if width.checked_mul(height).filter(|area| *area <= isize::MAX as usize).is_none() {
            return Err(std::fmt::Error);
        }

        let mut grid = Array2::from_elem((height, width), '.');
        for cell in &self.cells {
            if !cell.is_neutral() {
                grid[cell.location.as_index()] = self.display_of(cell);
            }
        }

        write!(f, "{}", print(grid))
    }
}
