use std::collections::hash_map::Entry;
use std::collections::HashMap;

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, trace};

use crate::affiliation::AffiliationID;
use crate::board::{Board, Direction};
use crate::cell::{CellID, CellKind};

/// Reasons a solve may fail.
///
/// None of these are exceptional: an unsolvable puzzle is an ordinary outcome, and [`Board::solve`] folds them all into `false`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum SolverFailure {
    /// More than two termini share a color.
    #[error("more than two termini have affiliation {affiliation}")]
    TooManyTermini { affiliation: AffiliationID },
    /// Only one terminus has this color, so its flow has nowhere to go.
    #[error("only one terminus has affiliation {affiliation}")]
    UnpairedTerminus { affiliation: AffiliationID },
    /// This cell has too few neighbors to ever be part of a flow.
    #[error("cell {cell} has too few neighbors to be part of any flow")]
    Orphaned { cell: CellID },
    /// Every branch of the search was tried and none covered the board.
    #[error("no assignment of flows covers the board")]
    Exhausted,
    /// The search was abandoned after the number of steps allowed by [`SolverOptions::step_limit`].
    #[error("gave up after {limit} steps")]
    StepLimitReached { limit: u64 },
}

/// Knobs for a single solve.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SolverOptions {
    /// Abandon the search after this many steps, where a step is one visit to a cell. `None` means no limit.
    pub step_limit: Option<u64>,
}

impl SolverOptions {
    /// Set [`step_limit`](Self::step_limit).
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }
}

/// Counters from a finished search.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SolveStats {
    /// Cells visited, counting revisits after backtracking.
    pub steps: u64,
    /// Tentative connections that were undone.
    pub backtracks: u64,
}

/// Source and sink of each color, in the order they were first seen.
#[derive(Debug, Default)]
pub(crate) struct Termini {
    pairs: HashMap<AffiliationID, (CellID, Option<CellID>)>,
}

impl Termini {
    /// Scan `board` in cell order. The first terminus of a color is its source and the second its sink.
    pub(crate) fn scan(board: &Board) -> Result<Self, SolverFailure> {
        let mut pairs: HashMap<AffiliationID, (CellID, Option<CellID>)> = HashMap::new();

        for (id, cell) in board.cells.iter().enumerate().filter(|(_, cell)| cell.is_terminus()) {
            let affiliation = cell.affiliation;
            match pairs.entry(affiliation) {
                Entry::Vacant(slot) => {
                    slot.insert((id, None));
                }
                Entry::Occupied(mut slot) => match slot.get_mut() {
                    (_, sink @ None) => *sink = Some(id),
                    (_, Some(_)) => return Err(SolverFailure::TooManyTermini { affiliation }),
                },
            }
        }

        Ok(Self { pairs })
    }

    pub(crate) fn sink_of(&self, affiliation: AffiliationID) -> Option<CellID> {
        self.pairs.get(&affiliation).and_then(|(_, sink)| *sink)
    }

    fn unpaired(&self) -> Option<AffiliationID> {
        self.pairs.iter()
            .filter(|(_, (_, sink))| sink.is_none())
            .map(|(affiliation, _)| *affiliation)
            .min()
    }

    fn len(&self) -> usize {
        self.pairs.len()
    }
}

struct Search<'b> {
    board: &'b mut Board,
    options: SolverOptions,
    stats: SolveStats,
}

impl Search<'_> {
    fn recurse(&mut self, target: CellID) -> Result<bool, SolverFailure> {
        self.stats.steps += 1;
        if let Some(limit) = self.options.step_limit {
            if self.stats.steps > limit {
                return Err(SolverFailure::StepLimitReached { limit });
            }
        }

        if target == self.board.len() {
            return Ok(self.board.is_solved());
        }

        if self.board.is_valid(target) {
            // a valid cell either already sends or is a sink, so none of its neighbors below could be connected
            return self.recurse(target + 1);
        }

        for n in self.board.neighbors(target).to_vec() {
            if self.tail_back(target, n) {
                continue;
            }
            if !self.board.try_connect(target, n) {
                continue;
            }

            if self.tail_has_income(target) && self.head_has_escape(n) && !self.tail_touches_head(target, n) {
                match self.recurse(target + 1) {
                    Ok(true) => return Ok(true),
                    Ok(false) => {}
                    Err(failure) => {
                        // unwind through the same undo path so the board is left as it was found
                        self.board.disconnect(target);
                        return Err(failure);
                    }
                }
            }

            trace!(cell = target, neighbor = n, "backtracking");
            self.stats.backtracks += 1;
            self.board.disconnect(target);
        }

        Ok(false)
    }

    /// Would connecting `current` to `next` run the chain alongside itself?
    /// True if any neighbor of `next`, other than `current`, is already behind `current`.
    fn tail_back(&self, current: CellID, next: CellID) -> bool {
        let tail = self.board.chain(current, Direction::Backward).collect_vec();

        self.board.neighbors(next).iter()
            .any(|n2| *n2 != current && tail.contains(n2))
    }

    /// After linking `current` onward, whether the first cell of its chain can still be fed.
    fn tail_has_income(&self, current: CellID) -> bool {
        self.board.has_income(self.board.chain_end(current, Direction::Backward))
    }

    /// After linking into `next`, whether the last cell of its chain can still continue.
    fn head_has_escape(&self, next: CellID) -> bool {
        self.board.has_escape(self.board.chain_end(next, Direction::Forward))
    }

    /// Whether any cell past `next` is adjacent to `current` or anything behind it, which would leave the finished
    /// flow touching itself.
    fn tail_touches_head(&self, current: CellID, next: CellID) -> bool {
        let behind = self.board.chain(current, Direction::Backward).collect_vec();

        self.board.chain(next, Direction::Forward)
            .skip(1)
            .any(|ahead| behind.iter().any(|b| self.board.neighbors(ahead).contains(b)))
    }
}

impl Board {
    /// Mark the first terminus of each color as its source and the second as its sink.
    ///
    /// [`solve`](Self::solve) does this itself; it is only needed to use the connection rules on an unsolved board.
    pub fn assign_termini(&mut self) -> Result<(), SolverFailure> {
        let termini = Termini::scan(self)?;
        self.apply_termini(&termini);
        Ok(())
    }

    fn apply_termini(&mut self, termini: &Termini) {
        for (id, cell) in self.cells.iter_mut().enumerate() {
            if let CellKind::Terminus { sink } = &mut cell.kind {
                *sink = termini.sink_of(cell.affiliation) == Some(id);
            }
        }
    }

    /// Attempt to cover the board with flows. Returns whether it worked.
    ///
    /// On success every source is linked through `next` to its sink and every other cell lies on exactly one flow;
    /// see [`paths`](Self::paths). On failure the board is left without any connections made by the search.
    pub fn solve(&mut self) -> bool {
        self.solve_with(SolverOptions::default()).is_ok()
    }

    /// [`solve`](Self::solve) with the given `options`, reporting why a solve failed or how much work it took.
    pub fn solve_with(&mut self, options: SolverOptions) -> Result<SolveStats, SolverFailure> {
        if self.is_empty() {
            return Err(SolverFailure::Exhausted);
        }

        let termini = Termini::scan(self)?;
        if let Some(affiliation) = termini.unpaired() {
            return Err(SolverFailure::UnpairedTerminus { affiliation });
        }
        if let Some(cell) = self.cells.iter().position(|cell| cell.is_orphan()) {
            return Err(SolverFailure::Orphaned { cell });
        }
        self.apply_termini(&termini);

        debug!(cells = self.len(), colors = termini.len(), "starting search");

        let mut search = Search {
            board: self,
            options,
            stats: SolveStats::default(),
        };
        let outcome = search.recurse(0);
        let stats = search.stats;

        match outcome {
            Ok(true) => {
                debug!(steps = stats.steps, backtracks = stats.backtracks, "solved");
                Ok(stats)
            }
            Ok(false) => {
                debug!(steps = stats.steps, backtracks = stats.backtracks, "search exhausted");
                Err(SolverFailure::Exhausted)
            }
            Err(failure) => {
                debug!(steps = stats.steps, backtracks = stats.backtracks, %failure, "search abandoned");
                Err(failure)
            }
        }
    }
}
