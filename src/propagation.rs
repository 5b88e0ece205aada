//! Keeping every chain a single color as links are made and broken.
//!
//! Only non-terminus cells are ever recolored. A chain takes its color from the terminus at either end of it;
//! a chain that reaches no terminus is neutral.

use itertools::Itertools;

use crate::affiliation::{AffiliationID, NULL_AFFILIATION};
use crate::board::{Board, Direction};
use crate::cell::CellID;

impl Board {
    pub(crate) fn propagate_connect(&mut self, from: CellID, to: CellID) {
        let from_aff = self.cells[from].affiliation;
        let to_aff = self.cells[to].affiliation;

        if self.cells[to].is_terminus() || (from_aff == NULL_AFFILIATION && to_aff != NULL_AFFILIATION) {
            self.paint(from, Direction::Backward, to_aff);
        } else if from_aff != NULL_AFFILIATION {
            self.paint(to, Direction::Forward, from_aff);
        }
    }

    pub(crate) fn propagate_disconnect(&mut self, from: CellID, to: CellID) {
        // `to` now heads its own chain and `from` ends what is left of the old one
        self.repaint(to, Direction::Forward);
        self.repaint(from, Direction::Backward);
    }

    /// Paint `affiliation` onto cells from `start` in `direction`, stopping at a terminus or at a cell already that color.
    fn paint(&mut self, start: CellID, direction: Direction, affiliation: AffiliationID) {
        let targets = self.chain(start, direction)
            .take_while(|id| {
                let cell = &self.cells[*id];
                !cell.is_terminus() && cell.affiliation != affiliation
            })
            .collect_vec();

        for id in targets {
            self.cells[id].affiliation = affiliation;
        }
    }

    /// Recolor the whole chain from `start` in `direction` after it was cut loose at `start`.
    ///
    /// If the walk ends on a terminus, the chain keeps that terminus' color; otherwise it falls back to neutral.
    fn repaint(&mut self, start: CellID, direction: Direction) {
        let (anchors, members): (Vec<CellID>, Vec<CellID>) = self.chain(start, direction)
            .partition(|id| self.cells[*id].is_terminus());
        let affiliation = anchors.first()
            .map(|id| self.cells[*id].affiliation)
            .unwrap_or(NULL_AFFILIATION);

        for id in members {
            self.cells[id].affiliation = affiliation;
        }
    }
}
