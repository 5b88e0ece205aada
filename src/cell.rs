use std::num::NonZero;

use crate::affiliation::{AffiliationID, NULL_AFFILIATION};
use crate::location::Location;

/// Index of a cell within its [`Board`](crate::Board).
pub type CellID = usize;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub(crate) enum CellKind {
    // sink is assigned by the solver's termini pass; every terminus starts out as a source
    Terminus { sink: bool },
    #[default]
    Path,
}

/// What the caller knows about a cell before solving: its fixed color, if any, where it is, and who it touches.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CellDescriptor {
    /// `Some` for a terminus, `None` for a neutral cell.
    pub affiliation: Option<NonZero<AffiliationID>>,
    /// Position of the cell, opaque to the solver.
    pub location: Location,
    /// Indices of adjacent cells. Must be symmetric and free of duplicates and self references.
    pub neighbors: Vec<CellID>,
}

impl CellDescriptor {
    /// A neutral cell.
    pub fn path(location: Location, neighbors: Vec<CellID>) -> Self {
        Self { affiliation: None, location, neighbors }
    }

    /// A terminus of color `affiliation`.
    pub fn terminus(affiliation: NonZero<AffiliationID>, location: Location, neighbors: Vec<CellID>) -> Self {
        Self { affiliation: Some(affiliation), location, neighbors }
    }
}

/// A cell of a [`Board`](crate::Board), with its current place in whatever chain runs through it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cell {
    pub(crate) affiliation: AffiliationID,
    pub(crate) kind: CellKind,
    pub(crate) next: Option<CellID>,
    pub(crate) prev: Option<CellID>,
    pub(crate) neighbors: Vec<CellID>,
    pub(crate) location: Location,
}

impl From<CellDescriptor> for Cell {
    fn from(value: CellDescriptor) -> Self {
        let (affiliation, kind) = match value.affiliation {
            Some(aff) => (aff.get(), CellKind::Terminus { sink: false }),
            None => (NULL_AFFILIATION, CellKind::Path),
        };

        Self {
            affiliation,
            kind,
            next: None,
            prev: None,
            neighbors: value.neighbors,
            location: value.location,
        }
    }
}

impl Cell {
    /// Current color of this cell; `0` if neutral.
    #[inline]
    pub fn affiliation(&self) -> AffiliationID {
        self.affiliation
    }

    /// True if this cell has no color yet.
    #[inline]
    pub fn is_neutral(&self) -> bool {
        self.affiliation == NULL_AFFILIATION
    }

    /// True if this cell was colored in the original puzzle.
    #[inline]
    pub fn is_terminus(&self) -> bool {
        matches!(self.kind, CellKind::Terminus { .. })
    }

    /// True for the receiving end of a flow. Only meaningful once a solve has assigned termini.
    #[inline]
    pub fn is_sink(&self) -> bool {
        matches!(self.kind, CellKind::Terminus { sink: true })
    }

    /// True for the originating end of a flow.
    #[inline]
    pub fn is_source(&self) -> bool {
        matches!(self.kind, CellKind::Terminus { sink: false })
    }

    /// The cell this one connects forward to.
    #[inline]
    pub fn next(&self) -> Option<CellID> {
        self.next
    }

    /// The cell connecting forward into this one.
    #[inline]
    pub fn prev(&self) -> Option<CellID> {
        self.prev
    }

    /// Adjacent cells, in the order the solver tries them.
    #[inline]
    pub fn neighbors(&self) -> &[CellID] {
        &self.neighbors
    }

    /// Position of this cell, opaque to the solver.
    #[inline]
    pub fn location(&self) -> Location {
        self.location
    }

    /// A cell which no assignment of connections can ever satisfy.
    ///
    /// A terminus needs at least one neighbor; anything else sits inside a path and so needs two.
    pub fn is_orphan(&self) -> bool {
        match self.kind {
            CellKind::Terminus { .. } => self.neighbors.is_empty(),
            CellKind::Path => self.neighbors.len() < 2,
        }
    }

    /// Whether this cell is satisfied as far as the solver is concerned.
    ///
    /// Sinks count as satisfied whether or not anything has reached them yet. Every other cell must extend forward.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.is_sink() || self.next.is_some()
    }
}
