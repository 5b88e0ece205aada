//! Which directed connections may be made between cells, and making and breaking them.

use crate::board::Board;
use crate::cell::CellID;

impl Board {
    /// Whether `from` may connect forward into `to` right now.
    ///
    /// The two must be neighbors with compatible colors, `to` must be free to receive and `from` free to send,
    /// and the connection may not double back on an existing one between the same pair.
    /// A terminus only ever receives if it is a sink and only ever sends if it is a source.
    pub fn can_connect(&self, from: CellID, to: CellID) -> bool {
        let source = &self.cells[from];
        let dest = &self.cells[to];

        if !source.is_neutral() && !dest.is_neutral() && dest.affiliation != source.affiliation {
            return false;
        }
        if !source.neighbors.contains(&to) {
            return false;
        }
        if source.next == Some(to) {
            return false;
        }
        // two-cell loop either way around
        if dest.prev == Some(from) || dest.next == Some(from) {
            return false;
        }
        if dest.prev.is_some() {
            return false;
        }
        if dest.is_terminus() && !dest.is_sink() {
            return false;
        }

        if source.is_terminus() {
            source.next.is_none() && !source.is_sink()
        } else {
            source.next.is_none()
        }
    }

    /// Connect `from` forward into `to` and recolor whichever side of the new link was uncolored.
    ///
    /// Does nothing if `to` is already `from`'s next.
    ///
    /// # Panics
    /// If the pair does not satisfy [`can_connect`](Self::can_connect). Use [`try_connect`](Self::try_connect) to check first.
    pub fn connect(&mut self, from: CellID, to: CellID) {
        if self.cells[from].next == Some(to) {
            return;
        }
        assert!(self.can_connect(from, to), "illegal connection {from} -> {to}");

        self.cells[from].next = Some(to);
        self.cells[to].prev = Some(from);
        self.propagate_connect(from, to);
    }

    /// [`connect`](Self::connect) if [`can_connect`](Self::can_connect) allows it. Returns whether a connection was made.
    pub fn try_connect(&mut self, from: CellID, to: CellID) -> bool {
        if !self.can_connect(from, to) {
            return false;
        }

        self.connect(from, to);
        true
    }

    /// Break the connection leaving `from`, recoloring both halves according to whichever termini still anchor them.
    ///
    /// `from` must currently have a next cell.
    pub fn disconnect(&mut self, from: CellID) {
        let Some(to) = self.cells[from].next else {
            debug_assert!(false, "cell {from} has no connection to break");
            return;
        };

        self.cells[to].prev = None;
        self.cells[from].next = None;
        self.propagate_disconnect(from, to);
    }

    /// Whether cell `id` is satisfied; see [`Cell::is_valid`](crate::Cell::is_valid).
    #[inline]
    pub fn is_valid(&self, id: CellID) -> bool {
        self.cells[id].is_valid()
    }

    /// True once every cell is satisfied.
    pub fn is_solved(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_valid())
    }

    /// Whether `id` could still send a connection onward: it is a sink, already sends, or has a neighbor it may connect to.
    pub(crate) fn has_escape(&self, id: CellID) -> bool {
        let cell = &self.cells[id];
        if cell.is_sink() || cell.next.is_some() {
            return true;
        }

        cell.neighbors.iter().any(|n| self.can_connect(id, *n))
    }

    /// Whether `id` could still receive a connection: it is a source, already receives, or has a neighbor that may connect to it.
    pub(crate) fn has_income(&self, id: CellID) -> bool {
        let cell = &self.cells[id];
        if cell.is_source() || cell.prev.is_some() {
            return true;
        }

        cell.neighbors.iter().any(|n| self.can_connect(*n, id))
    }
}
