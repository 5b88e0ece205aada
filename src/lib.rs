#![warn(missing_docs)]

//! # `flowlink`
//!
//! A solver for "flow" puzzles as posited in the mobile game Flow Free and its variants: every cell must be covered by
//! exactly one path, and each path joins the two termini of one color without branching or crossing another.
//!
//! Boards are arbitrary undirected graphs of cells. Hand [`Board::new`] a list of [`CellDescriptor`]s from wherever the
//! puzzle came from, or build a rectangular one with [`SquareBoardBuilder`](builder::SquareBoardBuilder).
//! Then call [`solve()`](crate::Board::solve), which connects the cells in place and reports whether it succeeded.
//! [`Board::paths`] reads the flows back out, and a [`Board`] prints as a character grid through [`Display`](std::fmt::Display).
//!
//! # Internals
//! Every cell carries an outgoing `next` and an incoming `prev` link. A flow is the chain from its source terminus
//! (the first of its color in cell order) through `next` links to its sink terminus (the second).
//!
//! The solver visits cells in order. A cell that is not yet satisfied tries each neighbor in turn as its `next`,
//! subject to the connection rules in [`Board::can_connect`]; colors spread along chains as they are linked.
//! Each tentative link is kept only if
//! 1. the chain it extends would not run alongside itself,
//! 2. the first cell of the merged chain can still be fed and the last can still continue, and
//! 3. nothing ahead of the new link is adjacent to anything behind it.
//!
//! Otherwise, or if the rest of the board cannot be completed, the link is undone and the next neighbor tried.
//! Rule 3 means only solutions in which no flow runs alongside itself are ever found; Flow Free levels are built that way.

pub use board::{Board, FlowPath, InvalidGraph};
pub use builder::Builder;
pub use cell::{Cell, CellDescriptor, CellID};
pub use location::Location;
pub use affiliation::AffiliationID;
pub use solver::{SolveStats, SolverFailure, SolverOptions};

pub(crate) mod board;
mod tests;
pub(crate) mod affiliation;
pub(crate) mod location;
pub(crate) mod cell;
pub(crate) mod rules;
pub(crate) mod propagation;
pub mod shape;
pub mod builder;
pub(crate) mod solver;
